//! Single-line live status for one push.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner line reading `Push <lesson>: <step>`, finished with ✅ or ❌.
pub struct PushProgress {
    bar: ProgressBar,
    base: String,
}

impl PushProgress {
    pub fn start(lesson_name: &str, visible: bool) -> Self {
        let base = format!("Push {}", style(lesson_name).bold());
        let bar = if visible {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.blue} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(base.clone());
        Self { bar, base }
    }

    pub fn step(&self, label: &str) {
        tracing::debug!(step = label, "Push step");
        self.bar.set_message(format!("{}: {}", self.base, label));
    }

    pub fn succeed(&self) {
        self.bar.set_style(ProgressStyle::default_spinner().tick_chars("✅✅"));
        self.bar.finish_with_message(self.base.clone());
    }

    /// Mark failed, keeping the last step label on screen.
    pub fn fail(&self) {
        self.bar.set_style(ProgressStyle::default_spinner().tick_chars("❌❌"));
        self.bar.abandon();
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_prefixes_lesson_name() {
        let progress = PushProgress::start("intro", false);
        progress.step("Uploading...");
        let msg = console::strip_ansi_codes(&progress.message()).into_owned();
        assert_eq!(msg, "Push intro: Uploading...");
    }

    #[test]
    fn fail_keeps_last_step() {
        let progress = PushProgress::start("intro", false);
        progress.step("Linking upload...");
        progress.fail();
        let msg = console::strip_ansi_codes(&progress.message()).into_owned();
        assert_eq!(msg, "Push intro: Linking upload...");
    }
}
