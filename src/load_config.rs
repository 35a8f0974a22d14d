/// `load_config` module: loads the YAML lesson index mapping local folders to remote lesson ids.
///
/// This is the only place where the user-maintained YAML is parsed. Everything downstream works
/// with a [`Selection`]: the folders to push, each paired with its id for the chosen target.
///
/// # Accepted schema
/// ```yaml
/// lessons:
///   - path: ./lessons/intro
///     idStaging: 42
///     idProduction: 17
/// ```
/// Either id may be missing or `null`; such lessons are skipped for that target.
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich diagnostics, and are surfaced at
/// the CLI boundary.
use anyhow::{bail, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Target;
use crate::contract::RemoteId;

/// Default location of the lesson index, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "./iql.conf.yaml";

#[derive(Debug, Deserialize)]
pub struct LessonIndex {
    #[serde(default)]
    pub lessons: Vec<LessonEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LessonEntry {
    pub path: String,
    #[serde(rename = "idStaging", default)]
    pub id_staging: Option<RemoteId>,
    #[serde(rename = "idProduction", default)]
    pub id_production: Option<RemoteId>,
}

impl LessonEntry {
    pub fn id_for(&self, target: Target) -> Option<&RemoteId> {
        match target {
            Target::Staging => self.id_staging.as_ref(),
            Target::Production => self.id_production.as_ref(),
        }
    }
}

/// Lessons chosen for one run, in push order.
#[derive(Debug, Default)]
pub struct Selection {
    pub lessons: Vec<(PathBuf, RemoteId)>,
    /// Indexed paths with no id for the chosen target.
    pub skipped: Vec<String>,
}

/// Loads the lesson index from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LessonIndex> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading lesson index from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read lesson index");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let index: LessonIndex = match serde_yaml::from_str(&config_content) {
        Ok(index) => index,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse lesson index YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    info!(config_path = ?path_ref, lessons = index.lessons.len(), "Parsed lesson index");
    Ok(index)
}

impl LessonIndex {
    /// Pick the lessons to push for `target`.
    ///
    /// With no `requested` paths every indexed lesson that has an id is
    /// selected. Otherwise each requested path must be in the index with an id
    /// for `target`.
    pub fn select(&self, target: Target, requested: &[PathBuf]) -> Result<Selection> {
        let mut selection = Selection::default();
        let mut known = Vec::new();

        for entry in &self.lessons {
            match entry.id_for(target) {
                Some(id) => known.push((entry, id)),
                None => selection.skipped.push(entry.path.clone()),
            }
        }

        if requested.is_empty() {
            selection.lessons = known
                .into_iter()
                .map(|(entry, id)| (PathBuf::from(&entry.path), id.clone()))
                .collect();
            return Ok(selection);
        }

        for path in requested {
            let wanted = normalise(&path.to_string_lossy());
            let Some((_, id)) = known
                .iter()
                .find(|(entry, _)| normalise(&entry.path) == wanted)
            else {
                bail!(
                    "No {} found for {} in the lesson index",
                    target.id_key(),
                    path.display()
                );
            };
            selection.lessons.push((path.clone(), (*id).clone()));
        }
        Ok(selection)
    }
}

fn normalise(path: &str) -> String {
    let mut path = path.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_end_matches('/').to_owned()
}
