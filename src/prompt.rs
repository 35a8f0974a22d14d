//! Terminal interaction: environment selection and credential entry.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::config::Target;
use crate::contract::{CredentialPrompt, Credentials};

/// Reads the email from stdin and the password without echo.
///
/// When stdin is not a terminal (piped input in scripts) the password is read
/// as the next line of stdin instead.
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn credentials(&self, _environment: &str) -> io::Result<Credentials> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let email = ask_line(&mut stdin.lock(), &mut stdout, "   Email: ")?;
        let password = if stdin.is_terminal() {
            rpassword::prompt_password("   Password: ")?
        } else {
            ask_secret(&mut stdin.lock(), &mut stdout, "   Password: ")?
        };
        Ok(Credentials { email, password })
    }
}

/// Ask which environment to push to until the answer is understood.
pub fn ask_target<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Target> {
    loop {
        let answer = ask_line(input, output, "Push to staging or production? (s/p): ")?;
        match answer.parse::<Target>() {
            Ok(target) => return Ok(target),
            Err(_) => {
                writeln!(
                    output,
                    "Not understood; enter either 's' for staging or 'p' for production."
                )?;
                writeln!(output, "Trying again...")?;
            }
        }
    }
}

fn ask_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<String> {
    Ok(ask_secret(input, output, prompt)?.trim().to_owned())
}

/// Like [`ask_line`] but keeps surrounding whitespace; only the line ending is dropped.
fn ask_secret<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        ));
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}
