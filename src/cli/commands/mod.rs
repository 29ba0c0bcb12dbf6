pub mod auth;
pub mod customers;
pub mod server;

use std::io::{self, BufRead, Write};

/// Uses the flag value, else prompts on the terminal
pub(crate) fn password_or_prompt(password: Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    print!("{}: ", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("{} is required", prompt);
    }
    Ok(password)
}
