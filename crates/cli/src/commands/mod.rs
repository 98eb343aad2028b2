//! Command implementations.
//!
//! Every command talks to the backend through the admin crate's
//! [`BackendClient`], so the CLI and the console share one wire format.

pub mod catalog;
pub mod health;
pub mod users;

use std::io::{self, BufRead, Write};

use secrecy::{ExposeSecret, SecretString};
use shopfront_admin::backend::{BackendClient, BackendError};
use shopfront_admin::config::{BackendConfig, ConfigError};
use shopfront_core::{AccessToken, Email};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Neither a token nor credentials were provided.
    #[error("Set SHOP_API_TOKEN, or SHOP_ADMIN_EMAIL and SHOP_ADMIN_PASSWORD")]
    MissingCredentials,

    #[error("Invalid email in SHOP_ADMIN_EMAIL: {0}")]
    InvalidEmail(String),

    #[error("{0} is not an admin account")]
    NotAdmin(String),

    #[error("Aborted: deletion was not confirmed")]
    NotConfirmed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Backend client plus the credentials the environment provides.
pub struct Context {
    pub client: BackendClient,
    token: Option<AccessToken>,
    credentials: Option<(String, SecretString)>,
}

impl Context {
    /// Build from `BACKEND_*` and `SHOP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend configuration is missing or invalid.
    pub fn from_env() -> Result<Self, CliError> {
        dotenvy::dotenv().ok();

        let config = BackendConfig::from_env()?;
        let client = BackendClient::new(&config)?;
        let token = std::env::var("SHOP_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(AccessToken::new);
        let credentials = match (
            std::env::var("SHOP_ADMIN_EMAIL"),
            std::env::var("SHOP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some((email, SecretString::from(password))),
            _ => None,
        };

        Ok(Self {
            client,
            token,
            credentials,
        })
    }

    /// An admin token: `SHOP_API_TOKEN` as is, or a fresh login.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials are configured, the login fails
    /// or the account is not an admin.
    pub async fn admin_token(&self) -> Result<AccessToken, CliError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let (email, password) = self
            .credentials
            .as_ref()
            .ok_or(CliError::MissingCredentials)?;
        let email = Email::parse(email).map_err(|_| CliError::InvalidEmail(email.clone()))?;

        tracing::info!(email = %email, "Logging in");
        let login = self.client.login(&email, password.expose_secret()).await?;
        if !login.user.is_admin() {
            return Err(CliError::NotAdmin(email.into_inner()));
        }
        Ok(login.token)
    }
}

/// Whether a typed answer confirms a deletion.
#[must_use]
pub fn is_confirmation(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Ask before deleting, unless `--yes` was given.
///
/// # Errors
///
/// Returns [`CliError::NotConfirmed`] unless the user types `yes`.
#[allow(clippy::print_stdout)]
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<(), CliError> {
    if assume_yes {
        return Ok(());
    }
    print!("{prompt} Type 'yes' to continue: ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    if is_confirmation(&answer) {
        Ok(())
    } else {
        Err(CliError::NotConfirmed)
    }
}

/// Print rows as aligned columns under a header.
#[allow(clippy::print_stdout)]
pub fn print_table(header: &[&str], rows: &[Vec<String>]) {
    for line in render_table(header, rows) {
        println!("{line}");
    }
}

fn render_table(header: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(header.iter().copied(), &widths));
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str), &widths));
    }
    lines
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_yes_confirms() {
        assert!(is_confirmation("yes\n"));
        assert!(is_confirmation("  YES "));
        assert!(!is_confirmation("y"));
        assert!(!is_confirmation(""));
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        assert!(confirm("Delete?", true).is_ok());
    }

    #[test]
    fn test_table_columns_align() {
        let lines = render_table(
            &["ID", "NAME"],
            &[
                vec!["p1".to_string(), "Lamp".to_string()],
                vec!["p10".to_string(), "Desk".to_string()],
            ],
        );
        assert_eq!(lines, vec!["ID   NAME", "p1   Lamp", "p10  Desk"]);
    }
}
