//! Data-driven login cases.
//!
//! The cases live in a CSV file with the columns `case, username, password,
//! expected`. A missing file is not an error: [`CredentialsSource::load`]
//! returns `Ok(None)` and the suite skips the dependent scenarios.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What a login attempt should lead to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedOutcome {
    /// Lands on the catalog
    Success,
    /// Unknown user or wrong password
    Invalid,
    /// No username entered
    EmptyUsername,
    /// No password entered
    EmptyPassword,
    /// Known user who is locked out
    Locked,
}

impl ExpectedOutcome {
    /// CSV token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Invalid => "invalid",
            Self::EmptyUsername => "empty_username",
            Self::EmptyPassword => "empty_password",
            Self::Locked => "locked",
        }
    }

    /// Text the login error banner must contain; `None` for success
    #[must_use]
    pub const fn expected_message(self) -> Option<&'static str> {
        match self {
            Self::Success => None,
            Self::Invalid => Some("do not match any user"),
            Self::EmptyUsername => Some("Username is required"),
            Self::EmptyPassword => Some("Password is required"),
            Self::Locked => Some("Sorry, this user has been locked out"),
        }
    }
}

impl fmt::Display for ExpectedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpectedOutcome {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "success" => Ok(Self::Success),
            "invalid" => Ok(Self::Invalid),
            "empty_username" => Ok(Self::EmptyUsername),
            "empty_password" => Ok(Self::EmptyPassword),
            "locked" => Ok(Self::Locked),
            other => Err(ProbeError::Credentials {
                message: format!("unknown expected outcome {other:?}"),
            }),
        }
    }
}

/// One row of the credentials file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCase {
    /// Case identifier, used in the scenario name
    #[serde(rename = "case")]
    pub case_id: String,
    /// Username to type; may be empty
    #[serde(default)]
    pub username: String,
    /// Password to type; may be empty
    #[serde(default)]
    pub password: String,
    /// Expected result
    pub expected: ExpectedOutcome,
}

impl CredentialCase {
    /// Build a case
    #[must_use]
    pub fn new(
        case_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        expected: ExpectedOutcome,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            username: username.into(),
            password: password.into(),
            expected,
        }
    }
}

/// The five cases written by [`write_default_credentials`]
#[must_use]
pub fn default_cases() -> Vec<CredentialCase> {
    vec![
        CredentialCase::new(
            "valid_standard_user",
            "standard_user",
            "secret_sauce",
            ExpectedOutcome::Success,
        ),
        CredentialCase::new(
            "locked_out_user",
            "locked_out_user",
            "secret_sauce",
            ExpectedOutcome::Locked,
        ),
        CredentialCase::new("invalid_combo", "wrong_user", "wrongpass", ExpectedOutcome::Invalid),
        CredentialCase::new("empty_username", "", "secret_sauce", ExpectedOutcome::EmptyUsername),
        CredentialCase::new("empty_password", "standard_user", "", ExpectedOutcome::EmptyPassword),
    ]
}

/// A credentials CSV on disk
#[derive(Debug, Clone)]
pub struct CredentialsSource {
    path: PathBuf,
}

impl CredentialsSource {
    /// Source reading `path`
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every case; `Ok(None)` when the file does not exist
    ///
    /// # Errors
    ///
    /// [`ProbeError::Credentials`] for unreadable or malformed rows.
    pub fn load(&self) -> ProbeResult<Option<Vec<CredentialCase>>> {
        if !self.path.exists() {
            tracing::info!(
                "Credentials file {} not found; run `shopcheck credentials` to create it",
                self.path.display()
            );
            return Ok(None);
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(&self.path)
            .map_err(|e| self.error(&e))?;
        let cases = reader
            .deserialize()
            .collect::<Result<Vec<CredentialCase>, _>>()
            .map_err(|e| self.error(&e))?;
        tracing::debug!("Loaded {} credential cases from {}", cases.len(), self.path.display());
        Ok(Some(cases))
    }

    fn error(&self, e: &csv::Error) -> ProbeError {
        ProbeError::Credentials {
            message: format!("{}: {e}", self.path.display()),
        }
    }
}

/// Write `cases` with a header row, creating parent directories
///
/// # Errors
///
/// I/O failures, or [`ProbeError::Credentials`] if a row cannot be encoded.
pub fn write_cases(path: &Path, cases: &[CredentialCase]) -> ProbeResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let to_error = |e: csv::Error| ProbeError::Credentials {
        message: format!("{}: {e}", path.display()),
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
    for case in cases {
        writer.serialize(case).map_err(to_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the standard cases to `path`; returns the row count
///
/// # Errors
///
/// See [`write_cases`].
pub fn write_default_credentials(path: &Path) -> ProbeResult<usize> {
    let cases = default_cases();
    write_cases(path, &cases)?;
    tracing::info!("Wrote {} rows to {}", cases.len(), path.display());
    Ok(cases.len())
}
