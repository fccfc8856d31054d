//! Secret references for credential values.
//!
//! Values under `[credentials]` in `config.toml` may point outside the file:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and keeps the first line
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - anything else is used as written

use std::process::Command;

use thiserror::Error;

/// Why a secret reference could not be resolved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("failed to run `pass show {path}`: {reason}")]
    PassUnavailable { path: String, reason: String },

    #[error("`pass show {path}` failed ({status}): {stderr}")]
    PassFailed {
        path: String,
        status: String,
        stderr: String,
    },

    #[error("`pass show {0}` produced no output")]
    PassEmpty(String),

    #[error("environment variable `{0}` is not set")]
    EnvMissing(String),
}

/// Resolves a credential value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    match value.split_once("::") {
        Some(("pass", path)) => from_pass(path),
        Some(("env", var)) => std::env::var(var).map_err(|_| SecretError::EnvMissing(var.to_string())),
        _ => Ok(value.to_string()),
    }
}

fn from_pass(path: &str) -> Result<String, SecretError> {
    let output = Command::new("pass")
        .args(["show", path])
        .output()
        .map_err(|e| SecretError::PassUnavailable {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(SecretError::PassFailed {
            path: path.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SecretError::PassEmpty(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_are_kept() {
        assert_eq!(resolve("hunter2").unwrap(), "hunter2");
        assert_eq!(resolve("").unwrap(), "");
        assert_eq!(resolve("rider@example.com").unwrap(), "rider@example.com");
    }

    #[test]
    fn unknown_prefix_is_plain_text() {
        assert_eq!(resolve("vault::club/key").unwrap(), "vault::club/key");
    }

    #[test]
    fn env_reference_reads_variable() {
        unsafe {
            std::env::set_var("_RIDESCHED_TEST_API_KEY", "abc123");
        }
        assert_eq!(resolve("env::_RIDESCHED_TEST_API_KEY").unwrap(), "abc123");
        unsafe {
            std::env::remove_var("_RIDESCHED_TEST_API_KEY");
        }
    }

    #[test]
    fn missing_env_variable_errors() {
        assert_eq!(
            resolve("env::_RIDESCHED_UNSET_VARIABLE_4711"),
            Err(SecretError::EnvMissing("_RIDESCHED_UNSET_VARIABLE_4711".into()))
        );
    }

    #[test]
    fn missing_pass_entry_errors() {
        // Fails whether or not `pass` is installed.
        assert!(resolve("pass::ridesched/no/such/entry/4711").is_err());
    }
}
