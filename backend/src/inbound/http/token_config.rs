//! Token signing secret configuration.
//!
//! The HS256 secret is read from the file named by `TOKEN_SECRET_FILE`.
//! Release builds refuse to start without a secret of at least
//! [`TOKEN_SECRET_MIN_LEN`] bytes; debug builds fall back to a random
//! per-process secret, which invalidates every session on restart.

use std::path::PathBuf;

use mockable::Env;
use rand::RngCore;
use tracing::warn;

use crate::domain::TokenSettings;
use crate::inbound::http::session_config::BuildMode;
use crate::inbound::http::session_config::parsing::{debug_warn_or_error, read_secret_file};

/// Environment variable naming the secret file.
pub const TOKEN_SECRET_FILE_ENV: &str = "TOKEN_SECRET_FILE";

/// Minimum accepted secret length in release builds.
pub const TOKEN_SECRET_MIN_LEN: usize = 32;

const EPHEMERAL_SECRET_LEN: usize = 64;

/// Errors raised while loading the token secret.
#[derive(thiserror::Error, Debug)]
pub enum TokenConfigError {
    /// `TOKEN_SECRET_FILE` is unset in a release build.
    #[error("missing required environment variable: {name}")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// The secret file could not be read.
    #[error("failed to read token secret at {path}: {source}")]
    SecretRead {
        /// Configured path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The secret is shorter than [`TOKEN_SECRET_MIN_LEN`].
    #[error("token secret at {path} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        /// Configured path.
        path: PathBuf,
        /// Bytes read.
        length: usize,
        /// Bytes required.
        min_len: usize,
    },
}

/// Build [`TokenSettings`] for `issuer` from the environment.
pub fn token_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    issuer: &str,
) -> Result<TokenSettings, TokenConfigError> {
    let Some(raw_path) = env.string(TOKEN_SECRET_FILE_ENV) else {
        return debug_warn_or_error(
            mode,
            ephemeral_settings(issuer),
            TokenConfigError::MissingEnv {
                name: TOKEN_SECRET_FILE_ENV,
            },
            || warn!("TOKEN_SECRET_FILE not set; using temporary token secret (dev only)"),
        );
    };
    let path = PathBuf::from(raw_path);
    match read_secret_file(&path) {
        Ok(secret) => {
            let length = secret.len();
            if mode == BuildMode::Release && length < TOKEN_SECRET_MIN_LEN {
                return Err(TokenConfigError::SecretTooShort {
                    path,
                    length,
                    min_len: TOKEN_SECRET_MIN_LEN,
                });
            }
            Ok(TokenSettings::new(issuer, secret.to_vec()))
        }
        Err(source) => debug_warn_or_error(
            mode,
            ephemeral_settings(issuer),
            TokenConfigError::SecretRead {
                path: path.clone(),
                source,
            },
            || {
                warn!(
                    path = %path.display(),
                    "token secret unreadable; using temporary token secret (dev only)"
                );
            },
        ),
    }
}

fn ephemeral_settings(issuer: &str) -> TokenSettings {
    let mut secret = vec![0_u8; EPHEMERAL_SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut secret);
    TokenSettings::new(issuer, secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::session_config::fingerprint::secret_fingerprint;
    use mockable::MockEnv;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    fn env_with(path: Option<String>) -> MockEnv {
        let mut env = MockEnv::new();
        env.expect_string().times(0..).returning(move |key| {
            if key == TOKEN_SECRET_FILE_ENV {
                path.clone()
            } else {
                None
            }
        });
        env
    }

    fn secret_file(len: usize) -> NamedTempFile {
        let file = NamedTempFile::new().expect("temp file");
        std::fs::write(file.path(), vec![b's'; len]).expect("write secret");
        file
    }

    #[rstest]
    fn release_reads_the_secret_file() {
        let file = secret_file(TOKEN_SECRET_MIN_LEN);
        let env = env_with(Some(file.path().to_string_lossy().into_owned()));
        let settings =
            token_settings_from_env(&env, BuildMode::Release, "tsuki").expect("settings");
        assert_eq!(settings.issuer(), "tsuki");
        assert_eq!(settings.secret(), vec![b's'; TOKEN_SECRET_MIN_LEN].as_slice());
    }

    #[rstest]
    fn release_requires_the_variable() {
        let err = token_settings_from_env(&env_with(None), BuildMode::Release, "tsuki")
            .expect_err("missing variable");
        assert!(matches!(err, TokenConfigError::MissingEnv { .. }));
    }

    #[rstest]
    fn release_rejects_short_secrets() {
        let file = secret_file(TOKEN_SECRET_MIN_LEN - 1);
        let env = env_with(Some(file.path().to_string_lossy().into_owned()));
        let err = token_settings_from_env(&env, BuildMode::Release, "tsuki")
            .expect_err("short secret");
        assert!(matches!(err, TokenConfigError::SecretTooShort { .. }));
    }

    #[rstest]
    fn release_rejects_unreadable_files() {
        let env = env_with(Some("/nonexistent/tsuki/token_secret".to_owned()));
        let err = token_settings_from_env(&env, BuildMode::Release, "tsuki")
            .expect_err("unreadable");
        assert!(matches!(err, TokenConfigError::SecretRead { .. }));
    }

    #[rstest]
    fn debug_generates_distinct_temporary_secrets() {
        let first = token_settings_from_env(&env_with(None), BuildMode::Debug, "tsuki")
            .expect("first");
        let second = token_settings_from_env(&env_with(None), BuildMode::Debug, "tsuki")
            .expect("second");
        assert_eq!(first.secret().len(), EPHEMERAL_SECRET_LEN);
        assert_ne!(
            secret_fingerprint(first.secret()),
            secret_fingerprint(second.secret())
        );
    }
}
