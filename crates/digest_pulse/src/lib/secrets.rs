use std::{future::Future, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret {name} not found")]
    Missing { name: String },
    #[error("Secret {name} is empty")]
    Empty { name: String },
    #[error("Failed to read secret {name}: {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },
}

/// Resolves named credentials once at startup.
pub trait SecretProvider {
    fn get_secret(&self, name: &str) -> impl Future<Output = Result<String, SecretError>> + Send;
}

/// Secrets held in environment variables, the secret name being the variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl SecretProvider for EnvSecrets {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let value = std::env::var(name).map_err(|_| SecretError::Missing {
            name: name.to_string(),
        })?;
        non_empty(name, value)
    }
}

/// Secrets mounted as files, one per name, e.g. under `/run/secrets`.
#[derive(Debug, Clone)]
pub struct FileSecrets {
    dir: PathBuf,
}

impl FileSecrets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SecretProvider for FileSecrets {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let path = self.dir.join(name);
        let value = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => SecretError::Missing {
                    name: name.to_string(),
                },
                _ => SecretError::Io {
                    name: name.to_string(),
                    source,
                },
            })?;
        non_empty(name, value)
    }
}

fn non_empty(name: &str, value: String) -> Result<String, SecretError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SecretError::Empty {
            name: name.to_string(),
        });
    }
    Ok(trimmed.to_string())
}
