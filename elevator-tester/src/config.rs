use std::path::{Path, PathBuf};

use elevator_game::{ConfigLoader, ElevatorCfg, ElevatorConfigError};

#[derive(Debug, thiserror::Error)]
pub enum FileConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in {path}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ElevatorConfigError,
    },
}

/// Loads the session configuration from a JSON file, or the built-in
/// defaults when no path is given.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    path: Option<PathBuf>,
}

impl FileConfig {
    #[must_use]
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
        }
    }
}

impl ConfigLoader for FileConfig {
    type Error = FileConfigError;

    fn load_config(&self) -> Result<ElevatorCfg, Self::Error> {
        let Some(path) = &self.path else {
            return Ok(ElevatorCfg::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| FileConfigError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("loaded configuration from {}", path.display());
        ElevatorCfg::from_json(&raw).map_err(|source| FileConfigError::Invalid {
            path: path.clone(),
            source,
        })
    }
}
