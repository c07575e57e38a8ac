use std::path::{Path, PathBuf};

use docker_compose_types::Compose;

use crate::error::{DeployError, DeployResult};

/// Compose file names probed at the repository root, in order.
pub const COMPOSE_FILES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// What the repository declares as its build unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A single `Dockerfile` at the root.
    Dockerfile,
    /// A Compose definition; holds the file name relative to the
    /// repository root.
    Compose(String),
}

impl ArtifactKind {
    /// Probe `dir` for a Compose file first, then a `Dockerfile`.
    pub fn detect(dir: &Path) -> DeployResult<Self> {
        if let Some(file) = COMPOSE_FILES.iter().find(|f| dir.join(f).is_file()) {
            return Ok(Self::Compose((*file).to_string()));
        }
        if dir.join("Dockerfile").is_file() {
            return Ok(Self::Dockerfile);
        }
        Err(DeployError::NoArtifact(dir.to_path_buf()))
    }

    #[must_use]
    pub fn path(&self, dir: &Path) -> PathBuf {
        match self {
            Self::Dockerfile => dir.join("Dockerfile"),
            Self::Compose(file) => dir.join(file),
        }
    }
}

/// List the service names declared in a Compose file.
pub fn compose_services(path: &Path) -> DeployResult<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let compose: Compose = serde_yaml::from_str(&content)?;
    Ok(compose.services.0.keys().cloned().collect())
}
