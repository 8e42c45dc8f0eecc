//! Optional sinks for intermediate images.
//!
//! The pipeline never writes anywhere on its own; a caller who wants to see
//! the masks passes a sink into the run.

use anyhow::Result;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait DebugSink: Send + Sync {
    /// Store one intermediate image produced by `stage`
    fn save(&self, stage: &str, name: &str, image: &DynamicImage) -> Result<()>;
}

/// Writes `<root>/<stage>/<name>` image files
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// The directory must be empty or non-existent
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.exists() {
            let entries = std::fs::read_dir(&root)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    root.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DebugSink for DirectorySink {
    fn save(&self, stage: &str, name: &str, image: &DynamicImage) -> Result<()> {
        let stage_dir = self.root.join(stage);
        std::fs::create_dir_all(&stage_dir)?;
        let path = stage_dir.join(name);
        image
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image {}: {}", path.display(), e))?;
        tracing::debug!("Debug: saved {}/{}", stage, name);
        Ok(())
    }
}

/// Keeps every artifact in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<(String, String, DynamicImage)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `stage/name` keys in the order they were saved
    pub fn keys(&self) -> Vec<String> {
        self.artifacts
            .lock()
            .map(|a| a.iter().map(|(s, n, _)| format!("{s}/{n}")).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, stage: &str, name: &str) -> Option<DynamicImage> {
        let artifacts = self.artifacts.lock().ok()?;
        artifacts
            .iter()
            .find(|(s, n, _)| s == stage && n == name)
            .map(|(_, _, img)| img.clone())
    }
}

impl DebugSink for MemorySink {
    fn save(&self, stage: &str, name: &str, image: &DynamicImage) -> Result<()> {
        self.artifacts
            .lock()
            .map_err(|_| anyhow::anyhow!("Debug sink lock poisoned"))?
            .push((stage.to_string(), name.to_string(), image.clone()));
        Ok(())
    }
}
