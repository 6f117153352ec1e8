//! Descriptors produced by the external face model, keyed by image fingerprint.
//!
//! The store is the CLI's [`Detector`]: an image whose fingerprint has no
//! recorded descriptor is treated as having no detectable face.

use crate::image_source;
use anyhow::{Context, Result};
use pingmatch_core::{Detector, DetectorError, Embedding};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorStore {
    #[serde(default)]
    descriptors: BTreeMap<String, Embedding>,
}

impl DescriptorStore {
    /// Load the store, or start an empty one when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "descriptor store not found, starting empty");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading descriptor store at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing descriptor store {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)
            .with_context(|| format!("writing descriptor store {}", path.display()))
    }

    /// Record the descriptor for an image fingerprint, returning any previous one.
    pub fn insert(&mut self, fingerprint: String, embedding: Embedding) -> Option<Embedding> {
        self.descriptors.insert(fingerprint, embedding)
    }

    pub fn get(&self, fingerprint: &str) -> Option<&Embedding> {
        self.descriptors.get(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Detector for DescriptorStore {
    type Image = Path;

    fn detect_embedding(&self, image: &Path) -> Result<Embedding, DetectorError> {
        let handle =
            image_source::load(image).map_err(|e| DetectorError::Backend(e.to_string()))?;
        match self.get(&handle.fingerprint) {
            Some(embedding) => Ok(embedding.clone()),
            None => {
                tracing::debug!(path = %image.display(), "no descriptor recorded for image");
                Err(DetectorError::NoFaceDetected)
            }
        }
    }
}
