//! Reference manifest: the fixed list of named reference images.
//!
//! ```toml
//! [[reference]]
//! name = "TiniPing1"
//! image = "images/tiniping1.jpg"
//! ```

use anyhow::{Context, Result};
use pingmatch_core::ReferenceSource;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub image: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(rename = "reference", default)]
    pub references: Vec<ManifestEntry>,
}

impl Manifest {
    /// Read a manifest. Relative image paths are resolved against the
    /// manifest's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest at {}", path.display()))?;
        let manifest = Self::parse(&raw, path.parent().unwrap_or(Path::new("")))
            .with_context(|| format!("parsing manifest {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            references = manifest.references.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    fn parse(raw: &str, base: &Path) -> Result<Self> {
        let mut manifest: Manifest = toml::from_str(raw)?;
        for entry in &mut manifest.references {
            if entry.image.is_relative() {
                entry.image = base.join(&entry.image);
            }
        }
        Ok(manifest)
    }

    /// Reference sources in manifest order, ready for the builder.
    pub fn sources(&self) -> Vec<ReferenceSource<PathBuf>> {
        self.references
            .iter()
            .map(|entry| ReferenceSource {
                name: entry.name.clone(),
                image_ref: entry.image.display().to_string(),
                image: entry.image.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR: &str = r#"
        [[reference]]
        name = "TiniPing1"
        image = "images/tiniping1.jpg"

        [[reference]]
        name = "TiniPing2"
        image = "images/tiniping2.jpg"

        [[reference]]
        name = "TiniPing3"
        image = "/abs/tiniping3.jpg"

        [[reference]]
        name = "TiniPing4"
        image = "images/tiniping4.jpg"
    "#;

    #[test]
    fn test_parse_resolves_relative_paths() {
        let manifest = Manifest::parse(FOUR, Path::new("/srv/pingmatch")).unwrap();
        assert_eq!(manifest.references.len(), 4);
        assert_eq!(
            manifest.references[0].image,
            PathBuf::from("/srv/pingmatch/images/tiniping1.jpg")
        );
        assert_eq!(manifest.references[2].image, PathBuf::from("/abs/tiniping3.jpg"));
    }

    #[test]
    fn test_sources_keep_order() {
        let manifest = Manifest::parse(FOUR, Path::new("")).unwrap();
        let names: Vec<_> = manifest.sources().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["TiniPing1", "TiniPing2", "TiniPing3", "TiniPing4"]);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::parse("", Path::new("")).unwrap();
        assert!(manifest.references.is_empty());
    }

    #[test]
    fn test_missing_field_is_error() {
        assert!(Manifest::parse("[[reference]]\nname = \"x\"\n", Path::new("")).is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("references.toml");
        std::fs::write(&path, FOUR).unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(
            manifest.references[3].image,
            dir.path().join("images/tiniping4.jpg")
        );
    }
}
