use pingmatch_core::DEFAULT_THRESHOLD;
use std::path::PathBuf;

/// CLI configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// TOML manifest listing the named reference images.
    pub manifest_path: PathBuf,
    /// JSON store of descriptors produced by the external face model.
    pub descriptors_path: PathBuf,
    /// Maximum Euclidean distance for a positive match.
    pub threshold: f32,
}

impl Config {
    /// Load configuration from `PINGMATCH_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            manifest_path: lookup("PINGMATCH_MANIFEST")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("references.toml")),
            descriptors_path: lookup("PINGMATCH_DESCRIPTORS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("descriptors.json")),
            threshold: parse_or(lookup("PINGMATCH_THRESHOLD"), DEFAULT_THRESHOLD),
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
