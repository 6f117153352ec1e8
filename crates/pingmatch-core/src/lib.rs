//! pingmatch-core — Reference set building and nearest-embedding matching.
//!
//! Face detection and descriptor extraction are delegated to an external
//! model behind the [`Detector`] trait. This crate turns descriptors into a
//! [`ReferenceCollection`] and finds the closest reference for a query.

pub mod detector;
pub mod matcher;
pub mod pipeline;
pub mod reference;
pub mod types;

pub use detector::{Detector, DetectorError};
pub use matcher::{EuclideanMatcher, MatchError, Matcher};
pub use pipeline::{identify, IdentifyError};
pub use reference::{build_reference_set, ReferenceSource, SharedReferences};
pub use types::{CollectionError, Embedding, MatchResult, ReferenceCollection, ReferenceRecord};

/// Default Euclidean distance threshold for a positive match.
///
/// Matches the customary cut-off for 128-dimensional face-api descriptors.
pub const DEFAULT_THRESHOLD: f32 = 0.6;
