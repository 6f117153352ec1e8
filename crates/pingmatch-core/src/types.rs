use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Face descriptor produced by the external recognition model
/// (128-dimensional for the face-api recognition net).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when no component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Compute Euclidean distance between two embeddings.
    ///
    /// Only the common prefix is compared; callers check dimensionality first.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self { values }
    }
}

/// A named reference face with its precomputed descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub name: String,
    /// Opaque handle to the reference image (path or URL), passed through for display.
    pub image: String,
    pub embedding: Embedding,
}

#[derive(Error, Debug, PartialEq)]
pub enum CollectionError {
    #[error("reference {name:?} has an empty embedding")]
    EmptyEmbedding { name: String },
    #[error("reference {name:?} has non-finite embedding values")]
    NonFinite { name: String },
    #[error("reference {name:?} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Ordered, immutable set of reference records sharing one dimensionality.
///
/// Order is the order the records were supplied in; it decides ties during
/// matching. Rebuilding means constructing a new collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ReferenceRecord>", into = "Vec<ReferenceRecord>")]
pub struct ReferenceCollection {
    records: Vec<ReferenceRecord>,
}

impl ReferenceCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate and wrap records. Every embedding must be non-empty, finite,
    /// and as long as the first one.
    pub fn from_records(records: Vec<ReferenceRecord>) -> Result<Self, CollectionError> {
        let mut expected: Option<usize> = None;
        for record in &records {
            check_record(record, expected)?;
            expected.get_or_insert(record.embedding.len());
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding dimensionality, or `None` for an empty collection.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(|r| r.embedding.len())
    }
}

/// Check a record against the collection invariants. `expected` is the
/// dimensionality already established by earlier records, if any.
pub(crate) fn check_record(
    record: &ReferenceRecord,
    expected: Option<usize>,
) -> Result<(), CollectionError> {
    if record.embedding.is_empty() {
        return Err(CollectionError::EmptyEmbedding {
            name: record.name.clone(),
        });
    }
    if !record.embedding.is_finite() {
        return Err(CollectionError::NonFinite {
            name: record.name.clone(),
        });
    }
    match expected {
        Some(expected) if expected != record.embedding.len() => {
            Err(CollectionError::DimensionMismatch {
                name: record.name.clone(),
                expected,
                actual: record.embedding.len(),
            })
        }
        _ => Ok(()),
    }
}

impl TryFrom<Vec<ReferenceRecord>> for ReferenceCollection {
    type Error = CollectionError;

    fn try_from(records: Vec<ReferenceRecord>) -> Result<Self, Self::Error> {
        Self::from_records(records)
    }
}

impl From<ReferenceCollection> for Vec<ReferenceRecord> {
    fn from(collection: ReferenceCollection) -> Self {
        collection.records
    }
}

impl<'a> IntoIterator for &'a ReferenceCollection {
    type Item = &'a ReferenceRecord;
    type IntoIter = std::slice::Iter<'a, ReferenceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Outcome of matching a query embedding against a reference collection.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// No face in the query, an empty collection, or the nearest reference
    /// lies beyond the threshold.
    NoMatch,
    /// Nearest reference within the threshold.
    Match {
        record: ReferenceRecord,
        distance: f32,
    },
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Match { .. })
    }

    /// Name of the matched reference, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            MatchResult::Match { record, .. } => Some(&record.name),
            MatchResult::NoMatch => None,
        }
    }

    pub fn distance(&self) -> Option<f32> {
        match self {
            MatchResult::Match { distance, .. } => Some(*distance),
            MatchResult::NoMatch => None,
        }
    }
}
