//! Nearest-reference matching with a rejection threshold.

use crate::types::{Embedding, MatchResult, ReferenceCollection};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Strategy for comparing a query embedding against a reference collection.
pub trait Matcher {
    fn compare(
        &self,
        query: &Embedding,
        references: &ReferenceCollection,
        threshold: f32,
    ) -> Result<MatchResult, MatchError>;
}

/// Euclidean distance matcher.
///
/// Scans every reference, keeps the first record at the minimum distance,
/// and accepts it when `distance <= threshold`.
pub struct EuclideanMatcher;

impl EuclideanMatcher {
    fn validate(
        query: &Embedding,
        references: &ReferenceCollection,
        threshold: f32,
    ) -> Result<(), MatchError> {
        if threshold.is_nan() {
            return Err(MatchError::InvalidInput("threshold is NaN".into()));
        }
        if query.is_empty() {
            return Err(MatchError::InvalidInput("query embedding is empty".into()));
        }
        if !query.is_finite() {
            return Err(MatchError::InvalidInput(
                "query embedding has non-finite values".into(),
            ));
        }
        if let Some(expected) = references.dimension() {
            if query.len() != expected {
                return Err(MatchError::InvalidInput(format!(
                    "query has {} dimensions, references have {expected}",
                    query.len()
                )));
            }
        }
        Ok(())
    }
}

impl Matcher for EuclideanMatcher {
    fn compare(
        &self,
        query: &Embedding,
        references: &ReferenceCollection,
        threshold: f32,
    ) -> Result<MatchResult, MatchError> {
        Self::validate(query, references, threshold)?;

        let mut best_distance = f32::INFINITY;
        let mut best_idx: Option<usize> = None;

        for (i, record) in references.iter().enumerate() {
            let distance = query.euclidean_distance(&record.embedding);
            tracing::debug!(name = %record.name, distance, "reference distance");
            // Strict comparison: earlier records win ties.
            if best_idx.is_none() || distance < best_distance {
                best_distance = distance;
                best_idx = Some(i);
            }
        }

        let result = match best_idx {
            Some(idx) if best_distance <= threshold => MatchResult::Match {
                record: references.records()[idx].clone(),
                distance: best_distance,
            },
            _ => MatchResult::NoMatch,
        };

        tracing::debug!(
            matched = result.is_match(),
            best_distance,
            threshold,
            "compare finished"
        );
        Ok(result)
    }
}
