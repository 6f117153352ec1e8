use crate::detector::{Detector, DetectorError};
use crate::matcher::{MatchError, Matcher};
use crate::types::{MatchResult, ReferenceCollection};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentifyError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("match error: {0}")]
    Match(#[from] MatchError),
}

/// Detect a face in `image` and match it against `references`.
///
/// An image without a face yields [`MatchResult::NoMatch`] and the matcher is
/// never consulted. Other detector failures are returned.
pub fn identify<D, M>(
    detector: &D,
    image: &D::Image,
    references: &ReferenceCollection,
    matcher: &M,
    threshold: f32,
) -> Result<MatchResult, IdentifyError>
where
    D: Detector + ?Sized,
    M: Matcher + ?Sized,
{
    let query = match detector.detect_embedding(image) {
        Ok(embedding) => embedding,
        Err(DetectorError::NoFaceDetected) => {
            tracing::info!("identify: no face detected in query image");
            return Ok(MatchResult::NoMatch);
        }
        Err(e) => return Err(e.into()),
    };

    let result = matcher.compare(&query, references, threshold)?;
    match &result {
        MatchResult::Match { record, distance } => {
            tracing::info!(name = %record.name, distance, "identify: matched");
        }
        MatchResult::NoMatch => {
            tracing::info!(threshold, "identify: no reference within threshold");
        }
    }
    Ok(result)
}
