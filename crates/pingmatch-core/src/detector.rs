//! Seam to the external face-recognition model.
//!
//! Detection, landmarking and descriptor extraction all happen behind
//! [`Detector`]; this crate only consumes the resulting embedding.

use crate::types::Embedding;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("no face detected")]
    NoFaceDetected,
    #[error("detector backend failed: {0}")]
    Backend(String),
}

/// A face-recognition service that turns an image into a single-face embedding.
pub trait Detector {
    /// Image handle accepted by this detector.
    type Image: ?Sized;

    /// Detect one face and return its descriptor, or
    /// [`DetectorError::NoFaceDetected`] when the image has none.
    fn detect_embedding(&self, image: &Self::Image) -> Result<Embedding, DetectorError>;
}

impl<D: Detector + ?Sized> Detector for &D {
    type Image = D::Image;

    fn detect_embedding(&self, image: &Self::Image) -> Result<Embedding, DetectorError> {
        (**self).detect_embedding(image)
    }
}
