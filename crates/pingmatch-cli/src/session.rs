//! Presentation state for one matching session: wait for references, take
//! an image, compare, show the result.

use crate::image_source::ImageHandle;
use pingmatch_core::{identify, Detector, IdentifyError, MatchResult, Matcher, SharedReferences};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("models are still loading, please wait")]
    ModelsNotLoaded,
    #[error("no image to compare")]
    NoImage,
    #[error(transparent)]
    Identify(#[from] IdentifyError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    LoadingModels,
    Ready,
    ImageSelected(ImageHandle),
    Comparing(ImageHandle),
    Finished {
        image: ImageHandle,
        result: MatchResult,
    },
}

pub struct Session {
    state: SessionState,
    references: Option<SharedReferences>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::LoadingModels,
            references: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Reference set is available; leaves `LoadingModels`. Later calls swap
    /// the references without disturbing a selected image.
    pub fn references_loaded(&mut self, references: SharedReferences) {
        tracing::info!(references = references.snapshot().len(), "session ready");
        self.references = Some(references);
        if self.state == SessionState::LoadingModels {
            self.state = SessionState::Ready;
        }
    }

    /// Select the image to compare, replacing any previous image or result.
    pub fn select_image(&mut self, image: ImageHandle) -> Result<(), SessionError> {
        if self.references.is_none() {
            return Err(SessionError::ModelsNotLoaded);
        }
        self.state = SessionState::ImageSelected(image);
        Ok(())
    }

    /// Compare the selected image against the current reference snapshot.
    ///
    /// On failure the session returns to `ImageSelected` so the caller can retry.
    pub fn compare<D, M>(
        &mut self,
        detector: &D,
        matcher: &M,
        threshold: f32,
    ) -> Result<MatchResult, SessionError>
    where
        D: Detector<Image = Path> + ?Sized,
        M: Matcher + ?Sized,
    {
        let references = self
            .references
            .as_ref()
            .ok_or(SessionError::ModelsNotLoaded)?
            .snapshot();
        let image = match &self.state {
            SessionState::ImageSelected(image) | SessionState::Finished { image, .. } => {
                image.clone()
            }
            _ => return Err(SessionError::NoImage),
        };

        self.state = SessionState::Comparing(image.clone());
        match identify(detector, &image.path, &references, matcher, threshold) {
            Ok(result) => {
                self.state = SessionState::Finished {
                    image,
                    result: result.clone(),
                };
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %image.path.display(), "compare failed");
                self.state = SessionState::ImageSelected(image);
                Err(e.into())
            }
        }
    }

    /// One-line description of the current state for display.
    pub fn status_message(&self) -> String {
        match &self.state {
            SessionState::LoadingModels => "Loading models, please wait...".into(),
            SessionState::Ready => "Ready: select a photo to compare.".into(),
            SessionState::ImageSelected(image) => format!(
                "Selected {} ({}x{}); ready to compare.",
                image.path.display(),
                image.width,
                image.height
            ),
            SessionState::Comparing(image) => format!("Comparing {}...", image.path.display()),
            SessionState::Finished { result, .. } => match result {
                MatchResult::Match { record, distance } => format!(
                    "Most similar character: {} ({}), distance {distance:.4}",
                    record.name, record.image
                ),
                MatchResult::NoMatch => "No sufficiently similar character found.".into(),
            },
        }
    }
}
