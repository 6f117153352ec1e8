//! Reference set building and the shared, swappable reference collection.

use crate::detector::Detector;
use crate::types::{check_record, ReferenceCollection, ReferenceRecord};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// One named reference image to run through the detector.
#[derive(Debug, Clone)]
pub struct ReferenceSource<I> {
    pub name: String,
    /// Opaque image handle copied into the resulting record.
    pub image_ref: String,
    /// Image value handed to the detector.
    pub image: I,
}

/// Run the detector once per source and collect the embeddings, in input order.
///
/// Sources where detection fails, or whose embedding would break the
/// collection invariants, are dropped with a warning. Duplicate names are kept.
pub fn build_reference_set<D, I>(detector: &D, sources: &[ReferenceSource<I>]) -> ReferenceCollection
where
    D: Detector + ?Sized,
    I: Borrow<D::Image>,
{
    let mut records: Vec<ReferenceRecord> = Vec::with_capacity(sources.len());
    let mut seen = HashSet::new();

    for source in sources {
        let embedding = match detector.detect_embedding(source.image.borrow()) {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(name = %source.name, error = %e, "reference dropped: detection failed");
                continue;
            }
        };

        let record = ReferenceRecord {
            name: source.name.clone(),
            image: source.image_ref.clone(),
            embedding,
        };

        let expected = records.first().map(|r| r.embedding.len());
        if let Err(e) = check_record(&record, expected) {
            tracing::warn!(name = %source.name, error = %e, "reference dropped: invalid embedding");
            continue;
        }

        if !seen.insert(source.name.clone()) {
            tracing::debug!(name = %source.name, "duplicate reference name kept");
        }
        records.push(record);
    }

    tracing::info!(
        requested = sources.len(),
        built = records.len(),
        "reference set built"
    );

    // Every record passed check_record against the first one above.
    ReferenceCollection::from_records(records).unwrap_or_default()
}

/// Clone-safe handle to the current reference collection.
///
/// Readers take a snapshot; a rebuild is swapped in only once complete, so a
/// match never observes a partially built collection.
#[derive(Debug, Clone, Default)]
pub struct SharedReferences {
    inner: Arc<RwLock<Arc<ReferenceCollection>>>,
}

impl SharedReferences {
    pub fn new(collection: ReferenceCollection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(collection))),
        }
    }

    /// The collection as of now. Later replacements do not affect it.
    pub fn snapshot(&self) -> Arc<ReferenceCollection> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a fully built collection, returning the previous one.
    pub fn replace(&self, collection: ReferenceCollection) -> Arc<ReferenceCollection> {
        let next = Arc::new(collection);
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracing::info!(records = next.len(), "reference collection replaced");
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorError;
    use crate::types::Embedding;
    use std::collections::HashMap;

    /// Detector backed by a fixed table; `None` entries have no face.
    struct TableDetector {
        table: HashMap<&'static str, Option<Vec<f32>>>,
    }

    impl TableDetector {
        fn new(entries: &[(&'static str, Option<Vec<f32>>)]) -> Self {
            Self {
                table: entries.iter().cloned().collect(),
            }
        }
    }

    impl Detector for TableDetector {
        type Image = str;

        fn detect_embedding(&self, image: &str) -> Result<Embedding, DetectorError> {
            match self.table.get(image) {
                Some(Some(values)) => Ok(Embedding::new(values.clone())),
                Some(None) => Err(DetectorError::NoFaceDetected),
                None => Err(DetectorError::Backend(format!("cannot read {image}"))),
            }
        }
    }

    fn source(name: &str, image: &'static str) -> ReferenceSource<&'static str> {
        ReferenceSource {
            name: name.into(),
            image_ref: format!("/images/{image}"),
            image,
        }
    }

    #[test]
    fn test_build_keeps_input_order() {
        let detector = TableDetector::new(&[
            ("1.jpg", Some(vec![1.0, 0.0])),
            ("2.jpg", Some(vec![0.0, 1.0])),
            ("3.jpg", Some(vec![1.0, 1.0])),
        ]);
        let sources = [
            source("TiniPing3", "3.jpg"),
            source("TiniPing1", "1.jpg"),
            source("TiniPing2", "2.jpg"),
        ];
        let refs = build_reference_set(&detector, &sources);
        let names: Vec<_> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["TiniPing3", "TiniPing1", "TiniPing2"]);
        assert_eq!(refs.records()[0].image, "/images/3.jpg");
        assert_eq!(refs.records()[0].embedding.values, vec![1.0, 1.0]);
    }

    #[test]
    fn test_build_drops_no_face_and_failures() {
        let detector = TableDetector::new(&[
            ("1.jpg", Some(vec![1.0, 0.0])),
            ("2.jpg", None),
            ("4.jpg", Some(vec![0.0, 1.0])),
        ]);
        let sources = [
            source("TiniPing1", "1.jpg"),
            source("TiniPing2", "2.jpg"),
            source("TiniPing3", "missing.jpg"),
            source("TiniPing4", "4.jpg"),
        ];
        let refs = build_reference_set(&detector, &sources);
        let names: Vec<_> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["TiniPing1", "TiniPing4"]);
    }

    #[test]
    fn test_build_drops_mismatched_dimension() {
        let detector = TableDetector::new(&[
            ("1.jpg", Some(vec![1.0, 0.0])),
            ("2.jpg", Some(vec![1.0, 0.0, 0.0])),
            ("3.jpg", Some(vec![])),
            ("4.jpg", Some(vec![0.0, f32::INFINITY])),
        ]);
        let sources = [
            source("a", "1.jpg"),
            source("b", "2.jpg"),
            source("c", "3.jpg"),
            source("d", "4.jpg"),
        ];
        let refs = build_reference_set(&detector, &sources);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs.dimension(), Some(2));
    }

    #[test]
    fn test_build_keeps_duplicate_names() {
        let detector = TableDetector::new(&[
            ("1.jpg", Some(vec![1.0])),
            ("2.jpg", Some(vec![2.0])),
        ]);
        let sources = [source("same", "1.jpg"), source("same", "2.jpg")];
        let refs = build_reference_set(&detector, &sources);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs.records()[1].embedding.values, vec![2.0]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let detector = TableDetector::new(&[
            ("1.jpg", Some(vec![0.1, 0.2])),
            ("2.jpg", Some(vec![0.3, 0.4])),
        ]);
        let sources = [source("a", "1.jpg"), source("b", "2.jpg")];
        assert_eq!(
            build_reference_set(&detector, &sources),
            build_reference_set(&detector, &sources)
        );
    }

    #[test]
    fn test_build_empty_sources() {
        let detector = TableDetector::new(&[]);
        let sources: [ReferenceSource<&'static str>; 0] = [];
        assert!(build_reference_set(&detector, &sources).is_empty());
    }

    #[test]
    fn test_shared_snapshot_survives_replace() {
        let detector = TableDetector::new(&[("1.jpg", Some(vec![1.0]))]);
        let shared = SharedReferences::new(build_reference_set(&detector, &[source("old", "1.jpg")]));

        let before = shared.snapshot();
        let previous =
            shared.replace(build_reference_set(&detector, &[source("new", "1.jpg")]));

        assert_eq!(before.records()[0].name, "old");
        assert_eq!(previous.records()[0].name, "old");
        assert_eq!(shared.snapshot().records()[0].name, "new");
    }

    #[test]
    fn test_shared_clones_see_replacement() {
        let shared = SharedReferences::default();
        let other = shared.clone();
        assert!(other.snapshot().is_empty());

        let detector = TableDetector::new(&[("1.jpg", Some(vec![1.0]))]);
        shared.replace(build_reference_set(&detector, &[source("a", "1.jpg")]));
        assert_eq!(other.snapshot().len(), 1);
    }
}
