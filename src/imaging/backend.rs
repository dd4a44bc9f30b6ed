//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the library needs:
//! identify (read dimensions), resize, and crop. The production
//! implementation is [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{CropParams, ResizeParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared by rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions without decoding pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Scale the source to the exact dimensions in `params`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Fill the target box and center-crop the overflow.
    fn crop(&self, params: &CropParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        /// Dimensions returned by `identify`, keyed by file name.
        pub dimensions: HashMap<String, Dimensions>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
        Crop {
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(entries: &[(&str, u32, u32)]) -> Self {
            Self {
                dimensions: entries
                    .iter()
                    .map(|&(name, width, height)| (name.to_string(), Dimensions { width, height }))
                    .collect(),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Recorded resize/crop outputs, sorted for order-independent asserts.
        pub fn written_files(&self) -> Vec<String> {
            let mut files: Vec<String> = self
                .get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Resize { output, .. } | RecordedOp::Crop { output, .. } => {
                        Some(output)
                    }
                    RecordedOp::Identify(_) => None,
                })
                .collect();
            files.sort();
            files
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            let name = file_name(path);
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(name.clone()));

            self.dimensions
                .get(&name)
                .copied()
                .ok_or_else(|| BackendError::ProcessingFailed(format!("No mock dimensions for {name}")))
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                output: file_name(&params.output),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(())
        }

        fn crop(&self, params: &CropParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Crop {
                output: file_name(&params.output),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(&[("image.jpg", 800, 600)]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result, Dimensions { width: 800, height: 600 });

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify("image.jpg".to_string())]);
    }

    #[test]
    fn mock_identify_unknown_file_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/test/missing.jpg")).is_err());
    }

    #[test]
    fn mock_records_resize_and_crop() {
        let backend = MockBackend::new();

        backend
            .resize(&ResizeParams {
                source: "/source.jpg".into(),
                output: "/source-300x225.jpg".into(),
                width: 300,
                height: 225,
                quality: super::super::params::Quality::new(90),
            })
            .unwrap();
        backend
            .crop(&CropParams {
                source: "/source.jpg".into(),
                output: "/source-150x150.jpg".into(),
                width: 150,
                height: 150,
                quality: super::super::params::Quality::new(90),
            })
            .unwrap();

        assert_eq!(
            backend.written_files(),
            vec!["source-150x150.jpg", "source-300x225.jpg"]
        );
        assert!(matches!(
            &backend.get_operations()[1],
            RecordedOp::Crop {
                width: 150,
                height: 150,
                quality: 90,
                ..
            }
        ));
    }
}
