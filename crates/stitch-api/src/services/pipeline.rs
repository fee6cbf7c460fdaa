//! Estimation pipeline.
//!
//! Takes one upload through validation, detection, estimation and
//! annotation, and either returns a [`YarnReport`] or a [`PipelineError`].
//! Every failure, including a panic in any stage, is converted to a
//! `PipelineError` here so the HTTP layer only ever sees structured errors.
//!
//! Decoding, encoding and annotation are CPU-bound and run on the blocking
//! thread pool; only the detector call runs on the async runtime.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use stitch_client::StitchDetector;
use stitch_media::{decode_rgb, encode_jpeg, encode_png, Annotator, JPEG_QUALITY};
use stitch_models::{YarnEstimator, YarnReport};
use tracing::{debug, error, info, warn};

use crate::error::{ErrorCategory, PipelineError, PipelineResult};
use crate::metrics;

/// File extensions accepted for upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// One uploaded file as received from the form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied file name; may be empty
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Runs estimates. Holds only read-only state, so one instance serves all
/// requests.
pub struct YarnPipeline {
    detector: Arc<dyn StitchDetector>,
    estimator: YarnEstimator,
    annotator: Arc<Annotator>,
}

impl YarnPipeline {
    pub fn new(
        detector: Arc<dyn StitchDetector>,
        estimator: YarnEstimator,
        annotator: Annotator,
    ) -> Self {
        Self {
            detector,
            estimator,
            annotator: Arc::new(annotator),
        }
    }

    /// Produce a yarn report for `upload` at the given thickness category.
    ///
    /// `thickness` is echoed into the report as given; unknown categories are
    /// priced as Medium.
    pub async fn process(
        &self,
        upload: Option<ImageUpload>,
        thickness: &str,
    ) -> PipelineResult<YarnReport> {
        let started = Instant::now();

        let outcome = AssertUnwindSafe(self.run(upload, thickness))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(PipelineError::Internal(panic_message(&*panic))));

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(report) => {
                metrics::record_estimate("ok");
                info!(
                    thickness,
                    stitches = report.stitch_counts.total(),
                    yarn_estimate = report.yarn_estimate,
                    elapsed_ms,
                    "Estimate complete"
                );
            }
            Err(e) => {
                let category = e.category();
                metrics::record_estimate(category.as_str());
                match category {
                    ErrorCategory::BadInput => {
                        warn!(error = %e, elapsed_ms, "Estimate rejected")
                    }
                    ErrorCategory::ServiceFailure | ErrorCategory::Internal => {
                        error!(error = ?e, elapsed_ms, "Estimate failed")
                    }
                }
            }
        }

        outcome
    }

    async fn run(&self, upload: Option<ImageUpload>, thickness: &str) -> PipelineResult<YarnReport> {
        let upload = match upload {
            Some(upload) if !upload.filename.is_empty() => upload,
            _ => return Err(PipelineError::MissingInput),
        };

        if !has_allowed_extension(&upload.filename) {
            return Err(PipelineError::UnsupportedFormat(upload.filename));
        }

        let ImageUpload { filename, bytes } = upload;

        // Encoded once: these exact bytes go to the detector and back to the
        // caller as `original`.
        let (image, jpeg) = run_blocking(move || {
            let image = decode_rgb(&bytes).map_err(PipelineError::CorruptImage)?;
            let jpeg =
                encode_jpeg(&image, JPEG_QUALITY).map_err(PipelineError::ImageProcessing)?;
            Ok((image, jpeg))
        })
        .await?;
        debug!(
            filename = %filename,
            width = image.width(),
            height = image.height(),
            "Upload decoded"
        );

        let detect_started = Instant::now();
        let detected = self.detector.detect(&jpeg).await;
        metrics::record_detection_duration(
            detected.is_ok(),
            detect_started.elapsed().as_secs_f64(),
        );
        let detections = detected?;
        if detections.is_empty() {
            return Err(PipelineError::NoStitchesDetected);
        }
        debug!(detections = detections.len(), "Stitches detected");

        let estimate = self.estimator.estimate(&detections, thickness);
        metrics::record_stitches_detected(estimate.total_stitches());

        let annotator = Arc::clone(&self.annotator);
        let png = run_blocking(move || {
            let annotated = annotator
                .annotate(&image, &detections)
                .map_err(PipelineError::ImageProcessing)?;
            encode_png(&annotated).map_err(PipelineError::ImageProcessing)
        })
        .await?;

        Ok(YarnReport::new(&jpeg, &png, thickness, estimate))
    }
}

/// True when `filename` ends in one of [`ALLOWED_EXTENSIONS`].
pub fn has_allowed_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Run a CPU-bound stage on the blocking pool. A panic in the stage becomes
/// [`PipelineError::Internal`].
async fn run_blocking<T, F>(stage: F) -> PipelineResult<T>
where
    F: FnOnce() -> PipelineResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(stage).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(PipelineError::Internal(panic_message(&*e.into_panic()))),
        Err(e) => Err(PipelineError::Internal(format!("blocking task failed: {e}"))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use stitch_client::{DetectError, DetectResult};
    use stitch_media::{AnnotationConfig, Rgb, RgbImage};
    use stitch_models::Detection;

    use super::*;

    enum Reply {
        Detections(Vec<Detection>),
        NoStitches,
        ServiceDown,
        Panic,
    }

    struct FakeDetector {
        reply: Reply,
        calls: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeDetector {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<u8>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StitchDetector for FakeDetector {
        async fn detect(&self, jpeg: &[u8]) -> DetectResult<Vec<Detection>> {
            self.calls.lock().unwrap().push(jpeg.to_vec());
            match &self.reply {
                Reply::Detections(d) => Ok(d.clone()),
                Reply::NoStitches => Err(DetectError::NoStitchesDetected),
                Reply::ServiceDown => Err(DetectError::from_http_status(503, "upstream down")),
                Reply::Panic => panic!("detector exploded"),
            }
        }
    }

    fn pipeline(detector: Arc<FakeDetector>) -> YarnPipeline {
        let annotator = Annotator::new(&AnnotationConfig {
            font_path: None,
            ..AnnotationConfig::default()
        });
        YarnPipeline::new(detector, YarnEstimator::default(), annotator)
    }

    fn png_upload(name: &str, width: u32, height: u32) -> ImageUpload {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 200])
        });
        ImageUpload::new(name, encode_png(&image).unwrap())
    }

    fn five_sc() -> Vec<Detection> {
        (0..5)
            .map(|i| Detection::new("sc", 10.0 + 12.0 * i as f64, 30.0, 10.0, 10.0))
            .collect()
    }

    #[test]
    fn test_allowed_extensions() {
        assert!(has_allowed_extension("work.png"));
        assert!(has_allowed_extension("WORK.JPG"));
        assert!(has_allowed_extension("scarf.final.Jpeg"));
        assert!(!has_allowed_extension("work.gif"));
        assert!(!has_allowed_extension("png"));
        assert!(!has_allowed_extension("work."));
    }

    #[tokio::test]
    async fn test_missing_upload_skips_detection() {
        let detector = FakeDetector::new(Reply::Detections(five_sc()));
        let err = pipeline(detector.clone())
            .process(None, "Medium")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MissingInput));
        assert_eq!(err.public_message(), "No image uploaded");
        assert!(detector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_filename_is_missing_input() {
        let detector = FakeDetector::new(Reply::Detections(five_sc()));
        let mut upload = png_upload("x.png", 8, 8);
        upload.filename.clear();

        let err = pipeline(detector.clone())
            .process(Some(upload), "Medium")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput));
        assert!(detector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extension_checked_before_decoding() {
        let detector = FakeDetector::new(Reply::Detections(five_sc()));
        let err = pipeline(detector.clone())
            .process(Some(ImageUpload::new("notes.txt", b"garbage".to_vec())), "Medium")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
        assert_eq!(err.public_message(), "Only PNG and JPG images are allowed");
        assert!(detector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_image() {
        let detector = FakeDetector::new(Reply::Detections(five_sc()));
        let err = pipeline(detector.clone())
            .process(Some(ImageUpload::new("work.jpg", b"not a jpeg".to_vec())), "Medium")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::CorruptImage(_)));
        assert_eq!(err.public_message(), "Invalid or corrupted image file");
        assert_eq!(err.category(), ErrorCategory::BadInput);
        assert!(detector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_stitches() {
        let detector = FakeDetector::new(Reply::NoStitches);
        let err = pipeline(detector.clone())
            .process(Some(png_upload("work.png", 32, 32)), "Medium")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoStitchesDetected));
        assert_eq!(
            err.public_message(),
            "No stitches detected in the image. Please upload a clear image of your crochet work."
        );
        assert_eq!(detector.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_detection_list_is_no_stitches() {
        let detector = FakeDetector::new(Reply::Detections(Vec::new()));
        let err = pipeline(detector)
            .process(Some(png_upload("work.png", 32, 32)), "Medium")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoStitchesDetected));
    }

    #[tokio::test]
    async fn test_service_failure_is_not_retried() {
        let detector = FakeDetector::new(Reply::ServiceDown);
        let err = pipeline(detector.clone())
            .process(Some(png_upload("work.png", 32, 32)), "Medium")
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::ServiceFailure);
        assert!(!err.public_message().contains("upstream down"));
        assert_eq!(detector.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let detector = FakeDetector::new(Reply::Panic);
        let err = pipeline(detector)
            .process(Some(png_upload("work.png", 32, 32)), "Medium")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Internal(_)));
        assert_eq!(err.public_message(), "An internal error occurred");
    }

    #[tokio::test]
    async fn test_blocking_stage_result_passes_through() {
        assert_eq!(run_blocking(|| Ok(42)).await.unwrap(), 42);

        let err = run_blocking(|| -> PipelineResult<()> { Err(PipelineError::NoStitchesDetected) })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoStitchesDetected));
    }

    #[tokio::test]
    async fn test_blocking_stage_panic_becomes_internal_error() {
        let err = run_blocking(|| -> PipelineResult<()> { panic!("annotation blew up") })
            .await
            .unwrap_err();

        match &err {
            PipelineError::Internal(msg) => assert_eq!(msg, "panic: annotation blew up"),
            other => panic!("expected internal error, got {other:?}"),
        }
        assert_eq!(err.public_message(), "An internal error occurred");
    }

    #[tokio::test]
    async fn test_five_single_crochet_thick() {
        let detector = FakeDetector::new(Reply::Detections(five_sc()));
        let report = pipeline(detector)
            .process(Some(png_upload("work.png", 80, 60)), "Thick")
            .await
            .unwrap();

        assert_eq!(report.thickness, "Thick");
        assert_eq!(report.stitch_counts.get("sc"), Some(5));
        assert_eq!(report.base_yarn_estimate, 6.0);
        assert_eq!(report.yarn_estimate, 7.8);
        assert_eq!(report.yarn_range, [7.0, 8.6]);
    }

    #[tokio::test]
    async fn test_unknown_thickness_echoed_and_priced_as_medium() {
        let detector = FakeDetector::new(Reply::Detections(five_sc()));
        let report = pipeline(detector)
            .process(Some(png_upload("work.png", 80, 60)), "chunky")
            .await
            .unwrap();

        assert_eq!(report.thickness, "chunky");
        assert_eq!(report.yarn_estimate, report.base_yarn_estimate);
    }

    #[tokio::test]
    async fn test_original_is_exactly_what_detector_saw() {
        let detector = FakeDetector::new(Reply::Detections(five_sc()));
        let report = pipeline(detector.clone())
            .process(Some(png_upload("work.PNG", 80, 60)), "Medium")
            .await
            .unwrap();

        let calls = detector.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(STANDARD.decode(&report.original).unwrap(), calls[0]);
        assert_eq!(&calls[0][..2], &[0xff, 0xd8]);
    }

    #[tokio::test]
    async fn test_processed_image_keeps_dimensions() {
        let detector = FakeDetector::new(Reply::Detections(five_sc()));
        let report = pipeline(detector)
            .process(Some(png_upload("work.png", 80, 60)), "Medium")
            .await
            .unwrap();

        let png = STANDARD.decode(&report.processed).unwrap();
        let annotated = decode_rgb(&png).unwrap();
        assert_eq!(annotated.dimensions(), (80, 60));
    }
}
