//! End-to-end pipeline scenarios against scripted backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use emolens_core::domain::{BoundingBox, DetectedFace, Emotion, EmotionResult};
use emolens_core::inference::EngineStatus;
use emolens_core::pipeline::{DetectorFactory, EmotionPipeline, PipelineConfig};
use emolens_core::ports::FaceDetector;
use emolens_test_support::{MockFaceDetector, ScriptedLoader, SyntheticImageBuilder};

const ASSET: &[u8] = b"scripted-model-asset";

/// A face covering well over 10% of a 100x100 frame.
fn big_face() -> DetectedFace {
    DetectedFace::new(BoundingBox::new(20, 20, 80, 80), 0.92)
}

/// Detector factory yielding the same answer on every (re)build, counting
/// how often it ran.
fn counted_factory(faces: Vec<DetectedFace>) -> (DetectorFactory, Arc<AtomicUsize>) {
    let builds = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&builds);
    let factory: DetectorFactory = Box::new(move || {
        handle.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockFaceDetector::with_faces(faces.clone())) as Box<dyn FaceDetector>)
    });
    (factory, builds)
}

fn pipeline_with(
    faces: Vec<DetectedFace>,
    loader: ScriptedLoader,
) -> (EmotionPipeline, Arc<AtomicUsize>) {
    let (factory, builds) = counted_factory(faces);
    let pipeline = EmotionPipeline::new(
        factory,
        Box::new(loader),
        ASSET.to_vec(),
        PipelineConfig::default(),
    )
    .unwrap();
    (pipeline, builds)
}

#[test]
fn missing_image_is_input_error() {
    let (mut pipeline, _) = pipeline_with(vec![big_face()], ScriptedLoader::new());

    let result = pipeline.process(None);
    assert_eq!(result.error_message().as_deref(), Some("unable to capture image"));
}

#[test]
fn no_faces_returns_original_image_unchanged() {
    let (mut pipeline, _) = pipeline_with(Vec::new(), ScriptedLoader::new());

    let info = SyntheticImageBuilder::portrait(120, 90);
    let original = info.image.clone();

    match pipeline.process(Some(info.image)) {
        EmotionResult::NoFacesDetected { image } => {
            // The very pixels that went in come back out — not a crop, not
            // an annotated copy.
            assert_eq!(image, original);
        }
        other => panic!("expected NoFacesDetected, got {other:?}"),
    }
    assert_eq!(pipeline.consecutive_failures(), 0);
}

#[test]
fn face_in_frame_classifies_successfully() {
    let mut logits = [0.0f32; 8];
    logits[Emotion::Surprise.index()] = 9.0;
    let loader = ScriptedLoader::new().with_logits(logits);
    let (mut pipeline, _) = pipeline_with(vec![big_face()], loader);

    let info = SyntheticImageBuilder::portrait(100, 100);
    let original = info.image.clone();

    match pipeline.process(Some(info.image)) {
        EmotionResult::Success {
            emotion,
            confidence,
            annotated,
        } => {
            assert_eq!(emotion, Emotion::Surprise);
            assert!(Emotion::ALL.contains(&emotion));
            assert!((0.0..=1.0).contains(&confidence));
            // Visualization is an annotated copy, not the input.
            assert_eq!(annotated.dimensions(), original.dimensions());
            assert_ne!(annotated, original);
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

#[test]
fn detector_failure_is_no_faces_not_error() {
    let factory: DetectorFactory = Box::new(|| {
        Ok(Box::new(MockFaceDetector::failing("backend gone")) as Box<dyn FaceDetector>)
    });
    let mut pipeline = EmotionPipeline::new(
        factory,
        Box::new(ScriptedLoader::new()),
        ASSET.to_vec(),
        PipelineConfig::default(),
    )
    .unwrap();

    let info = SyntheticImageBuilder::gray(64, 64, 128);
    assert!(matches!(
        pipeline.process(Some(info.image)),
        EmotionResult::NoFacesDetected { .. }
    ));
}

#[test]
fn undersized_face_counts_as_no_face() {
    // 6x6 face in a 100x100 frame: under the 10% relative-size floor.
    let small = DetectedFace::new(BoundingBox::new(10, 10, 16, 16), 0.9);
    let (mut pipeline, _) = pipeline_with(vec![small], ScriptedLoader::new());

    let info = SyntheticImageBuilder::gray(100, 100, 128);
    assert!(matches!(
        pipeline.process(Some(info.image)),
        EmotionResult::NoFacesDetected { .. }
    ));
}

#[test]
fn degenerate_box_is_extraction_error() {
    // Large enough to pass the size filter, but entirely outside the image:
    // clipping produces a non-positive extent.
    let outside = DetectedFace::new(BoundingBox::new(300, 300, 400, 400), 0.9);
    let (mut pipeline, _) = pipeline_with(vec![outside], ScriptedLoader::new());

    let info = SyntheticImageBuilder::gray(100, 100, 128);
    let result = pipeline.process(Some(info.image));
    assert_eq!(result.error_message().as_deref(), Some("failed to extract face"));
}

#[test]
fn model_load_failure_is_reported_per_request() {
    let loader = ScriptedLoader::new();
    loader.state_mut(|s| s.fail_all_loads = true);
    let (mut pipeline, _) = pipeline_with(vec![big_face()], loader);

    let info = SyntheticImageBuilder::gray(100, 100, 128);
    let result = pipeline.process(Some(info.image));
    assert_eq!(result.error_message().as_deref(), Some("cannot load model"));
}

#[test]
fn accelerator_fault_self_heals_on_next_request() {
    let loader = ScriptedLoader::new().with_accelerator();
    let scripted = loader.clone();
    let (mut pipeline, _) = pipeline_with(vec![big_face()], loader);

    // First request loads the engine and succeeds.
    let info = SyntheticImageBuilder::gray(100, 100, 128);
    assert!(matches!(
        pipeline.process(Some(info.image.clone())),
        EmotionResult::Success { .. }
    ));
    assert!(pipeline.is_using_accelerator());

    // Second request hits an accelerator fault and fails.
    scripted.state_mut(|s| s.infer_failure = Some("CUDA context lost".into()));
    let result = pipeline.process(Some(info.image.clone()));
    assert!(result.is_error());
    assert_eq!(pipeline.engine_status(), EngineStatus::Degraded);

    // Third request observes Degraded, reloads transparently, succeeds.
    scripted.state_mut(|s| s.infer_failure = None);
    assert!(matches!(
        pipeline.process(Some(info.image)),
        EmotionResult::Success { .. }
    ));
    assert_eq!(pipeline.engine_status(), EngineStatus::Loaded);
    assert_eq!(pipeline.consecutive_failures(), 0);
}

#[test]
fn consecutive_failures_trigger_full_component_reload() {
    let loader = ScriptedLoader::new();
    let scripted = loader.clone();
    let (mut pipeline, detector_builds) = pipeline_with(vec![big_face()], loader);

    scripted.state_mut(|s| s.infer_failure = Some("interpreter wedged".into()));

    let info = SyntheticImageBuilder::gray(100, 100, 128);
    assert!(pipeline.process(Some(info.image.clone())).is_error());
    assert_eq!(pipeline.consecutive_failures(), 1);
    assert_eq!(detector_builds.load(Ordering::SeqCst), 1);

    // Second consecutive failure crosses the threshold: the engine and the
    // detector are both rebuilt and the counter resets.
    assert!(pipeline.process(Some(info.image.clone())).is_error());
    assert_eq!(pipeline.consecutive_failures(), 0);
    assert_eq!(detector_builds.load(Ordering::SeqCst), 2);
    assert_eq!(pipeline.engine_status(), EngineStatus::Loaded);
    {
        let state = scripted.state();
        let state = state.lock().unwrap();
        assert!(state.load_count >= 2, "engine rebuilt, not just reused");
    }

    // And the pipeline is usable again afterwards.
    scripted.state_mut(|s| s.infer_failure = None);
    assert!(matches!(
        pipeline.process(Some(info.image)),
        EmotionResult::Success { .. }
    ));
}

#[test]
fn close_then_process_reloads() {
    let (mut pipeline, _) = pipeline_with(vec![big_face()], ScriptedLoader::new());

    let info = SyntheticImageBuilder::gray(100, 100, 128);
    assert!(matches!(
        pipeline.process(Some(info.image.clone())),
        EmotionResult::Success { .. }
    ));

    pipeline.close();
    assert_eq!(pipeline.engine_status(), EngineStatus::Closed);

    // The pipeline remains usable after teardown: next request reloads.
    assert!(matches!(
        pipeline.process(Some(info.image)),
        EmotionResult::Success { .. }
    ));
}
