#![allow(dead_code)]

use async_trait::async_trait;
use facepass_core::{
    BoundingBox, Camera, CapabilityError, CaptureError, Config, Descriptor, DetectorOptions,
    FaceCapability, FaceDetection, Frame, ModelKind, Overlay, Session, SessionView, TriggerState,
    VideoStream,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

pub fn face(x: f32, descriptor: &[f32]) -> FaceDetection {
    FaceDetection {
        bbox: BoundingBox { x, y: 40.0, width: 100.0, height: 120.0, confidence: 0.9 },
        landmarks: None,
        descriptor: Descriptor::new(descriptor.to_vec()),
    }
}

/// Face capability whose results are set by the test.
#[derive(Default)]
pub struct ScriptedFaces {
    faces: Mutex<Vec<FaceDetection>>,
    distance: Mutex<Option<f32>>,
    failing_model: Mutex<Option<ModelKind>>,
    failing_detection: AtomicBool,
    pub loaded: Mutex<Vec<ModelKind>>,
    pub distance_calls: AtomicUsize,
    pub last_reference: Mutex<Option<Descriptor>>,
    /// When set, `detect_all_faces` signals `entered` then waits on `release`.
    gated: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedFaces {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn show(&self, faces: Vec<FaceDetection>) {
        *self.faces.lock().unwrap() = faces;
    }

    /// Fix the distance reported by `match_distance` instead of computing it.
    pub fn set_distance(&self, distance: f32) {
        *self.distance.lock().unwrap() = Some(distance);
    }

    pub fn fail_loading(&self, kind: ModelKind) {
        *self.failing_model.lock().unwrap() = Some(kind);
    }

    /// Make every detection call return a capability error.
    pub fn fail_detection(&self) {
        self.failing_detection.store(true, Ordering::SeqCst);
    }

    fn detection_error(&self) -> Result<(), CapabilityError> {
        if self.failing_detection.load(Ordering::SeqCst) {
            return Err(CapabilityError::Detection("inference backend crashed".into()));
        }
        Ok(())
    }

    pub fn gate_detection(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FaceCapability for ScriptedFaces {
    async fn load_model(&self, kind: ModelKind, source: &str) -> Result<(), CapabilityError> {
        if *self.failing_model.lock().unwrap() == Some(kind) {
            return Err(CapabilityError::ModelLoad {
                kind,
                source_uri: source.to_string(),
                reason: "404 not found".into(),
            });
        }
        self.loaded.lock().unwrap().push(kind);
        Ok(())
    }

    async fn detect_single_face(
        &self,
        _frame: &Frame,
        _options: &DetectorOptions,
    ) -> Result<Option<FaceDetection>, CapabilityError> {
        self.detection_error()?;
        Ok(self.faces.lock().unwrap().first().cloned())
    }

    async fn detect_all_faces(
        &self,
        _frame: &Frame,
        _options: &DetectorOptions,
    ) -> Result<Vec<FaceDetection>, CapabilityError> {
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.detection_error()?;
        Ok(self.faces.lock().unwrap().clone())
    }

    fn match_distance(&self, reference: &Descriptor, candidate: &Descriptor) -> f32 {
        self.distance_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_reference.lock().unwrap() = Some(reference.clone());
        let fixed = *self.distance.lock().unwrap();
        fixed.unwrap_or_else(|| reference.euclidean_distance(candidate))
    }
}

/// View that records everything pushed into it.
#[derive(Default)]
pub struct RecordingView {
    pub statuses: Mutex<Vec<String>>,
    /// `verification_in_progress` at the moment each status was set.
    pub in_progress_at_status: Mutex<Vec<bool>>,
    session: OnceLock<Weak<Session>>,
    pub triggers: Mutex<Vec<TriggerState>>,
    pub overlays: Mutex<Vec<Overlay>>,
    pub alerts: Mutex<Vec<String>>,
    pub closed: AtomicBool,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses.lock().unwrap().last().cloned()
    }

    pub fn last_trigger(&self) -> Option<TriggerState> {
        self.triggers.lock().unwrap().last().copied()
    }

    pub fn last_overlay(&self) -> Option<Overlay> {
        self.overlays.lock().unwrap().last().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl SessionView for RecordingView {
    fn set_status(&self, text: &str) {
        if let Some(session) = self.session.get().and_then(Weak::upgrade) {
            let in_progress = session.snapshot().verification_in_progress;
            self.in_progress_at_status.lock().unwrap().push(in_progress);
        }
        self.statuses.lock().unwrap().push(text.to_string());
    }

    fn set_trigger(&self, state: TriggerState) {
        self.triggers.lock().unwrap().push(state);
    }

    fn draw_overlay(&self, overlay: &Overlay) {
        self.overlays.lock().unwrap().push(overlay.clone());
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct StillStream {
    sequence: u32,
}

impl VideoStream for StillStream {
    fn dimensions(&self) -> (u32, u32) {
        (640, 480)
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        self.sequence += 1;
        Ok(Frame {
            data: vec![120; 640 * 480],
            width: 640,
            height: 480,
            sequence: self.sequence,
            timestamp: Instant::now(),
        })
    }
}

/// Stream whose grab blocks the calling thread, like a V4L2 dequeue.
pub struct SluggishStream {
    delay: Duration,
    inner: StillStream,
}

impl VideoStream for SluggishStream {
    fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        std::thread::sleep(self.delay);
        self.inner.grab()
    }
}

pub enum FakeCamera {
    Granting,
    Denying,
    Sluggish(Duration),
}

#[async_trait]
impl Camera for FakeCamera {
    async fn request_video(&self) -> Result<Box<dyn VideoStream>, CaptureError> {
        match self {
            FakeCamera::Granting => Ok(Box::new(StillStream { sequence: 0 })),
            FakeCamera::Denying => Err(CaptureError::PermissionDenied("/dev/video0".into())),
            FakeCamera::Sluggish(delay) => Ok(Box::new(SluggishStream {
                delay: *delay,
                inner: StillStream { sequence: 0 },
            })),
        }
    }
}

pub struct Harness {
    pub session: Arc<Session>,
    pub faces: Arc<ScriptedFaces>,
    pub view: Arc<RecordingView>,
}

/// Session with models loaded and the camera granted.
pub async fn ready_session() -> Harness {
    let harness = new_session();
    harness.session.load_models().await.unwrap();
    harness.session.start_capture(&FakeCamera::Granting).await.unwrap();
    harness
}

pub fn new_session() -> Harness {
    new_session_with(Config::default())
}

pub fn new_session_with(config: Config) -> Harness {
    let faces = ScriptedFaces::new();
    let view = RecordingView::new();
    let session = Session::new(config, faces.clone(), view.clone());
    let _ = view.session.set(Arc::downgrade(&session));
    Harness { session, faces, view }
}
