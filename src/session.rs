use crate::perception::{op, Perception, TrackerHandle};
use crate::result_log;
use crate::types::{
    CoordinateFrameUid, MlTime, ResultCode, Transform, TransformDerivatives, TransformSample,
    EMPTY_POSE_RECORD, POSE_RECORD_LEN,
};
use crate::{BridgeError, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Head-pose tracking session over a perception runtime.
///
/// Owns the started runtime and the head tracker while ready. All three
/// operations run under one lock, so the session can be shared freely between
/// threads; they are serialized against each other, including a query that
/// blocks inside the runtime.
///
/// ```
/// use headpose::{SimulatedPerception, TrackingSession};
///
/// let session = TrackingSession::new(SimulatedPerception::default());
/// assert!(session.initialize());
/// let pose = session.query_pose_at(1_000_000);
/// assert!(!pose.is_zero());
/// session.shutdown();
/// ```
pub struct TrackingSession<P: Perception> {
    perception: Arc<P>,
    state: Mutex<Option<Active<P>>>,
}

/// Everything that exists only while the session is ready.
///
/// Field order is drop order: the tracker goes before the runtime stops.
struct Active<P: Perception> {
    tracker: HeadTracker<P>,
    runtime: RuntimeSession<P>,
    head_frame: CoordinateFrameUid,
}

impl<P: Perception> TrackingSession<P> {
    pub fn new(perception: P) -> Self {
        Self::with_shared(Arc::new(perception))
    }

    /// Build a session over a runtime the caller also keeps a handle to.
    pub fn with_shared(perception: Arc<P>) -> Self {
        Self {
            perception,
            state: Mutex::new(None),
        }
    }

    pub fn perception(&self) -> &P {
        &self.perception
    }

    pub fn is_ready(&self) -> bool {
        self.lock().is_some()
    }

    /// Head coordinate frame captured at initialization, while ready.
    pub fn head_frame(&self) -> Option<CoordinateFrameUid> {
        self.lock().as_ref().map(|active| active.head_frame)
    }

    /// Bring the session to ready. Returns whether it is ready afterwards.
    pub fn initialize(&self) -> bool {
        self.try_initialize().is_ok()
    }

    /// Like [`initialize`](Self::initialize), keeping the failure.
    ///
    /// Idempotent: a ready session returns immediately. A failure part way
    /// through rolls back what was started, leaving the session uninitialized.
    pub fn try_initialize(&self) -> Result<()> {
        let mut state = self.lock();
        if state.is_some() {
            return Ok(());
        }

        let runtime = RuntimeSession::start(&self.perception)?;
        let tracker = HeadTracker::create(&self.perception)?;
        let head_frame = tracker.head_frame()?;

        *state = Some(Active {
            tracker,
            runtime,
            head_frame,
        });
        log::info!("initialize OK (head frame {})", head_frame);
        Ok(())
    }

    /// Tear down the tracker and the runtime. No-op when not initialized.
    ///
    /// Teardown errors are logged and absorbed; the session always ends up
    /// uninitialized.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        let Some(active) = state.take() else {
            return;
        };

        let Active {
            tracker, runtime, ..
        } = active;
        tracker.destroy();
        // A failed stop is already logged by the runtime owner.
        let _ = runtime.stop();
        log::info!("shutdown OK");
    }

    /// Head pose predicted for `time`.
    ///
    /// Never fails: when the session is not ready or any runtime call fails,
    /// the zero sample is returned (failures are logged).
    pub fn query_pose_at(&self, time: MlTime) -> TransformSample {
        self.try_query_pose_at(time).unwrap_or_default()
    }

    /// Head pose predicted for `time` as a 16-slot record.
    ///
    /// Slot 13 is 1.0 whenever the read succeeded, even for an all-zero pose;
    /// every failure yields [`EMPTY_POSE_RECORD`].
    pub fn query_record_at(&self, time: MlTime) -> [f32; POSE_RECORD_LEN] {
        self.try_query_pose_at(time)
            .map(|sample| sample.to_record())
            .unwrap_or(EMPTY_POSE_RECORD)
    }

    /// Like [`query_pose_at`](Self::query_pose_at), keeping the failure.
    ///
    /// The snapshot is released before this returns on every path.
    pub fn try_query_pose_at(&self, time: MlTime) -> Result<TransformSample> {
        let state = self.lock();
        let active = state.as_ref().ok_or(BridgeError::NotInitialized)?;

        let snapshot = Snapshot::acquire(&*self.perception, time)?;
        let read = snapshot.transform_with_derivatives(&active.head_frame);
        snapshot.release();

        let (transform, derivatives) = read.map_err(|code| {
            result_log::log_failure(&*self.perception, op::TRANSFORM_WITH_DERIVATIVES, code);
            BridgeError::SnapshotRead(code)
        })?;
        Ok(TransformSample::from_parts(&transform, &derivatives))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Active<P>>> {
        // The guarded state is replaced whole, never left half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A started perception runtime. Stopped exactly once: by `stop`, or on drop.
struct RuntimeSession<P: Perception> {
    perception: Arc<P>,
    running: bool,
}

impl<P: Perception> RuntimeSession<P> {
    fn start(perception: &Arc<P>) -> Result<Self> {
        let settings = perception.init_settings();
        result_log::record(&**perception, op::INIT_SETTINGS, &settings);
        let settings = settings.map_err(BridgeError::SubsystemStart)?;

        let started = perception.startup(&settings);
        result_log::record(&**perception, op::STARTUP, &started);
        started.map_err(BridgeError::SubsystemStart)?;

        Ok(Self {
            perception: Arc::clone(perception),
            running: true,
        })
    }

    fn stop(mut self) -> Result<()> {
        self.shutdown_runtime()
    }

    fn shutdown_runtime(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        let stopped = self.perception.shutdown();
        result_log::record(&*self.perception, op::SHUTDOWN, &stopped);
        stopped.map_err(BridgeError::Teardown)
    }
}

impl<P: Perception> Drop for RuntimeSession<P> {
    fn drop(&mut self) {
        if self.running {
            log::info!("stopping perception runtime started by an incomplete initialize");
            let _ = self.shutdown_runtime();
        }
    }
}

/// Head tracker handle. Destroyed exactly once: by `destroy`, or on drop.
struct HeadTracker<P: Perception> {
    perception: Arc<P>,
    handle: Option<TrackerHandle>,
}

impl<P: Perception> HeadTracker<P> {
    fn create(perception: &Arc<P>) -> Result<Self> {
        let created = perception.create_head_tracker();
        result_log::record(&**perception, op::HEAD_TRACKING_CREATE, &created);
        let handle = created.map_err(BridgeError::HandleCreation)?;
        if !handle.is_valid() {
            log::error!("{} returned an invalid handle", op::HEAD_TRACKING_CREATE);
            return Err(BridgeError::InvalidHandle);
        }

        Ok(Self {
            perception: Arc::clone(perception),
            handle: Some(handle),
        })
    }

    fn head_frame(&self) -> Result<CoordinateFrameUid> {
        let handle = self.handle.ok_or(BridgeError::InvalidHandle)?;
        let static_data = self.perception.head_static_data(handle);
        result_log::record(&*self.perception, op::HEAD_TRACKING_STATIC_DATA, &static_data);
        static_data
            .map(|data| data.coord_frame_head)
            .map_err(BridgeError::StaticData)
    }

    fn destroy(mut self) {
        self.release_handle();
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            let destroyed = self.perception.destroy_head_tracker(handle);
            result_log::record_failure(&*self.perception, op::HEAD_TRACKING_DESTROY, &destroyed);
        }
    }
}

impl<P: Perception> Drop for HeadTracker<P> {
    fn drop(&mut self) {
        self.release_handle();
    }
}

/// Predicted snapshot borrowed for one query. Released exactly once: by
/// `release`, or on drop.
struct Snapshot<'a, P: Perception> {
    perception: &'a P,
    inner: Option<P::Snapshot>,
}

impl<'a, P: Perception> Snapshot<'a, P> {
    fn acquire(perception: &'a P, time: MlTime) -> Result<Self> {
        match perception.predicted_snapshot(time) {
            Ok(Some(inner)) => Ok(Self {
                perception,
                inner: Some(inner),
            }),
            Ok(None) => {
                result_log::log_failure(perception, op::PREDICTED_SNAPSHOT, ResultCode::OK);
                Err(BridgeError::NullSnapshot)
            }
            Err(code) => {
                result_log::log_failure(perception, op::PREDICTED_SNAPSHOT, code);
                Err(BridgeError::SnapshotAcquire(code))
            }
        }
    }

    fn transform_with_derivatives(
        &self,
        frame: &CoordinateFrameUid,
    ) -> std::result::Result<(Transform, TransformDerivatives), ResultCode> {
        match &self.inner {
            Some(inner) => self.perception.transform_with_derivatives(inner, frame),
            None => Err(ResultCode::INVALID_PARAM),
        }
    }

    fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(inner) = self.inner.take() {
            let released = self.perception.release_snapshot(inner);
            result_log::record_failure(self.perception, op::RELEASE_SNAPSHOT, &released);
        }
    }
}

impl<P: Perception> Drop for Snapshot<'_, P> {
    fn drop(&mut self) {
        self.release_inner();
    }
}
