//! Contract consumed from the perception runtime.
//!
//! Everything the tracking session needs from the platform goes through
//! [`Perception`]. The native runtime, the simulator and test fakes all
//! implement it.

use crate::types::{
    CoordinateFrameUid, HeadStaticData, MlTime, PerceptionSettings, ResultCode, Transform,
    TransformDerivatives,
};

/// Opaque head tracker handle issued by the runtime.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackerHandle(pub u64);

impl TrackerHandle {
    /// Sentinel the runtime uses for "no handle".
    pub const INVALID: TrackerHandle = TrackerHandle(u64::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Operation names used in diagnostics.
pub mod op {
    pub const INIT_SETTINGS: &str = "PerceptionInitSettings";
    pub const STARTUP: &str = "PerceptionStartup";
    pub const SHUTDOWN: &str = "PerceptionShutdown";
    pub const HEAD_TRACKING_CREATE: &str = "HeadTrackingCreate";
    pub const HEAD_TRACKING_DESTROY: &str = "HeadTrackingDestroy";
    pub const HEAD_TRACKING_STATIC_DATA: &str = "HeadTrackingGetStaticData";
    pub const PREDICTED_SNAPSHOT: &str = "PerceptionGetPredictedSnapshot";
    pub const RELEASE_SNAPSHOT: &str = "PerceptionReleaseSnapshot";
    pub const TRANSFORM_WITH_DERIVATIVES: &str = "SnapshotGetTransformWithDerivatives";
}

/// Primitives a platform must supply to host the bridge.
///
/// Calls report failure with the runtime's own [`ResultCode`]; mapping to
/// [`BridgeError`](crate::BridgeError) happens in the session.
pub trait Perception: Send + Sync {
    /// Predicted world state borrowed for the duration of one query.
    type Snapshot;

    /// Default startup settings, as filled in by the runtime.
    fn init_settings(&self) -> Result<PerceptionSettings, ResultCode>;

    fn startup(&self, settings: &PerceptionSettings) -> Result<(), ResultCode>;

    fn shutdown(&self) -> Result<(), ResultCode>;

    fn create_head_tracker(&self) -> Result<TrackerHandle, ResultCode>;

    fn destroy_head_tracker(&self, handle: TrackerHandle) -> Result<(), ResultCode>;

    fn head_static_data(&self, handle: TrackerHandle) -> Result<HeadStaticData, ResultCode>;

    /// Acquire the predicted snapshot for `time`. `Ok(None)` means the runtime
    /// reported success but handed back no snapshot.
    fn predicted_snapshot(&self, time: MlTime) -> Result<Option<Self::Snapshot>, ResultCode>;

    fn release_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), ResultCode>;

    fn transform_with_derivatives(
        &self,
        snapshot: &Self::Snapshot,
        frame: &CoordinateFrameUid,
    ) -> Result<(Transform, TransformDerivatives), ResultCode>;

    /// Human-readable description of a result code.
    fn result_string(&self, code: ResultCode) -> String;
}
