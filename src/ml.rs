//! Native perception runtime backend.
//!
//! Binds the platform's perception and head tracking C API. Only built with
//! the `magicleap` feature, which links `libperception.magicleap`.

use crate::perception::{Perception, TrackerHandle};
use crate::types::{
    CoordinateFrameUid, HeadStaticData, MlTime, PerceptionSettings, ResultCode, Transform,
    TransformDerivatives,
};
use std::ffi::{c_char, c_void, CStr};
use std::ptr::NonNull;

mod sys {
    use super::*;

    pub type MLResult = i32;
    pub type MLHandle = u64;

    #[link(name = "perception.magicleap")]
    extern "C" {
        pub fn MLPerceptionInitSettings(out_settings: *mut PerceptionSettings) -> MLResult;
        pub fn MLPerceptionStartup(settings: *mut PerceptionSettings) -> MLResult;
        pub fn MLPerceptionShutdown() -> MLResult;

        pub fn MLHeadTrackingCreate(out_handle: *mut MLHandle) -> MLResult;
        pub fn MLHeadTrackingDestroy(handle: MLHandle) -> MLResult;
        pub fn MLHeadTrackingGetStaticData(
            handle: MLHandle,
            out_data: *mut HeadStaticData,
        ) -> MLResult;

        pub fn MLPerceptionGetPredictedSnapshot(
            timestamp: MlTime,
            out_snapshot: *mut *mut c_void,
        ) -> MLResult;
        pub fn MLPerceptionReleaseSnapshot(snapshot: *mut c_void) -> MLResult;

        pub fn MLSnapshotGetTransformWithDerivatives(
            snapshot: *const c_void,
            id: *const CoordinateFrameUid,
            out_transform: *mut Transform,
            out_derivatives: *mut TransformDerivatives,
        ) -> MLResult;
        pub fn MLSnapshotGetResultString(result_code: MLResult) -> *const c_char;
    }
}

/// Snapshot owned by the native runtime until released.
#[derive(Debug)]
pub struct MlSnapshot(NonNull<c_void>);

/// The native perception runtime. The process has exactly one.
#[derive(Debug, Default)]
pub struct MlPerception;

impl Perception for MlPerception {
    type Snapshot = MlSnapshot;

    fn init_settings(&self) -> Result<PerceptionSettings, ResultCode> {
        let mut settings = PerceptionSettings::default();
        // SAFETY: the runtime only writes into the settings struct.
        ResultCode(unsafe { sys::MLPerceptionInitSettings(&mut settings) }).check()?;
        Ok(settings)
    }

    fn startup(&self, settings: &PerceptionSettings) -> Result<(), ResultCode> {
        let mut settings = *settings;
        // SAFETY: settings is a valid, initialized struct for the call's duration.
        ResultCode(unsafe { sys::MLPerceptionStartup(&mut settings) }).check()
    }

    fn shutdown(&self) -> Result<(), ResultCode> {
        // SAFETY: no arguments; safe to call whether or not startup succeeded.
        ResultCode(unsafe { sys::MLPerceptionShutdown() }).check()
    }

    fn create_head_tracker(&self) -> Result<TrackerHandle, ResultCode> {
        let mut handle = TrackerHandle::INVALID.0;
        // SAFETY: out pointer is valid for one u64 write.
        ResultCode(unsafe { sys::MLHeadTrackingCreate(&mut handle) }).check()?;
        Ok(TrackerHandle(handle))
    }

    fn destroy_head_tracker(&self, handle: TrackerHandle) -> Result<(), ResultCode> {
        // SAFETY: handle came from MLHeadTrackingCreate and is destroyed once.
        ResultCode(unsafe { sys::MLHeadTrackingDestroy(handle.0) }).check()
    }

    fn head_static_data(&self, handle: TrackerHandle) -> Result<HeadStaticData, ResultCode> {
        let mut data = HeadStaticData::default();
        // SAFETY: out pointer is valid; handle is live.
        ResultCode(unsafe { sys::MLHeadTrackingGetStaticData(handle.0, &mut data) }).check()?;
        Ok(data)
    }

    fn predicted_snapshot(&self, time: MlTime) -> Result<Option<MlSnapshot>, ResultCode> {
        let mut raw: *mut c_void = std::ptr::null_mut();
        // SAFETY: out pointer is valid for one pointer write.
        ResultCode(unsafe { sys::MLPerceptionGetPredictedSnapshot(time, &mut raw) }).check()?;
        Ok(NonNull::new(raw).map(MlSnapshot))
    }

    fn release_snapshot(&self, snapshot: MlSnapshot) -> Result<(), ResultCode> {
        // SAFETY: the snapshot came from MLPerceptionGetPredictedSnapshot and is
        // consumed here, so it cannot be released twice.
        ResultCode(unsafe { sys::MLPerceptionReleaseSnapshot(snapshot.0.as_ptr()) }).check()
    }

    fn transform_with_derivatives(
        &self,
        snapshot: &MlSnapshot,
        frame: &CoordinateFrameUid,
    ) -> Result<(Transform, TransformDerivatives), ResultCode> {
        let mut transform = Transform::default();
        let mut derivatives = TransformDerivatives::default();
        // SAFETY: snapshot is live until released; all pointers are valid.
        ResultCode(unsafe {
            sys::MLSnapshotGetTransformWithDerivatives(
                snapshot.0.as_ptr(),
                frame,
                &mut transform,
                &mut derivatives,
            )
        })
        .check()?;
        Ok((transform, derivatives))
    }

    fn result_string(&self, code: ResultCode) -> String {
        // SAFETY: the runtime returns a static string or null.
        let ptr = unsafe { sys::MLSnapshotGetResultString(code.0) };
        if ptr.is_null() {
            return code.name().unwrap_or("unknown result").to_string();
        }
        // SAFETY: non-null pointers are NUL-terminated static strings.
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}
