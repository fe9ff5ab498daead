//! C ABI for the head pose bridge.
//!
//! One process-wide tracking session over the native runtime, the single
//! claimant of the head tracker. The generated C header is written to
//! `include/headpose.h` by cbindgen.

use crate::error::LastError;
use crate::ml::MlPerception;
use crate::session::TrackingSession;
use crate::types::{MlTime, EMPTY_POSE_RECORD, POSE_RECORD_LEN};
use std::ffi::c_char;
use std::sync::OnceLock;

/// Last error message for C consumers, kept per calling thread.
static LAST_ERROR: LastError = LastError::new();

static SESSION: OnceLock<TrackingSession<MlPerception>> = OnceLock::new();

fn session() -> &'static TrackingSession<MlPerception> {
    SESSION.get_or_init(|| TrackingSession::new(MlPerception))
}

/// Start the perception runtime and the head tracker.
/// Returns true once ready; safe to call repeatedly.
#[no_mangle]
pub extern "C" fn hp_initialize() -> bool {
    LAST_ERROR.track(session().try_initialize()).is_some()
}

/// Stop the head tracker and the perception runtime. No-op when not initialized.
#[no_mangle]
pub extern "C" fn hp_shutdown() {
    if let Some(session) = SESSION.get() {
        session.shutdown();
    }
}

/// Write the head pose predicted for `ml_time` into `out` (16 floats).
///
/// Returns true when a pose was read; slot 13 of `out` is then 1.0. On
/// failure `out` is zero-filled and `hp_last_error()` describes why.
///
/// # Safety
/// `out` must point to at least 16 writable floats, or be null.
#[no_mangle]
pub unsafe extern "C" fn hp_pose_at(ml_time: MlTime, out: *mut f32) -> bool {
    let sample = LAST_ERROR.track(session().try_query_pose_at(ml_time));
    if !out.is_null() {
        let record = sample.map_or(EMPTY_POSE_RECORD, |s| s.to_record());
        std::ptr::copy_nonoverlapping(record.as_ptr(), out, POSE_RECORD_LEN);
    }
    sample.is_some()
}

/// Get the last error message of the calling thread. Returns NULL if that
/// thread's last call succeeded. The pointer is valid until the same thread
/// makes its next headpose API call.
#[no_mangle]
pub extern "C" fn hp_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}
