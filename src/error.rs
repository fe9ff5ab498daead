use crate::types::ResultCode;
use std::cell::RefCell;
use std::fmt;

/// Errors raised while driving the perception runtime.
///
/// Each variant names the step that failed and carries the runtime's result code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("perception startup failed: r={0}")]
    SubsystemStart(ResultCode),

    #[error("head tracker creation failed: r={0}")]
    HandleCreation(ResultCode),

    #[error("head tracker creation returned an invalid handle")]
    InvalidHandle,

    #[error("head tracker static data unavailable: r={0}")]
    StaticData(ResultCode),

    #[error("predicted snapshot unavailable: r={0}")]
    SnapshotAcquire(ResultCode),

    #[error("predicted snapshot was null")]
    NullSnapshot,

    #[error("snapshot transform read failed: r={0}")]
    SnapshotRead(ResultCode),

    #[error("perception shutdown failed: r={0}")]
    Teardown(ResultCode),

    #[error("tracking session not initialized")]
    NotInitialized,
}

impl BridgeError {
    /// Runtime result code behind this error, if the runtime reported one.
    pub fn code(&self) -> Option<ResultCode> {
        match self {
            BridgeError::SubsystemStart(r)
            | BridgeError::HandleCreation(r)
            | BridgeError::StaticData(r)
            | BridgeError::SnapshotAcquire(r)
            | BridgeError::SnapshotRead(r)
            | BridgeError::Teardown(r) => Some(*r),
            BridgeError::InvalidHandle | BridgeError::NullSnapshot | BridgeError::NotInitialized => {
                None
            }
        }
    }
}

thread_local! {
    static LAST_ERROR_MESSAGE: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Last-error storage for the C ABI.
///
/// Messages are kept per calling thread, so a pointer handed out by `as_ptr`
/// stays valid until the same thread makes its next bridge call.
#[cfg_attr(not(feature = "magicleap"), allow(dead_code))]
pub(crate) struct LastError;

#[cfg_attr(not(feature = "magicleap"), allow(dead_code))]
impl LastError {
    pub const fn new() -> Self {
        Self
    }

    pub fn set(&self, err: &BridgeError) {
        LAST_ERROR_MESSAGE.with(|msg| {
            *msg.borrow_mut() = fmt::format(format_args!("{}\0", err));
        });
    }

    pub fn clear(&self) {
        LAST_ERROR_MESSAGE.with(|msg| msg.borrow_mut().clear());
    }

    /// Record the outcome of one call: set on error, clear on success.
    pub fn track<T>(&self, result: crate::Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.clear();
                Some(value)
            }
            Err(e) => {
                self.set(&e);
                None
            }
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        LAST_ERROR_MESSAGE.with(|msg| {
            let msg = msg.borrow();
            if msg.is_empty() {
                std::ptr::null()
            } else {
                msg.as_ptr() as *const std::ffi::c_char
            }
        })
    }
}
