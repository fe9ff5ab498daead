//! # headpose - head-pose tracking bridge
//!
//! Thread-safe bridge between an application and a spatial perception
//! runtime's head tracker. Provides:
//! - A tracking session with idempotent initialize/shutdown
//! - Fail-soft pose queries at a runtime timestamp
//! - A 16-slot pose record and a C ABI (with the `magicleap` feature)
//! - The sensor packet framing used by the capture server
//! - A simulated runtime for running without a headset
//!
//! ## Quick Start
//! ```
//! use headpose::{SimulatedPerception, TrackingSession};
//!
//! let session = TrackingSession::new(SimulatedPerception::default());
//! if session.initialize() {
//!     let pose = session.query_pose_at(250_000_000);
//!     println!("pos: {:?}", pose.position);
//! }
//! session.shutdown();
//! ```

pub mod error;
pub mod types;
pub mod perception;
pub mod result_log;
pub mod session;
pub mod packet;
pub mod sim;
#[cfg(feature = "magicleap")]
pub mod ml;
#[cfg(feature = "magicleap")]
pub mod ffi;

pub use error::BridgeError;
pub use types::*;
pub use perception::{Perception, TrackerHandle};
pub use session::TrackingSession;
pub use sim::{SimConfig, SimFailure, SimulatedPerception};

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
