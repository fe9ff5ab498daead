//! Software perception runtime.
//!
//! Produces a smooth synthetic head motion (a slow look left/right with a
//! small sway and bob) evaluated at the requested time. Used by the demo and
//! the tests when no headset is attached. Failures can be injected per call.

use crate::perception::{Perception, TrackerHandle};
use crate::types::{
    CoordinateFrameUid, HeadStaticData, MlTime, PerceptionSettings, Quat, ResultCode, Transform,
    TransformDerivatives, Vec3,
};
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Coordinate frame the simulated head tracker reports in.
pub const SIM_HEAD_FRAME: CoordinateFrameUid = CoordinateFrameUid {
    data: [0x4845_4144, 0x0001],
};

/// Runtime call a [`SimulatedPerception`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimFailure {
    InitSettings,
    Startup,
    CreateTracker,
    /// Tracker creation reports success but yields the invalid handle.
    InvalidHandle,
    StaticData,
    Snapshot,
    /// Snapshot acquisition reports success but yields no snapshot.
    NullSnapshot,
    Read,
    Shutdown,
}

impl SimFailure {
    /// Code reported by injected failures.
    pub const CODE: ResultCode = ResultCode::UNSPECIFIED_FAILURE;
}

/// Motion and failure settings for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Peak yaw in radians.
    pub yaw_amplitude_rad: f64,
    /// Look left/right frequency in Hz.
    pub motion_hz: f64,
    /// Peak lateral sway in metres.
    pub sway_m: f64,
    /// Peak vertical bob in metres.
    pub bob_m: f64,
    /// Resting head height in metres.
    pub head_height_m: f64,
    pub fail_on: Option<SimFailure>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            yaw_amplitude_rad: 0.6,
            motion_hz: 0.25,
            sway_m: 0.05,
            bob_m: 0.01,
            head_height_m: 1.6,
            fail_on: None,
        }
    }
}

/// A snapshot of the simulated world at one time.
#[derive(Debug)]
pub struct SimSnapshot {
    time: MlTime,
}

#[derive(Debug, Default)]
struct SimState {
    running: bool,
    next_handle: u64,
    trackers: Vec<TrackerHandle>,
}

/// In-process stand-in for the perception runtime.
#[derive(Debug, Default)]
pub struct SimulatedPerception {
    config: SimConfig,
    state: Mutex<SimState>,
    outstanding: AtomicUsize,
}

impl SimulatedPerception {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.with_state(|s| s.running)
    }

    pub fn live_trackers(&self) -> usize {
        self.with_state(|s| s.trackers.len())
    }

    /// Snapshots acquired and not yet released.
    pub fn outstanding_snapshots(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Head pose and derivatives at `time` (nanoseconds).
    pub fn pose_at(&self, time: MlTime) -> (Transform, TransformDerivatives) {
        let c = &self.config;
        let t = time as f64 * 1e-9;
        let w = TAU * c.motion_hz;
        let (s1, c1) = (w * t).sin_cos();
        let (s2, c2) = (2.0 * w * t).sin_cos();

        let yaw = c.yaw_amplitude_rad * s1;
        let transform = Transform {
            rotation: Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), yaw as f32),
            position: Vec3::new(
                (c.sway_m * s1) as f32,
                (c.head_height_m + c.bob_m * s2) as f32,
                0.0,
            ),
        };
        let derivatives = TransformDerivatives {
            linear_velocity_m_s: Vec3::new(
                (c.sway_m * w * c1) as f32,
                (2.0 * c.bob_m * w * c2) as f32,
                0.0,
            ),
            linear_acceleration_m_s2: Vec3::new(
                (-c.sway_m * w * w * s1) as f32,
                (-4.0 * c.bob_m * w * w * s2) as f32,
                0.0,
            ),
            angular_velocity_r_s: Vec3::new(0.0, (c.yaw_amplitude_rad * w * c1) as f32, 0.0),
            angular_acceleration_r_s2: Vec3::new(
                0.0,
                (-c.yaw_amplitude_rad * w * w * s1) as f32,
                0.0,
            ),
            ..Default::default()
        };
        (transform, derivatives)
    }

    fn fails(&self, failure: SimFailure) -> bool {
        self.config.fail_on == Some(failure)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SimState) -> T) -> T {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }
}

impl Perception for SimulatedPerception {
    type Snapshot = SimSnapshot;

    fn init_settings(&self) -> Result<PerceptionSettings, ResultCode> {
        if self.fails(SimFailure::InitSettings) {
            return Err(SimFailure::CODE);
        }
        Ok(PerceptionSettings::default())
    }

    fn startup(&self, _settings: &PerceptionSettings) -> Result<(), ResultCode> {
        if self.fails(SimFailure::Startup) {
            return Err(SimFailure::CODE);
        }
        self.with_state(|s| {
            if s.running {
                return Err(ResultCode::LOCKED);
            }
            s.running = true;
            Ok(())
        })
    }

    fn shutdown(&self) -> Result<(), ResultCode> {
        self.with_state(|s| {
            let was_running = std::mem::replace(&mut s.running, false);
            s.trackers.clear();
            if !was_running {
                return Err(ResultCode::INVALID_PARAM);
            }
            Ok(())
        })?;
        if self.fails(SimFailure::Shutdown) {
            return Err(SimFailure::CODE);
        }
        Ok(())
    }

    fn create_head_tracker(&self) -> Result<TrackerHandle, ResultCode> {
        if self.fails(SimFailure::CreateTracker) {
            return Err(SimFailure::CODE);
        }
        if self.fails(SimFailure::InvalidHandle) {
            return Ok(TrackerHandle::INVALID);
        }
        self.with_state(|s| {
            if !s.running {
                return Err(ResultCode::INVALID_PARAM);
            }
            let handle = TrackerHandle(s.next_handle);
            s.next_handle += 1;
            s.trackers.push(handle);
            Ok(handle)
        })
    }

    fn destroy_head_tracker(&self, handle: TrackerHandle) -> Result<(), ResultCode> {
        self.with_state(|s| {
            let before = s.trackers.len();
            s.trackers.retain(|h| *h != handle);
            if s.trackers.len() == before {
                Err(ResultCode::INVALID_PARAM)
            } else {
                Ok(())
            }
        })
    }

    fn head_static_data(&self, handle: TrackerHandle) -> Result<HeadStaticData, ResultCode> {
        if self.fails(SimFailure::StaticData) {
            return Err(SimFailure::CODE);
        }
        if !self.with_state(|s| s.trackers.contains(&handle)) {
            return Err(ResultCode::INVALID_PARAM);
        }
        Ok(HeadStaticData {
            coord_frame_head: SIM_HEAD_FRAME,
        })
    }

    fn predicted_snapshot(&self, time: MlTime) -> Result<Option<SimSnapshot>, ResultCode> {
        if self.fails(SimFailure::Snapshot) {
            return Err(SimFailure::CODE);
        }
        if self.fails(SimFailure::NullSnapshot) {
            return Ok(None);
        }
        if !self.is_running() {
            return Err(ResultCode::INVALID_PARAM);
        }
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        Ok(Some(SimSnapshot { time }))
    }

    fn release_snapshot(&self, _snapshot: SimSnapshot) -> Result<(), ResultCode> {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn transform_with_derivatives(
        &self,
        snapshot: &SimSnapshot,
        frame: &CoordinateFrameUid,
    ) -> Result<(Transform, TransformDerivatives), ResultCode> {
        if self.fails(SimFailure::Read) {
            return Err(SimFailure::CODE);
        }
        if *frame != SIM_HEAD_FRAME {
            return Err(ResultCode::INVALID_PARAM);
        }
        Ok(self.pose_at(snapshot.time))
    }

    fn result_string(&self, code: ResultCode) -> String {
        code.name().unwrap_or("MLResult_Unknown").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_at_rest() {
        let sim = SimulatedPerception::default();
        let (t, d) = sim.pose_at(0);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert!((t.position.y - 1.6).abs() < 1e-6);
        // Yaw rate peaks as the motion passes centre.
        let expected = 0.6 * TAU * 0.25;
        assert!((d.angular_velocity_r_s.y as f64 - expected).abs() < 1e-5);
    }

    #[test]
    fn test_orientation_stays_unit() {
        let sim = SimulatedPerception::default();
        for i in 0..50 {
            let (t, _) = sim.pose_at(i * 73_000_000);
            assert!((t.rotation.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_single_active_runtime() {
        let sim = SimulatedPerception::default();
        let settings = sim.init_settings().unwrap();
        sim.startup(&settings).unwrap();
        assert_eq!(sim.startup(&settings), Err(ResultCode::LOCKED));
        sim.shutdown().unwrap();
        assert!(!sim.is_running());
    }

    #[test]
    fn test_snapshot_accounting() {
        let sim = SimulatedPerception::default();
        sim.startup(&PerceptionSettings::default()).unwrap();
        let snap = sim.predicted_snapshot(10).unwrap().unwrap();
        assert_eq!(sim.outstanding_snapshots(), 1);
        sim.release_snapshot(snap).unwrap();
        assert_eq!(sim.outstanding_snapshots(), 0);
    }

    #[test]
    fn test_wrong_frame_is_rejected() {
        let sim = SimulatedPerception::default();
        sim.startup(&PerceptionSettings::default()).unwrap();
        let snap = sim.predicted_snapshot(0).unwrap().unwrap();
        let other = CoordinateFrameUid { data: [9, 9] };
        assert_eq!(
            sim.transform_with_derivatives(&snap, &other),
            Err(ResultCode::INVALID_PARAM)
        );
        sim.release_snapshot(snap).unwrap();
    }
}
