use std::fmt;

/// Number of `f32` slots in a pose record handed across the C boundary.
pub const POSE_RECORD_LEN: usize = 16;

/// Slot 13 of a record carrying a real pose.
pub const RECORD_VALID_MARKER: f32 = 1.0;

/// Record reported when no pose could be read. All zeros, marker included.
pub const EMPTY_POSE_RECORD: [f32; POSE_RECORD_LEN] = [0.0; POSE_RECORD_LEN];

/// Opaque perception runtime time value (nanosecond based, runtime epoch).
pub type MlTime = i64;

/// Raw result code reported by the perception runtime. Zero is success.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResultCode(pub i32);

impl ResultCode {
    pub const OK: ResultCode = ResultCode(0);
    pub const LOCKED: ResultCode = ResultCode(3);
    pub const UNSPECIFIED_FAILURE: ResultCode = ResultCode(4);
    pub const INVALID_PARAM: ResultCode = ResultCode(5);
    pub const ALLOC_FAILED: ResultCode = ResultCode(6);
    pub const PERMISSION_DENIED: ResultCode = ResultCode(7);
    pub const NOT_IMPLEMENTED: ResultCode = ResultCode(8);

    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// Symbolic name of the generic runtime codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "MLResult_Ok",
            1 => "MLResult_Pending",
            2 => "MLResult_Timeout",
            3 => "MLResult_Locked",
            4 => "MLResult_UnspecifiedFailure",
            5 => "MLResult_InvalidParam",
            6 => "MLResult_AllocFailed",
            7 => "MLResult_PermissionDenied",
            8 => "MLResult_NotImplemented",
            _ => return None,
        };
        Some(name)
    }

    /// Convert a raw status into a `Result`, keeping the failing code.
    pub fn check(self) -> Result<(), ResultCode> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Quaternion stored as [x, y, z, w].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat::new(0.0, 0.0, 0.0, 1.0);
    pub const ZERO: Quat = Quat::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about the (unit) `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rigid transform as the runtime reports it: rotation first, then position.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub rotation: Quat,
    pub position: Vec3,
}

/// First and second derivatives of a transform.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformDerivatives {
    /// Struct version expected by the runtime.
    pub version: u32,
    pub linear_velocity_m_s: Vec3,
    pub linear_acceleration_m_s2: Vec3,
    pub angular_velocity_r_s: Vec3,
    pub angular_acceleration_r_s2: Vec3,
}

impl TransformDerivatives {
    pub const VERSION: u32 = 1;
}

impl Default for TransformDerivatives {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            linear_velocity_m_s: Vec3::ZERO,
            linear_acceleration_m_s2: Vec3::ZERO,
            angular_velocity_r_s: Vec3::ZERO,
            angular_acceleration_r_s2: Vec3::ZERO,
        }
    }
}

/// Identifier of a coordinate frame inside the perception runtime.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CoordinateFrameUid {
    pub data: [u64; 2],
}

impl fmt::Display for CoordinateFrameUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.data[0], self.data[1])
    }
}

/// Static data of the head tracker.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadStaticData {
    pub coord_frame_head: CoordinateFrameUid,
}

/// Startup settings for the perception runtime. Filled in by the runtime.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerceptionSettings {
    pub override_port: u16,
}

/// Head pose at one instant, as handed to callers.
///
/// `TransformSample::ZERO` is the "no pose" value returned on every failure path.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSample {
    /// Position [x, y, z] in metres.
    pub position: [f32; 3],
    /// Orientation quaternion [x, y, z, w].
    pub orientation: [f32; 4],
    /// Linear velocity [x, y, z] in m/s.
    pub linear_velocity: [f32; 3],
    /// Angular velocity [x, y, z] in rad/s.
    pub angular_velocity: [f32; 3],
}

impl TransformSample {
    pub const ZERO: TransformSample = TransformSample {
        position: [0.0; 3],
        orientation: [0.0; 4],
        linear_velocity: [0.0; 3],
        angular_velocity: [0.0; 3],
    };

    /// Copy the pose and velocities out of a snapshot read. Values pass through unchanged.
    pub fn from_parts(transform: &Transform, derivatives: &TransformDerivatives) -> Self {
        let p = transform.position;
        let q = transform.rotation;
        let v = derivatives.linear_velocity_m_s;
        let w = derivatives.angular_velocity_r_s;
        Self {
            position: [p.x, p.y, p.z],
            orientation: [q.x, q.y, q.z, q.w],
            linear_velocity: [v.x, v.y, v.z],
            angular_velocity: [w.x, w.y, w.z],
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Flatten a successfully read pose into the 16-slot record:
    ///
    /// | slot  | field                  |
    /// |-------|------------------------|
    /// | 0-2   | position x, y, z       |
    /// | 3-6   | orientation x, y, z, w |
    /// | 7-9   | linear velocity        |
    /// | 10-12 | angular velocity       |
    /// | 13    | 1.0                    |
    /// | 14-15 | unused                 |
    ///
    /// Failed reads are reported with [`EMPTY_POSE_RECORD`] instead.
    pub fn to_record(&self) -> [f32; POSE_RECORD_LEN] {
        let mut out = [0.0f32; POSE_RECORD_LEN];
        out[0..3].copy_from_slice(&self.position);
        out[3..7].copy_from_slice(&self.orientation);
        out[7..10].copy_from_slice(&self.linear_velocity);
        out[10..13].copy_from_slice(&self.angular_velocity);
        out[13] = RECORD_VALID_MARKER;
        out
    }

    /// Read a sample back from a record. Returns `None` when the marker slot is not set.
    pub fn from_record(record: &[f32; POSE_RECORD_LEN]) -> Option<Self> {
        if record[13] != RECORD_VALID_MARKER {
            return None;
        }
        let mut sample = Self::ZERO;
        sample.position.copy_from_slice(&record[0..3]);
        sample.orientation.copy_from_slice(&record[3..7]);
        sample.linear_velocity.copy_from_slice(&record[7..10]);
        sample.angular_velocity.copy_from_slice(&record[10..13]);
        Some(sample)
    }
}

impl Default for TransformSample {
    fn default() -> Self {
        Self::ZERO
    }
}
