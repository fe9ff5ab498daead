//! Sensor packet framing used by the capture server.
//!
//! Packet layout (all fields big-endian):
//! - `[0]`: packet type (1 = IMU, 2 = pose)
//! - `[1]`: sensor id
//! - `[2..4]`: reserved, zero
//! - `[4..12]`: u64 timestamp in nanoseconds
//! - `[12..16]`: u32 payload length in bytes
//! - `[16..]`: payload, a run of f32 values

use crate::types::TransformSample;

// -- Header geometry --
pub const HEADER_SIZE: usize = 16;

// -- Packet types --
pub const TYPE_IMU: u8 = 1;
pub const TYPE_POSE: u8 = 2;

/// Accel xyz, gyro xyz, mag xyz.
pub const IMU_VALUES: usize = 9;
/// Position xyz, quaternion xyzw.
pub const POSE_VALUES: usize = 7;

pub const IMU_PAYLOAD_SIZE: usize = IMU_VALUES * 4;
pub const POSE_PAYLOAD_SIZE: usize = POSE_VALUES * 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("buffer too short: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("packet type {packet_type} expects a {expected}-byte payload, header says {actual}")]
    PayloadLength {
        packet_type: u8,
        expected: usize,
        actual: usize,
    },
}

/// Fixed 16-byte packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub packet_type: u8,
    pub sensor_id: u8,
    pub timestamp_ns: u64,
    pub payload_len: u32,
}

impl PacketHeader {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.packet_type;
        buf[1] = self.sensor_id;
        // [2..4] reserved
        buf[4..12].copy_from_slice(&self.timestamp_ns.to_be_bytes());
        buf[12..16].copy_from_slice(&self.payload_len.to_be_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < HEADER_SIZE {
            return Err(PacketError::Truncated {
                needed: HEADER_SIZE,
                available: data.len(),
            });
        }
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&data[4..12]);
        Ok(Self {
            packet_type: data[0],
            sensor_id: data[1],
            timestamp_ns: u64::from_be_bytes(ts),
            payload_len: u32::from_be_bytes([data[12], data[13], data[14], data[15]]),
        })
    }
}

/// Raw IMU reading as sent by the capture clients.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuReading {
    pub accelerometer: [f32; 3],
    pub gyroscope: [f32; 3],
    pub magnetometer: [f32; 3],
}

/// A decoded packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Imu {
        header: PacketHeader,
        reading: ImuReading,
    },
    Pose {
        header: PacketHeader,
        position: [f32; 3],
        orientation: [f32; 4],
    },
    /// Unknown type; the payload is skipped.
    Unknown { header: PacketHeader },
}

fn encode_values(packet_type: u8, sensor_id: u8, timestamp_ns: u64, values: &[f32]) -> Vec<u8> {
    let header = PacketHeader {
        packet_type,
        sensor_id,
        timestamp_ns,
        payload_len: (values.len() * 4) as u32,
    };
    let mut out = Vec::with_capacity(HEADER_SIZE + values.len() * 4);
    out.extend_from_slice(&header.encode());
    for v in values {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out
}

/// Frame a pose sample (position and orientation only).
pub fn encode_pose(sensor_id: u8, timestamp_ns: u64, sample: &TransformSample) -> Vec<u8> {
    let p = sample.position;
    let q = sample.orientation;
    let values = [p[0], p[1], p[2], q[0], q[1], q[2], q[3]];
    encode_values(TYPE_POSE, sensor_id, timestamp_ns, &values)
}

/// Frame an IMU reading.
pub fn encode_imu(sensor_id: u8, timestamp_ns: u64, reading: &ImuReading) -> Vec<u8> {
    let mut values = [0.0f32; IMU_VALUES];
    values[0..3].copy_from_slice(&reading.accelerometer);
    values[3..6].copy_from_slice(&reading.gyroscope);
    values[6..9].copy_from_slice(&reading.magnetometer);
    encode_values(TYPE_IMU, sensor_id, timestamp_ns, &values)
}

fn read_f32s<const N: usize>(payload: &[u8]) -> [f32; N] {
    let mut out = [0.0f32; N];
    for (slot, chunk) in out.iter_mut().zip(payload.chunks_exact(4)) {
        *slot = f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    out
}

/// Decode one packet from the front of `data`.
///
/// Returns the packet and the number of bytes it occupied.
pub fn decode(data: &[u8]) -> Result<(Packet, usize), PacketError> {
    let header = PacketHeader::decode(data)?;
    let payload_len = header.payload_len as usize;
    let total = HEADER_SIZE + payload_len;
    if data.len() < total {
        return Err(PacketError::Truncated {
            needed: total,
            available: data.len(),
        });
    }
    let payload = &data[HEADER_SIZE..total];

    let expect = |expected: usize| {
        if payload_len == expected {
            Ok(())
        } else {
            Err(PacketError::PayloadLength {
                packet_type: header.packet_type,
                expected,
                actual: payload_len,
            })
        }
    };

    let packet = match header.packet_type {
        TYPE_IMU => {
            expect(IMU_PAYLOAD_SIZE)?;
            let v: [f32; IMU_VALUES] = read_f32s(payload);
            Packet::Imu {
                header,
                reading: ImuReading {
                    accelerometer: [v[0], v[1], v[2]],
                    gyroscope: [v[3], v[4], v[5]],
                    magnetometer: [v[6], v[7], v[8]],
                },
            }
        }
        TYPE_POSE => {
            expect(POSE_PAYLOAD_SIZE)?;
            let v: [f32; POSE_VALUES] = read_f32s(payload);
            Packet::Pose {
                header,
                position: [v[0], v[1], v[2]],
                orientation: [v[3], v[4], v[5], v[6]],
            }
        }
        _ => Packet::Unknown { header },
    };
    Ok((packet, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bytes() {
        let header = PacketHeader {
            packet_type: TYPE_IMU,
            sensor_id: 0,
            timestamp_ns: 0x0102_0304_0506_0708,
            payload_len: 36,
        };
        assert_eq!(
            header.encode(),
            [1, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 36]
        );
    }

    #[test]
    fn test_imu_packet_matches_capture_client() {
        // Same values the capture test client sends.
        let reading = ImuReading {
            accelerometer: [0.0, 1.0, 1.0],
            gyroscope: [0.1, 0.2, 0.3],
            magnetometer: [0.0; 3],
        };
        let bytes = encode_imu(0, 42, &reading);
        assert_eq!(bytes.len(), HEADER_SIZE + IMU_PAYLOAD_SIZE);
        // ay = 1.0f32 big-endian
        assert_eq!(&bytes[20..24], &[0x3f, 0x80, 0x00, 0x00]);

        let (packet, used) = decode(&bytes).unwrap();
        assert_eq!(used, bytes.len());
        match packet {
            Packet::Imu { header, reading: r } => {
                assert_eq!(header.timestamp_ns, 42);
                assert_eq!(r, reading);
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_pose_packet_carries_position_and_orientation() {
        let sample = TransformSample {
            position: [1.0, 2.0, 3.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
            linear_velocity: [9.0; 3],
            angular_velocity: [9.0; 3],
        };
        let bytes = encode_pose(3, 7, &sample);
        assert_eq!(bytes[0], TYPE_POSE);
        assert_eq!(bytes[1], 3);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 28]);

        let (packet, _) = decode(&bytes).unwrap();
        assert_eq!(
            packet,
            Packet::Pose {
                header: PacketHeader {
                    packet_type: TYPE_POSE,
                    sensor_id: 3,
                    timestamp_ns: 7,
                    payload_len: 28,
                },
                position: [1.0, 2.0, 3.0],
                orientation: [0.0, 0.0, 0.0, 1.0],
            }
        );
    }

    #[test]
    fn test_decode_rejects_short_and_mismatched() {
        assert_eq!(
            PacketHeader::decode(&[0u8; 4]),
            Err(PacketError::Truncated {
                needed: 16,
                available: 4
            })
        );

        let mut bytes = encode_pose(0, 0, &TransformSample::ZERO);
        bytes.truncate(20);
        assert!(matches!(decode(&bytes), Err(PacketError::Truncated { .. })));

        let header = PacketHeader {
            packet_type: TYPE_IMU,
            sensor_id: 0,
            timestamp_ns: 0,
            payload_len: 4,
        };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(&[0; 4]);
        assert_eq!(
            decode(&bytes),
            Err(PacketError::PayloadLength {
                packet_type: TYPE_IMU,
                expected: 36,
                actual: 4
            })
        );
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let header = PacketHeader {
            packet_type: 9,
            sensor_id: 0,
            timestamp_ns: 0,
            payload_len: 2,
        };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(&[0xaa, 0xbb, 0x01]);
        let (packet, used) = decode(&bytes).unwrap();
        assert_eq!(packet, Packet::Unknown { header });
        assert_eq!(used, 18);
    }
}
