//! Fixed-layout telemetry record.
//!
//! All values are little-endian. The record is 188 bytes long; the four
//! 4-byte gaps after `a`, `f`, `k`, `p` and `u` are reserved by the firmware
//! and never decoded.

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use tracing::trace;

use crate::error::{ProtoError, Result};

/// Number of oscillators reported in each record.
pub const OSCILLATOR_COUNT: usize = 4;

/// Size of a complete telemetry payload.
pub const TELEMETRY_RECORD_LEN: usize = 188;

/// Smallest payload accepted: timestamp plus the first oscillator's
/// frequency and amplitude.
pub const TELEMETRY_MIN_LEN: usize = 12;

const TIMESTAMP: usize = 0;
const OSCILLATORS: usize = 4;
const OSCILLATOR_STRIDE: usize = 20;
const A: usize = 84;
const GYRO: usize = 92;
const F: usize = 104;
const ACCEL: usize = 112;
const K: usize = 124;
const MAG: usize = 132;
const P: usize = 144;
const GRAVITY: usize = 152;
const U: usize = 164;
const ROTATION: usize = 172;

/// Live state of one oscillator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OscillatorState {
    pub frequency: f32,
    pub amplitude: f32,
    pub offset: f32,
    pub phase_shift: f32,
    pub phase: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// IMU block. Each vector is preceded by a scalar whose meaning is
/// firmware-defined (accuracy or status); they are passed through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Imu {
    pub a: f32,
    pub gyro: Vec3,
    pub f: f32,
    pub accel: Vec3,
    pub k: f32,
    pub mag: Vec3,
    pub p: f32,
    pub gravity: Vec3,
    pub u: f32,
    pub rotation: Quaternion,
}

/// One decoded telemetry payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// Controller clock, as sent.
    pub timestamp: u32,
    pub oscillators: [OscillatorState; OSCILLATOR_COUNT],
    pub imu: Imu,
    /// `false` when the payload was shorter than [`TELEMETRY_RECORD_LEN`]
    /// and missing fields were left at zero.
    pub complete: bool,
}

impl TelemetryRecord {
    /// Decode a telemetry payload (the bytes after the opcode).
    ///
    /// Payloads shorter than [`TELEMETRY_MIN_LEN`] are rejected. Fields past
    /// the end of a shorter-than-full payload read as `0.0`; bytes past
    /// [`TELEMETRY_RECORD_LEN`] are ignored.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < TELEMETRY_MIN_LEN {
            return Err(ProtoError::PayloadTooShort {
                len: payload.len(),
                min: TELEMETRY_MIN_LEN,
            });
        }

        let complete = payload.len() >= TELEMETRY_RECORD_LEN;
        if !complete {
            trace!(len = payload.len(), "partial telemetry record");
        }

        let f = |offset| f32_at(payload, offset);
        let vec3 = |offset| Vec3 {
            x: f(offset),
            y: f(offset + 4),
            z: f(offset + 8),
        };

        let mut oscillators = [OscillatorState::default(); OSCILLATOR_COUNT];
        for (i, osc) in oscillators.iter_mut().enumerate() {
            let base = OSCILLATORS + i * OSCILLATOR_STRIDE;
            *osc = OscillatorState {
                frequency: f(base),
                amplitude: f(base + 4),
                offset: f(base + 8),
                phase_shift: f(base + 12),
                phase: f(base + 16),
            };
        }

        Ok(Self {
            timestamp: u32_at(payload, TIMESTAMP),
            oscillators,
            imu: Imu {
                a: f(A),
                gyro: vec3(GYRO),
                f: f(F),
                accel: vec3(ACCEL),
                k: f(K),
                mag: vec3(MAG),
                p: f(P),
                gravity: vec3(GRAVITY),
                u: f(U),
                rotation: Quaternion {
                    x: f(ROTATION),
                    y: f(ROTATION + 4),
                    z: f(ROTATION + 8),
                    w: f(ROTATION + 12),
                },
            },
            complete,
        })
    }

    /// Write the full 188-byte payload, reserved gaps zeroed.
    ///
    /// Used by device emulators and tests; the host never sends telemetry.
    pub fn encode(&self, dst: &mut BytesMut) {
        let mut raw = [0u8; TELEMETRY_RECORD_LEN];
        let mut put = |offset: usize, value: f32| {
            raw[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        };

        for (i, osc) in self.oscillators.iter().enumerate() {
            let base = OSCILLATORS + i * OSCILLATOR_STRIDE;
            put(base, osc.frequency);
            put(base + 4, osc.amplitude);
            put(base + 8, osc.offset);
            put(base + 12, osc.phase_shift);
            put(base + 16, osc.phase);
        }

        let imu = &self.imu;
        for (offset, scalar, v) in [
            (A, imu.a, imu.gyro),
            (F, imu.f, imu.accel),
            (K, imu.k, imu.mag),
            (P, imu.p, imu.gravity),
        ] {
            put(offset, scalar);
            put(offset + 8, v.x);
            put(offset + 12, v.y);
            put(offset + 16, v.z);
        }
        put(U, imu.u);
        put(ROTATION, imu.rotation.x);
        put(ROTATION + 4, imu.rotation.y);
        put(ROTATION + 8, imu.rotation.z);
        put(ROTATION + 12, imu.rotation.w);

        raw[TIMESTAMP..TIMESTAMP + 4].copy_from_slice(&self.timestamp.to_le_bytes());
        dst.put_slice(&raw);
    }
}

fn u32_at(payload: &[u8], offset: usize) -> u32 {
    payload
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map_or(0, u32::from_le_bytes)
}

fn f32_at(payload: &[u8], offset: usize) -> f32 {
    payload
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map_or(0.0, f32::from_le_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(buf: &mut [u8], offset: usize, value: f32) {
        buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn eleven_bytes_is_too_short() {
        let err = TelemetryRecord::decode(&[0u8; 11]).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::PayloadTooShort { len: 11, min: 12 }
        ));
    }

    #[test]
    fn crafted_identity_record() {
        let mut payload = [0u8; TELEMETRY_RECORD_LEN];
        payload[..4].copy_from_slice(&1000u32.to_le_bytes());
        put(&mut payload, 184, 1.0);

        let record = TelemetryRecord::decode(&payload).unwrap();
        assert_eq!(record.timestamp, 1000);
        assert!(record.complete);
        for osc in record.oscillators {
            assert_eq!(osc, OscillatorState::default());
        }
        assert_eq!(
            record.imu.rotation,
            Quaternion {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                w: 1.0
            }
        );
    }

    #[test]
    fn every_offset_is_distinct() {
        // Every 4-byte slot gets its own value; reserved gaps get a poison value.
        let mut payload = [0u8; TELEMETRY_RECORD_LEN];
        payload[..4].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        for slot in 1..TELEMETRY_RECORD_LEN / 4 {
            put(&mut payload, slot * 4, slot as f32);
        }
        for gap in [88, 108, 128, 148, 168] {
            put(&mut payload, gap, -999.0);
        }

        let r = TelemetryRecord::decode(&payload).unwrap();
        assert_eq!(r.timestamp, 0xDEAD_BEEF);

        for (i, osc) in r.oscillators.iter().enumerate() {
            let base = (1 + i * 5) as f32;
            assert_eq!(osc.frequency, base);
            assert_eq!(osc.amplitude, base + 1.0);
            assert_eq!(osc.offset, base + 2.0);
            assert_eq!(osc.phase_shift, base + 3.0);
            assert_eq!(osc.phase, base + 4.0);
        }

        let imu = r.imu;
        assert_eq!(imu.a, 21.0);
        assert_eq!((imu.gyro.x, imu.gyro.y, imu.gyro.z), (23.0, 24.0, 25.0));
        assert_eq!(imu.f, 26.0);
        assert_eq!((imu.accel.x, imu.accel.y, imu.accel.z), (28.0, 29.0, 30.0));
        assert_eq!(imu.k, 31.0);
        assert_eq!((imu.mag.x, imu.mag.y, imu.mag.z), (33.0, 34.0, 35.0));
        assert_eq!(imu.p, 36.0);
        assert_eq!(
            (imu.gravity.x, imu.gravity.y, imu.gravity.z),
            (38.0, 39.0, 40.0)
        );
        assert_eq!(imu.u, 41.0);
        assert_eq!(
            imu.rotation,
            Quaternion {
                x: 43.0,
                y: 44.0,
                z: 45.0,
                w: 46.0
            }
        );
    }

    #[test]
    fn partial_record_zero_fills() {
        let mut payload = vec![0u8; 30];
        payload[..4].copy_from_slice(&7u32.to_le_bytes());
        put(&mut payload, 4, 1.5);
        put(&mut payload, 24, 2.5);
        // Bytes 28..30 are an incomplete field and must not be read.
        payload[28] = 0xFF;
        payload[29] = 0xFF;

        let r = TelemetryRecord::decode(&payload).unwrap();
        assert!(!r.complete);
        assert_eq!(r.timestamp, 7);
        assert_eq!(r.oscillators[0].frequency, 1.5);
        assert_eq!(r.oscillators[1].frequency, 2.5);
        assert_eq!(r.oscillators[1].amplitude, 0.0);
        assert_eq!(r.imu, Imu::default());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut payload = vec![0u8; TELEMETRY_RECORD_LEN];
        put(&mut payload, 184, 1.0);
        let exact = TelemetryRecord::decode(&payload).unwrap();

        payload.extend_from_slice(&[0xAB; 16]);
        let padded = TelemetryRecord::decode(&payload).unwrap();
        assert_eq!(exact, padded);
        assert!(padded.complete);
    }

    #[test]
    fn encode_then_decode_preserves_fields() {
        let mut record = TelemetryRecord {
            timestamp: 42,
            complete: true,
            ..Default::default()
        };
        record.oscillators[2].phase = 3.25;
        record.imu.gravity.z = -9.81;
        record.imu.rotation.w = 1.0;
        record.imu.p = 2.0;

        let mut buf = BytesMut::new();
        record.encode(&mut buf);
        assert_eq!(buf.len(), TELEMETRY_RECORD_LEN);
        for gap in [88, 108, 128, 148, 168] {
            assert_eq!(&buf[gap..gap + 4], &[0, 0, 0, 0]);
        }
        assert_eq!(TelemetryRecord::decode(&buf).unwrap(), record);
    }

    #[test]
    fn serializes_nested_fields() {
        let record = TelemetryRecord::default();
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["timestamp"], 0);
        assert_eq!(json["oscillators"].as_array().unwrap().len(), 4);
        assert_eq!(json["imu"]["rotation"]["w"], 0.0);
        assert_eq!(json["complete"], false);
    }
}
