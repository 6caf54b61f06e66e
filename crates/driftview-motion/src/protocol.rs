use crate::types::{FeedMessage, PoseFrame, SensorEvent, SensorType, TrackingState};
use glam::Vec3;
use std::collections::VecDeque;
use thiserror::Error;

/// Frame marker preceding every packet.
const MAGIC: [u8; 2] = [0xD5, 0x7A];
/// Magic (2) + kind (1) + payload length (2).
const HEADER_LEN: usize = 5;
/// Anything longer is treated as a corrupt length field.
const MAX_PAYLOAD_LEN: usize = 256;

const KIND_ROTATION_VECTOR: u8 = 0x01;
const KIND_LINEAR_ACCELERATION: u8 = 0x02;
const KIND_POSE: u8 = 0x03;

const TIMESTAMP_LEN: usize = 8;
const ACCEL_PAYLOAD_LEN: usize = TIMESTAMP_LEN + 3 * 4;
const POSE_PAYLOAD_LEN: usize = TIMESTAMP_LEN + 1 + 3 * 4;

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("Unknown packet kind {0:#04x}")]
    UnknownKind(u8),
    #[error("Payload for kind {kind:#04x} is {actual} bytes, expected {expected}")]
    PayloadLength {
        kind: u8,
        expected: usize,
        actual: usize,
    },
    #[error("Rotation vector has {0} components, expected 3 to 5")]
    ComponentCount(u8),
    #[error("Unknown tracking state {0}")]
    TrackingState(u8),
    #[error("Declared payload of {0} bytes exceeds frame limit")]
    Oversized(usize),
}

/// Streaming parser for the companion-device feed.
///
/// Feed raw TCP bytes via `push_data`, then drain parsed messages via
/// `next_message`. Bytes before a frame marker are discarded.
pub struct ProtocolParser {
    buffer: VecDeque<u8>,
}

impl ProtocolParser {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(8192),
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Try to extract the next complete message from the buffer.
    /// Returns `None` if no complete packet is available yet.
    pub fn next_message(&mut self) -> Option<Result<FeedMessage, ProtocolError>> {
        let (kind, payload_len) = {
            let buf = self.buffer.make_contiguous();
            let Some(start) = find_pattern(buf, &MAGIC) else {
                // Keep a trailing byte in case it begins the next marker.
                let keep = usize::from(buf.last() == Some(&MAGIC[0]));
                let discard = buf.len() - keep;
                self.buffer.drain(..discard);
                return None;
            };
            self.buffer.drain(..start);

            let buf = self.buffer.make_contiguous();
            if buf.len() < HEADER_LEN {
                return None;
            }
            (buf[2], u16::from_le_bytes([buf[3], buf[4]]) as usize)
        };

        if payload_len > MAX_PAYLOAD_LEN {
            // Skip this marker so the scan resumes past it.
            self.buffer.drain(..1);
            return Some(Err(ProtocolError::Oversized(payload_len)));
        }

        let frame_len = HEADER_LEN + payload_len;
        if self.buffer.len() < frame_len {
            return None;
        }

        let payload: Vec<u8> = self
            .buffer
            .drain(..frame_len)
            .skip(HEADER_LEN)
            .collect();

        Some(parse_payload(kind, &payload))
    }
}

impl Default for ProtocolParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_payload(kind: u8, payload: &[u8]) -> Result<FeedMessage, ProtocolError> {
    let expect_len = |expected: usize| {
        if payload.len() == expected {
            Ok(())
        } else {
            Err(ProtocolError::PayloadLength {
                kind,
                expected,
                actual: payload.len(),
            })
        }
    };

    match kind {
        KIND_ROTATION_VECTOR => {
            if payload.len() < TIMESTAMP_LEN + 1 {
                return Err(ProtocolError::PayloadLength {
                    kind,
                    expected: TIMESTAMP_LEN + 1,
                    actual: payload.len(),
                });
            }
            let count = payload[TIMESTAMP_LEN];
            if !(3..=5).contains(&count) {
                return Err(ProtocolError::ComponentCount(count));
            }
            expect_len(TIMESTAMP_LEN + 1 + 4 * count as usize)?;

            let values = (0..count as usize)
                .map(|i| f32_at(payload, TIMESTAMP_LEN + 1 + 4 * i))
                .collect();
            Ok(FeedMessage::Sensor(SensorEvent {
                timestamp_nanos: i64_at(payload, 0),
                sensor: SensorType::RotationVector,
                values,
            }))
        }
        KIND_LINEAR_ACCELERATION => {
            expect_len(ACCEL_PAYLOAD_LEN)?;
            Ok(FeedMessage::Sensor(SensorEvent {
                timestamp_nanos: i64_at(payload, 0),
                sensor: SensorType::LinearAcceleration,
                values: (0..3).map(|i| f32_at(payload, TIMESTAMP_LEN + 4 * i)).collect(),
            }))
        }
        KIND_POSE => {
            expect_len(POSE_PAYLOAD_LEN)?;
            let tracking = match payload[TIMESTAMP_LEN] {
                0 => TrackingState::Tracking,
                1 => TrackingState::Paused,
                2 => TrackingState::Stopped,
                other => return Err(ProtocolError::TrackingState(other)),
            };
            let base = TIMESTAMP_LEN + 1;
            let translation = Vec3::new(
                f32_at(payload, base),
                f32_at(payload, base + 4),
                f32_at(payload, base + 8),
            );
            Ok(FeedMessage::Pose(PoseFrame::new(
                i64_at(payload, 0),
                tracking,
                translation,
            )))
        }
        other => Err(ProtocolError::UnknownKind(other)),
    }
}

/// Serialize a message into one wire frame.
pub fn encode_message(message: &FeedMessage) -> Vec<u8> {
    let mut payload = Vec::with_capacity(32);
    let kind = match message {
        FeedMessage::Sensor(event) => {
            payload.extend_from_slice(&event.timestamp_nanos.to_le_bytes());
            match event.sensor {
                SensorType::RotationVector => {
                    payload.push(event.values.len() as u8);
                    KIND_ROTATION_VECTOR
                }
                SensorType::LinearAcceleration => KIND_LINEAR_ACCELERATION,
            }
        }
        FeedMessage::Pose(frame) => {
            payload.extend_from_slice(&frame.timestamp_nanos.to_le_bytes());
            payload.push(match frame.tracking {
                TrackingState::Tracking => 0,
                TrackingState::Paused => 1,
                TrackingState::Stopped => 2,
            });
            KIND_POSE
        }
    };
    match message {
        FeedMessage::Sensor(event) => {
            for v in &event.values {
                payload.extend_from_slice(&v.to_le_bytes());
            }
        }
        FeedMessage::Pose(frame) => {
            for v in frame.pose.translation.to_array() {
                payload.extend_from_slice(&v.to_le_bytes());
            }
        }
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&MAGIC);
    frame.push(kind);
    frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.extend_from_slice(&payload);
    frame
}

fn f32_at(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn i64_at(data: &[u8], offset: usize) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    i64::from_le_bytes(bytes)
}

/// Find the first occurrence of `pattern` in `data`.
fn find_pattern(data: &[u8], pattern: &[u8]) -> Option<usize> {
    data.windows(pattern.len())
        .position(|window| window == pattern)
}
