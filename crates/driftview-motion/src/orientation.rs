use crate::types::Rotation;
use glam::{Mat3, Vec3};

/// Holds the latest device-to-world rotation from the rotation-vector sensor.
///
/// Each sample replaces the previous rotation wholesale. Readers get whatever
/// was observed last, with no regard for how old it is relative to other
/// sensor channels.
#[derive(Debug, Default)]
pub struct OrientationTracker {
    rotation: Rotation,
}

impl OrientationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored rotation with one built from a raw rotation vector.
    pub fn update_orientation(&mut self, values: &[f32]) {
        self.rotation = rotation_from_vector(values);
    }

    /// Snapshot of the current rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }
}

/// Build a rotation matrix from a rotation-vector sample.
///
/// `values` holds the quaternion vector part `(x, y, z)` and, when present,
/// the scalar part `w` in slot 3. Without `w` it is reconstructed as
/// `sqrt(1 - x^2 - y^2 - z^2)`, floored at zero. The quaternion is used as
/// given: no normalization, no validation. Missing components read as zero.
pub fn rotation_from_vector(values: &[f32]) -> Rotation {
    let component = |i: usize| values.get(i).copied().unwrap_or(0.0);
    let q1 = component(0);
    let q2 = component(1);
    let q3 = component(2);
    let q0 = if values.len() >= 4 {
        values[3]
    } else {
        let w2 = 1.0 - q1 * q1 - q2 * q2 - q3 * q3;
        if w2 > 0.0 {
            w2.sqrt()
        } else {
            0.0
        }
    };

    let sq_q1 = 2.0 * q1 * q1;
    let sq_q2 = 2.0 * q2 * q2;
    let sq_q3 = 2.0 * q3 * q3;
    let q1_q2 = 2.0 * q1 * q2;
    let q3_q0 = 2.0 * q3 * q0;
    let q1_q3 = 2.0 * q1 * q3;
    let q2_q0 = 2.0 * q2 * q0;
    let q2_q3 = 2.0 * q2 * q3;
    let q1_q0 = 2.0 * q1 * q0;

    // Columns of the row-major matrix
    //   | 1-2y²-2z²   2xy-2zw     2xz+2yw   |
    //   | 2xy+2zw     1-2x²-2z²   2yz-2xw   |
    //   | 2xz-2yw     2yz+2xw     1-2x²-2y² |
    Rotation(Mat3::from_cols(
        Vec3::new(1.0 - sq_q2 - sq_q3, q1_q2 + q3_q0, q1_q3 - q2_q0),
        Vec3::new(q1_q2 - q3_q0, 1.0 - sq_q1 - sq_q3, q2_q3 + q1_q0),
        Vec3::new(q1_q3 + q2_q0, q2_q3 - q1_q0, 1.0 - sq_q1 - sq_q2),
    ))
}
