use glam::{Affine2, Mat4, Vec3, Vec4};

/// Clip space from window pixels (origin top-left, Y down).
pub fn clip_from_screen(width: f32, height: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(-1.0, 1.0, 0.0))
        * Mat4::from_scale(Vec3::new(2.0 / width, -2.0 / height, 1.0))
}

/// Clip space from world meters, given the viewport's world-to-screen transform.
pub fn clip_from_world(world_to_screen: Affine2, width: f32, height: f32) -> Mat4 {
    clip_from_screen(width, height) * affine_to_mat4(world_to_screen)
}

/// Embed a 2D affine transform in the XY plane of a 4x4 matrix.
fn affine_to_mat4(a: Affine2) -> Mat4 {
    Mat4::from_cols(
        a.matrix2.x_axis.extend(0.0).extend(0.0),
        a.matrix2.y_axis.extend(0.0).extend(0.0),
        Vec4::Z,
        a.translation.extend(0.0).extend(1.0),
    )
}
