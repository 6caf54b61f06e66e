use crate::frame::{Disc, Frame, Stroke};
use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Triangles per origin marker.
const DISC_SEGMENTS: u32 = 24;

/// Vertex format for path geometry.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PathVertex {
    /// World position in meters.
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl PathVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // color
                wgpu::VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// A non-indexed triangle list.
#[derive(Debug, Default)]
pub struct PathMesh {
    pub vertices: Vec<PathVertex>,
}

impl PathMesh {
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn push_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) {
        for p in [a, b, c] {
            self.vertices.push(PathVertex {
                position: p.to_array(),
                color,
            });
        }
    }
}

/// Turn a frame into triangles, in paint order.
pub fn tessellate(frame: &Frame<'_>) -> PathMesh {
    let segments: usize = frame
        .strokes()
        .map(|s| s.points.len().saturating_sub(1))
        .sum();
    let mut mesh = PathMesh {
        vertices: Vec::with_capacity(segments * 6 + DISC_SEGMENTS as usize * 3),
    };

    for stroke in frame.strokes() {
        push_stroke(&mut mesh, stroke);
    }
    push_disc(&mut mesh, &frame.marker);
    mesh
}

/// One quad per segment, extended by half the width at both ends so joints
/// between consecutive segments have no gaps.
fn push_stroke(mesh: &mut PathMesh, stroke: &Stroke<'_>) {
    let half = stroke.width / 2.0;

    for pair in stroke.points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let Some(dir) = (b - a).try_normalize() else {
            continue;
        };
        let along = dir * half;
        let across = dir.perp() * half;
        let start = a - along;
        let end = b + along;

        let p0 = start + across;
        let p1 = start - across;
        let p2 = end + across;
        let p3 = end - across;
        mesh.push_triangle(p0, p1, p2, stroke.color);
        mesh.push_triangle(p2, p1, p3, stroke.color);
    }
}

fn push_disc(mesh: &mut PathMesh, disc: &Disc) {
    let step = std::f32::consts::TAU / DISC_SEGMENTS as f32;
    let rim = |i: u32| disc.center + Vec2::from_angle(i as f32 * step) * disc.radius;

    for i in 0..DISC_SEGMENTS {
        mesh.push_triangle(disc.center, rim(i), rim(i + 1), disc.color);
    }
}
