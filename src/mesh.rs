// mesh.rs - UV sphere seen from the inside

use bytemuck::{Pod, Zeroable};
use std::f32::consts::PI;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub vertices: Vec<SphereVertex>,
    pub indices: Vec<u32>,
}

/// Build a sphere centred on the origin for a camera sitting inside it.
///
/// `segments` is the number of slices around the equator; the poles get
/// half as many stacks. The image centre (`u = 0.5`) lands on -Z, the
/// camera's rest forward axis, with `u` growing towards +X so the image is
/// not mirrored when seen from the centre. Triangles wind counter-clockwise
/// as seen from inside.
pub fn build_interior_sphere(radius: f32, segments: usize) -> SphereMesh {
    let slices = segments.max(3);
    let stacks = (segments / 2).max(2);

    let mut vertices = Vec::with_capacity((stacks + 1) * (slices + 1));
    let mut indices = Vec::with_capacity(stacks * slices * 6);

    for i in 0..=stacks {
        // polar angle from +Y
        let theta = PI * (i as f32) / (stacks as f32);
        let y = radius * theta.cos();
        let ring = radius * theta.sin();

        for j in 0..=slices {
            let u = (j as f32) / (slices as f32);
            // longitude measured from -Z
            let phi = 2.0 * PI * u - PI;
            vertices.push(SphereVertex {
                position: [ring * phi.sin(), y, -ring * phi.cos()],
                uv: [u, (i as f32) / (stacks as f32)],
            });
        }
    }

    let row = (slices + 1) as u32;
    for i in 0..stacks as u32 {
        for j in 0..slices as u32 {
            let a = i * row + j;
            let b = a + row;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    SphereMesh { vertices, indices }
}
