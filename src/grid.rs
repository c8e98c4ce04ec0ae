use wgpu::util::DeviceExt;

use crate::asset::Vertex;

pub const GRID_SLICES: i32 = 10;
pub const GRID_SPACING: f32 = 1.0;

const AXIS_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
const LINE_COLOR: [f32; 4] = [0.75, 0.75, 0.75, 1.0];

/// Line-list vertices for a square grid centred on the origin in the XZ plane.
pub fn grid_vertices(slices: i32, spacing: f32) -> Vec<Vertex> {
    let half = slices / 2;
    let extent = half as f32 * spacing;
    let mut vertices = Vec::with_capacity(((2 * half + 1) * 4) as usize);

    for i in -half..=half {
        let color = if i == 0 { AXIS_COLOR } else { LINE_COLOR };
        let offset = i as f32 * spacing;
        let vertex = |x: f32, z: f32| Vertex {
            position: [x, 0.0, z],
            normal: [0.0, 1.0, 0.0],
            color,
        };

        vertices.push(vertex(offset, -extent));
        vertices.push(vertex(offset, extent));
        vertices.push(vertex(-extent, offset));
        vertices.push(vertex(extent, offset));
    }

    vertices
}

pub struct Grid {
    pub vertex_buffer: wgpu::Buffer,
    pub num_vertices: u32,
}

impl Grid {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertices = grid_vertices(GRID_SLICES, GRID_SPACING);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            vertex_buffer,
            num_vertices: vertices.len() as u32,
        }
    }
}
