use tracing::debug;
use wgpu::util::DeviceExt;

use crate::asset::{MaterialData, ModelData};

/// Which program a material slot is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialShader {
    /// The renderer's built-in unshaded program.
    Default,
    /// The program held by the scene's shader binding.
    Bound,
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub shader: MaterialShader,
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    pub material: usize,
}

/// Geometry uploaded to the GPU plus its material slots.
pub struct Model {
    pub meshes: Vec<GpuMesh>,
    pub materials: Vec<Material>,
}

impl Model {
    pub fn upload(device: &wgpu::Device, data: &ModelData) -> Self {
        let meshes = data
            .meshes
            .iter()
            .filter(|mesh| !mesh.vertices.is_empty() && !mesh.indices.is_empty())
            .map(|mesh| GpuMesh {
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Vertex Buffer", mesh.name)),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", mesh.name)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                num_indices: mesh.indices.len() as u32,
                material: mesh.material,
            })
            .collect();

        let materials = data.materials.iter().map(Material::from).collect();

        Self { meshes, materials }
    }

    /// A model counts as loaded once it owns at least one drawable mesh.
    pub fn is_loaded(&self) -> bool {
        !self.meshes.is_empty()
    }

    /// Switches every material slot to the bound program.
    pub fn bind_shader(&mut self) {
        for material in &mut self.materials {
            material.shader = MaterialShader::Bound;
            debug!("Bound shader to material {:?}", material.name);
        }
    }

    pub fn material_shader(&self, mesh: &GpuMesh) -> MaterialShader {
        self.materials
            .get(mesh.material)
            .map_or(MaterialShader::Default, |m| m.shader)
    }
}

impl From<&MaterialData> for Material {
    fn from(data: &MaterialData) -> Self {
        Self {
            name: data.name.clone(),
            shader: MaterialShader::Default,
        }
    }
}
