use std::collections::HashSet;
use std::path::Path;

use glam::{IVec3, Mat3, Mat4, Vec3};
use thiserror::Error;
use tobj::LoadOptions;
use tracing::{debug, info};

/// Hint shown whenever a model cannot be opened.
pub const SUPPORTED_FORMATS: &str = "Supported formats: .obj, .gltf, .glb, .vox";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unsupported model format: {0:?}")]
    UnsupportedFormat(String),

    #[error("failed to parse OBJ file: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("failed to parse glTF file: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse VOX file: {0}")]
    Vox(String),

    #[error("mesh {0:?} has no position data")]
    MissingPositions(String),

    #[error("model contains no meshes")]
    NoMeshes,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub diffuse: [f32; 4],
}

impl MaterialData {
    fn default_white() -> Self {
        Self {
            name: "default".to_string(),
            diffuse: [1.0; 4],
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: usize,
}

/// Geometry and material slots read from a model file.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

impl ModelData {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }
}

/// Intermediate mesh before material slots are resolved.
struct RawMesh {
    name: String,
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    colors: Option<Vec<[f32; 4]>>,
    indices: Vec<u32>,
    material: Option<usize>,
}

pub fn load_model(path: impl AsRef<Path>) -> Result<ModelData, AssetError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (raw, materials) = match extension.as_str() {
        "obj" => load_obj(path)?,
        "gltf" | "glb" => load_gltf(path)?,
        "vox" => load_vox(path)?,
        _ => return Err(AssetError::UnsupportedFormat(extension)),
    };

    let model = assemble(raw, materials)?;
    info!(
        "Loaded {:?}: {} meshes, {} materials, {} vertices",
        path,
        model.meshes.len(),
        model.materials.len(),
        model.vertex_count()
    );
    Ok(model)
}

fn load_obj(path: &Path) -> Result<(Vec<RawMesh>, Vec<MaterialData>), AssetError> {
    let (models, materials) = tobj::load_obj(
        path,
        &LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    // A missing or broken .mtl only costs us the colours.
    let materials = match materials {
        Ok(materials) => materials
            .into_iter()
            .map(|m| {
                let [r, g, b] = m.diffuse.unwrap_or([1.0, 1.0, 1.0]);
                MaterialData {
                    name: m.name,
                    diffuse: [r, g, b, m.dissolve.unwrap_or(1.0)],
                }
            })
            .collect(),
        Err(e) => {
            debug!("No usable materials for {:?}: {}", path, e);
            Vec::new()
        }
    };

    let meshes = models
        .into_iter()
        .map(|model| {
            let mesh = model.mesh;
            let positions = to_vec3(&mesh.positions);
            let normals = (mesh.normals.len() == mesh.positions.len()
                && !mesh.normals.is_empty())
            .then(|| to_vec3(&mesh.normals));
            let colors = (mesh.vertex_color.len() == mesh.positions.len()
                && !mesh.vertex_color.is_empty())
            .then(|| {
                mesh.vertex_color
                    .chunks_exact(3)
                    .map(|c| [c[0], c[1], c[2], 1.0])
                    .collect()
            });
            let indices = if mesh.indices.is_empty() {
                (0..positions.len() as u32).collect()
            } else {
                mesh.indices
            };

            RawMesh {
                name: model.name,
                positions,
                normals,
                colors,
                indices,
                material: mesh.material_id,
            }
        })
        .collect();

    Ok((meshes, materials))
}

fn load_gltf(path: &Path) -> Result<(Vec<RawMesh>, Vec<MaterialData>), AssetError> {
    let (document, buffers, _images) = gltf::import(path)?;

    let materials = document
        .materials()
        .enumerate()
        .map(|(idx, m)| MaterialData {
            name: m
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("material_{idx}")),
            diffuse: m.pbr_metallic_roughness().base_color_factor(),
        })
        .collect();

    let mut meshes = Vec::new();
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            process_node(&node, Mat4::IDENTITY, &buffers, &mut meshes)?;
        }
    }

    Ok((meshes, materials))
}

fn process_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    meshes: &mut Vec<RawMesh>,
) -> Result<(), AssetError> {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();

    if let Some(mesh) = node.mesh() {
        let name = mesh.name().unwrap_or("unnamed").to_string();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                debug!("Skipping non-triangle primitive in mesh {:?}", name);
                continue;
            }
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<Vec3> = reader
                .read_positions()
                .ok_or_else(|| AssetError::MissingPositions(name.clone()))?
                .map(|p| transform.transform_point3(Vec3::from(p)))
                .collect();
            let normals = reader.read_normals().map(|iter| {
                iter.map(|n| (normal_matrix * Vec3::from(n)).normalize_or_zero())
                    .collect()
            });
            let colors = reader
                .read_colors(0)
                .map(|iter| iter.into_rgba_f32().collect());
            let indices = reader
                .read_indices()
                .map(|iter| iter.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            meshes.push(RawMesh {
                name: name.clone(),
                positions,
                normals,
                colors,
                indices,
                material: primitive.material().index(),
            });
        }
    }

    for child in node.children() {
        process_node(&child, transform, buffers, meshes)?;
    }

    Ok(())
}

/// Unit cube faces: outward normal, then corners counter-clockwise from outside.
const CUBE_FACES: [([i32; 3], [[f32; 3]; 4]); 6] = [
    ([1, 0, 0], [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
    ([-1, 0, 0], [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]]),
    ([0, 1, 0], [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]]),
    ([0, -1, 0], [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
    ([0, 0, 1], [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]]),
    ([0, 0, -1], [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
];

fn load_vox(path: &Path) -> Result<(Vec<RawMesh>, Vec<MaterialData>), AssetError> {
    // Read through std so non-UTF-8 paths work.
    let bytes = std::fs::read(path)?;
    let data = dot_vox::load_bytes(&bytes).map_err(|e| AssetError::Vox(e.to_string()))?;

    let meshes = data
        .models
        .iter()
        .enumerate()
        .map(|(idx, model)| voxel_mesh(format!("voxels_{idx}"), model, &data.palette))
        .collect();

    // Colour comes from the palette per vertex; the slot stays default white.
    Ok((meshes, Vec::new()))
}

/// One cube per voxel, skipping faces shared with a neighbour.
fn voxel_mesh(name: String, model: &dot_vox::Model, palette: &[dot_vox::Color]) -> RawMesh {
    // MagicaVoxel is Z-up. Rotate into Y-up and centre on the origin.
    let depth = model.size.y as i32;
    let cell = |v: &dot_vox::Voxel| IVec3::new(v.x as i32, v.z as i32, depth - 1 - v.y as i32);
    let center = Vec3::new(
        model.size.x as f32,
        model.size.z as f32,
        model.size.y as f32,
    ) * 0.5;

    let occupied: HashSet<IVec3> = model.voxels.iter().map(cell).collect();

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut colors = Vec::new();
    let mut indices = Vec::new();

    for voxel in &model.voxels {
        let origin = cell(voxel);
        let color = palette.get(voxel.i as usize).map_or([1.0; 4], |c| {
            [c.r, c.g, c.b, c.a].map(|channel| channel as f32 / 255.0)
        });

        for (normal, corners) in &CUBE_FACES {
            let normal = IVec3::from_array(*normal);
            if occupied.contains(&(origin + normal)) {
                continue;
            }
            let base = positions.len() as u32;
            for corner in corners {
                positions.push(origin.as_vec3() + Vec3::from_array(*corner) - center);
                normals.push(normal.as_vec3());
                colors.push(color);
            }
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    RawMesh {
        name,
        positions,
        normals: Some(normals),
        colors: Some(colors),
        indices,
        material: None,
    }
}

/// Resolves material slots and builds interleaved vertices.
fn assemble(
    raw: Vec<RawMesh>,
    mut materials: Vec<MaterialData>,
) -> Result<ModelData, AssetError> {
    let raw: Vec<RawMesh> = raw.into_iter().filter(|m| !m.positions.is_empty()).collect();
    if raw.is_empty() {
        return Err(AssetError::NoMeshes);
    }

    let needs_default = raw
        .iter()
        .any(|m| m.material.map_or(true, |idx| idx >= materials.len()));
    let default_slot = materials.len();
    if needs_default {
        materials.push(MaterialData::default_white());
    }

    let meshes = raw
        .into_iter()
        .map(|mesh| {
            let material = mesh
                .material
                .filter(|&idx| idx < default_slot)
                .unwrap_or(default_slot);
            let count = mesh.positions.len();
            let indices = valid_triangles(&mesh.indices, count);
            if indices.len() != mesh.indices.len() {
                debug!(
                    "Dropped {} indices out of range in mesh {:?}",
                    mesh.indices.len() - indices.len(),
                    mesh.name
                );
            }

            // Attributes must cover every position to be usable.
            let normals = match mesh.normals.filter(|n| n.len() == count) {
                Some(normals) => normals,
                None => generate_normals(&mesh.positions, &indices),
            };
            let colors = mesh.colors.filter(|c| c.len() == count);
            let diffuse = materials[material].diffuse;

            let vertices = mesh
                .positions
                .iter()
                .enumerate()
                .map(|(i, position)| {
                    let tint = colors.as_ref().map_or([1.0; 4], |c| c[i]);
                    Vertex {
                        position: position.to_array(),
                        normal: normals[i].to_array(),
                        color: [
                            diffuse[0] * tint[0],
                            diffuse[1] * tint[1],
                            diffuse[2] * tint[2],
                            diffuse[3] * tint[3],
                        ],
                    }
                })
                .collect();

            MeshData {
                name: mesh.name,
                vertices,
                indices,
                material,
            }
        })
        .collect();

    Ok(ModelData { meshes, materials })
}

/// Whole triangles whose corners all index into `vertex_count` vertices.
fn valid_triangles(indices: &[u32], vertex_count: usize) -> Vec<u32> {
    indices
        .chunks_exact(3)
        .filter(|tri| tri.iter().all(|&i| (i as usize) < vertex_count))
        .flatten()
        .copied()
        .collect()
}

/// Area-weighted vertex normals from triangle faces.
fn generate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        // Unnormalized cross product weights each face by its area.
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    normals
        .into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            if n == Vec3::ZERO {
                Vec3::Y
            } else {
                n
            }
        })
        .collect()
}

fn to_vec3(flat: &[f32]) -> Vec<Vec3> {
    flat.chunks_exact(3).map(Vec3::from_slice).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("model-viewer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const QUAD_OBJ: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
f 1 3 2
f 1 4 3
";

    #[test]
    fn loads_obj_without_normals() {
        let path = write_temp("quad.obj", QUAD_OBJ);
        let model = load_model(&path).unwrap();

        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
            assert_eq!(v.color, [1.0; 4]);
        }
    }

    #[test]
    fn meshes_without_material_get_default_slot() {
        let path = write_temp("slots.obj", QUAD_OBJ);
        let model = load_model(&path).unwrap();

        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0], MaterialData::default_white());
        assert_eq!(model.meshes[0].material, 0);
    }

    #[test]
    fn empty_obj_has_no_meshes() {
        let path = write_temp("empty.obj", "# nothing here\n");
        assert!(matches!(load_model(&path), Err(AssetError::NoMeshes)));
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("model-viewer-does-not-exist.obj");
        assert!(matches!(load_model(&path), Err(AssetError::Obj(_))));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let path = write_temp("model.stl", "solid x\nendsolid x\n");
        assert!(matches!(
            load_model(&path),
            Err(AssetError::UnsupportedFormat(ext)) if ext == "stl"
        ));
    }

    #[test]
    fn obj_colours_come_from_mtl() {
        write_temp("red.mtl", "newmtl red\nKd 1.0 0.0 0.0\n");
        let path = write_temp("red_quad.obj", format!("mtllib red.mtl\nusemtl red\n{QUAD_OBJ}"));
        let model = load_model(&path).unwrap();

        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].name, "red");
        assert_eq!(model.materials[0].diffuse, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(model.meshes[0].material, 0);
        for v in &model.meshes[0].vertices {
            assert_eq!(v.color, [1.0, 0.0, 0.0, 1.0]);
        }
    }

    /// Writes a one-triangle glTF whose buffer sits next to it as a `.bin`.
    fn write_triangle_gltf(name: &str, normal: [f32; 3], normal_count: usize, node: &str) -> PathBuf {
        let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mut bin = Vec::new();
        for v in positions.iter().chain(std::iter::repeat(&normal).take(normal_count)) {
            for c in v {
                bin.extend(c.to_le_bytes());
            }
        }
        let bin_name = format!("{name}.bin");
        write_temp(&bin_name, &bin);

        let json = format!(
            r#"{{
  "asset": {{"version": "2.0"}},
  "scenes": [{{"nodes": [0]}}],
  "nodes": [{{"mesh": 0{node}}}],
  "meshes": [{{"name": "tri", "primitives": [{{"attributes": {{"POSITION": 0, "NORMAL": 1}}, "material": 0}}]}}],
  "materials": [{{"name": "red", "pbrMetallicRoughness": {{"baseColorFactor": [1.0, 0.0, 0.0, 1.0]}}}}],
  "buffers": [{{"uri": "{bin_name}", "byteLength": {len}}}],
  "bufferViews": [
    {{"buffer": 0, "byteOffset": 0, "byteLength": 36}},
    {{"buffer": 0, "byteOffset": 36, "byteLength": {normal_len}}}
  ],
  "accessors": [
    {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}},
    {{"bufferView": 1, "componentType": 5126, "count": {normal_count}, "type": "VEC3"}}
  ]
}}"#,
            len = bin.len(),
            normal_len = normal_count * 12,
        );
        write_temp(&format!("{name}.gltf"), json)
    }

    #[test]
    fn gltf_bakes_node_transform_and_material() {
        let path = write_triangle_gltf("moved", [0.0, 0.0, 1.0], 3, r#", "translation": [0.0, 2.0, 0.0]"#);
        let model = load_model(&path).unwrap();

        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].name, "red");

        let mesh = &model.meshes[0];
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.material, 0);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        let ys: Vec<f32> = mesh.vertices.iter().map(|v| v.position[1]).collect();
        assert_eq!(ys, vec![2.0, 2.0, 3.0]);
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
            assert_eq!(v.color, [1.0, 0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn gltf_short_normal_stream_is_regenerated() {
        // Two normals for three positions; the file's +X normals are discarded.
        let path = write_triangle_gltf("short_normals", [1.0, 0.0, 0.0], 2, "");
        let model = load_model(&path).unwrap();

        let mesh = &model.meshes[0];
        assert_eq!(mesh.vertices.len(), 3);
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    fn triangle(indices: Vec<u32>) -> RawMesh {
        RawMesh {
            name: "tri".to_string(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: None,
            colors: None,
            indices,
            material: None,
        }
    }

    #[test]
    fn mismatched_attributes_are_ignored() {
        let mut mesh = triangle(vec![0, 1, 2]);
        mesh.normals = Some(vec![Vec3::X]);
        mesh.colors = Some(vec![[0.0; 4]; 5]);

        let model = assemble(vec![mesh], Vec::new()).unwrap();
        for v in &model.meshes[0].vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
            assert_eq!(v.color, [1.0; 4]);
        }
    }

    #[test]
    fn out_of_range_triangles_are_dropped() {
        let model = assemble(vec![triangle(vec![0, 1, 2, 0, 1, 9, 2, 1])], Vec::new()).unwrap();
        assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);
    }

    fn voxel(x: u8, y: u8, z: u8, i: u8) -> dot_vox::Voxel {
        dot_vox::Voxel { x, y, z, i }
    }

    #[test]
    fn single_voxel_is_a_closed_cube() {
        let model = dot_vox::Model {
            size: dot_vox::Size { x: 1, y: 1, z: 1 },
            voxels: vec![voxel(0, 0, 0, 0)],
        };
        let palette = [dot_vox::Color { r: 255, g: 0, b: 0, a: 255 }];
        let mesh = voxel_mesh("cube".to_string(), &model, &palette);

        assert_eq!(mesh.positions.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for p in &mesh.positions {
            assert_eq!(p.abs(), Vec3::splat(0.5));
        }
        assert!(mesh
            .colors
            .as_ref()
            .unwrap()
            .iter()
            .all(|c| *c == [1.0, 0.0, 0.0, 1.0]));

        // Every triangle winds counter-clockwise around its outward normal.
        let normals = mesh.normals.as_ref().unwrap();
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.positions[i as usize]);
            let face = (b - a).cross(c - a).normalize();
            let normal = normals[tri[0] as usize];
            assert!((face - normal).length() < 1e-6);
            assert!(((a + b + c) / 3.0).dot(normal) > 0.0);
        }
    }

    #[test]
    fn shared_voxel_faces_are_culled() {
        let model = dot_vox::Model {
            size: dot_vox::Size { x: 2, y: 1, z: 1 },
            voxels: vec![voxel(0, 0, 0, 0), voxel(1, 0, 0, 7)],
        };
        let mesh = voxel_mesh("pair".to_string(), &model, &[]);

        assert_eq!(mesh.positions.len(), 10 * 4);
        assert_eq!(mesh.indices.len(), 10 * 6);
        assert!(mesh.colors.unwrap().iter().all(|c| *c == [1.0; 4]));
    }

    #[test]
    fn voxel_z_axis_points_up() {
        let model = dot_vox::Model {
            size: dot_vox::Size { x: 1, y: 1, z: 2 },
            voxels: vec![voxel(0, 0, 1, 0)],
        };
        let mesh = voxel_mesh("top".to_string(), &model, &[]);
        assert!(mesh.positions.iter().all(|p| p.y >= 0.0));
    }

    /// A minimal MagicaVoxel file: header, then MAIN holding SIZE and XYZI.
    fn vox_file(size: [u32; 3], voxels: &[[u8; 4]]) -> Vec<u8> {
        fn chunk(id: &[u8; 4], content: &[u8], children: &[u8]) -> Vec<u8> {
            let mut out = id.to_vec();
            out.extend((content.len() as u32).to_le_bytes());
            out.extend((children.len() as u32).to_le_bytes());
            out.extend(content);
            out.extend(children);
            out
        }

        let size: Vec<u8> = size.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut xyzi = (voxels.len() as u32).to_le_bytes().to_vec();
        xyzi.extend(voxels.iter().flatten());

        let mut children = chunk(b"SIZE", &size, &[]);
        children.extend(chunk(b"XYZI", &xyzi, &[]));

        let mut file = b"VOX ".to_vec();
        file.extend(150u32.to_le_bytes());
        file.extend(chunk(b"MAIN", &[], &children));
        file
    }

    #[test]
    fn loads_vox_file() {
        let path = write_temp("pair.vox", vox_file([2, 1, 1], &[[0, 0, 0, 1], [1, 0, 0, 1]]));
        let model = load_model(&path).unwrap();

        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.materials, vec![MaterialData::default_white()]);
        assert_eq!(model.vertex_count(), 40);
        assert_eq!(model.meshes[0].indices.len(), 60);
    }

    #[test]
    fn corrupt_vox_is_an_error() {
        let path = write_temp("broken.vox", "not a voxel file");
        assert!(matches!(load_model(&path), Err(AssetError::Vox(_))));
    }

    #[test]
    fn generated_normals_follow_winding() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let normals = generate_normals(&positions, &[0, 1, 2]);
        for n in normals {
            assert!((n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn unreferenced_vertices_default_to_up() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        let normals = generate_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals[3], Vec3::Y);
    }
}
