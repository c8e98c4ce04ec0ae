use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3, Vec4};
use thiserror::Error;
use tracing::debug;

use crate::asset::Vertex;

/// Ambient occlusion program, read relative to the working directory.
pub const AO_VERTEX_PATH: &str = "shaders/ao_vs.wgsl";
pub const AO_FRAGMENT_PATH: &str = "shaders/ao_fs.wgsl";

pub const DEFAULT_SHADER: &str = include_str!("shaders/default.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

pub const UNIFORM_MVP: &str = "mvp";
pub const UNIFORM_MODEL: &str = "matModel";
pub const UNIFORM_VIEW_POS: &str = "viewPos";
pub const UNIFORM_DIFFUSE: &str = "colDiffuse";

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader source {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("shader program {label:?} is invalid: {message}")]
    Invalid { label: String, message: String },
}

/// Where a named uniform lives in the pipeline's bind groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
}

/// Finds `@group(G) @binding(B) var<uniform> name: T;` in WGSL source.
pub fn find_uniform(source: &str, name: &str) -> Option<UniformLocation> {
    const DECL: &str = "var<uniform>";

    let code: String = source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");

    code.match_indices(DECL).find_map(|(idx, _)| {
        let ident = code[idx + DECL.len()..].split(':').next()?.trim();
        if ident != name {
            return None;
        }
        let before = &code[..idx];
        let start = before.rfind([';', '}']).map_or(0, |i| i + 1);
        let attrs = &before[start..];
        Some(UniformLocation {
            group: attribute(attrs, "group")?,
            binding: attribute(attrs, "binding")?,
        })
    })
}

fn attribute(attrs: &str, key: &str) -> Option<u32> {
    let open = format!("@{key}(");
    let start = attrs.find(&open)? + open.len();
    let end = start + attrs[start..].find(')')?;
    attrs[start..end].trim().parse().ok()
}

/// Resolves a uniform across the stages of a program.
fn locate(sources: &[&str], name: &str) -> Option<UniformLocation> {
    sources.iter().find_map(|source| find_uniform(source, name))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformLocations {
    pub mvp: Option<UniformLocation>,
    pub model: Option<UniformLocation>,
    pub view_pos: Option<UniformLocation>,
    pub diffuse: Option<UniformLocation>,
}

impl UniformLocations {
    pub fn resolve(sources: &[&str]) -> Self {
        Self {
            mvp: locate(sources, UNIFORM_MVP),
            model: locate(sources, UNIFORM_MODEL),
            view_pos: locate(sources, UNIFORM_VIEW_POS),
            diffuse: locate(sources, UNIFORM_DIFFUSE),
        }
    }

    /// Locations with their buffer sizes in bytes.
    fn sized(&self) -> impl Iterator<Item = (UniformLocation, u64)> {
        [
            (self.mvp, 64),
            (self.model, 64),
            (self.view_pos, 16),
            (self.diffuse, 16),
        ]
        .into_iter()
        .filter_map(|(loc, size)| loc.map(|loc| (loc, size)))
    }
}

/// Resolved uniforms per bind group, indexed by group number.
///
/// Groups without an engine uniform come back empty so the pipeline layout
/// stays contiguous. Two names on one slot share the larger buffer.
pub fn layout_groups(locations: &UniformLocations) -> Vec<Vec<(UniformLocation, u64)>> {
    let mut unique: BTreeMap<UniformLocation, u64> = BTreeMap::new();
    for (loc, size) in locations.sized() {
        let slot = unique.entry(loc).or_default();
        *slot = (*slot).max(size);
    }
    let count = unique.keys().map(|loc| loc.group + 1).max().unwrap_or(0);

    let mut groups = vec![Vec::new(); count as usize];
    for (loc, size) in unique {
        groups[loc.group as usize].push((loc, size));
    }
    groups
}

fn uniform_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Fixed output configuration every program is built against.
#[derive(Debug, Clone, Copy)]
pub struct PipelineTarget {
    pub color_format: wgpu::TextureFormat,
    pub sample_count: u32,
}

/// A compiled two-stage program with one buffer per engine uniform.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    bind_groups: Vec<(u32, wgpu::BindGroup)>,
    buffers: BTreeMap<UniformLocation, wgpu::Buffer>,
    pub locations: UniformLocations,
}

impl ShaderProgram {
    /// Builds the program inside a validation error scope so a bad shader
    /// comes back as an error instead of aborting the process.
    pub fn compile(
        device: &wgpu::Device,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
        target: PipelineTarget,
        topology: wgpu::PrimitiveTopology,
    ) -> Result<Self, ShaderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} Vertex Shader")),
            source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} Fragment Shader")),
            source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
        });

        let locations = UniformLocations::resolve(&[vertex_source, fragment_source]);
        let groups = layout_groups(&locations);

        // Built from the declarations rather than derived from the shaders,
        // so a uniform the compiler strips as unused still has a slot.
        let bind_group_layouts: Vec<wgpu::BindGroupLayout> = groups
            .iter()
            .enumerate()
            .map(|(group, entries)| {
                let entries: Vec<_> = entries
                    .iter()
                    .map(|(loc, _)| uniform_layout_entry(loc.binding))
                    .collect();
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{label} Bind Group Layout {group}")),
                    entries: &entries,
                })
            })
            .collect();
        let layout_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} Pipeline Layout")),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{label} Pipeline")),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: VERTEX_ENTRY,
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: FRAGMENT_ENTRY,
                targets: &[Some(wgpu::ColorTargetState {
                    format: target.color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: match topology {
                    wgpu::PrimitiveTopology::TriangleList => Some(wgpu::Face::Back),
                    _ => None,
                },
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: target.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let mut buffers = BTreeMap::new();
        for (loc, size) in groups.iter().flatten() {
            buffers.insert(
                *loc,
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{label} Uniform {}:{}", loc.group, loc.binding)),
                    size: *size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
            );
        }

        let bind_groups = groups
            .iter()
            .zip(&bind_group_layouts)
            .enumerate()
            .map(|(group, (entries, layout))| {
                let entries: Vec<_> = entries
                    .iter()
                    .filter_map(|(loc, _)| {
                        let buffer = buffers.get(loc)?;
                        Some(wgpu::BindGroupEntry {
                            binding: loc.binding,
                            resource: buffer.as_entire_binding(),
                        })
                    })
                    .collect();
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{label} Bind Group {group}")),
                    layout,
                    entries: &entries,
                });
                (group as u32, bind_group)
            })
            .collect();

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Invalid {
                label: label.to_string(),
                message: error.to_string(),
            });
        }

        debug!("Compiled shader program {:?}: {:?}", label, locations);
        Ok(Self {
            pipeline,
            bind_groups,
            buffers,
            locations,
        })
    }

    /// Writes raw bytes to a uniform. Unresolved locations are ignored.
    pub fn set_value(&self, queue: &wgpu::Queue, loc: Option<UniformLocation>, bytes: &[u8]) {
        if let Some(buffer) = loc.and_then(|loc| self.buffers.get(&loc)) {
            queue.write_buffer(buffer, 0, bytes);
        }
    }

    pub fn set_mat4(&self, queue: &wgpu::Queue, loc: Option<UniformLocation>, value: Mat4) {
        self.set_value(queue, loc, bytemuck::cast_slice(&value.to_cols_array()));
    }

    pub fn set_vec3(&self, queue: &wgpu::Queue, loc: Option<UniformLocation>, value: Vec3) {
        self.set_value(queue, loc, bytemuck::cast_slice(&value.extend(0.0).to_array()));
    }

    pub fn set_vec4(&self, queue: &wgpu::Queue, loc: Option<UniformLocation>, value: Vec4) {
        self.set_value(queue, loc, bytemuck::cast_slice(&value.to_array()));
    }

    /// Camera transform and tint, written for every program each frame.
    pub fn set_frame(&self, queue: &wgpu::Queue, mvp: Mat4, tint: Vec4) {
        self.set_mat4(queue, self.locations.mvp, mvp);
        self.set_vec4(queue, self.locations.diffuse, tint);
    }

    pub fn bind<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        for (group, bind_group) in &self.bind_groups {
            pass.set_bind_group(*group, bind_group, &[]);
        }
    }
}

/// The ambient occlusion program attached to a loaded model.
pub struct ShaderBinding {
    pub program: ShaderProgram,
    pub view_pos_loc: Option<UniformLocation>,
    pub model_loc: Option<UniformLocation>,
}

impl ShaderBinding {
    pub fn load(device: &wgpu::Device, target: PipelineTarget) -> Result<Self, ShaderError> {
        let vertex_source = read_source(Path::new(AO_VERTEX_PATH))?;
        let fragment_source = read_source(Path::new(AO_FRAGMENT_PATH))?;

        let program = ShaderProgram::compile(
            device,
            "AO",
            &vertex_source,
            &fragment_source,
            target,
            wgpu::PrimitiveTopology::TriangleList,
        )?;

        Ok(Self {
            view_pos_loc: program.locations.view_pos,
            model_loc: program.locations.model,
            program,
        })
    }

    pub fn set_view_position(&self, queue: &wgpu::Queue, position: Vec3) {
        self.program.set_vec3(queue, self.view_pos_loc, position);
    }

    pub fn set_model_matrix(&self, queue: &wgpu::Queue, model: Mat4) {
        self.program.set_mat4(queue, self.model_loc, model);
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
