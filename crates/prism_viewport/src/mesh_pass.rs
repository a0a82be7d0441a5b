//! Hardware rasterization of a scene's indexed meshes.
//!
//! Each mesh is uploaded once with its own uniform buffer and texture bind
//! group. Cull mode and sampler mode pick a prebuilt pipeline and sampler
//! bind group per frame; nothing is rebuilt when a toggle changes.

use prism_core::Vertex;
use prism_math::Camera;
use prism_raster::{CullMode, RasterScene, RenderOptions, SamplerMode, SurfaceRefs};
use wgpu::{util::DeviceExt, Device, Queue};

use crate::textures::{sampler_descriptor, GpuSurfaces};
use crate::CLEAR_COLOR;

/// Vertex layout shared with `shaders/mesh.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

impl GpuVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
        2 => Float32x3,
        3 => Float32x3
    ];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

impl From<&Vertex> for GpuVertex {
    fn from(vertex: &Vertex) -> Self {
        Self {
            position: vertex.position.to_array(),
            uv: vertex.uv.to_array(),
            normal: vertex.normal.to_array(),
            tangent: vertex.tangent.to_array(),
        }
    }
}

/// Per-object constants.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniform {
    pub world_to_clip: [[f32; 4]; 4],
    pub view_origin: [f32; 4],
    /// Light travel direction in xyz, intensity in w.
    pub light: [f32; 4],
    pub light_color: [f32; 4],
    /// Normal map, specular, depth view, transparent.
    pub flags: [u32; 4],
}

impl MeshUniform {
    /// Constants for one object this frame.
    ///
    /// Transparent objects are drawn with their diffuse map only, so they
    /// never enable the normal or specular maps.
    pub fn new(camera: &Camera, options: &RenderOptions, surfaces: &SurfaceRefs, transparent: bool) -> Self {
        let light = &options.light;
        let normal_map = options.normal_map && !transparent && !surfaces.normal.is_none();
        let specular = options.specular && !transparent && !surfaces.specular.is_none();

        Self {
            world_to_clip: camera.world_to_clip().to_cols_array_2d(),
            view_origin: camera.ray_origin().extend(1.0).to_array(),
            light: light.direction.extend(light.intensity).to_array(),
            light_color: light.color.extend(1.0).to_array(),
            flags: [
                normal_map as u32,
                specular as u32,
                options.depth_view as u32,
                transparent as u32,
            ],
        }
    }
}

/// Faces wgpu discards for a cull mode.
///
/// Front faces wind counter-clockwise on screen in both paths, so keeping
/// front faces means culling back faces.
pub fn cull_face(cull: CullMode) -> Option<wgpu::Face> {
    match cull {
        CullMode::Front => Some(wgpu::Face::Back),
        CullMode::Back => Some(wgpu::Face::Front),
        CullMode::Both => None,
    }
}

fn cull_index(cull: CullMode) -> usize {
    match cull {
        CullMode::Front => 0,
        CullMode::Back => 1,
        CullMode::Both => 2,
    }
}

fn sampler_index(mode: SamplerMode) -> usize {
    match mode {
        SamplerMode::Point => 0,
        SamplerMode::Linear => 1,
        SamplerMode::Anisotropic => 2,
    }
}

/// One uploaded mesh.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    surfaces: SurfaceRefs,
    transparent: bool,
}

/// Pipelines, samplers and uploaded meshes for the hardware path.
pub struct MeshPass {
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    /// Indexed by cull mode: front, back, both.
    pipelines: [wgpu::RenderPipeline; 3],
    transparent_pipeline: wgpu::RenderPipeline,
    /// Indexed by sampler mode: point, linear, anisotropic.
    sampler_groups: [wgpu::BindGroup; 3],
    surfaces: GpuSurfaces,
    meshes: Vec<GpuMesh>,
}

impl MeshPass {
    pub fn new(device: &Device, queue: &Queue, format: wgpu::TextureFormat) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Texture Layout"),
            entries: &[texture_entry(0), texture_entry(1), texture_entry(2)],
        });

        let sampler_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Sampler Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            }],
        });

        let sampler_groups = [SamplerMode::Point, SamplerMode::Linear, SamplerMode::Anisotropic].map(|mode| {
            let sampler = device.create_sampler(&sampler_descriptor(mode));
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Mesh Sampler Bind Group"),
                layout: &sampler_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                }],
            })
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout, &sampler_layout],
            push_constant_ranges: &[],
        });

        let create_pipeline = |label: &str, cull_mode: Option<wgpu::Face>, blend: wgpu::BlendState, depth_write: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[GpuVertex::desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth24Plus,
                    depth_write_enabled: depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        };

        let pipelines = [CullMode::Front, CullMode::Back, CullMode::Both].map(|cull| {
            create_pipeline("Mesh Pipeline", cull_face(cull), wgpu::BlendState::REPLACE, true)
        });
        let transparent_pipeline =
            create_pipeline("Transparent Mesh Pipeline", None, wgpu::BlendState::ALPHA_BLENDING, false);

        Self {
            uniform_layout,
            texture_layout,
            pipelines,
            transparent_pipeline,
            sampler_groups,
            surfaces: GpuSurfaces::new(device, queue),
            meshes: Vec::new(),
        }
    }

    /// Replace the uploaded meshes with the indexed meshes of `scene`.
    ///
    /// Triangles and strips stay software-only. Surfaces already on the GPU
    /// are kept.
    pub fn upload(&mut self, device: &Device, queue: &Queue, scene: &RasterScene) {
        self.surfaces.upload(device, queue, &scene.surfaces);

        let mut meshes = Vec::new();
        for (mesh, surfaces) in scene.meshes() {
            if mesh.faces.is_empty() {
                continue;
            }
            let vertices: Vec<GpuVertex> = mesh.vertices.iter().map(GpuVertex::from).collect();
            let indices = mesh.indices();

            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Mesh Uniform Buffer"),
                size: std::mem::size_of::<MeshUniform>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Mesh Uniform Bind Group"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
            let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Mesh Texture Bind Group"),
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(self.surfaces.view(surfaces.diffuse)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(self.surfaces.view(surfaces.specular)),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(self.surfaces.view(surfaces.normal)),
                    },
                ],
            });

            meshes.push(GpuMesh {
                vertex_buffer,
                index_buffer,
                num_indices: indices.len() as u32,
                uniform_buffer,
                uniform_bind_group,
                texture_bind_group,
                surfaces: *surfaces,
                transparent: mesh.transparent,
            });
        }

        log::info!(
            "Uploaded {} meshes and {} surfaces to the GPU",
            meshes.len(),
            self.surfaces.len()
        );
        self.meshes = meshes;
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Draw every uploaded mesh into `target`, clearing it to [`CLEAR_COLOR`].
    ///
    /// Opaque meshes go first with the pipeline for `options.cull`; blended
    /// meshes follow without culling or depth writes.
    pub fn draw(
        &self,
        queue: &Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        camera: &Camera,
        options: &RenderOptions,
    ) {
        let blended = |mesh: &GpuMesh| options.transparency && mesh.transparent;

        for mesh in &self.meshes {
            let uniform = MeshUniform::new(camera, options, &mesh.surfaces, blended(mesh));
            queue.write_buffer(&mesh.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Mesh Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(2, &self.sampler_groups[sampler_index(options.sampler)], &[]);

        let opaque = self.meshes.iter().filter(|mesh| !blended(mesh));
        let transparent = self.meshes.iter().filter(|mesh| blended(mesh));

        render_pass.set_pipeline(&self.pipelines[cull_index(options.cull)]);
        for mesh in opaque {
            draw_mesh(&mut render_pass, mesh);
        }

        render_pass.set_pipeline(&self.transparent_pipeline);
        for mesh in transparent {
            draw_mesh(&mut render_pass, mesh);
        }
    }
}

fn draw_mesh<'a>(render_pass: &mut wgpu::RenderPass<'a>, mesh: &'a GpuMesh) {
    render_pass.set_bind_group(0, &mesh.uniform_bind_group, &[]);
    render_pass.set_bind_group(1, &mesh.texture_bind_group, &[]);
    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::SurfaceId;
    use prism_math::{Vec2, Vec3};

    fn mapped_surfaces() -> SurfaceRefs {
        SurfaceRefs {
            diffuse: SurfaceId(1),
            specular: SurfaceId(2),
            gloss: SurfaceId(3),
            normal: SurfaceId(4),
        }
    }

    #[test]
    fn test_uniform_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<MeshUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<MeshUniform>(), 128);
        assert_eq!(std::mem::size_of::<GpuVertex>(), 44);
    }

    #[test]
    fn test_vertex_conversion() {
        let mut vertex = Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec2::new(0.25, 0.75), Vec3::Y);
        vertex.tangent = Vec3::X;

        let gpu = GpuVertex::from(&vertex);
        assert_eq!(gpu.position, [1.0, 2.0, 3.0]);
        assert_eq!(gpu.uv, [0.25, 0.75]);
        assert_eq!(gpu.normal, [0.0, 1.0, 0.0]);
        assert_eq!(gpu.tangent, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_uniform_carries_camera_and_light() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 50.0), Vec3::NEG_Z);
        let options = RenderOptions::default();
        let uniform = MeshUniform::new(&camera, &options, &mapped_surfaces(), false);

        assert_eq!(uniform.world_to_clip, camera.world_to_clip().to_cols_array_2d());
        assert!((Vec3::from_slice(&uniform.view_origin[..3]) - camera.ray_origin()).length() < 1e-6);
        assert_eq!(uniform.light[3], options.light.intensity);
        assert_eq!(uniform.flags, [1, 1, 0, 0]);
    }

    #[test]
    fn test_toggles_and_missing_maps_clear_flags() {
        let camera = Camera::default();
        let options = RenderOptions {
            specular: false,
            depth_view: true,
            ..Default::default()
        };
        let uniform = MeshUniform::new(&camera, &options, &mapped_surfaces(), false);
        assert_eq!(uniform.flags, [1, 0, 1, 0]);

        let diffuse_only = SurfaceRefs::diffuse(SurfaceId(1));
        let uniform = MeshUniform::new(&camera, &RenderOptions::default(), &diffuse_only, false);
        assert_eq!(uniform.flags, [0, 0, 0, 0]);
    }

    #[test]
    fn test_transparent_objects_are_diffuse_only() {
        let uniform = MeshUniform::new(&Camera::default(), &RenderOptions::default(), &mapped_surfaces(), true);
        assert_eq!(uniform.flags, [0, 0, 0, 1]);
    }

    #[test]
    fn test_cull_face_mapping() {
        assert_eq!(cull_face(CullMode::Front), Some(wgpu::Face::Back));
        assert_eq!(cull_face(CullMode::Back), Some(wgpu::Face::Front));
        assert_eq!(cull_face(CullMode::Both), None);
    }

    #[test]
    fn test_pipeline_indices_are_distinct() {
        let culls = [CullMode::Front, CullMode::Back, CullMode::Both].map(cull_index);
        assert_eq!(culls, [0, 1, 2]);
        let samplers = [SamplerMode::Point, SamplerMode::Linear, SamplerMode::Anisotropic].map(sampler_index);
        assert_eq!(samplers, [0, 1, 2]);
    }
}
