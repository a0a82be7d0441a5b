//! wgpu presentation and the hardware rasterization path.
//!
//! [`Renderer`] owns the device and the window surface. Each frame it either
//! blits a CPU-rendered [`ImageBuffer`] to the window, or draws the indexed
//! meshes of a [`RasterScene`] on the GPU with the same camera and shading
//! as the software rasterizer.

mod mesh_pass;
mod present;
mod textures;

pub use mesh_pass::{cull_face, GpuVertex, MeshPass, MeshUniform};
pub use present::FramePresenter;
pub use textures::{sampler_descriptor, GpuSurfaces, SURFACE_FORMAT};

use std::sync::Arc;

use anyhow::Result;
use prism_core::ImageBuffer;
use prism_math::Camera;
use prism_raster::{RasterScene, RenderOptions};
use wgpu::{Device, Instance, Queue, Surface, SurfaceConfiguration};

/// Background of the hardware path, (54, 57, 63) / 255.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 54.0 / 255.0,
    g: 57.0 / 255.0,
    b: 63.0 / 255.0,
    a: 1.0,
};

/// Core renderer managing wgpu state
pub struct Renderer {
    pub surface: Surface<'static>,
    pub device: Device,
    pub queue: Queue,
    pub config: SurfaceConfiguration,
    pub size: (u32, u32),

    depth_view: wgpu::TextureView,

    presenter: FramePresenter,
    mesh_pass: MeshPass,
}

impl Renderer {
    fn create_depth_view(device: &Device, size: (u32, u32)) -> wgpu::TextureView {
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth24Plus,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        depth_texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Create a new renderer for the given window
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self> {
        let size = window.inner_size();
        let size = (size.width.max(1), size.height.max(1));

        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("PRISM Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Linear output: both paths write colours without gamma, so the
        // surface must not apply an sRGB encode on top.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface reports no supported formats"))?;

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0,
            height: size.1,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let depth_view = Self::create_depth_view(&device, size);
        let presenter = FramePresenter::new(&device, config.format, size);
        let mesh_pass = MeshPass::new(&device, &queue, config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth_view,
            presenter,
            mesh_pass,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 > 0 && new_size.1 > 0 {
            self.size = new_size;
            self.config.width = new_size.0;
            self.config.height = new_size.1;
            self.surface.configure(&self.device, &self.config);

            self.depth_view = Self::create_depth_view(&self.device, new_size);
        }
    }

    /// Upload the indexed meshes and surfaces of `scene` for the hardware path.
    pub fn upload_scene(&mut self, scene: &RasterScene) {
        self.mesh_pass.upload(&self.device, &self.queue, scene);
    }

    /// Show a CPU-rendered frame.
    pub fn present_frame(&mut self, image: &ImageBuffer) -> Result<()> {
        let Some(output) = self.acquire_frame()? else {
            return Ok(());
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.presenter.upload(&self.device, &self.queue, image);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Present Encoder"),
        });
        self.presenter.draw(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Draw the uploaded scene on the GPU.
    pub fn render_scene(&mut self, camera: &Camera, options: &RenderOptions) -> Result<()> {
        let Some(output) = self.acquire_frame()? else {
            return Ok(());
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        self.mesh_pass
            .draw(&self.queue, &mut encoder, &view, &self.depth_view, camera, options);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Next swapchain texture, or `None` when this frame should be skipped.
    ///
    /// A lost or outdated surface is reconfigured; running out of memory is fatal.
    fn acquire_frame(&mut self) -> Result<Option<wgpu::SurfaceTexture>> {
        match self.surface.get_current_texture() {
            Ok(output) => Ok(Some(output)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.resize(self.size);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timed out, skipping frame");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
