//! GPU copies of the surface table and the samplers used to read them.

use std::collections::HashMap;

use prism_core::{SurfaceId, SurfaceTable};
use prism_raster::SamplerMode;
use wgpu::{Device, Queue};

/// Texel format of every uploaded surface. Values go through unchanged,
/// like the CPU sampler.
pub const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Create an RGBA texture that can be written from the CPU and sampled.
pub fn create_rgba_texture(device: &Device, size: (u32, u32), label: &str) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SURFACE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

/// Copy tightly packed RGBA8 rows into the whole of `texture`.
pub fn write_rgba(queue: &Queue, texture: &wgpu::Texture, size: (u32, u32), bytes: &[u8]) {
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytes,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.0),
            rows_per_image: Some(size.1),
        },
        wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
    );
}

/// Sampler settings for one [`SamplerMode`].
///
/// Addressing repeats to match the wrapping texel lookup of the software
/// path. Anisotropic filtering requires linear filters throughout.
pub fn sampler_descriptor(mode: SamplerMode) -> wgpu::SamplerDescriptor<'static> {
    let (filter, anisotropy_clamp, label) = match mode {
        SamplerMode::Point => (wgpu::FilterMode::Nearest, 1, "Point Sampler"),
        SamplerMode::Linear => (wgpu::FilterMode::Linear, 1, "Linear Sampler"),
        SamplerMode::Anisotropic => (wgpu::FilterMode::Linear, 16, "Anisotropic Sampler"),
    };
    wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: filter,
        anisotropy_clamp,
        ..Default::default()
    }
}

/// One GPU texture per surface, uploaded once.
pub struct GpuSurfaces {
    views: HashMap<SurfaceId, wgpu::TextureView>,
    /// 1x1 black texel bound wherever an object has no map.
    fallback: wgpu::TextureView,
}

impl GpuSurfaces {
    pub fn new(device: &Device, queue: &Queue) -> Self {
        let texture = create_rgba_texture(device, (1, 1), "Fallback Surface");
        write_rgba(queue, &texture, (1, 1), &[0, 0, 0, 255]);

        Self {
            views: HashMap::new(),
            fallback: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }

    /// Upload every surface of `table` that is not on the GPU yet.
    pub fn upload(&mut self, device: &Device, queue: &Queue, table: &SurfaceTable) {
        for (id, texture) in table.iter() {
            if self.views.contains_key(&id) {
                continue;
            }
            let size = (texture.width, texture.height);
            let gpu_texture = create_rgba_texture(device, size, &texture.path);
            write_rgba(queue, &gpu_texture, size, texture.as_bytes());
            self.views
                .insert(id, gpu_texture.create_view(&wgpu::TextureViewDescriptor::default()));

            log::debug!(
                "Uploaded surface {} ({}x{}, {} bytes)",
                texture.path,
                texture.width,
                texture.height,
                texture.size_bytes()
            );
        }
    }

    /// View for `id`, or the black fallback for [`SurfaceId::NONE`] and unknown ids.
    pub fn view(&self, id: SurfaceId) -> &wgpu::TextureView {
        self.views.get(&id).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
