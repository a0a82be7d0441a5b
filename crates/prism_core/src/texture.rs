//! Texture surfaces and the table that owns them.
//!
//! Textures are keyed by a [`SurfaceId`] hashed from their file path. The
//! CPU rasterizer samples them directly; the viewport uploads each one to
//! the GPU once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use prism_math::{Vec2, Vec3, Vec4};
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Texture {0} has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Identifier of a loaded surface. Zero means "no texture".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    /// The "no texture" sentinel. Sampling it yields black.
    pub const NONE: SurfaceId = SurfaceId(0);

    /// Hash a texture path into an id.
    ///
    /// Each byte is XORed in at a shift of `(i % 8) * 8` bits. A path that
    /// hashes to zero is moved to 1 so it never collides with [`SurfaceId::NONE`].
    pub fn from_path(path: &str) -> Self {
        let hash = path
            .bytes()
            .enumerate()
            .fold(0u64, |hash, (i, byte)| hash ^ (u64::from(byte) << ((i % 8) * 8)));
        SurfaceId(if hash == 0 { 1 } else { hash })
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// A loaded texture with 8-bit RGBA pixels, row-major, top row first.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    pub pixels: Vec<[u8; 4]>,

    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        Self::new(1, 1, vec![[c.x as u8, c.y as u8, c.z as u8, 255]], "<solid>")
    }

    /// Load a texture from a file path.
    pub fn load(path: &Path) -> TextureResult<Self> {
        let img = image::open(path).map_err(|source| TextureError::Load {
            path: path.display().to_string(),
            source,
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(path.display().to_string()));
        }

        let pixels = rgba.pixels().map(|p| p.0).collect();
        Ok(Self::new(width, height, pixels, path.to_string_lossy()))
    }

    /// Nearest texel index for a UV coordinate.
    ///
    /// Coordinates are floored and wrapped, so UVs outside `[0, 1)` tile.
    pub fn texel_index(&self, uv: Vec2) -> usize {
        let w = i64::from(self.width);
        let h = i64::from(self.height);
        let x = ((uv.x * self.width as f32).floor() as i64).rem_euclid(w);
        let y = ((uv.y * self.height as f32).floor() as i64).rem_euclid(h);
        (x + y * w) as usize
    }

    /// Sample RGB in `[0, 1]` with nearest-texel lookup. No colour space conversion.
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        self.sample_rgba(uv).truncate()
    }

    /// Sample RGBA in `[0, 1]` with nearest-texel lookup.
    pub fn sample_rgba(&self, uv: Vec2) -> Vec4 {
        let [r, g, b, a] = self.pixels[self.texel_index(uv)];
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }

    /// Raw RGBA bytes, for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_flattened()
    }

    /// Get total size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * 4
    }
}

/// Owner of every surface a scene references.
///
/// Each path is loaded once; asking for it again returns the same id.
#[derive(Debug, Default)]
pub struct SurfaceTable {
    surfaces: HashMap<SurfaceId, Texture>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl SurfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table that resolves relative paths against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            surfaces: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load `path` (once) and return its id.
    pub fn load(&mut self, path: &str) -> TextureResult<SurfaceId> {
        let id = SurfaceId::from_path(path);
        if self.surfaces.contains_key(&id) {
            return Ok(id);
        }

        let texture = Texture::load(&self.resolve_path(path))?;
        log::debug!(
            "Loaded surface {}: {}x{} ({:.1} KB)",
            path,
            texture.width,
            texture.height,
            texture.size_bytes() as f32 / 1024.0
        );
        self.surfaces.insert(id, texture);
        Ok(id)
    }

    /// Load an optional surface; a failure is logged and yields [`SurfaceId::NONE`].
    pub fn load_or_none(&mut self, path: &str) -> SurfaceId {
        match self.load(path) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("{err}");
                SurfaceId::NONE
            }
        }
    }

    /// Register an in-memory texture under `name`.
    pub fn insert(&mut self, name: &str, texture: Texture) -> SurfaceId {
        let id = SurfaceId::from_path(name);
        self.surfaces.insert(id, texture);
        id
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Texture> {
        self.surfaces.get(&id)
    }

    /// Sample a surface; [`SurfaceId::NONE`] and unknown ids are black.
    pub fn sample(&self, id: SurfaceId, uv: Vec2) -> Vec3 {
        self.get(id).map_or(Vec3::ZERO, |t| t.sample(uv))
    }

    /// Like [`SurfaceTable::sample`] but with alpha; missing surfaces are opaque black.
    pub fn sample_rgba(&self, id: SurfaceId, uv: Vec2) -> Vec4 {
        self.get(id).map_or(Vec4::W, |t| t.sample_rgba(uv))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SurfaceId, &Texture)> {
        self.surfaces.iter().map(|(id, t)| (*id, t))
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        match &self.base_dir {
            Some(base) if !path.is_absolute() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
