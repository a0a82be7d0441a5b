//! Wavefront OBJ loading through `tobj`.
//!
//! Two flavours are provided. [`load_obj`] builds a fully attributed mesh
//! for the rasterizer: it mirrors the model into the left-handed world
//! (z negated, v flipped), deduplicates vertices and derives tangents.
//! [`load_obj_positions`] keeps only positions and faces as written, which
//! is all the ray tracer intersects against.

use std::io::BufRead;
use std::path::Path;

use prism_math::{Vec2, Vec3};
use thiserror::Error;

use crate::mesh::{Mesh, MeshBuilder, Vertex};

/// Errors raised while turning an OBJ file into a [`Mesh`].
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Failed to parse OBJ {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("OBJ {0} contains no faces")]
    Empty(String),

    #[error("OBJ {0} has faces without texture coordinates")]
    MissingTexcoords(String),

    #[error("OBJ {0} has faces without normals")]
    MissingNormals(String),

    #[error("{kind} index {index} out of range ({count} available)")]
    IndexOutOfRange {
        kind: &'static str,
        index: u32,
        count: usize,
    },
}

pub type MeshResult<T> = Result<T, MeshError>;

fn load_options() -> tobj::LoadOptions {
    // Quads and polygons fan out as (0, i, i + 1); attribute indices stay separate.
    tobj::LoadOptions {
        single_index: false,
        triangulate: true,
        ..Default::default()
    }
}

fn read_models(path: &Path) -> MeshResult<Vec<tobj::Model>> {
    let (models, _materials) =
        tobj::load_obj(path, &load_options()).map_err(|source| MeshError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    Ok(models)
}

/// Parse OBJ text from a reader; material libraries are ignored.
pub fn read_models_from<R: BufRead>(reader: &mut R, name: &str) -> MeshResult<Vec<tobj::Model>> {
    let (models, _materials) =
        tobj::load_obj_buf(reader, &load_options(), |_| Err(tobj::LoadError::OpenFileFailed))
            .map_err(|source| MeshError::Parse {
                path: name.to_string(),
                source,
            })?;
    Ok(models)
}

/// Load a textured, normal-mapped mesh for the rasterizer.
pub fn load_obj(path: impl AsRef<Path>) -> MeshResult<Mesh> {
    let path = path.as_ref();
    let models = read_models(path)?;
    let mesh = textured_mesh(&models, &path.display().to_string())?;
    log::info!(
        "Loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Load positions and faces only, without changing handedness.
pub fn load_obj_positions(path: impl AsRef<Path>) -> MeshResult<Mesh> {
    let path = path.as_ref();
    let models = read_models(path)?;
    let mesh = position_mesh(&models, &path.display().to_string())?;
    log::info!(
        "Loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Fetch attribute `index` of width `N` from a flat `tobj` array.
fn fetch<const N: usize>(data: &[f32], index: u32, kind: &'static str) -> MeshResult<[f32; N]> {
    let start = index as usize * N;
    data.get(start..start + N)
        .and_then(|slice| <[f32; N]>::try_from(slice).ok())
        .ok_or(MeshError::IndexOutOfRange {
            kind,
            index,
            count: data.len() / N,
        })
}

/// Checked conversion of `tobj` models into one deduplicated, tangent-carrying mesh.
pub fn textured_mesh(models: &[tobj::Model], name: &str) -> MeshResult<Mesh> {
    let mut builder = MeshBuilder::new();

    for model in models {
        let m = &model.mesh;
        if m.texcoord_indices.len() != m.indices.len() {
            return Err(MeshError::MissingTexcoords(name.to_string()));
        }
        if m.normal_indices.len() != m.indices.len() {
            return Err(MeshError::MissingNormals(name.to_string()));
        }

        for corners in (0..m.indices.len() / 3).map(|f| f * 3) {
            let mut face = [0u32; 3];
            for (slot, i) in (corners..corners + 3).enumerate() {
                let [px, py, pz] = fetch::<3>(&m.positions, m.indices[i], "position")?;
                let [u, v] = fetch::<2>(&m.texcoords, m.texcoord_indices[i], "texcoord")?;
                let [nx, ny, nz] = fetch::<3>(&m.normals, m.normal_indices[i], "normal")?;

                face[slot] = builder.add_vertex(Vertex::new(
                    Vec3::new(px, py, -pz),
                    Vec2::new(u, 1.0 - v),
                    Vec3::new(nx, ny, -nz),
                ));
            }
            builder.add_face(face);
        }
    }

    let mesh = builder.build();
    if mesh.faces.is_empty() {
        return Err(MeshError::Empty(name.to_string()));
    }
    Ok(mesh)
}

/// Checked conversion of `tobj` models into a position-only mesh.
pub fn position_mesh(models: &[tobj::Model], name: &str) -> MeshResult<Mesh> {
    let mut positions = Vec::new();
    let mut faces = Vec::new();

    for model in models {
        let m = &model.mesh;
        let base = positions.len() as u32;
        let count = m.positions.len() / 3;

        for index in 0..count as u32 {
            positions.push(Vec3::from_array(fetch::<3>(&m.positions, index, "position")?));
        }
        for tri in m.indices.chunks_exact(3) {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= count) {
                return Err(MeshError::IndexOutOfRange {
                    kind: "position",
                    index,
                    count,
                });
            }
            faces.push([base + tri[0], base + tri[1], base + tri[2]]);
        }
    }

    if faces.is_empty() {
        return Err(MeshError::Empty(name.to_string()));
    }
    Ok(Mesh::from_positions(&positions, faces))
}
