//! Narrow interface over the external 3D scene importers.
//!
//! Every backend turns a file into an [`ImportedScene`]: a node tree referencing meshes by index,
//! plus the materials those meshes use. The renderer only ever looks at this structure, never at
//! the importer crates' own types.
//!
//! Supported formats are Wavefront OBJ/MTL (through `tobj`) and glTF 2.0 (through `gltf`).

mod gltf_scene;
mod wavefront;

use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};

/// Post-processing requested from an importer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// Split polygons and strips into plain triangles.
    pub triangulate: bool,
    /// Replace every texture coordinate `v` with `1 - v`.
    ///
    /// Backends already deliver UVs with a bottom-left origin, matching textures decoded with
    /// [`crate::abs::TextureOptions::flip_vertically`]; this flips them once more for assets
    /// authored against the opposite convention.
    pub flip_uvs: bool,
    /// Compute smooth normals for meshes that come without any.
    pub generate_normals: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: false,
            generate_normals: true,
        }
    }
}

/// Errors produced by the importers.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unsupported model format '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to load OBJ '{}': {source}", path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("failed to load glTF '{}': {source}", path.display())]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
}

/// A node of the imported scene graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Indices into [`ImportedScene::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Visits this node and all of its descendants depth-first, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SceneNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// One triangulated mesh as delivered by an importer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Either empty or one normal per position.
    pub normals: Vec<Vec3>,
    /// First UV channel, one entry per position, if the mesh has one.
    pub tex_coords: Option<Vec<Vec2>>,
    /// Triangle list.
    pub indices: Vec<u32>,
    /// Index into [`ImportedScene::materials`].
    pub material: Option<usize>,
}

impl ImportedMesh {
    /// Applies the UV flip and normal generation requested in `options`.
    fn post_process(&mut self, options: &ImportOptions) {
        if options.flip_uvs {
            if let Some(tex_coords) = &mut self.tex_coords {
                for uv in tex_coords.iter_mut() {
                    uv.y = 1.0 - uv.y;
                }
            }
        }
        if options.generate_normals && self.normals.is_empty() {
            self.normals = smooth_normals(&self.positions, &self.indices);
        }
    }
}

/// Texture slots of an imported material, as paths relative to the model file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportedMaterial {
    pub name: String,
    pub diffuse_textures: Vec<String>,
    pub specular_textures: Vec<String>,
}

/// The scene graph returned by an importer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedScene {
    pub root: Option<SceneNode>,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
    /// Set when the importer had to drop parts of the file.
    pub incomplete: bool,
}

/// Imports the scene at `path`, picking the backend from the file extension.
pub fn import_scene(path: impl AsRef<Path>, options: &ImportOptions) -> Result<ImportedScene, ImportError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let mut scene = match extension.as_deref() {
        Some("obj") => wavefront::import(path, options)?,
        Some("gltf") | Some("glb") => gltf_scene::import(path, options)?,
        _ => {
            return Err(ImportError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    for mesh in &mut scene.meshes {
        mesh.post_process(options);
    }
    log::info!(
        "imported '{}': {} meshes, {} materials",
        path.display(),
        scene.meshes.len(),
        scene.materials.len()
    );
    Ok(scene)
}

/// Computes area-weighted vertex normals for a triangle list.
///
/// Vertices not referenced by any non-degenerate triangle get a zero normal.
pub fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        // The cross product's length is twice the triangle area.
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|normal| normal.normalize_or_zero())
        .collect()
}

/// Converts any triangle strip into a triangle list.
pub(crate) fn triangulate_strip(indices: &[u32]) -> Vec<u32> {
    let mut list = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
    for (i, window) in indices.windows(3).enumerate() {
        // Every other triangle is wound the opposite way.
        if i % 2 == 0 {
            list.extend_from_slice(&[window[0], window[1], window[2]]);
        } else {
            list.extend_from_slice(&[window[1], window[0], window[2]]);
        }
    }
    list
}

/// Converts a triangle fan into a triangle list.
pub(crate) fn triangulate_fan(indices: &[u32]) -> Vec<u32> {
    let Some((&center, rest)) = indices.split_first() else {
        return Vec::new();
    };
    rest.windows(2)
        .flat_map(|pair| [center, pair[0], pair[1]])
        .collect()
}
