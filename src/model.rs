//! Model loading.
//!
//! A [`Model`] is built in three steps:
//!
//! 1. the file is imported into an [`ImportedScene`] by [`crate::import::import_scene`],
//! 2. the scene's node tree is walked and every referenced mesh is converted into CPU-side
//!    [`MeshData`] (see [`collect_meshes`]),
//! 3. each [`MeshData`] has its textures resolved through the [`AssetCache`] and is uploaded as a
//!    [`Mesh`].

use std::{
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
};

use glam::{Vec2, Vec3};

use crate::{
    abs::{Mesh, MeshError, ShaderProgram, Texture, TextureError, TextureKind, Vertex},
    cache::AssetCache,
    import::{ImportError, ImportedMaterial, ImportedMesh, ImportedScene, import_scene},
};

/// Errors produced while loading a [`Model`].
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("importer could only partially load '{}'", path.display())]
    Incomplete { path: PathBuf },
    #[error("scene '{}' has no root node", path.display())]
    MissingRoot { path: PathBuf },
    #[error("failed to load texture '{}': {source}", path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: TextureError,
    },
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// A texture slot of a mesh, before it is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureRef {
    /// Path resolved against the model directory. Also the cache key.
    pub path: String,
    pub kind: TextureKind,
}

/// CPU-side geometry and texture slots of one mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<TextureRef>,
}

impl MeshData {
    /// Converts an imported mesh.
    ///
    /// Positions and normals are copied as they are; missing texture coordinates become (0, 0).
    /// Diffuse slots of the mesh's material come first, then specular slots.
    pub fn from_imported(mesh: &ImportedMesh, materials: &[ImportedMaterial], directory: &Path) -> Self {
        let vertices = mesh
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex {
                position,
                normal: mesh.normals.get(i).copied().unwrap_or(Vec3::ZERO),
                tex_coords: mesh
                    .tex_coords
                    .as_ref()
                    .and_then(|uvs| uvs.get(i).copied())
                    .unwrap_or(Vec2::ZERO),
            })
            .collect();

        let textures = mesh
            .material
            .and_then(|index| materials.get(index))
            .map(|material| {
                let diffuse = material
                    .diffuse_textures
                    .iter()
                    .map(|path| (path, TextureKind::Diffuse));
                let specular = material
                    .specular_textures
                    .iter()
                    .map(|path| (path, TextureKind::Specular));
                diffuse
                    .chain(specular)
                    .map(|(path, kind)| TextureRef {
                        path: resolve_texture_path(directory, path),
                        kind,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            vertices,
            indices: mesh.indices.clone(),
            textures,
        }
    }
}

/// Joins a material texture path onto the model directory.
///
/// Backslash separators, common in files exported on Windows, are turned into forward slashes.
pub fn resolve_texture_path(directory: &Path, relative: &str) -> String {
    let relative = relative.replace('\\', "/");
    directory.join(relative).to_string_lossy().into_owned()
}

/// Walks the scene depth-first and converts every mesh each node references.
///
/// A mesh referenced by several nodes is converted once per reference.
pub fn collect_meshes(
    scene: &ImportedScene,
    path: &Path,
    directory: &Path,
) -> Result<Vec<MeshData>, ModelError> {
    if scene.incomplete {
        return Err(ModelError::Incomplete {
            path: path.to_path_buf(),
        });
    }
    let root = scene.root.as_ref().ok_or_else(|| ModelError::MissingRoot {
        path: path.to_path_buf(),
    })?;

    let mut meshes = Vec::new();
    root.walk(&mut |node| {
        for &index in &node.meshes {
            match scene.meshes.get(index) {
                Some(mesh) => {
                    meshes.push(MeshData::from_imported(mesh, &scene.materials, directory))
                }
                None => log::warn!("node '{}' references missing mesh {}", node.name, index),
            }
        }
    });
    Ok(meshes)
}

/// Loads every texture slot with `load`, stopping at the first failure.
pub fn resolve_textures<T>(
    textures: &[TextureRef],
    mut load: impl FnMut(&TextureRef) -> Result<T, TextureError>,
) -> Result<Vec<T>, ModelError> {
    textures
        .iter()
        .map(|texture| {
            load(texture).map_err(|source| ModelError::Texture {
                path: PathBuf::from(&texture.path),
                source,
            })
        })
        .collect()
}

/// A collection of meshes loaded from one asset file.
#[derive(Debug)]
pub struct Model {
    meshes: Vec<Mesh>,
    path: PathBuf,
    directory: PathBuf,
}

impl Model {
    /// Imports the file at `path` and uploads all of its meshes.
    ///
    /// Textures are shared through `cache`; a texture that cannot be decoded fails the whole load.
    pub fn load(
        gl: &Arc<glow::Context>,
        path: impl AsRef<Path>,
        cache: &mut AssetCache,
    ) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let scene = import_scene(path, cache.import_options())?;
        Self::from_scene(gl, &scene, path, cache)
    }

    /// Builds a model from an already imported scene. `path` locates its textures.
    pub fn from_scene(
        gl: &Arc<glow::Context>,
        scene: &ImportedScene,
        path: impl AsRef<Path>,
        cache: &mut AssetCache,
    ) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let meshes = collect_meshes(scene, path, &directory)?
            .into_iter()
            .map(|data| -> Result<Mesh, ModelError> {
                let textures: Vec<Rc<Texture>> =
                    resolve_textures(&data.textures, |slot| cache.texture(&slot.path, slot.kind))?;
                Ok(Mesh::new(gl, &data.vertices, &data.indices, textures)?)
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "loaded model '{}' ({} meshes, {} textures cached)",
            path.display(),
            meshes.len(),
            cache.texture_count()
        );

        Ok(Self {
            meshes,
            path: path.to_path_buf(),
            directory,
        })
    }

    /// Draws every mesh with `program`, which must be in use.
    pub fn draw(&self, program: &ShaderProgram) {
        for mesh in &self.meshes {
            mesh.draw(program);
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory texture paths are resolved against.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
