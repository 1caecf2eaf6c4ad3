//! glTF 2.0 backend.
//!
//! Buffers are loaded eagerly; images are not, since textures go through the asset cache like
//! every other format. Only textures referenced by URI are supported. Node transforms are ignored.
//!
//! glTF puts the UV origin at the top left; coordinates are converted to the bottom-left origin
//! the OBJ backend delivers.

use std::path::Path;

use glam::{Vec2, Vec3};
use gltf::mesh::Mode;

use super::{
    ImportError, ImportOptions, ImportedMaterial, ImportedMesh, ImportedScene, SceneNode,
    triangulate_fan, triangulate_strip,
};

pub(super) fn import(path: &Path, options: &ImportOptions) -> Result<ImportedScene, ImportError> {
    let to_error = |source| ImportError::Gltf {
        path: path.to_path_buf(),
        source,
    };
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(to_error)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(to_error)?;

    let mut scene = ImportedScene {
        materials: document.materials().map(convert_material).collect(),
        ..Default::default()
    };

    // glTF meshes hold several primitives; each primitive becomes one imported mesh.
    let mut primitives_of_mesh: Vec<Vec<usize>> = Vec::new();
    for mesh in document.meshes() {
        let mut imported = Vec::new();
        for (i, primitive) in mesh.primitives().enumerate() {
            let name = format!("{}#{}", mesh.name().unwrap_or("mesh"), i);
            match convert_primitive(&primitive, &buffers, options) {
                Some(mut converted) => {
                    converted.name = name;
                    imported.push(scene.meshes.len());
                    scene.meshes.push(converted);
                }
                None => {
                    log::warn!(
                        "skipping primitive '{}' ({:?}) in '{}'",
                        name,
                        primitive.mode(),
                        path.display()
                    );
                    scene.incomplete = true;
                }
            }
        }
        primitives_of_mesh.push(imported);
    }

    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    scene.root = gltf_scene.map(|gltf_scene| SceneNode {
        name: gltf_scene.name().unwrap_or("scene").to_string(),
        meshes: Vec::new(),
        children: gltf_scene
            .nodes()
            .map(|node| convert_node(&node, &primitives_of_mesh))
            .collect(),
    });

    Ok(scene)
}

fn convert_node(node: &gltf::Node<'_>, primitives_of_mesh: &[Vec<usize>]) -> SceneNode {
    SceneNode {
        name: node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index())),
        meshes: node
            .mesh()
            .map(|mesh| primitives_of_mesh[mesh.index()].clone())
            .unwrap_or_default(),
        children: node
            .children()
            .map(|child| convert_node(&child, primitives_of_mesh))
            .collect(),
    }
}

fn convert_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    options: &ImportOptions,
) -> Option<ImportedMesh> {
    let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));

    let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from).collect();
    let normals = reader
        .read_normals()
        .map(|normals| normals.map(Vec3::from).collect())
        .unwrap_or_default();
    let tex_coords = reader
        .read_tex_coords(0)
        .map(|uvs| uvs.into_f32().map(|[u, v]| Vec2::new(u, 1.0 - v)).collect());
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let indices = match primitive.mode() {
        Mode::Triangles => indices,
        Mode::TriangleStrip if options.triangulate => triangulate_strip(&indices),
        Mode::TriangleFan if options.triangulate => triangulate_fan(&indices),
        _ => return None,
    };

    Some(ImportedMesh {
        name: String::new(),
        positions,
        normals,
        tex_coords,
        indices,
        material: primitive.material().index(),
    })
}

fn convert_material(material: gltf::Material<'_>) -> ImportedMaterial {
    let diffuse = material
        .pbr_metallic_roughness()
        .base_color_texture()
        .and_then(|info| match info.texture().source().source() {
            gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                Some(decode_uri(uri))
            }
            _ => {
                log::warn!(
                    "material '{}' embeds its base color texture, which is not supported",
                    material.name().unwrap_or("unnamed")
                );
                None
            }
        });

    ImportedMaterial {
        name: material.name().unwrap_or_default().to_string(),
        diffuse_textures: diffuse.into_iter().collect(),
        specular_textures: Vec::new(),
    }
}

/// Turns a relative glTF URI into a file path by undoing its percent-encoding.
fn decode_uri(uri: &str) -> String {
    match urlencoding::decode(uri) {
        Ok(path) => path.into_owned(),
        Err(err) => {
            log::warn!("image uri '{uri}' is not valid UTF-8 once decoded ({err}), using it as is");
            uri.to_string()
        }
    }
}
