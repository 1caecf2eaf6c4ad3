//! Wavefront OBJ/MTL backend.

use std::path::Path;

use glam::{Vec2, Vec3};

use super::{ImportError, ImportOptions, ImportedMaterial, ImportedMesh, ImportedScene, SceneNode};

pub(super) fn import(path: &Path, options: &ImportOptions) -> Result<ImportedScene, ImportError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: options.triangulate,
            single_index: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        },
    )
    .map_err(|source| ImportError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(err) => {
            log::warn!(
                "no usable material library for '{}': {err}",
                path.display()
            );
            Vec::new()
        }
    };

    let mut scene = ImportedScene {
        root: None,
        meshes: Vec::with_capacity(models.len()),
        materials: materials.into_iter().map(convert_material).collect(),
        incomplete: false,
    };

    let mut root = SceneNode {
        name: path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
        ..Default::default()
    };

    for model in models {
        let mesh = model.mesh;
        // Without triangulation, any face with more than three corners cannot be drawn as a list.
        if mesh.face_arities.iter().any(|&arity| arity != 3) {
            log::warn!("'{}' in '{}' has non-triangle faces", model.name, path.display());
            scene.incomplete = true;
            continue;
        }

        let material = mesh
            .material_id
            .filter(|&id| id < scene.materials.len());

        root.children.push(SceneNode {
            name: model.name.clone(),
            meshes: vec![scene.meshes.len()],
            children: Vec::new(),
        });
        scene.meshes.push(ImportedMesh {
            name: model.name,
            positions: mesh
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect(),
            normals: mesh
                .normals
                .chunks_exact(3)
                .map(|n| Vec3::new(n[0], n[1], n[2]))
                .collect(),
            tex_coords: (!mesh.texcoords.is_empty()).then(|| {
                mesh.texcoords
                    .chunks_exact(2)
                    .map(|t| Vec2::new(t[0], t[1]))
                    .collect()
            }),
            indices: mesh.indices,
            material,
        });
    }

    scene.root = Some(root);
    Ok(scene)
}

fn convert_material(material: tobj::Material) -> ImportedMaterial {
    ImportedMaterial {
        name: material.name,
        diffuse_textures: material.diffuse_texture.into_iter().collect(),
        specular_textures: material.specular_texture.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("lumen3d-obj-{}", std::process::id()))
            .join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const QUAD: &str = "\
mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl painted
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    const QUAD_MTL: &str = "\
newmtl painted
map_Kd textures/albedo.png
map_Ks textures/shine.png
";

    #[test]
    fn quad_is_triangulated_with_materials() {
        let dir = scratch_dir("quad");
        std::fs::write(dir.join("quad.obj"), QUAD).unwrap();
        std::fs::write(dir.join("quad.mtl"), QUAD_MTL).unwrap();

        let scene = import(&dir.join("quad.obj"), &ImportOptions::default()).unwrap();
        assert!(!scene.incomplete);
        assert_eq!(scene.meshes.len(), 1);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.normals.len(), 4);
        assert_eq!(mesh.tex_coords.as_ref().map(Vec::len), Some(4));
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.positions.len()));

        let material = &scene.materials[mesh.material.unwrap()];
        assert_eq!(material.diffuse_textures, ["textures/albedo.png"]);
        assert_eq!(material.specular_textures, ["textures/shine.png"]);

        let root = scene.root.as_ref().unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].meshes, [0]);
    }

    #[test]
    fn missing_material_library_is_not_fatal() {
        let dir = scratch_dir("no-mtl");
        std::fs::write(dir.join("quad.obj"), QUAD).unwrap();

        let scene = import(&dir.join("quad.obj"), &ImportOptions::default()).unwrap();
        assert!(scene.materials.is_empty());
        assert_eq!(scene.meshes[0].material, None);
    }

    #[test]
    fn missing_file_is_an_obj_error() {
        let err = import(Path::new("nowhere/ghost.obj"), &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::Obj { .. }));
    }
}
