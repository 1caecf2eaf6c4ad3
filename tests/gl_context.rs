//! Checks that need a live OpenGL 3.3 context.
//!
//! These open a hidden SDL window and are ignored by default; run them on a machine with a GPU
//! (or a software rasterizer) via `cargo test -- --ignored`. SDL can only be initialized once at a
//! time, so everything runs inside a single test.

use std::{path::PathBuf, rc::Rc, sync::Arc};

use glam::{Mat3, Mat4, Vec2, Vec3};
use glow::HasContext;
use lumen3d::{
    abs::{
        App, Mesh, PixelFormat, ShaderProgram, Texture, TextureImage, TextureKind, TextureOptions,
        Vertex,
    },
    cache::AssetCache,
    lighting::SceneLights,
    model::{Model, ModelError},
    settings::WindowSettings,
};

const VERTEX: &str = "\
#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 2) in vec2 aTexCoords;
out vec2 TexCoords;
uniform vec3 offset;
uniform mat4 warp;
void main() {
    TexCoords = aTexCoords;
    gl_Position = warp * vec4(aPos + offset, 1.0);
}
";

const FRAGMENT: &str = "\
#version 330 core
in vec2 TexCoords;
out vec4 FragColor;
uniform float scale;
uniform int mode;
uniform bool highlight;
uniform mat3 tint;
struct Material { sampler2D texture_diffuse1; };
uniform Material material;
void main() {
    vec4 color = texture(material.texture_diffuse1, TexCoords) * scale + vec4(float(mode));
    if (highlight) {
        color.rgb = tint * color.rgb;
    }
    FragColor = color;
}
";

const TEXTURED_FRAGMENT: &str = "\
#version 330 core
in vec2 TexCoords;
out vec4 FragColor;
struct Material {
    sampler2D texture_diffuse1;
    sampler2D texture_diffuse2;
    sampler2D texture_specular1;
};
uniform Material material;
void main() {
    FragColor = texture(material.texture_diffuse1, TexCoords)
        + texture(material.texture_diffuse2, TexCoords)
        + texture(material.texture_specular1, TexCoords);
}
";

const BROKEN_VERTEX: &str = "\
#version 330 core
void main() { gl_Position = vec4(undeclared, 1.0); }
";

const UNCLOSED_VERTEX: &str = "\
#version 330 core
layout (location = 0) in vec3 aPos;
void main() {
    gl_Position = vec4(aPos, 1.0);
";

const QUAD_OBJ: &str = "\
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
map_Kd albedo.png
";

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("lumen3d-gl-{}", std::process::id()))
        .join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &std::path::Path) {
    let image = image::RgbaImage::from_fn(4, 2, |x, y| image::Rgba([x as u8 * 60, y as u8 * 120, 0, 255]));
    image.save(path).unwrap();
}

fn hidden_app() -> App {
    App::new(&WindowSettings {
        width: 64,
        height: 64,
        hidden: true,
        ..Default::default()
    })
    .expect("an OpenGL 3.3 context")
}

fn assert_no_gl_error(gl: &glow::Context) {
    assert_eq!(unsafe { gl.get_error() }, glow::NO_ERROR);
}

fn uniforms_are_written_and_missing_ones_ignored(gl: &Arc<glow::Context>) {
    let program = ShaderProgram::from_sources(gl, VERTEX, FRAGMENT).unwrap();
    assert!(program.is_linked());
    program.use_program();

    program.set_uniform("scale", 2.5f32);
    program.set_uniform("mode", 3i32);
    program.set_uniform("offset", Vec3::new(0.5, -1.0, 2.0));
    program.set_uniform("doesNotExist", 1.0f32);
    assert!(program.has_uniform("scale"));
    assert!(!program.has_uniform("doesNotExist"));

    let id = program.id().unwrap();
    unsafe {
        let mut scale = [0.0f32];
        let location = gl.get_uniform_location(id, "scale").unwrap();
        gl.get_uniform_f32(id, &location, &mut scale);
        assert_eq!(scale, [2.5]);

        let mut mode = [0i32];
        let location = gl.get_uniform_location(id, "mode").unwrap();
        gl.get_uniform_i32(id, &location, &mut mode);
        assert_eq!(mode, [3]);

        let mut offset = [0.0f32; 3];
        let location = gl.get_uniform_location(id, "offset").unwrap();
        gl.get_uniform_f32(id, &location, &mut offset);
        assert_eq!(offset, [0.5, -1.0, 2.0]);
    }

    let warp = Mat4::from_cols_array(&[
        1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
    ]);
    let tint = Mat3::from_cols_array(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9]);
    program.set_uniform("warp", warp);
    program.set_uniform("tint", tint);
    program.set_uniform("highlight", true);
    unsafe {
        let mut read = [0.0f32; 16];
        let location = gl.get_uniform_location(id, "warp").unwrap();
        gl.get_uniform_f32(id, &location, &mut read);
        assert_eq!(read, warp.to_cols_array());

        let mut read = [0.0f32; 9];
        let location = gl.get_uniform_location(id, "tint").unwrap();
        gl.get_uniform_f32(id, &location, &mut read);
        assert_eq!(read, tint.to_cols_array());

        let mut highlight = [0i32];
        let location = gl.get_uniform_location(id, "highlight").unwrap();
        gl.get_uniform_i32(id, &location, &mut highlight);
        assert_eq!(highlight, [1]);
    }
    program.set_uniform("highlight", false);
    unsafe {
        let mut highlight = [1i32];
        let location = gl.get_uniform_location(id, "highlight").unwrap();
        gl.get_uniform_i32(id, &location, &mut highlight);
        assert_eq!(highlight, [0]);
    }

    // Light members this program does not declare are skipped.
    SceneLights::default().apply(&program);
    assert_no_gl_error(gl);
}

fn broken_shader_yields_inert_program(gl: &Arc<glow::Context>) {
    let (program, err) = ShaderProgram::from_sources_lossy(gl, BROKEN_VERTEX, FRAGMENT);
    let err = err.expect("compile error");
    assert!(err.to_string().contains("VERTEX"), "{err}");
    assert!(!program.is_linked());

    program.use_program();
    program.set_uniform("scale", 1.0f32);
    assert!(!program.has_uniform("scale"));
    assert_no_gl_error(gl);

    assert!(ShaderProgram::from_sources(gl, BROKEN_VERTEX, FRAGMENT).is_err());

    let (program, err) = ShaderProgram::from_sources_lossy(gl, UNCLOSED_VERTEX, FRAGMENT);
    let err = err.expect("compile error");
    assert!(err.to_string().contains("VERTEX"), "{err}");
    assert!(!program.is_linked());
    program.use_program();
    program.set_uniform("warp", Mat4::IDENTITY);
    assert_no_gl_error(gl);
}

fn solid_texture(gl: &Arc<glow::Context>, kind: TextureKind, name: &str, shade: u8) -> Rc<Texture> {
    let image = TextureImage {
        width: 1,
        height: 1,
        format: PixelFormat::Rgba,
        pixels: vec![shade, shade, shade, 255],
    };
    Rc::new(Texture::from_image(gl, &image, kind, name).unwrap())
}

fn mesh_textures_take_consecutive_units(gl: &Arc<glow::Context>) {
    let textures = vec![
        solid_texture(gl, TextureKind::Diffuse, "first.png", 10),
        solid_texture(gl, TextureKind::Diffuse, "second.png", 20),
        solid_texture(gl, TextureKind::Specular, "shine.png", 30),
    ];
    let vertices = [
        Vertex { position: Vec3::ZERO, normal: Vec3::Z, tex_coords: Vec2::ZERO },
        Vertex { position: Vec3::X, normal: Vec3::Z, tex_coords: Vec2::X },
        Vertex { position: Vec3::Y, normal: Vec3::Z, tex_coords: Vec2::Y },
    ];
    let mesh = Mesh::new(gl, &vertices, &[0, 1, 2], textures.clone()).unwrap();

    let program = ShaderProgram::from_sources(gl, VERTEX, TEXTURED_FRAGMENT).unwrap();
    program.use_program();
    program.set_uniform("warp", Mat4::IDENTITY);
    mesh.draw(&program);
    assert_no_gl_error(gl);

    let id = program.id().unwrap();
    let samplers = [
        "material.texture_diffuse1",
        "material.texture_diffuse2",
        "material.texture_specular1",
    ];
    for (unit, (sampler, texture)) in samplers.iter().zip(&textures).enumerate() {
        unsafe {
            let mut bound_unit = [-1i32];
            let location = gl.get_uniform_location(id, sampler).unwrap();
            gl.get_uniform_i32(id, &location, &mut bound_unit);
            assert_eq!(bound_unit, [unit as i32], "{sampler}");

            gl.active_texture(glow::TEXTURE0 + unit as u32);
            let bound = gl.get_parameter_i32(glow::TEXTURE_BINDING_2D);
            assert_eq!(bound as u32, texture.id().0.get(), "unit {unit}");
        }
    }
    unsafe {
        gl.active_texture(glow::TEXTURE0);
    }
}

fn cache_shares_gpu_textures(gl: &Arc<glow::Context>) {
    let dir = scratch_dir("cache");
    let path = dir.join("shared.png");
    write_png(&path);
    let key = path.to_string_lossy().into_owned();

    let mut cache = AssetCache::new(gl, TextureOptions::default());
    let first = cache.texture(&key, TextureKind::Diffuse).unwrap();
    let second = cache.texture(&key, TextureKind::Specular).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.id(), second.id());
    assert_eq!(second.kind(), TextureKind::Diffuse);
    assert_eq!((first.width(), first.height()), (4, 2));
    assert_eq!(cache.texture_count(), 1);
}

fn model_loads_and_draws(gl: &Arc<glow::Context>) {
    let dir = scratch_dir("model");
    std::fs::write(dir.join("quad.obj"), QUAD_OBJ).unwrap();
    std::fs::write(dir.join("quad.mtl"), QUAD_MTL).unwrap();
    write_png(&dir.join("albedo.png"));

    let mut cache = AssetCache::new(gl, TextureOptions::default());
    let model = Model::load(gl, dir.join("quad.obj"), &mut cache).unwrap();
    assert_eq!(model.meshes().len(), 1);
    assert_eq!(model.meshes()[0].index_count(), 6);
    assert_eq!(model.meshes()[0].textures().len(), 1);

    // A second model reusing the texture does not upload it again.
    let again = Model::load(gl, dir.join("quad.obj"), &mut cache).unwrap();
    assert!(Rc::ptr_eq(
        &model.meshes()[0].textures()[0],
        &again.meshes()[0].textures()[0]
    ));
    assert_eq!(cache.texture_count(), 1);

    let program = ShaderProgram::from_sources(gl, VERTEX, FRAGMENT).unwrap();
    program.use_program();
    program.set_uniform("scale", 1.0f32);
    model.draw(&program);
    assert_no_gl_error(gl);

    std::fs::remove_file(dir.join("albedo.png")).unwrap();
    let mut fresh = AssetCache::new(gl, TextureOptions::default());
    let err = Model::load(gl, dir.join("quad.obj"), &mut fresh).unwrap_err();
    assert!(matches!(err, ModelError::Texture { .. }), "{err}");
}

#[test]
#[ignore = "needs an OpenGL 3.3 context"]
fn gl_resources() {
    let app = hidden_app();
    uniforms_are_written_and_missing_ones_ignored(&app.gl);
    broken_shader_yields_inert_program(&app.gl);
    mesh_textures_take_consecutive_units(&app.gl);
    cache_shares_gpu_textures(&app.gl);
    model_loads_and_draws(&app.gl);
}
