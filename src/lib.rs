//! A small rendering-asset library on top of OpenGL 3.3.
//!
//! The pieces, leaf to root:
//!
//! - [`abs::ShaderProgram`]: compiled and linked GLSL program with typed uniform setters.
//! - [`abs::Texture`]: decoded image uploaded with a full mipmap chain.
//! - [`abs::Mesh`]: one vertex/index buffer set plus its textures; one draw call per
//!   [`abs::Mesh::draw`].
//! - [`model::Model`]: every mesh of an imported OBJ or glTF file, with textures shared through a
//!   [`cache::AssetCache`].
//! - [`camera::Camera`]: yaw/pitch fly camera producing view and projection matrices.
//!
//! All GL calls mutate the context's global state and must happen on the thread that owns it.

pub mod abs;
pub mod cache;
pub mod camera;
pub mod frame;
pub mod import;
pub mod input;
pub mod lighting;
pub mod logging;
pub mod model;
pub mod settings;
