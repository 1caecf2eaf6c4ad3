//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for managing OpenGL shaders.
//! This module also provides the [`Uniform`] trait for setting uniform variables in shader
//! programs.
//!
//! Uniform names are resolved at every write. A name the linked program does not expose (never
//! declared, or optimized out by the driver) is silently ignored, so callers may write a generic
//! set of uniforms to any program.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use glow::HasContext;

use crate::abs::Texture;

/// The pipeline stage a [`Shader`] is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Returns the matching OpenGL shader type enum.
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("VERTEX"),
            ShaderStage::Fragment => f.write_str("FRAGMENT"),
        }
    }
}

/// Errors produced while building a [`ShaderProgram`].
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader source '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader compilation failed: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program linking failed: {log}")]
    Link { log: String },
    #[error("failed to allocate shader object: {0}")]
    Allocation(String),
}

/// Represents an individual OpenGL shader.
///
/// A shader only lives long enough to be linked into a [`ShaderProgram`]; dropping it releases
/// the driver-side object.
pub struct Shader {
    gl: Arc<glow::Context>,
    id: glow::Shader,
    stage: ShaderStage,
}

impl Shader {
    /// Compiles a new shader from the given source code.
    pub fn new(gl: &Arc<glow::Context>, stage: ShaderStage, source: &str) -> Result<Self, ShaderError> {
        unsafe {
            let shader = gl
                .create_shader(stage.gl_enum())
                .map_err(ShaderError::Allocation)?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(ShaderError::Compile { stage, log });
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: shader,
                stage,
            })
        }
    }

    /// Returns the stage this shader was compiled for.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_shader(self.id);
        }
    }
}

/// Represents a uniform variable in a shader program.
pub trait Uniform {
    /// Writes the value to an already resolved uniform location of the active program.
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation);
}

impl Uniform for bool {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_i32(Some(location), *self as i32) }
    }
}

impl Uniform for i32 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_i32(Some(location), *self) }
    }
}

impl Uniform for u32 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_u32(Some(location), *self) }
    }
}

impl Uniform for f32 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_f32(Some(location), *self) }
    }
}

impl Uniform for Vec2 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_2_f32(Some(location), self.x, self.y) }
    }
}

impl Uniform for Vec3 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_3_f32(Some(location), self.x, self.y, self.z) }
    }
}

impl Uniform for Vec4 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_4_f32(Some(location), self.x, self.y, self.z, self.w) }
    }
}

impl Uniform for Mat3 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_matrix_3_f32_slice(Some(location), false, &self.to_cols_array()) }
    }
}

impl Uniform for Mat4 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_matrix_4_f32_slice(Some(location), false, &self.to_cols_array()) }
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        T::set_uniform(self, gl, location);
    }
}

/// Represents an OpenGL shader program composed of multiple shaders.
///
/// A program built through one of the `_lossy` constructors may be *inert*: it holds no GL
/// handle, [`ShaderProgram::use_program`] unbinds whatever program was active and every uniform
/// write is a no-op. This lets an interactive caller keep running after a shader edit breaks
/// compilation.
pub struct ShaderProgram {
    gl: Arc<glow::Context>,
    id: Option<glow::Program>,
}

impl ShaderProgram {
    /// Links a new shader program from the given shaders.
    ///
    /// The shaders are detached again once linking is done, so dropping them afterwards frees
    /// their driver-side storage.
    pub fn new(gl: &Arc<glow::Context>, shaders: &[&Shader]) -> Result<Self, ShaderError> {
        unsafe {
            let program = gl.create_program().map_err(ShaderError::Allocation)?;

            for shader in shaders {
                gl.attach_shader(program, shader.id);
            }

            gl.link_program(program);

            for shader in shaders {
                gl.detach_shader(program, shader.id);
            }

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(ShaderError::Link { log });
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: Some(program),
            })
        }
    }

    /// Compiles both stages and links them into a program.
    pub fn from_sources(
        gl: &Arc<glow::Context>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let vert = Shader::new(gl, ShaderStage::Vertex, vertex_source)?;
        let frag = Shader::new(gl, ShaderStage::Fragment, fragment_source)?;
        let program = Self::new(gl, &[&vert, &frag]);
        log::debug!("shader program linked: {}", program.is_ok());
        program
    }

    /// Like [`ShaderProgram::from_sources`], but falls back to an inert program on failure.
    ///
    /// The error, if any, is logged and handed back so the caller can decide whether to halt.
    pub fn from_sources_lossy(
        gl: &Arc<glow::Context>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> (Self, Option<ShaderError>) {
        match Self::from_sources(gl, vertex_source, fragment_source) {
            Ok(program) => (program, None),
            Err(err) => {
                log::error!("{err}; continuing with an inert shader program");
                (Self::inert(gl), Some(err))
            }
        }
    }

    /// Reads both stages from disk, then compiles and links them.
    pub fn from_files(
        gl: &Arc<glow::Context>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_source = read_source(vertex_path.as_ref())?;
        let fragment_source = read_source(fragment_path.as_ref())?;
        Self::from_sources(gl, &vertex_source, &fragment_source)
    }

    /// Reads both stages from disk and builds a program, degrading to an inert one on compile or
    /// link failure. Unreadable files are still an error.
    pub fn from_files_lossy(
        gl: &Arc<glow::Context>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<(Self, Option<ShaderError>), ShaderError> {
        let vertex_source = read_source(vertex_path.as_ref())?;
        let fragment_source = read_source(fragment_path.as_ref())?;
        Ok(Self::from_sources_lossy(gl, &vertex_source, &fragment_source))
    }

    /// Creates a program without a GL handle.
    pub fn inert(gl: &Arc<glow::Context>) -> Self {
        Self {
            gl: Arc::clone(gl),
            id: None,
        }
    }

    /// Returns `true` if this program was successfully linked.
    pub fn is_linked(&self) -> bool {
        self.id.is_some()
    }

    /// Returns the underlying GL program, if any.
    pub fn id(&self) -> Option<glow::Program> {
        self.id
    }

    /// Binds the shader program for use.
    ///
    /// This changes global pipeline state: exactly one program is active at a time.
    pub fn use_program(&self) {
        unsafe {
            self.gl.use_program(self.id);
        }
    }

    /// Returns `true` if the program exposes an active uniform with the given name.
    pub fn has_uniform(&self, name: &str) -> bool {
        self.location(name).is_some()
    }

    /// Sets a uniform variable in the shader program. The program must be in use.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        if let Some(location) = self.location(name) {
            value.set_uniform(&self.gl, &location);
        }
    }

    /// Binds `texture` to texture unit `unit` and points the sampler uniform `name` at it.
    pub fn set_texture(&self, name: &str, texture: &Texture, unit: u32) {
        texture.bind(unit);
        self.set_uniform(name, unit as i32);
    }

    fn location(&self, name: &str) -> Option<glow::UniformLocation> {
        let program = self.id?;
        unsafe { self.gl.get_uniform_location(program, name) }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if let Some(program) = self.id {
            unsafe {
                self.gl.delete_program(program);
            }
        }
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
