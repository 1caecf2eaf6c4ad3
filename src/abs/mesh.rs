//! Mesh management module.
//!
//! This module defines the [`Mesh`] struct for managing mesh data on the GPU side. Vertex types
//! describe their GPU layout through the [`VertexLayout`] trait; model geometry uses [`Vertex`].

use std::{rc::Rc, sync::Arc};

use glam::{Vec2, Vec3};
use glow::HasContext;

use crate::abs::{ShaderProgram, Texture, TextureKind};

/// Trait that defines the necessary methods for a vertex.
///
/// # Safety
///
/// Vertex slices are uploaded byte for byte, so implementors must be `#[repr(C)]` plain data
/// without padding bytes.
pub unsafe trait VertexLayout: Copy {
    /// Sets up the vertex attribute pointers for the vertex.
    fn vertex_attribs(gl: &glow::Context);
}

/// A model vertex: position, normal and one set of texture coordinates.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

// SAFETY: three `f32` vectors under `repr(C)`, 32 bytes with no padding.
unsafe impl VertexLayout for Vertex {
    fn vertex_attribs(gl: &glow::Context) {
        unsafe {
            let stride = std::mem::size_of::<Vertex>() as i32;

            // Position attribute
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(
                0,
                3,
                glow::FLOAT,
                false,
                stride,
                std::mem::offset_of!(Vertex, position) as i32,
            );

            // Normal attribute
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(
                1,
                3,
                glow::FLOAT,
                false,
                stride,
                std::mem::offset_of!(Vertex, normal) as i32,
            );

            // Texture coordinate attribute
            gl.enable_vertex_attrib_array(2);
            gl.vertex_attrib_pointer_f32(
                2,
                2,
                glow::FLOAT,
                false,
                stride,
                std::mem::offset_of!(Vertex, tex_coords) as i32,
            );
        }
    }
}

/// Errors produced while creating a [`Mesh`].
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("index {index} is out of range for a mesh with {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("failed to allocate mesh buffers: {0}")]
    Allocation(String),
}

/// Checks that every index refers to an existing vertex.
pub fn validate_indices(indices: &[u32], vertex_count: usize) -> Result<(), MeshError> {
    match indices.iter().find(|&&index| index as usize >= vertex_count) {
        Some(&index) => Err(MeshError::IndexOutOfRange {
            index,
            vertex_count,
        }),
        None => Ok(()),
    }
}

/// Builds the sampler uniform name for each texture slot, in slot order.
///
/// Slots are numbered from 1 independently per kind, so `[diffuse, diffuse, specular]` yields
/// `material.texture_diffuse1`, `material.texture_diffuse2` and `material.texture_specular1`.
/// Unspecified textures get `None`.
pub fn texture_uniform_names<I>(kinds: I) -> Vec<Option<String>>
where
    I: IntoIterator<Item = TextureKind>,
{
    let mut diffuse = 0;
    let mut specular = 0;
    kinds
        .into_iter()
        .map(|kind| {
            let counter = match kind {
                TextureKind::Diffuse => &mut diffuse,
                TextureKind::Specular => &mut specular,
                TextureKind::Unspecified => return None,
            };
            *counter += 1;
            kind.sampler_prefix()
                .map(|prefix| format!("material.{prefix}{counter}"))
        })
        .collect()
}

/// Views a vertex slice as the bytes uploaded to the vertex buffer.
pub fn vertex_bytes<V: VertexLayout>(vertices: &[V]) -> &[u8] {
    // SAFETY: `VertexLayout` guarantees a padding-free `repr(C)` type, so every byte is
    // initialized.
    unsafe {
        std::slice::from_raw_parts(vertices.as_ptr() as *const u8, std::mem::size_of_val(vertices))
    }
}

/// Maps a failed allocation to [`MeshError::Allocation`] after running `release`, which frees
/// the objects created before it.
fn or_release<T>(result: Result<T, String>, release: impl FnOnce()) -> Result<T, MeshError> {
    result.map_err(|err| {
        release();
        MeshError::Allocation(err)
    })
}

/// Represents a mesh stored on the GPU side.
#[derive(Debug)]
pub struct Mesh {
    gl: Arc<glow::Context>,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    index_count: usize,
    textures: Vec<Rc<Texture>>,
}

impl Mesh {
    /// Uploads the given vertex and index data as an indexed triangle list.
    ///
    /// Fails if any index does not refer to one of `vertices`.
    pub fn new<V: VertexLayout>(
        gl: &Arc<glow::Context>,
        vertices: &[V],
        indices: &[u32],
        textures: Vec<Rc<Texture>>,
    ) -> Result<Self, MeshError> {
        validate_indices(indices, vertices.len())?;

        unsafe {
            let vao = gl.create_vertex_array().map_err(MeshError::Allocation)?;
            let vbo = or_release(gl.create_buffer(), || gl.delete_vertex_array(vao))?;
            let ebo = or_release(gl.create_buffer(), || {
                gl.delete_buffer(vbo);
                gl.delete_vertex_array(vao);
            })?;

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                vertex_bytes(vertices),
                glow::STATIC_DRAW,
            );

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                std::slice::from_raw_parts(
                    indices.as_ptr() as *const u8,
                    std::mem::size_of_val(indices),
                ),
                glow::STATIC_DRAW,
            );

            V::vertex_attribs(gl);

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

            Ok(Self {
                gl: Arc::clone(gl),
                vao,
                vbo,
                ebo,
                index_count: indices.len(),
                textures,
            })
        }
    }

    /// Binds the mesh textures and draws the mesh with `program`.
    ///
    /// Texture `i` goes to texture unit `i`. This mutates the active texture unit and the
    /// vertex array binding; `program` must already be in use.
    pub fn draw(&self, program: &ShaderProgram) {
        let names = texture_uniform_names(self.textures.iter().map(|texture| texture.kind()));
        for (unit, (texture, name)) in self.textures.iter().zip(names).enumerate() {
            match name {
                Some(name) => program.set_texture(&name, texture, unit as u32),
                None => texture.bind(unit as u32),
            }
        }

        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl
                .draw_elements(glow::TRIANGLES, self.index_count as i32, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
            self.gl.active_texture(glow::TEXTURE0);
        }
    }

    /// Returns the amount of indices used in the mesh.
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Returns the textures bound when drawing, in unit order.
    pub fn textures(&self) -> &[Rc<Texture>] {
        &self.textures
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_buffer(self.ebo);
            self.gl.delete_vertex_array(self.vao);
        }
    }
}
