//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct which is a CPU representation of a GPU texture, and
//! [`TextureImage`], the decoded pixels waiting to be uploaded.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use glow::HasContext;
use image::{DynamicImage, GenericImageView};

/// The semantic role a texture plays in a material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureKind {
    #[default]
    Unspecified,
    Diffuse,
    Specular,
}

impl TextureKind {
    /// Returns the sampler name prefix shaders use for this kind, if it has one.
    pub fn sampler_prefix(self) -> Option<&'static str> {
        match self {
            TextureKind::Unspecified => None,
            TextureKind::Diffuse => Some("texture_diffuse"),
            TextureKind::Specular => Some("texture_specular"),
        }
    }
}

/// Options that must be shared by every texture of a loading session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureOptions {
    /// Flip images vertically while decoding so row 0 is the bottom of the image.
    pub flip_vertically: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_vertically: true,
        }
    }
}

/// Errors produced while loading a [`Texture`].
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode image '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to allocate texture: {0}")]
    Allocation(String),
}

/// Channel layout of decoded pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    /// Returns the OpenGL pixel format used both as internal and upload format.
    pub fn gl_format(self) -> u32 {
        match self {
            PixelFormat::Rgb => glow::RGB,
            PixelFormat::Rgba => glow::RGBA,
        }
    }

    /// Number of bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// Decoded image data ready to be uploaded to the GPU.
#[derive(Clone, Debug)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// Decodes the image file at `path`.
    pub fn decode(path: impl AsRef<Path>, flip_vertically: bool) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_dynamic(image, flip_vertically))
    }

    /// Converts an already decoded [`image::DynamicImage`].
    ///
    /// Three channel images stay RGB. Everything else, grayscale included, is expanded to RGBA so
    /// samplers always see the colour in `.rgb`.
    pub fn from_dynamic(image: DynamicImage, flip_vertically: bool) -> Self {
        let image = if flip_vertically { image.flipv() } else { image };
        let (width, height) = image.dimensions();
        let (format, pixels) = match image.color().channel_count() {
            3 => (PixelFormat::Rgb, image.into_rgb8().into_raw()),
            _ => (PixelFormat::Rgba, image.into_rgba8().into_raw()),
        };
        Self {
            width,
            height,
            format,
            pixels,
        }
    }
}

/// Represents a texture stored on the GPU side.
pub struct Texture {
    gl: Arc<glow::Context>,
    id: glow::Texture,
    width: u32,
    height: u32,
    kind: TextureKind,
    path: PathBuf,
}

impl Texture {
    /// Decodes the image at `path`, uploads it and generates its mipmap chain.
    pub fn load(
        gl: &Arc<glow::Context>,
        path: impl AsRef<Path>,
        kind: TextureKind,
        options: &TextureOptions,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = TextureImage::decode(path, options.flip_vertically)?;
        log::debug!(
            "uploading {:?} texture '{}' ({}x{}, {:?})",
            kind,
            path.display(),
            image.width,
            image.height,
            image.format
        );
        Self::from_image(gl, &image, kind, path)
    }

    /// Uploads decoded pixels as a mipmapped, repeating 2D texture.
    pub fn from_image(
        gl: &Arc<glow::Context>,
        image: &TextureImage,
        kind: TextureKind,
        path: impl Into<PathBuf>,
    ) -> Result<Self, TextureError> {
        let format = image.format.gl_format();
        unsafe {
            let texture = gl.create_texture().map_err(TextureError::Allocation)?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            // RGB rows are not necessarily 4-byte aligned.
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                image.width as i32,
                image.height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(image.pixels.as_slice())),
            );
            gl.generate_mipmap(glow::TEXTURE_2D);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
            gl.bind_texture(glow::TEXTURE_2D, None);

            Ok(Self {
                gl: Arc::clone(gl),
                id: texture,
                width: image.width,
                height: image.height,
                kind,
                path: path.into(),
            })
        }
    }

    /// Returns the underlying GL texture.
    pub fn id(&self) -> glow::Texture {
        self.id
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the role this texture was loaded for.
    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    /// Returns the path the texture was decoded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind(&self, unit: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(self.id));
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.id);
        }
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("kind", &self.kind)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn scratch_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lumen3d-texture-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = TextureImage::decode("missing.png", true).unwrap_err();
        match err {
            TextureError::Decode { path, .. } => assert_eq!(path, Path::new("missing.png")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_file_is_a_decode_error() {
        let path = scratch_path("garbage.png");
        std::fs::write(&path, b"this is not a png").unwrap();
        assert!(matches!(
            TextureImage::decode(&path, false),
            Err(TextureError::Decode { .. })
        ));
    }

    #[test]
    fn channel_count_selects_format() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])));
        let image = TextureImage::from_dynamic(rgb, false);
        assert_eq!(image.format, PixelFormat::Rgb);
        assert_eq!(image.pixels.len(), 3 * 2 * 3);

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        assert_eq!(TextureImage::from_dynamic(rgba, false).format, PixelFormat::Rgba);
    }

    #[test]
    fn grayscale_expands_to_rgba() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([9])));
        let image = TextureImage::from_dynamic(gray, false);
        assert_eq!(image.format, PixelFormat::Rgba);
        assert_eq!(image.format.gl_format(), glow::RGBA);
        assert_eq!(image.pixels, [9, 9, 9, 255].repeat(4));
    }

    #[test]
    fn two_channel_images_expand_to_rgba() {
        let luma_alpha = DynamicImage::ImageLumaA8(image::GrayAlphaImage::from_pixel(
            1,
            1,
            image::LumaA([10, 200]),
        ));
        let image = TextureImage::from_dynamic(luma_alpha, false);
        assert_eq!(image.format, PixelFormat::Rgba);
        assert_eq!(image.pixels, vec![10, 10, 10, 200]);
    }

    #[test]
    fn flip_reverses_rows() {
        let mut img = RgbImage::new(1, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 255]));

        let flipped = TextureImage::from_dynamic(DynamicImage::ImageRgb8(img.clone()), true);
        assert_eq!(&flipped.pixels[0..3], &[0, 0, 255]);

        let unflipped = TextureImage::from_dynamic(DynamicImage::ImageRgb8(img), false);
        assert_eq!(&unflipped.pixels[0..3], &[255, 0, 0]);
    }

    #[test]
    fn decode_round_trips_through_png() {
        let path = scratch_path("checker.png");
        RgbaImage::from_fn(2, 2, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 128])
            }
        })
        .save(&path)
        .unwrap();

        let image = TextureImage::decode(&path, false).unwrap();
        assert_eq!((image.width, image.height), (2, 2));
        assert_eq!(image.format, PixelFormat::Rgba);
        assert_eq!(&image.pixels[4..8], &[0, 0, 0, 128]);
    }

    #[test]
    fn sampler_prefixes() {
        assert_eq!(TextureKind::Diffuse.sampler_prefix(), Some("texture_diffuse"));
        assert_eq!(TextureKind::Specular.sampler_prefix(), Some("texture_specular"));
        assert_eq!(TextureKind::Unspecified.sampler_prefix(), None);
        assert_eq!(PixelFormat::Rgb.channels(), 3);
    }
}
