//! Texture, image and sprite decoding.
//!
//! Every decoded image ends up as a flat, row-major pixel buffer with either
//! three (RGB) or four (RGBA) bytes per pixel.

use hitrun_common::ByteCursor;

use super::{expect_type, required_child};
use crate::{ChunkRef, ChunkType, DecodeError, DecodeResult};

/// Encoding of an image's data blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Raw,
    Png,
    Tga,
    Bmp,
    Jpeg,
}

impl ImageFormat {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::Raw,
            1 => Self::Png,
            2 => Self::Tga,
            3 => Self::Bmp,
            4 => Self::Jpeg,
            _ => return None,
        })
    }

    fn codec(self) -> Option<image::ImageFormat> {
        match self {
            Self::Raw => None,
            Self::Png => Some(image::ImageFormat::Png),
            Self::Tga => Some(image::ImageFormat::Tga),
            Self::Bmp => Some(image::ImageFormat::Bmp),
            Self::Jpeg => Some(image::ImageFormat::Jpeg),
        }
    }
}

/// A decoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Bits per pixel as declared by the source.
    pub source_bpp: u32,
    pub format: ImageFormat,
    /// Bytes per pixel in `pixels`: 3 or 4.
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl Image {
    /// An in-memory RGBA image.
    pub fn from_rgba(name: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            source_bpp: 32,
            format: ImageFormat::Raw,
            channels: 4,
            pixels,
        }
    }

    /// Pixels expanded to RGBA; opaque alpha is added to RGB data.
    pub fn to_rgba(&self) -> Vec<u8> {
        match self.channels {
            4 => self.pixels.clone(),
            _ => self
                .pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 0xFF])
                .collect(),
        }
    }
}

/// A texture: header fields plus its first image.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    pub version: u32,
    pub bpp: u32,
    pub alpha_depth: u32,
    pub mip_levels: u32,
    pub texture_type: u32,
    pub usage: u32,
    pub priority: u32,
    pub image: Image,
}

impl Texture {
    /// Wrap an already-decoded image as a texture.
    pub fn from_image(name: impl Into<String>, image: Image) -> Self {
        Self {
            name: name.into(),
            version: 0,
            bpp: image.source_bpp,
            alpha_depth: if image.channels == 4 { 8 } else { 0 },
            mip_levels: 1,
            texture_type: 0,
            usage: 0,
            priority: 0,
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }

    pub fn channels(&self) -> u8 {
        self.image.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.image.pixels
    }
}

/// A sprite: a set of equally sized frames cut from an atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub name: String,
    pub native_width: u32,
    pub native_height: u32,
    pub shader: String,
    pub image_width: u32,
    pub image_height: u32,
    pub blit_border: u32,
    pub frames: Vec<Image>,
}

impl Sprite {
    /// Reassemble the frames into one RGBA image of the sprite's native size.
    ///
    /// Frames are laid left to right and wrap to a new row once they pass the
    /// right edge. Each frame contributes its top-left region with
    /// `2 * blit_border` pixels cut from the width and height.
    pub fn stitch(&self) -> DecodeResult<Image> {
        let byte_len = self.native_byte_len()?;
        let (width, height) = (self.native_width as usize, self.native_height as usize);
        let border = 2 * self.blit_border as usize;
        let mut out = vec![0u8; byte_len];

        let (mut dst_col, mut dst_row) = (0usize, 0usize);
        for frame in &self.frames {
            let rgba = frame.to_rgba();
            let frame_width = frame.width as usize;
            let tile_width = frame_width.saturating_sub(border);
            let tile_height = (frame.height as usize).saturating_sub(border);
            let copy_width = tile_width.min(width.saturating_sub(dst_col));

            for row in 0..tile_height {
                if dst_row + row >= height {
                    break;
                }
                let dst = ((dst_row + row) * width + dst_col) * 4;
                let src = row * frame_width * 4;
                let Some(line) = rgba.get(src..src + copy_width * 4) else {
                    break;
                };
                out[dst..dst + copy_width * 4].copy_from_slice(line);
            }

            dst_col += tile_width;
            if dst_col >= width {
                dst_col = 0;
                dst_row += tile_height;
            }
        }

        Ok(Image::from_rgba(self.name.clone(), self.native_width, self.native_height, out))
    }

    /// RGBA byte length of the stitched image.
    ///
    /// The native area may not exceed the pixels the frames actually carry.
    fn native_byte_len(&self) -> DecodeResult<usize> {
        let too_large = || DecodeError::ImageTooLarge {
            width: self.native_width,
            height: self.native_height,
        };
        let area = u64::from(self.native_width) * u64::from(self.native_height);
        let available = self
            .frames
            .iter()
            .map(|f| (f.pixels.len() / usize::from(f.channels.max(1))) as u64)
            .fold(0u64, u64::saturating_add);
        if area > available {
            return Err(too_large());
        }
        area.checked_mul(4)
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(too_large)
    }
}

/// Decode a `Texture` chunk and its first `Image` child.
pub fn decode_texture(chunk: ChunkRef<'_>) -> DecodeResult<Texture> {
    expect_type(chunk, ChunkType::TEXTURE)?;
    let mut cursor = chunk.cursor();

    let name = cursor.read_lp_string()?;
    let version = cursor.read_u32()?;
    let width = cursor.read_u32()?;
    let height = cursor.read_u32()?;
    let bpp = cursor.read_u32()?;
    let alpha_depth = cursor.read_u32()?;
    let mip_levels = cursor.read_u32()?;
    let texture_type = cursor.read_u32()?;
    let usage = cursor.read_u32()?;
    let priority = cursor.read_u32()?;

    let image = decode_image(required_child(chunk, ChunkType::IMAGE)?)?;
    if image.width != width || image.height != height {
        tracing::debug!(
            texture = %name,
            header = ?(width, height),
            image = ?(image.width, image.height),
            "texture header size differs from its image"
        );
    }

    Ok(Texture {
        name,
        version,
        bpp,
        alpha_depth,
        mip_levels,
        texture_type,
        usage,
        priority,
        image,
    })
}

struct ImageHeader {
    width: u32,
    height: u32,
    bpp: u32,
    palettized: bool,
    has_alpha: bool,
}

/// Decode an `Image` chunk and its `ImageData` child into pixels.
pub fn decode_image(chunk: ChunkRef<'_>) -> DecodeResult<Image> {
    expect_type(chunk, ChunkType::IMAGE)?;
    let mut cursor = chunk.cursor();

    let name = cursor.read_lp_string()?;
    let _version = cursor.read_u32()?;
    let header = ImageHeader {
        width: cursor.read_u32()?,
        height: cursor.read_u32()?,
        bpp: cursor.read_u32()?,
        palettized: cursor.read_bool32()?,
        has_alpha: cursor.read_bool32()?,
    };
    let format_code = cursor.read_u32()?;
    let format =
        ImageFormat::from_u32(format_code).ok_or(DecodeError::UnsupportedImageFormat(format_code))?;

    let data_chunk = required_child(chunk, ChunkType::IMAGE_DATA)?;
    let mut data_cursor = data_chunk.cursor();
    let len = data_cursor.read_u32()? as usize;
    let data = data_cursor.read_bytes(len)?;

    let (width, height, channels, pixels) = match format.codec() {
        None => {
            let (channels, pixels) = decode_raw(&header, data)?;
            (header.width, header.height, channels, pixels)
        }
        Some(codec) => {
            let decoded = image::load_from_memory_with_format(data, codec)?;
            let (w, h) = (decoded.width(), decoded.height());
            if decoded.color().has_alpha() {
                (w, h, 4, decoded.into_rgba8().into_raw())
            } else {
                (w, h, 3, decoded.into_rgb8().into_raw())
            }
        }
    };

    Ok(Image {
        name,
        width,
        height,
        source_bpp: header.bpp,
        format,
        channels,
        pixels,
    })
}

fn decode_raw(header: &ImageHeader, data: &[u8]) -> DecodeResult<(u8, Vec<u8>)> {
    let too_large = || DecodeError::ImageTooLarge {
        width: header.width,
        height: header.height,
    };
    let pixel_count = (header.width as usize)
        .checked_mul(header.height as usize)
        .ok_or_else(too_large)?;
    let mut cursor = ByteCursor::new(data);

    if header.palettized {
        if header.bpp != 8 {
            return Err(DecodeError::UnsupportedPixelDepth(header.bpp));
        }
        let palette_len = cursor.read_u32()? as usize;
        let palette = cursor.read_counted(palette_len, 4, |c| c.read_u32())?;
        let indices = cursor.read_bytes(pixel_count)?;

        let channels = if header.has_alpha { 4 } else { 3 };
        let mut pixels = Vec::with_capacity(pixel_count * channels);
        for &index in indices {
            let argb = *palette.get(index as usize).ok_or(DecodeError::PaletteIndex {
                index,
                palette_len,
            })?;
            let [b, g, r, a] = argb.to_le_bytes();
            pixels.extend_from_slice(&[r, g, b]);
            if header.has_alpha {
                pixels.push(a);
            }
        }
        return Ok((channels as u8, pixels));
    }

    let channels = match header.bpp {
        24 => 3,
        32 => 4,
        other => return Err(DecodeError::UnsupportedPixelDepth(other)),
    };
    let byte_len = pixel_count.checked_mul(channels).ok_or_else(too_large)?;
    let pixels = cursor.read_bytes(byte_len)?.to_vec();
    Ok((channels as u8, pixels))
}

/// Decode a `Sprite` chunk and all of its frames.
pub fn decode_sprite(chunk: ChunkRef<'_>) -> DecodeResult<Sprite> {
    expect_type(chunk, ChunkType::SPRITE)?;
    let mut cursor = chunk.cursor();

    let name = cursor.read_lp_string()?;
    let native_width = cursor.read_u32()?;
    let native_height = cursor.read_u32()?;
    let shader = cursor.read_lp_string()?;
    let image_width = cursor.read_u32()?;
    let image_height = cursor.read_u32()?;
    let image_count = cursor.read_u32()? as usize;
    let blit_border = cursor.read_u32()?;

    let frames = chunk
        .children_of_type(ChunkType::IMAGE)
        .map(decode_image)
        .collect::<DecodeResult<Vec<_>>>()?;
    super::check_count("sprite images", image_count, frames.len())?;

    let sprite = Sprite {
        name,
        native_width,
        native_height,
        shader,
        image_width,
        image_height,
        blit_border,
        frames,
    };
    sprite.native_byte_len()?;
    Ok(sprite)
}
