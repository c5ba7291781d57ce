//! Texture font decoding.

use hitrun_common::math::Vec2;

use super::texture::{decode_texture, Texture};
use super::{check_count, expect_type, required_child};
use crate::{ChunkRef, ChunkType, DecodeResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Index into [`Font::textures`].
    pub texture: u32,
    pub bottom_left: Vec2,
    pub top_right: Vec2,
    pub left_bearing: f32,
    pub right_bearing: f32,
    pub width: f32,
    pub advance: f32,
    /// Character code.
    pub code: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub name: String,
    pub version: u32,
    pub shader: String,
    pub size: f32,
    pub width: f32,
    pub height: f32,
    pub baseline: f32,
    pub textures: Vec<Texture>,
    pub glyphs: Vec<Glyph>,
}

impl Font {
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.code == c as u32)
    }

    /// Horizontal extent of `text`; characters without a glyph are skipped.
    pub fn measure(&self, text: &str) -> f32 {
        text.chars().filter_map(|c| self.glyph(c)).map(|g| g.advance).sum()
    }
}

pub fn decode_font(chunk: ChunkRef<'_>) -> DecodeResult<Font> {
    expect_type(chunk, ChunkType::TEXTURE_FONT)?;
    let mut cursor = chunk.cursor();

    let name = cursor.read_lp_string()?;
    let version = cursor.read_u32()?;
    let shader = cursor.read_lp_string()?;
    let size = cursor.read_f32()?;
    let width = cursor.read_f32()?;
    let height = cursor.read_f32()?;
    let baseline = cursor.read_f32()?;
    let texture_count = cursor.read_u32()? as usize;

    let textures = chunk
        .children_of_type(ChunkType::TEXTURE)
        .map(decode_texture)
        .collect::<DecodeResult<Vec<_>>>()?;
    check_count("font textures", texture_count, textures.len())?;

    let mut cursor = required_child(chunk, ChunkType::FONT_GLYPHS)?.cursor();
    let glyph_count = cursor.read_u32()? as usize;
    let glyphs = cursor.read_counted(glyph_count, 40, |c| {
        Ok(Glyph {
            texture: c.read_u32()?,
            bottom_left: c.read_vec2()?,
            top_right: c.read_vec2()?,
            left_bearing: c.read_f32()?,
            right_bearing: c.read_f32()?,
            width: c.read_f32()?,
            advance: c.read_f32()?,
            code: c.read_u32()?,
        })
    })?;

    Ok(Font {
        name,
        version,
        shader,
        size,
        width,
        height,
        baseline,
        textures,
        glyphs,
    })
}
