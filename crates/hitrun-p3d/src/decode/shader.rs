//! Shader decoding.

use super::expect_type;
use crate::{ChunkRef, ChunkType, DecodeError, DecodeResult};

/// Texture sampling filter, from the `FIMD` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
    NearestMipNearest,
    LinearMipNearest,
    LinearMipLinear,
}

impl FilterMode {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::Nearest,
            1 => Self::Linear,
            2 => Self::NearestMipNearest,
            3 => Self::LinearMipNearest,
            4 => Self::LinearMipLinear,
            _ => return None,
        })
    }
}

/// Texture coordinate wrapping, from the `UVMD` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UvMode {
    #[default]
    Repeat,
    Clamp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShaderParamValue {
    Texture(String),
    Int(u32),
    Float(f32),
    /// ARGB packed colour.
    Colour(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderParam {
    pub key: String,
    pub value: ShaderParamValue,
}

/// A decoded shader.
///
/// The diffuse texture is kept as a name; it is resolved against the
/// resource store each time it is used.
#[derive(Debug, Clone, PartialEq)]
pub struct Shader {
    pub name: String,
    pub version: u32,
    pub pddi_shader: String,
    pub translucent: bool,
    pub vertex_needs: u32,
    pub vertex_mask: u32,
    pub params: Vec<ShaderParam>,
    pub texture: Option<String>,
    pub filter: Option<FilterMode>,
    pub uv_mode: UvMode,
    pub two_sided: bool,
    pub alpha_test: bool,
}

impl Shader {
    /// Look up a raw parameter by key.
    pub fn param(&self, key: &str) -> Option<&ShaderParamValue> {
        self.params.iter().find(|p| p.key == key).map(|p| &p.value)
    }
}

pub fn decode_shader(chunk: ChunkRef<'_>) -> DecodeResult<Shader> {
    expect_type(chunk, ChunkType::SHADER)?;
    let mut cursor = chunk.cursor();

    let name = cursor.read_lp_string()?;
    let version = cursor.read_u32()?;
    let pddi_shader = cursor.read_lp_string()?;
    let translucent = cursor.read_u32()? == 1;
    let vertex_needs = cursor.read_u32()?;
    let vertex_mask = cursor.read_u32()?;
    let param_count = cursor.read_u32()? as usize;

    if pddi_shader != "simple" {
        tracing::debug!(shader = %name, pddi = %pddi_shader, "non-simple pddi shader");
    }

    let mut shader = Shader {
        name,
        version,
        pddi_shader,
        translucent,
        vertex_needs,
        vertex_mask,
        params: Vec::with_capacity(param_count.min(chunk.child_count())),
        texture: None,
        filter: None,
        uv_mode: UvMode::Repeat,
        two_sided: false,
        alpha_test: false,
    };

    for child in chunk.children() {
        let mut cursor = child.cursor();
        let value = match child.chunk_type() {
            ChunkType::SHADER_TEXTURE_PARAM => {
                let key = cursor.read_fourcc()?;
                (key, ShaderParamValue::Texture(cursor.read_lp_string()?))
            }
            ChunkType::SHADER_INT_PARAM => {
                let key = cursor.read_fourcc()?;
                (key, ShaderParamValue::Int(cursor.read_u32()?))
            }
            ChunkType::SHADER_FLOAT_PARAM => {
                let key = cursor.read_fourcc()?;
                (key, ShaderParamValue::Float(cursor.read_f32()?))
            }
            ChunkType::SHADER_COLOUR_PARAM => {
                let key = cursor.read_fourcc()?;
                (key, ShaderParamValue::Colour(cursor.read_u32()?))
            }
            _ => continue,
        };
        let (key, value) = value;

        match (key.as_str(), &value) {
            ("TEX", ShaderParamValue::Texture(texture)) => shader.texture = Some(texture.clone()),
            ("FIMD", &ShaderParamValue::Int(mode)) => {
                shader.filter = Some(FilterMode::from_u32(mode).ok_or_else(|| {
                    DecodeError::InvalidValue {
                        field: format!("shader parameter {key}"),
                        value: mode,
                    }
                })?);
            }
            ("UVMD", &ShaderParamValue::Int(mode)) => {
                shader.uv_mode = if mode == 0 { UvMode::Repeat } else { UvMode::Clamp };
            }
            ("2SID", &ShaderParamValue::Int(flag)) => shader.two_sided = flag == 1,
            ("ATST", &ShaderParamValue::Int(flag)) => shader.alpha_test = flag == 1,
            _ => {}
        }

        shader.params.push(ShaderParam { key, value });
    }

    super::check_count("shader params", param_count, shader.params.len())?;
    Ok(shader)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{ChunkBuilder, ChunkTree, PayloadWriter};

    pub(crate) fn shader_chunk(name: &str, texture: &str, ints: &[(&str, u32)]) -> ChunkBuilder {
        let payload = PayloadWriter::new()
            .lp_string(name)
            .u32(0)
            .lp_string("simple")
            .u32(0)
            .u32(0)
            .u32(0)
            .u32(1 + ints.len() as u32);
        let mut chunk = ChunkBuilder::new(ChunkType::SHADER).payload(payload).child(
            ChunkBuilder::new(ChunkType::SHADER_TEXTURE_PARAM)
                .payload(PayloadWriter::new().fourcc("TEX").lp_string(texture)),
        );
        for &(key, value) in ints {
            chunk = chunk.child(
                ChunkBuilder::new(ChunkType::SHADER_INT_PARAM)
                    .payload(PayloadWriter::new().fourcc(key).u32(value)),
            );
        }
        chunk
    }

    fn decode(chunk: ChunkBuilder) -> DecodeResult<Shader> {
        let tree = ChunkTree::parse(ChunkBuilder::new(ChunkType::ROOT).child(chunk).to_bytes()).unwrap();
        let result = decode_shader(tree.root().children().next().unwrap());
        result
    }

    #[test]
    fn test_shader_params() {
        let shader = decode(shader_chunk(
            "car_m",
            "car.bmp",
            &[("FIMD", 4), ("UVMD", 1), ("2SID", 1), ("ATST", 0)],
        ))
        .unwrap();

        assert_eq!(shader.texture.as_deref(), Some("car.bmp"));
        assert_eq!(shader.filter, Some(FilterMode::LinearMipLinear));
        assert_eq!(shader.uv_mode, UvMode::Clamp);
        assert!(shader.two_sided);
        assert!(!shader.alpha_test);
        assert_eq!(shader.params.len(), 5);
        assert_eq!(shader.param("ATST"), Some(&ShaderParamValue::Int(0)));
    }

    #[test]
    fn test_bad_filter_mode() {
        let err = decode(shader_chunk("s", "t", &[("FIMD", 9)])).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { value: 9, .. }));
    }

    #[test]
    fn test_defaults_without_params() {
        let payload = PayloadWriter::new()
            .lp_string("plain")
            .u32(0)
            .lp_string("simple")
            .u32(1)
            .u32(0)
            .u32(0)
            .u32(0);
        let shader = decode(ChunkBuilder::new(ChunkType::SHADER).payload(payload)).unwrap();
        assert!(shader.translucent);
        assert_eq!(shader.texture, None);
        assert_eq!(shader.uv_mode, UvMode::Repeat);
    }
}
