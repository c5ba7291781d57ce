//! Animation and keyframe channel decoding.

use hitrun_common::math::{Quat, Vec2, Vec3};
use hitrun_common::ByteCursor;

use super::{check_count, expect_type};
use crate::{ChunkRef, ChunkType, DecodeError, DecodeResult};

/// Keyframe values of one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    Vector2 {
        mapping: u16,
        constants: Vec3,
        values: Vec<Vec2>,
    },
    Vector3(Vec<Vec3>),
    Quaternion(Vec<Quat>),
    /// Decoded from 16-bit fixed point.
    CompressedQuaternion(Vec<Quat>),
}

impl ChannelValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Vector2 { values, .. } => values.len(),
            Self::Vector3(values) => values.len(),
            Self::Quaternion(values) | Self::CompressedQuaternion(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A keyframed channel driving one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub version: u32,
    /// Parameter code, e.g. `TRAN` or `ROT`.
    pub parameter: String,
    /// Frame number of each key.
    pub frames: Vec<u16>,
    pub values: ChannelValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationGroup {
    pub name: String,
    pub group_id: u32,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub name: String,
    pub version: u32,
    pub anim_type: String,
    pub frame_count: f32,
    pub frame_rate: f32,
    pub cyclic: bool,
    pub groups: Vec<AnimationGroup>,
}

impl Animation {
    /// Length in seconds, or zero for a zero frame rate.
    pub fn duration(&self) -> f32 {
        if self.frame_rate > 0.0 {
            self.frame_count / self.frame_rate
        } else {
            0.0
        }
    }

    pub fn group(&self, name: &str) -> Option<&AnimationGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

pub fn decode_animation(chunk: ChunkRef<'_>) -> DecodeResult<Animation> {
    expect_type(chunk, ChunkType::ANIMATION)?;
    let mut cursor = chunk.cursor();

    let mut animation = Animation {
        name: cursor.read_lp_string()?,
        version: cursor.read_u32()?,
        anim_type: cursor.read_fourcc()?,
        frame_count: cursor.read_f32()?,
        frame_rate: cursor.read_f32()?,
        cyclic: cursor.read_bool32()?,
        groups: Vec::new(),
    };

    if let Some(list) = chunk.first_child_of_type(ChunkType::ANIMATION_GROUP_LIST) {
        let mut cursor = list.cursor();
        let _version = cursor.read_u32()?;
        let group_count = cursor.read_u32()? as usize;

        for group in list.children_of_type(ChunkType::ANIMATION_GROUP) {
            animation.groups.push(decode_group(group)?);
        }
        check_count("animation groups", group_count, animation.groups.len())?;
    }

    Ok(animation)
}

fn decode_group(chunk: ChunkRef<'_>) -> DecodeResult<AnimationGroup> {
    let mut cursor = chunk.cursor();
    let _version = cursor.read_u32()?;
    let name = cursor.read_lp_string()?;
    let group_id = cursor.read_u32()?;
    let channel_count = cursor.read_u32()? as usize;

    let channels = chunk
        .children()
        .filter(|c| is_channel(c.chunk_type()))
        .map(decode_channel)
        .collect::<DecodeResult<Vec<_>>>()?;
    check_count("group channels", channel_count, channels.len())?;

    Ok(AnimationGroup {
        name,
        group_id,
        channels,
    })
}

fn is_channel(chunk_type: ChunkType) -> bool {
    matches!(
        chunk_type,
        ChunkType::VECTOR2_CHANNEL
            | ChunkType::VECTOR3_CHANNEL
            | ChunkType::QUATERNION_CHANNEL
            | ChunkType::COMPRESSED_QUATERNION_CHANNEL
    )
}

/// Read the frame count and frame table, checking that the values that follow
/// fit in what is left of the payload.
fn read_frames(cursor: &mut ByteCursor<'_>, parameter: &str, value_size: usize) -> DecodeResult<Vec<u16>> {
    let frames = cursor.read_u32()? as usize;
    let needed = frames.saturating_mul(2 + value_size);
    if cursor.remaining() < needed {
        return Err(DecodeError::TruncatedChannel {
            parameter: parameter.to_string(),
            frames,
            needed,
            available: cursor.remaining(),
        });
    }
    Ok(cursor.read_counted(frames, 2, |c| c.read_u16())?)
}

/// Decode any of the four channel kinds.
pub fn decode_channel(chunk: ChunkRef<'_>) -> DecodeResult<Channel> {
    let mut cursor = chunk.cursor();
    let version = cursor.read_u32()?;
    let parameter = cursor.read_fourcc()?;

    let (frames, values) = match chunk.chunk_type() {
        ChunkType::VECTOR2_CHANNEL => {
            let mapping = cursor.read_u16()?;
            let constants = cursor.read_vec3()?;
            let frames = read_frames(&mut cursor, &parameter, 8)?;
            let values = cursor.read_counted(frames.len(), 8, |c| c.read_vec2())?;
            (
                frames,
                ChannelValues::Vector2 {
                    mapping,
                    constants,
                    values,
                },
            )
        }
        ChunkType::VECTOR3_CHANNEL => {
            let frames = read_frames(&mut cursor, &parameter, 12)?;
            let values = cursor.read_counted(frames.len(), 12, |c| c.read_vec3())?;
            (frames, ChannelValues::Vector3(values))
        }
        ChunkType::QUATERNION_CHANNEL => {
            let frames = read_frames(&mut cursor, &parameter, 16)?;
            let values = cursor.read_counted(frames.len(), 16, |c| c.read_quat())?;
            (frames, ChannelValues::Quaternion(values))
        }
        ChunkType::COMPRESSED_QUATERNION_CHANNEL => {
            let frames = read_frames(&mut cursor, &parameter, 8)?;
            let values = cursor.read_counted(frames.len(), 8, |c| {
                let mut component = || c.read_i16().map(|v| v as f32 / i16::MAX as f32);
                Ok(Quat::new(component()?, component()?, component()?, component()?))
            })?;
            (frames, ChannelValues::CompressedQuaternion(values))
        }
        found => {
            return Err(DecodeError::UnexpectedChunk {
                expected: ChunkType::VECTOR3_CHANNEL,
                found,
            })
        }
    };

    Ok(Channel {
        version,
        parameter,
        frames,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkBuilder, ChunkTree, PayloadWriter};

    fn channel_header(parameter: &str) -> PayloadWriter {
        PayloadWriter::new().u32(0).fourcc(parameter)
    }

    fn decode_single(chunk: ChunkBuilder) -> DecodeResult<Channel> {
        let tree = ChunkTree::parse(ChunkBuilder::new(ChunkType::ROOT).child(chunk).to_bytes()).unwrap();
        let result = decode_channel(tree.root().children().next().unwrap());
        result
    }

    #[test]
    fn test_compressed_quaternion_scaling() {
        let payload = channel_header("ROT")
            .u32(2)
            .u16(0)
            .u16(10)
            .i16(i16::MAX)
            .i16(0)
            .i16(0)
            .i16(0)
            .i16(0)
            .i16(-i16::MAX)
            .i16(0)
            .i16(0);
        let channel =
            decode_single(ChunkBuilder::new(ChunkType::COMPRESSED_QUATERNION_CHANNEL).payload(payload)).unwrap();

        assert_eq!(channel.parameter, "ROT");
        assert_eq!(channel.frames, vec![0, 10]);
        assert_eq!(
            channel.values,
            ChannelValues::CompressedQuaternion(vec![Quat::IDENTITY, Quat::new(0.0, -1.0, 0.0, 0.0)])
        );
    }

    #[test]
    fn test_truncated_vector3_channel() {
        // Declares 3 frames but only carries one frame's worth of data.
        let payload = channel_header("TRAN")
            .u32(3)
            .u16(0)
            .vec3(Vec3::X);
        let err = decode_single(ChunkBuilder::new(ChunkType::VECTOR3_CHANNEL).payload(payload)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedChannel {
                frames: 3,
                needed: 42,
                available: 14,
                ..
            }
        ));
    }

    #[test]
    fn test_vector2_channel() {
        let payload = channel_header("UV")
            .u16(1)
            .vec3(Vec3::Z)
            .u32(1)
            .u16(5)
            .vec2(Vec2::new(0.5, 0.25));
        let channel = decode_single(ChunkBuilder::new(ChunkType::VECTOR2_CHANNEL).payload(payload)).unwrap();
        assert_eq!(
            channel.values,
            ChannelValues::Vector2 {
                mapping: 1,
                constants: Vec3::Z,
                values: vec![Vec2::new(0.5, 0.25)],
            }
        );
    }

    #[test]
    fn test_animation_with_groups() {
        let channel = ChunkBuilder::new(ChunkType::VECTOR3_CHANNEL)
            .payload(channel_header("TRAN").u32(1).u16(0).vec3(Vec3::Y));
        let group = ChunkBuilder::new(ChunkType::ANIMATION_GROUP)
            .payload(PayloadWriter::new().u32(0).lp_string("pelvis").u32(3).u32(1))
            .child(channel);
        let list = ChunkBuilder::new(ChunkType::ANIMATION_GROUP_LIST)
            .payload(PayloadWriter::new().u32(0).u32(1))
            .child(group);
        let animation = ChunkBuilder::new(ChunkType::ANIMATION)
            .payload(
                PayloadWriter::new()
                    .lp_string("walk")
                    .u32(0)
                    .fourcc("PTRN")
                    .f32(30.0)
                    .f32(15.0)
                    .u32(1),
            )
            .child(list);

        let tree = ChunkTree::parse(ChunkBuilder::new(ChunkType::ROOT).child(animation).to_bytes()).unwrap();
        let animation = decode_animation(tree.root().children().next().unwrap()).unwrap();

        assert_eq!(animation.anim_type, "PTRN");
        assert!(animation.cyclic);
        assert_eq!(animation.duration(), 2.0);
        let group = animation.group("pelvis").unwrap();
        assert_eq!(group.group_id, 3);
        assert_eq!(group.channels[0].values, ChannelValues::Vector3(vec![Vec3::Y]));
    }
}
