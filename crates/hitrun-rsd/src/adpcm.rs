//! RADP: 4-bit adaptive delta PCM.
//!
//! Each block holds 32 samples per channel. A block starts with one 4-byte
//! header per channel (`i16` step index, `i16` predicted sample), followed by
//! 16 bytes of nibbles per channel, interleaved byte by byte across channels.
//! Decoder state is reset from the header at every block.

/// Step index adjustment per nibble.
pub const INDEX_TABLE: [i32; 16] = [-1, -1, -1, -1, 2, 4, 6, 8, -1, -1, -1, -1, 2, 4, 6, 8];

/// Quantizer step sizes.
pub const STEP_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66,
    73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408,
    449, 494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630,
    9493, 10442, 11487, 12635, 13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794,
    32767,
];

const MAX_STEP_INDEX: i32 = STEP_TABLE.len() as i32 - 1;

/// Bytes per channel per block: 4 header bytes and 16 nibble bytes.
pub const BLOCK_BYTES_PER_CHANNEL: usize = 20;

/// Samples per channel per block.
pub const SAMPLES_PER_BLOCK: usize = 32;

/// Running state of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdpcmState {
    pub predicted: i32,
    pub step_index: i32,
}

impl AdpcmState {
    pub fn new(predicted: i16, step_index: i16) -> Self {
        Self {
            predicted: predicted as i32,
            step_index: (step_index as i32).clamp(0, MAX_STEP_INDEX),
        }
    }

    /// Decode one nibble and advance.
    pub fn decode_nibble(&mut self, nibble: u8) -> i16 {
        let nibble = nibble & 0x0F;
        let step = STEP_TABLE[self.step_index as usize];

        let mut delta = step >> 3;
        if nibble & 1 != 0 {
            delta += step >> 2;
        }
        if nibble & 2 != 0 {
            delta += step >> 1;
        }
        if nibble & 4 != 0 {
            delta += step;
        }
        if nibble & 8 != 0 {
            delta = -delta;
        }

        self.predicted = (self.predicted + delta).clamp(i16::MIN as i32, i16::MAX as i32);
        self.step_index = (self.step_index + INDEX_TABLE[nibble as usize]).clamp(0, MAX_STEP_INDEX);
        self.predicted as i16
    }
}

/// Size of one block for `channels` channels.
pub const fn block_size(channels: usize) -> usize {
    channels * BLOCK_BYTES_PER_CHANNEL
}

/// Decode one block, appending interleaved samples to `out`.
///
/// `block` must be exactly [`block_size`]`(channels)` bytes.
pub fn decode_block(block: &[u8], channels: usize, out: &mut Vec<i16>) {
    debug_assert_eq!(block.len(), block_size(channels));

    let mut states: Vec<AdpcmState> = (0..channels)
        .map(|c| {
            let header = &block[4 * c..4 * c + 4];
            let step_index = i16::from_le_bytes([header[0], header[1]]);
            let predicted = i16::from_le_bytes([header[2], header[3]]);
            AdpcmState::new(predicted, step_index)
        })
        .collect();

    let nibbles = &block[4 * channels..];
    out.reserve(SAMPLES_PER_BLOCK * channels);
    for i in 0..SAMPLES_PER_BLOCK {
        for (c, state) in states.iter_mut().enumerate() {
            let byte = nibbles[c + (i / 2) * channels];
            let nibble = if i % 2 == 0 { byte & 0x0F } else { byte >> 4 };
            out.push(state.decode_nibble(nibble));
        }
    }
}

/// Decode a whole RADP payload. A trailing partial block is dropped.
pub fn decode(payload: &[u8], channels: usize) -> Vec<i16> {
    if channels == 0 {
        return Vec::new();
    }
    let size = block_size(channels);
    let blocks = payload.chunks_exact(size);
    let leftover = blocks.remainder().len();
    if leftover != 0 {
        tracing::debug!(leftover, block_size = size, "ignoring partial trailing block");
    }

    let mut out = Vec::with_capacity(payload.len() / size * SAMPLES_PER_BLOCK * channels);
    for block in blocks {
        decode_block(block, channels, &mut out);
    }
    out
}
