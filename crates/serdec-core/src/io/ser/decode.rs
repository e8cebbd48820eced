//! Raw frame bytes to canonical pixels.
//!
//! Canonical form: rows top-to-bottom, colour pixels interleaved B, G, R,
//! 16-bit samples as native-endian `u16` and stretched to the full range.

use byteorder::{BigEndian, ByteOrder, LittleEndian, NativeEndian};

use crate::consts::MAX_PIXEL_DEPTH;
use crate::error::{Result, SerError};
use crate::frame::ColorMode;

use super::header::{FrameLayout, SampleOrder};

/// Cyclic-shift expansion of an n-bit sample onto 16 bits.
///
/// The low bits of the value are replicated into the newly opened high bits
/// instead of zero-filling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitStretch {
    shift1: u32,
    shift2: u32,
}

impl BitStretch {
    /// `None` when samples are already full 16-bit.
    pub fn for_depth(pixel_depth: u32) -> Option<Self> {
        if pixel_depth >= MAX_PIXEL_DEPTH {
            return None;
        }
        let shift1 = MAX_PIXEL_DEPTH - pixel_depth;
        let shift2 = pixel_depth.saturating_sub(shift1);
        Some(Self { shift1, shift2 })
    }

    #[inline]
    pub fn apply(self, value: u16) -> u16 {
        (value << self.shift1).wrapping_add(value >> self.shift2)
    }
}

/// Decode one stored frame into `out`.
///
/// `raw` and `out` must both hold at least `layout.frame_bytes()` bytes; this
/// is checked once here, not per pixel.
pub fn decode_frame(
    raw: &[u8],
    out: &mut [u8],
    layout: &FrameLayout,
    color_mode: ColorMode,
    order: SampleOrder,
    pixel_depth: u32,
) -> Result<()> {
    let frame_bytes = layout.frame_bytes();
    let row_bytes = layout.row_bytes();
    if out.len() < frame_bytes {
        return Err(SerError::BufferTooSmall {
            required: frame_bytes,
            actual: out.len(),
        });
    }
    if raw.len() < frame_bytes {
        return Err(SerError::BufferTooSmall {
            required: frame_bytes,
            actual: raw.len(),
        });
    }
    if row_bytes == 0 {
        return Ok(());
    }

    let swap_rb = color_mode == ColorMode::RGB;
    let stretch = BitStretch::for_depth(pixel_depth);

    // Rows are stored bottom-to-top.
    let src_rows = raw[..frame_bytes].chunks_exact(row_bytes).rev();
    let dst_rows = out[..frame_bytes].chunks_exact_mut(row_bytes);

    for (src, dst) in src_rows.zip(dst_rows) {
        if layout.bytes_per_sample == 1 {
            decode_row_u8(src, dst, swap_rb);
        } else {
            match order {
                SampleOrder::LowByteFirst => {
                    decode_row_u16::<LittleEndian>(src, dst, layout.channels, swap_rb, stretch)
                }
                SampleOrder::HighByteFirst => {
                    decode_row_u16::<BigEndian>(src, dst, layout.channels, swap_rb, stretch)
                }
            }
        }
    }
    Ok(())
}

fn decode_row_u8(src: &[u8], dst: &mut [u8], swap_rb: bool) {
    if !swap_rb {
        dst.copy_from_slice(src);
        return;
    }
    for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
        d[0] = s[2];
        d[1] = s[1];
        d[2] = s[0];
    }
}

fn decode_row_u16<B: ByteOrder>(
    src: &[u8],
    dst: &mut [u8],
    channels: usize,
    swap_rb: bool,
    stretch: Option<BitStretch>,
) {
    let put = |s: &[u8], d: &mut [u8]| {
        let mut value = B::read_u16(s);
        if let Some(stretch) = stretch {
            value = stretch.apply(value);
        }
        NativeEndian::write_u16(d, value);
    };

    if !swap_rb {
        for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(2)) {
            put(s, d);
        }
        return;
    }

    // Reversing the samples of each pixel turns R, G, B into B, G, R.
    let pixel_bytes = channels * 2;
    for (sp, dp) in src
        .chunks_exact(pixel_bytes)
        .zip(dst.chunks_exact_mut(pixel_bytes))
    {
        for (s, d) in sp.chunks_exact(2).rev().zip(dp.chunks_exact_mut(2)) {
            put(s, d);
        }
    }
}
