use byteorder::{ByteOrder, NativeEndian};
use tracing::debug;

use crate::buffer::GrowableBuffer;
use crate::consts::{COLOR_CHANNEL_COUNT, DEPTH_SAMPLE_FRAMES, MAX_PIXEL_DEPTH};
use crate::error::Result;
use crate::io::store::ByteStore;

use super::SerReader;

/// Frame numbers (1-based) sampled for depth inference: first, last, and
/// eight evenly spaced in between. Duplicates collapse.
pub(crate) fn sample_frame_numbers(frame_count: u32) -> Vec<u32> {
    let steps = u64::from(DEPTH_SAMPLE_FRAMES - 1);
    let mut frames: Vec<u32> = std::iter::once(1)
        .chain((1..steps).map(|x| {
            let n = u64::from(frame_count) * x / steps;
            u32::try_from(n).unwrap_or(frame_count).max(1)
        }))
        .chain(std::iter::once(frame_count))
        .collect();
    frames.sort_unstable();
    frames.dedup();
    frames
}

/// Smallest depth in 9..=16 bits that can represent `max_value`.
pub(crate) fn depth_for_max(max_value: u16) -> u32 {
    (9..MAX_PIXEL_DEPTH)
        .find(|&d| u32::from(max_value) < 1 << d)
        .unwrap_or(MAX_PIXEL_DEPTH)
}

impl<S: ByteStore> SerReader<S> {
    /// Replace the declared pixel depth with the one the data actually uses.
    ///
    /// Only meaningful for 2-byte samples. Leaves the reader at frame 1.
    pub(crate) fn infer_pixel_depth(&mut self) -> Result<u32> {
        let layout = self.layout;
        let mut scratch = GrowableBuffer::new();
        scratch.ensure_capacity(layout.width * layout.height * 2 * COLOR_CHANNEL_COUNT);
        let frame_bytes = layout.frame_bytes();

        let mut max_value = 0u16;
        for frame_number in sample_frame_numbers(self.frame_count()) {
            self.seek_to_frame(frame_number)?;
            let out = scratch.ensure_capacity(frame_bytes);
            // Full 16-bit decode so stored magnitudes are not stretched.
            self.decode_next(Some(out), MAX_PIXEL_DEPTH)?;

            let frame_max = scratch
                .as_slice(frame_bytes)
                .chunks_exact(2)
                .map(NativeEndian::read_u16)
                .max()
                .unwrap_or(0);
            max_value = max_value.max(frame_max);
            if max_value >= 0x8000 {
                break;
            }
        }

        let inferred = depth_for_max(max_value);
        debug!(
            declared = self.declared_pixel_depth,
            inferred, max_value, "Pixel depth inferred from sampled frames"
        );
        self.header.pixel_depth = inferred as i32;
        self.rewind()?;
        Ok(inferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_single_frame_once() {
        assert_eq!(sample_frame_numbers(1), vec![1]);
    }

    #[test]
    fn samples_collapse_for_short_files() {
        assert_eq!(sample_frame_numbers(3), vec![1, 2, 3]);
    }

    #[test]
    fn samples_spread_across_long_files() {
        assert_eq!(
            sample_frame_numbers(900),
            vec![1, 100, 200, 300, 400, 500, 600, 700, 800, 900]
        );
    }

    #[test]
    fn depth_thresholds() {
        assert_eq!(depth_for_max(0), 9);
        assert_eq!(depth_for_max(511), 9);
        assert_eq!(depth_for_max(512), 10);
        assert_eq!(depth_for_max(4095), 12);
        assert_eq!(depth_for_max(4096), 13);
        assert_eq!(depth_for_max(0x7FFF), 15);
        assert_eq!(depth_for_max(0x8000), 16);
        assert_eq!(depth_for_max(u16::MAX), 16);
    }
}
