use std::path::PathBuf;

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::timestamp::FrameRate;

/// Decoded pixel samples, shape = (height, width, channels).
///
/// Colour frames are always in B, G, R channel order.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameData {
    U8(Array3<u8>),
    U16(Array3<u16>),
}

/// A single decoded frame in canonical top-to-bottom order.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: FrameData,
    /// Effective bit depth of the source samples (after any correction).
    pub pixel_depth: u32,
    pub metadata: FrameMetadata,
}

impl Frame {
    /// Wrap a canonical output buffer as produced by `SerReader::get_frame`.
    ///
    /// 16-bit samples are expected as native-endian byte pairs.
    pub fn from_canonical(
        bytes: &[u8],
        width: usize,
        height: usize,
        channels: usize,
        bytes_per_sample: usize,
        pixel_depth: u32,
    ) -> Result<Self> {
        let shape = (height, width, channels);
        let data = if bytes_per_sample == 1 {
            FrameData::U8(Array3::from_shape_vec(shape, bytes.to_vec())?)
        } else {
            let samples: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                .collect();
            FrameData::U16(Array3::from_shape_vec(shape, samples)?)
        };
        Ok(Self {
            data,
            pixel_depth,
            metadata: FrameMetadata::default(),
        })
    }

    fn dim(&self) -> (usize, usize, usize) {
        match &self.data {
            FrameData::U8(a) => a.dim(),
            FrameData::U16(a) => a.dim(),
        }
    }

    pub fn width(&self) -> usize {
        self.dim().1
    }

    pub fn height(&self) -> usize {
        self.dim().0
    }

    pub fn channels(&self) -> usize {
        self.dim().2
    }

    /// Sample at (row, col, channel), widened to u16.
    pub fn sample(&self, row: usize, col: usize, channel: usize) -> u16 {
        match &self.data {
            FrameData::U8(a) => u16::from(a[[row, col, channel]]),
            FrameData::U16(a) => a[[row, col, channel]],
        }
    }

    /// Largest sample value in the frame.
    pub fn max_sample(&self) -> u16 {
        match &self.data {
            FrameData::U8(a) => a.iter().copied().max().map_or(0, u16::from),
            FrameData::U16(a) => a.iter().copied().max().unwrap_or(0),
        }
    }

    /// Smallest sample value in the frame.
    pub fn min_sample(&self) -> u16 {
        match &self.data {
            FrameData::U8(a) => a.iter().copied().min().map_or(0, u16::from),
            FrameData::U16(a) => a.iter().copied().min().unwrap_or(0),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameMetadata {
    /// 1-based frame number within the file.
    pub frame_number: u32,
    /// Raw capture tick, if the file carries a timestamp trailer.
    pub timestamp: Option<u64>,
}

/// Colour/Bayer mode as declared by the header's colour id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    Mono,
    BayerRGGB,
    BayerGRBG,
    BayerGBRG,
    BayerBGGR,
    BayerCYYM,
    BayerYCMY,
    BayerYMCY,
    BayerMYYC,
    RGB,
    BGR,
    /// Unrecognised colour id; decoded as single-channel.
    Unknown(i32),
}

impl ColorMode {
    pub fn from_id(id: i32) -> Self {
        match id {
            0 => Self::Mono,
            8 => Self::BayerRGGB,
            9 => Self::BayerGRBG,
            10 => Self::BayerGBRG,
            11 => Self::BayerBGGR,
            16 => Self::BayerCYYM,
            17 => Self::BayerYCMY,
            18 => Self::BayerYMCY,
            19 => Self::BayerMYYC,
            100 => Self::RGB,
            101 => Self::BGR,
            other => Self::Unknown(other),
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Self::Mono => 0,
            Self::BayerRGGB => 8,
            Self::BayerGRBG => 9,
            Self::BayerGBRG => 10,
            Self::BayerBGGR => 11,
            Self::BayerCYYM => 16,
            Self::BayerYCMY => 17,
            Self::BayerYMCY => 18,
            Self::BayerMYYC => 19,
            Self::RGB => 100,
            Self::BGR => 101,
            Self::Unknown(id) => id,
        }
    }

    /// Raw Bayer data counts as mono here; only RGB/BGR carry three planes.
    pub fn is_colour(self) -> bool {
        matches!(self, Self::RGB | Self::BGR)
    }
}

/// Metadata about an opened SER file.
#[derive(Clone, Debug, Serialize)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub total_frames: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub declared_pixel_depth: u32,
    pub color_mode: ColorMode,
    /// Each 16-bit sample is stored high byte first.
    pub high_byte_first: bool,
    pub frame_bytes: u64,
    pub observer: Option<String>,
    pub instrument: Option<String>,
    pub telescope: Option<String>,
    pub frame_rate: FrameRate,
    pub has_timestamps: bool,
    pub first_timestamp: Option<u64>,
    pub last_timestamp: Option<u64>,
}
