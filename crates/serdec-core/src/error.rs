use std::path::PathBuf;

use thiserror::Error;

/// Header field that failed range validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderField {
    FrameCount,
    LittleEndian,
    ImageWidth,
    ImageHeight,
    PixelDepth,
}

impl std::fmt::Display for HeaderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FrameCount => write!(f, "frame count"),
            Self::LittleEndian => write!(f, "little endian value"),
            Self::ImageWidth => write!(f, "image width"),
            Self::ImageHeight => write!(f, "image height"),
            Self::PixelDepth => write!(f, "pixel depth"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SerError {
    #[error("Could not open '{}': {source}", path.display())]
    IoUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' has an invalid {field} of {value}", path.display())]
    MalformedHeader {
        path: PathBuf,
        field: HeaderField,
        value: i64,
    },

    /// `required` is `None` when the declared geometry overflows a 64-bit size.
    #[error("'{}' is too short: {}", path.display(), size_shortfall(*required, *actual))]
    TruncatedFile {
        path: PathBuf,
        required: Option<u64>,
        actual: u64,
    },

    #[error("Timestamp read failed for '{}': expected {expected} bytes, got {actual}", path.display())]
    TimestampReadFailure {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("No frames left (total: {frame_count})")]
    ExhaustedSequence { frame_count: u32 },

    #[error("Frame {frame_number} truncated: expected {expected} bytes, got {actual}")]
    TruncatedFrame {
        frame_number: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Timestamp trailer needs one tick per frame: {frames} frames, {timestamps} ticks")]
    TimestampCountMismatch { frames: u32, timestamps: usize },

    #[error("Output buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Invalid decoder config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SerError>;

fn size_shortfall(required: Option<u64>, actual: u64) -> String {
    match required {
        Some(required) => format!("expected at least {required} bytes, got {actual}"),
        None => format!("declared geometry exceeds any addressable size, got {actual} bytes"),
    }
}
