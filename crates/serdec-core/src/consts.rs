/// Size of the fixed preamble (file id + header record) in bytes.
pub const SER_HEADER_SIZE: usize = 178;

/// Length of the opaque file identifier that opens every SER file.
pub const SER_FILE_ID_SIZE: usize = 14;

/// File identifier written by most capture software.
pub const SER_FILE_ID: &[u8; SER_FILE_ID_SIZE] = b"LUCAM-RECORDER";

/// Length of each NUL-padded text field (observer, instrument, telescope).
pub const SER_TEXT_FIELD_SIZE: usize = 40;

/// Size of one trailer timestamp in bytes.
pub const SER_TIMESTAMP_SIZE: usize = 8;

/// Largest declared pixel depth the format allows.
pub const MAX_PIXEL_DEPTH: u32 = 16;

/// Valid range for a caller-supplied bit depth hint.
pub const BIT_DEPTH_HINT_RANGE: std::ops::RangeInclusive<u32> = 8..=16;

/// Number of frames sampled when inferring the real pixel depth.
pub const DEPTH_SAMPLE_FRAMES: u32 = 10;

/// Channels per pixel for RGB/BGR data.
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Timestamp ticks per second (100 ns ticks).
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Ticks between 0001-01-01T00:00:00 and the Unix epoch.
pub const UNIX_EPOCH_TICKS: u64 = 621_355_968_000_000_000;

/// Fixed-point scale for derived frame rates (three decimal digits).
pub const FRAME_RATE_SCALE: i32 = 1000;
