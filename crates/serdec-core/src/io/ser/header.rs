use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::consts::{
    COLOR_CHANNEL_COUNT, MAX_PIXEL_DEPTH, SER_FILE_ID, SER_FILE_ID_SIZE, SER_HEADER_SIZE,
    SER_TEXT_FIELD_SIZE,
};
use crate::error::{HeaderField, Result, SerError};
use crate::frame::ColorMode;

/// SER file header (178 bytes), fields as stored on disk.
///
/// Integers are kept signed so that range validation can see the values a
/// broken writer actually produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerHeader {
    pub file_id: [u8; SER_FILE_ID_SIZE],
    pub lu_id: i32,
    pub color_id: i32,
    /// 0 or 1. See [`SampleOrder`] for what each value means for pixel data.
    pub little_endian: i32,
    pub width: i32,
    pub height: i32,
    pub pixel_depth: i32,
    pub frame_count: i32,
    pub observer: [u8; SER_TEXT_FIELD_SIZE],
    pub instrument: [u8; SER_TEXT_FIELD_SIZE],
    pub telescope: [u8; SER_TEXT_FIELD_SIZE],
    /// Capture start in ticks.
    pub date_time: u64,
    /// Capture start in ticks, UTC.
    pub date_time_utc: u64,
}

impl SerHeader {
    /// Header for a new file with empty text fields and no capture time.
    pub fn new(
        width: u32,
        height: u32,
        pixel_depth: u32,
        frame_count: u32,
        color_mode: ColorMode,
    ) -> Self {
        Self {
            file_id: *SER_FILE_ID,
            lu_id: 0,
            color_id: color_mode.id(),
            little_endian: 0,
            width: saturating_i32(width),
            height: saturating_i32(height),
            pixel_depth: saturating_i32(pixel_depth),
            frame_count: saturating_i32(frame_count),
            observer: [0; SER_TEXT_FIELD_SIZE],
            instrument: [0; SER_TEXT_FIELD_SIZE],
            telescope: [0; SER_TEXT_FIELD_SIZE],
            date_time: 0,
            date_time_utc: 0,
        }
    }

    /// Parse the fixed preamble. `buf` must hold at least 178 bytes.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(buf);

        let mut file_id = [0u8; SER_FILE_ID_SIZE];
        std::io::Read::read_exact(&mut cursor, &mut file_id)?;

        let lu_id = cursor.read_i32::<LittleEndian>()?;
        let color_id = cursor.read_i32::<LittleEndian>()?;
        let little_endian = cursor.read_i32::<LittleEndian>()?;
        let width = cursor.read_i32::<LittleEndian>()?;
        let height = cursor.read_i32::<LittleEndian>()?;
        let pixel_depth = cursor.read_i32::<LittleEndian>()?;
        let frame_count = cursor.read_i32::<LittleEndian>()?;

        let observer = read_text_field(&mut cursor)?;
        let instrument = read_text_field(&mut cursor)?;
        let telescope = read_text_field(&mut cursor)?;

        let date_time = read_ticks(&mut cursor)?;
        let date_time_utc = read_ticks(&mut cursor)?;

        debug_assert_eq!(cursor.position(), SER_HEADER_SIZE as u64);

        Ok(Self {
            file_id,
            lu_id,
            color_id,
            little_endian,
            width,
            height,
            pixel_depth,
            frame_count,
            observer,
            instrument,
            telescope,
            date_time,
            date_time_utc,
        })
    }

    /// Range-check the fields the decoder relies on, first failure wins.
    pub fn validate(&self, path: &Path) -> Result<()> {
        let checks = [
            (HeaderField::FrameCount, self.frame_count, self.frame_count > 0),
            (
                HeaderField::LittleEndian,
                self.little_endian,
                matches!(self.little_endian, 0 | 1),
            ),
            (HeaderField::ImageWidth, self.width, self.width > 0),
            (HeaderField::ImageHeight, self.height, self.height > 0),
            (
                HeaderField::PixelDepth,
                self.pixel_depth,
                (1..=MAX_PIXEL_DEPTH as i32).contains(&self.pixel_depth),
            ),
        ];

        match checks.into_iter().find(|(_, _, ok)| !ok) {
            Some((field, value, _)) => Err(SerError::MalformedHeader {
                path: path.to_path_buf(),
                field,
                value: i64::from(value),
            }),
            None => Ok(()),
        }
    }

    pub fn color_mode(&self) -> ColorMode {
        ColorMode::from_id(self.color_id)
    }

    pub fn sample_order(&self) -> SampleOrder {
        if self.little_endian == 1 {
            SampleOrder::HighByteFirst
        } else {
            SampleOrder::LowByteFirst
        }
    }

    /// A trailer is declared whenever the capture start time is set.
    pub fn declares_timestamps(&self) -> bool {
        self.date_time != 0
    }

    pub fn observer(&self) -> String {
        text_field(&self.observer)
    }

    pub fn instrument(&self) -> String {
        text_field(&self.instrument)
    }

    pub fn telescope(&self) -> String {
        text_field(&self.telescope)
    }

    pub fn set_observer(&mut self, text: &str) {
        fill_text_field(&mut self.observer, text);
    }

    pub fn set_instrument(&mut self, text: &str) {
        fill_text_field(&mut self.instrument, text);
    }

    pub fn set_telescope(&mut self, text: &str) {
        fill_text_field(&mut self.telescope, text);
    }
}

/// Byte order of 16-bit samples in the frame data.
///
/// The header flag is widely written inverted relative to its name: a value
/// of 1 means each sample's first byte in the stream is its high byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleOrder {
    /// Flag 0: pairs are stored low byte first.
    LowByteFirst,
    /// Flag 1: pairs are stored high byte first.
    HighByteFirst,
}

/// Geometry of one frame as stored and as decoded (the two are the same size).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub bytes_per_sample: usize,
}

impl FrameLayout {
    /// Layout for a validated header at the given effective pixel depth.
    pub fn new(header: &SerHeader, pixel_depth: u32) -> Self {
        Self {
            width: usize::try_from(header.width).unwrap_or(0),
            height: usize::try_from(header.height).unwrap_or(0),
            channels: if header.color_mode().is_colour() {
                COLOR_CHANNEL_COUNT
            } else {
                1
            },
            bytes_per_sample: if pixel_depth > 8 { 2 } else { 1 },
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.channels * self.bytes_per_sample
    }

    pub fn row_bytes(&self) -> usize {
        self.width * self.bytes_per_pixel()
    }

    pub fn frame_bytes(&self) -> usize {
        self.row_bytes() * self.height
    }

    /// Frame size computed without overflow, for checking against file size.
    pub fn checked_frame_bytes(&self) -> Option<u64> {
        (self.width as u64)
            .checked_mul(self.height as u64)?
            .checked_mul(self.bytes_per_pixel() as u64)
    }
}

fn saturating_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

fn read_text_field(cursor: &mut Cursor<&[u8]>) -> Result<[u8; SER_TEXT_FIELD_SIZE]> {
    let mut field = [0u8; SER_TEXT_FIELD_SIZE];
    std::io::Read::read_exact(cursor, &mut field)?;
    Ok(field)
}

/// Ticks are stored as two 32-bit words, low word first.
fn read_ticks(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    let low = cursor.read_u32::<LittleEndian>()?;
    let high = cursor.read_u32::<LittleEndian>()?;
    Ok(u64::from(high) << 32 | u64::from(low))
}

/// Text up to the first NUL; the field need not contain one.
fn text_field(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn fill_text_field(field: &mut [u8; SER_TEXT_FIELD_SIZE], text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(SER_TEXT_FIELD_SIZE);
    field.fill(0);
    field[..len].copy_from_slice(&bytes[..len]);
}
