#![allow(dead_code)]

use std::io::{Cursor, Read, Seek, SeekFrom};

use serdec_core::config::DecoderConfig;
use serdec_core::frame::ColorMode;
use serdec_core::io::ser::{SerHeader, SerReader};
use serdec_core::io::ser_writer::SerWriter;

/// Description of a synthetic SER file.
pub struct SerFixture {
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub color_mode: ColorMode,
    /// Header flag: 1 = high byte first, 0 = low byte first.
    pub little_endian: i32,
    pub date_time: u64,
    pub date_time_utc: u64,
    pub frames: Vec<Vec<u8>>,
    pub timestamps: Option<Vec<u64>>,
}

impl SerFixture {
    pub fn new(width: u32, height: u32, pixel_depth: u32, color_mode: ColorMode) -> Self {
        Self {
            width,
            height,
            pixel_depth,
            color_mode,
            little_endian: 0,
            date_time: 0,
            date_time_utc: 0,
            frames: Vec::new(),
            timestamps: None,
        }
    }

    pub fn header(&self) -> SerHeader {
        let mut header = SerHeader::new(
            self.width,
            self.height,
            self.pixel_depth,
            self.frames.len() as u32,
            self.color_mode,
        );
        header.little_endian = self.little_endian;
        header.date_time = self.date_time;
        header.date_time_utc = self.date_time_utc;
        header.set_observer("Test");
        header.set_telescope("MyScope");
        header
    }

    /// Serialise through `SerWriter`.
    pub fn build(&self) -> Vec<u8> {
        let mut writer = SerWriter::new(Vec::new(), &self.header()).unwrap();
        for frame in &self.frames {
            writer.write_raw_frame(frame).unwrap();
        }
        if let Some(ts) = &self.timestamps {
            writer.write_timestamps(ts).unwrap();
        }
        writer.finalize().unwrap()
    }
}

/// 8-bit mono frames, each pixel set to `frame_index * 16 + pixel_index`.
pub fn mono8_fixture(width: u32, height: u32, frame_count: usize) -> SerFixture {
    let mut fixture = SerFixture::new(width, height, 8, ColorMode::Mono);
    let pixels = (width * height) as usize;
    fixture.frames = (0..frame_count)
        .map(|f| (0..pixels).map(|p| (f * 16 + p) as u8).collect())
        .collect();
    fixture
}

/// Encode 16-bit samples the way a file with the given flag stores them.
pub fn encode_u16(values: &[u16], little_endian_flag: i32) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| {
            if little_endian_flag == 1 {
                v.to_be_bytes()
            } else {
                v.to_le_bytes()
            }
        })
        .collect()
}

/// Decode a canonical 16-bit output buffer.
pub fn native_u16s(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|p| u16::from_ne_bytes([p[0], p[1]]))
        .collect()
}

pub fn open_bytes(data: Vec<u8>) -> SerReader<Cursor<Vec<u8>>> {
    open_bytes_with(data, &DecoderConfig::default())
}

pub fn open_bytes_with(data: Vec<u8>, config: &DecoderConfig) -> SerReader<Cursor<Vec<u8>>> {
    SerReader::from_store(Cursor::new(data), "memory.ser", config).unwrap()
}

/// Write a SER buffer to a temporary file and return the temp file handle.
///
/// The file stays alive as long as the returned `NamedTempFile` is not dropped.
pub fn write_test_ser(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    f.write_all(data).expect("write SER data");
    f.flush().expect("flush");
    f
}

/// Decode the next frame into a fresh buffer.
pub fn next_frame<S: serdec_core::io::store::ByteStore>(reader: &mut SerReader<S>) -> Vec<u8> {
    let mut buf = vec![0u8; reader.buffer_size()];
    reader.get_frame(Some(&mut buf)).unwrap();
    buf
}

/// Decode a specific frame into a fresh buffer.
pub fn frame_at<S: serdec_core::io::store::ByteStore>(
    reader: &mut SerReader<S>,
    frame_number: u32,
) -> Vec<u8> {
    let mut buf = vec![0u8; reader.buffer_size()];
    reader.get_frame_at(frame_number, Some(&mut buf)).unwrap();
    buf
}

/// Store that reports a larger size than the data it can deliver.
pub struct ShortStore {
    inner: Cursor<Vec<u8>>,
    claimed: u64,
}

impl ShortStore {
    pub fn new(data: Vec<u8>, claimed: u64) -> Self {
        Self {
            inner: Cursor::new(data),
            claimed,
        }
    }
}

impl Read for ShortStore {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for ShortStore {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match pos {
            SeekFrom::End(0) => Ok(self.claimed),
            other => self.inner.seek(other),
        }
    }
}
