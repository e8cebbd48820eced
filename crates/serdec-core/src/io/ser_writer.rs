use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

use crate::consts::SER_HEADER_SIZE;
use crate::error::{Result, SerError};
use crate::io::ser::{FrameLayout, SerHeader};

/// Writes a SER file at the raw byte level.
///
/// Frames are written exactly as given (bottom row first, stored channel and
/// byte order); no pixel conversion happens here.
pub struct SerWriter<W: Write = BufWriter<File>> {
    writer: W,
    header: SerHeader,
    frame_bytes: usize,
    frames_written: u32,
}

impl SerWriter {
    /// Create a new SER file and write the header.
    pub fn create(path: &Path, header: &SerHeader) -> Result<Self> {
        let file = File::create(path)?;
        debug!(path = %path.display(), "Creating SER file");
        Self::new(BufWriter::new(file), header)
    }
}

impl<W: Write> SerWriter<W> {
    /// Write the header to any sink.
    pub fn new(mut writer: W, header: &SerHeader) -> Result<Self> {
        write_header(&mut writer, header)?;
        let layout = FrameLayout::new(header, u32::try_from(header.pixel_depth).unwrap_or(0));
        Ok(Self {
            writer,
            header: header.clone(),
            frame_bytes: layout.frame_bytes(),
            frames_written: 0,
        })
    }

    /// Write a single raw frame (bytes must match the header's frame size).
    pub fn write_raw_frame(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != self.frame_bytes {
            return Err(SerError::BufferTooSmall {
                required: self.frame_bytes,
                actual: data.len(),
            });
        }
        self.writer.write_all(data)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Write the timestamp trailer (one little-endian u64 per frame).
    ///
    /// Must follow the last frame and carry exactly one tick per written frame.
    pub fn write_timestamps(&mut self, timestamps: &[u64]) -> Result<()> {
        if timestamps.len() != self.frames_written as usize {
            return Err(SerError::TimestampCountMismatch {
                frames: self.frames_written,
                timestamps: timestamps.len(),
            });
        }
        for &ts in timestamps {
            self.writer.write_u64::<LittleEndian>(ts)?;
        }
        Ok(())
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    pub fn header(&self) -> &SerHeader {
        &self.header
    }

    /// Flush and hand back the sink.
    pub fn finalize(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Serialise a header into its 178-byte on-disk form.
pub fn header_bytes(header: &SerHeader) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);
    write_header(&mut buf, header)?;
    Ok(buf)
}

fn write_header(w: &mut impl Write, header: &SerHeader) -> Result<()> {
    w.write_all(&header.file_id)?;
    w.write_i32::<LittleEndian>(header.lu_id)?;
    w.write_i32::<LittleEndian>(header.color_id)?;
    w.write_i32::<LittleEndian>(header.little_endian)?;
    w.write_i32::<LittleEndian>(header.width)?;
    w.write_i32::<LittleEndian>(header.height)?;
    w.write_i32::<LittleEndian>(header.pixel_depth)?;
    w.write_i32::<LittleEndian>(header.frame_count)?;
    w.write_all(&header.observer)?;
    w.write_all(&header.instrument)?;
    w.write_all(&header.telescope)?;
    // Ticks go out as low word, then high word.
    for ticks in [header.date_time, header.date_time_utc] {
        w.write_u32::<LittleEndian>(ticks as u32)?;
        w.write_u32::<LittleEndian>((ticks >> 32) as u32)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ColorMode;

    #[test]
    fn header_round_trips_through_parser() {
        let mut header = SerHeader::new(320, 240, 12, 42, ColorMode::BGR);
        header.little_endian = 1;
        header.lu_id = 3;
        header.date_time = 0x0102_0304_0506_0708;
        header.date_time_utc = 0x0A0B_0C0D_0E0F_1011;
        header.set_observer("Observer");
        header.set_instrument("ASI462MC");
        header.set_telescope("C9.25");

        let bytes = header_bytes(&header).unwrap();
        assert_eq!(bytes.len(), SER_HEADER_SIZE);
        assert_eq!(SerHeader::parse(&bytes).unwrap(), header);
    }

    #[test]
    fn rejects_wrong_frame_size() {
        let header = SerHeader::new(2, 2, 8, 1, ColorMode::Mono);
        let mut writer = SerWriter::new(Vec::new(), &header).unwrap();
        assert!(writer.write_raw_frame(&[0; 3]).is_err());
        writer.write_raw_frame(&[0; 4]).unwrap();
        assert_eq!(writer.frames_written(), 1);
        let bytes = writer.finalize().unwrap();
        assert_eq!(bytes.len(), SER_HEADER_SIZE + 4);
    }

    #[test]
    fn rejects_trailer_not_matching_frames() {
        let header = SerHeader::new(1, 1, 8, 2, ColorMode::Mono);
        let mut writer = SerWriter::new(Vec::new(), &header).unwrap();
        writer.write_raw_frame(&[1]).unwrap();
        writer.write_raw_frame(&[2]).unwrap();

        let err = writer.write_timestamps(&[10, 20, 30]).unwrap_err();
        assert!(matches!(
            err,
            SerError::TimestampCountMismatch {
                frames: 2,
                timestamps: 3
            }
        ));
        assert!(writer.write_timestamps(&[10]).is_err());

        writer.write_timestamps(&[10, 20]).unwrap();
        let bytes = writer.finalize().unwrap();
        assert_eq!(bytes.len(), SER_HEADER_SIZE + 2 + 16);
    }
}
