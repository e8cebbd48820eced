use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, info, trace, warn};

use crate::buffer::GrowableBuffer;
use crate::config::DecoderConfig;
use crate::consts::{BIT_DEPTH_HINT_RANGE, SER_HEADER_SIZE, SER_TIMESTAMP_SIZE};
use crate::error::{Result, SerError};
use crate::frame::{ColorMode, Frame, FrameMetadata, SourceInfo};
use crate::io::store::{open_store, ByteStore, DynStore};
use crate::timestamp::{FrameRate, Timestamps};

mod decode;
mod depth;
mod header;

pub use decode::{decode_frame, BitStretch};
pub use header::{FrameLayout, SampleOrder, SerHeader};

/// Streaming SER decoder over a random-access byte store.
///
/// Frames are read on demand; strictly sequential access never seeks.
pub struct SerReader<S: ByteStore = DynStore> {
    store: S,
    path: PathBuf,
    file_size: u64,
    header: SerHeader,
    declared_pixel_depth: u32,
    layout: FrameLayout,
    /// Frames consumed so far; the next sequential frame is `current_frame + 1`.
    current_frame: u32,
    timestamps: Option<Timestamps>,
    /// Index of the timestamp for the next frame. Tracks `current_frame`.
    ts_cursor: usize,
    timestamp: u64,
    staging: GrowableBuffer,
    last_error: Option<String>,
}

impl SerReader {
    /// Open a SER file with the default configuration.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &DecoderConfig::default())
    }

    pub fn open_with(path: &Path, config: &DecoderConfig) -> Result<Self> {
        let store = open_store(path, config.store)?;
        Self::from_store(store, path, config)
    }
}

impl<S: ByteStore> SerReader<S> {
    /// Parse and validate the header of an already opened store.
    ///
    /// `path` is only used in diagnostics.
    pub fn from_store(mut store: S, path: impl Into<PathBuf>, config: &DecoderConfig) -> Result<Self> {
        let path = path.into();
        let unavailable = |source| SerError::IoUnavailable {
            path: path.clone(),
            source,
        };

        let file_size = store.size().map_err(unavailable)?;
        if file_size < SER_HEADER_SIZE as u64 {
            return Err(unavailable(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("file is too short to contain a SER header ({file_size} bytes)"),
            )));
        }

        let mut raw_header = [0u8; SER_HEADER_SIZE];
        store.seek(SeekFrom::Start(0)).map_err(unavailable)?;
        store.read_exact(&mut raw_header).map_err(unavailable)?;
        let mut header = SerHeader::parse(&raw_header)?;
        header.validate(&path)?;

        let declared_pixel_depth = header.pixel_depth as u32;
        if let Some(hint) = config.bit_depth_hint.filter(|d| BIT_DEPTH_HINT_RANGE.contains(d)) {
            debug!(declared = declared_pixel_depth, hint, "Overriding pixel depth");
            header.pixel_depth = hint as i32;
        }

        let layout = FrameLayout::new(&header, header.pixel_depth as u32);
        let frame_count = header.frame_count as u32;

        let truncated = |required| SerError::TruncatedFile {
            path: path.clone(),
            required,
            actual: file_size,
        };
        let data_end = layout
            .checked_frame_bytes()
            .and_then(|fb| fb.checked_mul(u64::from(frame_count)))
            .and_then(|total| total.checked_add(SER_HEADER_SIZE as u64))
            .ok_or_else(|| truncated(None))?;
        if file_size < data_end {
            return Err(truncated(Some(data_end)));
        }
        // Frame size must also be addressable in memory.
        if usize::try_from(layout.checked_frame_bytes().unwrap_or(u64::MAX)).is_err() {
            return Err(truncated(None));
        }

        let mut reader = Self {
            store,
            path,
            file_size,
            header,
            declared_pixel_depth,
            layout,
            current_frame: 0,
            timestamps: None,
            ts_cursor: 0,
            timestamp: 0,
            staging: GrowableBuffer::new(),
            last_error: None,
        };

        if layout.bytes_per_sample == 2 && config.infer_pixel_depth {
            reader.infer_pixel_depth()?;
        }

        if reader.header.declares_timestamps() {
            let trailer_end = u64::from(frame_count)
                .checked_mul(SER_TIMESTAMP_SIZE as u64)
                .and_then(|t| t.checked_add(data_end));
            match trailer_end {
                Some(end) if file_size >= end => reader.load_timestamps(data_end)?,
                _ => warn!(
                    path = %reader.path.display(),
                    "Header declares timestamps but the file is too short to hold them"
                ),
            }
        }

        info!(
            path = %reader.path.display(),
            frames = frame_count,
            width = layout.width,
            height = layout.height,
            pixel_depth = reader.pixel_depth(),
            color_mode = ?reader.color_mode(),
            timestamps = reader.timestamps.is_some(),
            "Opened SER file"
        );
        Ok(reader)
    }

    /// Read the trailer at `offset` and restore the cursor to frame 1.
    fn load_timestamps(&mut self, offset: u64) -> Result<()> {
        let count = self.frame_count() as usize;
        let expected = count * SER_TIMESTAMP_SIZE;

        self.store.seek(SeekFrom::Start(offset))?;
        let raw = self.staging.ensure_capacity(expected);
        let actual = self.store.read_up_to(raw)?;
        if actual < expected {
            return Err(SerError::TimestampReadFailure {
                path: self.path.clone(),
                expected,
                actual,
            });
        }

        let mut ticks = vec![0u64; count];
        LittleEndian::read_u64_into(&raw[..expected], &mut ticks);
        let timestamps = Timestamps::new(ticks, self.header.date_time, self.header.date_time_utc);

        let analysis = timestamps.analysis();
        debug!(
            in_order = analysis.in_order,
            min = analysis.min,
            correction = analysis.correction,
            frame_rate = %analysis.frame_rate,
            "Loaded timestamp trailer"
        );
        self.timestamps = Some(timestamps);
        self.rewind()
    }

    /// Position at frame 1 with no frame consumed.
    fn rewind(&mut self) -> Result<()> {
        self.store.seek(SeekFrom::Start(SER_HEADER_SIZE as u64))?;
        self.current_frame = 0;
        self.ts_cursor = 0;
        self.timestamp = 0;
        Ok(())
    }

    /// Seek so that the next sequential frame is `frame_number` (1-based).
    fn seek_to_frame(&mut self, frame_number: u32) -> Result<()> {
        let index = frame_number.saturating_sub(1);
        let offset = u64::from(index) * self.layout.frame_bytes() as u64 + SER_HEADER_SIZE as u64;
        trace!(frame_number, offset, "Seeking");
        self.store.seek(SeekFrom::Start(offset))?;
        self.current_frame = index;
        self.ts_cursor = index as usize;
        Ok(())
    }

    /// Consume the next frame at the given effective depth.
    fn decode_next(&mut self, out: Option<&mut [u8]>, pixel_depth: u32) -> Result<()> {
        let frame_count = self.frame_count();
        if self.current_frame >= frame_count {
            return Err(SerError::ExhaustedSequence { frame_count });
        }

        let frame_bytes = self.layout.frame_bytes();
        if let Some(out) = &out {
            if out.len() < frame_bytes {
                return Err(SerError::BufferTooSmall {
                    required: frame_bytes,
                    actual: out.len(),
                });
            }
        }

        self.current_frame += 1;
        self.timestamp = self
            .timestamps
            .as_ref()
            .and_then(|ts| ts.get(self.ts_cursor))
            .unwrap_or(0);
        self.ts_cursor += 1;
        debug_assert!(self.ts_cursor <= frame_count as usize);

        let Some(out) = out else {
            let skip = i64::try_from(frame_bytes).map_err(std::io::Error::other)?;
            self.store.seek(SeekFrom::Current(skip))?;
            return Ok(());
        };

        let raw = self.staging.ensure_capacity(frame_bytes);
        let actual = self.store.read_up_to(raw)?;
        if actual < frame_bytes {
            return Err(SerError::TruncatedFrame {
                frame_number: self.current_frame,
                expected: frame_bytes,
                actual,
            });
        }

        let color_mode = ColorMode::from_id(self.header.color_id);
        let order = self.header.sample_order();
        decode_frame(raw, out, &self.layout, color_mode, order, pixel_depth)
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.last_error = Some(e.to_string());
        }
        result
    }

    /// Decode the next frame into `out`, or skip it when `out` is `None`.
    ///
    /// `out` must hold at least [`buffer_size`](Self::buffer_size) bytes.
    pub fn get_frame(&mut self, out: Option<&mut [u8]>) -> Result<()> {
        let depth = self.pixel_depth();
        let result = self.decode_next(out, depth);
        self.record(result)
    }

    /// Decode frame `frame_number` (1-based, clamped to the valid range).
    ///
    /// Only seeks when the frame is not the next sequential one.
    pub fn get_frame_at(&mut self, frame_number: u32, out: Option<&mut [u8]>) -> Result<()> {
        let frame_number = frame_number.clamp(1, self.frame_count());
        if frame_number != self.current_frame + 1 {
            let result = self.seek_to_frame(frame_number);
            self.record(result)?;
        }
        self.get_frame(out)
    }

    /// Skip the next frame without decoding it.
    pub fn skip_frame(&mut self) -> Result<()> {
        self.get_frame(None)
    }

    /// Decode frame `frame_number` (1-based) into an owned [`Frame`].
    pub fn read_frame(&mut self, frame_number: u32) -> Result<Frame> {
        let mut buf = vec![0u8; self.buffer_size()];
        self.get_frame_at(frame_number, Some(&mut buf))?;

        let layout = self.layout;
        let mut frame = Frame::from_canonical(
            &buf,
            layout.width,
            layout.height,
            layout.channels,
            layout.bytes_per_sample,
            self.pixel_depth(),
        )?;
        frame.metadata = FrameMetadata {
            frame_number: self.current_frame,
            timestamp: self.timestamps.is_some().then_some(self.timestamp),
        };
        Ok(frame)
    }

    /// Iterator decoding every frame from the first, in order.
    pub fn frames(&mut self) -> impl Iterator<Item = Result<Frame>> + '_ {
        let count = self.frame_count();
        (1..=count).map(move |n| self.read_frame(n))
    }

    pub fn header(&self) -> &SerHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn frame_count(&self) -> u32 {
        self.header.frame_count as u32
    }

    /// Bytes needed to hold one decoded frame.
    pub fn buffer_size(&self) -> usize {
        self.layout.frame_bytes()
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn width(&self) -> u32 {
        self.layout.width as u32
    }

    pub fn height(&self) -> u32 {
        self.layout.height as u32
    }

    /// Effective pixel depth after any hint or inference.
    ///
    /// The depth declared on disk is overwritten at open time.
    pub fn pixel_depth(&self) -> u32 {
        self.header.pixel_depth as u32
    }

    /// Depth the header declared, for diagnostics only.
    pub fn declared_pixel_depth(&self) -> u32 {
        self.declared_pixel_depth
    }

    pub fn color_mode(&self) -> ColorMode {
        self.header.color_mode()
    }

    pub fn is_colour(&self) -> bool {
        self.color_mode().is_colour()
    }

    pub fn observer(&self) -> String {
        self.header.observer()
    }

    pub fn instrument(&self) -> String {
        self.header.instrument()
    }

    pub fn telescope(&self) -> String {
        self.header.telescope()
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.timestamps
            .as_ref()
            .map_or(FrameRate::NOT_RECORDED, |ts| ts.analysis().frame_rate)
    }

    /// `date_time_utc - date_time` from the header, zero without timestamps.
    pub fn utc_to_local_offset(&self) -> i64 {
        self.timestamps
            .as_ref()
            .map_or(0, |ts| ts.analysis().utc_to_local_offset)
    }

    /// Ticks to add to raw timestamps to get UTC.
    pub fn timestamp_correction(&self) -> i64 {
        self.timestamps
            .as_ref()
            .map_or(0, |ts| ts.analysis().correction)
    }

    pub fn timestamps(&self) -> Option<&Timestamps> {
        self.timestamps.as_ref()
    }

    /// Tick of the most recently produced frame, 0 without a trailer.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Number of frames consumed; the next sequential frame is `position() + 1`.
    pub fn position(&self) -> u32 {
        self.current_frame
    }

    /// Message of the most recent failed decode.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn source_info(&self) -> SourceInfo {
        let ts = self.timestamps.as_ref();
        SourceInfo {
            filename: self.path.clone(),
            total_frames: self.frame_count(),
            width: self.width(),
            height: self.height(),
            pixel_depth: self.pixel_depth(),
            declared_pixel_depth: self.declared_pixel_depth,
            color_mode: self.color_mode(),
            high_byte_first: self.header.sample_order() == SampleOrder::HighByteFirst,
            frame_bytes: self.layout.frame_bytes() as u64,
            observer: non_empty(self.observer()),
            instrument: non_empty(self.instrument()),
            telescope: non_empty(self.telescope()),
            frame_rate: self.frame_rate(),
            has_timestamps: ts.is_some(),
            first_timestamp: ts.map(|t| t.analysis().first),
            last_timestamp: ts.and_then(|t| t.get(t.len().saturating_sub(1))),
        }
    }

    /// Release the store.
    pub fn close(self) {
        debug!(path = %self.path.display(), "Closing SER file");
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
