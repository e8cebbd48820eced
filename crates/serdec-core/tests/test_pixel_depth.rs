mod common;

use serdec_core::config::DecoderConfig;
use serdec_core::frame::ColorMode;

use common::*;

/// 16-bit mono file whose samples never exceed `max`, placed in frame `peak_frame`.
fn mono16_with_peak(frame_count: usize, peak_frame: usize, max: u16) -> SerFixture {
    let mut fixture = SerFixture::new(2, 2, 16, ColorMode::Mono);
    fixture.frames = (0..frame_count)
        .map(|f| {
            let peak = if f == peak_frame { max } else { 1 };
            encode_u16(&[peak, 0, 1, 0], 0)
        })
        .collect();
    fixture
}

#[test]
fn test_overstated_depth_is_corrected() {
    let mut reader = open_bytes(mono16_with_peak(5, 0, 1000).build());
    assert_eq!(reader.declared_pixel_depth(), 16);
    assert_eq!(reader.pixel_depth(), 10);
    assert_eq!(reader.header().pixel_depth, 10);

    // Inference leaves the reader at the first frame.
    assert_eq!(reader.position(), 0);
    let out = native_u16s(&next_frame(&mut reader));
    // stretched at 10 bits: (1000 << 6) + (1000 >> 4)
    assert_eq!(out[2], (1000u16 << 6) + (1000 >> 4));
}

#[test]
fn test_understated_depth_is_raised() {
    let mut fixture = mono16_with_peak(3, 2, 0x9000);
    fixture.pixel_depth = 12;
    let mut reader = open_bytes(fixture.build());
    assert_eq!(reader.declared_pixel_depth(), 12);
    assert_eq!(reader.pixel_depth(), 16);

    let out = native_u16s(&frame_at(&mut reader, 3));
    assert_eq!(out[2], 0x9000);
}

#[test]
fn test_peak_in_last_frame_is_seen() {
    let reader = open_bytes(mono16_with_peak(40, 39, 5000).build());
    assert_eq!(reader.pixel_depth(), 13);
}

#[test]
fn test_peak_between_samples_is_missed() {
    // 18 frames: sampled frames are 1, 2, 4, 6, 8, 10, 12, 14, 16, 18.
    // The peak sits in frame 3, which is never looked at.
    let reader = open_bytes(mono16_with_peak(18, 2, 5000).build());
    assert_eq!(reader.pixel_depth(), 9);
}

#[test]
fn test_inference_can_be_disabled() {
    let config = DecoderConfig {
        infer_pixel_depth: false,
        ..DecoderConfig::default()
    };
    let reader = open_bytes_with(mono16_with_peak(3, 0, 1000).build(), &config);
    assert_eq!(reader.pixel_depth(), 16);
}

#[test]
fn test_eight_bit_files_skip_inference() {
    let reader = open_bytes(mono8_fixture(2, 2, 3).build());
    assert_eq!(reader.pixel_depth(), 8);
    assert_eq!(reader.declared_pixel_depth(), 8);
}

#[test]
fn test_hint_overrides_declared_depth() {
    // Declared 16-bit but the data is really one byte per sample.
    let mut fixture = SerFixture::new(2, 2, 16, ColorMode::Mono);
    // Trailing bytes keep the declared 16-bit geometry valid for the writer.
    fixture.frames = vec![vec![1, 2, 3, 4, 0, 0, 0, 0]];
    let data = fixture.build();

    let config = DecoderConfig {
        bit_depth_hint: Some(8),
        ..DecoderConfig::default()
    };
    let mut reader = open_bytes_with(data, &config);
    assert_eq!(reader.pixel_depth(), 8);
    assert_eq!(reader.buffer_size(), 4);
    assert_eq!(next_frame(&mut reader), vec![3, 4, 1, 2]);
}

#[test]
fn test_out_of_range_hint_is_ignored() {
    let fixture = mono8_fixture(2, 2, 1);
    let config = DecoderConfig {
        bit_depth_hint: Some(4),
        ..DecoderConfig::default()
    };
    let reader = open_bytes_with(fixture.build(), &config);
    assert_eq!(reader.pixel_depth(), 8);
}

#[test]
fn test_colour_inference_scans_all_channels() {
    let mut fixture = SerFixture::new(1, 1, 16, ColorMode::RGB);
    // Peak in the blue channel only
    fixture.frames = vec![encode_u16(&[10, 20, 3000], 0)];
    let reader = open_bytes(fixture.build());
    assert_eq!(reader.pixel_depth(), 12);
}

#[test]
fn test_dark_data_infers_nine_bits() {
    let mut fixture = mono16_with_peak(4, 1, 100);
    fixture.pixel_depth = 12;
    let mut reader = open_bytes(fixture.build());
    assert_eq!(reader.declared_pixel_depth(), 12);
    assert_eq!(reader.pixel_depth(), 9);

    // 9-bit stretch: (100 << 7) + (100 >> 2)
    let out = native_u16s(&frame_at(&mut reader, 2));
    assert_eq!(out[2], (100u16 << 7) + (100 >> 2));
}
