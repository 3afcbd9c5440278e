//! Integration tests for the WAV writer

mod common;

use common::{fragmented_sound_i16, sine_pcm_i16, temp_path};
use mixdown::{ExportFormat, Exporter, SampleKind, Sound, SoundInfo};

/// The header describes the source exactly and the data chunk is a raw
/// copy of the fragmented spans
#[test]
fn test_wav_layout_and_raw_copy() {
    let frames = 1000;
    let sound = fragmented_sound_i16(frames, 2, 44100);
    let pcm = sine_pcm_i16(frames, 2, 44100);

    let mut exporter = Exporter::new(&sound, ExportFormat::Wav);
    let path = temp_path("layout.wav");
    assert!(exporter.write(&path));

    let data = std::fs::read(&path).unwrap();

    assert_eq!(&data[0..4], b"RIFF");
    let riff_size = u32::from_le_bytes(data[4..8].try_into().unwrap());
    assert_eq!(riff_size as usize, data.len() - 8);
    assert_eq!(&data[8..12], b"WAVE");

    assert_eq!(&data[12..16], b"fmt ");
    assert_eq!(u32::from_le_bytes(data[16..20].try_into().unwrap()), 16);
    // PCM format tag, stereo, 44100 Hz, 16 bits
    assert_eq!(u16::from_le_bytes(data[20..22].try_into().unwrap()), 0x0001);
    assert_eq!(u16::from_le_bytes(data[22..24].try_into().unwrap()), 2);
    assert_eq!(u32::from_le_bytes(data[24..28].try_into().unwrap()), 44100);
    assert_eq!(
        u32::from_le_bytes(data[28..32].try_into().unwrap()),
        44100 * 4
    );
    assert_eq!(u16::from_le_bytes(data[32..34].try_into().unwrap()), 4);
    assert_eq!(u16::from_le_bytes(data[34..36].try_into().unwrap()), 16);

    assert_eq!(&data[36..40], b"data");
    let data_size = u32::from_le_bytes(data[40..44].try_into().unwrap());
    assert_eq!(data_size as usize, pcm.len());
    assert_eq!(&data[44..], &pcm[..]);

    std::fs::remove_file(&path).ok();
}

/// Float sources are labeled with the IEEE float format tag
#[test]
fn test_wav_float_format_tag() {
    let info = SoundInfo::new(1, 48000, 32, SampleKind::Float);
    let pcm: Vec<u8> = (0..256)
        .flat_map(|i| ((i as f32 / 256.0).sin() * 0.5).to_le_bytes())
        .collect();
    let sound = Sound::from_pcm(info, pcm);

    let mut exporter = Exporter::new(&sound, ExportFormat::Wav);
    let path = temp_path("float.wav");
    assert!(exporter.write(&path));

    let data = std::fs::read(&path).unwrap();
    assert_eq!(u16::from_le_bytes(data[20..22].try_into().unwrap()), 0x0003);
    assert_eq!(u16::from_le_bytes(data[34..36].try_into().unwrap()), 32);

    std::fs::remove_file(&path).ok();
}

/// An unwritable sink fails before anything else happens
#[test]
fn test_wav_unwritable_sink() {
    let sound = fragmented_sound_i16(16, 1, 44100);
    let mut exporter = Exporter::new(&sound, ExportFormat::Wav);
    assert!(!exporter.write("/nonexistent-dir/out.wav"));
}
