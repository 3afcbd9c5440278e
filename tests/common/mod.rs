//! Common test utilities for mixdown integration tests
//!
//! Provides PCM signal generators and a minimal Ogg page walker used to
//! verify the structure of produced bitstreams.

use std::path::PathBuf;

use mixdown::{SampleKind, Sound, SoundInfo};

/// Beginning-of-stream page flag
pub const FLAG_BOS: u8 = 0x02;
/// End-of-stream page flag
pub const FLAG_EOS: u8 = 0x04;

/// One parsed Ogg page
#[derive(Debug)]
pub struct OggPage {
    pub header_type: u8,
    pub granule_position: u64,
    pub serial: u32,
    pub sequence: u32,
    pub body: Vec<u8>,
}

impl OggPage {
    pub fn is_bos(&self) -> bool {
        self.header_type & FLAG_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header_type & FLAG_EOS != 0
    }
}

/// Walk a byte buffer as a sequence of Ogg pages, panicking on any
/// structural damage (bad capture pattern, truncated page, trailing junk)
pub fn parse_pages(data: &[u8]) -> Vec<OggPage> {
    let mut pages = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        assert!(pos + 27 <= data.len(), "truncated page header at {}", pos);
        assert_eq!(&data[pos..pos + 4], b"OggS", "bad capture pattern at {}", pos);
        assert_eq!(data[pos + 4], 0, "unknown stream structure version");

        let header_type = data[pos + 5];
        let granule_position = u64::from_le_bytes(data[pos + 6..pos + 14].try_into().unwrap());
        let serial = u32::from_le_bytes(data[pos + 14..pos + 18].try_into().unwrap());
        let sequence = u32::from_le_bytes(data[pos + 18..pos + 22].try_into().unwrap());
        let segment_count = data[pos + 26] as usize;

        let table_end = pos + 27 + segment_count;
        assert!(table_end <= data.len(), "truncated segment table at {}", pos);
        let body_len: usize = data[pos + 27..table_end].iter().map(|&s| s as usize).sum();

        let body_end = table_end + body_len;
        assert!(body_end <= data.len(), "truncated page body at {}", pos);

        pages.push(OggPage {
            header_type,
            granule_position,
            serial,
            sequence,
            body: data[table_end..body_end].to_vec(),
        });
        pos = body_end;
    }

    pages
}

/// Interleaved signed 16-bit little-endian sine wave, one tone per channel
pub fn sine_pcm_i16(frames: usize, channels: u16, sample_rate: u32) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(frames * channels as usize * 2);
    for frame in 0..frames {
        let t = frame as f32 / sample_rate as f32;
        for ch in 0..channels {
            let freq = 440.0 * (ch + 1) as f32;
            let value = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.4;
            let sample = (value * 32767.0) as i16;
            pcm.extend_from_slice(&sample.to_le_bytes());
        }
    }
    pcm
}

/// A signed 16-bit sound split across several chunks
pub fn fragmented_sound_i16(frames: usize, channels: u16, sample_rate: u32) -> Sound {
    let info = SoundInfo::new(channels, sample_rate, 16, SampleKind::Signed);
    let pcm = sine_pcm_i16(frames, channels, sample_rate);
    let mut sound = Sound::new(info);

    // uneven chunk sizes so reads cross span boundaries
    let cuts = [pcm.len() / 5, pcm.len() / 2, pcm.len() * 4 / 5];
    let mut start = 0;
    for &cut in &cuts {
        sound.push_chunk(pcm[start..cut].to_vec());
        start = cut;
    }
    sound.push_chunk(pcm[start..].to_vec());
    sound
}

/// Path for a throwaway output file under the system temp directory
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mixdown_test_{}_{}", std::process::id(), name))
}

/// Install the test logging subscriber (idempotent)
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
