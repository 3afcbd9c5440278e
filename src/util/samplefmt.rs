//! Audio sample format definitions and normalization

use std::fmt;

/// How the raw bytes of one sample are to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// Unsigned integer samples
    Unsigned,
    /// Signed integer samples
    Signed,
    /// IEEE floating point samples
    Float,
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleKind::Unsigned => "unsigned",
            SampleKind::Signed => "signed",
            SampleKind::Float => "float",
        };
        write!(f, "{}", name)
    }
}

/// Description of a decoded PCM stream
///
/// Channel count, sample rate, bit width, and sample kind fully determine
/// the frame layout and how each sample normalizes to a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundInfo {
    /// Number of interleaved channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample (8, 16, 32, or 64)
    pub bits_per_sample: u16,
    /// Sample interpretation
    pub kind: SampleKind,
}

impl SoundInfo {
    /// Create a new stream description
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16, kind: SampleKind) -> Self {
        SoundInfo {
            channels,
            sample_rate,
            bits_per_sample,
            kind,
        }
    }

    /// Size in bytes of one sample on one channel
    pub fn sample_size(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Size in bytes of one frame (one sample per channel)
    pub fn frame_size(&self) -> usize {
        self.channels as usize * self.sample_size()
    }
}

/// Normalize one raw sample to a float in approximately [-1, 1].
///
/// Unrecognized width/kind combinations (and short input slices) normalize
/// to silence instead of failing; the write path never aborts over a
/// mislabeled sample layout.
pub fn normalize_sample(raw: &[u8], info: &SoundInfo) -> f32 {
    if raw.len() < info.sample_size() {
        return 0.0;
    }

    match (info.kind, info.bits_per_sample) {
        (SampleKind::Unsigned, 8) => raw[0] as f32 / 128.0 - 1.0,
        (SampleKind::Unsigned, 16) => {
            u16::from_le_bytes([raw[0], raw[1]]) as f32 / 32768.0 - 1.0
        }
        (SampleKind::Unsigned, 32) => {
            u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f32 / 2147483648.0 - 1.0
        }
        (SampleKind::Signed, 8) => (raw[0] as i8) as f32 / 128.0,
        (SampleKind::Signed, 16) => {
            // Rebuilt from the two constituent bytes so the value never
            // depends on the slice being readable as an aligned integer.
            let value = ((raw[1] as i8 as i32) << 8) | (raw[0] as i32 & 0xff);
            value as f32 / 32768.0
        }
        (SampleKind::Signed, 32) => {
            i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f32 / 2147483648.0
        }
        (SampleKind::Float, 32) => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
        (SampleKind::Float, 64) => f64::from_le_bytes([
            raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
        ]) as f32,
        _ => 0.0,
    }
}
