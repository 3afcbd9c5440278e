//! Decoded sound representation consumed by the exporters

use bytes::Bytes;

use crate::util::{SoundInfo, SpanList};

/// A decoded, possibly fragmented PCM sound
///
/// Sample data is held as an ordered list of owned chunks; concatenating
/// the chunks in order yields the interleaved sample stream described by
/// the [`SoundInfo`].
#[derive(Debug, Clone)]
pub struct Sound {
    info: SoundInfo,
    chunks: Vec<Bytes>,
    total_bytes: usize,
}

impl Sound {
    /// Create an empty sound with the given stream description
    pub fn new(info: SoundInfo) -> Self {
        Sound {
            info,
            chunks: Vec::new(),
            total_bytes: 0,
        }
    }

    /// Create a sound from a single contiguous PCM buffer
    pub fn from_pcm(info: SoundInfo, pcm: Vec<u8>) -> Self {
        let mut sound = Sound::new(info);
        sound.push_chunk(pcm);
        sound
    }

    /// Append a chunk of interleaved PCM data
    pub fn push_chunk<B: Into<Bytes>>(&mut self, chunk: B) {
        let chunk = chunk.into();
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
    }

    /// Stream description
    pub fn info(&self) -> &SoundInfo {
        &self.info
    }

    /// Total PCM byte length across all chunks
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Number of whole sample frames in the sound
    pub fn frames(&self) -> usize {
        let frame_size = self.info.frame_size();
        if frame_size == 0 {
            0
        } else {
            self.total_bytes / frame_size
        }
    }

    /// Build the span list an exporter reads from
    pub fn span_list(&self) -> SpanList {
        let mut spans = SpanList::new();
        for chunk in &self.chunks {
            spans.push(chunk.clone());
        }
        spans
    }
}
