//! FLAC writer: delegation to the flacenc library

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config::Encoder as FlacConfig;
use flacenc::error::Verify;
use flacenc::source::MemSource;
use tracing::debug;

use crate::error::{Error, Result};
use crate::util::{normalize_sample, SoundInfo, SpanList};

/// Block size handed to flacenc (a good balance for most material)
const BLOCK_SIZE: usize = 4096;

/// The delegation always emits 16-bit samples drawn from the shared
/// normalizer, whatever the source width.
const OUTPUT_BITS: usize = 16;

pub(crate) fn write(info: &SoundInfo, spans: &SpanList, path: &Path) -> Result<()> {
    debug!(path = %path.display(), "writing FLAC export");

    let file = File::create(path)
        .map_err(|e| Error::format(format!("Failed to create FLAC file: {}", e)))?;
    let mut writer = BufWriter::new(file);

    let frame_size = info.frame_size();
    let sample_size = info.sample_size();
    let channels = info.channels as usize;
    if frame_size == 0 {
        return Err(Error::config("cannot export FLAC with an empty frame layout"));
    }

    let total_frames = spans.total_len() / frame_size;
    let mut samples: Vec<i32> = Vec::with_capacity(total_frames * channels);

    let mut cursor = spans.cursor();
    let mut scratch = vec![0u8; frame_size * BLOCK_SIZE];
    loop {
        let bytes = cursor.read(&mut scratch);
        if bytes == 0 {
            break;
        }
        // a trailing partial frame is dropped, same as the other writers
        for frame in 0..bytes / frame_size {
            let base = frame * frame_size;
            for ch in 0..channels {
                let start = base + ch * sample_size;
                let value = normalize_sample(&scratch[start..start + sample_size], info);
                samples.push((value.clamp(-1.0, 1.0) * 32767.0) as i32);
            }
        }
    }

    let mut config = FlacConfig::default();
    config.block_size = BLOCK_SIZE;
    let config = config
        .into_verified()
        .map_err(|(_, e)| Error::config(format!("invalid FLAC encoder configuration: {:?}", e)))?;

    let source = MemSource::from_samples(
        &samples,
        channels,
        OUTPUT_BITS,
        info.sample_rate as usize,
    );

    let stream = flacenc::encode_with_fixed_block_size(&config, source, BLOCK_SIZE)
        .map_err(|e| Error::codec(format!("FLAC encoding failed: {:?}", e)))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| Error::codec(format!("Failed to serialize FLAC stream: {:?}", e)))?;

    writer.write_all(sink.as_slice())?;
    writer.flush()?;
    Ok(())
}
