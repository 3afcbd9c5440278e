//! Streaming Ogg Vorbis writer
//!
//! Runs the write protocol in four phases: engine and stream setup, header
//! submission with a forced flush, the block/packet/page drain loop, and
//! scope-guard teardown.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::engine::{AnalysisEngine, LogicalStream};
use crate::error::{Error, Result};
use crate::metadata::MetadataStore;
use crate::util::{normalize_sample, SoundInfo, SpanList};

/// Frames staged per pass through the read loop
const CHUNK_FRAMES: usize = 102400;

/// Fixed product tag stamped into every comment header
const ENCODER_TAG: &str = "mixdown-encoder";

/// Everything one Ogg write pass needs from the export session
pub(crate) struct OggWriteRequest<'a> {
    pub info: &'a SoundInfo,
    pub spans: &'a SpanList,
    pub metadata: &'a MetadataStore,
    pub quality_level: i32,
    pub serial: u32,
}

pub(crate) fn write(request: &OggWriteRequest<'_>, path: &Path) -> Result<()> {
    // The sink opens before any engine work so an unwritable path fails
    // without touching the encoder.
    let file = File::create(path)
        .map_err(|e| Error::format(format!("Failed to create Ogg file: {}", e)))?;
    let mut sink = BufWriter::new(file);

    let info = request.info;
    let frame_size = info.frame_size();
    let sample_size = info.sample_size();

    debug!(
        path = %path.display(),
        channels = info.channels,
        sample_rate = info.sample_rate,
        quality_level = request.quality_level,
        "writing Ogg Vorbis export"
    );

    let mut engine = AnalysisEngine::new(
        info.channels,
        info.sample_rate,
        request.quality_level as f32 / 10.0,
    )?;

    engine.add_comment("ENCODER", ENCODER_TAG)?;
    if let Some(title) = request.metadata.text("TITLE") {
        engine.add_comment("TITLE", title)?;
    }
    if let Some(artist) = request.metadata.text("ARTIST") {
        engine.add_comment("ARTIST", artist)?;
    }

    let mut stream = LogicalStream::new(request.serial)?;

    // Identification, comment, and setup packets go in first; the forced
    // flush puts them on their own pages so audio data starts on a fresh
    // page, as the container requires.
    let mut headers = engine.header_packets()?;
    for packet in headers.iter_mut() {
        stream.submit(packet)?;
    }
    drop(headers);
    while let Some(page) = stream.flush_page() {
        sink.write_all(page.header)?;
        sink.write_all(page.body)?;
    }

    let mut scratch = vec![0u8; CHUNK_FRAMES * frame_size];
    let mut cursor = request.spans.cursor();
    let mut end_of_stream = false;

    while !end_of_stream {
        let bytes = cursor.read(&mut scratch);
        if bytes == 0 {
            // Zero submitted frames tells the engine the input is done so
            // it can emit the final packets with the end flag set.
            engine.wrote(0)?;
        } else {
            let frames = bytes / frame_size;
            let mut buffers = engine.buffer(CHUNK_FRAMES)?;
            for ch in 0..info.channels as usize {
                let channel = buffers.channel(ch);
                for frame in 0..frames {
                    let start = frame * frame_size + ch * sample_size;
                    channel[frame] =
                        normalize_sample(&scratch[start..start + sample_size], info);
                }
            }
            drop(buffers);
            engine.wrote(frames)?;
        }

        while engine.next_block()? {
            while let Some(mut packet) = engine.flush_packet()? {
                stream.submit(&mut packet)?;
                while let Some(page) = stream.next_page() {
                    sink.write_all(page.header)?;
                    sink.write_all(page.body)?;
                    if page.eos {
                        end_of_stream = true;
                    }
                }
            }
        }
    }

    sink.flush()?;
    Ok(())
}
