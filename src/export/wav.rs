//! WAV writer: RIFF header plus a raw copy of the source spans

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::util::{SampleKind, SoundInfo, SpanList};

const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const WAVE_MAGIC: &[u8; 4] = b"WAVE";
const FMT_CHUNK: &[u8; 4] = b"fmt ";
const DATA_CHUNK: &[u8; 4] = b"data";

/// PCM (uncompressed integer) format tag
const FORMAT_TAG_PCM: u16 = 0x0001;
/// IEEE float format tag
const FORMAT_TAG_IEEE_FLOAT: u16 = 0x0003;

/// Bytes read from the span cursor per copy pass
const COPY_CHUNK: usize = 64 * 1024;

pub(crate) fn write(info: &SoundInfo, spans: &SpanList, path: &Path) -> Result<()> {
    debug!(path = %path.display(), "writing WAV export");

    let file = File::create(path)
        .map_err(|e| Error::format(format!("Failed to create WAV file: {}", e)))?;
    let mut writer = BufWriter::new(file);

    let format_tag = match info.kind {
        SampleKind::Float => FORMAT_TAG_IEEE_FLOAT,
        SampleKind::Unsigned | SampleKind::Signed => FORMAT_TAG_PCM,
    };
    let block_align = info.frame_size() as u16;
    let byte_rate = info.sample_rate * info.frame_size() as u32;
    let data_size = spans.total_len() as u32;

    // fmt chunk payload is the fixed 16-byte PCM layout; the span total
    // fixes every chunk size before anything is written
    let fmt_size = 16u32;
    let riff_size = 4 + 8 + fmt_size + 8 + data_size;

    writer.write_all(RIFF_MAGIC)?;
    writer.write_all(&riff_size.to_le_bytes())?;
    writer.write_all(WAVE_MAGIC)?;

    writer.write_all(FMT_CHUNK)?;
    writer.write_all(&fmt_size.to_le_bytes())?;
    writer.write_all(&format_tag.to_le_bytes())?;
    writer.write_all(&info.channels.to_le_bytes())?;
    writer.write_all(&info.sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&info.bits_per_sample.to_le_bytes())?;

    writer.write_all(DATA_CHUNK)?;
    writer.write_all(&data_size.to_le_bytes())?;

    let mut cursor = spans.cursor();
    let mut scratch = vec![0u8; COPY_CHUNK];
    loop {
        let n = cursor.read(&mut scratch);
        if n == 0 {
            break;
        }
        writer.write_all(&scratch[..n])?;
    }

    writer.flush()?;
    Ok(())
}
