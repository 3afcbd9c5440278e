//! Scoped wrappers over the libvorbis analysis engine and the libogg
//! logical stream
//!
//! The C API threads internal pointers between its state structs, so every
//! struct is boxed to pin its address, and each guard releases its state in
//! strict reverse-acquisition order when it drops, on success, error, and
//! early return alike. Construction failures unwind whatever was acquired
//! before returning, so a guard only ever owns fully-initialized state.

use std::ffi::CString;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::os::raw::{c_int, c_long};
use std::ptr;
use std::slice;

use aotuv_lancer_vorbis_sys::{
    vorbis_analysis, vorbis_analysis_blockout, vorbis_analysis_buffer, vorbis_analysis_headerout,
    vorbis_analysis_init, vorbis_analysis_wrote, vorbis_bitrate_addblock,
    vorbis_bitrate_flushpacket, vorbis_block, vorbis_block_clear, vorbis_block_init,
    vorbis_comment, vorbis_comment_add_tag, vorbis_comment_clear, vorbis_comment_init,
    vorbis_dsp_clear, vorbis_dsp_state, vorbis_encode_init_vbr, vorbis_info, vorbis_info_clear,
    vorbis_info_init,
};
use ogg_next_sys::{
    ogg_packet, ogg_page, ogg_page_eos, ogg_stream_clear, ogg_stream_flush, ogg_stream_init,
    ogg_stream_packetin, ogg_stream_pageout, ogg_stream_state,
};

use crate::error::{Error, Result};

/// One encoded packet borrowed out of the engine
///
/// The packet's data lives inside the engine state and stays valid until
/// the engine is advanced again; the borrow on the engine enforces that.
pub(crate) struct EnginePacket<'a> {
    raw: ogg_packet,
    _engine: PhantomData<&'a mut AnalysisEngine>,
}

impl EnginePacket<'_> {
    fn new(raw: ogg_packet) -> Self {
        EnginePacket {
            raw,
            _engine: PhantomData,
        }
    }

    fn raw_mut(&mut self) -> *mut ogg_packet {
        &mut self.raw
    }
}

/// The engine's per-channel staging buffers for one submission
pub(crate) struct ChannelBuffers<'a> {
    channels: *mut *mut f32,
    channel_count: usize,
    frames: usize,
    _engine: PhantomData<&'a mut AnalysisEngine>,
}

impl ChannelBuffers<'_> {
    /// Mutable float slice for one channel
    pub(crate) fn channel(&mut self, index: usize) -> &mut [f32] {
        assert!(index < self.channel_count, "channel index out of range");
        unsafe { slice::from_raw_parts_mut(*self.channels.add(index), self.frames) }
    }
}

/// Scoped owner of the libvorbis analysis and bitrate-management state
pub(crate) struct AnalysisEngine {
    info: Box<MaybeUninit<vorbis_info>>,
    comment: Box<MaybeUninit<vorbis_comment>>,
    dsp: Box<MaybeUninit<vorbis_dsp_state>>,
    block: Box<MaybeUninit<vorbis_block>>,
    channels: u16,
}

impl AnalysisEngine {
    /// Initialize the engine for a VBR encode
    ///
    /// Fails with a configuration error when libvorbis rejects the
    /// channel count, sample rate, or quality target; anything acquired
    /// before the rejection is released before returning.
    pub(crate) fn new(channels: u16, sample_rate: u32, vbr_quality: f32) -> Result<Self> {
        let mut info = Box::new(MaybeUninit::<vorbis_info>::zeroed());
        unsafe { vorbis_info_init(info.as_mut_ptr()) };
        let ret = unsafe {
            vorbis_encode_init_vbr(
                info.as_mut_ptr(),
                channels as c_long,
                sample_rate as c_long,
                vbr_quality,
            )
        };
        if ret != 0 {
            unsafe { vorbis_info_clear(info.as_mut_ptr()) };
            return Err(Error::config(format!(
                "vorbis rejected encoder parameters (code {}): {} channels, {} Hz, quality {}",
                ret, channels, sample_rate, vbr_quality
            )));
        }

        let mut comment = Box::new(MaybeUninit::<vorbis_comment>::zeroed());
        unsafe { vorbis_comment_init(comment.as_mut_ptr()) };

        let mut dsp = Box::new(MaybeUninit::<vorbis_dsp_state>::zeroed());
        let ret = unsafe { vorbis_analysis_init(dsp.as_mut_ptr(), info.as_mut_ptr()) };
        if ret != 0 {
            unsafe {
                vorbis_comment_clear(comment.as_mut_ptr());
                vorbis_info_clear(info.as_mut_ptr());
            }
            return Err(Error::codec(format!(
                "vorbis analysis state failed to initialize (code {})",
                ret
            )));
        }

        let mut block = Box::new(MaybeUninit::<vorbis_block>::zeroed());
        let ret = unsafe { vorbis_block_init(dsp.as_mut_ptr(), block.as_mut_ptr()) };
        if ret != 0 {
            unsafe {
                vorbis_dsp_clear(dsp.as_mut_ptr());
                vorbis_comment_clear(comment.as_mut_ptr());
                vorbis_info_clear(info.as_mut_ptr());
            }
            return Err(Error::codec(format!(
                "vorbis block state failed to initialize (code {})",
                ret
            )));
        }

        Ok(AnalysisEngine {
            info,
            comment,
            dsp,
            block,
            channels,
        })
    }

    /// Add a comment tag; only effective before the headers are produced
    pub(crate) fn add_comment(&mut self, tag: &str, value: &str) -> Result<()> {
        let tag = CString::new(tag)
            .map_err(|_| Error::config("comment tag contains an interior NUL byte"))?;
        let value = CString::new(value)
            .map_err(|_| Error::config("comment value contains an interior NUL byte"))?;
        unsafe { vorbis_comment_add_tag(self.comment.as_mut_ptr(), tag.as_ptr(), value.as_ptr()) };
        Ok(())
    }

    /// Produce the identification, comment, and setup header packets
    pub(crate) fn header_packets(&mut self) -> Result<[EnginePacket<'_>; 3]> {
        let mut ident = MaybeUninit::<ogg_packet>::zeroed();
        let mut comment = MaybeUninit::<ogg_packet>::zeroed();
        let mut setup = MaybeUninit::<ogg_packet>::zeroed();
        let ret = unsafe {
            vorbis_analysis_headerout(
                self.dsp.as_mut_ptr(),
                self.comment.as_mut_ptr(),
                ident.as_mut_ptr(),
                comment.as_mut_ptr(),
                setup.as_mut_ptr(),
            )
        };
        if ret != 0 {
            return Err(Error::codec(format!(
                "vorbis header assembly failed (code {})",
                ret
            )));
        }
        Ok(unsafe {
            [
                EnginePacket::new(ident.assume_init()),
                EnginePacket::new(comment.assume_init()),
                EnginePacket::new(setup.assume_init()),
            ]
        })
    }

    /// Expose the staging buffer for up to `frames` frames
    pub(crate) fn buffer(&mut self, frames: usize) -> Result<ChannelBuffers<'_>> {
        let channels = unsafe { vorbis_analysis_buffer(self.dsp.as_mut_ptr(), frames as c_int) };
        if channels.is_null() {
            return Err(Error::codec("vorbis analysis buffer is unavailable"));
        }
        Ok(ChannelBuffers {
            channels,
            channel_count: self.channels as usize,
            frames,
            _engine: PhantomData,
        })
    }

    /// Report how many staged frames were filled; zero signals end of input
    pub(crate) fn wrote(&mut self, frames: usize) -> Result<()> {
        let ret = unsafe { vorbis_analysis_wrote(self.dsp.as_mut_ptr(), frames as c_int) };
        if ret != 0 {
            return Err(Error::codec(format!(
                "vorbis rejected {} submitted frames (code {})",
                frames, ret
            )));
        }
        Ok(())
    }

    /// Pull the next completed analysis block and feed it to the bitrate
    /// manager; false once no block is pending
    pub(crate) fn next_block(&mut self) -> Result<bool> {
        let ret = unsafe { vorbis_analysis_blockout(self.dsp.as_mut_ptr(), self.block.as_mut_ptr()) };
        match ret {
            1 => {
                let ret = unsafe { vorbis_analysis(self.block.as_mut_ptr(), ptr::null_mut()) };
                if ret != 0 {
                    return Err(Error::codec(format!(
                        "vorbis block analysis failed (code {})",
                        ret
                    )));
                }
                let ret = unsafe { vorbis_bitrate_addblock(self.block.as_mut_ptr()) };
                if ret != 0 {
                    return Err(Error::codec(format!(
                        "vorbis bitrate accounting failed (code {})",
                        ret
                    )));
                }
                Ok(true)
            }
            0 => Ok(false),
            _ => Err(Error::codec(format!(
                "vorbis block retrieval failed (code {})",
                ret
            ))),
        }
    }

    /// Drain the next rate-managed packet, if one is ready
    pub(crate) fn flush_packet(&mut self) -> Result<Option<EnginePacket<'_>>> {
        let mut packet = MaybeUninit::<ogg_packet>::zeroed();
        let ret =
            unsafe { vorbis_bitrate_flushpacket(self.dsp.as_mut_ptr(), packet.as_mut_ptr()) };
        match ret {
            1 => Ok(Some(EnginePacket::new(unsafe { packet.assume_init() }))),
            0 => Ok(None),
            _ => Err(Error::codec(format!(
                "vorbis packet flush failed (code {})",
                ret
            ))),
        }
    }
}

impl Drop for AnalysisEngine {
    fn drop(&mut self) {
        // Reverse acquisition order: block, dsp, comment, codec settings.
        unsafe {
            vorbis_block_clear(self.block.as_mut_ptr());
            vorbis_dsp_clear(self.dsp.as_mut_ptr());
            vorbis_comment_clear(self.comment.as_mut_ptr());
            vorbis_info_clear(self.info.as_mut_ptr());
        }
    }
}

/// One physical page borrowed out of the logical stream
///
/// Header and body point into the stream state and stay valid until the
/// stream is advanced again.
pub(crate) struct Page<'a> {
    pub header: &'a [u8],
    pub body: &'a [u8],
    pub eos: bool,
}

/// Scoped owner of an ogg logical stream
pub(crate) struct LogicalStream {
    state: Box<MaybeUninit<ogg_stream_state>>,
}

impl LogicalStream {
    /// Initialize a logical stream with the given serial number
    pub(crate) fn new(serial: u32) -> Result<Self> {
        let mut state = Box::new(MaybeUninit::<ogg_stream_state>::zeroed());
        let ret = unsafe { ogg_stream_init(state.as_mut_ptr(), serial as c_int) };
        if ret != 0 {
            return Err(Error::codec("ogg logical stream failed to initialize"));
        }
        Ok(LogicalStream { state })
    }

    /// Weld a packet into the stream
    pub(crate) fn submit(&mut self, packet: &mut EnginePacket<'_>) -> Result<()> {
        let ret = unsafe { ogg_stream_packetin(self.state.as_mut_ptr(), packet.raw_mut()) };
        if ret != 0 {
            return Err(Error::codec("ogg stream rejected a packet"));
        }
        Ok(())
    }

    /// Force out a page even if it is not full yet; None once drained
    pub(crate) fn flush_page(&mut self) -> Option<Page<'_>> {
        self.take_page(true)
    }

    /// Take the next completed page; None until enough data accumulates
    pub(crate) fn next_page(&mut self) -> Option<Page<'_>> {
        self.take_page(false)
    }

    fn take_page(&mut self, force: bool) -> Option<Page<'_>> {
        let mut page = MaybeUninit::<ogg_page>::zeroed();
        let ret = unsafe {
            if force {
                ogg_stream_flush(self.state.as_mut_ptr(), page.as_mut_ptr())
            } else {
                ogg_stream_pageout(self.state.as_mut_ptr(), page.as_mut_ptr())
            }
        };
        if ret == 0 {
            return None;
        }
        let page = unsafe { page.assume_init() };
        let eos = unsafe { ogg_page_eos(&page) != 0 };
        Some(Page {
            header: unsafe { borrowed_bytes(page.header, page.header_len as usize) },
            body: unsafe { borrowed_bytes(page.body, page.body_len as usize) },
            eos,
        })
    }
}

impl Drop for LogicalStream {
    fn drop(&mut self) {
        unsafe {
            ogg_stream_clear(self.state.as_mut_ptr());
        }
    }
}

/// View a C buffer as a byte slice, tolerating an empty one
unsafe fn borrowed_bytes<'a>(data: *const u8, len: usize) -> &'a [u8] {
    if len == 0 {
        &[]
    } else {
        slice::from_raw_parts(data, len)
    }
}
