//! Top-level encoder: owns the caller-supplied working memory and the running state
//! (MD5, frame/sample counters, min/max frame size, per-channel subframe statistics) across
//! a sequence of block-by-block encode calls.

use tracing::{debug, trace, warn};

use super::bitwriter::BitWriter;
use super::config::{Config, Derived};
use super::error::{internal_error, EncodeError};
use super::frame;
use super::md5::Md5;
use super::subframe::{encode_subframe, Scratch, SubframeType};
use super::{analyzer, streaminfo, Result};

const FRAMENO_MASK: u64 = 0x7FFF_FFFF; // 31 bits
const SAMPLECOUNT_MASK: u64 = 0x0000_000F_FFFF_FFFF; // 36 bits

/// Per-channel, per-subframe-type counters. Not part of the wire format — a convenience for
/// callers who want to log what the encoder actually chose.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelStats {
    pub constant: u32,
    pub verbatim: u32,
    pub fixed: [u32; 5],
}

#[derive(Debug, Clone, Default)]
pub struct SubframeStats {
    pub channels: Vec<ChannelStats>,
}

impl SubframeStats {
    fn new(channels: usize) -> Self {
        SubframeStats {
            channels: vec![ChannelStats::default(); channels],
        }
    }

    fn record(&mut self, channel: usize, kind: SubframeType) {
        let c = &mut self.channels[channel];
        match kind {
            SubframeType::Constant => c.constant += 1,
            SubframeType::Verbatim => c.verbatim += 1,
            SubframeType::Fixed(order) => c.fixed[order as usize] += 1,
        }
    }
}

pub struct Encoder<'a> {
    config: Config,
    derived: Derived,
    residuals: [&'a mut [i64]; 5],
    md5: Md5,
    md5_digest: [u8; 16],
    frameno: u64,
    samplecount: u64,
    min_frame_size: u32,
    max_frame_size: u32,
    stats: SubframeStats,
}

impl<'a> Encoder<'a> {
    /// Validates `config` and splits `working_memory` into the five residual scratch buffers
    /// the encoder borrows for the rest of its lifetime.
    pub fn new(mut config: Config, working_memory: &'a mut [u8]) -> Result<Self> {
        let derived = config.validate(working_memory.len())?;
        let channels = config.channels as usize;
        let residuals = split_residual_buffers(working_memory, derived.res_len)?;
        debug!(blocksize = config.blocksize, channels, bitdepth = config.bitdepth, "encoder validated");
        Ok(Encoder {
            config,
            derived,
            residuals,
            md5: Md5::new(),
            md5_digest: [0u8; 16],
            frameno: 0,
            samplecount: 0,
            min_frame_size: 0,
            max_frame_size: 0,
            stats: SubframeStats::new(channels),
        })
    }

    pub fn stats(&self) -> &SubframeStats {
        &self.stats
    }

    fn prepare_block(&mut self, blocksize: u32) {
        if blocksize != self.derived.cur_blocksize {
            self.derived = self.config.derive_for(blocksize);
        }
    }

    fn finish_frame(&mut self, used: usize) {
        let used = used as u32;
        if used < self.min_frame_size || self.min_frame_size == 0 {
            self.min_frame_size = used;
        }
        if used > self.max_frame_size {
            self.max_frame_size = used;
        }
        self.frameno = (self.frameno + 1) & FRAMENO_MASK;
        self.samplecount = (self.samplecount + u64::from(self.derived.cur_blocksize)) & SAMPLECOUNT_MASK;
    }

    fn encode_channel(&mut self, bw: &mut BitWriter, channel: usize, blocksize: usize, analysis: analyzer::Analysis) -> Result<()> {
        if !analysis.constant && analysis.wasted_bits > 0 {
            analyzer::rescale(&mut self.residuals[0][..blocksize], analysis.wasted_bits);
        }
        let bitdepth = self.config.bitdepth;
        let partition_order = self.derived.partition_order;
        let max_rice_value = self.config.max_rice_value;
        let verbatim_len = self.derived.verbatim_subframe_len;
        let enable_constant = self.config.enable_constant_subframe;
        let enable_fixed = self.config.enable_fixed_subframe;

        let [r0, r1, r2, r3, r4] = &mut self.residuals;
        let mut scratch = Scratch {
            r0: &mut r0[..blocksize],
            r1: &mut r1[..blocksize],
            r2: &mut r2[..blocksize],
            r3: &mut r3[..blocksize],
            r4: &mut r4[..blocksize],
        };
        let kind = encode_subframe(
            bw,
            &mut scratch,
            blocksize,
            bitdepth,
            analysis.wasted_bits,
            analysis.constant,
            partition_order,
            max_rice_value,
            verbatim_len,
            enable_constant,
            enable_fixed,
        )?;
        trace!(channel, ?kind, "subframe encoded");
        self.stats.record(channel, kind);
        Ok(())
    }

    pub fn encode_i16_planar(&mut self, blocksize: usize, samples: &[&[i16]], out: &mut [u8]) -> Result<usize> {
        self.prepare_block(blocksize as u32);
        if self.config.enable_md5 {
            for i in 0..blocksize {
                for ch in samples {
                    self.md5.add_sample(self.config.bitdepth, ch[i] as i32 as u32);
                }
            }
        }
        let mut bw = BitWriter::new(out);
        frame::write_header(
            &mut bw,
            self.derived.cur_blocksize,
            self.config.samplerate,
            self.config.channels,
            self.config.bitdepth,
            self.frameno,
        )?;
        for (c, ch_samples) in samples.iter().enumerate() {
            let analysis = analyzer::analyze_i16_planar(&ch_samples[..blocksize], &mut self.residuals[0][..blocksize]);
            self.encode_channel(&mut bw, c, blocksize, analysis)?;
        }
        frame::write_footer(&mut bw)?;
        let used = bw.bytes_written();
        self.finish_frame(used);
        Ok(used)
    }

    pub fn encode_i16_interleaved(&mut self, blocksize: usize, samples: &[i16], out: &mut [u8]) -> Result<usize> {
        self.prepare_block(blocksize as u32);
        let channels = self.config.channels as usize;
        if self.config.enable_md5 {
            for &s in &samples[..blocksize * channels] {
                self.md5.add_sample(self.config.bitdepth, s as i32 as u32);
            }
        }
        let mut bw = BitWriter::new(out);
        frame::write_header(
            &mut bw,
            self.derived.cur_blocksize,
            self.config.samplerate,
            self.config.channels,
            self.config.bitdepth,
            self.frameno,
        )?;
        for c in 0..channels {
            let analysis = analyzer::analyze_i16_interleaved(samples, c, channels, &mut self.residuals[0][..blocksize]);
            self.encode_channel(&mut bw, c, blocksize, analysis)?;
        }
        frame::write_footer(&mut bw)?;
        let used = bw.bytes_written();
        self.finish_frame(used);
        Ok(used)
    }

    pub fn encode_i32_planar(&mut self, blocksize: usize, samples: &[&[i32]], out: &mut [u8]) -> Result<usize> {
        self.prepare_block(blocksize as u32);
        if self.config.enable_md5 {
            for i in 0..blocksize {
                for ch in samples {
                    self.md5.add_sample(self.config.bitdepth, ch[i] as u32);
                }
            }
        }
        let mut bw = BitWriter::new(out);
        frame::write_header(
            &mut bw,
            self.derived.cur_blocksize,
            self.config.samplerate,
            self.config.channels,
            self.config.bitdepth,
            self.frameno,
        )?;
        for (c, ch_samples) in samples.iter().enumerate() {
            let analysis = analyzer::analyze_i32_planar(&ch_samples[..blocksize], &mut self.residuals[0][..blocksize]);
            self.encode_channel(&mut bw, c, blocksize, analysis)?;
        }
        frame::write_footer(&mut bw)?;
        let used = bw.bytes_written();
        self.finish_frame(used);
        Ok(used)
    }

    pub fn encode_i32_interleaved(&mut self, blocksize: usize, samples: &[i32], out: &mut [u8]) -> Result<usize> {
        self.prepare_block(blocksize as u32);
        let channels = self.config.channels as usize;
        if self.config.enable_md5 {
            for &s in &samples[..blocksize * channels] {
                self.md5.add_sample(self.config.bitdepth, s as u32);
            }
        }
        let mut bw = BitWriter::new(out);
        frame::write_header(
            &mut bw,
            self.derived.cur_blocksize,
            self.config.samplerate,
            self.config.channels,
            self.config.bitdepth,
            self.frameno,
        )?;
        for c in 0..channels {
            let analysis = analyzer::analyze_i32_interleaved(samples, c, channels, &mut self.residuals[0][..blocksize]);
            self.encode_channel(&mut bw, c, blocksize, analysis)?;
        }
        frame::write_footer(&mut bw)?;
        let used = bw.bytes_written();
        self.finish_frame(used);
        Ok(used)
    }

    /// Completes the running MD5 so [`Encoder::encode_streaminfo`] can emit a real digest.
    pub fn finalize(&mut self) {
        if self.config.enable_md5 {
            self.md5.finalize();
            self.md5_digest = self.md5.digest();
        }
    }

    pub fn encode_streaminfo(&self, is_last: bool, out: &mut [u8]) -> Result<usize> {
        if out.len() < streaminfo::SIZE {
            warn!(len = out.len(), "streaminfo buffer too small");
            return Err(EncodeError::BufferFull);
        }
        streaminfo::encode(
            out,
            is_last,
            self.config.blocksize,
            self.min_frame_size,
            self.max_frame_size,
            self.config.samplerate,
            self.config.channels,
            self.config.bitdepth,
            self.samplecount,
            &self.md5_digest,
        )
    }
}

fn split_residual_buffers(mem: &mut [u8], res_len_bytes: usize) -> Result<[&mut [i64]; 5]> {
    let elems = res_len_bytes / 8;
    // SAFETY: `i64` needs 8-byte alignment; `align_to_mut` hands back the properly aligned
    // middle region plus whatever unaligned head/tail bytes remain, which `size_memory`
    // already budgets 15 bytes of slack for.
    let (_prefix, mid, _suffix) = unsafe { mem.align_to_mut::<i64>() };
    if mid.len() < 5 * elems {
        return internal_error("working memory too small to align five residual buffers");
    }
    let mid = &mut mid[..5 * elems];
    let (a, rest) = mid.split_at_mut(elems);
    let (b, rest) = rest.split_at_mut(elems);
    let (c, rest) = rest.split_at_mut(elems);
    let (d, e) = rest.split_at_mut(elems);
    Ok([a, b, c, d, e])
}
