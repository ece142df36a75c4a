//! Frame header and footer bit mechanics: sync code, blocksize/samplerate/bitdepth flags, the
//! UTF-8-style frame number, and the trailing CRC-8/CRC-16. Per-channel subframe iteration is
//! orchestrated by [`crate::encoder::Encoder`]; this module only knows how to frame it.

use super::bitwriter::BitWriter;
use super::Result;

const SYNC_CODE: u64 = 0x3FFE;

pub fn blocksize_flag(blocksize: u32) -> u8 {
    match blocksize {
        192 => 1,
        576 => 2,
        1152 => 3,
        2304 => 4,
        4608 => 5,
        256 => 8,
        512 => 9,
        1024 => 10,
        2048 => 11,
        4096 => 12,
        8192 => 13,
        16384 => 14,
        32768 => 15,
        _ => {
            if blocksize > 256 {
                7
            } else {
                6
            }
        }
    }
}

pub fn samplerate_flag(samplerate: u32) -> u8 {
    match samplerate {
        88200 => 1,
        176400 => 2,
        192000 => 3,
        8000 => 4,
        16000 => 5,
        22050 => 6,
        24000 => 7,
        32000 => 8,
        44100 => 9,
        48000 => 10,
        96000 => 11,
        _ => {
            if samplerate % 1000 == 0 && samplerate / 1000 < 256 {
                12
            } else if samplerate % 10 == 0 && samplerate / 10 < 65536 {
                13
            } else if samplerate < 65536 {
                14
            } else {
                0
            }
        }
    }
}

pub fn bitdepth_flag(bitdepth: u32) -> u8 {
    match bitdepth {
        8 => 1,
        12 => 2,
        16 => 4,
        20 => 5,
        24 => 6,
        32 => 7,
        _ => 0,
    }
}

/// Encodes `frameno` (0..=2^36-1, though only the low 31 bits are ever live — see
/// [`crate::encoder::Encoder`]) the same way FLAC packs UTF-8 continuation bytes, and returns
/// the bytes used.
pub fn encode_frameno(frameno: u64) -> ([u8; 6], usize) {
    let mut out = [0u8; 6];
    if frameno < (1 << 7) {
        out[0] = (frameno & 0x7F) as u8;
        (out, 1)
    } else if frameno < (1 << 11) {
        out[0] = 0xC0 | ((frameno >> 6) & 0x1F) as u8;
        out[1] = 0x80 | (frameno & 0x3F) as u8;
        (out, 2)
    } else if frameno < (1 << 16) {
        out[0] = 0xE0 | ((frameno >> 12) & 0x0F) as u8;
        out[1] = 0x80 | ((frameno >> 6) & 0x3F) as u8;
        out[2] = 0x80 | (frameno & 0x3F) as u8;
        (out, 3)
    } else if frameno < (1 << 21) {
        out[0] = 0xF0 | ((frameno >> 18) & 0x07) as u8;
        out[1] = 0x80 | ((frameno >> 12) & 0x3F) as u8;
        out[2] = 0x80 | ((frameno >> 6) & 0x3F) as u8;
        out[3] = 0x80 | (frameno & 0x3F) as u8;
        (out, 4)
    } else if frameno < (1 << 26) {
        out[0] = 0xF8 | ((frameno >> 24) & 0x03) as u8;
        out[1] = 0x80 | ((frameno >> 18) & 0x3F) as u8;
        out[2] = 0x80 | ((frameno >> 12) & 0x3F) as u8;
        out[3] = 0x80 | ((frameno >> 6) & 0x3F) as u8;
        out[4] = 0x80 | (frameno & 0x3F) as u8;
        (out, 5)
    } else {
        out[0] = 0xFC | ((frameno >> 30) & 0x01) as u8;
        out[1] = 0x80 | ((frameno >> 24) & 0x3F) as u8;
        out[2] = 0x80 | ((frameno >> 18) & 0x3F) as u8;
        out[3] = 0x80 | ((frameno >> 12) & 0x3F) as u8;
        out[4] = 0x80 | ((frameno >> 6) & 0x3F) as u8;
        out[5] = 0x80 | (frameno & 0x3F) as u8;
        (out, 6)
    }
}

#[allow(clippy::too_many_arguments)]
pub fn write_header(
    bw: &mut BitWriter,
    blocksize: u32,
    samplerate: u32,
    channels: u32,
    bitdepth: u32,
    frameno: u64,
) -> Result<()> {
    bw.add(14, SYNC_CODE)?;
    bw.add(1, 0)?; // reserved
    bw.add(1, 0)?; // fixed-blocksize strategy

    let bs_flag = blocksize_flag(blocksize);
    bw.add(4, u64::from(bs_flag))?;

    let sr_flag = samplerate_flag(samplerate);
    bw.add(4, u64::from(sr_flag))?;

    bw.add(4, u64::from(channels - 1))?;
    bw.add(3, u64::from(bitdepth_flag(bitdepth)))?;
    bw.add(1, 0)?; // reserved

    let (bytes, len) = encode_frameno(frameno);
    for &b in &bytes[..len] {
        bw.add(8, u64::from(b))?;
    }

    match bs_flag {
        6 => bw.add(8, u64::from(blocksize - 1))?,
        7 => bw.add(16, u64::from(blocksize - 1))?,
        _ => {}
    }

    match sr_flag {
        12 => bw.add(8, u64::from(samplerate / 1000))?,
        13 => bw.add(16, u64::from(samplerate / 10))?,
        14 => bw.add(16, u64::from(samplerate))?,
        _ => {}
    }

    bw.add(8, u64::from(bw.crc8()))
}

pub fn write_footer(bw: &mut BitWriter) -> Result<()> {
    bw.align()?;
    bw.add(16, u64::from(bw.crc16()))
}
