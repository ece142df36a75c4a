//! STREAMINFO metadata block: the 4-byte metadata-block header plus the 34-byte fixed payload
//! every FLAC stream starts with.

use super::bitwriter::BitWriter;
use super::Result;

/// Always 38: 4 bytes of metadata-block header, 34 bytes of payload.
pub const SIZE: usize = 38;

#[allow(clippy::too_many_arguments)]
pub fn encode(
    out: &mut [u8],
    is_last: bool,
    blocksize: u32,
    min_frame_size: u32,
    max_frame_size: u32,
    samplerate: u32,
    channels: u32,
    bitdepth: u32,
    samplecount: u64,
    md5_digest: &[u8; 16],
) -> Result<usize> {
    let mut bw = BitWriter::new(out);

    bw.add(1, if is_last { 1 } else { 0 })?;
    bw.add(7, 0)?; // metadata block type: STREAMINFO
    bw.add(24, 34)?; // payload length

    bw.add(16, u64::from(blocksize))?;
    bw.add(16, u64::from(blocksize))?;

    bw.add(24, u64::from(min_frame_size))?;
    bw.add(24, u64::from(max_frame_size))?;

    bw.add(20, u64::from(samplerate))?;
    bw.add(3, u64::from(channels - 1))?;
    bw.add(5, u64::from(bitdepth - 1))?;
    bw.add(36, samplecount)?;

    for &byte in md5_digest {
        bw.add(8, u64::from(byte))?;
    }

    Ok(bw.bytes_written())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_exactly_38_bytes() {
        let mut buf = [0u8; SIZE];
        let used = encode(&mut buf, true, 4096, 0, 0, 44100, 2, 16, 0, &[0u8; 16]).unwrap();
        assert_eq!(used, SIZE);
    }

    #[test]
    fn last_flag_is_top_bit_of_first_byte() {
        let mut buf = [0u8; SIZE];
        encode(&mut buf, true, 4096, 0, 0, 44100, 2, 16, 0, &[0u8; 16]).unwrap();
        assert_eq!(buf[0] & 0x80, 0x80);

        let mut buf2 = [0u8; SIZE];
        encode(&mut buf2, false, 4096, 0, 0, 44100, 2, 16, 0, &[0u8; 16]).unwrap();
        assert_eq!(buf2[0] & 0x80, 0);
    }

    #[test]
    fn length_field_is_34() {
        let mut buf = [0u8; SIZE];
        encode(&mut buf, true, 4096, 0, 0, 44100, 2, 16, 0, &[0u8; 16]).unwrap();
        let len = (u32::from(buf[1]) << 16) | (u32::from(buf[2]) << 8) | u32::from(buf[3]);
        assert_eq!(len, 34);
    }

    #[test]
    fn md5_digest_placed_at_end() {
        let digest = [0xAAu8; 16];
        let mut buf = [0u8; SIZE];
        encode(&mut buf, true, 4096, 0, 0, 44100, 2, 16, 0, &digest).unwrap();
        assert_eq!(&buf[22..38], &digest[..]);
    }
}
