//! Per-channel subframe selection and emission: CONSTANT, FIXED (with Rice-coded residuals),
//! and VERBATIM, tried in that order and falling back whenever a cheaper attempt doesn't fit.

use super::bitwriter::BitWriter;
use super::residual::{calculate_fixed_residuals, ORDERS};
use super::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubframeType {
    Constant,
    Verbatim,
    Fixed(u8),
}

/// Scratch the subframe encoder needs per channel, borrowed from the encoder's working memory.
pub struct Scratch<'a> {
    pub r0: &'a mut [i64],
    pub r1: &'a mut [i64],
    pub r2: &'a mut [i64],
    pub r3: &'a mut [i64],
    pub r4: &'a mut [i64],
}

#[allow(clippy::too_many_arguments)]
pub fn encode_subframe(
    bw: &mut BitWriter,
    scratch: &mut Scratch,
    blocksize: usize,
    bitdepth: u32,
    wasted_bits: u32,
    constant: bool,
    partition_order: u8,
    max_rice_value: u8,
    verbatim_subframe_len: u32,
    enable_constant: bool,
    enable_fixed: bool,
) -> Result<SubframeType> {
    if enable_constant && constant {
        emit_constant(bw, scratch.r0[0], bitdepth, wasted_bits)?;
        return Ok(SubframeType::Constant);
    }

    if enable_fixed {
        let errors = calculate_fixed_residuals(
            blocksize,
            scratch.r0,
            scratch.r1,
            scratch.r2,
            scratch.r3,
            scratch.r4,
            bitdepth,
        );
        if let Some(order) = pick_order(&errors, blocksize, partition_order) {
            let cp = bw.checkpoint();
            let start = bw.bytes_written();
            let residual_bufs: [&[i64]; ORDERS] = [scratch.r0, scratch.r1, scratch.r2, scratch.r3, scratch.r4];
            let result = emit_fixed(
                bw,
                &residual_bufs,
                blocksize,
                bitdepth,
                wasted_bits,
                order,
                partition_order,
                max_rice_value,
            );
            match result {
                Ok(()) if bw.bytes_written() - start <= verbatim_subframe_len as usize => {
                    return Ok(SubframeType::Fixed(order));
                }
                _ => {
                    bw.restore(cp);
                }
            }
        }
    }

    emit_verbatim(bw, scratch.r0, blocksize, bitdepth, wasted_bits)?;
    Ok(SubframeType::Verbatim)
}

fn emit_wasted_indicator(bw: &mut BitWriter, wasted_bits: u32) -> Result<()> {
    if wasted_bits == 0 {
        bw.add(1, 0)
    } else {
        bw.add(1, 1)?;
        for _ in 1..wasted_bits {
            bw.add(1, 0)?;
        }
        bw.add(1, 1)
    }
}

fn emit_constant(bw: &mut BitWriter, value: i64, bitdepth: u32, wasted_bits: u32) -> Result<()> {
    bw.add(1, 0)?;
    bw.add(6, 0b000000)?;
    emit_wasted_indicator(bw, wasted_bits)?;
    // value's low `wasted_bits` bits are already zero (they are the channel's common trailing
    // zeros), so shifting right then back left is a no-op; kept explicit to mirror the general
    // wasted-bits convention every other subframe type uses.
    let rescaled = value >> wasted_bits;
    bw.add(bitdepth, (rescaled << wasted_bits) as u64)
}

fn emit_verbatim(bw: &mut BitWriter, r0: &[i64], blocksize: usize, bitdepth: u32, wasted_bits: u32) -> Result<()> {
    bw.add(1, 0)?;
    bw.add(6, 0b000001)?;
    emit_wasted_indicator(bw, wasted_bits)?;
    let width = bitdepth - wasted_bits;
    for &v in &r0[..blocksize] {
        bw.add(width, v as u64)?;
    }
    Ok(())
}

/// Mirrors the reference's order-selection loop: `max_order` shrinks from 4 while the first
/// partition (which shrinks by `predictor_order`) would otherwise go negative, then the
/// smallest error among `0..=max_order` wins ties toward the lower order. Unlike the reference
/// (which holds `max_order` in an unsigned 8-bit counter that can wrap on pathological
/// configurations), this stays in `i32` and returns `None` outright rather than wrapping, since
/// a wrapped `max_order` would read out-of-bounds error slots.
fn pick_order(errors: &[u64; ORDERS], blocksize: usize, partition_order: u8) -> Option<u8> {
    let mut max_order: i32 = 4;
    while (blocksize >> partition_order) as i32 <= max_order {
        max_order -= 1;
        if max_order < 0 {
            return None;
        }
    }
    let mut best: Option<(u8, u64)> = None;
    for i in 0..=max_order as u8 {
        let e = errors[i as usize];
        if best.map_or(true, |(_, be)| e < be) {
            best = Some((i, e));
        }
    }
    match best {
        Some((order, e)) if e != u64::MAX => Some(order),
        _ => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_fixed(
    bw: &mut BitWriter,
    residuals: &[&[i64]; ORDERS],
    blocksize: usize,
    bitdepth: u32,
    wasted_bits: u32,
    order: u8,
    partition_order: u8,
    max_rice_value: u8,
) -> Result<()> {
    bw.add(1, 0)?;
    bw.add(3, 0b001)?;
    bw.add(3, u64::from(order))?;
    emit_wasted_indicator(bw, wasted_bits)?;

    let warmup_width = bitdepth - wasted_bits;
    for &v in &residuals[0][..order as usize] {
        bw.add(warmup_width, v as u64)?;
    }
    let buf = residuals[order as usize];

    let escape_method = max_rice_value > 14;
    bw.add(2, if escape_method { 1 } else { 0 })?;
    bw.add(4, u64::from(partition_order))?;

    let param_width = if escape_method { 5 } else { 4 };
    let partitions = 1usize << partition_order;
    let mut rice: u32 = 0;
    let mut offset = 0usize;

    for p in 0..partitions {
        let mut partition_length = blocksize >> partition_order;
        if p == 0 {
            partition_length -= order as usize;
        }

        let slice = &buf[offset..offset + partition_length];
        let sum: u64 = slice.iter().map(|&v| v.unsigned_abs()).sum();

        while (partition_length as u64) << (rice + 1) < sum {
            if rice == u32::from(max_rice_value) {
                break;
            }
            rice += 1;
        }

        bw.add(param_width, u64::from(rice))?;

        for &v in slice {
            let zigzag = if v < 0 {
                (((-v) as u64 - 1) << 1) + 1
            } else {
                (v as u64) << 1
            };
            let msb = zigzag >> rice;
            let lsb = zigzag - (msb << rice);
            for _ in 0..msb {
                bw.add(1, 0)?;
            }
            bw.add(1, 1)?;
            bw.add(rice, lsb)?;
        }

        offset += partition_length;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_setup(blocksize: usize) -> (Vec<i64>, Vec<i64>, Vec<i64>, Vec<i64>, Vec<i64>) {
        (
            vec![0i64; blocksize],
            vec![0i64; blocksize],
            vec![0i64; blocksize],
            vec![0i64; blocksize],
            vec![0i64; blocksize],
        )
    }

    #[test]
    fn constant_subframe_length_matches_formula() {
        let mut buf = [0u8; 64];
        let mut bw = BitWriter::new(&mut buf);
        let (mut r0, mut r1, mut r2, mut r3, mut r4) = roundtrip_setup(16);
        for v in r0.iter_mut() {
            *v = 1000;
        }
        let mut scratch = Scratch {
            r0: &mut r0,
            r1: &mut r1,
            r2: &mut r2,
            r3: &mut r3,
            r4: &mut r4,
        };
        let t = encode_subframe(&mut bw, &mut scratch, 16, 16, 0, true, 0, 14, 100, true, true).unwrap();
        assert_eq!(t, SubframeType::Constant);
        // 1 + 6 + 1(no wasted) + 16 bits = 24 bits = 3 bytes
        assert_eq!(bw.bytes_written(), 3);
    }

    #[test]
    fn fixed_never_exceeds_verbatim_bound() {
        let blocksize = 32usize;
        let mut buf = [0u8; 256];
        let mut bw = BitWriter::new(&mut buf);
        let (mut r0, mut r1, mut r2, mut r3, mut r4) = roundtrip_setup(blocksize);
        for (i, v) in r0.iter_mut().enumerate() {
            *v = ((i as i64) * 37 % 101) - 50;
        }
        let mut scratch = Scratch {
            r0: &mut r0,
            r1: &mut r1,
            r2: &mut r2,
            r3: &mut r3,
            r4: &mut r4,
        };
        let verbatim_len = 1 + (blocksize as u32 * 16) / 8;
        let t = encode_subframe(
            &mut bw,
            &mut scratch,
            blocksize,
            16,
            0,
            false,
            2,
            14,
            verbatim_len,
            true,
            true,
        )
        .unwrap();
        assert!(matches!(t, SubframeType::Fixed(_) | SubframeType::Verbatim));
        assert!(bw.bytes_written() as u32 <= verbatim_len);
    }

    #[test]
    fn pick_order_prefers_lower_order_on_tie() {
        let mut errors = [0u64; ORDERS];
        errors[0] = 5;
        errors[1] = 5;
        errors[2] = 5;
        errors[3] = u64::MAX;
        errors[4] = u64::MAX;
        assert_eq!(pick_order(&errors, 4096, 0), Some(0));
    }

    #[test]
    fn pick_order_none_when_all_disqualified() {
        let errors = [u64::MAX; ORDERS];
        assert_eq!(pick_order(&errors, 4096, 0), None);
    }

    #[test]
    fn wasted_indicator_round_trip_bit_count() {
        let mut buf = [0u8; 4];
        let mut bw = BitWriter::new(&mut buf);
        emit_wasted_indicator(&mut bw, 3).unwrap();
        // 1 (flag) + 2 zero bits + 1 terminating bit = 4 bits
        bw.align().unwrap();
        assert_eq!(bw.bytes_written(), 1);
        assert_eq!(buf[0], 0b1001_0000);
    }
}
