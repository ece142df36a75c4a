//! Fixed-polynomial predictor residuals (orders 0–4) and the per-order summed-absolute-error
//! statistic the subframe encoder uses to pick a predictor order.
//!
//! The error-accumulation loop below folds indices `4..blocksize` into every order's running
//! sum, even though order 1-3 residuals exist starting at index order-1, 2, 3. This is not a
//! bug: the prologue residuals (indices below 4) are still computed and used for warm-up, they
//! are simply excluded from the order-selection statistic, for every order uniformly.

pub const ORDERS: usize = 5;

/// `residual_errors[k] == u64::MAX` marks order `k` as unusable for this block.
pub fn calculate_fixed_residuals(
    blocksize: usize,
    r0: &[i64],
    r1: &mut [i64],
    r2: &mut [i64],
    r3: &mut [i64],
    r4: &mut [i64],
    bitdepth: u32,
) -> [u64; ORDERS] {
    let mut errors = [0u64; ORDERS];

    if blocksize < 5 {
        errors[1] = u64::MAX;
        errors[2] = u64::MAX;
        errors[3] = u64::MAX;
        errors[4] = u64::MAX;
        return errors;
    }

    r1[0] = r0[1] - r0[0];

    r1[1] = r0[2] - r0[1];
    r2[0] = r0[2] - 2 * r0[1] + r0[0];

    r1[2] = r0[3] - r0[2];
    r2[1] = r0[3] - 2 * r0[2] + r0[1];
    r3[0] = r0[3] - 3 * r0[2] + 3 * r0[1] - r0[0];

    for i in 4..blocksize {
        r1[i - 1] = r0[i] - r0[i - 1];
        r2[i - 2] = r0[i] - 2 * r0[i - 1] + r0[i - 2];
        r3[i - 3] = r0[i] - 3 * r0[i - 1] + 3 * r0[i - 2] - r0[i - 3];
        r4[i - 4] = r0[i] - 4 * r0[i - 1] + 6 * r0[i - 2] - 4 * r0[i - 3] + r0[i - 4];

        errors[0] += r0[i].unsigned_abs();
        errors[1] += r1[i - 1].unsigned_abs();
        errors[2] += r2[i - 2].unsigned_abs();
        errors[3] += r3[i - 3].unsigned_abs();
        errors[4] += r4[i - 4].unsigned_abs();
    }

    let min_check_order = match bitdepth {
        32 => 0,
        31 => 2,
        30 => 3,
        29 => 4,
        _ => return errors,
    };

    let buffers: [&[i64]; ORDERS] = [r0, r1, r2, r3, r4];
    for (order, buf) in buffers.iter().enumerate().skip(min_check_order) {
        let len = blocksize - order;
        if buf[..len]
            .iter()
            .any(|&v| v > i64::from(i32::MAX) || v <= i64::from(i32::MIN))
        {
            errors[order] = u64::MAX;
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    // 16-sample worked example.
    const SAMPLES: [i64; 16] = [
        11056, 20042, 7105, -9413, -26512, -16522, -10795, 3628, -27283, 10247, -18633, 1553,
        11887, -15025, -15393, 9416,
    ];

    #[test]
    fn matches_published_error_sums() {
        let mut r1 = [0i64; 16];
        let mut r2 = [0i64; 16];
        let mut r3 = [0i64; 16];
        let mut r4 = [0i64; 16];
        let errors = calculate_fixed_residuals(16, &SAMPLES, &mut r1, &mut r2, &mut r3, &mut r4, 16);
        assert_eq!(errors[0], 166894);
        assert_eq!(errors[1], 227169);
        assert_eq!(errors[2], 368699);
        assert_eq!(errors[3], 644582);
        assert_eq!(errors[4], 1239351);
    }

    #[test]
    fn short_blocks_disqualify_orders_above_zero() {
        let r0 = [1i64, 2, 3, 4];
        let mut r1 = [0i64; 4];
        let mut r2 = [0i64; 4];
        let mut r3 = [0i64; 4];
        let mut r4 = [0i64; 4];
        let errors = calculate_fixed_residuals(4, &r0, &mut r1, &mut r2, &mut r3, &mut r4, 16);
        assert_eq!(errors[0], 0);
        assert_eq!(errors[1], u64::MAX);
        assert_eq!(errors[2], u64::MAX);
        assert_eq!(errors[3], u64::MAX);
        assert_eq!(errors[4], u64::MAX);
    }

    #[test]
    fn forward_difference_identity() {
        let mut r1 = [0i64; 16];
        let mut r2 = [0i64; 16];
        let mut r3 = [0i64; 16];
        let mut r4 = [0i64; 16];
        calculate_fixed_residuals(16, &SAMPLES, &mut r1, &mut r2, &mut r3, &mut r4, 16);
        for i in 1..16 {
            assert_eq!(r1[i - 1], SAMPLES[i] - SAMPLES[i - 1]);
        }
        for i in 2..16 {
            assert_eq!(r2[i - 2], SAMPLES[i] - 2 * SAMPLES[i - 1] + SAMPLES[i - 2]);
        }
    }

    #[test]
    fn bitdepth_below_29_skips_overflow_check() {
        let r0 = [i64::from(i32::MIN); 6];
        let mut r1 = [0i64; 6];
        let mut r2 = [0i64; 6];
        let mut r3 = [0i64; 6];
        let mut r4 = [0i64; 6];
        let errors = calculate_fixed_residuals(6, &r0, &mut r1, &mut r2, &mut r3, &mut r4, 16);
        assert_ne!(errors[0], u64::MAX);
    }

    #[test]
    fn bitdepth_32_disqualifies_order_with_int32_min() {
        let mut r0 = [0i64; 6];
        r0[5] = i64::from(i32::MIN);
        let mut r1 = [0i64; 6];
        let mut r2 = [0i64; 6];
        let mut r3 = [0i64; 6];
        let mut r4 = [0i64; 6];
        let errors = calculate_fixed_residuals(6, &r0, &mut r1, &mut r2, &mut r3, &mut r4, 32);
        assert_eq!(errors[0], u64::MAX);
    }
}
