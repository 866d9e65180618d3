use fixed::types::{I32F32, I64F64};

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Convert an f64 to Fixed64. Use only when loading catalog data, never
/// inside aggregation. NaN maps to zero; infinities saturate.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    if v.is_nan() {
        return Fixed64::ZERO;
    }
    Fixed64::saturating_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Intermediate for percent math. Q64.64 holds any Q32.32 value times any
/// Q32.32 factor without overflow.
type Wide = I64F64;

const WIDE_HUNDRED: Wide = Wide::from_bits(100 << 64);

#[inline]
fn percent_factor(percent: Fixed64) -> Wide {
    WIDE_HUNDRED + Wide::saturating_from_num(percent)
}

#[inline]
fn scale_wide(value: Wide, percent: Fixed64) -> Wide {
    value.saturating_mul(percent_factor(percent)) / WIDE_HUNDRED
}

/// Scale `value` by `(1 + percent / 100)`.
///
/// Computed as `value * (100 + percent) / 100` in Q64.64 so that integral
/// inputs with integral percentages stay exact (10 at +20% is exactly 12)
/// and the product cannot overflow. Only the result saturates.
#[inline]
pub fn scale_by_percent(value: Fixed64, percent: Fixed64) -> Fixed64 {
    Fixed64::saturating_from_num(scale_wide(Wide::saturating_from_num(value), percent))
}

/// [`scale_by_percent`] for whole counts, floored. Saturates instead of
/// overflowing; negative results floor to zero.
#[inline]
pub fn scale_count_by_percent(value: u64, percent: Fixed64) -> u64 {
    scale_wide(Wide::saturating_from_num(value), percent).saturating_to_num::<u64>()
}

/// `floor(value / (1 + percent / 100))` for whole counts. Returns `None`
/// when the divisor is zero or negative (a bonus of -100% or less).
#[inline]
pub fn divide_count_by_percent(value: u64, percent: Fixed64) -> Option<u64> {
    let factor = percent_factor(percent);
    if factor <= Wide::ZERO {
        return None;
    }
    Wide::saturating_from_num(value)
        .saturating_mul(WIDE_HUNDRED)
        .checked_div(factor)
        .map(|q| q.saturating_to_num::<u64>())
}

/// `1 + percent / 100` as a multiplier.
#[inline]
pub fn percent_to_multiplier(percent: Fixed64) -> Fixed64 {
    scale_by_percent(Fixed64::ONE, percent)
}
