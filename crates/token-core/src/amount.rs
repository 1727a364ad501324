//! Conversion between human decimal amounts and raw base-unit amounts.
//!
//! Going in, amounts are truncated toward zero at the mint's precision.
//! Going out, whole values print without a fractional part and everything
//! else prints with exactly `decimals` fractional digits. All scaling is done
//! on decimal digits, never by binary floating-point multiplication, so
//! `0.29` at two decimals is 29 base units rather than 28.

use crate::error::{Result, TokenError};

/// Scale a decimal amount to base units, truncating extra precision.
///
/// The amount is scaled through its shortest round-trip decimal form, which
/// is the number the user typed. Negative, NaN and infinite amounts, and
/// amounts that overflow `u64` base units, are rejected.
pub fn to_raw(amount: f64, decimals: u8) -> Result<u64> {
    if !amount.is_finite() {
        return Err(TokenError::Validation(format!(
            "amount must be a finite number, got {amount}"
        )));
    }
    if amount < 0.0 {
        return Err(TokenError::Validation(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    if amount == 0.0 {
        return Ok(0);
    }

    parse_raw(&amount.to_string(), decimals)
}

/// Like `to_raw`, but an amount that scales to zero base units is invalid.
pub fn to_positive_raw(amount: f64, decimals: u8) -> Result<u64> {
    let raw = to_raw(amount, decimals)?;
    if raw == 0 {
        return Err(TokenError::Validation(format!(
            "amount must be greater than zero (got {amount} at {decimals} decimals)"
        )));
    }
    Ok(raw)
}

/// Parse a plain decimal string (`"12"`, `"0.5"`, `".25"`) into base units.
pub fn parse_raw(amount: &str, decimals: u8) -> Result<u64> {
    let invalid = || TokenError::Validation(format!("invalid amount {amount:?}"));

    let amount = amount.trim();
    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let scale = 10u128
        .checked_pow(decimals as u32)
        .filter(|s| *s <= u64::MAX as u128 * 10)
        .ok_or_else(|| TokenError::Validation(format!("unsupported decimals: {decimals}")))?;

    let too_large = || TokenError::Validation(format!("amount {amount} is too large"));

    let mut whole: u128 = 0;
    for b in int_part.bytes() {
        whole = whole
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as u128))
            .filter(|v| *v <= u64::MAX as u128)
            .ok_or_else(too_large)?;
    }

    // Keep the first `decimals` fractional digits, right-padded with zeros.
    let mut fraction: u128 = 0;
    let mut digits = frac_part.bytes();
    for _ in 0..decimals {
        let d = digits.next().map_or(0, |b| (b - b'0') as u128);
        fraction = fraction * 10 + d;
    }

    let raw = whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction))
        .ok_or_else(too_large)?;

    u64::try_from(raw).map_err(|_| too_large())
}

/// Format base units: whole values as integers, everything else with exactly
/// `decimals` fractional digits.
pub fn to_decimal(raw: u64, decimals: u8) -> String {
    let (whole, fraction) = split_digits(raw, decimals);
    if fraction.bytes().all(|b| b == b'0') {
        whole
    } else {
        format!("{whole}.{fraction}")
    }
}

/// `to_decimal` with trailing fractional zeros removed, for messages.
pub fn to_display(raw: u64, decimals: u8) -> String {
    let (whole, fraction) = split_digits(raw, decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole
    } else {
        format!("{whole}.{fraction}")
    }
}

fn split_digits(raw: u64, decimals: u8) -> (String, String) {
    let decimals = decimals as usize;
    let digits = format!("{raw:0>width$}", width = decimals + 1);
    let split = digits.len() - decimals;
    (digits[..split].to_string(), digits[split..].to_string())
}
