//! Conversion between raw contract units and display amounts.

use thiserror::Error;

/// Amount conversion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,

    #[error("not a number: {0}")]
    InvalidDigits(String),

    #[error("amount too large: {0}")]
    Overflow(String),
}

fn parse_digits(digits: &str, input: &str) -> Result<u128, AmountError> {
    if digits.is_empty() {
        return Ok(0);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::InvalidDigits(input.to_string()));
    }
    digits
        .parse::<u128>()
        .map_err(|_| AmountError::Overflow(input.to_string()))
}

fn scale(decimals: u32, input: &str) -> Result<u128, AmountError> {
    10u128
        .checked_pow(decimals)
        .ok_or_else(|| AmountError::Overflow(input.to_string()))
}

/// Check that a raw amount is a non-negative integer.
pub fn validate_raw_amount(raw: &str) -> Result<u128, AmountError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AmountError::Empty);
    }
    parse_digits(raw, raw)
}

/// Render a raw integer amount with `decimals` implied decimal places,
/// trimming trailing zeros (`12500000`, 7 → `1.25`).
pub fn format_token_amount(raw: &str, decimals: u32) -> Result<String, AmountError> {
    let value = validate_raw_amount(raw)?;
    let divisor = scale(decimals, raw)?;

    let whole = value / divisor;
    let remainder = value % divisor;
    if remainder == 0 {
        return Ok(whole.to_string());
    }

    let fractional = format!("{:0width$}", remainder, width = decimals as usize);
    Ok(format!("{}.{}", whole, fractional.trim_end_matches('0')))
}

/// Convert a display amount into raw units. Extra fractional digits are
/// truncated (`1.25`, 7 → `12500000`).
pub fn parse_token_amount(display: &str, decimals: u32) -> Result<String, AmountError> {
    let display = display.trim();
    if display.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fractional) = display.split_once('.').unwrap_or((display, ""));
    let fractional: String = fractional
        .chars()
        .chain(std::iter::repeat('0'))
        .take(decimals as usize)
        .collect();

    let whole = parse_digits(whole, display)?;
    let fractional = parse_digits(&fractional, display)?;

    whole
        .checked_mul(scale(decimals, display)?)
        .and_then(|w| w.checked_add(fractional))
        .map(|v| v.to_string())
        .ok_or_else(|| AmountError::Overflow(display.to_string()))
}
