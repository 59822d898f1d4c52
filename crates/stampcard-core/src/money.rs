//! Currency helpers.
//!
//! All amounts inside stampcard are integer cents (`i64`). Decimal reais only
//! appear at the edges: the HTTP surface and the text values of the config
//! table.

use crate::error::{LoyaltyError, Result};

/// Largest purchase amount accepted, in reais.
pub const MAX_AMOUNT_REAIS: f64 = 1_000_000_000.0;

/// Convert a decimal reais amount to cents, rounding to the nearest cent.
///
/// # Errors
///
/// Returns `LoyaltyError::Validation` for negative, non-finite or absurdly
/// large amounts.
#[allow(clippy::cast_possible_truncation)]
pub fn reais_to_cents(reais: f64) -> Result<i64> {
    check_amount(reais)?;
    Ok((reais * 100.0).round() as i64)
}

/// Convert a decimal reais amount to whole cents, dropping any fraction of a
/// cent.
///
/// Stamps earned on the result never exceed `floor(amount / rate)`. Binary
/// noise such as `12.34 * 100 = 1233.9999…` still lands on the intended cent.
///
/// # Errors
///
/// Returns `LoyaltyError::Validation` for negative, non-finite or absurdly
/// large amounts.
#[allow(clippy::cast_possible_truncation)]
pub fn reais_to_cents_floor(reais: f64) -> Result<i64> {
    check_amount(reais)?;
    let scaled = reais * 100.0;
    let nearest = scaled.round();
    let cents = if (scaled - nearest).abs() < CENT_EPSILON {
        nearest
    } else {
        scaled.floor()
    };
    Ok(cents as i64)
}

/// Tolerance, in cents, for float error when flooring.
const CENT_EPSILON: f64 = 1e-6;

fn check_amount(reais: f64) -> Result<()> {
    if !reais.is_finite() {
        return Err(LoyaltyError::validation("amount must be a finite number"));
    }
    if reais < 0.0 {
        return Err(LoyaltyError::validation("amount must not be negative"));
    }
    if reais > MAX_AMOUNT_REAIS {
        return Err(LoyaltyError::validation(format!(
            "amount must not exceed {MAX_AMOUNT_REAIS}"
        )));
    }
    Ok(())
}

/// Convert cents back to decimal reais.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cents_to_reais(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Parse a decimal text value (`"10"`, `"12.5"`, `"12,50"`) into cents.
///
/// Returns `None` when the text is not a finite number. Negative values are
/// returned as-is.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_reais(text: &str) -> Option<i64> {
    let value: f64 = text.trim().replace(',', ".").parse().ok()?;
    if !value.is_finite() || value.abs() > MAX_AMOUNT_REAIS {
        return None;
    }
    Some((value * 100.0).round() as i64)
}

/// Render cents as a plain decimal (`1250` → `"12.50"`).
#[must_use]
pub fn format_decimal(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Render cents in Brazilian notation (`123450` → `"R$ 1.234,50"`).
#[must_use]
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}R$ {grouped},{:02}", abs % 100)
}
