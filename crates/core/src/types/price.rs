//! Euro price helpers using decimal arithmetic.
//!
//! Prices are plain [`Decimal`] amounts in euros. The storefront renders them
//! the Dutch way: a euro sign, `.` as the thousands separator and `,` before
//! the cents (`€1.234,50`).

use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to whole cents (half away from zero).
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display, e.g. `€1.234,50`.
#[must_use]
pub fn format_eur(amount: Decimal) -> String {
    let rounded = round_cents(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}€{grouped},{cents}")
}
