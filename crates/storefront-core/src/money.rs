//! Money formatting for emails and logs.

use rust_decimal::Decimal;

/// Currency used when the provider does not report one.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Format minor units as `"900.00 USD"`.
///
/// Without an amount only the currency code is returned, which is what the
/// confirmation emails show for sessions that never carried a total.
pub fn format_amount(amount_minor: Option<i64>, currency: Option<&str>) -> String {
    let code = currency_code(currency);
    match amount_minor {
        Some(minor) => format!("{} {code}", Decimal::new(minor, 2)),
        None => code,
    }
}

/// Upper-cased ISO currency code, defaulting to USD.
pub fn currency_code(currency: Option<&str>) -> String {
    currency
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_uppercase()
}
