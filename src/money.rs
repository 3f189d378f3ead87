//! Price labels.

use rust_decimal::Decimal;
use rusty_money::{Money, iso};

/// Format an amount in the given ISO 4217 currency.
///
/// Unknown codes fall back to `"{amount} {code}"`.
pub fn format_price(amount: Decimal, currency_code: &str) -> String {
    match iso::find(currency_code) {
        Some(currency) => Money::from_decimal(amount, currency).to_string(),
        None => {
            log::debug!("unknown currency {currency_code:?}, using plain price label");
            format!("{amount} {currency_code}")
        }
    }
}

/// Price with the billing period appended, when there is one.
pub fn price_label(amount: Decimal, currency_code: &str, period: Option<&str>) -> String {
    let price = format_price(amount, currency_code);
    match period.map(str::trim).filter(|p| !p.is_empty()) {
        Some(period) => format!("{price} {period}"),
        None => price,
    }
}
