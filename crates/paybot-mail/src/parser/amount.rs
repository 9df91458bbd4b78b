//! Locale-formatted amounts such as `1.234,56 EUR`.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

// The leading group keeps a match from starting inside a longer number.
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.,])(-?\d{1,3}(?:\.\d{3})*,\d{2})\s*([A-Z]{3})\b")
        .expect("static regex")
});

/// An amount with its currency code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

/// Replace non-breaking and narrow no-break spaces with plain spaces.
pub fn normalize_spaces(text: &str) -> String {
    text.replace(['\u{00a0}', '\u{202f}'], " ")
}

/// Find the first `d.ddd,dd CUR` amount in `text`.
///
/// Periods are thousands separators and the comma is the decimal point.
/// Digit groups must be well formed: `1234,56 EUR` is not an amount. The
/// sign is kept as printed. `Ok(None)` means no amount was found; an
/// error means one was found but does not fit a [`Decimal`].
pub fn parse_locale_amount(text: &str) -> Result<Option<Money>, rust_decimal::Error> {
    let text = normalize_spaces(text);
    let Some(caps) = AMOUNT.captures(&text) else {
        return Ok(None);
    };
    let digits = caps[1].replace('.', "").replace(',', ".");
    let amount = Decimal::from_str(&digits)?;
    Ok(Some(Money {
        amount,
        currency: caps[2].to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn parse(text: &str) -> Option<Money> {
        parse_locale_amount(text).unwrap()
    }

    #[test]
    fn thousands_and_decimal_comma() {
        let m = parse("1.234,56 EUR").unwrap();
        assert_eq!(m.amount, dec("1234.56"));
        assert_eq!(m.currency, "EUR");
    }

    #[test]
    fn plain_amount_keeps_scale() {
        let m = parse("20,00 EUR").unwrap();
        assert_eq!(m.amount, dec("20.00"));
        assert_eq!(m.amount.to_string(), "20.00");
    }

    #[test]
    fn negative_sign_preserved() {
        let m = parse("Montant : -45,10 EUR").unwrap();
        assert_eq!(m.amount, dec("-45.10"));
    }

    #[test]
    fn non_breaking_space_before_currency() {
        let m = parse("Acme Corp vous a envoyé 100,00\u{a0}EUR.").unwrap();
        assert_eq!(m.amount, dec("100.00"));
        assert_eq!(m.currency, "EUR");

        let m = parse("1.000,00\u{202f}USD").unwrap();
        assert_eq!(m.amount, dec("1000.00"));
        assert_eq!(m.currency, "USD");
    }

    #[test]
    fn no_currency_no_match() {
        assert_eq!(parse("100,00"), None);
        assert_eq!(parse("100.00 EUR"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn ungrouped_thousands_do_not_match() {
        assert_eq!(parse("Acme Corp vous a envoyé 1234,56 EUR."), None);
        assert_eq!(parse("1.2345,67 EUR"), None);
        assert_eq!(parse("1.234,567 EUR"), None);
        assert_eq!(parse("12.34,56 EUR"), None);
    }

    #[test]
    fn amount_after_punctuation() {
        let m = parse("(12,00 EUR)").unwrap();
        assert_eq!(m.amount, dec("12.00"));
        let m = parse("Total:-5,00 EUR").unwrap();
        assert_eq!(m.amount, dec("-5.00"));
    }

    #[test]
    fn first_amount_wins() {
        let m = parse("10,00 EUR then 20,00 USD").unwrap();
        assert_eq!(m.amount, dec("10.00"));
        assert_eq!(m.currency, "EUR");
    }

    #[test]
    fn oversized_amount_is_an_error() {
        let text = "999.999.999.999.999.999.999.999.999.999,00 EUR";
        assert!(parse_locale_amount(text).is_err());
    }
}
