/// Parse a raw query value as a finite number, falling back when it is
/// missing, blank, or not a finite number. Never fails.
pub fn parse_number_or_default(raw: Option<&str>, fallback: f64) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return fallback;
    };

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => fallback,
    }
}

/// Like [`parse_number_or_default`], but only accepts values that are
/// non-negative. Used for the market cap floor and the price ceiling.
pub fn parse_non_negative_or_default(raw: Option<&str>, fallback: f64) -> f64 {
    let value = parse_number_or_default(raw, fallback);
    if value >= 0.0 { value } else { fallback }
}

/// Page numbers are 1-based whole numbers; anything else falls back.
pub fn parse_page_or_default(raw: Option<&str>, fallback: u32) -> u32 {
    let value = parse_number_or_default(raw, f64::NAN);
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        value as u32
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn missing_or_blank_falls_back() {
        assert_eq!(parse_number_or_default(None, 7.0), 7.0);
        assert_eq!(parse_number_or_default(Some(""), 7.0), 7.0);
        assert_eq!(parse_number_or_default(Some("   "), 7.0), 7.0);
    }

    #[test]
    fn garbage_and_non_finite_fall_back() {
        assert_eq!(parse_number_or_default(Some("abc"), 3.0), 3.0);
        assert_eq!(parse_number_or_default(Some("NaN"), 3.0), 3.0);
        assert_eq!(parse_number_or_default(Some("inf"), 3.0), 3.0);
        assert_eq!(parse_number_or_default(Some("12abc"), 3.0), 3.0);
    }

    #[test]
    fn numbers_parse() {
        assert_eq!(parse_number_or_default(Some("1000000"), 0.0), 1_000_000.0);
        assert_eq!(parse_number_or_default(Some("0.25"), 0.0), 0.25);
        assert_eq!(parse_number_or_default(Some("-4"), 0.0), -4.0);
        assert_eq!(parse_number_or_default(Some(" 42 "), 0.0), 42.0);
    }

    #[test]
    fn non_negative_rejects_negatives() {
        assert_eq!(parse_non_negative_or_default(Some("-4"), 9.0), 9.0);
        assert_eq!(parse_non_negative_or_default(Some("0"), 9.0), 0.0);
    }

    #[test]
    fn pages_must_be_positive_integers() {
        assert_eq!(parse_page_or_default(Some("3"), 1), 3);
        assert_eq!(parse_page_or_default(Some("0"), 1), 1);
        assert_eq!(parse_page_or_default(Some("-2"), 1), 1);
        assert_eq!(parse_page_or_default(Some("2.5"), 1), 1);
        assert_eq!(parse_page_or_default(Some("x"), 1), 1);
        assert_eq!(parse_page_or_default(None, 4), 4);
    }

    proptest! {
        #[test]
        fn finite_numbers_round_trip(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let raw = value.to_string();
            prop_assert_eq!(parse_number_or_default(Some(&raw), 1.5), value);
        }

        #[test]
        fn alphabetic_input_always_falls_back(raw in "[a-zA-Z]{1,12}", fallback in -1e9f64..1e9) {
            // "inf", "infinity" and "nan" parse but are not finite
            prop_assert_eq!(parse_number_or_default(Some(&raw), fallback), fallback);
        }
    }
}
