use rust_decimal::prelude::*;

/// Round half away from zero to `decimals` places and pad with zeros.
/// Non-finite input falls back to the float formatter.
pub fn to_fixed(value: f64, decimals: u32) -> String {
    match Decimal::from_f64_retain(value) {
        Some(exact) => {
            let mut rounded =
                exact.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(decimals);
            rounded.to_string()
        }
        None => format!("{value:.prec$}", prec = decimals as usize),
    }
}

pub fn format_price(price: f64) -> String {
    to_fixed(price, 2)
}

/// Abbreviate with a K/M/B/T suffix at one decimal; smaller values are
/// printed as-is.
pub fn format_short_number(value: f64) -> String {
    const SUFFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    for (scale, suffix) in SUFFIXES {
        if value >= scale {
            return format!("{}{suffix}", to_fixed(value / scale, 1));
        }
    }
    value.to_string()
}

/// Signed, two decimals, trailing `%`. Zero carries no sign.
pub fn format_percent_change(change: f64) -> String {
    let sign = if change > 0.0 {
        "+"
    } else if change < 0.0 {
        "-"
    } else {
        ""
    };
    format!("{sign}{}%", to_fixed(change.abs(), 2))
}
