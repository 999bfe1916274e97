//! Display formatting for market quantities
//!
//! Every function here is pure. Values the upstream left out are rendered as
//! `"N/A"` through [`or_na`].

/// Placeholder for missing values
pub const NOT_AVAILABLE: &str = "N/A";

const SUFFIXES: &[(f64, &str)] = &[(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Applies `format` to a present value, `"N/A"` otherwise
pub fn or_na(value: Option<f64>, format: fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Formats a USD price with precision scaled to its magnitude
///
/// Sub-cent prices get six decimals, sub-dollar prices four, everything else two.
pub fn format_price(price: f64) -> String {
    if price < 0.01 {
        format!("${:.6}", price)
    } else if price < 1.0 {
        format!("${:.4}", price)
    } else {
        format!("${:.2}", price)
    }
}

/// Scales `value` to the largest suffix whose scaled value is at least one
fn compact(value: f64) -> String {
    for (scale, suffix) in SUFFIXES {
        if value >= *scale {
            return format!("{:.2}{}", value / scale, suffix);
        }
    }
    format!("{:.2}", value)
}

pub fn format_market_cap(market_cap: f64) -> String {
    format!("${}", compact(market_cap))
}

pub fn format_volume(volume: f64) -> String {
    format!("${}", compact(volume))
}

/// Formats a plain quantity (supply, amounts) without a currency sign
///
/// `decimals` shifts a raw on-chain amount into whole tokens first.
pub fn format_large_number(num: f64, decimals: u8) -> String {
    let adjusted = if decimals > 0 {
        num / 10f64.powi(i32::from(decimals))
    } else {
        num
    };
    compact(adjusted)
}

pub fn format_token_amount(amount: f64, decimals: u8) -> String {
    format_large_number(amount, decimals)
}

/// Formats a percentage change; `+` only for strictly positive values
pub fn format_price_change(change: f64) -> String {
    if change > 0.0 {
        format!("+{:.2}%", change)
    } else if change == 0.0 {
        "0.00%".to_string()
    } else {
        format!("{:.2}%", change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_precision() {
        assert_eq!(format_price(0.000123), "$0.000123");
        assert_eq!(format_price(0.5), "$0.5000");
        assert_eq!(format_price(1.0), "$1.00");
        assert_eq!(format_price(1234.567), "$1234.57");
    }

    #[test]
    fn test_compact_suffixes() {
        assert_eq!(format_market_cap(999.0), "$999.00");
        assert_eq!(format_market_cap(1_000.0), "$1.00K");
        assert_eq!(format_market_cap(2_500_000.0), "$2.50M");
        assert_eq!(format_volume(7_250_000_000.0), "$7.25B");
        assert_eq!(format_volume(3.1e12), "$3.10T");
        assert_eq!(format_large_number(0.0, 0), "0.00");
        assert_eq!(format_large_number(42.0, 0), "42.00");
    }

    #[test]
    fn test_largest_suffix_keeps_scaled_value_at_least_one() {
        for value in [1e3, 5.5e3, 1e6, 9.99e8, 1e9, 4.2e11, 1e12, 8e14] {
            let rendered = format_large_number(value, 0);
            let (number, suffix) = rendered.split_at(rendered.len() - 1);
            let scaled: f64 = number.parse().unwrap();
            assert!(scaled >= 1.0, "{rendered}");
            assert!(scaled < 1000.0 || suffix == "T", "{rendered}");
        }
    }

    #[test]
    fn test_large_number_applies_decimals() {
        assert_eq!(format_large_number(1_000_000_000_000_000.0, 6), "1.00B");
        assert_eq!(format_token_amount(123_450_000.0, 6), "123.45");
    }

    #[test]
    fn test_price_change_sign() {
        assert_eq!(format_price_change(5.0), "+5.00%");
        assert_eq!(format_price_change(0.004), "+0.00%");
        assert_eq!(format_price_change(0.0), "0.00%");
        assert_eq!(format_price_change(-0.0), "0.00%");
        assert_eq!(format_price_change(-2.345), "-2.35%");
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(or_na(None, format_price), "N/A");
        assert_eq!(or_na(Some(2.0), format_price), "$2.00");
    }
}
