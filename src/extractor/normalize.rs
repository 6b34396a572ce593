//! Numeric substring extraction and locale-aware number normalization.

use once_cell::sync::Lazy;
use regex::Regex;

use super::currency::is_turkish_like;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]{1,3}(?:[.,\s][0-9]{3})*(?:[.,][0-9]{1,2})|[0-9]+(?:[.,][0-9]{1,2})?").unwrap()
});

/// First numeric substring in `text`, or `None` if there isn't one.
pub fn extract_numeric_substring(text: &str) -> Option<String> {
    NUMBER_RE.find(text).map(|m| m.as_str().to_string())
}

/// Count of distinct numeric substrings in `text` (used by the "more than
/// 2 numbers with no currency marker" rejection rule).
pub fn count_numeric_substrings(text: &str) -> usize {
    NUMBER_RE.find_iter(text).count()
}

/// Turn a raw numeric substring into a finite positive `f64`, resolving
/// the `.`/`,` decimal-vs-thousands ambiguity against `preferred_currency`.
/// Returns `None` if the result isn't finite and positive.
pub fn normalize_number(raw: &str, preferred_currency: &str) -> Option<f64> {
    let raw = raw.trim();
    let has_dot = raw.contains('.');
    let has_comma = raw.contains(',');

    let canonical = if has_dot && has_comma {
        let last_dot = raw.rfind('.').unwrap();
        let last_comma = raw.rfind(',').unwrap();
        if last_comma > last_dot {
            strip_then_decimal(raw, '.', ',')
        } else {
            strip_then_decimal(raw, ',', '.')
        }
    } else if has_comma {
        let trailing = trailing_group_len(raw, ',');
        if is_turkish_like(preferred_currency) || trailing == 2 {
            raw.replace(',', ".")
        } else {
            raw.replace(',', "").replace(' ', "")
        }
    } else if has_dot {
        let trailing = trailing_group_len(raw, '.');
        if is_turkish_like(preferred_currency) && trailing == 3 {
            raw.replace('.', "").replace(' ', "")
        } else {
            raw.to_string()
        }
    } else {
        raw.replace(' ', "")
    };

    let value: f64 = canonical.parse().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Strip every occurrence of `thousands_sep` (and whitespace), keep
/// `decimal_sep` as the decimal point, then canonicalize to `.`.
fn strip_then_decimal(raw: &str, thousands_sep: char, decimal_sep: char) -> String {
    let without_thousands: String = raw.chars().filter(|&c| c != thousands_sep && c != ' ').collect();
    without_thousands.replace(decimal_sep, ".")
}

/// Digits after the last occurrence of `sep`.
fn trailing_group_len(raw: &str, sep: char) -> usize {
    match raw.rfind(sep) {
        Some(idx) => raw[idx + sep.len_utf8()..].chars().filter(|c| c.is_ascii_digit()).count(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_numeric_substring() {
        assert_eq!(extract_numeric_substring("was $29.99 now $19.99"), Some("29.99".to_string()));
    }

    #[test]
    fn counts_multiple_numbers() {
        assert_eq!(count_numeric_substrings("SKU 12345, size 42, weight 1.2kg"), 3);
    }

    #[test]
    fn dot_and_comma_later_one_wins_as_decimal() {
        // US style: thousands dot-separated... actually 1,299.90 - comma is thousands, dot decimal
        assert_eq!(normalize_number("1,299.90", "USD"), Some(1299.90));
        // European style: 1.299,90 - dot is thousands, comma decimal
        assert_eq!(normalize_number("1.299,90", "TRY"), Some(1299.90));
    }

    #[test]
    fn comma_only_turkish_is_decimal() {
        assert_eq!(normalize_number("1299,90", "TRY"), Some(1299.90));
    }

    #[test]
    fn comma_only_two_trailing_digits_is_decimal_regardless_of_currency() {
        assert_eq!(normalize_number("19,99", "USD"), Some(19.99));
    }

    #[test]
    fn comma_only_three_trailing_digits_non_turkish_is_thousands() {
        assert_eq!(normalize_number("1,299", "USD"), Some(1299.0));
    }

    #[test]
    fn dot_only_turkish_three_digit_group_is_thousands() {
        assert_eq!(normalize_number("1.299", "TRY"), Some(1299.0));
    }

    #[test]
    fn dot_only_non_turkish_is_decimal() {
        assert_eq!(normalize_number("19.99", "USD"), Some(19.99));
    }

    #[test]
    fn negative_or_zero_rejected() {
        assert_eq!(normalize_number("0", "USD"), None);
        assert_eq!(normalize_number("-5.00", "USD"), None);
    }
}
