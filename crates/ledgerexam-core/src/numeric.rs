//! Lenient number parsing for free-form answer text.

/// Parse the leading decimal number of `input`.
///
/// Leading whitespace is skipped and the longest valid prefix is used, so
/// `"500 yen"` parses as `500`. A signed `Infinity` prefix is accepted.
/// Returns `None` when no digits can be read; callers treat that as an answer
/// that never equals any key, including `0`.
pub fn parse_number(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Exact comparison of raw answer text against a key value.
pub fn matches_value(input: &str, expected: f64) -> bool {
    parse_number(input).is_some_and(|v| v == expected)
}

/// Normalize typed numeric input before it is recorded.
///
/// Full-width digits become ASCII, thousands separators, yen signs and
/// whitespace are dropped, and `△` (the bookkeeping negative marker) becomes
/// a minus sign.
pub fn normalize_input(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32),
            ',' | '，' | '¥' | '￥' => None,
            '△' => Some('-'),
            c if c.is_whitespace() => None,
            c => Some(c),
        })
        .collect()
}
