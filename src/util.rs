// Parsing and formatting helpers.
//
// Raw rows arrive as loose text, so the loaders lean on these functions to
// turn them into typed values without panicking on bad exports.
use num_format::{Locale, ToFormattedString};

/// Trim a text field, treating blank values as missing.
pub fn clean_text(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    Some(s.to_string())
}

/// Parse a whole, non-negative number.
///
/// - Trims whitespace and strips thousands separators (`"1,200"`).
/// - Accepts integral floats such as `"4.0"`, which JSON exports produce.
/// - Returns `None` for blanks, negatives, fractions and text.
pub fn parse_u64_safe(s: Option<&str>) -> Option<u64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

pub fn parse_u32_safe(s: Option<&str>) -> Option<u32> {
    parse_u64_safe(s).and_then(|v| u32::try_from(v).ok())
}

/// Signed whole number, e.g. a year column. Blank or malformed text is `None`.
pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    clean_text(s).and_then(|v| v.parse().ok())
}

/// Largest head count a single attendance column may carry.
pub const MAX_HEAD_COUNT: u64 = 1_000_000;

/// Head-count column: blank means zero. Unparseable text and counts above
/// [`MAX_HEAD_COUNT`] are errors.
pub fn parse_count(s: Option<&str>) -> Result<u64, String> {
    let Some(v) = clean_text(s) else {
        return Ok(0);
    };
    match parse_u64_safe(Some(&v)) {
        Some(n) if n <= MAX_HEAD_COUNT => Ok(n),
        Some(n) => Err(format!("count {} exceeds {}", n, MAX_HEAD_COUNT)),
        None => Err(format!("invalid count '{}'", v)),
    }
}

pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Counts shown to people get `en` thousands separators: `12,400`.
pub fn format_int(n: impl ToFormattedString) -> String {
    n.to_formatted_string(&Locale::en)
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
