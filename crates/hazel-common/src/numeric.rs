//! Numeric helpers for array-key coercion.

/// Convert a double to the integer the modeled runtime would use as an array
/// key. Mirrors the runtime's cast: NaN goes to zero, out-of-range values
/// saturate through wraparound of the underlying cast.
pub fn double_to_int64(d: f64) -> i64 {
    if d.is_nan() {
        return 0;
    }
    if d >= i64::MAX as f64 {
        return i64::MAX;
    }
    if d <= i64::MIN as f64 {
        return i64::MIN;
    }
    d as i64
}

/// If `s` is the canonical decimal spelling of an `i64`, return that integer.
///
/// The modeled runtime silently rewrites such string keys to integer keys on
/// plain arrays, so "10" and 10 address the same element, while "010", "1.0"
/// and " 1" do not.
pub fn strictly_integer(s: &str) -> Option<i64> {
    if s.is_empty() || s.len() > 20 {
        return None;
    }
    let bytes = s.as_bytes();
    let (digits, neg) = if bytes[0] == b'-' {
        (&bytes[1..], true)
    } else {
        (bytes, false)
    };
    if digits.is_empty() || !digits.iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // No leading zeros unless the value is exactly "0".
    if digits[0] == b'0' && digits.len() > 1 {
        return None;
    }
    if neg && digits == b"0" {
        return None;
    }
    let n: i64 = s.parse().ok()?;
    // Round-trip to reject values with non-canonical spelling (overflow is
    // already rejected by parse).
    if n.to_string() == s {
        Some(n)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_to_int64_edges() {
        assert_eq!(double_to_int64(0.0), 0);
        assert_eq!(double_to_int64(-1.5), -1);
        assert_eq!(double_to_int64(f64::NAN), 0);
        assert_eq!(double_to_int64(1e300), i64::MAX);
        assert_eq!(double_to_int64(-1e300), i64::MIN);
    }

    #[test]
    fn strictly_integer_accepts_canonical() {
        assert_eq!(strictly_integer("0"), Some(0));
        assert_eq!(strictly_integer("42"), Some(42));
        assert_eq!(strictly_integer("-7"), Some(-7));
        assert_eq!(
            strictly_integer("9223372036854775807"),
            Some(i64::MAX)
        );
    }

    #[test]
    fn strictly_integer_rejects_non_canonical() {
        assert_eq!(strictly_integer(""), None);
        assert_eq!(strictly_integer("010"), None);
        assert_eq!(strictly_integer("-0"), None);
        assert_eq!(strictly_integer("1.0"), None);
        assert_eq!(strictly_integer(" 1"), None);
        assert_eq!(strictly_integer("9223372036854775808"), None);
    }
}
