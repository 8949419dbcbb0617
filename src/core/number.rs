// src/core/number.rs
// Count normalization: "1.7M" -> 1_700_000, "1,234" -> 1_234.

/// Parse a count as shown on a page into its canonical integer.
///
/// Accepts thousands separators (`,`), an optional decimal part, and an optional
/// `K`/`M`/`B` suffix (either case). Decimal magnitudes are truncated after the
/// multiplication, so `"1.2345K"` is `1234`. The arithmetic is exact decimal;
/// no float rounding creeps in.
pub fn parse_count(raw: &str) -> Option<u64> {
    let s = raw.trim();
    let (digits, mult): (&str, u128) = match s.chars().last()? {
        'K' | 'k' => (&s[..s.len() - 1], 1_000),
        'M' | 'm' => (&s[..s.len() - 1], 1_000_000),
        'B' | 'b' => (&s[..s.len() - 1], 1_000_000_000),
        _ => (s, 1),
    };
    let digits: String = digits.trim_end().chars().filter(|&c| c != ',').collect();

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits.as_str(), ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // More fractional digits than the multiplier can use only add noise.
    let frac_part = &frac_part[..frac_part.len().min(9)];

    let int_val: u128 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
    let frac_val: u128 = if frac_part.is_empty() { 0 } else { frac_part.parse().ok()? };
    let scale = 10u128.pow(frac_part.len() as u32);

    let total = int_val.checked_mul(mult)?.checked_add(frac_val * mult / scale)?;
    u64::try_from(total).ok()
}

/// Thousands-grouped rendering used for `*_raw` columns and summaries.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
