// src/core/html.rs
// Tag-block slicing over raw markup. Deliberately naive: case-insensitive on ASCII
// tag names, no nesting awareness, no DOM.

pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// All `<open ...>...</close>` blocks in document order, lowercasing the document once.
pub fn tag_blocks_ci<'a>(s: &'a str, open: &str, close: &str) -> Vec<&'a str> {
    let lc = to_lower(s);
    let (ol, cl) = (to_lower(open), to_lower(close));
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some((b_s, b_e)) = next_tag_block_in(s, &lc, &ol, &cl, pos) {
        out.push(&s[b_s..b_e]);
        pos = b_e;
    }
    out
}

// `lc` must be `to_lower(s)`; ASCII lowercasing keeps byte offsets aligned.
fn next_tag_block_in(s: &str, lc: &str, ol: &str, cl: &str, from: usize) -> Option<(usize, usize)> {
    let start = lc.get(from..)?.find(ol)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(cl)?;
    let end = open_end + end_rel + cl.len();
    Some((start, end))
}

pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    super::sanitize::normalize_ws(&out)
}

/// Visible text of a markup fragment, with entities decoded.
pub fn clean_text(s: &str) -> String {
    strip_tags(super::sanitize::normalize_entities(s))
}
