//! Just enough HTML handling for the forum pages: find an element by class,
//! take its inner markup and flatten it to text.

use regex::{Captures, Regex};
use std::sync::OnceLock;

struct Patterns {
    div_tag: Regex,
    tag: Regex,
    line_break: Regex,
    block_end: Regex,
    entity: Regex,
    href: Regex,
    link_number: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile =
            |pattern: &str| Regex::new(pattern).expect("Invalid regex, this should be fixed at compile time.");
        Patterns {
            div_tag: compile(r"(?i)<(/?)div\b[^>]*>"),
            tag: compile(r"(?s)<[^>]*>"),
            line_break: compile(r"(?i)<br\s*/?>"),
            block_end: compile(r"(?i)</(p|li|h\d)>"),
            entity: compile(r"&(#[xX][0-9a-fA-F]+|#\d+|[a-zA-Z]+);"),
            href: compile(r#"(?i)href\s*=\s*["']([^"']*)["']"#),
            link_number: compile(r"(?is)<a\b[^>]*>\s*(\d+)\s*</a>"),
        }
    })
}

fn opening_tag(tag: &str, class: &str) -> Regex {
    let pattern = format!(
        r#"(?i)<{}\b[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?{}(?:\s[^"']*)?["'][^>]*>"#,
        regex::escape(tag),
        regex::escape(class)
    );
    Regex::new(&pattern).expect("Escaped pattern is always valid.")
}

/// Inner markup of the first `<tag class="... class ...">`, up to its
/// matching close tag. Nested `div`s are balanced.
pub fn inner_html<'a>(html: &'a str, tag: &str, class: &str) -> Option<&'a str> {
    let open = opening_tag(tag, class).find(html)?;
    let rest = &html[open.end()..];

    if !tag.eq_ignore_ascii_case("div") {
        let close = Regex::new(&format!(r"(?i)</{}\s*>", regex::escape(tag))).ok()?;
        let end = close.find(rest)?;
        return Some(&rest[..end.start()]);
    }

    let mut depth = 1usize;
    for captures in patterns().div_tag.captures_iter(rest) {
        let whole = captures.get(0)?;
        if captures[1].is_empty() {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(&rest[..whole.start()]);
            }
        }
    }
    None
}

fn decode_entity(captures: &Captures) -> String {
    let entity = &captures[1];
    let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            "hellip" => Some('…'),
            "rsquo" | "lsquo" => Some('\''),
            "rdquo" | "ldquo" => Some('"'),
            "ndash" | "mdash" => Some('-'),
            _ => None,
        }
    };
    match decoded {
        Some(c) => c.to_string(),
        None => captures[0].to_string(),
    }
}

pub fn decode_entities(text: &str) -> String {
    patterns()
        .entity
        .replace_all(text, |captures: &Captures| decode_entity(captures))
        .into_owned()
}

/// Text content of a markup fragment. Line breaks and paragraph ends become
/// newlines.
pub fn to_text(fragment: &str) -> String {
    let p = patterns();
    let text = p.line_break.replace_all(fragment, "\n");
    let text = p.block_end.replace_all(&text, "\n");
    let text = p.tag.replace_all(&text, "");
    decode_entities(&text)
}

/// Every `href` value, entities decoded.
pub fn hrefs(html: &str) -> Vec<String> {
    patterns()
        .href
        .captures_iter(html)
        .map(|c| decode_entities(&c[1]))
        .collect()
}

/// Largest number used as a link label, e.g. the last page of a pagination bar.
pub fn max_link_number(fragment: &str) -> Option<usize> {
    patterns()
        .link_number
        .captures_iter(fragment)
        .filter_map(|c| c[1].parse::<usize>().ok())
        .max()
}
