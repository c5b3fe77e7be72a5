//! XML name validation and file-name sanitizing
//!
//! Element names come straight from spreadsheet text, so every header and
//! the root element name are checked against the XML 1.0 NCName production
//! before anything is written. File stems come from cell values and are
//! reduced to something that is safe to use as a single path component.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

// NameStartChar from XML 1.0 (5th edition) minus ':'
const NAME_START: &str = r"A-Z_a-z\x{C0}-\x{D6}\x{D8}-\x{F6}\x{F8}-\x{2FF}\x{370}-\x{37D}\x{37F}-\x{1FFF}\x{200C}-\x{200D}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}\x{10000}-\x{EFFFF}";

// NameChar additions
const NAME_EXTRA: &str = r"\-\.0-9\x{B7}\x{300}-\x{36F}\x{203F}-\x{2040}";

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^[{NAME_START}][{NAME_START}{NAME_EXTRA}]*$"))
        .expect("NCName pattern is valid")
});

static NAME_START_CHAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^[{NAME_START}]$")).expect("NameStartChar pattern is valid")
});

static NAME_CHAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^[{NAME_START}{NAME_EXTRA}]$")).expect("NameChar pattern is valid")
});

/// Characters that never survive into a file name
const UNSAFE_FILE_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

/// Device names Windows refuses as file stems
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Explain why `name` is not an NCName, or `None` if it is one
pub fn ncname_violation(name: &str) -> Option<String> {
    if is_valid_ncname(name) {
        return None;
    }

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Some("name is empty".to_string());
    };

    if let Some(c) = name.chars().find(|c| c.is_whitespace()) {
        return Some(format!("contains whitespace ({:?})", c));
    }
    if name.contains(':') {
        return Some("contains ':'".to_string());
    }
    if !NAME_START_CHAR.is_match(first.encode_utf8(&mut [0; 4])) {
        return Some(format!("cannot start with {:?}", first));
    }
    chars
        .find(|c| !NAME_CHAR.is_match(c.encode_utf8(&mut [0; 4])))
        .map(|c| format!("contains the character {:?}", c))
        .or_else(|| Some("not a valid XML name".to_string()))
}

/// Split a header into an optional prefix and a local name.
///
/// Only the first ':' separates; anything after it belongs to the local
/// name (and will fail NCName validation if it contains another ':').
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

/// Character written in place of anything XML 1.0 cannot carry
pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Whether `c` matches the XML 1.0 `Char` production
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Replace every character outside the XML `Char` production with
/// `REPLACEMENT_CHAR`, borrowing when nothing needs replacing
pub fn xml_safe_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(
            text.chars()
                .map(|c| if is_xml_char(c) { c } else { REPLACEMENT_CHAR })
                .collect(),
        )
    }
}

/// Reduce a cell value to a single safe path component.
///
/// Separators, control characters and characters Windows rejects become
/// `_` (one per run), surrounding dots and whitespace are trimmed. Returns
/// `None` when nothing usable remains or the stem is a reserved device name.
pub fn sanitize_file_stem(value: &str) -> Option<String> {
    let mut stem = String::with_capacity(value.len());
    let mut replaced = false;
    for c in value.chars() {
        if c.is_control() || UNSAFE_FILE_CHARS.contains(&c) {
            if !replaced {
                stem.push('_');
            }
            replaced = true;
        } else {
            stem.push(c);
            replaced = false;
        }
    }

    let stem = stem.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if stem.chars().all(|c| c == '_') {
        return None;
    }

    let base = stem.split('.').next().unwrap_or(stem).trim_end();
    if RESERVED_STEMS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(base))
    {
        return None;
    }

    Some(stem.to_string())
}
