//! Legality patterns and escape substitution for generated text.

use regex::Regex;
use std::collections::HashMap;

/// Identifier grammar used when a dictionary does not supply one.
pub const DEFAULT_NAMING_PATTERN: &str = "[a-zA-Z]+[0-9a-zA-Z_]*";

/// A pattern that text must match in full.
#[derive(Debug, Clone)]
pub struct LegalPattern {
    source: String,
    regex: Regex,
}

impl LegalPattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Keep each character only if the text kept so far plus that character
    /// is still legal.
    pub fn strip(&self, text: &str) -> String {
        if self.matches(text) {
            return text.to_string();
        }
        let mut kept = String::with_capacity(text.len());
        for c in text.chars() {
            kept.push(c);
            if !self.matches(&kept) {
                kept.pop();
            }
        }
        kept
    }

    /// Drop leading characters that cannot start a legal name on their own.
    pub fn strip_leading(&self, text: &str) -> String {
        let mut buf = [0u8; 4];
        let start = text
            .char_indices()
            .find(|(_, c)| self.matches(c.encode_utf8(&mut buf)))
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        text[start..].to_string()
    }
}

/// Substitute escapes and drop characters the per-character pattern rejects.
///
/// `escapes` maps a sequence to the text inserted in front of it. Sequences
/// are matched longest first and emitted whole, so a stripped character can
/// never break an escape apart.
pub fn escape_value(
    value: &str,
    escapes: &HashMap<String, String>,
    legal_chars: Option<&LegalPattern>,
) -> String {
    let mut keys: Vec<(&str, &str)> = escapes
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, prefix)| (key.as_str(), prefix.as_str()))
        .collect();
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    'outer: while let Some(c) = rest.chars().next() {
        for (key, prefix) in &keys {
            if rest.starts_with(key) {
                out.push_str(prefix);
                out.push_str(key);
                rest = &rest[key.len()..];
                continue 'outer;
            }
        }
        let mut buf = [0u8; 4];
        if legal_chars.map_or(true, |legal| legal.matches(c.encode_utf8(&mut buf))) {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Upper-case base-36 rendering used for collision suffixes.
pub fn radix36(mut value: usize) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[value % 36] as char);
        value /= 36;
    }
    digits.iter().rev().collect()
}
