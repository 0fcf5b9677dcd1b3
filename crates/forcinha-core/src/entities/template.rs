//! Nickname templates
//!
//! Templates use `$name` / `${name}` placeholders (`$$` is a literal dollar).
//! Known placeholders are `character_name` and `corporation_ticker`. Rendering
//! never fails: unknown placeholders and missing values become empty strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder fields understood by [`NicknameTemplate`]
#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    CharacterName,
    CorporationTicker,
    Unknown,
}

impl Field {
    fn from_name(name: &str) -> Self {
        match name {
            "character_name" => Self::CharacterName,
            "corporation_ticker" => Self::CorporationTicker,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Field),
}

/// Values substituted into a template
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateValues<'a> {
    pub character_name: Option<&'a str>,
    pub corporation_ticker: Option<&'a str>,
}

/// A parsed nickname template
#[derive(Clone, PartialEq, Eq)]
pub struct NicknameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl NicknameTemplate {
    /// Parse a template string. Parsing is total: malformed placeholders are
    /// kept as literal text.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = parse_segments(&source);
        Self { source, segments }
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render the template with the given values
    pub fn render(&self, values: TemplateValues<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(Field::CharacterName) => {
                    out.push_str(values.character_name.unwrap_or_default());
                }
                Segment::Placeholder(Field::CorporationTicker) => {
                    out.push_str(values.corporation_ticker.unwrap_or_default());
                }
                Segment::Placeholder(Field::Unknown) => {}
            }
        }
        out
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

fn parse_segments(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            literal.push(c);
            continue;
        }

        match chars.peek().copied() {
            Some((_, '$')) => {
                chars.next();
                literal.push('$');
            }
            Some((start, '{')) => {
                let rest = &source[start + 1..];
                match rest.find('}') {
                    Some(end)
                        if !rest[..end].is_empty()
                            && rest[..end].starts_with(is_ident_start)
                            && rest[..end].chars().all(is_ident_continue) =>
                    {
                        flush_literal(&mut segments, &mut literal);
                        segments.push(Segment::Placeholder(Field::from_name(&rest[..end])));
                        // Skip "{name}"
                        for _ in 0..rest[..=end].chars().count() + 1 {
                            chars.next();
                        }
                    }
                    _ => literal.push('$'),
                }
            }
            Some((start, next)) if is_ident_start(next) => {
                let mut end = start;
                while let Some(&(idx, ch)) = chars.peek() {
                    if !is_ident_continue(ch) {
                        break;
                    }
                    end = idx + ch.len_utf8();
                    chars.next();
                }
                flush_literal(&mut segments, &mut literal);
                segments.push(Segment::Placeholder(Field::from_name(&source[start..end])));
            }
            _ => literal.push('$'),
        }
    }

    flush_literal(&mut segments, &mut literal);
    segments
}

fn flush_literal(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

impl fmt::Debug for NicknameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NicknameTemplate").field(&self.source).finish()
    }
}

impl fmt::Display for NicknameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<&str> for NicknameTemplate {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl Serialize for NicknameTemplate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for NicknameTemplate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::parse)
    }
}
