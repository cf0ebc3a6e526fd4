//! Parser and serializer for the `var searchData=` fragment format.
//!
//! The format is a JavaScript array literal, not JSON: strings are
//! single-quoted with `\'` and `\\` escapes, and label text carries HTML
//! entities (`&amp;`, `&lt;`, ...) pre-escaped by the generator for direct
//! injection into the results dropdown. Parsing decodes both layers;
//! serialization re-encodes them, so `parse(serialize(t)) == t`.
//!
//! Grammar:
//!
//! ```text
//! file    := ws [ "var" ident "=" ] table ws [ ";" ] ws EOF
//! table   := "[" [ entry { "," entry } ] "]"
//! entry   := "[" string "," "[" string { "," tuple } "]" "]"
//! tuple   := "[" string "," integer "," string "]"
//! ```
//!
//! An entry's inner array is the display label followed by its target
//! tuples as siblings; at least one tuple must follow the label.

use crate::error::MalformedIndex;
use crate::model::{IndexEntry, Target, TargetUrl};

/// Character-level cursor over the source text.
///
/// Tracks a byte offset so syntax errors can point at the offending input.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn err(&self, message: impl Into<String>) -> MalformedIndex {
        MalformedIndex::syntax(self.pos, message)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), MalformedIndex> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.err(format!("expected '{c}'")))
        }
    }

    fn at_end(&self) -> bool {
        self.pos == self.src.len()
    }

    /// Parses a single-quoted string, resolving JS escapes and HTML entities.
    fn string(&mut self) -> Result<String, MalformedIndex> {
        if self.peek() != Some('\'') {
            return Err(self.err("expected string"));
        }
        self.bump();

        let mut raw = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.err("unterminated string"));
            };
            match c {
                '\'' => break,
                '\\' => match self.bump() {
                    Some('\'') => raw.push('\''),
                    Some('\\') => raw.push('\\'),
                    Some(other) => {
                        return Err(self.err(format!("unsupported escape '\\{other}'")));
                    }
                    None => return Err(self.err("unterminated string")),
                },
                '\n' | '\r' => return Err(self.err("unterminated string")),
                other => raw.push(other),
            }
        }
        Ok(decode_entities(&raw))
    }

    /// Parses a non-negative decimal integer (the target group id).
    fn integer(&mut self) -> Result<u32, MalformedIndex> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.err("expected integer"));
        }
        self.src[start..self.pos]
            .parse()
            .map_err(|_| MalformedIndex::syntax(start, "integer out of range"))
    }
}

/// Parses a whole fragment into its entries.
///
/// All-or-nothing: any grammar violation aborts the parse with no partial
/// output. Duplicate-key policy is applied later, when the entries are
/// assembled into a [`crate::SearchIndex`].
pub(crate) fn parse_table(src: &str) -> Result<Vec<IndexEntry>, MalformedIndex> {
    let mut cur = Cursor { src, pos: 0 };
    cur.skip_ws();
    skip_header(&mut cur)?;
    cur.skip_ws();

    cur.expect('[')?;
    let mut entries = Vec::new();
    cur.skip_ws();
    if !cur.eat(']') {
        loop {
            entries.push(parse_entry(&mut cur)?);
            cur.skip_ws();
            if cur.eat(',') {
                continue;
            }
            cur.expect(']')?;
            break;
        }
    }

    cur.skip_ws();
    cur.eat(';');
    cur.skip_ws();
    if !cur.at_end() {
        return Err(cur.err("trailing data after table"));
    }
    Ok(entries)
}

/// Consumes an optional `var <ident>=` prefix so both the bare array and
/// the generator's full `var searchData=` form load.
fn skip_header(cur: &mut Cursor<'_>) -> Result<(), MalformedIndex> {
    if !cur.src[cur.pos..].starts_with("var") {
        return Ok(());
    }
    cur.pos += 3;
    if !cur.peek().is_some_and(char::is_whitespace) {
        return Err(cur.err("expected whitespace after 'var'"));
    }
    cur.skip_ws();
    while cur
        .peek()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        cur.bump();
    }
    cur.skip_ws();
    cur.expect('=')
}

fn parse_entry(cur: &mut Cursor<'_>) -> Result<IndexEntry, MalformedIndex> {
    cur.skip_ws();
    cur.expect('[')?;
    cur.skip_ws();
    let key = cur.string()?;
    cur.skip_ws();
    cur.expect(',')?;
    cur.skip_ws();

    cur.expect('[')?;
    cur.skip_ws();
    let display = cur.string()?;
    let mut targets = Vec::new();
    loop {
        cur.skip_ws();
        if cur.eat(',') {
            targets.push(parse_target(cur)?);
            continue;
        }
        cur.expect(']')?;
        break;
    }

    cur.skip_ws();
    cur.expect(']')?;
    if targets.is_empty() {
        return Err(MalformedIndex::EmptyTargets { key });
    }
    Ok(IndexEntry {
        key,
        display,
        targets,
    })
}

fn parse_target(cur: &mut Cursor<'_>) -> Result<Target, MalformedIndex> {
    cur.skip_ws();
    cur.expect('[')?;
    cur.skip_ws();
    let url = cur.string()?;
    cur.skip_ws();
    cur.expect(',')?;
    cur.skip_ws();
    let group_id = cur.integer()?;
    cur.skip_ws();
    cur.expect(',')?;
    cur.skip_ws();
    let label = cur.string()?;
    cur.skip_ws();
    cur.expect(']')?;
    Ok(Target {
        url: TargetUrl::parse(&url),
        group_id,
        label,
    })
}

/// Serializes entries back to the generator's on-disk form.
pub(crate) fn serialize_table(entries: &[IndexEntry]) -> String {
    let mut out = String::from("var searchData=\n[\n");
    for (i, entry) in entries.iter().enumerate() {
        out.push_str("  [");
        push_string(&mut out, &entry.key);
        out.push_str(",[");
        push_string(&mut out, &entry.display);
        for target in &entry.targets {
            out.push_str(",[");
            push_string(&mut out, &target.url.to_string());
            out.push(',');
            out.push_str(&target.group_id.to_string());
            out.push(',');
            push_string(&mut out, &target.label);
            out.push(']');
        }
        out.push_str("]]");
        if i + 1 < entries.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("];\n");
    out
}

/// Writes a single-quoted string with JS escapes and HTML entities applied.
///
/// Line breaks become numeric entities: the grammar forbids raw newlines
/// inside strings, so this keeps serialized tables parseable.
fn push_string(out: &mut String, text: &str) {
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            other => out.push(other),
        }
    }
    out.push('\'');
}

/// Decodes the HTML entities the generator uses in label text.
///
/// Unknown entities pass through literally; only text produced by
/// [`push_string`] is guaranteed to round-trip.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        let Some(end) = rest.find(';') else {
            break;
        };
        let decoded = match &rest[1..end] {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" | "#39" => Some('\''),
            entity => entity
                .strip_prefix('#')
                .and_then(|digits| digits.parse::<u32>().ok())
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
