//! Content-Type header parsing.
//!
//! # Responsibilities
//! - Parse `type "/" subtype *( OWS ";" OWS parameter )` header values
//! - Normalize type, subtype, and parameter names to lowercase
//! - Unescape quoted-string parameter values
//!
//! # Design Decisions
//! - Total parser: malformed input maps to the empty/invalid flags, never
//!   to an error or panic
//! - An unterminated quoted string yields the literal value
//!   "invalid quoted string" for that parameter; producers emitting
//!   slightly broken headers keep working and consumers see a stable
//!   sentinel
//! - Duplicate parameter names overwrite in place (last-wins, first
//!   occurrence keeps its position in the iteration order)

/// Value assigned to a parameter whose quoted string never closes.
const INVALID_QUOTED_STRING: &str = "invalid quoted string";

/// Placeholder some producers emit instead of omitting the header.
const UNDEFINED_PLACEHOLDER: &str = "undefined";

/// Insertion-ordered map of parameter names to values.
///
/// Names are already lowercased by the parser. Inserting an existing name
/// replaces the value without moving the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, String)>,
}

impl Parameters {
    fn insert(&mut self, name: String, value: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Look up a parameter by its lowercase name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parsed structural representation of a `Content-Type`-style value.
///
/// Constructed once via [`MediaType::parse`], immutable thereafter.
/// `is_empty` is set for absent/placeholder input and for structurally
/// malformed values; `is_valid` mirrors structural well-formedness
/// independent of parameter-level defects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    empty: bool,
    valid: bool,
    type_: String,
    subtype: String,
    essence: String,
    parameters: Parameters,
}

impl MediaType {
    /// Parse a raw header value. Total: never fails, never panics.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == UNDEFINED_PLACEHOLDER {
            return Self::empty();
        }

        // The media type proper runs up to the first ';'.
        let (essence_part, rest) = match trimmed.find(';') {
            Some(idx) => (&trimmed[..idx], Some(&trimmed[idx + 1..])),
            None => (trimmed, None),
        };

        let essence_part = essence_part.trim();
        let Some((type_part, subtype_part)) = essence_part.split_once('/') else {
            return Self::empty();
        };
        if !is_token(type_part) || !is_token(subtype_part) {
            return Self::empty();
        }

        let type_ = type_part.to_ascii_lowercase();
        let subtype = subtype_part.to_ascii_lowercase();
        let essence = format!("{type_}/{subtype}");

        let mut parameters = Parameters::default();
        if let Some(rest) = rest {
            parse_parameters(rest, &mut parameters);
        }

        Self {
            empty: false,
            valid: true,
            type_,
            subtype,
            essence,
            parameters,
        }
    }

    fn empty() -> Self {
        Self {
            empty: true,
            valid: false,
            type_: String::new(),
            subtype: String::new(),
            essence: String::new(),
            parameters: Parameters::default(),
        }
    }

    /// True for absent/placeholder input and structural parse failures.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// True when `type "/" subtype` was structurally well-formed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Lowercased primary type.
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// Lowercased subtype.
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// `type "/" subtype`, lowercased.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Parameters in insertion order.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

/// Walk the `;`-separated parameter segments after the essence.
///
/// A quoted value may contain `;`, so this is a cursor over the whole
/// remainder rather than a naive split.
fn parse_parameters(rest: &str, parameters: &mut Parameters) {
    let mut input = rest;
    loop {
        // Skip whitespace and empty segments.
        input = input.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ';');
        if input.is_empty() {
            return;
        }

        let Some(eq) = input.find(['=', ';']).filter(|&i| input.as_bytes()[i] == b'=')
        else {
            // Segment without '=': skip it.
            input = match input.find(';') {
                Some(idx) => &input[idx + 1..],
                None => return,
            };
            continue;
        };

        let name = input[..eq].trim();
        let name_ok = is_token(name);
        let name = name.to_ascii_lowercase();
        let value = input[eq + 1..].trim_start();

        if let Some(after_quote) = value.strip_prefix('"') {
            match scan_quoted(after_quote) {
                Some((unescaped, consumed)) => {
                    if name_ok {
                        parameters.insert(name, unescaped);
                    }
                    // Anything between the closing quote and the next ';'
                    // is junk and dropped with the segment.
                    let after = &after_quote[consumed..];
                    input = match after.find(';') {
                        Some(idx) => &after[idx + 1..],
                        None => return,
                    };
                }
                None => {
                    // Unterminated quote: the entire malformed remainder
                    // collapses into a sentinel value. Compatibility
                    // behavior, preserved exactly.
                    if name_ok {
                        parameters.insert(name, INVALID_QUOTED_STRING.to_string());
                    }
                    return;
                }
            }
        } else {
            let (segment_value, next) = match value.find(';') {
                Some(idx) => (&value[..idx], &value[idx + 1..]),
                None => (value, ""),
            };
            let segment_value = segment_value.trim();
            if name_ok && is_token(segment_value) {
                parameters.insert(name, segment_value.to_string());
            }
            if next.is_empty() {
                return;
            }
            input = next;
        }
    }
}

/// Scan a quoted-string body (opening quote already consumed). Returns the
/// unescaped value and the number of input bytes consumed including the
/// closing quote, or `None` if the quote never closes.
fn scan_quoted(input: &str) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut chars = input.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => out.push(escaped),
                None => return None,
            },
            '"' => return Some((out, idx + 1)),
            _ => out.push(c),
        }
    }
    None
}

/// HTTP token grammar: printable ASCII excluding separators.
fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_tchar)
}

fn is_tchar(b: u8) -> bool {
    matches!(b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
        | b'^' | b'_' | b'`' | b'|' | b'~'
        | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z')
}
