//! Lenient extraction of a JSON object embedded in free-text oracle replies.

use serde::de::DeserializeOwned;

/// Outcome of parsing an oracle reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    Parsed(T),
    /// No brace-delimited region of the reply parsed as `T`; carries the raw text.
    Malformed(String),
}

impl<T> Reply<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Malformed(_) => None,
        }
    }
}

/// Parse the first balanced `{...}` region of `text` that deserializes as `T`.
///
/// Regions are tried in order of their opening brace, so prose before the
/// payload, markdown fences around it and trailing commentary are ignored.
pub fn extract_payload<T: DeserializeOwned>(text: &str) -> Reply<T> {
    for (start, end) in brace_regions(text.as_bytes()) {
        if let Ok(value) = serde_json::from_str::<T>(&text[start..=end]) {
            return Reply::Parsed(value);
        }
    }
    Reply::Malformed(text.to_string())
}

/// Every balanced `{`/`}` pair as `(open, close)`, sorted by `open`.
///
/// One pass with a stack of open braces. Quotes only start a string inside
/// an open brace, so stray quotes in surrounding prose are harmless.
/// Unclosed braces produce no region.
fn brace_regions(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut regions = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (index, byte) in bytes.iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(index),
            b'}' => {
                if let Some(start) = open.pop() {
                    regions.push((start, index));
                }
            }
            _ => {}
        }
    }

    regions.sort_unstable_by_key(|(start, _)| *start);
    regions
}
