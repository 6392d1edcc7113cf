//! Request and response encodings for alias batches.
//!
//! JSON batches are arrays: identifier strings for assign, lookup and delete,
//! `{ident, alias}` records for put. Everything else is read as text with one
//! entry per line.

use crate::error::{AppError, Result};
use aliases_core::{Def, IdentAlias, Status};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Encoding of a batch request and its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Text,
}

impl Format {
    /// Picks the encoding from the request's `content-type`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let is_json = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));

        if is_json {
            Format::Json
        } else {
            Format::Text
        }
    }
}

pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AppError::Decode(e.to_string()))
}

fn text_lines(body: &[u8]) -> Result<Vec<&str>> {
    let text = std::str::from_utf8(body).map_err(|e| AppError::Decode(e.to_string()))?;
    Ok(text.lines().collect())
}

/// Reads a list of identifiers.
///
/// Text lines are taken verbatim apart from the line terminator.
pub fn parse_idents(format: Format, body: &[u8]) -> Result<Vec<String>> {
    match format {
        Format::Json => decode_json(body),
        Format::Text => Ok(text_lines(body)?.into_iter().map(str::to_string).collect()),
    }
}

#[derive(Deserialize)]
struct PairRecord {
    ident: String,
    #[serde(default)]
    alias: String,
}

/// Reads identifier/alias pairs.
///
/// Text lines split at the first run of whitespace or commas; a line
/// without a separator yields an empty alias.
pub fn parse_pairs(format: Format, body: &[u8]) -> Result<Vec<IdentAlias>> {
    match format {
        Format::Json => {
            let records: Vec<PairRecord> = decode_json(body)?;
            Ok(records
                .into_iter()
                .map(|r| IdentAlias::with_alias(r.ident, r.alias))
                .collect())
        }
        Format::Text => Ok(text_lines(body)?.into_iter().map(split_pair).collect()),
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn split_pair(line: &str) -> IdentAlias {
    let line = line.trim();
    match line.find(is_separator) {
        Some(at) => {
            let (ident, rest) = line.split_at(at);
            IdentAlias::with_alias(ident, rest.trim_start_matches(is_separator))
        }
        None => IdentAlias::with_alias(line, ""),
    }
}

/// Renders a batch result in the request's encoding.
///
/// Text output has one line per entry: `0 <alias>` for a created alias,
/// `1 <alias>` for an existing one and an empty line otherwise.
pub fn render(format: Format, entries: Vec<IdentAlias>) -> Response {
    match format {
        Format::Json => Json(entries).into_response(),
        Format::Text => {
            let mut body = String::new();
            for entry in &entries {
                match entry.status {
                    Some(Status::Created) => {
                        body.push_str("0 ");
                        body.push_str(&entry.alias);
                    }
                    Some(Status::Exists) => {
                        body.push_str("1 ");
                        body.push_str(&entry.alias);
                    }
                    Some(Status::Missing) | None => {}
                }
                body.push('\n');
            }
            ([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
        }
    }
}

/// Partial definition update. Omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DefPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub offset: Option<i64>,
    pub chars: Option<String>,
    pub minlen: Option<usize>,
    pub prefix: Option<String>,
}

impl DefPatch {
    pub fn apply(self, mut def: Def) -> Def {
        if let Some(name) = self.name {
            def.name = name;
        }
        if let Some(kind) = self.kind {
            def.kind = kind;
        }
        if let Some(offset) = self.offset {
            def.offset = offset;
        }
        if let Some(chars) = self.chars {
            def.chars = chars;
        }
        if let Some(minlen) = self.minlen {
            def.minlen = minlen;
        }
        if let Some(prefix) = self.prefix {
            def.prefix = prefix;
        }
        def
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aliases_core::GeneratorKind;
    use axum::http::HeaderValue;

    #[test]
    fn format_follows_content_type() {
        let mut headers = HeaderMap::new();
        assert_eq!(Format::from_headers(&headers), Format::Text);

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert_eq!(Format::from_headers(&headers), Format::Json);

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert_eq!(Format::from_headers(&headers), Format::Text);
    }

    #[test]
    fn text_idents_keep_blank_lines() {
        let idents = parse_idents(Format::Text, b"a\r\n\nb\n").unwrap();
        assert_eq!(idents, ["a", "", "b"]);
    }

    #[test]
    fn text_idents_keep_surrounding_spaces() {
        let idents = parse_idents(Format::Text, b" a\na \na\n").unwrap();
        assert_eq!(idents, [" a", "a ", "a"]);
    }

    #[test]
    fn json_idents() {
        let idents = parse_idents(Format::Json, br#"["a","b"]"#).unwrap();
        assert_eq!(idents, ["a", "b"]);
        assert!(matches!(
            parse_idents(Format::Json, b"{}"),
            Err(AppError::Decode(_))
        ));
    }

    #[test]
    fn text_pairs_split_on_first_separator_run() {
        let pairs = parse_pairs(Format::Text, b"a x\nb ,\t y z\nc,w\nd\n").unwrap();
        let got: Vec<_> = pairs
            .iter()
            .map(|p| (p.ident.as_str(), p.alias.as_str()))
            .collect();
        assert_eq!(got, [("a", "x"), ("b", "y z"), ("c", "w"), ("d", "")]);
    }

    #[test]
    fn json_pairs() {
        let pairs = parse_pairs(Format::Json, br#"[{"ident":"a","alias":"x"},{"ident":"b"}]"#)
            .unwrap();
        assert_eq!(pairs[0], IdentAlias::with_alias("a", "x"));
        assert_eq!(pairs[1], IdentAlias::with_alias("b", ""));
    }

    #[test]
    fn patch_keeps_omitted_fields() {
        let current = Def {
            id: 4,
            offset: 10,
            prefix: "p".to_string(),
            ..Def::new("t", GeneratorKind::Seq)
        };
        let patch: DefPatch = decode_json(br#"{"name":"t2","offset":20}"#).unwrap();

        let updated = patch.apply(current.clone());

        assert_eq!(updated.name, "t2");
        assert_eq!(updated.offset, 20);
        assert_eq!(updated.prefix, "p");
        assert_eq!(updated.kind, current.kind);
        assert_eq!(updated.id, 4);
    }
}
