#![forbid(unsafe_code)]

//! Token grammar codec for the persisted history log.
//!
//! Every record in the history file is built from delimited tokens:
//!
//! ```text
//! valuated-token   ::= "<" id "=" escaped-value ">"
//! unvaluated-token ::= "<" id ">"
//! ```
//!
//! The four control characters (`<`, `>`, `=`, `\`) are escaped inside
//! values by a preceding `\`. The escape character is escaped first so a
//! freshly inserted escape is never re-processed.
//!
//! # Invariants
//!
//! 1. `unescape(escape(s)) == s` for every `s` free of reserved sequences.
//! 2. A raw (unescaped) `<` or `=` never occurs inside an encoded value,
//!    so scanning for a literal `<id=` opener always lands on a real token
//!    boundary.
//! 3. A value containing a [`RESERVED_SEQUENCES`] member verbatim is
//!    rejected before any output is produced; encoding never emits a
//!    partial token.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Opens a token.
pub const TOKEN_BEGIN: char = '<';
/// Terminates a token.
pub const TOKEN_END: char = '>';
/// Separates a token id from its value.
pub const TOKEN_ASSIGN: char = '=';
/// Escapes a control character inside a value.
pub const TOKEN_ESCAPE: char = '\\';

/// Opens a serialized command group.
pub const BEGIN_COMMAND_GROUP: &str = "BEGIN_COMMAND_GROUP";
/// Terminates a serialized command group.
pub const END_COMMAND_GROUP: &str = "END_COMMAND_GROUP";
/// Carries the group's human-readable comment.
pub const GROUP_COMMENT: &str = "GROUP_COMMENT";
/// Opens one serialized command inside a group.
pub const BEGIN_COMMAND: &str = "BEGIN_COMMAND";
/// Terminates one serialized command inside a group.
pub const END_COMMAND: &str = "END_COMMAND";
/// Carries the registry tag selecting the command constructor.
pub const COMMAND_CLASS: &str = "COMMAND_CLASS";
/// Legacy companion of [`COMMAND_CLASS`]; still reserved on the wire.
pub const COMMAND_MODULE: &str = "COMMAND_MODULE";

/// Substrings that must never occur verbatim inside an encoded value.
///
/// Group reconstruction scans records for these identifiers as literal
/// text, so a value smuggling one in would corrupt the surrounding record.
pub const RESERVED_SEQUENCES: [&str; 7] = [
    BEGIN_COMMAND_GROUP,
    END_COMMAND_GROUP,
    GROUP_COMMENT,
    BEGIN_COMMAND,
    END_COMMAND,
    COMMAND_CLASS,
    COMMAND_MODULE,
];

/// Failure to encode a value into the token grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The value contains a reserved identifier verbatim.
    ReservedSequence {
        /// The reserved identifier that was found.
        sequence: &'static str,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedSequence { sequence } => {
                write!(f, "value contains reserved sequence '{sequence}'")
            }
        }
    }
}

impl Error for EncodeError {}

/// Failure to read a value back out of the token grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No token with the requested id exists in the text.
    TokenNotFound(String),
    /// A token opener was found but no unescaped terminator follows.
    UnterminatedToken(String),
    /// The text ends in the middle of an escape pair.
    TruncatedEscape,
    /// The token was present but its value failed domain parsing.
    InvalidValue {
        /// Id of the offending token.
        token: String,
        /// The decoded value that failed to parse.
        value: String,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenNotFound(id) => write!(f, "token '{id}' not found"),
            Self::UnterminatedToken(id) => write!(f, "token '{id}' has no terminator"),
            Self::TruncatedEscape => write!(f, "text ends inside an escape pair"),
            Self::InvalidValue { token, value } => {
                write!(f, "token '{token}' carries invalid value '{value}'")
            }
        }
    }
}

impl Error for DecodeError {}

/// Escape a value for embedding in a valuated token.
///
/// Fails fast if the value contains any reserved identifier; no partial
/// output is ever produced. The single pass handles the escape character
/// together with the other control characters, so an escape inserted by
/// the pass itself is never revisited.
pub fn escape(value: &str) -> Result<String, EncodeError> {
    for sequence in RESERVED_SEQUENCES {
        if value.contains(sequence) {
            return Err(EncodeError::ReservedSequence { sequence });
        }
    }

    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, TOKEN_ESCAPE | TOKEN_BEGIN | TOKEN_END | TOKEN_ASSIGN) {
            out.push(TOKEN_ESCAPE);
        }
        out.push(ch);
    }
    Ok(out)
}

/// Reverse [`escape`]: drop each escape character and keep what follows it.
pub fn unescape(escaped: &str) -> Result<String, DecodeError> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(ch) = chars.next() {
        if ch == TOKEN_ESCAPE {
            match chars.next() {
                Some(next) => out.push(next),
                None => return Err(DecodeError::TruncatedEscape),
            }
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

/// Render an unvaluated token: `<id>`.
#[must_use]
pub fn tokenize(id: &str) -> String {
    format!("{TOKEN_BEGIN}{id}{TOKEN_END}")
}

/// Render a valuated token: `<id=escaped-value>`.
pub fn tokenize_value(id: &str, value: &str) -> Result<String, EncodeError> {
    Ok(format!(
        "{TOKEN_BEGIN}{id}{TOKEN_ASSIGN}{}{TOKEN_END}",
        escape(value)?
    ))
}

/// Check whether the unvaluated token `<id>` occurs in `text`.
#[must_use]
pub fn has_token(id: &str, text: &str) -> bool {
    text.contains(&tokenize(id))
}

/// Extract the value of the valuated token `<id=...>` from `text`.
///
/// The terminator search walks the text with an explicit escape state: an
/// escaped `>` is data, and a doubled escape disarms itself so the
/// character after the pair is read normally. Because encoded values never
/// contain a raw `<` or `=`, the substring search for the opener cannot
/// match inside another token's value.
pub fn detokenize(id: &str, text: &str) -> Result<String, DecodeError> {
    let opener = format!("{TOKEN_BEGIN}{id}{TOKEN_ASSIGN}");
    let start = text
        .find(&opener)
        .ok_or_else(|| DecodeError::TokenNotFound(id.to_string()))?
        + opener.len();
    let body = &text[start..];

    let mut escaped = false;
    for (i, ch) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            TOKEN_ESCAPE => escaped = true,
            TOKEN_END => return unescape(&body[..i]),
            _ => {}
        }
    }
    Err(DecodeError::UnterminatedToken(id.to_string()))
}

/// [`detokenize`] followed by `FromStr` parsing of the value.
///
/// Used by command payloads for numeric and boolean fields.
pub fn detokenize_parse<T: FromStr>(id: &str, text: &str) -> Result<T, DecodeError> {
    let value = detokenize(id, text)?;
    value.parse().map_err(|_| DecodeError::InvalidValue {
        token: id.to_string(),
        value,
    })
}
