//! Opaque offset cursor carried by clients between page requests.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Errors raised while decoding a client supplied cursor token.
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    /// The token was empty or only whitespace.
    #[error("cursor must not be empty")]
    Empty,
    /// The token is not valid unpadded base64url.
    #[error("cursor is not valid base64url: {source}")]
    Encoding {
        /// Underlying base64 failure.
        #[source]
        source: base64::DecodeError,
    },
    /// The decoded bytes are not a cursor document.
    #[error("cursor payload is malformed: {source}")]
    Payload {
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Position within an ordered collection.
///
/// ## Invariants
/// - The offset counts items already delivered to the caller.
/// - Encoding is stable: the same offset always yields the same token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Cursor {
    offset: u64,
}

impl Cursor {
    /// Cursor pointing at the first item.
    #[must_use]
    pub const fn start() -> Self {
        Self { offset: 0 }
    }

    /// Cursor pointing at an explicit offset.
    #[must_use]
    pub const fn at(offset: u64) -> Self {
        Self { offset }
    }

    /// Number of items preceding this position.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.offset
    }

    /// Cursor moved forward by `count` items, saturating at `u64::MAX`.
    #[must_use]
    pub const fn advance(self, count: u64) -> Self {
        Self {
            offset: self.offset.saturating_add(count),
        }
    }

    /// Encode the cursor as an opaque, URL-safe token.
    #[must_use]
    pub fn encode(self) -> String {
        let document = json!({ "offset": self.offset }).to_string();
        URL_SAFE_NO_PAD.encode(document.as_bytes())
    }

    /// Decode a token previously produced by [`Cursor::encode`].
    ///
    /// # Errors
    /// Returns [`CursorError`] when the token is empty, not base64url, or
    /// does not contain a cursor document.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(CursorError::Empty);
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(trimmed)
            .map_err(|source| CursorError::Encoding { source })?;
        serde_json::from_slice(&bytes).map_err(|source| CursorError::Payload { source })
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Cursor {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
