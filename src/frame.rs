//! Frame type and byte normalization.
//!
//! A [`Frame`] is one discrete unit of data carried by a transport, either
//! text or binary. Handlers only ever see bytes: binary payloads are copied
//! verbatim and text payloads are UTF-8 encoded.

// ============================================================================
// Frame
// ============================================================================

/// One unit of data delivered by or handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload.
    Text(String),
    /// Raw binary payload.
    Binary(Vec<u8>),
}

impl Frame {
    /// Builds a text frame from possibly invalid UTF-8.
    ///
    /// Invalid sequences are replaced with `U+FFFD`.
    #[must_use]
    pub fn text_lossy(bytes: &[u8]) -> Self {
        Self::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Returns `true` for binary frames.
    #[inline]
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Returns the payload as a byte slice.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalizes the frame into bytes.
    ///
    /// Binary frames are returned as-is; text frames yield their UTF-8
    /// encoding. Neither path copies.
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for Frame {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

// ============================================================================
// Tests
// ============================================================================
