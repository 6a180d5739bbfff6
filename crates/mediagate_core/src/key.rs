//! Result key derivation.

use crate::EncryptedFile;
use mediagate_error::{InternalError, MediagateResult};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::fmt;

/// Digest identifying one logical scan input.
///
/// Derived from the download URL and the encryption descriptor (or its
/// absence). The descriptor takes part in the digest so that a party without
/// the decryption material cannot get an encrypted object marked clean by
/// asking for it as plaintext.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey([u8; 32]);

impl ResultKey {
    /// Derive the key for `(download_url, file)`.
    ///
    /// The input is hashed as canonical JSON (object keys sorted, no
    /// whitespace) of `{"file": ..., "url": ...}`, so the key is stable across
    /// processes and independent of how the descriptor's fields were ordered
    /// on the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediagate_core::ResultKey;
    ///
    /// let url = "https://hs.example/_matrix/media/v1/download/example.org/abc123";
    /// let a = ResultKey::derive(url, None).unwrap();
    /// let b = ResultKey::derive(url, None).unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.to_string().len(), 64);
    /// ```
    pub fn derive(download_url: &str, file: Option<&EncryptedFile>) -> MediagateResult<Self> {
        let file = match file {
            Some(file) => serde_json::to_value(file).map_err(|e| {
                InternalError::new(format!("Failed to serialize encryption descriptor: {}", e))
            })?,
            None => JsonValue::Null,
        };

        let mut document = serde_json::Map::new();
        document.insert("file".to_string(), file);
        document.insert("url".to_string(), JsonValue::String(download_url.to_string()));

        let mut canonical = String::new();
        write_canonical(&JsonValue::Object(document), &mut canonical);

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(Self(hasher.finalize().into()))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Serialize `value` with object keys in sorted order.
fn write_canonical(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&JsonValue::String(key.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResultKey({})", self)
    }
}
