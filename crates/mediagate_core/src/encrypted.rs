//! Encrypted attachment descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Metadata describing an end-to-end-encrypted Matrix attachment.
///
/// Fields the gateway does not interpret are kept in `extra` so that two
/// descriptors differing only there still derive different result keys.
///
/// # Examples
///
/// ```
/// use mediagate_core::EncryptedFile;
///
/// let file: EncryptedFile = serde_json::from_value(serde_json::json!({
///     "url": "mxc://example.org/abc123",
///     "key": {
///         "kty": "oct",
///         "key_ops": ["encrypt", "decrypt"],
///         "alg": "A256CTR",
///         "k": "qcHVMSgYg-71CauWBezXI5qkaRb0LuIy-Wx5kIaHMIA",
///         "ext": true
///     },
///     "iv": "X85+XgHN+HEAAAAAAAAAAA",
///     "hashes": { "sha256": "5qG4fFnbbVdlAB1Q72JDKwCagV6Dbkx9uds4rSak37c" },
///     "v": "v2"
/// }))
/// .unwrap();
///
/// assert_eq!(file.url, "mxc://example.org/abc123");
/// assert_eq!(file.key.alg, "A256CTR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFile {
    /// `mxc://` URL of the ciphertext
    pub url: String,
    /// Symmetric key in JSON Web Key form
    pub key: JsonWebKey,
    /// Base64 initialisation vector
    pub iv: String,
    /// Hashes of the ciphertext, keyed by algorithm
    #[serde(default)]
    pub hashes: BTreeMap<String, String>,
    /// Encryption scheme version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<String>,
    /// Any other fields supplied by the client
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

/// JSON Web Key holding an AES key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type, `oct` for symmetric keys
    pub kty: String,
    /// Permitted operations
    #[serde(default)]
    pub key_ops: Vec<String>,
    /// Algorithm, `A256CTR` for Matrix attachments
    pub alg: String,
    /// Unpadded base64url key material
    pub k: String,
    /// Extractable flag
    #[serde(default)]
    pub ext: bool,
    /// Any other fields supplied by the client
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}
