//! Matrix attachment encryption, the inverse of `AttachmentDecryptor`.

use aes::Aes256;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use ctr::cipher::{KeyIvInit, StreamCipher};
use mediagate_core::EncryptedFile;
use serde_json::json;
use sha2::{Digest, Sha256};

/// Encrypt `plaintext` as a v2 attachment served from `mxc_url`.
pub fn encrypt_attachment(plaintext: &[u8], mxc_url: &str) -> (Vec<u8>, EncryptedFile) {
    let key = [7u8; 32];
    let mut iv = [0u8; 16];
    iv[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

    let mut ciphertext = plaintext.to_vec();
    let mut cipher = ctr::Ctr64BE::<Aes256>::new_from_slices(&key, &iv).unwrap();
    cipher.apply_keystream(&mut ciphertext);

    let hash = STANDARD_NO_PAD.encode(Sha256::digest(&ciphertext));
    let file = serde_json::from_value(json!({
        "url": mxc_url,
        "key": {
            "kty": "oct",
            "key_ops": ["encrypt", "decrypt"],
            "alg": "A256CTR",
            "k": URL_SAFE_NO_PAD.encode(key),
            "ext": true
        },
        "iv": STANDARD_NO_PAD.encode(iv),
        "hashes": {"sha256": hash},
        "v": "v2"
    }))
    .unwrap();

    (ciphertext, file)
}
