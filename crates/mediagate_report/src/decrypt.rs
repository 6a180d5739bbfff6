//! Decryption of end-to-end encrypted Matrix attachments.

use aes::Aes256;
use async_trait::async_trait;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use ctr::cipher::{KeyIvInit, StreamCipher};
use mediagate_core::EncryptedFile;
use mediagate_error::{CryptoError, CryptoErrorKind, MediagateResult};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::instrument;

type Aes256Ctr = ctr::Ctr64BE<Aes256>;

const CHUNK_SIZE: usize = 64 * 1024;

/// Unpadded on encode, padding optional on decode.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Turns a fetched ciphertext into plaintext.
#[async_trait]
pub trait Decryptor: Send + Sync {
    /// Decrypt `input` into `output` using the material in `file`.
    ///
    /// `output` must only be relied on when this returns `Ok`.
    async fn decrypt(
        &self,
        input: &Path,
        output: &Path,
        file: &EncryptedFile,
    ) -> MediagateResult<()>;
}

/// Matrix attachment decryption (AES-256-CTR, JWK key, SHA-256 hash).
///
/// The ciphertext hash is checked in the same pass that decrypts it; on a
/// mismatch the partial plaintext is deleted and an error returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentDecryptor;

impl AttachmentDecryptor {
    /// Create a decryptor.
    pub fn new() -> Self {
        Self
    }
}

struct Material {
    key: Vec<u8>,
    iv: Vec<u8>,
    expected_hash: String,
}

fn material(file: &EncryptedFile) -> Result<Material, CryptoError> {
    match file.v.as_deref() {
        Some("v1") | Some("v2") => {}
        Some(other) => {
            return Err(CryptoError::new(CryptoErrorKind::UnsupportedVersion(
                other.to_string(),
            )));
        }
        None => {
            return Err(CryptoError::new(CryptoErrorKind::UnsupportedVersion(
                "missing".to_string(),
            )));
        }
    }

    if file.key.kty != "oct" {
        return Err(CryptoError::new(CryptoErrorKind::UnsupportedAlgorithm(
            format!("key type {}", file.key.kty),
        )));
    }
    if file.key.alg != "A256CTR" {
        return Err(CryptoError::new(CryptoErrorKind::UnsupportedAlgorithm(
            file.key.alg.clone(),
        )));
    }
    if !file.key.key_ops.is_empty() && !file.key.key_ops.iter().any(|op| op == "decrypt") {
        return Err(CryptoError::new(CryptoErrorKind::InvalidKey(
            "key_ops does not allow decrypt".to_string(),
        )));
    }

    let key = BASE64_URL
        .decode(&file.key.k)
        .map_err(|e| CryptoError::new(CryptoErrorKind::InvalidKey(e.to_string())))?;
    if key.len() != 32 {
        return Err(CryptoError::new(CryptoErrorKind::InvalidKey(format!(
            "expected 32 bytes, got {}",
            key.len()
        ))));
    }

    let iv = BASE64
        .decode(&file.iv)
        .map_err(|e| CryptoError::new(CryptoErrorKind::InvalidIv(e.to_string())))?;
    if iv.len() != 16 {
        return Err(CryptoError::new(CryptoErrorKind::InvalidIv(format!(
            "expected 16 bytes, got {}",
            iv.len()
        ))));
    }

    let expected_hash = file
        .hashes
        .get("sha256")
        .map(|hash| hash.trim_end_matches('=').to_string())
        .ok_or_else(|| CryptoError::new(CryptoErrorKind::MissingHash))?;

    Ok(Material {
        key,
        iv,
        expected_hash,
    })
}

fn io_error(context: &str, path: &Path, e: std::io::Error) -> CryptoError {
    CryptoError::new(CryptoErrorKind::Io(format!(
        "{} {}: {}",
        context,
        path.display(),
        e
    )))
}

#[async_trait]
impl Decryptor for AttachmentDecryptor {
    #[instrument(skip(self, file), fields(input = %input.display(), version = ?file.v))]
    async fn decrypt(
        &self,
        input: &Path,
        output: &Path,
        file: &EncryptedFile,
    ) -> MediagateResult<()> {
        let material = material(file)?;
        let mut cipher = Aes256Ctr::new_from_slices(&material.key, &material.iv)
            .map_err(|e| CryptoError::new(CryptoErrorKind::InvalidKey(e.to_string())))?;

        let mut reader = tokio::fs::File::open(input)
            .await
            .map_err(|e| io_error("Failed to open", input, e))?;
        let mut writer = tokio::fs::File::create(output)
            .await
            .map_err(|e| io_error("Failed to create", output, e))?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let read = reader
                .read(&mut buffer)
                .await
                .map_err(|e| io_error("Failed to read", input, e))?;
            if read == 0 {
                break;
            }
            let chunk = &mut buffer[..read];
            hasher.update(&*chunk);
            cipher.apply_keystream(chunk);
            writer
                .write_all(chunk)
                .await
                .map_err(|e| io_error("Failed to write", output, e))?;
        }
        writer
            .flush()
            .await
            .map_err(|e| io_error("Failed to flush", output, e))?;
        drop(writer);

        let actual_hash = BASE64.encode(hasher.finalize());
        if actual_hash != material.expected_hash {
            if let Err(e) = tokio::fs::remove_file(output).await {
                tracing::warn!(error = %e, "Failed to remove unverified plaintext");
            }
            tracing::warn!(
                expected = %material.expected_hash,
                actual = %actual_hash,
                "Ciphertext hash mismatch"
            );
            return Err(CryptoError::new(CryptoErrorKind::HashMismatch {
                expected: material.expected_hash,
                actual: actual_hash,
            })
            .into());
        }

        tracing::debug!("Decrypted attachment");
        Ok(())
    }
}
