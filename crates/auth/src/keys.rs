//! Signing key material
//!
//! Production tokens are signed with ES256 over a P-256 key pair stored as
//! PEM: the private key in SEC1 form (`EC PRIVATE KEY`) and the public key
//! in PKIX form (`PUBLIC KEY`). HS256 with a shared secret is supported
//! for development and tests.

use std::fs;
use std::path::{Path, PathBuf};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use p256::SecretKey;
use p256::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use tracing::info;

use crate::error::{AuthError, Result};

/// File name of the generated private key
pub const PRIVATE_KEY_FILE: &str = "privkey.pem";

/// File name of the generated public key
pub const PUBLIC_KEY_FILE: &str = "pubkey.pem";

/// Encoding/decoding key pair for one algorithm
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Clone)]
pub struct SigningKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKeys {
    /// HMAC-SHA256 keys from a shared secret
    #[must_use]
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// ES256 keys from a private key PEM (SEC1 or PKCS#8) and a PKIX public key PEM
    pub fn es256_from_pem(private_pem: &str, public_pem: &str) -> Result<Self> {
        let encoding = ec_encoding_key(private_pem)?;
        let decoding = DecodingKey::from_ec_pem(public_pem.as_bytes())
            .map_err(|e| AuthError::KeyError(format!("invalid public key: {}", e)))?;

        Ok(Self {
            algorithm: Algorithm::ES256,
            encoding,
            decoding,
        })
    }

    /// ES256 keys from a SEC1 private key, deriving the public half
    pub fn es256_from_private_pem(private_pem: &str) -> Result<Self> {
        let secret = parse_secret_key(private_pem)?;
        let public_pem = secret
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AuthError::KeyError(format!("failed to encode public key: {}", e)))?;

        Self::es256_from_pem(private_pem, &public_pem)
    }

    /// ES256 keys read from PEM files
    pub fn es256_from_files(private_path: &Path, public_path: &Path) -> Result<Self> {
        let private_pem = read_pem(private_path)?;
        let public_pem = read_pem(public_path)?;
        let keys = Self::es256_from_pem(&private_pem, &public_pem)?;

        info!(
            private_key = %private_path.display(),
            public_key = %public_path.display(),
            "loaded ES256 signing keys"
        );
        Ok(keys)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

fn read_pem(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| AuthError::io_error(path.display().to_string(), e))
}

fn parse_secret_key(pem: &str) -> Result<SecretKey> {
    if pem.contains("BEGIN EC PRIVATE KEY") {
        SecretKey::from_sec1_pem(pem)
            .map_err(|e| AuthError::KeyError(format!("invalid SEC1 private key: {}", e)))
    } else {
        use p256::pkcs8::DecodePrivateKey;
        SecretKey::from_pkcs8_pem(pem)
            .map_err(|e| AuthError::KeyError(format!("invalid PKCS#8 private key: {}", e)))
    }
}

/// jsonwebtoken only accepts PKCS#8 EC keys, so SEC1 input is re-encoded.
fn ec_encoding_key(pem: &str) -> Result<EncodingKey> {
    let secret = parse_secret_key(pem)?;
    let der = secret
        .to_pkcs8_der()
        .map_err(|e| AuthError::KeyError(format!("failed to encode private key: {}", e)))?;

    Ok(EncodingKey::from_ec_der(der.as_bytes()))
}

/// PEM-encoded P-256 key pair
#[derive(Clone)]
pub struct KeyPairPem {
    /// SEC1 `EC PRIVATE KEY`
    pub private_pem: String,
    /// PKIX `PUBLIC KEY`
    pub public_pem: String,
}

impl std::fmt::Debug for KeyPairPem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairPem")
            .field("public_pem", &self.public_pem)
            .finish_non_exhaustive()
    }
}

/// Generate a fresh P-256 key pair
pub fn generate_p256_keypair() -> Result<KeyPairPem> {
    let secret = SecretKey::random(&mut OsRng);

    let private_pem = secret
        .to_sec1_pem(LineEnding::LF)
        .map_err(|e| AuthError::KeyError(format!("failed to encode private key: {}", e)))?;
    let public_pem = secret
        .public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| AuthError::KeyError(format!("failed to encode public key: {}", e)))?;

    Ok(KeyPairPem {
        private_pem: String::from(private_pem.as_str()),
        public_pem,
    })
}

/// Generate a key pair and write `privkey.pem` / `pubkey.pem` into `dir`
///
/// Existing files are left alone unless `overwrite` is set.
pub fn write_p256_keypair(dir: &Path, overwrite: bool) -> Result<(PathBuf, PathBuf)> {
    let private_path = dir.join(PRIVATE_KEY_FILE);
    let public_path = dir.join(PUBLIC_KEY_FILE);

    if !overwrite {
        for path in [&private_path, &public_path] {
            if path.exists() {
                return Err(AuthError::KeyError(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
        }
    }

    fs::create_dir_all(dir).map_err(|e| AuthError::io_error(dir.display().to_string(), e))?;

    let pair = generate_p256_keypair()?;
    fs::write(&private_path, pair.private_pem.as_bytes())
        .map_err(|e| AuthError::io_error(private_path.display().to_string(), e))?;
    restrict_permissions(&private_path)?;
    fs::write(&public_path, pair.public_pem.as_bytes())
        .map_err(|e| AuthError::io_error(public_path.display().to_string(), e))?;

    info!(dir = %dir.display(), "generated P-256 key pair");
    Ok((private_path, public_path))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| AuthError::io_error(path.display().to_string(), e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
