//! Key material held by the provider configuration.
//!
//! Nothing here signs, hashes or verifies. Values are parsed so that a
//! malformed key is rejected at load time, then handed to the token and
//! client-authentication layers as-is.

use base64::{engine::general_purpose::STANDARD, Engine};
use password_hash::PasswordHash;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Deserializer};

/// A plaintext secret such as the HMAC signing secret. `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

/// A client secret digest in PHC string format (`$argon2id$v=19$...`).
///
/// Only the digest is ever stored; verification belongs to the client
/// authentication layer.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    encoded: String,
    algorithm: String,
}

impl PasswordDigest {
    /// Parse a PHC-formatted digest.
    pub fn parse(encoded: &str) -> Result<Self, String> {
        let hash = PasswordHash::new(encoded)
            .map_err(|e| format!("invalid client secret digest: {e}"))?;
        Ok(Self {
            algorithm: hash.algorithm.as_str().to_string(),
            encoded: encoded.to_string(),
        })
    }

    /// Algorithm identifier, e.g. `argon2id` or `pbkdf2-sha512`.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The full PHC string.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PasswordDigest({}, ***)", self.algorithm)
    }
}

impl<'de> Deserialize<'de> for PasswordDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PasswordDigest::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// RSA key used to sign ID tokens and publish the JWKS.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuerPrivateKey {
    key: RsaPrivateKey,
}

impl IssuerPrivateKey {
    /// Parse a PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1 (`BEGIN RSA PRIVATE KEY`) PEM.
    pub fn from_pem(pem: &str) -> Result<Self, String> {
        let pem = pem.trim();
        RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map(|key| Self { key })
            .map_err(|e| format!("invalid issuer private key: {e}"))
    }

    pub fn from_key(key: RsaPrivateKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &RsaPrivateKey {
        &self.key
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.key.size() * 8
    }
}

impl std::fmt::Debug for IssuerPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IssuerPrivateKey(RSA-{}, ***)", self.bits())
    }
}

impl<'de> Deserialize<'de> for IssuerPrivateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        IssuerPrivateKey::from_pem(&raw).map_err(serde::de::Error::custom)
    }
}

const CERT_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const CERT_END: &str = "-----END CERTIFICATE-----";

/// Ordered X.509 certificate chain (leaf first), stored as DER.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateChain {
    certificates: Vec<Vec<u8>>,
}

impl CertificateChain {
    /// Decode concatenated PEM `CERTIFICATE` blocks.
    pub fn from_pem(pem: &str) -> Result<Self, String> {
        let mut certificates = Vec::new();
        let mut rest = pem.trim();
        while !rest.is_empty() {
            let start = rest
                .find(CERT_BEGIN)
                .ok_or_else(|| "certificate chain contains data outside a CERTIFICATE block".to_string())?;
            if !rest[..start].trim().is_empty() {
                return Err("certificate chain contains data outside a CERTIFICATE block".into());
            }
            let body_start = start + CERT_BEGIN.len();
            let end = rest[body_start..]
                .find(CERT_END)
                .ok_or_else(|| format!("certificate {} is missing its END marker", certificates.len() + 1))?;
            let body: String = rest[body_start..body_start + end]
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            let der = STANDARD
                .decode(body.as_bytes())
                .map_err(|e| format!("certificate {} is not valid base64: {e}", certificates.len() + 1))?;
            certificates.push(der);
            rest = rest[body_start + end + CERT_END.len()..].trim_start();
        }
        Ok(Self { certificates })
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// DER-encoded certificates, leaf first.
    pub fn certificates(&self) -> &[Vec<u8>] {
        &self.certificates
    }
}

impl<'de> Deserialize<'de> for CertificateChain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CertificateChain::from_pem(&raw).map_err(serde::de::Error::custom)
    }
}
