//! Cryptographic digests for canonical circuit state.
//!
//! BLAKE3 is the default; SHA-256 is available for hosts that compare against
//! digests produced elsewhere. Both produce 32 bytes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 256-bit digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 32]);

/// Digest of a canonical circuit or runtime state
pub type StateHash = Hash;

impl Hash {
    /// The number of bytes in a hash
    pub const LEN: usize = 32;

    /// Compute BLAKE3 hash of data
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Compute hash of data with the given algorithm
    #[must_use]
    pub fn compute_with(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        match algorithm {
            DigestAlgorithm::Blake3 => Self::compute(data),
            DigestAlgorithm::Sha256 => Self(Sha256::digest(data).into()),
        }
    }

    /// All-zero hash
    #[must_use]
    pub const fn empty() -> Self {
        Self([0u8; 32])
    }

    /// Create from bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get as bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    ///
    /// # Errors
    ///
    /// Returns error if hex is invalid or not 32 bytes
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        let bytes = hex::decode(hex).map_err(|_| HashError::InvalidHex)?;
        if bytes.len() != Self::LEN {
            return Err(HashError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Check if hash matches data under the given algorithm
    #[must_use]
    pub fn verify(&self, algorithm: DigestAlgorithm, data: &[u8]) -> bool {
        Self::compute_with(algorithm, data) == *self
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Hash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Hex on the wire so reports and exported verification results stay readable.
impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Hash-related errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Invalid hex encoding
    InvalidHex,
    /// Invalid length (not 32 bytes)
    InvalidLength(usize),
    /// Unknown algorithm name
    UnknownAlgorithm(String),
}

impl std::error::Error for HashError {}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHex => write!(f, "Invalid hex encoding"),
            Self::InvalidLength(len) => write!(f, "Invalid hash length: {} (expected 32)", len),
            Self::UnknownAlgorithm(name) => write!(f, "Unknown digest algorithm: {}", name),
        }
    }
}

/// Digest algorithm used for state hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// BLAKE3 (default)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl DigestAlgorithm {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blake3" => Ok(Self::Blake3),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(HashError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_compute() {
        let hash = Hash::compute(b"hello world");
        assert_eq!(hash.to_hex().len(), 64);
    }

    #[test]
    fn test_hash_from_to_hex() {
        let hash = Hash::compute(b"test");
        let restored = Hash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, restored);
    }

    #[test]
    fn test_hash_from_hex_wrong_length() {
        assert_eq!(Hash::from_hex("abcd"), Err(HashError::InvalidLength(2)));
        assert_eq!(Hash::from_hex("zz"), Err(HashError::InvalidHex));
    }

    #[test]
    fn test_algorithms_disagree() {
        let data = b"circuit";
        let b3 = Hash::compute_with(DigestAlgorithm::Blake3, data);
        let sha = Hash::compute_with(DigestAlgorithm::Sha256, data);
        assert_ne!(b3, sha);
        assert!(b3.verify(DigestAlgorithm::Blake3, data));
        assert!(sha.verify(DigestAlgorithm::Sha256, data));
        assert!(!sha.verify(DigestAlgorithm::Sha256, b"other"));
    }

    #[test]
    fn test_sha256_known_vector() {
        let hash = Hash::compute_with(DigestAlgorithm::Sha256, b"abc");
        assert_eq!(
            hash.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_serializes_as_hex() {
        let hash = Hash::compute(b"x");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("sha256".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha256));
        assert_eq!("blake3".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Blake3));
        assert!("md5".parse::<DigestAlgorithm>().is_err());
    }
}
