//! Opaque bearer tokens for sessions and password resets.
//!
//! A [`Token`] holds random plaintext bytes that are handed to the client
//! exactly once, hex-encoded (cookie value, emailed link). Only its
//! [`TokenHash`] -- a SHA-512 digest -- is ever persisted or compared, so a
//! database leak does not expose usable credentials.
//!
//! The digest is unsalted on purpose: lookups hash the presented token and
//! match the stored digest, which must be identical across process restarts.

use std::fmt;
use std::io::{self, Read};

use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha512};

/// Smallest accepted token, in bytes of entropy.
pub const MIN_TOKEN_BYTES: usize = 32;

/// Output size of the token digest (SHA-512).
pub const TOKEN_HASH_BYTES: usize = 64;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failures while generating or parsing a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The requested or decoded size is below [`MIN_TOKEN_BYTES`].
    #[error("token size {size} is below the minimum of {min} bytes")]
    TooShort { size: usize, min: usize },

    /// The presented text is not valid hex.
    #[error("token is not valid hex: {0}")]
    Decode(#[from] hex::FromHexError),

    /// The randomness source itself reported an error.
    #[error("random source failed: {0}")]
    Source(#[source] io::Error),

    /// The randomness source succeeded but filled fewer bytes than requested.
    #[error("random source returned {read} of {requested} bytes")]
    ShortRead { requested: usize, read: usize },
}

/// Raise a configured token size to the minimum.
pub fn clamp_size(requested: usize) -> usize {
    requested.max(MIN_TOKEN_BYTES)
}

fn check_size(size: usize) -> Result<(), TokenError> {
    if size < MIN_TOKEN_BYTES {
        return Err(TokenError::TooShort {
            size,
            min: MIN_TOKEN_BYTES,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Randomness source
// ---------------------------------------------------------------------------

/// The operating-system CSPRNG exposed as a byte reader.
///
/// Stateless, so concurrent callers need no synchronization.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl Read for OsRandom {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(buf.len())
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Plaintext bearer token. Never persisted and never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    bytes: Vec<u8>,
}

impl Token {
    /// Generate `size` random bytes from the OS CSPRNG.
    pub fn generate(size: usize) -> Result<Self, TokenError> {
        Self::generate_from(&mut OsRandom, size)
    }

    /// Generate `size` bytes from an arbitrary source.
    ///
    /// The size is checked before the source is touched. A single read must
    /// fill the whole buffer; anything less is a [`TokenError::ShortRead`].
    pub fn generate_from<R: Read>(source: &mut R, size: usize) -> Result<Self, TokenError> {
        check_size(size)?;
        let mut bytes = vec![0u8; size];
        let read = source.read(&mut bytes).map_err(TokenError::Source)?;
        if read != size {
            return Err(TokenError::ShortRead {
                requested: size,
                read,
            });
        }
        Ok(Self { bytes })
    }

    /// Parse a token presented by a client in its hex transport form.
    pub fn from_hex(text: &str) -> Result<Self, TokenError> {
        let bytes = hex::decode(text.trim())?;
        check_size(bytes.len())?;
        Ok(Self { bytes })
    }

    /// Hex transport form of the plaintext. Hand it to the client, nowhere else.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Number of random bytes in the plaintext.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Digest used for persistence and lookup.
    pub fn hash(&self) -> TokenHash {
        TokenHash::of(&self.bytes)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<redacted {} bytes>)", self.bytes.len())
    }
}

// ---------------------------------------------------------------------------
// TokenHash
// ---------------------------------------------------------------------------

/// SHA-512 digest of a token's plaintext bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHash([u8; TOKEN_HASH_BYTES]);

impl TokenHash {
    fn of(data: &[u8]) -> Self {
        let digest = Sha512::digest(data);
        let mut out = [0u8; TOKEN_HASH_BYTES];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenHash({}..)", hex::encode(&self.0[..4]))
    }
}
