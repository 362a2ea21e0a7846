//! Long-term X25519 keypairs: generation, loading, and deterministic derivation
//! from a passphrase ("world keys").

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{DepotError, DepotResult};

pub const KEY_SIZE: usize = 32;

/// An X25519 keypair, optionally public-only.
///
/// A keypair carrying a private half satisfies `public == scalar_base(private)`
/// by construction; callers that load a pair from untrusted storage may
/// re-check this with [`Keypair::is_consistent`].
#[derive(Clone)]
pub struct Keypair {
    public: [u8; KEY_SIZE],
    private: Option<[u8; KEY_SIZE]>,
}

/// The `{"public": "...", "private": "..."}` wire form, with `private`
/// omitted when the keypair carries no private key.
#[derive(Serialize, Deserialize)]
struct KeypairWire {
    public: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<String>,
}

impl Keypair {
    /// Draw a fresh keypair from the OS CSPRNG.
    pub fn generate() -> Self {
        use crypto_box::rand_core::RngCore;
        let mut seed = [0u8; KEY_SIZE];
        crypto_box::rand_core::OsRng.fill_bytes(&mut seed);
        let secret = StaticSecret::from(seed);
        let public = PublicKey::from(&secret);
        Keypair {
            public: *public.as_bytes(),
            private: Some(secret.to_bytes()),
        }
    }

    /// Build a public-only keypair. Operations that require a private key
    /// (decrypt, open, sign) fail with [`DepotError::MissingPrivateKey`].
    pub fn from_public(pub_text: &str) -> DepotResult<Self> {
        let public = decode_key(pub_text)?;
        Ok(Keypair {
            public,
            private: None,
        })
    }

    /// Load both halves of a keypair from their base64 text forms.
    pub fn from_pair(pub_text: &str, priv_text: &str) -> DepotResult<Self> {
        let public = decode_key(pub_text)?;
        let private = decode_key(priv_text)?;
        Ok(Keypair {
            public,
            private: Some(private),
        })
    }

    /// Derive a keypair deterministically from a passphrase.
    ///
    /// This is a domain-tag construction, not key-derivation-grade: the
    /// passphrase is hashed with FNV-1a (32-bit), the hash seeds a linear
    /// congruential generator, and 512 bytes are drawn from that generator
    /// and used as the raw (pre-clamp) private scalar's randomness source.
    /// Two peers calling `deterministic` with the same passphrase always
    /// arrive at the same keypair.
    pub fn deterministic(passphrase: &str) -> Self {
        let hash = fnv1a32(passphrase.as_bytes());
        let buf = lcg_bytes(hash, 512);
        let mut seed = [0u8; KEY_SIZE];
        seed.copy_from_slice(&buf[..KEY_SIZE]);
        let secret = StaticSecret::from(seed);
        let public = PublicKey::from(&secret);
        Keypair {
            public: *public.as_bytes(),
            private: Some(secret.to_bytes()),
        }
    }

    /// The raw 32-byte public key.
    pub fn public_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.public
    }

    /// The raw 32-byte private key, if present.
    pub fn private_bytes(&self) -> DepotResult<&[u8; KEY_SIZE]> {
        self.private.as_ref().ok_or(DepotError::MissingPrivateKey)
    }

    /// Standard padded base64 of the public key.
    pub fn public_text(&self) -> String {
        STANDARD.encode(self.public)
    }

    /// Standard padded base64 of the private key, if present.
    pub fn private_text(&self) -> DepotResult<String> {
        Ok(STANDARD.encode(self.private_bytes()?))
    }

    /// Whether this keypair carries a private half.
    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// Check the `public == scalar_base(private)` invariant; vacuously true
    /// for a public-only keypair.
    pub fn is_consistent(&self) -> bool {
        match &self.private {
            None => true,
            Some(priv_bytes) => {
                let secret = StaticSecret::from(*priv_bytes);
                PublicKey::from(&secret).as_bytes() == &self.public
            }
        }
    }

    /// Encode as the canonical `{"public","private"}` JSON form.
    pub fn to_json_string(&self) -> DepotResult<String> {
        let wire = KeypairWire {
            public: self.public_text(),
            private: self.private.map(|_| self.private_text()).transpose()?,
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Decode from the canonical `{"public","private"}` JSON form.
    pub fn from_json_str(s: &str) -> DepotResult<Self> {
        let wire: KeypairWire = serde_json::from_str(s)?;
        match wire.private {
            Some(priv_text) => Keypair::from_pair(&wire.public, &priv_text),
            None => Keypair::from_public(&wire.public),
        }
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public_text())
            .field("has_private", &self.has_private())
            .finish()
    }
}

impl PartialEq for Keypair {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

fn decode_key(text: &str) -> DepotResult<[u8; KEY_SIZE]> {
    let bytes = STANDARD.decode(text)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| DepotError::WrongKeyLength {
            expected: KEY_SIZE,
            got: len,
        })
}

/// FNV-1a, 32-bit variant.
fn fnv1a32(data: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut hash = OFFSET_BASIS;
    for &b in data {
        hash ^= b as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Numerical-Recipes-style 32-bit LCG, seeded by `seed`, emitting `n` bytes
/// four at a time in little-endian order.
fn lcg_bytes(seed: u32, n: usize) -> Vec<u8> {
    const A: u32 = 1_664_525;
    const C: u32 = 1_013_904_223;
    let mut state = seed;
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        state = state.wrapping_mul(A).wrapping_add(C);
        out.extend_from_slice(&state.to_le_bytes());
    }
    out.truncate(n);
    out
}
