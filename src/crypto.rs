//! Authenticated encryption primitives, bit-compatible with NaCl `box` and
//! `secretbox`: X25519 + XSalsa20Poly1305 with a 24-byte random nonce
//! prepended to the ciphertext.
//!
//! # Wire format
//!
//! Both `box_seal` and `secretbox_seal` produce `nonce (24 bytes) || sealed`,
//! where `sealed` is the ciphertext with a 16-byte Poly1305 tag appended.

use crypto_box::aead::{generic_array::GenericArray, Aead, OsRng};
use crypto_box::{PublicKey as BoxPublicKey, SalsaBox, SecretKey as BoxSecretKey};
use crypto_secretbox::{
    aead::{Aead as SecretAead, KeyInit},
    Key as SecretKey, Nonce as SecretNonce, XSalsa20Poly1305,
};

use crate::error::{DepotError, DepotResult};
use crate::keypair::Keypair;

/// NaCl nonce size for both box and secretbox.
pub const NONCE_SIZE: usize = 24;
/// Poly1305 authenticator length.
pub const MAC_LEN: usize = 16;
/// Symmetric key length.
pub const KEY_SIZE: usize = 32;

/// `encrypt(plaintext, my_priv, their_pub)`: authenticated asymmetric box.
pub fn box_seal(plaintext: &[u8], sender: &Keypair, recipient: &Keypair) -> DepotResult<Vec<u8>> {
    let my_secret = BoxSecretKey::from(*sender.private_bytes()?);
    let their_public = BoxPublicKey::from(*recipient.public_bytes());
    let cbox = SalsaBox::new(&their_public, &my_secret);
    let nonce = crypto_box::generate_nonce(&mut OsRng);
    let sealed = cbox
        .encrypt(&nonce, plaintext)
        .map_err(|_| DepotError::DecryptionFailed)?;
    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(nonce.as_slice());
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// `decrypt(ciphertext, their_pub, my_priv)`: authenticated asymmetric box open.
pub fn box_open(ciphertext: &[u8], sender: &Keypair, recipient: &Keypair) -> DepotResult<Vec<u8>> {
    if ciphertext.len() < NONCE_SIZE {
        return Err(DepotError::DecryptionFailed);
    }
    let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_SIZE);
    let nonce = GenericArray::clone_from_slice(nonce_bytes);
    let their_public = BoxPublicKey::from(*sender.public_bytes());
    let my_secret = BoxSecretKey::from(*recipient.private_bytes()?);
    let cbox = SalsaBox::new(&their_public, &my_secret);
    cbox.decrypt(&nonce, sealed)
        .map_err(|_| DepotError::DecryptionFailed)
}

/// Draw a fresh random 32-byte symmetric key.
pub fn generate_symmetric_key() -> [u8; KEY_SIZE] {
    use crypto_box::rand_core::RngCore;
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    key
}

/// Authenticated symmetric secretbox seal with a 24-byte random nonce prepended.
pub fn secretbox_seal(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> DepotResult<Vec<u8>> {
    let cipher = XSalsa20Poly1305::new(SecretKey::from_slice(key));
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    {
        use crypto_box::rand_core::RngCore;
        OsRng.fill_bytes(&mut nonce_bytes);
    }
    let nonce = SecretNonce::from_slice(&nonce_bytes);
    let sealed = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| DepotError::DecryptionFailed)?;
    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Authenticated symmetric secretbox open.
pub fn secretbox_open(ciphertext: &[u8], key: &[u8; KEY_SIZE]) -> DepotResult<Vec<u8>> {
    if ciphertext.len() < NONCE_SIZE {
        return Err(DepotError::DecryptionFailed);
    }
    let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_SIZE);
    let nonce = SecretNonce::from_slice(nonce_bytes);
    let cipher = XSalsa20Poly1305::new(SecretKey::from_slice(key));
    cipher
        .decrypt(nonce, sealed)
        .map_err(|_| DepotError::DecryptionFailed)
}
