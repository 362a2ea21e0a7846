//! Sealed multi-recipient message envelopes.
//!
//! An envelope hides its sender, its payload, and lets any of N recipients
//! recover the payload with their own long-term key, while letting a domain
//! witness ("world" keypair) recognize that the envelope belongs to its
//! domain without learning anything else about it.
//!
//! # Construction
//!
//! A fresh 32-byte per-message symmetric key `K` is drawn. The payload and
//! the sender's public key are sealed under `K` with secretbox. Every
//! recipient slot seals `K` under an asymmetric box *from the world keypair*
//! to that recipient — the world key, not the logical sender, is the sender
//! identity the world ever sees. A separate world-to-world box (`w`) is also
//! sealed, independent of `K`; this is what lets [`Envelope::is_same_world`]
//! recognize an envelope without learning who actually sent it or needing
//! any of the recipient keys.
//!
//! # Wire format
//!
//! ```text
//! {"s":"<base64 sender-ct>","r":["<base64 slot>", ...],"m":"<base64 payload-ct>","w":"<base64 world tag>"}
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::crypto::{self, KEY_SIZE};
use crate::error::{DepotError, DepotResult};
use crate::keypair::Keypair;

/// Fixed plaintext sealed world-to-world as the domain-membership tag; its
/// content carries no meaning, only its authenticity under `world` does.
const WORLD_TAG_PLAINTEXT: &[u8] = b"depot-world-tag";

/// A sealed envelope, as it exists on the wire and in storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    sender_ct: Vec<u8>,
    recipient_slots: Vec<Vec<u8>>,
    message_ct: Vec<u8>,
    world_tag: Vec<u8>,
}

/// The canonical short-form wire encoding.
#[derive(Serialize, Deserialize)]
struct EnvelopeWire {
    s: String,
    r: Vec<String>,
    m: String,
    w: String,
}

/// The transient result of successfully opening an envelope. Never persisted.
#[derive(Debug)]
pub struct OpenedEnvelope {
    /// The sealed sender's public key, recovered as text.
    pub sender: String,
    /// Which of the caller's keys matched a recipient slot.
    pub matched: Keypair,
    /// The decrypted payload.
    pub plaintext: Vec<u8>,
}

impl Envelope {
    /// Seal a payload for `recipient_pubs`, with `sender` as the logical
    /// (hidden) author and `world` as the domain's shared keypair.
    ///
    /// `recipient_pubs` may contain keys with or without a private half —
    /// only the public half of each is used.
    pub fn seal(
        world: &Keypair,
        sender: &Keypair,
        recipient_pubs: &[Keypair],
        plaintext: &[u8],
    ) -> DepotResult<Envelope> {
        let symmetric_key = crypto::generate_symmetric_key();
        let message_ct = crypto::secretbox_seal(plaintext, &symmetric_key)?;
        let sender_ct = crypto::secretbox_seal(sender.public_text().as_bytes(), &symmetric_key)?;

        let mut recipient_slots = Vec::with_capacity(recipient_pubs.len());
        for recipient in recipient_pubs {
            let slot = crypto::box_seal(&symmetric_key, world, recipient)?;
            recipient_slots.push(slot);
        }

        let world_tag = crypto::box_seal(WORLD_TAG_PLAINTEXT, world, world)?;

        Ok(Envelope {
            sender_ct,
            recipient_slots,
            message_ct,
            world_tag,
        })
    }

    /// Attempt to open this envelope against the given world and a set of
    /// candidate recipient keypairs (which must carry private halves).
    ///
    /// Tries every (slot, key) combination in order; the first slot that
    /// opens under `world`'s public key and one of `my_keys`' private keys
    /// determines the recovered symmetric key and the matched key.
    pub fn open(&self, world: &Keypair, my_keys: &[Keypair]) -> DepotResult<OpenedEnvelope> {
        let mut found: Option<(usize, [u8; KEY_SIZE])> = None;
        'slots: for slot in &self.recipient_slots {
            for (idx, my_key) in my_keys.iter().enumerate() {
                if my_key.private_bytes().is_err() {
                    continue;
                }
                if let Ok(opened) = crypto::box_open(slot, world, my_key) {
                    if opened.len() != KEY_SIZE {
                        return Err(DepotError::SlotDecryptionFailed);
                    }
                    let mut key = [0u8; KEY_SIZE];
                    key.copy_from_slice(&opened);
                    found = Some((idx, key));
                    break 'slots;
                }
            }
        }

        let (idx, symmetric_key) = found.ok_or(DepotError::NoRecipient)?;
        let matched = my_keys[idx].clone();

        let plaintext = crypto::secretbox_open(&self.message_ct, &symmetric_key)
            .map_err(|_| DepotError::PayloadDecryptionFailed)?;

        let sender_bytes = crypto::secretbox_open(&self.sender_ct, &symmetric_key)
            .map_err(|_| DepotError::SenderDecryptionFailed)?;
        let sender = String::from_utf8(sender_bytes)
            .map_err(|_| DepotError::SenderDecryptionFailed)?;

        Ok(OpenedEnvelope {
            sender,
            matched,
            plaintext,
        })
    }

    /// True iff this envelope carries a world tag that opens under `world`
    /// as both sender and recipient — i.e. it was sealed under `world`.
    pub fn is_same_world(&self, world: &Keypair) -> bool {
        crypto::box_open(&self.world_tag, world, world)
            .map(|plaintext| plaintext == WORLD_TAG_PLAINTEXT)
            .unwrap_or(false)
    }

    /// A stable canonical text encoding of the envelope's wire form, used as
    /// its identity in storage.
    pub fn hash(&self) -> DepotResult<String> {
        self.to_json_string()
    }

    /// Encode as the canonical `{"s","r","m","w"}` JSON wire form.
    pub fn to_json_string(&self) -> DepotResult<String> {
        let wire = EnvelopeWire {
            s: STANDARD.encode(&self.sender_ct),
            r: self
                .recipient_slots
                .iter()
                .map(|slot| STANDARD.encode(slot))
                .collect(),
            m: STANDARD.encode(&self.message_ct),
            w: STANDARD.encode(&self.world_tag),
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Decode from the canonical `{"s","r","m","w"}` JSON wire form.
    pub fn from_json_str(s: &str) -> DepotResult<Envelope> {
        let wire: EnvelopeWire = serde_json::from_str(s)?;
        let sender_ct = STANDARD
            .decode(&wire.s)
            .map_err(|e| DepotError::MalformedEnvelope(e.to_string()))?;
        let message_ct = STANDARD
            .decode(&wire.m)
            .map_err(|e| DepotError::MalformedEnvelope(e.to_string()))?;
        let world_tag = STANDARD
            .decode(&wire.w)
            .map_err(|e| DepotError::MalformedEnvelope(e.to_string()))?;
        let mut recipient_slots = Vec::with_capacity(wire.r.len());
        for slot in &wire.r {
            let decoded = STANDARD
                .decode(slot)
                .map_err(|e| DepotError::MalformedEnvelope(e.to_string()))?;
            recipient_slots.push(decoded);
        }
        Ok(Envelope {
            sender_ct,
            recipient_slots,
            message_ct,
            world_tag,
        })
    }
}
