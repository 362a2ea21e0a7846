//! Depot Core Library
//!
//! Sealed-envelope messaging and range-hash anti-entropy reconciliation over
//! an embedded ordered key/value store.
//!
//! ## Overview
//!
//! Depot is a building block for a decentralized, end-to-end encrypted
//! message-distribution fabric. Peers hold local stores of opaque,
//! pre-encrypted message envelopes; any two peers can cheaply determine
//! whether their stores agree over a key range and, if not, discover the
//! minimal set of ranges that must be exchanged to converge.
//!
//! ## Core Principles
//!
//! - **Sealed envelopes**: multi-recipient messages that hide the sender and
//!   the payload, letting each recipient recover the payload with their own
//!   long-term key, while a "world" keypair lets a domain witness recognize
//!   membership without learning anything else.
//! - **Range-hash reconciliation**: a recursive, Merkle-style comparison over
//!   an ordered key space that finds the minimum coalesced set of key ranges
//!   two peers must exchange to converge.
//! - **Library-shaped**: synchronous, invoked from caller threads; no
//!   transport, routing, or gossip topology — those are out of scope.
//!
//! ## Quick Start
//!
//! ```ignore
//! use depot_core::{Envelope, Keypair, Store};
//!
//! let world = Keypair::deterministic("world1");
//! let sender = Keypair::generate();
//! let recipient = Keypair::generate();
//!
//! let envelope = Envelope::seal(&world, &sender, &[recipient.clone()], b"hello, world")?;
//!
//! let store = Store::open("./depot.redb")?;
//! store.create_bucket("mail")?;
//! store.put("mail", envelope.hash()?.as_bytes(), envelope.to_json_string()?.as_bytes())?;
//!
//! let opened = envelope.open(&world, &[recipient])?;
//! assert_eq!(opened.plaintext, b"hello, world");
//! # Ok::<(), depot_core::error::DepotError>(())
//! ```

pub mod collaborators;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod keypair;
pub mod reconcile;
pub mod store;

pub use collaborators::{ContentFetch, SignedTimestamp, TimeAuthorityClient};
pub use envelope::{Envelope, OpenedEnvelope};
pub use error::{DepotError, DepotResult};
pub use keypair::Keypair;
pub use reconcile::{reconcile, DivergentRange, RangeSource};
pub use store::{Edge, RangeDigest, Store};
