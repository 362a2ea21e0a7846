//! Interfaces to external collaborators that live outside the core's scope:
//! a content-addressed envelope relay and a signed-time authority. Neither
//! is implemented here — only the shape of the interface the core assumes,
//! so an application can plug in its own transport.

use crate::envelope::Envelope;
use crate::error::DepotResult;
use crate::keypair::Keypair;

/// An opaque, externally-signed timestamp. The core never produces or
/// verifies these; it only carries them as bytes for an application layer
/// that wants to embed freshness claims in payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTimestamp(pub Vec<u8>);

/// The shape of a time authority collaborator: `GET /now`, `GET
/// /authenticate?now=...`, `GET /public`. No HTTP client is bundled; an
/// application provides its own implementation over whatever transport it
/// uses.
pub trait TimeAuthorityClient {
    /// Fetch a freshly signed timestamp.
    fn now(&self) -> DepotResult<SignedTimestamp>;

    /// Verify a previously fetched signed timestamp and recover the UTC
    /// timestamp string it attests to.
    fn authenticate(&self, signed: &SignedTimestamp) -> DepotResult<String>;

    /// The authority's public key.
    fn public_key(&self) -> DepotResult<Keypair>;
}

/// The shape of a content-addressed envelope relay: `GET /add/{hash}`. The
/// core does not depend on this beyond consuming the envelope JSON it
/// returns.
pub trait ContentFetch {
    /// Fetch an envelope by its content hash (see [`Envelope::hash`]).
    fn fetch(&self, hash: &str) -> DepotResult<Envelope>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DepotError;

    struct AlwaysMissing;
    impl ContentFetch for AlwaysMissing {
        fn fetch(&self, _hash: &str) -> DepotResult<Envelope> {
            Err(DepotError::NoSuchKey)
        }
    }

    #[test]
    fn content_fetch_trait_is_object_usable() {
        let fetcher: Box<dyn ContentFetch> = Box::new(AlwaysMissing);
        assert!(fetcher.fetch("deadbeef").is_err());
    }
}
