//! # Shared Search Types
//!
//! This module fixes the hasher the service searches with and translates
//! between the wire messages in [`proto`](crate::proto) and the
//! [`hashfind`] search types.
//!
//! ## Type Aliases
//!
//! - [`Hasher`] - The digest every worker computes (SHA-1, base64 encoded).
//!
//! ## Conversions
//!
//! - [`HashNameRequest`] -> [`SearchParams`]: the desired name becomes the
//!   target bytes, the distances carry over unchanged. No ordering between
//!   the two distances is enforced.
//! - [`Match`] -> [`HashNameResponse`]: the raw secret is base64 encoded for
//!   transport. The absence of a match is `HashNameResponse::default()`.
//!
//! > ⚠️ The hasher is fixed at compile time. Clients compare the returned
//! > `hashed_name` against their own digest of `secret`, so changing it
//! > changes the contract.

use crate::proto::{HashNameRequest, HashNameResponse};
use base64::Engine;
use hashfind::{Match, SearchParams, Sha1Base64};

/// The digest used by the service.
pub type Hasher = Sha1Base64;

/// Length of every `hashed_name` produced by [`Hasher`]. A `desired_name`
/// longer than this can never be compared.
pub const DIGEST_LEN: usize = Sha1Base64::ENCODED_LEN;

impl From<HashNameRequest> for SearchParams {
    fn from(req: HashNameRequest) -> Self {
        let params = Self::new(req.desired_name, req.ideal_hamming_distance as usize);
        match req.interesting_hamming_distance {
            Some(distance) => params.with_interesting_distance(distance as usize),
            None => params,
        }
    }
}

impl From<Match> for HashNameResponse {
    fn from(m: Match) -> Self {
        Self {
            secret: base64::engine::general_purpose::STANDARD.encode(&m.secret),
            hashed_name: m.digest,
            // Distances are bounded by the digest length.
            hamming_distance: u32::try_from(m.distance).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashfind::SecretHasher;

    #[test]
    fn request_without_interesting_distance() {
        let params = SearchParams::from(HashNameRequest {
            desired_name: "cat".to_string(),
            ideal_hamming_distance: 1,
            interesting_hamming_distance: None,
        });
        assert_eq!(params, SearchParams::new("cat", 1));
    }

    #[test]
    fn request_with_interesting_distance() {
        let params = SearchParams::from(HashNameRequest {
            desired_name: "cat".to_string(),
            ideal_hamming_distance: 0,
            interesting_hamming_distance: Some(2),
        });
        assert_eq!(params.interesting_distance(), Some(2));
        assert_eq!(params.ideal_distance(), 0);
        assert_eq!(params.target(), b"cat");
    }

    #[test]
    fn inverted_distances_are_passed_through() {
        let params = SearchParams::from(HashNameRequest {
            desired_name: "cat".to_string(),
            ideal_hamming_distance: 3,
            interesting_hamming_distance: Some(1),
        });
        assert_eq!(params.ideal_distance(), 3);
        assert_eq!(params.interesting_distance(), Some(1));
    }

    #[test]
    fn match_encodes_secret_as_base64() {
        let secret = vec![0x00, 0x0c];
        let response = HashNameResponse::from(Match {
            digest: Hasher::default().hash(&secret),
            secret,
            distance: 0,
        });
        assert_eq!(
            response,
            HashNameResponse {
                secret: "AAw=".to_string(),
                hashed_name: "X3ft/TkEIFpHiWOVYl3QWKmWnXg=".to_string(),
                hamming_distance: 0,
            }
        );
        assert_eq!(response.hashed_name.len(), DIGEST_LEN);
    }

    #[test]
    fn absent_match_is_all_defaults() {
        let empty = HashNameResponse::default();
        assert!(empty.secret.is_empty());
        assert!(empty.hashed_name.is_empty());
        assert_eq!(empty.hamming_distance, 0);
    }
}
