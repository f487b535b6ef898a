/// A deterministic one-way digest of a candidate secret, rendered as text.
///
/// The search compares the returned string against the target name, so the
/// encoding is part of the contract: the same secret must always produce the
/// same string.
///
/// Any `Fn(&[u8]) -> String` is a `SecretHasher`, which keeps tests free to
/// substitute a stub with literal, hand-checkable outputs.
pub trait SecretHasher {
    /// Hashes `secret` and encodes the digest as text.
    fn hash(&self, secret: &[u8]) -> String;
}

impl<F> SecretHasher for F
where
    F: Fn(&[u8]) -> String,
{
    fn hash(&self, secret: &[u8]) -> String {
        self(secret)
    }
}

/// SHA-1 digest encoded as standard, padded base64 (always 28 characters).
///
/// # Example
///
/// ```
/// use hashfind::{SecretHasher, Sha1Base64};
///
/// assert_eq!(Sha1Base64.hash(b"abc"), "qZk+NkcGgWq6PiVxeFDCbJzQ2J0=");
/// ```
#[cfg_attr(docsrs, doc(cfg(feature = "sha1")))]
#[cfg(feature = "sha1")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sha1Base64;

#[cfg(feature = "sha1")]
impl Sha1Base64 {
    /// Length of every string produced by this hasher.
    pub const ENCODED_LEN: usize = 28;
}

#[cfg(feature = "sha1")]
impl SecretHasher for Sha1Base64 {
    fn hash(&self, secret: &[u8]) -> String {
        use base64::Engine;
        use sha1::{Digest, Sha1};

        let digest = Sha1::digest(secret);
        base64::engine::general_purpose::STANDARD.encode(digest)
    }
}

#[cfg(all(test, feature = "sha1"))]
mod tests {
    use super::*;

    #[test]
    fn sha1_base64_fixed_vectors() {
        let cases: &[(&[u8], &str)] = &[
            (b"", "2jmj7l5rSw0yVb/vlWAYkK/YBwk="),
            (&[0x00], "W6k8nbDP+T9StSHXQg5D9u2ieE8="),
            (&[0x01], "v4tFMNjSRt10rFOhNHG7oXlB3/c="),
            (&[0xff], "heUyceFABvAmWSHQLU1zbNxYCws="),
            (&[0x00, 0x00], "FIn5I8TcpykXiz4yM0WFUNjd3yk="),
            (b"abc", "qZk+NkcGgWq6PiVxeFDCbJzQ2J0="),
        ];
        for (secret, expected) in cases {
            assert_eq!(Sha1Base64.hash(secret), *expected);
        }
    }

    #[test]
    fn sha1_base64_is_stable_and_fixed_width() {
        for byte in 0..=u8::MAX {
            let first = Sha1Base64.hash(&[byte]);
            assert_eq!(first.len(), Sha1Base64::ENCODED_LEN);
            assert_eq!(first, Sha1Base64.hash(&[byte]));
        }
    }

    #[test]
    fn closures_are_hashers() {
        let stub = |secret: &[u8]| format!("{:02x}", secret[0]);
        assert_eq!(stub.hash(&[0xab]), "ab");
        assert_eq!(stub.hash(&[0x01, 0xff]), "01");
    }
}
