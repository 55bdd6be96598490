//! Caller identities and signing credentials.
//!
//! The hosting substrate authenticates every call; inside the engine a
//! caller is just an [`ActorId`] threaded explicitly through each mutating
//! operation. An actor id is the BLAKE3 hash of an Ed25519 verifying key,
//! so ids are stable, opaque, and unforgeable without the matching key.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A caller identity: the BLAKE3 hash of the caller's verifying key.
///
/// Ordered so rosters and vote maps can live in `BTreeMap`/`BTreeSet`
/// and iterate deterministically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId([u8; 32]);

impl ActorId {
    /// Derive the id of a verifying key.
    pub fn of_key(key: &VerifyingKey) -> Self {
        Self(*blake3::hash(key.as_bytes()).as_bytes())
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        hex_decode(s).map(Self)
    }

    /// Raw bytes of the id.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for ActorId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A signing credential held by a caller.
///
/// The engine never stores credentials; they exist so the substrate (and
/// tests) can mint identities and sign operation envelopes.
pub struct Credential {
    signing_key: SigningKey,
}

impl Credential {
    /// Generate a fresh credential from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Wrap an existing signing key.
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// The id this credential authenticates as.
    pub fn actor_id(&self) -> ActorId {
        ActorId::of_key(&self.signing_key.verifying_key())
    }

    /// The public half of the credential.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign an arbitrary message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

/// Hex-encode 32 bytes.
pub(crate) fn hex_encode(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for byte in bytes {
        s.push_str(&format!("{byte:02x}"));
    }
    s
}

/// Parse 32 bytes from a 64-character hex string.
pub(crate) fn hex_decode(s: &str) -> Option<[u8; 32]> {
    if s.len() != 64 {
        return None;
    }
    let mut bytes = [0u8; 32];
    for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
        let hex = std::str::from_utf8(chunk).ok()?;
        bytes[i] = u8::from_str_radix(hex, 16).ok()?;
    }
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        let cred = Credential::generate();
        assert_eq!(cred.actor_id(), ActorId::of_key(&cred.verifying_key()));
    }

    #[test]
    fn distinct_keys_distinct_ids() {
        let a = Credential::generate();
        let b = Credential::generate();
        assert_ne!(a.actor_id(), b.actor_id());
    }

    #[test]
    fn hex_roundtrip() {
        let id = Credential::generate().actor_id();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(ActorId::from_hex(&hex), Some(id));
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert_eq!(ActorId::from_hex("abc"), None);
        assert_eq!(ActorId::from_hex(&"zz".repeat(32)), None);
    }
}
