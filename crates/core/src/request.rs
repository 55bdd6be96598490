//! Signed operation envelopes.
//!
//! The hosting substrate supplies an authenticated caller per call. This
//! module is that seam made explicit: a [`SignedOperation`] carries the
//! caller's verifying key, the operation payload, and an Ed25519
//! signature over the CBOR encoding of both. Verification recomputes the
//! [`ActorId`] from the embedded key, so the proven caller cannot be
//! spoofed without the matching signing key. The in-process registry API
//! takes a plain `ActorId`; signatures are interpreted only here.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::{ActorId, Credential, Error};

/// A mutating registry operation, as carried by an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    CreateSession,
    RegisterAsCandidate { session: usize },
    RegisterAsVoter { session: usize },
    ApproveSession { session: usize },
    StartSession { session: usize },
    EndSession { session: usize },
    Vote { session: usize, candidate: usize },
}

/// What an applied envelope did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    SessionCreated(usize),
    CandidateRegistered(usize),
    VoterRegistered,
    Approved,
    Started,
    Ended,
    VoteRecorded,
}

/// An operation plus proof of who asked for it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedOperation {
    /// The caller's Ed25519 verifying key.
    public_key: [u8; 32],

    /// The requested mutation.
    operation: Operation,

    /// Unix timestamp in milliseconds.
    timestamp: u64,

    /// Ed25519 signature over the envelope content.
    signature: Vec<u8>,
}

impl SignedOperation {
    /// Build and sign an envelope with `credential`.
    pub fn new(credential: &Credential, operation: Operation) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        let mut envelope = Self {
            public_key: credential.verifying_key().to_bytes(),
            operation,
            timestamp,
            signature: Vec::new(),
        };

        let content = envelope.signable_content();
        envelope.signature = credential.sign(&content).to_bytes().to_vec();
        envelope
    }

    /// The content covered by the signature (everything but the signature).
    fn signable_content(&self) -> Vec<u8> {
        let signable = SignableOperation {
            public_key: &self.public_key,
            operation: &self.operation,
            timestamp: self.timestamp,
        };

        let mut buf = Vec::new();
        ciborium::into_writer(&signable, &mut buf).expect("serialization should not fail");
        buf
    }

    /// Check the signature and return the proven caller identity.
    pub fn verify(&self) -> Result<ActorId, Error> {
        let key =
            VerifyingKey::from_bytes(&self.public_key).map_err(|_| Error::InvalidSignature)?;

        if self.signature.len() != 64 {
            return Err(Error::InvalidSignature);
        }
        let sig_bytes: [u8; 64] = self.signature.clone().try_into().unwrap();
        let signature = Signature::from_bytes(&sig_bytes);

        key.verify(&self.signable_content(), &signature)
            .map_err(|_| Error::InvalidSignature)?;

        Ok(ActorId::of_key(&key))
    }

    /// The requested operation.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// When the envelope was created (Unix millis).
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Helper struct for signing (excludes the signature field).
#[derive(Serialize)]
struct SignableOperation<'a> {
    public_key: &'a [u8; 32],
    operation: &'a Operation,
    timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_verifies_and_proves_caller() {
        let cred = Credential::generate();
        let envelope = SignedOperation::new(&cred, Operation::CreateSession);

        assert_eq!(envelope.verify().unwrap(), cred.actor_id());
    }

    #[test]
    fn corrupted_signature_rejected() {
        let cred = Credential::generate();
        let mut envelope =
            SignedOperation::new(&cred, Operation::Vote { session: 0, candidate: 1 });
        envelope.signature[0] ^= 0xFF;

        assert!(matches!(envelope.verify(), Err(Error::InvalidSignature)));
    }

    #[test]
    fn tampered_payload_rejected() {
        let cred = Credential::generate();
        let mut envelope =
            SignedOperation::new(&cred, Operation::RegisterAsVoter { session: 0 });
        envelope.operation = Operation::RegisterAsVoter { session: 7 };

        assert!(matches!(envelope.verify(), Err(Error::InvalidSignature)));
    }

    #[test]
    fn wrong_key_cannot_claim_identity() {
        let cred = Credential::generate();
        let other = Credential::generate();
        let envelope = SignedOperation::new(&cred, Operation::CreateSession);

        // a valid envelope proves its own key's identity, not anyone else's
        assert_ne!(envelope.verify().unwrap(), other.actor_id());
    }
}
