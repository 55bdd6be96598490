//! ballotbox-core: Voting session state machine and tally engine.
//!
//! This crate implements the ledger behind one or more voting rounds:
//! - `Session`: one round's rosters, votes, and lifecycle flags
//! - `SessionRegistry`: many independently-lifecycled rounds (approval-gated)
//! - `Election`: a single round with named candidates and ballots (start-gated)
//!
//! Callers are authenticated by the hosting substrate and threaded through
//! every mutating operation as an explicit [`ActorId`]; `SignedOperation`
//! models that seam for substrates that deliver Ed25519-signed requests.
//! Applied mutations land in an append-only journal, and the whole ledger
//! hashes to a content [`Digest`] for audit.

mod audit;
pub mod bootstrap;
mod election;
mod error;
mod identity;
mod registry;
mod request;
mod session;

pub use audit::{Digest, Event, Journal, digest_of};
pub use election::{Ballot, Election};
pub use error::Error;
pub use identity::{ActorId, Credential};
pub use registry::{SessionRegistry, SharedRegistry};
pub use request::{Operation, Outcome, SignedOperation};
pub use session::{Candidate, Session, VotingGate};

/// Re-export for convenience
pub use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
