//! Journal and audit digests.
//!
//! Every applied mutation appends one [`Event`] to the owning ledger's
//! [`Journal`]; failed operations append nothing, so the journal is an
//! exact record of what took effect. Votes and choices are public by
//! design, so events carry them in the clear.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ActorId, Error, identity};

/// One applied mutation. `session` is the round's id within its ledger;
/// a single election journals its only round as 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    SessionCreated { session: usize, admin: ActorId },
    CandidateRegistered { session: usize, index: usize, name: String },
    VoterRegistered { session: usize, voter: ActorId },
    SessionApproved { session: usize },
    SessionStarted { session: usize },
    SessionEnded { session: usize },
    VoteCast { session: usize, voter: ActorId, candidate: usize },
    BallotCreated { session: usize, ballot: usize, name: String },
}

/// Append-only record of applied events.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    events: Vec<Event>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Only the ledger's mutation paths call this, after
    /// the mutation has taken effect.
    pub(crate) fn record(&mut self, event: Event) {
        tracing::debug!(?event, "ledger event");
        self.events.push(event);
    }

    /// Events in application order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}

/// A 32-byte BLAKE3 ledger digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn to_hex(&self) -> String {
        identity::hex_encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        identity::hex_decode(s).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Content digest of any serializable ledger: BLAKE3 over the CBOR
/// encoding. Equal ledgers hash equal; any mutation changes the digest.
pub fn digest_of<T: Serialize>(value: &T) -> Result<Digest, Error> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)?;
    Ok(Digest(*blake3::hash(&buf).as_bytes()))
}
