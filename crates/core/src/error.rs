//! Error types for ballotbox-core.

use thiserror::Error;

use crate::ActorId;

/// Core errors. Every precondition violation aborts the whole operation;
/// callers observe unchanged state on any `Err`.
#[derive(Debug, Error)]
pub enum Error {
    /// Session id out of range.
    #[error("session not found: {0}")]
    SessionNotFound(usize),

    /// Candidate index out of range for a lookup.
    #[error("candidate not found: {0}")]
    CandidateNotFound(usize),

    /// Ballot id out of range.
    #[error("ballot not found: {0}")]
    BallotNotFound(usize),

    /// The voter has no recorded choice.
    #[error("no vote recorded for voter: {0}")]
    VoterNotFound(ActorId),

    /// A lifecycle transition was attempted by someone other than the admin.
    #[error("caller is not the admin of this voting round")]
    Unauthorized,

    /// The caller is already on the voter roster.
    #[error("voter is already registered")]
    AlreadyRegistered,

    /// The caller already cast a vote in this round.
    #[error("already voted")]
    AlreadyVoted,

    /// The caller is not on the voter roster.
    #[error("caller is not a registered voter")]
    NotRegistered,

    /// The caller identity is already on the candidate roster.
    #[error("candidate identity is already registered")]
    DuplicateCandidate,

    /// The round is not accepting votes.
    #[error("voting is closed")]
    VotingClosed,

    /// The round is not accepting voter registrations.
    #[error("voter registration is closed")]
    RegistrationClosed,

    /// Illegal lifecycle transition.
    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),

    /// Vote target out of range.
    #[error("candidate index {index} out of range ({count} candidates)")]
    InvalidCandidate { index: usize, count: usize },

    /// Candidate names must be non-empty.
    #[error("candidate name must not be empty")]
    EmptyCandidateName,

    /// Ballot end time must come after its start time.
    #[error("ballot ends at {end}, not after start {start}")]
    InvalidSchedule { start: u64, end: u64 },

    /// Winner query on an empty candidate roster.
    #[error("no candidates registered")]
    NoCandidates,

    /// Winner query where the winning candidate has no enrolled identity.
    #[error("winning candidate has no enrolled identity")]
    NoCandidateIdentity,

    /// Signature verification failed.
    #[error("invalid operation signature")]
    InvalidSignature,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<ciborium::ser::Error<std::io::Error>> for Error {
    fn from(e: ciborium::ser::Error<std::io::Error>) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<ciborium::de::Error<std::io::Error>> for Error {
    fn from(e: ciborium::de::Error<std::io::Error>) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
