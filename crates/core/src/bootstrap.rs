//! Election bootstrap.
//!
//! Builds a ready election from parameters: the administering identity
//! plus a slate of named candidates, registered in order before anything
//! else happens.

use crate::{ActorId, Election, Error};

/// Parameters for constructing an election.
pub struct ElectionParams {
    /// The identity allowed to start and end the election.
    pub admin: ActorId,
    /// `(name, party)` pairs registered in slate order.
    pub slate: Vec<(String, Option<String>)>,
}

/// Create an election with its slate pre-registered.
pub fn create_election(params: ElectionParams) -> Result<Election, Error> {
    let mut election = Election::new(params.admin);
    for (name, party) in params.slate {
        election.add_candidate(name, party)?;
    }
    Ok(election)
}
