//! Slot ownership planning
//!
//! Every player owns `track_count / players` slots. The remaining
//! `track_count % players` slots go to distinct, randomly drawn players, so
//! no player owns more than one extra slot. The plan is shuffled before the
//! composer walks it.

use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

/// Owner of each slot, in fill-attempt order
pub fn plan_slots<R: Rng + ?Sized>(
    players: &[Uuid],
    track_count: usize,
    rng: &mut R,
) -> Result<Vec<Uuid>> {
    if players.is_empty() {
        return Err(Error::NoEligiblePlayers);
    }

    let per_player = track_count / players.len();
    let remainder = track_count % players.len();

    let mut slots: Vec<Uuid> = Vec::with_capacity(track_count);
    for player in players {
        slots.extend(std::iter::repeat(*player).take(per_player));
    }
    slots.extend(players.choose_multiple(rng, remainder).copied());

    slots.shuffle(rng);
    Ok(slots)
}
