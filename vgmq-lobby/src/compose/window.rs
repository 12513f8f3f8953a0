//! Playback window and accepted answers of a composed round

use crate::model::{Game, Lineage, Track, TrackKind};
use rand::Rng;
use std::collections::HashSet;

/// Start and end offsets (seconds) of the audio played for a round
///
/// Tracks shorter than the window play in full. Otherwise the end point is
/// uniform in `[window, duration]`, rounded to `decimals` places.
pub fn playback_window<R: Rng + ?Sized>(
    duration: f64,
    window: f64,
    decimals: u32,
    rng: &mut R,
) -> (f64, f64) {
    if window > duration {
        return (0.0, duration);
    }

    let end = round_to(rng.gen_range(window..=duration), decimals).clamp(window, duration);
    (end - window, end)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Games accepted as a correct guess for `track`
///
/// The lineage's Original game comes first, followed by the games of every
/// Derivative. A Derivative without a known Original is answered by its own
/// game.
pub fn accepted_answers(track: &Track, lineage: &Lineage) -> Vec<Game> {
    let original = match (&track.kind, &lineage.original_game) {
        (TrackKind::Original, _) => track.game.clone(),
        (TrackKind::Derivative { .. }, Some(game)) => game.clone(),
        (TrackKind::Derivative { .. }, None) => track.game.clone(),
    };

    let mut seen = HashSet::new();
    std::iter::once(original)
        .chain(lineage.derivative_games.iter().cloned())
        .filter(|game| seen.insert(game.id))
        .collect()
}
