//! Difficulty / exploration decision policy
//!
//! A pure function over a candidate pool. The same policy runs for game
//! selection and for track selection inside the chosen game.
//!
//! | exploring | all bands | tiers tried, in order                              |
//! |-----------|-----------|----------------------------------------------------|
//! | yes       | yes       | unscored, full pool                                |
//! | yes       | no        | unscored, in bands, full pool                      |
//! | no        | yes       | full pool                                          |
//! | no        | no        | in bands, then (exploration allowed) unscored, full pool |

use crate::model::{DifficultyBands, Track};
use rand::Rng;

/// Classifies a candidate by recorded accuracy
pub trait DifficultyProfile {
    /// Has no recorded accuracy (for games: any qualifying track without one)
    fn has_unscored(&self) -> bool;

    /// Has a recorded accuracy inside the selected bands
    fn scored_within(&self, bands: &DifficultyBands) -> bool;
}

impl DifficultyProfile for Track {
    fn has_unscored(&self) -> bool {
        self.difficulty_score.is_none()
    }

    fn scored_within(&self, bands: &DifficultyBands) -> bool {
        self.difficulty_score.is_some_and(|s| bands.matches(s))
    }
}

/// Candidate subset considered at one step of the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Unscored,
    InBands,
    FullPool,
}

/// Inputs that decide the tier order
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub exploring: bool,
    pub bands: &'a DifficultyBands,
    pub allow_exploration: bool,
}

/// Outcome of evaluating the policy on a pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierChoice {
    pub tier: Tier,
    /// Indices into the pool belonging to `tier`, never empty
    pub indices: Vec<usize>,
    /// Exploring flag after evaluation; set when the policy fell back to
    /// unscored candidates from a non-exploring start
    pub exploring: bool,
}

/// Tier order for a context
pub fn tier_order(ctx: &PolicyContext<'_>) -> &'static [Tier] {
    match (ctx.exploring, ctx.bands.is_all(), ctx.allow_exploration) {
        (true, true, _) => &[Tier::Unscored, Tier::FullPool],
        (true, false, _) => &[Tier::Unscored, Tier::InBands, Tier::FullPool],
        (false, true, _) => &[Tier::FullPool],
        (false, false, true) => &[Tier::InBands, Tier::Unscored, Tier::FullPool],
        (false, false, false) => &[Tier::InBands],
    }
}

/// First non-empty tier of `pool`, or `None` when every tier is empty
pub fn choose_tier<T: DifficultyProfile>(pool: &[T], ctx: &PolicyContext<'_>) -> Option<TierChoice> {
    for (step, tier) in tier_order(ctx).iter().enumerate() {
        let indices: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, candidate)| match tier {
                Tier::Unscored => candidate.has_unscored(),
                Tier::InBands => candidate.scored_within(ctx.bands),
                Tier::FullPool => true,
            })
            .map(|(i, _)| i)
            .collect();

        if indices.is_empty() {
            continue;
        }

        // Past the in-bands step of a non-exploring evaluation means exploring
        let exploring = ctx.exploring || step > 0;
        return Some(TierChoice {
            tier: *tier,
            indices,
            exploring,
        });
    }

    None
}

/// Evaluate the policy and pick uniformly inside the chosen tier
///
/// Returns the picked index and the exploring flag after evaluation.
pub fn pick<T, R>(pool: &[T], ctx: &PolicyContext<'_>, rng: &mut R) -> Option<(usize, bool)>
where
    T: DifficultyProfile,
    R: Rng + ?Sized,
{
    let choice = choose_tier(pool, ctx)?;
    let index = choice.indices[rng.gen_range(0..choice.indices.len())];
    Some((index, choice.exploring))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Scored(Option<f64>);

    impl DifficultyProfile for Scored {
        fn has_unscored(&self) -> bool {
            self.0.is_none()
        }

        fn scored_within(&self, bands: &DifficultyBands) -> bool {
            self.0.is_some_and(|s| bands.matches(s))
        }
    }

    fn easy_only() -> DifficultyBands {
        DifficultyBands::new([Difficulty::Easy]).unwrap()
    }

    #[test]
    fn test_exploring_prefers_unscored() {
        let bands = DifficultyBands::all();
        let pool = [Scored(Some(0.9)), Scored(None), Scored(Some(0.1))];
        let ctx = PolicyContext { exploring: true, bands: &bands, allow_exploration: true };

        let choice = choose_tier(&pool, &ctx).unwrap();
        assert_eq!(choice.tier, Tier::Unscored);
        assert_eq!(choice.indices, vec![1]);
        assert!(choice.exploring);
    }

    #[test]
    fn test_exploring_all_bands_falls_back_to_full_pool() {
        let bands = DifficultyBands::all();
        let pool = [Scored(Some(0.9)), Scored(Some(0.1))];
        let ctx = PolicyContext { exploring: true, bands: &bands, allow_exploration: true };

        let choice = choose_tier(&pool, &ctx).unwrap();
        assert_eq!(choice.tier, Tier::FullPool);
        assert_eq!(choice.indices, vec![0, 1]);
    }

    #[test]
    fn test_exploring_mixed_bands_tries_bands_before_full_pool() {
        let bands = easy_only();
        let pool = [Scored(Some(0.5)), Scored(Some(0.9))];
        let ctx = PolicyContext { exploring: true, bands: &bands, allow_exploration: true };

        let choice = choose_tier(&pool, &ctx).unwrap();
        assert_eq!(choice.tier, Tier::InBands);
        assert_eq!(choice.indices, vec![1]);

        let out_of_band = [Scored(Some(0.5))];
        let choice = choose_tier(&out_of_band, &ctx).unwrap();
        assert_eq!(choice.tier, Tier::FullPool);
    }

    #[test]
    fn test_not_exploring_all_bands_uses_full_pool() {
        let bands = DifficultyBands::all();
        let pool = [Scored(None), Scored(Some(0.2))];
        let ctx = PolicyContext { exploring: false, bands: &bands, allow_exploration: true };

        let choice = choose_tier(&pool, &ctx).unwrap();
        assert_eq!(choice.tier, Tier::FullPool);
        assert!(!choice.exploring);
    }

    #[test]
    fn test_not_exploring_mixed_bands_prefers_in_band() {
        let bands = easy_only();
        let pool = [Scored(None), Scored(Some(0.8)), Scored(Some(0.4))];
        let ctx = PolicyContext { exploring: false, bands: &bands, allow_exploration: true };

        let choice = choose_tier(&pool, &ctx).unwrap();
        assert_eq!(choice.tier, Tier::InBands);
        assert_eq!(choice.indices, vec![1]);
        assert!(!choice.exploring);
    }

    #[test]
    fn test_not_exploring_switches_to_unscored_when_bands_empty() {
        let bands = easy_only();
        let pool = [Scored(None), Scored(Some(0.4))];
        let ctx = PolicyContext { exploring: false, bands: &bands, allow_exploration: true };

        let choice = choose_tier(&pool, &ctx).unwrap();
        assert_eq!(choice.tier, Tier::Unscored);
        assert_eq!(choice.indices, vec![0]);
        assert!(choice.exploring, "falling back to unscored switches to exploring");
    }

    #[test]
    fn test_not_exploring_full_pool_after_unscored_empty() {
        let bands = easy_only();
        let pool = [Scored(Some(0.4))];
        let ctx = PolicyContext { exploring: false, bands: &bands, allow_exploration: true };

        let choice = choose_tier(&pool, &ctx).unwrap();
        assert_eq!(choice.tier, Tier::FullPool);
        assert!(choice.exploring);
    }

    #[test]
    fn test_strict_bands_without_exploration() {
        let bands = easy_only();
        let pool = [Scored(None), Scored(Some(0.4))];
        let ctx = PolicyContext { exploring: false, bands: &bands, allow_exploration: false };

        assert_eq!(choose_tier(&pool, &ctx), None);
    }

    #[test]
    fn test_empty_pool_has_no_choice() {
        let bands = DifficultyBands::all();
        let pool: [Scored; 0] = [];
        let ctx = PolicyContext { exploring: true, bands: &bands, allow_exploration: true };

        assert_eq!(choose_tier(&pool, &ctx), None);
    }

    #[test]
    fn test_pick_stays_inside_chosen_tier() {
        let bands = easy_only();
        let pool = [Scored(Some(0.1)), Scored(Some(0.9)), Scored(Some(0.95)), Scored(Some(0.5))];
        let ctx = PolicyContext { exploring: false, bands: &bands, allow_exploration: false };
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let (index, exploring) = pick(&pool, &ctx, &mut rng).unwrap();
            assert!(index == 1 || index == 2);
            assert!(!exploring);
        }
    }
}
