//! Dissimilarity based puzzle selection.
//!
//! Picks the candidate whose layout is least like anything in the recency
//! window. Fingerprints are pulled lazily from a [`FingerprintSource`] so a
//! large catalog only pays for the sampled candidates.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::hash::Hash;

use crate::error::SochiError;
use crate::fingerprint::similarity;

/// Default number of recent publications compared against.
pub const DEFAULT_RECENT_LIMIT: usize = 5;
/// Default cap on candidates evaluated per selection.
pub const DEFAULT_MAX_SAMPLE: usize = 200;

/// Supplies fingerprints for candidate identifiers.
pub trait FingerprintSource<C: ?Sized> {
    type Symbol: PartialEq;

    fn fingerprint(&self, candidate: &C) -> Result<Vec<Self::Symbol>, SochiError>;
}

/// Chosen candidate with its closeness to history.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<C> {
    pub candidate: C,
    /// Highest similarity against any recent fingerprint. `0.0` when there
    /// was no history to compare against.
    pub closeness: f64,
}

/// Result of applying the reuse policy to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligible<C> {
    pub candidates: Vec<C>,
    /// True when every item had already been published and reuse was allowed.
    pub reused: bool,
}

/// Prefer never-published items; fall back to the whole catalog once all are used.
pub fn eligible_candidates<C>(all: &[C], used: &HashSet<C>) -> Eligible<C>
where
    C: Clone + Eq + Hash,
{
    let fresh: Vec<C> = all.iter().filter(|c| !used.contains(*c)).cloned().collect();
    if fresh.is_empty() && !all.is_empty() {
        tracing::warn!(total = all.len(), "all puzzles used, allowing reuse");
        return Eligible {
            candidates: all.to_vec(),
            reused: true,
        };
    }
    Eligible {
        candidates: fresh,
        reused: false,
    }
}

/// Highest similarity between `fp` and any of `history`.
pub fn closeness<T: PartialEq>(fp: &[T], history: &[Vec<T>]) -> f64 {
    history
        .iter()
        .map(|h| similarity(fp, h))
        .fold(0.0, f64::max)
}

/// Select the candidate least similar to the recent publications.
///
/// With an empty `recent` window a uniformly random candidate is returned.
/// Otherwise at most `max_sample` candidates are scored and the first one
/// with the lowest closeness wins.
pub fn select_dissimilar<C, S, R>(
    candidates: &[C],
    recent: &[C],
    source: &S,
    max_sample: usize,
    rng: &mut R,
) -> Result<Selection<C>, SochiError>
where
    C: Clone,
    S: FingerprintSource<C> + ?Sized,
    R: Rng + ?Sized,
{
    if candidates.is_empty() {
        return Err(SochiError::InvalidInput("no candidates to select from".into()));
    }
    if max_sample == 0 {
        return Err(SochiError::InvalidInput("max_sample must be positive".into()));
    }

    if recent.is_empty() {
        let chosen = candidates
            .choose(rng)
            .cloned()
            .ok_or_else(|| SochiError::InvalidInput("no candidates to select from".into()))?;
        return Ok(Selection {
            candidate: chosen,
            closeness: 0.0,
        });
    }

    let history = recent
        .iter()
        .map(|r| source.fingerprint(r))
        .collect::<Result<Vec<_>, _>>()?;

    let sample: Vec<&C> = if candidates.len() > max_sample {
        candidates.choose_multiple(rng, max_sample).collect()
    } else {
        candidates.iter().collect()
    };

    let mut best: Option<(&C, f64)> = None;
    for cand in sample {
        let fp = source.fingerprint(cand)?;
        let score = closeness(&fp, &history);
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((cand, score)),
        }
    }

    let (chosen, score) =
        best.ok_or_else(|| SochiError::InvalidInput("no candidates to select from".into()))?;
    Ok(Selection {
        candidate: chosen.clone(),
        closeness: score,
    })
}
