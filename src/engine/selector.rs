//! Choosing the next playlist position.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::IndexedRandom;

use super::types::Sequencing;

/// Compute the track that follows `current` after moving by `delta`.
///
/// With shuffle on, `delta` is ignored and a uniformly random track other
/// than `current` is returned (the only track, for a one-track list).
/// Otherwise the position moves by `delta`, wrapping when looping, and
/// walking off either end without looping yields `None`. No current track
/// counts as the position just before the first one.
pub fn select_next<R: Rng + ?Sized>(
    len: usize,
    current: Option<usize>,
    delta: i64,
    sequencing: Sequencing,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }

    if sequencing.shuffle {
        if len == 1 {
            return Some(0);
        }
        return Some(match current.filter(|&c| c < len) {
            // Draw from the other len - 1 slots, skipping over `current`.
            Some(c) => {
                let pick = rng.random_range(0..len - 1);
                if pick >= c { pick + 1 } else { pick }
            }
            None => rng.random_range(0..len),
        });
    }

    let len = len as i64;
    let next = current.map_or(-1, |c| c as i64).saturating_add(delta);
    if sequencing.loop_play {
        Some(next.rem_euclid(len) as usize)
    } else if (0..len).contains(&next) {
        Some(next as usize)
    } else {
        None
    }
}

/// A uniformly random track that is not in `tried`, if any is left.
pub fn select_untried<R: Rng + ?Sized>(
    len: usize,
    tried: &BTreeSet<usize>,
    rng: &mut R,
) -> Option<usize> {
    let left: Vec<usize> = (0..len).filter(|i| !tried.contains(i)).collect();
    left.choose(rng).copied()
}
