//! Shuffle algorithms for queue randomization
//!
//! Both strategies only permute; the caller decides which slice is shuffled
//! (the queue keeps the current track out of it).

use crate::types::ShuffleStrategy;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::{HashMap, VecDeque};

/// Shuffle `items` in place
///
/// `artist_of` is only consulted by `ShuffleStrategy::ArtistSpread`.
pub fn shuffle_items<T, F>(items: &mut Vec<T>, strategy: ShuffleStrategy, artist_of: F)
where
    F: Fn(&T) -> &str,
{
    match strategy {
        ShuffleStrategy::Random => shuffle_random(items),
        ShuffleStrategy::ArtistSpread => shuffle_artist_spread(items, artist_of),
    }
}

/// Fisher-Yates
fn shuffle_random<T>(items: &mut [T]) {
    items.shuffle(&mut thread_rng());
}

/// Group by artist, shuffle within and across groups, then deal round-robin
fn shuffle_artist_spread<T, F>(items: &mut Vec<T>, artist_of: F)
where
    F: Fn(&T) -> &str,
{
    if items.len() <= 2 {
        shuffle_random(items);
        return;
    }

    let mut rng = thread_rng();
    let mut group_of: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<T>> = Vec::new();

    for item in items.drain(..) {
        let artist = artist_of(&item).to_string();
        let slot = *group_of.entry(artist).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item);
    }

    for group in &mut groups {
        group.shuffle(&mut rng);
    }
    groups.shuffle(&mut rng);

    let mut decks: Vec<VecDeque<T>> = groups.into_iter().map(VecDeque::from).collect();
    while decks.iter().any(|deck| !deck.is_empty()) {
        for deck in &mut decks {
            if let Some(item) = deck.pop_front() {
                items.push(item);
            }
        }
    }
}
