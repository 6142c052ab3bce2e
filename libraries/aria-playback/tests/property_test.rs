//! Property-based tests for the playback queue
//!
//! Uses proptest to verify queue invariants across random edit sequences.

use aria_core::{AlbumRef, ArtistRef, Track};
use aria_playback::{QueueManager, RepeatMode, ShuffleStrategy};
use proptest::prelude::*;
use std::time::Duration;

// ===== Helpers =====

fn make_tracks(count: usize, artists: usize) -> Vec<Track> {
    (0..count)
        .map(|i| {
            let artist = format!("ar{}", i % artists.max(1));
            Track::new(
                format!("t{}", i),
                format!("Track {}", i),
                ArtistRef::new(artist.clone(), artist),
                AlbumRef::new("al", "Album"),
                180_000,
            )
        })
        .collect()
}

fn ids(queue: &QueueManager) -> Vec<String> {
    queue.items().iter().map(|t| t.id.to_string()).collect()
}

fn strategy() -> impl Strategy<Value = ShuffleStrategy> {
    prop_oneof![Just(ShuffleStrategy::Random), Just(ShuffleStrategy::ArtistSpread)]
}

#[derive(Debug, Clone)]
enum Op {
    Append,
    InsertNext,
    Remove(usize),
    Cursor(usize),
    Reorder(usize, usize),
    Shuffle,
    Clear,
    Undo,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Append),
        Just(Op::InsertNext),
        (0usize..40).prop_map(Op::Remove),
        (0usize..40).prop_map(Op::Cursor),
        (0usize..40, 0usize..40).prop_map(|(a, b)| Op::Reorder(a, b)),
        Just(Op::Shuffle),
        Just(Op::Clear),
        Just(Op::Undo),
    ]
}

// ===== Property Tests =====

proptest! {
    /// Property: the cursor is None exactly when the queue is empty, and in range otherwise
    #[test]
    fn cursor_always_in_bounds(
        initial in 0usize..20,
        ops in prop::collection::vec(op(), 1..40)
    ) {
        let mut queue = QueueManager::new(Duration::from_secs(1), ShuffleStrategy::Random);
        queue.replace_all(make_tracks(initial, 4));
        let mut next_id = initial;

        for op in ops {
            match op {
                Op::Append => {
                    queue.append(make_tracks(next_id + 1, 4).pop().unwrap());
                    next_id += 1;
                }
                Op::InsertNext => {
                    queue.insert_after_current(make_tracks(next_id + 1, 4).pop().unwrap());
                    next_id += 1;
                }
                Op::Remove(i) => { queue.remove_at(i).ok(); }
                Op::Cursor(i) => { queue.set_cursor(i).ok(); }
                Op::Reorder(a, b) => { queue.reorder(a, b).ok(); }
                Op::Shuffle => queue.toggle_shuffle(),
                Op::Clear => queue.clear(),
                Op::Undo => { queue.undo(); }
            }

            match queue.current_index() {
                None => prop_assert!(queue.is_empty()),
                Some(c) => prop_assert!(c < queue.len(), "cursor {} len {}", c, queue.len()),
            }
        }
    }

    /// Property: shuffle on then off restores the exact order and keeps the current track
    #[test]
    fn shuffle_round_trip_restores_order(
        count in 1usize..30,
        cursor in 0usize..30,
        strategy in strategy()
    ) {
        let mut queue = QueueManager::new(Duration::from_secs(1), strategy);
        queue.replace_all(make_tracks(count, 3));
        queue.set_cursor(cursor % count).unwrap();
        let before = ids(&queue);
        let current = queue.current().unwrap().id.clone();

        queue.toggle_shuffle();
        prop_assert!(queue.shuffle_enabled());
        queue.toggle_shuffle();

        prop_assert_eq!(ids(&queue), before);
        prop_assert_eq!(&queue.current().unwrap().id, &current);
    }

    /// Property: shuffle-on puts the current track first and keeps the same multiset
    #[test]
    fn shuffle_keeps_current_first(
        count in 1usize..30,
        cursor in 0usize..30,
        strategy in strategy()
    ) {
        let mut queue = QueueManager::new(Duration::from_secs(1), strategy);
        queue.replace_all(make_tracks(count, 5));
        queue.set_cursor(cursor % count).unwrap();
        let current = queue.current().unwrap().id.clone();
        let mut before = ids(&queue);

        queue.toggle_shuffle();

        prop_assert_eq!(queue.current_index(), Some(0));
        prop_assert_eq!(&queue.get(0).unwrap().id, &current);

        let mut after = ids(&queue);
        before.sort();
        after.sort();
        prop_assert_eq!(after, before);
    }

    /// Property: undo right after a remove restores the previous queue exactly
    #[test]
    fn undo_reverts_remove(
        count in 1usize..25,
        cursor in 0usize..25,
        remove in 0usize..25
    ) {
        let mut queue = QueueManager::default();
        queue.replace_all(make_tracks(count, 2));
        queue.set_cursor(cursor % count).unwrap();
        let before = ids(&queue);
        let current_before = queue.current().unwrap().id.clone();

        queue.remove_at(remove % count).unwrap();
        prop_assert!(queue.undo());

        prop_assert_eq!(ids(&queue), before);
        prop_assert_eq!(&queue.current().unwrap().id, &current_before);
        prop_assert!(!queue.undo());
    }

    /// Property: undo right after clear restores items and cursor
    #[test]
    fn undo_reverts_clear(count in 1usize..25, cursor in 0usize..25) {
        let mut queue = QueueManager::default();
        queue.replace_all(make_tracks(count, 2));
        queue.set_cursor(cursor % count).unwrap();
        let before = ids(&queue);
        let cursor_before = queue.current_index();

        queue.clear();
        prop_assert!(queue.is_empty());
        prop_assert!(queue.undo());

        prop_assert_eq!(ids(&queue), before);
        prop_assert_eq!(queue.current_index(), cursor_before);
    }

    /// Property: under repeat-all, next/previous always exist and stay in range
    #[test]
    fn repeat_all_navigation_wraps(count in 1usize..20, cursor in 0usize..20) {
        let mut queue = QueueManager::default();
        queue.replace_all(make_tracks(count, 2));
        queue.set_cursor(cursor % count).unwrap();
        queue.set_repeat_mode(RepeatMode::All);

        let next = queue.next_index().unwrap();
        let previous = queue.previous_index().unwrap();
        prop_assert!(next < count);
        prop_assert!(previous < count);
        prop_assert_eq!(next, (cursor % count + 1) % count);
    }
}
