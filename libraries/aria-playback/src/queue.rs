//! Queue management
//!
//! An ordered list of tracks with a cursor, shuffle/repeat state and a
//! single-slot undo buffer.
//!
//! Duplicates are allowed, so every entry carries an `InstanceId` that is
//! unique for the queue's lifetime. The cursor follows instances across
//! reorder/shuffle, and the pre-shuffle baseline is kept as a list of
//! instances so that per-track edits (played, rating) made while shuffled
//! survive shuffle-off.

use aria_core::Track;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{PlaybackError, Result};
use crate::persistence::{PersistedQueue, PersistenceScheduler, QueueSnapshot, WriteMode};
use crate::shuffle::shuffle_items;
use crate::types::{PlaybackPreferences, RepeatMode, ShuffleStrategy};

/// Identity of one queue entry (stable across reorder and shuffle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

#[derive(Debug, Clone)]
struct Entry {
    id: InstanceId,
    track: Track,
}

/// Last destructive action, as seen by callers
#[derive(Debug, Clone, PartialEq)]
pub enum UndoRecord {
    /// `remove_at` took `track` out of `index`
    RemovedItem {
        /// Removed track
        track: Track,
        /// Position it was removed from
        index: usize,
    },
    /// `clear` emptied the queue
    ClearedQueue {
        /// Items before the clear
        items: Vec<Track>,
        /// Cursor before the clear
        cursor: Option<usize>,
    },
}

#[derive(Debug, Clone)]
enum UndoSlot {
    Removed {
        entry: Entry,
        index: usize,
        was_current: bool,
        /// Track that was current right after the remove
        current_after: Option<InstanceId>,
        baseline_index: Option<usize>,
    },
    Cleared {
        entries: Vec<Entry>,
        cursor: Option<usize>,
        original_order: Option<Vec<InstanceId>>,
    },
}

/// Ordered track queue
#[derive(Debug, Clone)]
pub struct QueueManager {
    entries: Vec<Entry>,
    cursor: Option<usize>,
    repeat_mode: RepeatMode,
    original_order: Option<Vec<InstanceId>>,
    last_action: Option<UndoSlot>,
    strategy: ShuffleStrategy,
    persistence: PersistenceScheduler,
    next_id: u64,
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), ShuffleStrategy::default())
    }
}

impl QueueManager {
    /// Create an empty queue
    pub fn new(debounce: Duration, strategy: ShuffleStrategy) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            repeat_mode: RepeatMode::Off,
            original_order: None,
            last_action: None,
            strategy,
            persistence: PersistenceScheduler::new(debounce),
            next_id: 0,
        }
    }

    // ===== Mutations =====

    /// Add a track to the end
    ///
    /// The cursor only moves when the queue was empty (it becomes 0).
    pub fn append(&mut self, track: Track) {
        let entry = self.new_entry(track);
        if let Some(baseline) = self.original_order.as_mut() {
            baseline.push(entry.id);
        }
        self.entries.push(entry);
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
        self.touch(WriteMode::Debounced);
    }

    /// Insert a track right after the current one (position 0 when empty)
    pub fn insert_after_current(&mut self, track: Track) {
        let entry = self.new_entry(track);
        let position = self.cursor.map_or(0, |c| c + 1);

        if let Some(baseline) = self.original_order.as_mut() {
            let after = self
                .cursor
                .and_then(|c| self.entries.get(c))
                .and_then(|current| baseline.iter().position(|id| *id == current.id));
            match after {
                Some(i) => baseline.insert(i + 1, entry.id),
                None => baseline.push(entry.id),
            }
        }

        self.entries.insert(position, entry);
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
        self.touch(WriteMode::Debounced);
    }

    /// Replace the whole queue ("play now")
    ///
    /// Cursor goes to 0, shuffle is switched off and the undo slot is dropped.
    pub fn replace_all(&mut self, tracks: Vec<Track>) {
        self.entries = tracks.into_iter().map(|t| self.new_entry(t)).collect();
        self.cursor = if self.entries.is_empty() { None } else { Some(0) };
        self.original_order = None;
        self.last_action = None;
        self.touch(WriteMode::Immediate);
    }

    /// Remove the track at `index`
    ///
    /// Removing an item before the cursor shifts the cursor down so the same
    /// track stays current. Removing the current item keeps the index (the
    /// following track becomes current), clamped to the new end.
    pub fn remove_at(&mut self, index: usize) -> Result<Track> {
        self.check_index(index)?;

        let entry = self.entries.remove(index);
        let was_current = self.cursor == Some(index);

        self.cursor = match self.cursor {
            _ if self.entries.is_empty() => None,
            Some(c) if index < c => Some(c - 1),
            Some(c) => Some(c.min(self.entries.len() - 1)),
            None => Some(0),
        };

        let baseline_index = self.original_order.as_mut().and_then(|baseline| {
            let position = baseline.iter().position(|id| *id == entry.id)?;
            baseline.remove(position);
            Some(position)
        });

        let track = entry.track.clone();
        self.last_action = Some(UndoSlot::Removed {
            entry,
            index,
            was_current,
            current_after: self.current_instance(),
            baseline_index,
        });

        debug!(index, track_id = %track.id, "Removed track from queue");
        self.touch(WriteMode::Debounced);
        Ok(track)
    }

    /// Empty the queue
    ///
    /// A no-op on an empty queue (the undo slot is kept). The shuffle flag
    /// survives with an empty baseline.
    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        let entries = std::mem::take(&mut self.entries);
        let original_order = self.original_order.clone();
        self.last_action = Some(UndoSlot::Cleared {
            entries,
            cursor: self.cursor,
            original_order,
        });

        self.cursor = None;
        if let Some(baseline) = self.original_order.as_mut() {
            baseline.clear();
        }

        debug!("Cleared queue");
        self.touch(WriteMode::Immediate);
    }

    /// Move the cursor to `index`
    ///
    /// Moving forward marks the track at the old cursor as played.
    pub fn set_cursor(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;

        if let Some(old) = self.cursor {
            if index > old {
                self.entries[old].track.played = true;
            }
        }
        self.cursor = Some(index);
        self.touch(WriteMode::Debounced);
        Ok(())
    }

    /// Move one item from `from` to `to`
    ///
    /// The cursor keeps pointing at the same track instance.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }

        let current = self.current_instance();
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        self.cursor = current.and_then(|id| self.position_of(id));

        self.touch(WriteMode::Debounced);
        Ok(())
    }

    /// Switch shuffle on or off
    ///
    /// On: the current track moves to the front, the rest is permuted and the
    /// cursor becomes 0. Off: the pre-shuffle order comes back and the cursor
    /// follows the current track.
    pub fn toggle_shuffle(&mut self) {
        if self.original_order.is_some() {
            self.restore_original_order();
        } else {
            self.apply_shuffle();
        }
        self.touch(WriteMode::Debounced);
    }

    /// Set the repeat mode
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
        self.touch(WriteMode::Debounced);
    }

    /// Revert the last remove/clear
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(slot) = self.last_action.take() else {
            return false;
        };

        match slot {
            UndoSlot::Removed {
                entry,
                index,
                was_current,
                current_after,
                baseline_index,
            } => {
                // A removed current track only becomes current again if
                // nothing moved the cursor since
                let restore_cursor = was_current && self.current_instance() == current_after;
                let index = index.min(self.entries.len());
                let id = entry.id;
                self.entries.insert(index, entry);

                self.cursor = match self.cursor {
                    _ if restore_cursor => Some(index),
                    Some(c) if index <= c => Some(c + 1),
                    Some(c) => Some(c),
                    None => Some(0),
                };

                if let Some(baseline) = self.original_order.as_mut() {
                    let at = baseline_index.unwrap_or(baseline.len()).min(baseline.len());
                    baseline.insert(at, id);
                }
                self.touch(WriteMode::Debounced);
            }
            UndoSlot::Cleared {
                entries,
                cursor,
                original_order,
            } => {
                self.entries = entries;
                self.cursor = cursor;
                self.original_order = original_order;
                self.touch(WriteMode::Immediate);
            }
        }

        debug!(len = self.entries.len(), cursor = ?self.cursor, "Undo applied");
        true
    }

    /// Set the user rating of the track at `index` (0-5 or none)
    pub fn set_rating(&mut self, index: usize, rating: Option<u8>) -> Result<()> {
        self.check_index(index)?;
        self.entries[index]
            .track
            .set_rating(rating)
            .map_err(|_| PlaybackError::InvalidRating(rating.unwrap_or_default()))?;
        self.touch(WriteMode::Debounced);
        Ok(())
    }

    /// Set the favorite flag of the track at `index`
    pub fn set_favorite(&mut self, index: usize, favorite: bool) -> Result<()> {
        self.check_index(index)?;
        self.entries[index].track.favorite = favorite;
        self.touch(WriteMode::Debounced);
        Ok(())
    }

    /// Mark the track at `index` as played
    pub fn mark_played(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if !self.entries[index].track.played {
            self.entries[index].track.played = true;
            self.touch(WriteMode::Debounced);
        }
        Ok(())
    }

    /// Restore persisted state (start-up)
    ///
    /// The cursor is clamped into range. When shuffle was on, the persisted
    /// order becomes the baseline that shuffle-off returns to. Nothing is
    /// scheduled for writing.
    pub fn hydrate(&mut self, persisted: PersistedQueue, preferences: PlaybackPreferences) {
        self.entries = persisted
            .items
            .into_iter()
            .map(|item| self.new_entry(item.into_track()))
            .collect();
        self.cursor = if self.entries.is_empty() {
            None
        } else {
            Some(persisted.current.min(self.entries.len() - 1))
        };
        self.repeat_mode = preferences.repeat_mode;
        self.original_order = preferences
            .shuffle_enabled
            .then(|| self.entries.iter().map(|e| e.id).collect());
        self.last_action = None;

        debug!(
            len = self.entries.len(),
            cursor = ?self.cursor,
            "Hydrated queue"
        );
    }

    /// Change the shuffle strategy used on the next shuffle-on
    pub fn set_shuffle_strategy(&mut self, strategy: ShuffleStrategy) {
        self.strategy = strategy;
    }

    // ===== Persistence =====

    /// Persisted projection of the current state
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            queue: PersistedQueue {
                items: self.entries.iter().map(|e| e.track.minimal()).collect(),
                current: self.cursor.unwrap_or(0),
            },
            preferences: self.preferences(),
        }
    }

    /// Snapshot to write if the pending write is due
    pub fn take_due_snapshot(&mut self, now: Instant) -> Option<QueueSnapshot> {
        self.persistence.take_due(now).then(|| self.snapshot())
    }

    /// Snapshot to write if any write is pending, due or not
    pub fn flush_snapshot(&mut self) -> Option<QueueSnapshot> {
        self.persistence.flush().then(|| self.snapshot())
    }

    /// When the pending write fires
    pub fn persistence_deadline(&self) -> Option<Instant> {
        self.persistence.deadline()
    }

    // ===== Accessors =====

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Track at `index`
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.entries.get(index).map(|e| &e.track)
    }

    /// Tracks in play order
    pub fn items(&self) -> Vec<&Track> {
        self.entries.iter().map(|e| &e.track).collect()
    }

    /// Cursor (`None` when empty)
    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    /// Current track
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|c| self.get(c))
    }

    /// Identity of the current entry
    pub fn current_instance(&self) -> Option<InstanceId> {
        self.cursor.and_then(|c| self.entries.get(c)).map(|e| e.id)
    }

    /// Identity of the entry at `index`
    pub fn instance_at(&self, index: usize) -> Option<InstanceId> {
        self.entries.get(index).map(|e| e.id)
    }

    /// Pre-shuffle order (`Some` iff shuffle is on)
    pub fn original_order(&self) -> Option<Vec<&Track>> {
        let baseline = self.original_order.as_ref()?;
        let by_id: HashMap<InstanceId, &Track> =
            self.entries.iter().map(|e| (e.id, &e.track)).collect();
        Some(baseline.iter().filter_map(|id| by_id.get(id).copied()).collect())
    }

    /// Repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    /// Whether shuffle is on
    pub fn shuffle_enabled(&self) -> bool {
        self.original_order.is_some()
    }

    /// Shuffle strategy
    pub fn shuffle_strategy(&self) -> ShuffleStrategy {
        self.strategy
    }

    /// Repeat/shuffle preferences
    pub fn preferences(&self) -> PlaybackPreferences {
        PlaybackPreferences {
            repeat_mode: self.repeat_mode,
            shuffle_enabled: self.shuffle_enabled(),
        }
    }

    /// Pending undo, if any
    pub fn last_action(&self) -> Option<UndoRecord> {
        self.last_action.as_ref().map(|slot| match slot {
            UndoSlot::Removed { entry, index, .. } => UndoRecord::RemovedItem {
                track: entry.track.clone(),
                index: *index,
            },
            UndoSlot::Cleared {
                entries, cursor, ..
            } => UndoRecord::ClearedQueue {
                items: entries.iter().map(|e| e.track.clone()).collect(),
                cursor: *cursor,
            },
        })
    }

    /// Index that follows the cursor
    ///
    /// Wraps to 0 under `RepeatMode::All`. Repeat-one replay is the
    /// controller's business; here `One` behaves like `Off`.
    pub fn next_index(&self) -> Option<usize> {
        let cursor = self.cursor?;
        if cursor + 1 < self.entries.len() {
            Some(cursor + 1)
        } else if self.repeat_mode == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    /// Index before the cursor, wrapping to the end under `RepeatMode::All`
    pub fn previous_index(&self) -> Option<usize> {
        let cursor = self.cursor?;
        if cursor > 0 {
            Some(cursor - 1)
        } else if self.repeat_mode == RepeatMode::All {
            Some(self.entries.len() - 1)
        } else {
            None
        }
    }

    // ===== Internals =====

    fn new_entry(&mut self, track: Track) -> Entry {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        Entry { id, track }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if self.entries.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }
        if index >= self.entries.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    fn position_of(&self, id: InstanceId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn touch(&mut self, mode: WriteMode) {
        self.persistence.request(mode, Instant::now());
    }

    fn apply_shuffle(&mut self) {
        self.original_order = Some(self.entries.iter().map(|e| e.id).collect());
        let Some(cursor) = self.cursor else {
            return;
        };

        let current = self.entries.remove(cursor);
        let mut rest = std::mem::take(&mut self.entries);
        shuffle_items(&mut rest, self.strategy, |e: &Entry| e.track.artist.id.as_str());

        self.entries.reserve(rest.len() + 1);
        self.entries.push(current);
        self.entries.extend(rest);
        self.cursor = Some(0);
        debug!(len = self.entries.len(), strategy = ?self.strategy, "Shuffle on");
    }

    fn restore_original_order(&mut self) {
        let Some(baseline) = self.original_order.take() else {
            return;
        };
        let current = self.current_instance();

        let mut by_id: HashMap<InstanceId, Entry> =
            self.entries.drain(..).map(|e| (e.id, e)).collect();
        let mut restored: Vec<Entry> = baseline
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        // Entries the baseline lost track of go at the end in insertion order
        if !by_id.is_empty() {
            let mut leftovers: Vec<Entry> = by_id.into_values().collect();
            leftovers.sort_by_key(|e| e.id);
            restored.extend(leftovers);
        }

        self.entries = restored;
        self.cursor = current
            .and_then(|id| self.position_of(id))
            .or(if self.entries.is_empty() { None } else { Some(0) });
        debug!(len = self.entries.len(), cursor = ?self.cursor, "Shuffle off");
    }
}
