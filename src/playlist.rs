//! The ordered track list the engine plays from.
//!
//! The front end owns the structure (what gets listed, what is removed); the engine
//! reads tracks and moves the current index. Both sides share it through
//! `SharedPlaylist`.

use std::ops::RangeInclusive;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::library::Track;

#[cfg(test)]
mod tests;

/// Playlist handle shared between the front end and the engine.
#[derive(Clone, Default)]
pub struct SharedPlaylist(Arc<RwLock<Playlist>>);

impl SharedPlaylist {
    pub fn new(playlist: Playlist) -> Self {
        Self(Arc::new(RwLock::new(playlist)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Playlist> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Playlist> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Playlist {
    tracks: Vec<Track>,
    current: Option<usize>,
    // (anchor, cursor); the cursor end is the one "play selected" uses.
    selection: Option<(usize, usize)>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Self {
        let selection = (!tracks.is_empty()).then_some((0, 0));
        Self {
            tracks,
            current: None,
            selection,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Set the current index. Out-of-range indices clear it.
    pub fn set_current(&mut self, index: Option<usize>) -> Option<usize> {
        self.current = index.filter(|&i| i < self.tracks.len());
        self.current
    }

    /// Selected rows, ordered low to high.
    pub fn selection_range(&self) -> Option<RangeInclusive<usize>> {
        self.selection.map(|(a, b)| a.min(b)..=a.max(b))
    }

    /// The row the cursor is on.
    pub fn cursor(&self) -> Option<usize> {
        self.selection.map(|(_, cursor)| cursor)
    }

    /// Collapse the selection onto a single row.
    pub fn select(&mut self, index: usize) {
        if let Some(last) = self.tracks.len().checked_sub(1) {
            let index = index.min(last);
            self.selection = Some((index, index));
        }
    }

    /// Move the cursor, keeping the anchor (visual mode).
    pub fn extend_selection(&mut self, index: usize) {
        let Some(last) = self.tracks.len().checked_sub(1) else {
            return;
        };
        let index = index.min(last);
        let anchor = self.selection.map_or(index, |(a, _)| a);
        self.selection = Some((anchor, index));
    }

    pub fn set_duration(&mut self, index: usize, duration: Duration) {
        if let Some(track) = self.tracks.get_mut(index) {
            track.duration = Some(duration);
        }
    }

    /// Remove `range` (clamped to the list), keeping `current` pointing at
    /// the same track or clearing it when that track is removed.
    pub fn remove(&mut self, range: RangeInclusive<usize>) -> Vec<Track> {
        let len = self.tracks.len();
        let (start, end) = (*range.start(), (*range.end()).min(len.saturating_sub(1)));
        if len == 0 || start > end {
            return Vec::new();
        }
        let removed: Vec<Track> = self.tracks.drain(start..=end).collect();
        let count = removed.len();

        self.current = match self.current {
            Some(c) if c < start => Some(c),
            Some(c) if c > end => Some(c - count),
            _ => None,
        };

        self.selection = match self.tracks.len().checked_sub(1) {
            None => None,
            Some(last) => {
                let cursor = start.min(last);
                Some((cursor, cursor))
            }
        };
        removed
    }
}
