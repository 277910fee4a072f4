//! Ordered track list with one active index.
//!
//! The list is replaced wholesale when a new playback context starts; it is
//! never mutated incrementally.

/// Reference to one playable track.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackRef {
    /// Display title.
    pub title: String,
    /// URL the decode primitive loads (a stream endpoint URL).
    pub source_url: String,
}

/// Replaceable track list; `current` is `None` when nothing is active.
#[derive(Clone, Debug, Default)]
pub struct Playlist {
    tracks: Vec<TrackRef>,
    current: Option<usize>,
}

impl Playlist {
    /// Replace the whole list and activate `start_index`.
    ///
    /// An out-of-bounds start index leaves the list in place with no active
    /// track.
    pub fn replace(&mut self, tracks: Vec<TrackRef>, start_index: usize) -> Option<&TrackRef> {
        self.current = if start_index < tracks.len() {
            Some(start_index)
        } else {
            None
        };
        self.tracks = tracks;
        self.current_track()
    }

    /// Discard the list entirely.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&TrackRef> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Advance to the next track with wraparound. Returns `None` (and
    /// deactivates) when the list is empty.
    pub fn advance(&mut self) -> Option<&TrackRef> {
        if self.tracks.is_empty() {
            self.current = None;
            return None;
        }
        let next = match self.current {
            Some(i) => (i + 1) % self.tracks.len(),
            None => 0,
        };
        self.current = Some(next);
        self.current_track()
    }

    /// Step back to the previous track with wraparound. Returns `None` (and
    /// deactivates) when the list is empty.
    pub fn retreat(&mut self) -> Option<&TrackRef> {
        if self.tracks.is_empty() {
            self.current = None;
            return None;
        }
        let len = self.tracks.len();
        let prev = match self.current {
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.current = Some(prev);
        self.current_track()
    }
}
