//! Ordered track list with a current position

use aura_audio::MediaFile;

/// One playlist entry
#[derive(Debug, Clone)]
pub struct Track {
    pub id: u64,
    pub name: String,
    pub media: MediaFile,
}

#[derive(Debug, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
    current: Option<usize>,
    next_id: u64,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track and return its id (ids are never reused)
    pub fn add(&mut self, media: MediaFile) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.tracks.push(Track {
            id,
            name: media.name(),
            media,
        });
        id
    }

    /// Remove a track; returns it and whether it was the current one
    pub fn remove(&mut self, id: u64) -> Option<(Track, bool)> {
        let index = self.index_of(id)?;
        let was_current = self.current == Some(index);
        let track = self.tracks.remove(index);
        self.current = match self.current {
            Some(c) if c == index => None,
            Some(c) if c > index => Some(c - 1),
            other => other,
        };
        Some((track, was_current))
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Mark `id` as current; false when it is not in the list
    pub fn set_current(&mut self, id: u64) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => false,
        }
    }

    /// Clear the current marker without removing anything
    pub fn unset_current(&mut self) {
        self.current = None;
    }

    /// Track after the current one, without moving
    ///
    /// With no current track this is the first track.
    pub fn next(&self) -> Option<&Track> {
        match self.current {
            Some(i) => self.tracks.get(i + 1),
            None => self.tracks.first(),
        }
    }
}
