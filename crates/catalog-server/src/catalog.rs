//! In-memory music catalog.
//!
//! Records are loaded from a TOML catalog file at startup and mutated
//! through the admin API. Media bytes are never stored here; records carry
//! URLs the media gateway resolves.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use serde::Deserialize;

fn default_true() -> bool {
    true
}

/// One recording artist.
#[derive(Clone, Debug, Deserialize)]
pub struct Artist {
    pub id: u64,
    pub name: String,
}

/// One album owned by an artist.
#[derive(Clone, Debug, Deserialize)]
pub struct Album {
    pub id: u64,
    pub artist_id: u64,
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Stored artwork URL, local or remote.
    #[serde(default)]
    pub artwork_url: Option<String>,
    /// Hidden from unauthenticated listings when set.
    #[serde(default)]
    pub admin_only: bool,
}

/// One track on an album.
#[derive(Clone, Debug, Deserialize)]
pub struct Track {
    pub id: u64,
    pub album_id: u64,
    pub name: String,
    /// Position within the album, 1-based.
    pub number: u32,
    /// Stored audio URL, local or remote. Tracks without audio exist as
    /// listing entries only.
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub length_secs: Option<f64>,
    #[serde(default = "default_true")]
    pub downloadable: bool,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    artists: Vec<Artist>,
    #[serde(default)]
    albums: Vec<Album>,
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Default)]
struct CatalogInner {
    artists: Vec<Artist>,
    albums: Vec<Album>,
    tracks: Vec<Track>,
}

/// Fields accepted when creating an album.
#[derive(Clone, Debug)]
pub struct NewAlbum {
    pub artist_name: String,
    pub name: String,
    pub release_date: Option<String>,
    pub artwork_url: Option<String>,
    pub admin_only: bool,
    pub tracks: Vec<NewTrack>,
}

#[derive(Clone, Debug)]
pub struct NewTrack {
    pub name: String,
    pub number: u32,
    pub audio_url: Option<String>,
    pub length_secs: Option<f64>,
    pub downloadable: bool,
}

/// Partial album update. `None` fields are left untouched; media URL
/// fields distinguish "unchanged" from "replaced".
#[derive(Clone, Debug, Default)]
pub struct AlbumPatch {
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub artwork_url: Option<String>,
    pub admin_only: Option<bool>,
    pub tracks: Option<Vec<TrackPatch>>,
}

#[derive(Clone, Debug)]
pub struct TrackPatch {
    /// Existing track id, or `None` to append a new track.
    pub id: Option<u64>,
    pub name: String,
    pub number: u32,
    pub audio_url: Option<String>,
    pub length_secs: Option<f64>,
    pub downloadable: bool,
}

/// Shared catalog state behind a read/write lock.
pub struct Catalog {
    inner: RwLock<CatalogInner>,
    next_id: AtomicU64,
}

impl Catalog {
    /// Load the catalog from a TOML file, or start empty when the file is
    /// absent.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading catalog file {}", path.display()))?;
                toml::from_str::<CatalogFile>(&raw)
                    .with_context(|| format!("parsing catalog file {}", path.display()))?
            }
            _ => CatalogFile::default(),
        };
        let max_id = file
            .artists
            .iter()
            .map(|a| a.id)
            .chain(file.albums.iter().map(|a| a.id))
            .chain(file.tracks.iter().map(|t| t.id))
            .max()
            .unwrap_or(0);
        Ok(Self {
            inner: RwLock::new(CatalogInner {
                artists: file.artists,
                albums: file.albums,
                tracks: file.tracks,
            }),
            next_id: AtomicU64::new(max_id + 1),
        })
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn list_artists(&self) -> Vec<Artist> {
        let inner = self.inner.read().unwrap();
        let mut artists = inner.artists.clone();
        artists.sort_by(|a, b| a.name.cmp(&b.name));
        artists
    }

    /// All albums, restricted ones included only for authorized callers.
    pub fn list_albums(&self, include_restricted: bool) -> Vec<Album> {
        let inner = self.inner.read().unwrap();
        inner
            .albums
            .iter()
            .filter(|album| include_restricted || !album.admin_only)
            .cloned()
            .collect()
    }

    /// One album with its tracks sorted by track number.
    pub fn album(&self, id: u64) -> Option<(Album, Vec<Track>)> {
        let inner = self.inner.read().unwrap();
        let album = inner.albums.iter().find(|a| a.id == id)?.clone();
        let mut tracks: Vec<Track> = inner
            .tracks
            .iter()
            .filter(|t| t.album_id == id)
            .cloned()
            .collect();
        tracks.sort_by_key(|t| t.number);
        Some((album, tracks))
    }

    pub fn artist_name(&self, artist_id: u64) -> Option<String> {
        let inner = self.inner.read().unwrap();
        inner
            .artists
            .iter()
            .find(|a| a.id == artist_id)
            .map(|a| a.name.clone())
    }

    /// Create an album, reusing an existing artist by name or creating one.
    pub fn create_album(&self, new: NewAlbum) -> Album {
        let mut inner = self.inner.write().unwrap();
        let artist_id = match inner
            .artists
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(&new.artist_name))
        {
            Some(artist) => artist.id,
            None => {
                let id = self.allocate_id();
                inner.artists.push(Artist {
                    id,
                    name: new.artist_name.clone(),
                });
                id
            }
        };
        let album = Album {
            id: self.allocate_id(),
            artist_id,
            name: new.name,
            release_date: new.release_date,
            artwork_url: new.artwork_url,
            admin_only: new.admin_only,
        };
        inner.albums.push(album.clone());
        for track in new.tracks {
            let id = self.allocate_id();
            inner.tracks.push(Track {
                id,
                album_id: album.id,
                name: track.name,
                number: track.number,
                audio_url: track.audio_url,
                length_secs: track.length_secs,
                downloadable: track.downloadable,
            });
        }
        album
    }

    /// Apply a patch to an album. Returns the updated album and the media
    /// URLs superseded by the patch, so the caller can delete them.
    pub fn update_album(&self, id: u64, patch: AlbumPatch) -> Option<(Album, Vec<String>)> {
        let mut inner = self.inner.write().unwrap();
        let mut superseded = Vec::new();

        let album = inner.albums.iter_mut().find(|a| a.id == id)?;
        if let Some(name) = patch.name {
            album.name = name;
        }
        if let Some(date) = patch.release_date {
            album.release_date = Some(date);
        }
        if let Some(artwork_url) = patch.artwork_url {
            if let Some(old) = album.artwork_url.take() {
                if old != artwork_url {
                    superseded.push(old);
                }
            }
            album.artwork_url = Some(artwork_url);
        }
        if let Some(admin_only) = patch.admin_only {
            album.admin_only = admin_only;
        }
        let updated = album.clone();

        if let Some(track_patches) = patch.tracks {
            let mut existing: HashMap<u64, Track> = inner
                .tracks
                .iter()
                .filter(|t| t.album_id == id)
                .map(|t| (t.id, t.clone()))
                .collect();
            inner.tracks.retain(|t| t.album_id != id);
            let mut kept = Vec::with_capacity(track_patches.len());
            for tp in track_patches {
                let track = match tp.id.and_then(|tid| existing.remove(&tid)) {
                    Some(mut track) => {
                        track.name = tp.name;
                        track.number = tp.number;
                        if let Some(audio_url) = tp.audio_url {
                            if let Some(old) = track.audio_url.take() {
                                if old != audio_url {
                                    superseded.push(old);
                                }
                            }
                            track.audio_url = Some(audio_url);
                        }
                        if tp.length_secs.is_some() {
                            track.length_secs = tp.length_secs;
                        }
                        track.downloadable = tp.downloadable;
                        track
                    }
                    None => Track {
                        id: self.allocate_id(),
                        album_id: id,
                        name: tp.name,
                        number: tp.number,
                        audio_url: tp.audio_url,
                        length_secs: tp.length_secs,
                        downloadable: tp.downloadable,
                    },
                };
                kept.push(track);
            }
            // Tracks dropped by the patch take their audio with them.
            for (_, removed) in existing {
                if let Some(url) = removed.audio_url {
                    superseded.push(url);
                }
            }
            inner.tracks.extend(kept);
        }

        Some((updated, superseded))
    }

    /// Remove an album and its tracks. Returns every media URL the album
    /// owned so the caller can delete the underlying objects.
    pub fn delete_album(&self, id: u64) -> Option<Vec<String>> {
        let mut inner = self.inner.write().unwrap();
        let position = inner.albums.iter().position(|a| a.id == id)?;
        let album = inner.albums.remove(position);
        let mut media = Vec::new();
        if let Some(artwork) = album.artwork_url {
            media.push(artwork);
        }
        let (owned, kept): (Vec<Track>, Vec<Track>) = inner
            .tracks
            .drain(..)
            .partition(|t| t.album_id == id);
        inner.tracks = kept;
        media.extend(owned.into_iter().filter_map(|t| t.audio_url));

        // Drop the artist too when this was their last album.
        let artist_id = album.artist_id;
        if !inner.albums.iter().any(|a| a.artist_id == artist_id) {
            inner.artists.retain(|a| a.id != artist_id);
        }
        Some(media)
    }
}
