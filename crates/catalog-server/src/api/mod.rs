//! HTTP API handlers.

pub mod catalog;
pub mod delivery;
pub mod player;
pub mod streams;

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;

    use actix_web::web;

    use crate::auth::Authorizer;
    use crate::catalog::{Catalog, NewAlbum, NewTrack};
    use crate::events::EventBus;
    use crate::media::{LocalBackend, MediaGateway};
    use crate::player_host::PlayerHost;
    use crate::state::AppState;

    static STATE_SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

    /// Build app state over a fresh temp media root. Callers remove the
    /// returned directory when done.
    pub(crate) fn make_state() -> (web::Data<AppState>, PathBuf) {
        let seq = STATE_SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "catalog-api-{}-{seq}",
            std::process::id()
        ));
        std::fs::create_dir_all(&root).unwrap();

        let events = EventBus::new();
        let state = web::Data::new(AppState {
            catalog: Catalog::load(None).unwrap(),
            gateway: MediaGateway::new(LocalBackend::new(&root), None),
            player: PlayerHost::new(events.clone()),
            events,
            auth: Authorizer::new(Some("test-admin".to_string())),
            public_base_url: "http://test.local".to_string(),
        });
        (state, root)
    }

    /// Seed a two-track album with local artwork and audio URLs.
    pub(crate) fn seed_album(
        state: &web::Data<AppState>,
        name: &str,
        admin_only: bool,
    ) -> u64 {
        let album = state.catalog.create_album(NewAlbum {
            artist_name: "Seeded Artist".to_string(),
            name: name.to_string(),
            release_date: Some("2024-01-01".to_string()),
            artwork_url: Some("/uploads/art.png".to_string()),
            admin_only,
            tracks: vec![
                NewTrack {
                    name: "Opener".to_string(),
                    number: 1,
                    audio_url: Some("/uploads/opener.wav".to_string()),
                    length_secs: Some(201.0),
                    downloadable: true,
                },
                NewTrack {
                    name: "Closer".to_string(),
                    number: 2,
                    audio_url: Some("/uploads/closer.wav".to_string()),
                    length_secs: Some(187.0),
                    downloadable: false,
                },
            ],
        });
        album.id
    }
}
