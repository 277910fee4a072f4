use utoipa::OpenApi;

use crate::api;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::catalog::list_artists,
        api::catalog::list_albums,
        api::catalog::get_album,
        api::catalog::create_album,
        api::catalog::update_album,
        api::catalog::delete_album,
        api::delivery::stream_media,
        api::delivery::download_media,
        api::delivery::signed_url,
        api::player::play,
        api::player::pause,
        api::player::resume,
        api::player::next,
        api::player::previous,
        api::player::seek,
        api::player::stop,
        api::player::status,
        api::player::signal,
        api::streams::player_stream,
    ),
    components(
        schemas(
            models::ArtistResponse,
            models::AlbumSummary,
            models::AlbumResponse,
            models::TrackResponse,
            models::CreateAlbumRequest,
            models::UpdateAlbumRequest,
            models::TrackUpdate,
            models::PlayRequest,
            models::SeekRequest,
            models::SignalRequest,
            models::SignalBody,
            models::PlayerStatusResponse,
            models::SignedUrlResponse,
            models::ErrorResponse,
            models::CommandPayload,
        )
    ),
    tags(
        (name = "catalog-server", description = "Music catalog and media delivery API")
    )
)]
pub struct ApiDoc;
