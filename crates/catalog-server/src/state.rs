//! Shared application state.

use crate::auth::Authorizer;
use crate::catalog::Catalog;
use crate::events::EventBus;
use crate::media::MediaGateway;
use crate::player_host::PlayerHost;

/// State handed to every handler via `web::Data`.
pub struct AppState {
    pub catalog: Catalog,
    pub gateway: MediaGateway,
    pub player: PlayerHost,
    pub events: EventBus,
    pub auth: Authorizer,
    /// Base URL clients reach this server on; used to build stream URLs.
    pub public_base_url: String,
}
