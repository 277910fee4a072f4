//! Actix server startup + app wiring.
//!
//! Builds the shared state, routes, middleware, and OpenAPI endpoints.

use std::path::{Path, PathBuf};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Result;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::auth::Authorizer;
use crate::catalog::Catalog;
use crate::config;
use crate::events::EventBus;
use crate::media::{LocalBackend, MediaGateway, RemoteObjectBackend};
use crate::openapi;
use crate::player_host::PlayerHost;
use crate::state::AppState;

/// Build server state and start the Actix HTTP server.
pub(crate) async fn run(args: crate::Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let bind = config::bind_from_config(args.bind.as_deref(), &cfg);
    let public_base_url = config::public_base_url_from_config(&cfg, &bind);
    let media_root = config::media_root_from_config(args.media_root.as_deref(), &cfg);
    tracing::info!(
        bind = %bind,
        public_base_url = %public_base_url,
        media_root = %media_root.display(),
        "starting catalog-server"
    );

    let catalog = Catalog::load(cfg.catalog_file.as_deref())?;
    let remote = cfg.remote_storage.as_ref().map(|remote_cfg| {
        tracing::info!(
            base_url = %remote_cfg.base_url,
            bucket = %remote_cfg.bucket,
            "remote object store enabled"
        );
        RemoteObjectBackend::new(
            remote_cfg.base_url.clone(),
            remote_cfg.bucket.clone(),
            remote_cfg.service_key.clone(),
            remote_cfg.stream_ttl_secs,
            remote_cfg.sign_ttl_secs,
        )
    });
    if remote.is_none() {
        tracing::info!("remote object store disabled; serving local media only");
    }
    if cfg.admin_token.is_none() {
        tracing::warn!("no admin token configured; catalog mutations are disabled");
    }

    let events = EventBus::new();
    let state = web::Data::new(AppState {
        catalog,
        gateway: MediaGateway::new(LocalBackend::new(media_root), remote),
        player: PlayerHost::new(events.clone()),
        events,
        auth: Authorizer::new(cfg.admin_token.clone()),
        public_base_url,
    });

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "HEAD"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::RANGE,
            ])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default().exclude("/player/status").exclude("/player/stream"))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
            )
            .service(api::catalog::list_artists)
            .service(api::catalog::list_albums)
            .service(api::catalog::get_album)
            .service(api::catalog::create_album)
            .service(api::catalog::update_album)
            .service(api::catalog::delete_album)
            .service(api::delivery::stream_media)
            .service(api::delivery::download_media)
            .service(api::delivery::signed_url)
            .service(api::player::play)
            .service(api::player::pause)
            .service(api::player::resume)
            .service(api::player::next)
            .service(api::player::previous)
            .service(api::player::seek)
            .service(api::player::stop)
            .service(api::player::status)
            .service(api::player::signal)
            .service(api::streams::player_stream)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}

/// Load server config from disk, falling back to defaults when no file is
/// given or the conventional one is absent.
fn load_config(path: Option<&Path>) -> Result<config::ServerConfig> {
    match path {
        Some(path) => config::ServerConfig::load(path),
        None => {
            let auto_path = std::env::current_exe()
                .ok()
                .and_then(|path| path.parent().map(|dir| dir.join("config.toml")));
            match auto_path {
                Some(path) if path.exists() => config::ServerConfig::load(&path),
                _ => Ok(config::ServerConfig::default()),
            }
        }
    }
}
