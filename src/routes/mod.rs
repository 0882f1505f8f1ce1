use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layers};
use crate::handlers::{
    admin, auth, comments, diagnostics, events, favorites, health_check, media, profiles,
    taxonomy, towns,
};
use crate::media::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Room for one image plus the other form fields.
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route("/search", get(events::search_events))
        .route("/upcoming", get(events::upcoming_events))
        .route("/mine", get(events::my_events))
        .route("/favorites", get(favorites::list_favorites))
        .route(
            "/submit",
            post(events::submit_event).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/:id/restore", post(events::restore_event))
        .route("/:id/related", get(events::related_events))
        .route(
            "/:id/favorite",
            get(favorites::favorite_status).post(favorites::toggle_favorite),
        )
        .route(
            "/:id/comments",
            get(comments::list_comments).post(comments::post_comment),
        )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/is-admin", get(admin::is_admin))
        .route("/stats", get(admin::stats))
        .route("/events/pending", get(admin::pending_events))
        .route("/events/bulk", post(admin::bulk_moderate))
        .route("/events/:id/approve", post(admin::approve_event))
        .route("/events/:id/reject", post(admin::reject_event))
        .route("/users", get(admin::list_users))
        .route("/users/:id/role", put(admin::update_user_role))
        .route("/users/:id/ban", post(admin::toggle_user_ban))
        .route("/activity", get(admin::activity_logs))
        .route("/alerts", get(admin::alerts))
        .route("/alerts/:id/read", post(admin::mark_alert_read))
        .route("/system-health", get(admin::system_health))
        .route("/analytics", get(admin::analytics))
        .route("/settings", get(admin::platform_settings))
        .route("/export/events", get(admin::export_events))
        .route("/export/users", get(admin::export_users))
        .route("/feed", get(admin::change_feed))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/session", get(auth::current_session))
        .nest("/events", event_routes())
        .route("/comments/:id", delete(comments::delete_comment))
        .route(
            "/profiles/me",
            get(profiles::my_profile).put(profiles::update_my_profile),
        )
        .route("/profiles/:username", get(profiles::public_profile))
        .route("/towns", get(towns::list_towns))
        .route("/towns/:slug", get(towns::get_town))
        .route("/towns/:slug/events", get(events::town_events))
        .route("/categories", get(taxonomy::list_categories))
        .route("/tags", get(taxonomy::list_tags))
        .route(
            "/uploads/images",
            post(media::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/flyers",
            post(media::extract_flyer).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/test-events",
            get(diagnostics::recent_events).post(diagnostics::create_mock_event),
        )
        .route("/debug-db-schema", get(diagnostics::debug_schema))
        .nest("/admin", admin_routes())
}

pub fn create_routes(state: AppState) -> Router {
    let media_dir = ServeDir::new(&state.config.media.upload_dir);
    let media_path = state.config.media.public_base_url.clone();
    let production = state.config.production;

    let mut router: Router<AppState> = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes());
    // Media behind an absolute URL (a CDN) is not served from here.
    if media_path.starts_with('/') && media_path.len() > 1 {
        router = router.nest_service(&media_path, media_dir);
    }
    let mut router = router.with_state(state);

    for layer in create_security_headers_layers(production) {
        router = router.layer(layer);
    }

    router
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
}
