use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn app_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .merge(event_routes())
        .merge(event_form_routes())
        .merge(comment_routes())
        .merge(donation_routes())
        .merge(favorite_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::event::list_events))
        .routes(routes!(handlers::event::get_event))
        .routes(routes!(handlers::event::delete_event))
        .routes(routes!(handlers::picture::get_event_picture))
}

/// Create and update accept picture uploads and get a larger body limit.
fn event_form_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::event::new_event_form,
            handlers::event::create_event
        ))
        .routes(routes!(
            handlers::event::edit_event_form,
            handlers::event::update_event
        ))
        .layer(handlers::event::event_form_body_limit())
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::comment::create_comment))
        .routes(routes!(handlers::comment::delete_comment))
}

fn donation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::donation::create_donation))
        .routes(routes!(handlers::donation::delete_donation))
}

fn favorite_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::favorite::favorite_event))
        .routes(routes!(handlers::favorite::unfavorite_event))
}
