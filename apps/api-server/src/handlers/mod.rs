//! HTTP handlers and route configuration.

mod context;
mod health;
mod posts;
mod profile;

#[cfg(test)]
mod tests;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Public routes
        .route("/", web::get().to(posts::index))
        .route("/health", web::get().to(health::health_check))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .route("/profile/{username}/", web::get().to(profile::profile))
        // Gated routes
        .route("/create/", web::get().to(posts::post_create_form))
        .route("/create/", web::post().to(posts::post_create))
        .route("/posts/{post_id}/edit/", web::get().to(posts::post_edit_form))
        .route("/posts/{post_id}/edit/", web::post().to(posts::post_edit))
        .route("/posts/{post_id}/comment/", web::post().to(posts::add_comment))
        .route("/follow/", web::get().to(profile::follow_index))
        .route(
            "/profile/{username}/follow/",
            web::post().to(profile::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            web::post().to(profile::profile_unfollow),
        );
}
