//! Handler-level request tests against the in-memory store.

use std::sync::Arc;

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use uuid::Uuid;

use scribe_core::domain::{Group, Post, User};
use scribe_core::pagination::Pagination;
use scribe_core::ports::TokenService;
use scribe_infra::{JwtConfig, JwtTokenService};

use crate::handlers::configure_routes;
use crate::state::AppState;

macro_rules! test_app {
    ($state:expr, $tokens:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::new($tokens.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn test_state() -> AppState {
    AppState::in_memory(Pagination::new(10))
}

fn token_service() -> Arc<dyn TokenService> {
    Arc::new(JwtTokenService::new(JwtConfig {
        secret: "test-secret-key".to_string(),
        expiration_hours: 1,
        issuer: "test".to_string(),
    }))
}

fn login(tokens: &Arc<dyn TokenService>, user: &User) -> String {
    format!(
        "Bearer {}",
        tokens.generate_token(user.id, &user.username).unwrap()
    )
}

async fn seed_user(state: &AppState, username: &str) -> User {
    state.users.save(User::new(username)).await.unwrap()
}

async fn seed_post(state: &AppState, author: &User, text: &str, minutes_ago: i64) -> Post {
    let mut post = Post::new(author.id, text, None, None).unwrap();
    post.created_at = Utc::now() - Duration::minutes(minutes_ago);
    state.posts.save(post).await.unwrap()
}

fn multipart(fields: &[(&str, &str)]) -> (String, String) {
    let boundary = "test-boundary";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    (format!("multipart/form-data; boundary={boundary}"), body)
}

fn location(resp: &ServiceResponse) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
}

#[actix_web::test]
async fn anonymous_create_redirects_to_login() {
    let state = test_state();
    let tokens = token_service();
    let app = test_app!(state, tokens);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/create/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}

#[actix_web::test]
async fn create_forces_caller_as_author() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let app = test_app!(state, tokens);

    // A forged author field must be ignored.
    let forged_author = Uuid::new_v4().to_string();
    let (content_type, body) = multipart(&[
        ("text", "a perfectly reasonable post"),
        ("author", &forged_author),
    ]);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((header::AUTHORIZATION, login(&tokens, &leo)))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/leo/");

    let window = state.pagination.window(1, 1);
    let posts = state.posts.list_recent(window).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author_id, leo.id);
}

#[actix_web::test]
async fn short_text_is_rejected_and_store_untouched() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let app = test_app!(state, tokens);

    let (content_type, body) = multipart(&[("text", "too short")]);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((header::AUTHORIZATION, login(&tokens, &leo)))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "text");
    assert_eq!(
        body["errors"][0]["message"],
        "This field must be at least 15 characters long."
    );

    assert_eq!(state.posts.count_all().await.unwrap(), 0);
}

#[actix_web::test]
async fn unknown_group_choice_is_rejected() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let app = test_app!(state, tokens);

    let (content_type, body) = multipart(&[
        ("text", "a perfectly reasonable post"),
        ("group", "no-such-group"),
    ]);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header((header::AUTHORIZATION, login(&tokens, &leo)))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "group");
    assert_eq!(state.posts.count_all().await.unwrap(), 0);
}

#[actix_web::test]
async fn non_author_edit_redirects_without_mutation() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let anna = seed_user(&state, "anna").await;
    let post = seed_post(&state, &leo, "the original fifteen characters", 5).await;
    let app = test_app!(state, tokens);

    let edit_uri = format!("/posts/{}/edit/", post.id);
    let detail_uri = format!("/posts/{}/", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&edit_uri)
            .insert_header((header::AUTHORIZATION, login(&tokens, &anna)))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail_uri);

    let (content_type, body) = multipart(&[("text", "an attempted hostile rewrite")]);
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&edit_uri)
            .insert_header((header::AUTHORIZATION, login(&tokens, &anna)))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail_uri);

    let unchanged = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(unchanged.text, "the original fifteen characters");
}

#[actix_web::test]
async fn author_edit_rewrites_content_but_not_created_at() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let post = seed_post(&state, &leo, "the original fifteen characters", 5).await;
    let app = test_app!(state, tokens);

    let (content_type, body) = multipart(&[("text", "the rewritten fifteen characters")]);
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header((header::AUTHORIZATION, login(&tokens, &leo)))
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let edited = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(edited.text, "the rewritten fifteen characters");
    assert_eq!(edited.created_at, post.created_at);
    assert_eq!(edited.author_id, leo.id);
}

#[actix_web::test]
async fn follow_twice_then_unfollow_round_trips() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let anna = seed_user(&state, "anna").await;
    let app = test_app!(state, tokens);

    for _ in 0..2 {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/profile/leo/follow/")
                .insert_header((header::AUTHORIZATION, login(&tokens, &anna)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/profile/leo/");
    }

    assert!(state.follows.is_following(anna.id, leo.id).await.unwrap());

    // One unfollow undoes the pair entirely, so the double follow created a
    // single row.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/leo/unfollow/")
            .insert_header((header::AUTHORIZATION, login(&tokens, &anna)))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    assert!(!state.follows.is_following(anna.id, leo.id).await.unwrap());
}

#[actix_web::test]
async fn self_follow_is_a_silent_noop() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let app = test_app!(state, tokens);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/leo/follow/")
            .insert_header((header::AUTHORIZATION, login(&tokens, &leo)))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(!state.follows.is_following(leo.id, leo.id).await.unwrap());
}

#[actix_web::test]
async fn feed_lists_followed_authors_only() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let anna = seed_user(&state, "anna").await;
    let bob = seed_user(&state, "bob").await;
    seed_post(&state, &leo, "a post for the follower feed", 1).await;
    state.follows.follow(anna.id, leo.id).await.unwrap();
    let app = test_app!(state, tokens);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/follow/")
            .insert_header((header::AUTHORIZATION, login(&tokens, &anna)))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["page"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["page"]["items"][0]["author"]["username"], "leo");

    // A user who follows no one sees an empty feed.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/follow/")
            .insert_header((header::AUTHORIZATION, login(&tokens, &bob)))
            .to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["page"]["items"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn thirteen_posts_paginate_ten_and_three() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    for i in 0..13 {
        seed_post(&state, &leo, &format!("numbered post body {i:02} of many"), i).await;
    }
    let app = test_app!(state, tokens);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["page"]["items"].as_array().unwrap().len(), 10);
    assert_eq!(body["page"]["total_pages"], 2);
    assert_eq!(body["page"]["has_next"], true);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/?page=2").to_request()).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["page"]["items"].as_array().unwrap().len(), 3);
    assert_eq!(body["page"]["has_previous"], true);

    // Out-of-range pages clamp instead of failing.
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/?page=99").to_request()).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["page"]["number"], 2);
    assert_eq!(body["page"]["items"].as_array().unwrap().len(), 3);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/?page=0").to_request()).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["page"]["number"], 1);
}

#[actix_web::test]
async fn index_lists_newest_first() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    seed_post(&state, &leo, "the oldest of the three posts", 30).await;
    seed_post(&state, &leo, "the newest of the three posts", 1).await;
    seed_post(&state, &leo, "the middle of the three posts", 10).await;
    let app = test_app!(state, tokens);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let body: serde_json::Value = test::read_body_json(resp).await;

    let texts: Vec<&str> = body["page"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["text"].as_str().unwrap())
        .collect();
    assert_eq!(
        texts,
        vec![
            "the newest of the three posts",
            "the middle of the three posts",
            "the oldest of the three posts"
        ]
    );
}

#[actix_web::test]
async fn unknown_resources_return_not_found() {
    let state = test_state();
    let tokens = token_service();
    let app = test_app!(state, tokens);

    for uri in [
        "/group/no-such-slug/".to_string(),
        "/profile/no-such-user/".to_string(),
        format!("/posts/{}/", Uuid::new_v4()),
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_web::test]
async fn group_listing_filters_by_group() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let group = state
        .groups
        .save(Group::new("Rust", "rust", "systems programming"))
        .await
        .unwrap();

    let mut grouped = Post::new(leo.id, "a post filed under the group", None, None).unwrap();
    grouped.group_id = Some(group.id);
    state.posts.save(grouped).await.unwrap();
    seed_post(&state, &leo, "a post outside of any group", 1).await;

    let app = test_app!(state, tokens);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/group/rust/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["group"]["title"], "Rust");
    assert_eq!(body["page"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["page"]["items"][0]["text"],
        "a post filed under the group"
    );
}

#[actix_web::test]
async fn profile_reports_is_following_per_caller() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let anna = seed_user(&state, "anna").await;
    seed_post(&state, &leo, "a post shown on the profile", 1).await;
    state.follows.follow(anna.id, leo.id).await.unwrap();
    let app = test_app!(state, tokens);

    // Anonymous callers never count as following.
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/profile/leo/").to_request()).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["is_following"], false);
    assert_eq!(body["post_count"], 1);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/profile/leo/")
            .insert_header((header::AUTHORIZATION, login(&tokens, &anna)))
            .to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["is_following"], true);
}

#[actix_web::test]
async fn comment_submission_always_redirects_to_detail() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let anna = seed_user(&state, "anna").await;
    let post = seed_post(&state, &leo, "a post that attracts comments", 1).await;
    let app = test_app!(state, tokens);

    let comment_uri = format!("/posts/{}/comment/", post.id);
    let detail_uri = format!("/posts/{}/", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_uri)
            .insert_header((header::AUTHORIZATION, login(&tokens, &anna)))
            .set_form([("text", "short and sweet")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail_uri);
    assert_eq!(state.comments.count_by_post(post.id).await.unwrap(), 1);

    // An empty comment is dropped, but the redirect is the same.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_uri)
            .insert_header((header::AUTHORIZATION, login(&tokens, &anna)))
            .set_form([("text", "")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail_uri);
    assert_eq!(state.comments.count_by_post(post.id).await.unwrap(), 1);
}

#[actix_web::test]
async fn post_detail_carries_comments_and_counts() {
    let state = test_state();
    let tokens = token_service();
    let leo = seed_user(&state, "leo").await;
    let anna = seed_user(&state, "anna").await;
    let post = seed_post(&state, &leo, "a post with one comment on it", 1).await;
    seed_post(&state, &leo, "another post by the same author", 2).await;
    state
        .comments
        .save(scribe_core::domain::Comment::new(
            post.id, anna.id, "well said",
        ))
        .await
        .unwrap();
    let app = test_app!(state, tokens);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;

    assert_eq!(body["comment_count"], 1);
    assert_eq!(body["author_post_count"], 2);
    assert_eq!(body["comments"][0]["author"]["username"], "anna");
    assert_eq!(body["form"]["text"], "");
}
