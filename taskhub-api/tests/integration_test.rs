/// Integration tests for the TaskHub API
///
/// These tests drive the full router end-to-end against a real database:
/// - Registration, login, and the shared failure bodies
/// - Token revocation for one session and for all sessions
/// - Task CRUD with ownership scoping, filtering, sorting, pagination
/// - Allow-list PATCH rejection
/// - Avatar upload, public fetch, and removal
mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{json_body, raw_body, TestContext, TEST_PASSWORD};
use serde_json::json;
use tower::Service as _;

#[tokio::test]
async fn test_health_endpoint() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let response = ctx.request("GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_register_returns_created_and_no_secrets() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let body = ctx.register_user("Jess").await;
    assert_eq!(body["user"]["name"], "Jess");
    assert_eq!(body["user"]["age"], 0);
    assert!(body["token"].is_string());
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("tokens").is_none());
    assert!(body["user"].get("avatar").is_none());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let body = ctx.register_user("First").await;
    let email = body["user"]["email"].as_str().unwrap();

    let response = ctx
        .request(
            "POST",
            "/users",
            None,
            Some(json!({
                "name": "Second",
                "email": email,
                "password": TEST_PASSWORD,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_register_rejects_weak_passwords() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    for password in ["short1", "myPassword99"] {
        let response = ctx
            .request(
                "POST",
                "/users",
                None,
                Some(json!({
                    "name": "Weak",
                    "email": format!("weak-{}@example.com", uuid::Uuid::new_v4()),
                    "password": password,
                })),
            )
            .await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "password {:?} should be rejected",
            password
        );
    }

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_login_issues_fresh_token_and_fails_generically() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("Login").await;
    let email = registered["user"]["email"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": email, "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = json_body(response).await;
    assert!(login["token"].is_string());
    assert_ne!(login["token"], registered["token"]);

    // Wrong password and unknown email share one body
    let response = ctx
        .request(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": email, "password": "wrong-pass-123" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Unable to login." }));

    let response = ctx
        .request(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Unable to login." }));

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_missing_or_bad_token_yields_401() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let response = ctx.request("GET", "/tasks", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Please authenticate." })
    );

    let response = ctx
        .request("GET", "/tasks", Some("not-a-real-token"), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_logout_revokes_only_current_session() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("Sessions").await;
    let email = registered["user"]["email"].as_str().unwrap().to_string();
    let first_token = registered["token"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": email, "password": TEST_PASSWORD })),
        )
        .await;
    let second_token = json_body(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = ctx
        .request("POST", "/users/logout", Some(&first_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx.request("GET", "/users/me", Some(&first_token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .request("GET", "/users/me", Some(&second_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_logout_all_revokes_every_session() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("AllOut").await;
    let email = registered["user"]["email"].as_str().unwrap().to_string();
    let first_token = registered["token"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": email, "password": TEST_PASSWORD })),
        )
        .await;
    let second_token = json_body(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = ctx
        .request("POST", "/users/logoutAll", Some(&second_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    for token in [&first_token, &second_token] {
        let response = ctx.request("GET", "/users/me", Some(token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_profile_update_allow_list() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("Patchy").await;
    let token = registered["token"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "PATCH",
            "/users/me",
            Some(&token),
            Some(json!({ "name": "Renamed", "age": 30 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["age"], 30);

    // One unknown key fails the whole request, valid keys included
    let response = ctx
        .request(
            "PATCH",
            "/users/me",
            Some(&token),
            Some(json!({ "name": "Ignored", "height": 180 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Invalid update." }));

    let response = ctx.request("GET", "/users/me", Some(&token), None).await;
    assert_eq!(json_body(response).await["name"], "Renamed");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_password_change_invalidates_old_password() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("Rotator").await;
    let token = registered["token"].as_str().unwrap().to_string();
    let email = registered["user"]["email"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "PATCH",
            "/users/me",
            Some(&token),
            Some(json!({ "password": "brand-new-secret-9" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .request(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": email, "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .request(
            "POST",
            "/users/login",
            None,
            Some(json!({ "email": email, "password": "brand-new-secret-9" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_task_crud_roundtrip() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("Tasker").await;
    let token = registered["token"].as_str().unwrap().to_string();

    // Owner comes from the token; the extra field in the body is ignored
    let response = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({ "description": "  buy milk  ", "owner_id": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let task = json_body(response).await;
    assert_eq!(task["description"], "buy milk");
    assert_eq!(task["completed"], false);
    assert_eq!(task["owner_id"], registered["user"]["id"]);
    let task_id = task["id"].as_str().unwrap().to_string();

    let response = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .request(
            "PATCH",
            &format!("/tasks/{}", task_id),
            Some(&token),
            Some(json!({ "completed": true })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["completed"], true);

    let response = ctx
        .request("DELETE", &format!("/tasks/{}", task_id), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_task_update_allow_list() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("TaskPatch").await;
    let token = registered["token"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({ "description": "immutable owner" })),
        )
        .await;
    let task_id = json_body(response).await["id"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "PATCH",
            &format!("/tasks/{}", task_id),
            Some(&token),
            Some(json!({ "completed": true, "priority": "high" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Invalid update." }));

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_tasks_are_scoped_to_their_owner() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let alice = ctx.register_user("Alice").await;
    let alice_token = alice["token"].as_str().unwrap().to_string();
    let bob = ctx.register_user("Bob").await;
    let bob_token = bob["token"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "POST",
            "/tasks",
            Some(&alice_token),
            Some(json!({ "description": "alice's secret" })),
        )
        .await;
    let task_id = json_body(response).await["id"].as_str().unwrap().to_string();

    // Another user's task reads as absent, for every verb
    for (method, body) in [
        ("GET", None),
        ("PATCH", Some(json!({ "completed": true }))),
        ("DELETE", None),
    ] {
        let response = ctx
            .request(method, &format!("/tasks/{}", task_id), Some(&bob_token), body)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} should 404", method);
    }

    let response = ctx
        .request("GET", &format!("/tasks/{}", task_id), Some(&alice_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_list_filter_sort_and_paginate() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("Lister").await;
    let token = registered["token"].as_str().unwrap().to_string();

    for (description, completed) in [("first", false), ("second", true), ("third", true)] {
        let response = ctx
            .request(
                "POST",
                "/tasks",
                Some(&token),
                Some(json!({ "description": description, "completed": completed })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = ctx
        .request("GET", "/tasks?completed=true", Some(&token), None)
        .await;
    let tasks = json_body(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 2);

    let response = ctx
        .request(
            "GET",
            "/tasks?sortBy=createdAt:desc&limit=1",
            Some(&token),
            None,
        )
        .await;
    let tasks = json_body(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["description"], "third");

    let response = ctx
        .request("GET", "/tasks?sortBy=createdAt&skip=2", Some(&token), None)
        .await;
    let tasks = json_body(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["description"], "third");

    // An unparseable limit degrades to the full list
    let response = ctx
        .request("GET", "/tasks?limit=banana", Some(&token), None)
        .await;
    let tasks = json_body(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 3);

    // A present-but-empty completed value applies no filter
    let response = ctx
        .request("GET", "/tasks?completed=", Some(&token), None)
        .await;
    let tasks = json_body(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 3);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_malformed_task_id_is_rejected() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("BadId").await;
    let token = registered["token"].as_str().unwrap().to_string();

    let response = ctx
        .request("GET", "/tasks/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_avatar_upload_fetch_and_delete() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("Pic").await;
    let token = registered["token"].as_str().unwrap().to_string();
    let user_id = registered["user"]["id"].as_str().unwrap().to_string();

    let (content_type, body) = common::multipart_avatar("me.png", &common::test_png(512, 384));
    let request = Request::builder()
        .method("POST")
        .uri("/users/me/avatar")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Fetch is public and always serves the normalized PNG
    let response = ctx
        .request("GET", &format!("/users/{}/avatar", user_id), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/png"
    );
    let png = raw_body(response).await;
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.width(), 250);
    assert_eq!(decoded.height(), 250);

    let response = ctx
        .request("DELETE", "/users/me/avatar", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .request("GET", &format!("/users/{}/avatar", user_id), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_avatar_rejects_wrong_extension() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("BadPic").await;
    let token = registered["token"].as_str().unwrap().to_string();

    let (content_type, body) = common::multipart_avatar("resume.pdf", b"%PDF-1.4 not an image");
    let request = Request::builder()
        .method("POST")
        .uri("/users/me/avatar")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Please upload a JPG, JPEG, or PNG file." })
    );

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_delete_account_removes_user_and_tasks() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let registered = ctx.register_user("Leaver").await;
    let token = registered["token"].as_str().unwrap().to_string();

    let response = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({ "description": "left behind" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx.request("DELETE", "/users/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = json_body(response).await;
    assert_eq!(profile["name"], "Leaver");

    // The session died with the account
    let response = ctx.request("GET", "/users/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let user_id = uuid::Uuid::parse_str(registered["user"]["id"].as_str().unwrap()).unwrap();
    let remaining: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE owner_id = $1")
            .bind(user_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(remaining.0, 0);

    ctx.cleanup().await;
}
