/// End-to-end API tests
///
/// Each test drives the full router (auth layers, admin gates, handlers,
/// error mapping) against a fresh in-memory store.

mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, TestContext, ADMIN_EMAIL, PASSWORD};
use serde_json::{json, Value};
use uuid::Uuid;

fn without_timestamp(mut value: Value) -> Value {
    if let Some(object) = value.as_object_mut() {
        object.remove("updatedAt");
    }
    value
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "connected");
}

#[tokio::test]
async fn test_register_hides_password_hash() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "User One",
                "email": "u1@test.com",
                "password": PASSWORD
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "u1@test.com");
    assert_eq!(body["user"]["role"], "member");
    assert_eq!(body["user"]["isActive"], true);
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let ctx = TestContext::new();
    ctx.register("User One", "u1@test.com").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Imposter",
                "email": "U1@Test.com",
                "password": PASSWORD
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already registered");

    let admin = ctx.admin().await;
    let (_, users) = ctx.get("/api/users", &admin.token).await;
    let matching = users
        .as_array()
        .unwrap()
        .iter()
        .filter(|u| u["email"].as_str().unwrap().eq_ignore_ascii_case("u1@test.com"))
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
async fn test_registration_rules() {
    let ctx = TestContext::new();

    let cases = [
        (json!({ "name": "U", "email": "u@test.com", "password": PASSWORD }), "name"),
        (json!({ "name": "User", "email": "nope", "password": PASSWORD }), "email"),
        (json!({ "name": "User", "email": "u@test.com", "password": "abc" }), "password"),
        (
            json!({ "name": "User", "email": "u@test.com", "password": PASSWORD, "phone": "555-12" }),
            "phone",
        ),
    ];

    for (body, field) in cases {
        let (status, response) = ctx
            .send(Method::POST, "/api/auth/register", None, Some(body))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", response);
        assert_eq!(response["details"][0]["field"], field);
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/projects")
        .header("authorization", format!("Bearer {}", u1.token))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{ not json"))
        .unwrap();

    use tower::Service as _;
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures() {
    let ctx = TestContext::new();
    ctx.register("User One", "u1@test.com").await;

    let (status, body) = ctx.login_raw("u1@test.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, _) = ctx.login_raw("nobody@test.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_returns_token_and_summary() {
    let ctx = TestContext::new();
    ctx.register("User One", "u1@test.com").await;

    let (status, body) = ctx.login_raw("u1@test.com", PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().unwrap().split('.').count() == 3);
    assert!(body["expiresIn"].as_i64().unwrap() > 0);
    assert_eq!(body["user"]["email"], "u1@test.com");
    assert_eq!(body["user"]["role"], "member");
}

#[tokio::test]
async fn test_authentication_is_required() {
    let ctx = TestContext::new();

    let (status, _) = ctx.send(Method::GET, "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get("/api/tasks", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unauthenticated requests never reach the resource lookup
    let (status, _) = ctx
        .send(Method::GET, &format!("/api/projects/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_and_logout() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;

    let (status, me) = ctx.get("/api/auth/me", &u1.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], u1.id.as_str());

    let (status, body) = ctx
        .send(Method::POST, "/api/auth/logout", Some(&u1.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_project_visibility_scenario() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let u2 = ctx.session("User Two", "u2@test.com").await;

    let alpha = ctx.create_project(&u1, "Alpha", "first").await;
    let alpha_id = id_of(&alpha);
    assert_eq!(alpha["owner"]["id"], u1.id.as_str());
    assert_eq!(alpha["members"].as_array().unwrap().len(), 1);
    assert_eq!(alpha["status"], "active");

    let (status, listed) = ctx.get("/api/projects", &u1.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Alpha");

    let (status, listed) = ctx.get("/api/projects", &u2.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());

    let uri = format!("/api/projects/{}", alpha_id);

    let (status, _) = ctx.get(&uri, &u2.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.put(&uri, &u2.token, json!({ "name": "Hijacked" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized");

    let (_, after) = ctx.get(&uri, &u1.token).await;
    assert_eq!(after["name"], "Alpha");
    assert_eq!(after["description"], "first");
}

#[tokio::test]
async fn test_admin_sees_only_own_projects() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let admin = ctx.admin().await;

    ctx.create_project(&u1, "Alpha", "").await;

    let (_, listed) = ctx.get("/api/projects", &admin.token).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_project_description_truthy_overwrite() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let project = ctx.create_project(&u1, "Alpha", "original").await;
    let uri = format!("/api/projects/{}", id_of(&project));

    let (status, body) = ctx.put(&uri, &u1.token, json!({ "description": "" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "original");

    let (_, body) = ctx.put(&uri, &u1.token, json!({ "description": "x" })).await;
    assert_eq!(body["description"], "x");

    let (_, body) = ctx.put(&uri, &u1.token, json!({ "description": null })).await;
    assert!(body["description"].is_null());

    let (_, body) = ctx
        .put(&uri, &u1.token, json!({ "name": "Beta", "status": "archived" }))
        .await;
    assert_eq!(body["name"], "Beta");
    assert_eq!(body["status"], "archived");
}

#[tokio::test]
async fn test_invalid_status_is_rejected_by_store() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let project = ctx.create_project(&u1, "Alpha", "").await;
    let uri = format!("/api/projects/{}", id_of(&project));

    let (status, body) = ctx.put(&uri, &u1.token, json!({ "status": "paused" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "status");

    let (_, after) = ctx.get(&uri, &u1.token).await;
    assert_eq!(after["status"], "active");

    let task = ctx.create_task(&u1, &id_of(&project), "Write report").await;
    let (status, _) = ctx
        .put(
            &format!("/api/tasks/{}", id_of(&task)),
            &u1.token,
            json!({ "priority": "urgent" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_empty_task_update_is_idempotent() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let project = ctx.create_project(&u1, "Alpha", "").await;
    let task = ctx.create_task(&u1, &id_of(&project), "Write report").await;
    let uri = format!("/api/tasks/{}", id_of(&task));

    for _ in 0..3 {
        let (status, body) = ctx.put(&uri, &u1.token, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(without_timestamp(body), without_timestamp(task.clone()));
    }
}

#[tokio::test]
async fn test_any_user_may_edit_tasks() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let u2 = ctx.session("User Two", "u2@test.com").await;
    let project = ctx.create_project(&u1, "Alpha", "").await;
    let task = ctx.create_task(&u1, &id_of(&project), "Write report").await;

    let (status, body) = ctx
        .put(
            &format!("/api/tasks/{}", id_of(&task)),
            &u2.token,
            json!({ "status": "in progress", "assignedTo": u2.id, "deadline": "2025-03-01" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "in progress");
    assert_eq!(body["assignedTo"]["id"], u2.id.as_str());
    assert_eq!(body["assignedTo"]["name"], "User Two");
    assert_eq!(body["deadline"], "2025-03-01");
    assert_eq!(body["project"]["name"], "Alpha");
}

#[tokio::test]
async fn test_task_creation_defaults_and_alias() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let project_id = id_of(&ctx.create_project(&u1, "Alpha", "").await);

    let (status, body) = ctx
        .post(
            "/api/tasks",
            &u1.token,
            json!({ "title": "Plan", "projectId": project_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["priority"], "medium");
    assert_eq!(body["projectId"], project_id.as_str());

    let (status, _) = ctx
        .post("/api/tasks", &u1.token, json!({ "project": project_id }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .post("/api/tasks", &u1.token, json!({ "title": "Orphan" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_task_may_reference_missing_project() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let ghost = Uuid::new_v4().to_string();

    let task = ctx.create_task(&u1, &ghost, "Floating").await;
    assert!(task["project"].is_null());
    assert_eq!(task["projectId"], ghost.as_str());
}

#[tokio::test]
async fn test_deleting_project_orphans_tasks() {
    let ctx = TestContext::new();
    let admin = ctx.admin().await;
    let project = ctx.create_project(&admin, "Alpha", "").await;
    let project_id = id_of(&project);
    let task = ctx.create_task(&admin, &project_id, "Write report").await;
    assert_eq!(task["project"]["id"], project_id.as_str());

    let (status, body) = ctx
        .delete(&format!("/api/projects/{}", project_id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project removed");

    let (status, orphan) = ctx
        .get(&format!("/api/tasks/{}", id_of(&task)), &admin.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(orphan["project"].is_null());
    assert_eq!(orphan["projectId"], project_id.as_str());

    let (_, by_project) = ctx
        .get(&format!("/api/tasks/project/{}", project_id), &admin.token)
        .await;
    assert_eq!(by_project.as_array().unwrap().len(), 1);

    let (_, all) = ctx.get("/api/tasks", &admin.token).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_project_delete_needs_admin_and_owner() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let admin = ctx.admin().await;
    let project = ctx.create_project(&u1, "Alpha", "").await;
    let uri = format!("/api/projects/{}", id_of(&project));

    // Owner without admin role stops at the admin layer
    let (status, body) = ctx.delete(&uri, &u1.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    // Admin who is not the owner is refused by the decision table
    let (status, body) = ctx.delete(&uri, &admin.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized");

    let (status, _) = ctx.get(&uri, &u1.token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_task_delete_is_admin_only() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let admin = ctx.admin().await;
    let project = ctx.create_project(&u1, "Alpha", "").await;
    let task = ctx.create_task(&u1, &id_of(&project), "Write report").await;
    let uri = format!("/api/tasks/{}", id_of(&task));

    let (status, _) = ctx.delete(&uri, &u1.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.delete(&uri, &admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task removed");

    let (status, _) = ctx.delete(&uri, &admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_and_malformed_ids_are_not_found() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;

    for uri in [
        format!("/api/projects/{}", Uuid::new_v4()),
        "/api/projects/not-an-id".to_string(),
        format!("/api/tasks/{}", Uuid::new_v4()),
        "/api/tasks/not-an-id".to_string(),
    ] {
        let (status, body) = ctx.get(&uri, &u1.token).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], "not_found");
    }

    let (status, body) = ctx.get("/api/tasks/project/not-an-id", &u1.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_user_admin_routes_are_gated() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let target = Uuid::new_v4();

    let (status, _) = ctx.get("/api/users", &u1.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .put(&format!("/api/users/block/{}", target), &u1.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .put(&format!("/api/users/activate/{}", target), &u1.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .delete(&format!("/api/users/delete/{}", u1.id), &u1.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_users_has_no_hashes() {
    let ctx = TestContext::new();
    ctx.register("User One", "u1@test.com").await;
    let admin = ctx.admin().await;

    let (status, users) = ctx.get("/api/users", &admin.token).await;
    assert_eq!(status, StatusCode::OK);

    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("passwordHash").is_none());
    }
    assert!(users.iter().any(|u| u["email"] == ADMIN_EMAIL && u["role"] == "admin"));
}

#[tokio::test]
async fn test_blocked_user_keeps_live_token() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let admin = ctx.admin().await;
    ctx.create_project(&u1, "Alpha", "").await;

    let (status, body) = ctx
        .put(&format!("/api/users/block/{}", u1.id), &admin.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isActive"], false);

    // Existing sessions are not revoked
    let (status, listed) = ctx.get("/api/projects", &u1.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // New logins are refused
    let (status, _) = ctx.login_raw(&u1.email, PASSWORD).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .put(&format!("/api/users/activate/{}", u1.id), &admin.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isActive"], true);

    let (status, _) = ctx.login_raw(&u1.email, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deleted_user_references_degrade() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let u2 = ctx.session("User Two", "u2@test.com").await;
    let admin = ctx.admin().await;

    let project = ctx.create_project(&u1, "Alpha", "").await;
    let (_, task) = ctx
        .post(
            "/api/tasks",
            &u1.token,
            json!({ "title": "Review", "project": id_of(&project), "assignedTo": u2.id }),
        )
        .await;

    let (status, _) = ctx
        .delete(&format!("/api/users/delete/{}", u2.id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .get(&format!("/api/tasks/{}", id_of(&task)), &u1.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignedTo"]["id"], u2.id.as_str());
    assert_eq!(body["assignedTo"]["name"], "Unknown user");
    assert!(body["assignedTo"]["email"].is_null());

    // The deleted user's token no longer authenticates
    let (status, _) = ctx.get("/api/projects", &u2.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .delete(&format!("/api/users/delete/{}", u2.id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assign_task_note() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let u2 = ctx.session("User Two", "u2@test.com").await;

    let (status, body) = ctx
        .post(
            "/api/users/assign-task",
            &u1.token,
            json!({ "userId": u2.id, "task": "Review the release notes" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], u2.id.as_str());
    let notes = body["user"]["tasks"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["description"], "Review the release notes");
    assert!(notes[0]["assignedAt"].is_string());

    let (status, _) = ctx
        .post(
            "/api/users/assign-task",
            &u1.token,
            json!({ "userId": Uuid::new_v4(), "task": "Nobody" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_enforces_length_limits() {
    let ctx = TestContext::new();
    let u1 = ctx.session("User One", "u1@test.com").await;
    let project = ctx.create_project(&u1, "Alpha", "").await;
    let task = ctx.create_task(&u1, &id_of(&project), "Write report").await;
    let too_long = "x".repeat(256);

    let project_uri = format!("/api/projects/{}", id_of(&project));
    let (status, body) = ctx
        .put(&project_uri, &u1.token, json!({ "name": too_long }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "name");

    let (_, after) = ctx.get(&project_uri, &u1.token).await;
    assert_eq!(after["name"], "Alpha");

    let task_uri = format!("/api/tasks/{}", id_of(&task));
    let (status, body) = ctx
        .put(&task_uri, &u1.token, json!({ "title": too_long }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "title");

    let (_, after) = ctx.get(&task_uri, &u1.token).await;
    assert_eq!(after["title"], "Write report");

    // The limit itself is accepted
    let (status, body) = ctx
        .put(&task_uri, &u1.token, json!({ "title": "y".repeat(255) }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"].as_str().unwrap().len(), 255);
}

#[tokio::test]
async fn test_register_enforces_column_limits() {
    let ctx = TestContext::new();

    let long_email = format!("{}@test.com", "a".repeat(250));
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "User", "email": long_email, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "User",
                "email": "u@test.com",
                "password": PASSWORD,
                "phone": "5".repeat(33)
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "phone");
}
