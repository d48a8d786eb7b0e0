/// Integration tests for the TeamTask API
///
/// These tests drive the full router:
/// - Authentication and route-level role gates (no database needed)
/// - Register and login
/// - Team creation and the invite flow
/// - Task updates with history, assignee checks and cached listing
/// - Comments and reports
///
/// Tests marked `#[ignore]` need PostgreSQL; run them with
/// `cargo test -p teamtask-api --test integration_test -- --ignored`.

mod common;

use axum::http::StatusCode;
use common::{token_for, unique_email, TestContext};
use serde_json::json;
use teamtask_shared::auth::jwt::validate_token;
use teamtask_shared::models::task::Task;
use teamtask_shared::models::task_history::TaskHistory;
use teamtask_shared::models::team_invite::TeamInvite;
use teamtask_shared::models::team_member::{TeamMember, TeamRole};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Without database
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::offline();

    for (method, uri) in [
        ("GET", "/api/v1/teams".to_string()),
        ("GET", format!("/api/v1/tasks?team_id={}", Uuid::new_v4())),
        ("PUT", format!("/api/v1/tasks/{}", Uuid::new_v4())),
        ("GET", "/api/v1/reports/team-summary".to_string()),
    ] {
        let (status, body) = ctx.request(method, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let ctx = TestContext::offline();

    let (status, _) = ctx
        .request("GET", "/api/v1/teams", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    use teamtask_shared::auth::jwt::{create_token, default_access_ttl, Claims};

    let ctx = TestContext::offline();
    let forged = create_token(
        &Claims::new(Uuid::new_v4(), "owner", default_access_ttl()),
        "some-other-secret-that-is-long-enough!!",
    )
    .unwrap();

    let (status, _) = ctx.request("GET", "/api/v1/teams", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_member_token_cannot_invite() {
    let ctx = TestContext::offline();
    let token = token_for(Uuid::new_v4(), "member");

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/api/v1/teams/{}/invite", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "email": "c@d" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_blank_or_malformed_invite_code_is_not_found() {
    let ctx = TestContext::offline();
    let token = token_for(Uuid::new_v4(), "member");

    for code in ["", "   ", "inv_short", "not-an-invite"] {
        let (status, body) = ctx
            .request(
                "POST",
                "/api/v1/teams/invites/accept",
                Some(&token),
                Some(json!({ "code": code })),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND, "code {:?}", code);
        assert_eq!(body["error"], "invite_not_found");
    }
}

#[tokio::test]
async fn test_unknown_role_cannot_create_tasks() {
    let ctx = TestContext::offline();
    let token = token_for(Uuid::new_v4(), "guest");

    let (status, _) = ctx
        .request(
            "POST",
            "/api/v1/tasks",
            Some(&token),
            Some(json!({ "team_id": Uuid::new_v4(), "title": "t" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_public_routes_ignore_bad_tokens() {
    let ctx = TestContext::offline();

    // Rejected by validation, not by authentication
    let (status, body) = ctx
        .request(
            "POST",
            "/api/v1/register",
            Some("garbage"),
            Some(json!({ "email": "a@b", "password": "p".repeat(129) })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::offline();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_path_id_is_bad_request() {
    let ctx = TestContext::offline();
    let token = token_for(Uuid::new_v4(), "member");

    let (status, _) = ctx
        .request("GET", "/api/v1/tasks/not-a-uuid/history", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_count_routed_requests() {
    let ctx = TestContext::offline();

    ctx.request("GET", "/api/v1/teams", None, None).await;
    ctx.request("GET", "/api/v1/teams", None, None).await;

    let (status, body) = ctx.request("GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let text = body.as_str().unwrap();
    assert!(text.contains("teamtask_up 1"));
    assert!(text.contains(
        "teamtask_http_requests_total{method=\"GET\",route=\"/api/v1/teams\",status=\"401\"} 2"
    ));
}

// ---------------------------------------------------------------------------
// With database
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_register_then_login() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email();

    let (status, user) = ctx
        .request(
            "POST",
            "/api/v1/register",
            None,
            Some(json!({ "email": email, "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(user.get("password_hash").is_none());

    let messages = ctx.mailer.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to, email);
    assert_eq!(messages[0].subject, "Welcome to TeamTask");

    let (status, login) = ctx
        .request(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "email": email, "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let claims = validate_token(login["token"].as_str().unwrap(), common::JWT_SECRET).unwrap();
    assert_eq!(claims.sub.to_string(), user["id"].as_str().unwrap());
    assert_eq!(claims.role, "member");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_register_rejects_duplicates_and_login_rejects_bad_password() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email();
    let body = json!({ "email": email, "password": "secret123" });

    let (status, _) = ctx.request("POST", "/api/v1/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = ctx.request("POST", "/api/v1/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "user_exists");

    let (status, _) = ctx
        .request(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "email": email, "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_email_identity_ignores_case() {
    let ctx = TestContext::new().await.unwrap();
    let email = unique_email();

    let (status, user) = ctx
        .request(
            "POST",
            "/api/v1/register",
            None,
            Some(json!({ "email": email, "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, err) = ctx
        .request(
            "POST",
            "/api/v1/register",
            None,
            Some(json!({ "email": email.to_uppercase(), "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "user_exists");

    let (status, login) = ctx
        .request(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "email": email.to_uppercase(), "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["id"], user["id"]);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_create_team_and_invite_flow() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let invitee = ctx.create_user().await;
    let owner_token = token_for(owner.id, "owner");
    let invitee_token = token_for(invitee.id, "member");

    let (status, team) = ctx
        .request(
            "POST",
            "/api/v1/teams",
            Some(&owner_token),
            Some(json!({ "name": "Core" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let team_id: Uuid = team["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(
        TeamMember::role_of(&ctx.db, team_id, owner.id).await.unwrap(),
        Some(TeamRole::Owner)
    );

    let (status, invite) = ctx
        .request(
            "POST",
            &format!("/api/v1/teams/{}/invite", team_id),
            Some(&owner_token),
            Some(json!({ "email": invitee.email })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = invite["code"].as_str().unwrap().to_string();
    assert!(code.starts_with("inv_"));

    let sent = ctx.mailer.messages();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains(&code));

    let (status, member) = ctx
        .request(
            "POST",
            "/api/v1/teams/invites/accept",
            Some(&invitee_token),
            Some(json!({ "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member["role"], "member");
    assert!(TeamInvite::find_by_code(&ctx.db, &code).await.unwrap().is_none());
    assert!(TeamMember::is_member(&ctx.db, team_id, invitee.id).await.unwrap());

    let (status, err) = ctx
        .request(
            "POST",
            "/api/v1/teams/invites/accept",
            Some(&invitee_token),
            Some(json!({ "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "invite_not_found");

    let (status, teams) = ctx.request("GET", "/api/v1/teams", Some(&invitee_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(teams.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_accept_with_other_email_is_forbidden() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let stranger = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;

    let (_, invite) = ctx
        .request(
            "POST",
            &format!("/api/v1/teams/{}/invite", team.id),
            Some(&token_for(owner.id, "owner")),
            Some(json!({ "email": unique_email() })),
        )
        .await;

    let (status, err) = ctx
        .request(
            "POST",
            "/api/v1/teams/invites/accept",
            Some(&token_for(stranger.id, "member")),
            Some(json!({ "code": invite["code"] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "invite_email_mismatch");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_invite_by_plain_member_is_forbidden_even_with_owner_claim() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let member = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;
    ctx.add_member(&team, &member, TeamRole::Member).await;

    // The claim passes the route gate; the membership check still refuses
    let (status, _) = ctx
        .request(
            "POST",
            &format!("/api/v1/teams/{}/invite", team.id),
            Some(&token_for(member.id, "owner")),
            Some(json!({ "email": unique_email() })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(ctx.mailer.messages().is_empty());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_invite_existing_member_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let member = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;
    ctx.add_member(&team, &member, TeamRole::Member).await;

    let (status, err) = ctx
        .request(
            "POST",
            &format!("/api/v1/teams/{}/invite", team.id),
            Some(&token_for(owner.id, "owner")),
            Some(json!({ "email": member.email })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "already_member");

    let (status, err) = ctx
        .request(
            "POST",
            &format!("/api/v1/teams/{}/invite", team.id),
            Some(&token_for(owner.id, "owner")),
            Some(json!({ "email": member.email.to_uppercase() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "already_member");
    assert!(ctx.mailer.messages().is_empty());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_update_records_diff_and_completion() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;
    let task = ctx.create_task(&team, &owner, "a").await;
    let token = token_for(owner.id, "owner");

    let (status, updated) = ctx
        .request(
            "PUT",
            &format!("/api/v1/tasks/{}", task.id),
            Some(&token),
            Some(json!({ "title": "b", "status": "done" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "b");
    assert_eq!(updated["status"], "done");

    let stored = Task::find_by_id(&ctx.db, task.id).await.unwrap().unwrap();
    let completed_at = stored.completed_at.expect("completed_at set");
    assert!((chrono::Utc::now() - completed_at).num_seconds().abs() < 60);

    let history = TaskHistory::list_by_task(&ctx.db, task.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(
        serde_json::to_value(&history[0].changes).unwrap(),
        json!({
            "title": { "from": "a", "to": "b" },
            "status": { "from": "todo", "to": "done" },
        })
    );

    // Leaving done clears completed_at; an empty update still logs a row
    let (status, reopened) = ctx
        .request(
            "PUT",
            &format!("/api/v1/tasks/{}", task.id),
            Some(&token),
            Some(json!({ "status": "in_progress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(reopened["completed_at"].is_null());

    let (status, _) = ctx
        .request("PUT", &format!("/api/v1/tasks/{}", task.id), Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, history) = ctx
        .request("GET", &format!("/api/v1/tasks/{}/history", task.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2]["changes"], json!({}));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_update_of_done_task_restamps_completion() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;
    let task = ctx.create_task(&team, &owner, "a").await;
    let token = token_for(owner.id, "owner");
    let uri = format!("/api/v1/tasks/{}", task.id);

    let (status, _) = ctx
        .request("PUT", &uri, Some(&token), Some(json!({ "status": "done" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let first = Task::find_by_id(&ctx.db, task.id)
        .await
        .unwrap()
        .unwrap()
        .completed_at
        .expect("completed_at set");

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let (status, _) = ctx
        .request(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "status": "done", "title": "b" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let second = Task::find_by_id(&ctx.db, task.id)
        .await
        .unwrap()
        .unwrap()
        .completed_at
        .expect("completed_at set");

    assert!(second > first);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_update_by_non_creator_is_forbidden_and_unchanged() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let member = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;
    ctx.add_member(&team, &member, TeamRole::Admin).await;
    let task = ctx.create_task(&team, &owner, "mine").await;

    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/v1/tasks/{}", task.id),
            Some(&token_for(member.id, "admin")),
            Some(json!({ "title": "theirs" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let stored = Task::find_by_id(&ctx.db, task.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "mine");
    assert_eq!(TaskHistory::count_by_task(&ctx.db, task.id).await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_update_missing_task_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.create_user().await;

    let (status, _) = ctx
        .request(
            "PUT",
            &format!("/api/v1/tasks/{}", Uuid::new_v4()),
            Some(&token_for(user.id, "member")),
            Some(json!({ "title": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_create_task_with_outside_assignee_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let outsider = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;

    let (status, err) = ctx
        .request(
            "POST",
            "/api/v1/tasks",
            Some(&token_for(owner.id, "owner")),
            Some(json!({ "team_id": team.id, "title": "t", "assignee_id": outsider.id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_assignee");

    let (status, created) = ctx
        .request(
            "POST",
            "/api/v1/tasks",
            Some(&token_for(owner.id, "owner")),
            Some(json!({ "team_id": team.id, "title": "  t  ", "status": "done", "assignee_id": owner.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "t");
    assert!(!created["completed_at"].is_null());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_task_list_second_read_is_served_from_cache() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;
    ctx.create_task(&team, &owner, "one").await;
    ctx.create_task(&team, &owner, "two").await;
    let token = token_for(owner.id, "owner");
    let uri = format!("/api/v1/tasks?team_id={}&page=1&per_page=10", team.id);

    let (status, first) = ctx.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["total"], 2);
    assert_eq!(ctx.cache.stats().misses, 1);
    assert_eq!(ctx.cache.stats().sets, 1);

    let (status, second) = ctx.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.cache.stats().hits, 1);
    assert_eq!(ctx.cache.stats().sets, 1);
    assert_eq!(first["items"], second["items"]);

    // Items may be stale, the total never is
    ctx.create_task(&team, &owner, "three").await;
    let (_, third) = ctx.request("GET", &uri, Some(&token), None).await;
    assert_eq!(third["items"].as_array().unwrap().len(), 2);
    assert_eq!(third["total"], 3);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_task_list_survives_cache_failure() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;
    ctx.create_task(&team, &owner, "one").await;
    ctx.cache.fail_with(Some("cache down"));

    let (status, page) = ctx
        .request(
            "GET",
            &format!("/api/v1/tasks?team_id={}&page=0&per_page=500", team.id),
            Some(&token_for(owner.id, "owner")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["per_page"], 100);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_task_list_by_non_member_is_forbidden() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let outsider = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;

    let (status, _) = ctx
        .request(
            "GET",
            &format!("/api/v1/tasks?team_id={}", team.id),
            Some(&token_for(outsider.id, "owner")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_comment_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let member = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;
    ctx.add_member(&team, &member, TeamRole::Member).await;
    let task = ctx.create_task(&team, &owner, "discuss").await;
    let owner_token = token_for(owner.id, "owner");
    let member_token = token_for(member.id, "member");
    let base = format!("/api/v1/tasks/{}/comments", task.id);

    let (status, comment) = ctx
        .request("POST", &base, Some(&member_token), Some(json!({ "body": "first" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_uri = format!("{}/{}", base, comment["id"].as_str().unwrap());

    let (status, _) = ctx
        .request("PUT", &comment_uri, Some(&owner_token), Some(json!({ "body": "hijack" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, edited) = ctx
        .request("PUT", &comment_uri, Some(&member_token), Some(json!({ "body": "edited" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["body"], "edited");

    let (status, page) = ctx.request("GET", &base, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);

    let (status, _) = ctx.request("DELETE", &comment_uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.request("DELETE", &comment_uri, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = ctx.request("DELETE", &comment_uri, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_reports() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_user().await;
    let outsider = ctx.create_user().await;
    let team = ctx.create_team(&owner).await;
    let task = ctx.create_task(&team, &owner, "stray").await;
    let token = token_for(owner.id, "owner");

    // Assignees are not foreign keys to memberships; plant a violation
    sqlx::query("UPDATE tasks SET assignee_id = $1 WHERE id = $2")
        .bind(outsider.id)
        .bind(task.id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let (status, summary) = ctx
        .request("GET", "/api/v1/reports/team-summary", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let row = summary
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["team_id"] == json!(team.id))
        .unwrap();
    assert_eq!(row["members_count"], 1);

    let (status, invalid) = ctx
        .request("GET", "/api/v1/reports/invalid-assignees", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(invalid
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["task_id"] == json!(task.id) && r["assignee_id"] == json!(outsider.id)));

    let month = chrono::Utc::now().format("%Y-%m").to_string();
    let (status, top) = ctx
        .request(
            "GET",
            &format!("/api/v1/reports/top-creators?month={}", month),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let entry = top
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["team_id"] == json!(team.id))
        .unwrap();
    assert_eq!(entry["creators"][0]["user_id"], json!(owner.id));
    assert_eq!(entry["creators"][0]["tasks_created"], 1);

    let (status, _) = ctx
        .request("GET", "/api/v1/reports/top-creators?month=2024-13", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .request("GET", "/api/v1/reports/top-creators", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn test_health_reports_connected_dependencies() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["cache"], "connected");

    ctx.cache.fail_with(Some("down"));
    let (_, body) = ctx.request("GET", "/health", None, None).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["cache"], "disconnected");
}
