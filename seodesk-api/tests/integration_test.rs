/// Integration tests for the seodesk API
///
/// These drive the full router over an in-memory store:
/// - Registration, login, logout and session revocation
/// - Ownership checks on every entity, including parent-project inheritance
/// - Atomic cross-entity guards on create and update
/// - Dashboard aggregation end to end

mod common;

use axum::http::StatusCode;
use common::{days_from_now, ids, project_body, TestContext, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();

    let response = ctx.send("GET", "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["store"], "memory: connected");
}

#[tokio::test]
async fn test_register_returns_user_and_token() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": "alice",
                "password": PASSWORD,
                "email": "alice@agency.test",
                "fullName": "Alice Smith"
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["username"], "alice");
    assert_eq!(response.body["fullName"], "Alice Smith");
    assert_eq!(response.body["role"], "user");
    assert!(response.body["token"].is_string());
    assert!(response.body.get("password").is_none());
    assert!(response.body.get("passwordHash").is_none());

    let logs = ctx.store.recent_activity(10).await.unwrap();
    assert_eq!(logs[0].details.as_deref(), Some("User registration"));
}

#[tokio::test]
async fn test_register_rejections() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let missing = ctx
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({ "username": "bob", "password": PASSWORD })),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["message"], "Missing required fields");

    let same_username = ctx
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": "alice",
                "password": PASSWORD,
                "email": "other@agency.test",
                "fullName": "Other"
            })),
        )
        .await;
    assert_eq!(same_username.status, StatusCode::BAD_REQUEST);
    assert_eq!(same_username.body["message"], "Username already exists");

    let same_email = ctx
        .send(
            "POST",
            "/api/register",
            None,
            Some(json!({
                "username": "bob",
                "password": PASSWORD,
                "email": "alice@agency.test",
                "fullName": "Bob"
            })),
        )
        .await;
    assert_eq!(same_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(same_email.body["message"], "Email already exists");
}

#[tokio::test]
async fn test_login_and_logout() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let wrong = ctx
        .send(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "alice", "password": "nope" })),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let login = ctx
        .send(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.body["token"].as_str().unwrap().to_string();

    let me = ctx.send("GET", "/api/user", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "alice");

    let logout = ctx.send("POST", "/api/logout", Some(&token), None).await;
    assert_eq!(logout.status, StatusCode::OK);

    let revoked = ctx.send("GET", "/api/user", Some(&token), None).await;
    assert_eq!(revoked.status, StatusCode::UNAUTHORIZED);

    let details: Vec<String> = ctx
        .store
        .recent_activity(10)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|log| log.details)
        .collect();
    assert_eq!(details, vec!["User logout", "User login", "User registration"]);
}

#[tokio::test]
async fn test_logout_without_session_is_ok() {
    let ctx = TestContext::new();

    let response = ctx.send("POST", "/api/logout", None, None).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = ctx.send("POST", "/api/logout", Some("garbage"), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ctx.activity_count().await, 0);
}

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected_first() {
    let ctx = TestContext::new();

    for (method, uri) in [
        ("GET", "/api/clients"),
        ("GET", "/api/clients/999"),
        ("DELETE", "/api/projects/999"),
        ("GET", "/api/tasks/upcoming"),
        ("GET", "/api/dashboard/stats"),
    ] {
        let response = ctx.send(method, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(response.body, json!({ "message": "Unauthorized" }));
    }

    let bad_token = ctx.send("GET", "/api/clients", Some("not.a.token"), None).await;
    assert_eq!(bad_token.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    ctx.register("bob").await;

    let response = ctx
        .put("/api/user", &alice, json!({ "fullName": "Alice Jones" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["fullName"], "Alice Jones");
    assert_eq!(response.body["email"], "alice@agency.test");

    let taken = ctx
        .put("/api/user", &alice, json!({ "email": "bob@agency.test" }))
        .await;
    assert_eq!(taken.status, StatusCode::BAD_REQUEST);
    assert_eq!(taken.body["message"], "Email already exists");

    let invalid = ctx
        .put("/api/user", &alice, json!({ "email": "not-an-email" }))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["errors"][0]["field"], "email");
}

#[tokio::test]
async fn test_client_crud() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    let first = ctx.create_client(&alice, "Acme").await;
    let second = ctx.create_client(&alice, "Globex").await;

    let list = ctx.get("/api/clients", &alice).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(ids(&list.body), vec![second, first]);
    assert_eq!(list.body[0]["createdBy"].as_i64(), Some(alice.id));

    let updated = ctx
        .put(
            &format!("/api/clients/{}", first),
            &alice,
            json!({ "name": "Acme Corp", "phone": "555-0100" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["name"], "Acme Corp");
    assert_eq!(updated.body["phone"], "555-0100");
    assert_eq!(updated.body["contactPerson"], "Jane Roe");

    let logs = ctx.store.recent_activity_for_user(alice.id as i32, 1).await.unwrap();
    assert_eq!(logs[0].details.as_deref(), Some("Updated client: Acme"));

    let cleared = ctx
        .put(&format!("/api/clients/{}", first), &alice, json!({ "phone": null }))
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert!(cleared.body["phone"].is_null());
}

#[tokio::test]
async fn test_client_validation() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    let response = ctx
        .post(
            "/api/clients",
            &alice,
            json!({ "name": "Acme", "contactPerson": "Jane", "email": "nope" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Invalid client data");
    assert_eq!(response.body["errors"][0]["field"], "email");

    let malformed = ctx
        .send("POST", "/api/clients", Some(&alice.token), None)
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert!(malformed.body["message"].is_string());
}

#[tokio::test]
async fn test_non_owner_is_forbidden_without_leaking_fields() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let uri = format!("/api/clients/{}", client);

    let get = ctx.get(&uri, &bob).await;
    let put = ctx.put(&uri, &bob, json!({ "name": "Stolen" })).await;
    let delete = ctx.delete(&uri, &bob).await;

    for response in [get, put, delete] {
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body, json!({ "message": "Forbidden" }));
    }

    let still_there = ctx.get(&uri, &alice).await;
    assert_eq!(still_there.body["name"], "Acme");
}

#[tokio::test]
async fn test_missing_entity_is_not_found_before_body_checks() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    let get = ctx.get("/api/clients/999", &alice).await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);
    assert_eq!(get.body["message"], "Client not found");

    let put = ctx
        .send("PUT", "/api/projects/999", Some(&alice.token), None)
        .await;
    assert_eq!(put.status, StatusCode::NOT_FOUND);
    assert_eq!(put.body["message"], "Project not found");

    let task = ctx.get("/api/tasks/999", &alice).await;
    assert_eq!(task.body["message"], "Task not found");
}

#[tokio::test]
async fn test_unparseable_ids_are_not_found() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;

    for uri in ["/api/clients/abc", "/api/tasks/99999999999", "/api/projects/1.5"] {
        let response = ctx.get(uri, &alice).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(response.body["message"], "Not found", "{}", uri);
    }

    let put = ctx
        .put("/api/clients/abc", &alice, json!({ "name": "" }))
        .await;
    assert_eq!(put.status, StatusCode::NOT_FOUND);
    assert_eq!(put.body["message"], "Not found");
}

#[tokio::test]
async fn test_long_client_name_is_accepted() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let name = "n".repeat(300);

    let id = ctx.create_client(&alice, &name).await;
    let fetched = ctx.get(&format!("/api/clients/{}", id), &alice).await;

    assert_eq!(fetched.body["name"].as_str().map(str::len), Some(300));
}

#[tokio::test]
async fn test_delete_twice() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let uri = format!("/api/clients/{}", client);

    let first = ctx.delete(&uri, &alice).await;
    assert_eq!(first.status, StatusCode::NO_CONTENT);
    assert!(first.body.is_null());

    let second = ctx.delete(&uri, &alice).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);

    let logs = ctx.store.recent_activity_for_user(alice.id as i32, 1).await.unwrap();
    assert_eq!(logs[0].details.as_deref(), Some("Deleted client: Acme"));
}

#[tokio::test]
async fn test_project_create_with_foreign_client() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let alices_client = ctx.create_client(&alice, "Acme").await;

    let response = ctx
        .post("/api/projects", &bob, project_body(alices_client, "Hijack"))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "Invalid client or permission denied");

    let missing = ctx
        .post("/api/projects", &bob, project_body(4242, "Nowhere"))
        .await;
    assert_eq!(missing.status, StatusCode::FORBIDDEN);

    assert!(ctx.store.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_project_update_to_foreign_client_is_rejected() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let alices_client = ctx.create_client(&alice, "Acme").await;
    let bobs_client = ctx.create_client(&bob, "Initech").await;
    let project = ctx.create_project(&alice, alices_client, "Acme SEO").await;

    let response = ctx
        .put(
            &format!("/api/projects/{}", project),
            &alice,
            json!({ "clientId": bobs_client, "name": "Moved" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "Invalid client or permission denied");

    let unchanged = ctx.get(&format!("/api/projects/{}", project), &alice).await;
    assert_eq!(unchanged.body["name"], "Acme SEO");
    assert_eq!(unchanged.body["clientId"].as_i64(), Some(alices_client));
}

#[tokio::test]
async fn test_project_survives_client_deletion() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let project = ctx.create_project(&alice, client, "Acme SEO").await;

    let deleted = ctx.delete(&format!("/api/clients/{}", client), &alice).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let response = ctx.get(&format!("/api/projects/{}", project), &alice).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "in_progress");
}

#[tokio::test]
async fn test_client_projects_listing() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let acme = ctx.create_client(&alice, "Acme").await;
    let globex = ctx.create_client(&alice, "Globex").await;
    let p1 = ctx.create_project(&alice, acme, "Acme SEO").await;
    let p2 = ctx.create_project(&alice, acme, "Acme PPC").await;
    ctx.create_project(&alice, globex, "Globex SEO").await;

    let response = ctx.get(&format!("/api/clients/{}/projects", acme), &alice).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), vec![p2, p1]);

    let foreign = ctx.get(&format!("/api/clients/{}/projects", acme), &bob).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_create_with_foreign_project() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let project = ctx.create_project(&alice, client, "Acme SEO").await;
    let activity_before = ctx.activity_count().await;

    let response = ctx
        .post(
            "/api/tasks",
            &bob,
            json!({ "title": "Sneaky", "projectId": project }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "Invalid project or permission denied");
    assert!(ctx.store.list_tasks().await.unwrap().is_empty());
    assert_eq!(ctx.activity_count().await, activity_before);
}

#[tokio::test]
async fn test_task_access_follows_parent_project() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let project = ctx.create_project(&alice, client, "Acme SEO").await;
    let task = ctx
        .create_task(&alice, project, "Keyword research", None, "pending")
        .await;
    let uri = format!("/api/tasks/{}", task);

    let forbidden = ctx.get(&uri, &bob).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let updated = ctx
        .put(&uri, &alice, json!({ "status": "in_progress", "priority": "high" }))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["status"], "in_progress");
    assert_eq!(updated.body["priority"], "high");

    let listed = ctx.get(&format!("/api/projects/{}/tasks", project), &alice).await;
    assert_eq!(ids(&listed.body), vec![task]);

    // Once the parent project is gone the task is unreachable
    ctx.delete(&format!("/api/projects/{}", project), &alice).await;
    let orphaned = ctx.get(&uri, &alice).await;
    assert_eq!(orphaned.status, StatusCode::NOT_FOUND);
    assert_eq!(orphaned.body["message"], "Project not found");
    assert_eq!(ctx.store.list_tasks().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_task_assignee_must_exist() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let project = ctx.create_project(&alice, client, "Acme SEO").await;

    let response = ctx
        .post(
            "/api/tasks",
            &alice,
            json!({ "title": "Audit", "projectId": project, "assignedTo": 999 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["field"], "assignedTo");
}

#[tokio::test]
async fn test_upcoming_tasks() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let project = ctx.create_project(&alice, client, "Acme SEO").await;
    let bobs_client = ctx.create_client(&bob, "Initech").await;
    let bobs_project = ctx.create_project(&bob, bobs_client, "Initech SEO").await;

    let in_three = ctx
        .create_task(&alice, project, "Three", Some(days_from_now(3)), "pending")
        .await;
    let tomorrow = ctx
        .create_task(&alice, project, "Tomorrow", Some(days_from_now(1)), "pending")
        .await;
    let in_ten = ctx
        .create_task(&alice, project, "Ten", Some(days_from_now(10)), "pending")
        .await;
    ctx.create_task(&alice, project, "Late", Some(days_from_now(-1)), "pending")
        .await;
    ctx.create_task(&alice, project, "Done", Some(days_from_now(2)), "completed")
        .await;
    ctx.create_task(&alice, project, "Undated", None, "pending").await;
    ctx.create_task(&bob, bobs_project, "Not mine", Some(days_from_now(1)), "pending")
        .await;

    let week = ctx.get("/api/tasks/upcoming", &alice).await;
    assert_eq!(week.status, StatusCode::OK);
    assert_eq!(ids(&week.body), vec![tomorrow, in_three]);

    let fortnight = ctx.get("/api/tasks/upcoming?days=14", &alice).await;
    assert_eq!(ids(&fortnight.body), vec![tomorrow, in_three, in_ten]);

    let invalid = ctx.get("/api/tasks/upcoming?days=soon", &alice).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reports() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let project = ctx.create_project(&alice, client, "Acme SEO").await;

    let created = ctx
        .post(
            "/api/reports",
            &alice,
            json!({ "title": "January", "projectId": project, "includeClientInfo": false }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(
        created.body["content"],
        format!(
            "Generated report for project {}. Includes task statistics. Includes performance charts. ",
            project
        )
    );
    let report = created.body["id"].as_i64().unwrap();

    let logs = ctx.store.recent_activity_for_user(alice.id as i32, 1).await.unwrap();
    assert_eq!(logs[0].details.as_deref(), Some("Generated report: January"));

    let foreign = ctx
        .post(
            "/api/reports",
            &bob,
            json!({ "title": "Spy", "projectId": project, "content": "x" }),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    assert_eq!(ids(&ctx.get("/api/reports", &alice).await.body), vec![report]);
    assert!(ids(&ctx.get("/api/reports", &bob).await.body).is_empty());

    let single = ctx.get(&format!("/api/reports/{}", report), &bob).await;
    assert_eq!(single.status, StatusCode::FORBIDDEN);

    let by_project = ctx
        .get(&format!("/api/projects/{}/reports", project), &alice)
        .await;
    assert_eq!(ids(&by_project.body), vec![report]);
}

#[tokio::test]
async fn test_dashboard_for_user_without_projects() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    ctx.create_client(&alice, "Acme").await;

    let response = ctx.get("/api/dashboard/stats", &alice).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["stats"]["activeProjects"], 0);
    assert_eq!(response.body["taskProgress"]["total"], 0);
    assert_eq!(response.body["recentActivities"], json!([]));
    assert_eq!(response.body["recentClients"], json!([]));
}

#[tokio::test]
async fn test_end_to_end_dashboard() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;

    let c1 = ctx.create_client(&alice, "Acme").await;
    let p1 = ctx.create_project(&alice, c1, "Acme SEO").await;
    let t1 = ctx
        .create_task(&alice, p1, "Publish sitemap", Some(days_from_now(1)), "pending")
        .await;

    let dashboard = ctx.get("/api/dashboard/stats", &alice).await;
    assert_eq!(dashboard.status, StatusCode::OK);
    let body = &dashboard.body;
    assert_eq!(body["stats"]["activeProjects"], 1);
    assert_eq!(body["stats"]["activeClients"], 1);
    assert_eq!(body["stats"]["pendingTasks"], 1);
    assert_eq!(body["taskProgress"]["pending"], 1);
    assert_eq!(body["taskProgress"]["pendingPercentage"], 100);
    assert_eq!(body["projectStats"]["total"], 1);
    assert_eq!(ids(&body["upcomingDeadlines"]), vec![t1]);
    assert_eq!(ids(&body["recentClients"]), vec![c1]);
    assert_eq!(
        body["recentActivities"][0]["details"],
        "Created task: Publish sitemap"
    );

    let foreign = ctx.get(&format!("/api/clients/{}", c1), &bob).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    ctx.delete(&format!("/api/clients/{}", c1), &alice).await;
    let project = ctx.get(&format!("/api/projects/{}", p1), &alice).await;
    assert_eq!(project.status, StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_percentages() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let project = ctx.create_project(&alice, client, "Acme SEO").await;

    ctx.create_task(&alice, project, "Soon", Some(days_from_now(1)), "pending")
        .await;
    ctx.create_task(&alice, project, "Late", Some(days_from_now(-2)), "pending")
        .await;
    ctx.create_task(&alice, project, "Done", None, "completed").await;

    let response = ctx.get("/api/dashboard/stats", &alice).await;
    let progress = &response.body["taskProgress"];

    assert_eq!(progress["total"], 3);
    assert_eq!(progress["completedPercentage"], 33);
    assert_eq!(progress["inProgressPercentage"], 0);
    assert_eq!(progress["pendingPercentage"], 67);
    assert_eq!(progress["overdue"], 1);
    assert_eq!(progress["overduePercentage"], 33);
}

#[tokio::test]
async fn test_recent_activities_are_capped() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let client = ctx.create_client(&alice, "Acme").await;
    ctx.create_project(&alice, client, "Acme SEO").await;
    for name in ["B", "C", "D", "E"] {
        ctx.create_client(&alice, name).await;
    }

    let response = ctx.get("/api/dashboard/stats", &alice).await;

    assert_eq!(response.body["recentActivities"].as_array().unwrap().len(), 5);
    assert_eq!(response.body["recentActivities"][0]["details"], "Created client: E");
    assert_eq!(response.body["recentClients"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_upcoming_deadlines_are_capped() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let client = ctx.create_client(&alice, "Acme").await;
    let project = ctx.create_project(&alice, client, "Acme SEO").await;

    let mut tasks = Vec::new();
    for days in (1..=6).rev() {
        let title = format!("Due in {} days", days);
        tasks.push(
            ctx.create_task(&alice, project, &title, Some(days_from_now(days)), "pending")
                .await,
        );
    }
    tasks.reverse();

    let response = ctx.get("/api/dashboard/stats", &alice).await;

    assert_eq!(response.body["stats"]["pendingTasks"], 6);
    assert_eq!(ids(&response.body["upcomingDeadlines"]), tasks[..5].to_vec());
}
