use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::Service;

// Helper to create test app backed by the database from the environment
async fn create_test_app() -> axum::Router {
    use modvault_api::{api, config, db, resources};
    use std::sync::Arc;

    let config =
        config::Config::from_env().expect("Failed to load configuration from environment");

    let pool = db::create_pool(&config.database)
        .await
        .expect("Failed to connect to database");

    db::schema::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    seed_fixtures(&pool).await;

    let state = Arc::new(api::handlers::AppStateInner {
        pool,
        registry: resources::ResourceRegistry::new(),
        content: config.content.clone(),
        instance_id: config.server.instance_id.clone(),
    });

    api::routes::create_router(state)
}

// Deterministic fixtures; safe to run repeatedly against the same database
async fn seed_fixtures(pool: &sqlx::PgPool) {
    sqlx::query(
        r#"INSERT INTO "mod" (display_name, author)
           VALUES ('Integration Test Mod', 'it-author')
           ON CONFLICT (display_name) DO NOTHING"#,
    )
    .execute(pool)
    .await
    .expect("Failed to seed mod");

    let (mod_id,): (i32,) =
        sqlx::query_as(r#"SELECT id FROM "mod" WHERE display_name = 'Integration Test Mod'"#)
            .fetch_one(pool)
            .await
            .expect("Failed to read seeded mod");

    for (uid, mod_type, version, filename, icon, ranked) in [
        (
            "it-uid-ui-ranked",
            "UI",
            1_i16,
            "mods/it_test_mod.v0001.zip",
            Some("it_test_mod.png"),
            true,
        ),
        (
            "it-uid-sim-unranked",
            "SIM",
            2_i16,
            "mods/it_test_mod.v0002.zip",
            None,
            false,
        ),
    ] {
        sqlx::query(
            "INSERT INTO mod_version (uid, type, description, version, filename, icon, ranked, hidden, mod_id)
             VALUES ($1, $2, 'fixture', $3, $4, $5, $6, FALSE, $7)
             ON CONFLICT (uid) DO NOTHING",
        )
        .bind(uid)
        .bind(mod_type)
        .bind(version)
        .bind(filename)
        .bind(icon)
        .bind(ranked)
        .bind(mod_id)
        .execute(pool)
        .await
        .expect("Failed to seed mod version");
    }

    for (id, mean, deviation, num_games, won_games, is_active) in [
        (900_001, 1800.0, 80.0, 500, 300, true),
        (900_002, 1500.0, 120.0, 120, 55, false),
    ] {
        sqlx::query(
            "INSERT INTO global_rating (id, mean, deviation, num_games, won_games, is_active)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(mean)
        .bind(deviation)
        .bind(num_games)
        .bind(won_games)
        .bind(is_active)
        .execute(pool)
        .await
        .expect("Failed to seed global rating");
    }
}

// Helper to send request and parse JSON response
async fn send_json_request(app: &mut axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));

    (status, json)
}

// Helper to send JSON request with JSON body
async fn send_json_body_request(
    app: &mut axum::Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let bytes = serde_json::to_vec(&body).unwrap();
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));

    (status, json)
}

async fn find_mod_version_id(app: &mut axum::Router, uid: &str) -> i64 {
    let uri = format!("/data/modVersion?filter=uid=={}", uid);
    let (status, body) = send_json_request(app, "GET", &uri).await;
    assert_eq!(status, StatusCode::OK);

    body["data"]["data"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|v| v["id"].as_i64())
        .expect("expected the seeded mod version to be listed")
}

#[tokio::test]
async fn test_health_endpoint() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_request(&mut app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "modvault-api");
    assert!(body["instance_id"].is_string());
}

#[tokio::test]
async fn test_list_mod_versions_basic() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_request(&mut app, "GET", "/data/modVersion").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["data"].is_array());
    assert!(body["data"]["total"].is_number());
}

#[tokio::test]
async fn test_list_mod_versions_pagination() {
    let mut app = create_test_app().await;
    let (status, body) =
        send_json_request(&mut app, "GET", "/data/modVersion?page=1&page_size=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["page_size"], 1);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_mod_versions_filter_and_sort() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_request(
        &mut app,
        "GET",
        "/data/modVersion?filter=ranked==true&sort=-createTime",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    for version in body["data"]["data"].as_array().unwrap() {
        assert_eq!(version["ranked"], true);
    }
}

#[tokio::test]
async fn test_list_mod_versions_enum_filter() {
    let mut app = create_test_app().await;
    let (status, body) =
        send_json_request(&mut app, "GET", "/data/modVersion?filter=type==SIM").await;

    assert_eq!(status, StatusCode::OK);
    let versions = body["data"]["data"].as_array().unwrap();
    assert!(!versions.is_empty());
    for version in versions {
        assert_eq!(version["type"], "SIM");
    }
}

#[tokio::test]
async fn test_list_mod_versions_invalid_enum_filter() {
    let mut app = create_test_app().await;
    let (status, body) =
        send_json_request(&mut app, "GET", "/data/modVersion?filter=type==ORDINAL_0").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_ENUM_VALUE");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("ORDINAL_0"));
}

#[tokio::test]
async fn test_list_mod_versions_invalid_filter() {
    let mut app = create_test_app().await;
    let (status, body) =
        send_json_request(&mut app, "GET", "/data/modVersion?filter=nonsense").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_FILTER");
}

#[tokio::test]
async fn test_list_mod_versions_invalid_sort() {
    let mut app = create_test_app().await;
    let (status, body) =
        send_json_request(&mut app, "GET", "/data/modVersion?sort=downloadUrl").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_SORT_FIELD");
}

#[tokio::test]
async fn test_list_mod_versions_include_mod() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_request(
        &mut app,
        "GET",
        "/data/modVersion?filter=uid==it-uid-ui-ranked&include=mod",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let included = body["data"]["included"].as_array().unwrap();
    assert_eq!(included.len(), 1);
    assert_eq!(included[0]["displayName"], "Integration Test Mod");
    assert_eq!(included[0]["author"], "it-author");
}

#[tokio::test]
async fn test_list_mod_versions_invalid_include() {
    let mut app = create_test_app().await;
    let (status, body) =
        send_json_request(&mut app, "GET", "/data/modVersion?include=thumbnailUrl").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_get_mod_version_computes_urls() {
    let mut app = create_test_app().await;
    let id = find_mod_version_id(&mut app, "it-uid-ui-ranked").await;

    let uri = format!("/data/modVersion/{}", id);
    let (status, body) = send_json_request(&mut app, "GET", &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["uid"], "it-uid-ui-ranked");
    assert_eq!(body["data"]["type"], "UI");

    let download_url = body["data"]["downloadUrl"].as_str().unwrap();
    assert!(download_url.ends_with("/mods/it_test_mod.v0001.zip"));
    let thumbnail_url = body["data"]["thumbnailUrl"].as_str().unwrap();
    assert!(thumbnail_url.contains("/mods_thumbs/it_test_mod.png"));
}

#[tokio::test]
async fn test_get_mod_version_without_icon_has_null_thumbnail() {
    let mut app = create_test_app().await;
    let id = find_mod_version_id(&mut app, "it-uid-sim-unranked").await;

    let uri = format!("/data/modVersion/{}", id);
    let (status, body) = send_json_request(&mut app, "GET", &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["thumbnailUrl"].is_null());
    assert!(body["data"]["downloadUrl"].is_string());
}

#[tokio::test]
async fn test_get_mod_version_not_found() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_request(&mut app, "GET", "/data/modVersion/2147483646").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "ENTITY_NOT_FOUND");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("2147483646"));
}

#[tokio::test]
async fn test_patch_mod_version_writable_fields() {
    let mut app = create_test_app().await;
    let id = find_mod_version_id(&mut app, "it-uid-sim-unranked").await;

    let uri = format!("/data/modVersion/{}", id);
    let (status, body) = send_json_body_request(
        &mut app,
        "PATCH",
        &uri,
        json!({"description": "moderated description", "hidden": true}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "moderated description");
    assert_eq!(body["data"]["hidden"], true);

    // Restore so the fixture stays usable for other tests
    let (status, _) =
        send_json_body_request(&mut app, "PATCH", &uri, json!({"hidden": false})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_patch_mod_version_rejects_computed_attribute() {
    let mut app = create_test_app().await;
    let id = find_mod_version_id(&mut app, "it-uid-ui-ranked").await;

    let uri = format!("/data/modVersion/{}", id);
    let (status, body) = send_json_body_request(
        &mut app,
        "PATCH",
        &uri,
        json!({"downloadUrl": "https://evil.example.com/payload.zip"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "COMPUTED_ATTRIBUTE_WRITE");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("downloadUrl"));
}

#[tokio::test]
async fn test_patch_mod_version_rejects_unknown_attribute() {
    let mut app = create_test_app().await;
    let id = find_mod_version_id(&mut app, "it-uid-ui-ranked").await;

    let uri = format!("/data/modVersion/{}", id);
    let (status, body) =
        send_json_body_request(&mut app, "PATCH", &uri, json!({"rankedness": true})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNKNOWN_ATTRIBUTE");
}

#[tokio::test]
async fn test_patch_mod_version_rejects_immutable_attribute() {
    let mut app = create_test_app().await;
    let id = find_mod_version_id(&mut app, "it-uid-ui-ranked").await;

    let uri = format!("/data/modVersion/{}", id);
    let (status, body) =
        send_json_body_request(&mut app, "PATCH", &uri, json!({"uid": "tampered"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ATTRIBUTE_NOT_WRITABLE");
}

#[tokio::test]
async fn test_patch_mod_version_not_found() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_body_request(
        &mut app,
        "PATCH",
        "/data/modVersion/2147483646",
        json!({"hidden": true}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ENTITY_NOT_FOUND");
}

#[tokio::test]
async fn test_list_global_ratings_ordered_by_ranking() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_request(&mut app, "GET", "/data/globalRating").await;

    assert_eq!(status, StatusCode::OK);
    let entries = body["data"]["data"].as_array().unwrap();
    assert!(entries.len() >= 2);

    let rankings: Vec<i64> = entries
        .iter()
        .map(|e| e["ranking"].as_i64().unwrap())
        .collect();
    let mut sorted = rankings.clone();
    sorted.sort();
    assert_eq!(rankings, sorted);
}

#[tokio::test]
async fn test_list_global_ratings_filter() {
    let mut app = create_test_app().await;
    let (status, body) =
        send_json_request(&mut app, "GET", "/data/globalRating?filter=isActive==false").await;

    assert_eq!(status, StatusCode::OK);
    for entry in body["data"]["data"].as_array().unwrap() {
        assert_eq!(entry["isActive"], false);
    }
}

#[tokio::test]
async fn test_get_global_rating() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_request(&mut app, "GET", "/data/globalRating/900001").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 900001);
    assert_eq!(body["data"]["mean"], 1800.0);
    // rating = mean - 3 * deviation, computed in the view
    assert_eq!(body["data"]["rating"], 1560.0);
    assert!(body["data"]["ranking"].is_number());
}

#[tokio::test]
async fn test_get_global_rating_not_found() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_request(&mut app, "GET", "/data/globalRating/2147483646").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ENTITY_NOT_FOUND");
}

#[tokio::test]
async fn test_global_rating_create_rejected() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_body_request(
        &mut app,
        "POST",
        "/data/globalRating",
        json!({"id": 1, "mean": 2000.0, "deviation": 50.0}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "RESOURCE_READ_ONLY");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("globalRating"));
}

#[tokio::test]
async fn test_global_rating_patch_rejected() {
    let mut app = create_test_app().await;
    let (status, body) = send_json_body_request(
        &mut app,
        "PATCH",
        "/data/globalRating/900001",
        json!({"mean": 9000.0}),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "RESOURCE_READ_ONLY");
}

#[tokio::test]
async fn test_global_rating_delete_rejected() {
    let mut app = create_test_app().await;
    let (status, body) =
        send_json_request(&mut app, "DELETE", "/data/globalRating/900001").await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "RESOURCE_READ_ONLY");

    // The entry is still there afterwards
    let (status, _) = send_json_request(&mut app, "GET", "/data/globalRating/900001").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let mut app = create_test_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    // Check for Prometheus format metrics
    assert!(text.contains("# HELP"));
    assert!(text.contains("# TYPE"));
}

#[tokio::test]
async fn test_error_response_structure() {
    let mut app = create_test_app().await;
    let (_, body) = send_json_request(&mut app, "GET", "/data/modVersion?filter=nonsense").await;

    // Verify ErrorResponse structure
    assert_eq!(body["success"], false);
    assert!(body["error"].is_object());
    assert!(body["error"]["code"].is_string());
    assert!(body["error"]["error_code"].is_number());
    assert!(body["error"]["title"].is_string());
    assert!(body["error"]["message"].is_string());
    assert!(body["error"]["request_id"].is_string());
}
