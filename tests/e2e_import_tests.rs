//! End-to-end tests for show imports
//!
//! Imports shows from the fake forum and checks the data directory through
//! the read and listing endpoints.

mod common;

use common::{
    TestClient, TestServer, AVAILABLE_TOPIC_ID, BROKEN_SHOW_ID, MISSING_TOPIC_ID, SHOW_ID,
    SHOW_TITLE, TITLE_1X01, UNCENSORED_TITLE_2X01, UNKNOWN_SHOW_ID,
};
use reqwest::StatusCode;
use serde_json::Value;

// =============================================================================
// Successful imports
// =============================================================================

#[tokio::test]
async fn test_import_show_returns_summary() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.add_show(SHOW_ID).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["summary"]["show"], SHOW_ID);
    assert_eq!(body["summary"]["title"], SHOW_TITLE);
    assert_eq!(body["summary"]["display_name"], SHOW_TITLE);
    assert_eq!(body["summary"]["episodes"], 4);
    assert_eq!(body["summary"]["seasons"], 3);
    assert_eq!(body["summary"]["fetch_failures"].as_array().unwrap().len(), 0);
    assert_eq!(body["summary"]["analysis_failures"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_import_uses_given_display_name() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.add_show_named(SHOW_ID, "Friends (US)").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["summary"]["display_name"], "Friends (US)");
    // The stored title always comes from the forum
    assert_eq!(body["summary"]["title"], SHOW_TITLE);

    let record = client.read(&format!("{}/meta/import.json", SHOW_ID)).await;
    assert_eq!(record.status(), StatusCode::OK);
    let record: String = record.json().await.unwrap();
    let record: Value = serde_json::from_str(&record).unwrap();
    assert_eq!(record["display_name"], "Friends (US)");
    assert_eq!(record["episodes"], 4);
}

#[tokio::test]
async fn test_import_writes_title_and_show_map() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    client.import(SHOW_ID).await;

    let titles: Value = client.show_titles().await.json().await.unwrap();
    assert_eq!(titles[SHOW_ID], SHOW_TITLE);

    let maps: Value = client.show_map().await.json().await.unwrap();
    let map = &maps[SHOW_ID];
    assert_eq!(map["01"]["01"], TITLE_1X01);
    assert_eq!(map["01"].as_object().unwrap().len(), 2);
    assert_eq!(map["02"]["01"], UNCENSORED_TITLE_2X01);
    assert_eq!(map["other"]["Gag Reel"], "Gag Reel");
}

#[tokio::test]
async fn test_import_keeps_raw_pages() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    client.import(SHOW_ID).await;

    let response = client.read(&format!("{}/raw/101.html", SHOW_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html: String = response.json().await.unwrap();
    assert!(html.contains(TITLE_1X01));

    assert!(server.data_dir.join(SHOW_ID).join("raw").join("104.html").is_file());
}

#[tokio::test]
async fn test_import_restores_censored_words() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    client.import(SHOW_ID).await;

    let response = client.read(&format!("{}/formatted/02/01.txt", SHOW_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let transcript: String = response.json().await.unwrap();
    assert_eq!(
        transcript,
        format!("{}\nRachel: This is shit coffee.", UNCENSORED_TITLE_2X01)
    );

    let frequency: Value = client
        .frequency(SHOW_ID, Some("02"), Some("01"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(frequency["shit_NOUN"], 1);
}

// =============================================================================
// Announcement exclusion
// =============================================================================

#[tokio::test]
async fn test_announcement_is_not_imported() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    client.import(SHOW_ID).await;

    let maps: Value = client.show_map().await.json().await.unwrap();
    let other = maps[SHOW_ID]["other"].as_object().unwrap();
    assert_eq!(other.len(), 1);
    assert!(other.get("Forum rules").is_none());
    assert!(!server.data_dir.join(SHOW_ID).join("raw").join("32146.html").exists());
}

#[tokio::test]
async fn test_announcement_is_imported_when_not_excluded() {
    let server = TestServer::spawn_with_excluded_topics(Some(Vec::new())).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.add_show(SHOW_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    // Linked from both listing pages, fetched once
    assert_eq!(body["summary"]["episodes"], 5);

    let maps: Value = client.show_map().await.json().await.unwrap();
    assert_eq!(maps[SHOW_ID]["other"]["Forum rules"], "Forum rules");
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_reimport_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    client.import(SHOW_ID).await;

    let response = client.add_show(SHOW_ID).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    // The first import is untouched
    let frequency: Value = client.frequency(SHOW_ID, None, None).await.json().await.unwrap();
    assert_eq!(frequency["coffee_NOUN"], 5);
}

#[tokio::test]
async fn test_unknown_forum_is_bad_gateway() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.add_show(UNKNOWN_SHOW_ID).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = client.frequency(UNKNOWN_SHOW_ID, None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_topic_reports_incomplete_import() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.add_show(BROKEN_SHOW_ID).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: Value = response.json().await.unwrap();
    let failures = body["fetch_failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["item"], MISSING_TOPIC_ID);
    assert!(failures[0]["reason"].as_str().unwrap().contains("404"));

    // What could be fetched is still analyzed and served
    let frequency: Value = client
        .frequency(BROKEN_SHOW_ID, None, None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(frequency["coffee_NOUN"], 1);
    assert!(server
        .data_dir
        .join(BROKEN_SHOW_ID)
        .join("raw")
        .join(format!("{}.html", AVAILABLE_TOPIC_ID))
        .is_file());
}

#[tokio::test]
async fn test_add_show_without_show_is_bad_request() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.add_show("").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.add_show("../etc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
