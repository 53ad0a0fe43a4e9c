//! tests/api/update_users.rs

use crate::helpers::{limits, spawn_app, spawn_app_with_limits};
use chrono::{TimeDelta, Utc};
use profile_sync::domain::RequestKind;
use profile_sync::ledger::RequestLedger;
use profile_sync::routes::UpdateUsersResponse;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_third_party_api(app: &crate::helpers::TestApp, status: u16) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({})))
        .mount(&app.third_party_server)
        .await;
}

#[tokio::test]
async fn update_users_sends_batches_then_individual_updates() {
    // Arrange
    let test_app = spawn_app().await;
    test_app.add_pending_users(3);

    Mock::given(path("/update"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.third_party_server)
        .await;
    Mock::given(path("/update-individual"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&test_app.third_party_server)
        .await;

    // Act
    let response = test_app.post_update_users().await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: UpdateUsersResponse = response.json().await.unwrap();
    assert_eq!(body.message, "User updates sent successfully.");
    assert_eq!(body.report.batches_sent, 1);
    assert_eq!(body.report.individuals_sent, 3);

    // batches go out before any individual update
    let requests = test_app.third_party_server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.path(), "/update");
    assert!(requests[1..]
        .iter()
        .all(|r| r.url.path() == "/update-individual"));

    assert_eq!(test_app.ledger.count(RequestKind::Batch), 3);
    assert_eq!(test_app.ledger.count(RequestKind::Individual), 3);
}

#[tokio::test]
async fn batch_request_carries_all_subscribers_in_order() {
    // Arrange
    let test_app = spawn_app().await;
    test_app.add_pending_users(2);
    mount_third_party_api(&test_app, 200).await;

    // Act
    test_app.post_update_users().await;

    // Assert
    let batch_requests = test_app.received_requests_on("/update").await;
    assert_eq!(batch_requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&batch_requests[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "batches": [{
                "subscribers": [
                    {"email": "user0@example.com", "time_zone": "CET", "name": "First0 Last0"},
                    {"email": "user1@example.com", "time_zone": "CET", "name": "First1 Last1"}
                ]
            }]
        })
    );
}

#[tokio::test]
async fn pending_users_are_split_into_batches_of_max_batch_size() {
    // Arrange
    let test_app = spawn_app_with_limits(limits(2, 50, 3600)).await;
    test_app.add_pending_users(5);
    mount_third_party_api(&test_app, 200).await;

    // Act
    let response = test_app.post_update_users().await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let sizes: Vec<usize> = test_app
        .received_requests_on("/update")
        .await
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["batches"][0]["subscribers"].as_array().unwrap().len()
        })
        .collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[tokio::test]
async fn update_users_without_pending_users_sends_nothing() {
    // Arrange
    let test_app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        // We assert that no request is fired at the third-party API!
        .expect(0)
        .mount(&test_app.third_party_server)
        .await;

    // Act
    let response = test_app.post_update_users().await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    assert!(test_app.ledger.entries().is_empty());
}

#[tokio::test]
async fn update_users_returns_429_if_batch_quota_is_used_up() {
    // Arrange
    let test_app = spawn_app().await;
    test_app.add_pending_users(3);
    test_app
        .ledger
        .append_many(RequestKind::Batch, Utc::now() - TimeDelta::minutes(5), 50)
        .await
        .unwrap();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.third_party_server)
        .await;

    // Act
    let response = test_app.post_update_users().await;

    // Assert
    assert_eq!(429, response.status().as_u16());
    let body: UpdateUsersResponse = response.json().await.unwrap();
    assert_eq!(body.message, "Rate limit exceeded for batch requests.");
    assert_eq!(test_app.ledger.entries().len(), 50);
}

#[tokio::test]
async fn update_users_returns_429_if_individual_quota_is_used_up() {
    // Arrange
    let test_app = spawn_app_with_limits(limits(1000, 50, 2)).await;
    test_app.add_pending_users(3);
    mount_third_party_api(&test_app, 200).await;

    // Act
    let response = test_app.post_update_users().await;

    // Assert
    assert_eq!(429, response.status().as_u16());
    let body: UpdateUsersResponse = response.json().await.unwrap();
    assert_eq!(body.message, "Rate limit exceeded for individual requests.");
    assert_eq!(body.report.batches_sent, 1);
    assert_eq!(body.report.individuals_sent, 2);
    // already sent updates are not rolled back
    assert_eq!(test_app.received_requests_on("/update").await.len(), 1);
    assert_eq!(
        test_app.received_requests_on("/update-individual").await.len(),
        2
    );
    assert_eq!(test_app.ledger.count(RequestKind::Individual), 2);
}

#[tokio::test]
async fn third_party_failures_do_not_abort_the_run() {
    // Arrange
    let test_app = spawn_app_with_limits(limits(1, 50, 3600)).await;
    test_app.add_pending_users(2);
    mount_third_party_api(&test_app, 500).await;

    // Act
    let response = test_app.post_update_users().await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: UpdateUsersResponse = response.json().await.unwrap();
    assert_eq!(body.report.failed_sends, 4);
    // failed sends still count against the quota
    assert_eq!(test_app.ledger.count(RequestKind::Batch), 2);
    assert_eq!(test_app.ledger.count(RequestKind::Individual), 2);
}

#[tokio::test]
async fn second_trigger_within_the_hour_sees_the_first_runs_entries() {
    // Arrange
    let test_app = spawn_app_with_limits(limits(1000, 4, 3600)).await;
    test_app.add_pending_users(3);
    mount_third_party_api(&test_app, 200).await;

    // Act - Part 1 - first run uses 3 of 4 batch entries
    let response = test_app.post_update_users().await;
    assert_eq!(200, response.status().as_u16());

    // Act - Part 2 - 3 < 4, so the whole batch of 3 is admitted again
    let response = test_app.post_update_users().await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    assert_eq!(test_app.ledger.count(RequestKind::Batch), 6);

    // Act - Part 3 - third run is refused right away
    let response = test_app.post_update_users().await;
    assert_eq!(429, response.status().as_u16());
    assert_eq!(test_app.ledger.count(RequestKind::Batch), 6);
}
