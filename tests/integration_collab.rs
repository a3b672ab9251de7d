// gitduo: Hybrid Git Workflow Engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the GitHub collaboration provider using wiremock.

use gitduo::collab::{CollabProvider, GitHubProvider, NewPullRequest, ReviewEvent};
use gitduo::error::NetworkError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pr_json(number: u64, title: &str) -> serde_json::Value {
    json!({
        "number": number,
        "title": title,
        "state": "open",
        "html_url": format!("https://github.com/acme/widgets/pull/{number}"),
        "head": { "ref": "feature", "sha": "0123456789abcdef0123456789abcdef01234567" },
        "base": { "ref": "main", "sha": "89abcdef0123456789abcdef0123456789abcdef" },
        "user": { "login": "octocat" },
        "draft": false
    })
}

async fn provider(server: &MockServer) -> GitHubProvider {
    GitHubProvider::new(&server.uri(), "acme", "widgets", Some("secret".to_string()))
        .expect("provider should build")
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_get_pr_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls/12"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pr_json(12, "Fix crash")))
        .expect(1)
        .mount(&server)
        .await;

    let pr = provider(&server).await.get_pr(12).await.unwrap();
    assert_eq!(pr.number, 12);
    assert_eq!(pr.title, "Fix crash");
    assert_eq!(pr.head.ref_name, "feature");
    assert_eq!(pr.user.unwrap().login, "octocat");
}

#[tokio::test]
async fn test_list_prs_passes_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .and(query_param("state", "closed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([pr_json(1, "one"), pr_json(2, "two")])),
        )
        .mount(&server)
        .await;

    let prs = provider(&server).await.list_prs("closed").await.unwrap();
    let numbers: Vec<u64> = prs.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2]);
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_create_pr_posts_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/pulls"))
        .and(body_json(json!({
            "title": "Add widgets",
            "head": "feature",
            "base": "main",
            "body": "Adds widgets.",
            "draft": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(pr_json(34, "Add widgets")))
        .expect(1)
        .mount(&server)
        .await;

    let new = NewPullRequest {
        title: "Add widgets".to_string(),
        head: "feature".to_string(),
        base: "main".to_string(),
        body: "Adds widgets.".to_string(),
        draft: true,
    };
    let pr = provider(&server).await.create_pr(&new).await.unwrap();
    assert_eq!(pr.number, 34);
}

#[tokio::test]
async fn test_review_pr_posts_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/widgets/pulls/5/reviews"))
        .and(body_json(json!({ "event": "APPROVE", "body": "LGTM" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 99,
            "state": "APPROVED",
            "html_url": "https://github.com/acme/widgets/pull/5#pullrequestreview-99"
        })))
        .mount(&server)
        .await;

    let review = provider(&server)
        .await
        .review_pr(5, ReviewEvent::Approve, "LGTM")
        .await
        .unwrap();
    assert_eq!(review.id, 99);
    assert_eq!(review.state, "APPROVED");
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_http_error_status_is_reported() {
    for status in [404_u16, 500] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/1"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;

        let err = provider(&server).await.get_pr(1).await.unwrap_err();
        match err {
            NetworkError::HttpError { status: actual, url } => {
                assert_eq!(actual, status);
                assert!(url.contains("nope"), "{url}");
            }
            other => panic!("expected HttpError for {status}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"number\": \"x\"}"))
        .mount(&server)
        .await;

    let err = provider(&server).await.get_pr(3).await.unwrap_err();
    assert!(matches!(err, NetworkError::InvalidResponse { .. }), "{err:?}");
}
