use reqwest::{Method, StatusCode};

use sqlx::PgPool;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{extract_links, sent_emails, NewSubscriber, TestApp};

async fn mount_email_ok(app: &TestApp) {
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;
}

#[sqlx::test(migrations = "./migrations")]
async fn subscribe_returns_ok_for_valid_form(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    mount_email_ok(&app).await;

    let res = app
        .subscribe(&NewSubscriber::valid())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let body: serde_json::Value = res.json().await.unwrap();
    let subscription = &body["subscription"];

    assert!(body["message"].is_string());
    assert_eq!("test@test.com", subscription["email"]);
    assert_eq!("Kyiv", subscription["city"]);
    assert_eq!("daily", subscription["frequency"]);
    assert_eq!(false, subscription["confirmed"]);
    assert!(subscription.get("confirm_token").is_none());
    assert!(subscription.get("unsubscribe_token").is_none());

    let stored = app.find("test@test.com").await.expect("Subscription not stored");
    assert!(!stored.confirmed);
    assert_ne!(stored.confirm_token, stored.unsubscribe_token);
}

#[sqlx::test(migrations = "./migrations")]
async fn subscribe_accepts_json(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    mount_email_ok(&app).await;

    let new_subscriber = NewSubscriber {
        frequency: Some("hourly".into()),
        ..NewSubscriber::valid()
    };

    let res = app
        .subscribe_json(&new_subscriber)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(1, app.subscription_count().await);
}

#[sqlx::test(migrations = "./migrations")]
async fn subscribe_returns_bad_request_for_invalid_data(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let test_cases = vec![
        (
            "missing email",
            NewSubscriber {
                email: None,
                ..NewSubscriber::valid()
            },
        ),
        (
            "missing city",
            NewSubscriber {
                city: None,
                ..NewSubscriber::valid()
            },
        ),
        (
            "missing frequency",
            NewSubscriber {
                frequency: None,
                ..NewSubscriber::valid()
            },
        ),
        (
            "malformed email",
            NewSubscriber {
                email: Some("bad email address".into()),
                ..NewSubscriber::valid()
            },
        ),
        (
            "non-latin city",
            NewSubscriber {
                city: Some("Київ".into()),
                ..NewSubscriber::valid()
            },
        ),
        (
            "unknown frequency",
            NewSubscriber {
                frequency: Some("weekly".into()),
                ..NewSubscriber::valid()
            },
        ),
    ];

    for (desc, new_subscriber) in test_cases {
        let res = app
            .subscribe(&new_subscriber)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not fail when payload was {}",
            desc
        );

        let body: serde_json::Value = res.json().await.unwrap();
        assert!(body["error"].is_string(), "No error message when payload was {}", desc);
    }

    assert_eq!(0, app.subscription_count().await);
}

#[sqlx::test(migrations = "./migrations")]
async fn subscribe_twice_with_same_email_conflicts(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    mount_email_ok(&app).await;

    let first = app.subscribe(&NewSubscriber::valid()).await.unwrap();
    assert_eq!(StatusCode::OK, first.status());

    let other_city = NewSubscriber {
        city: Some("Lviv".into()),
        ..NewSubscriber::valid()
    };
    let second = app.subscribe(&other_city).await.unwrap();

    assert_eq!(StatusCode::CONFLICT, second.status());
    assert_eq!(1, app.subscription_count().await);
    assert_eq!("Kyiv", app.find("test@test.com").await.unwrap().city);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_subscribes_with_same_email_store_one_row(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    mount_email_ok(&app).await;

    let requests: Vec<_> = (0..20)
        .map(|_| {
            let req = app
                .request(Method::POST, "api/subscribe")
                .form(&NewSubscriber::valid())
                .send();
            tokio::spawn(req)
        })
        .collect();

    let mut statuses = Vec::new();
    for req in requests {
        let res = req
            .await
            .expect("Request task panicked")
            .expect("Failed to execute request");
        statuses.push(res.status());
    }

    let ok = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();

    assert_eq!(1, ok, "statuses: {:?}", statuses);
    assert_eq!(19, conflicts, "statuses: {:?}", statuses);
    assert_eq!(1, app.subscription_count().await);
}

#[sqlx::test(migrations = "./migrations")]
async fn subscribe_sends_a_confirmation_email_with_link(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        // Expect a send-email request
        .expect(1)
        .mount(&app.email_server)
        .await;

    app.subscribe(&NewSubscriber::valid()).await.unwrap();

    let emails = sent_emails(&app.email_server).await;
    let html_links = extract_links(emails[0]["HtmlBody"].as_str().unwrap());
    let text_links = extract_links(emails[0]["TextBody"].as_str().unwrap());

    assert_eq!(1, text_links.len());
    assert_eq!(html_links, text_links);

    let stored = app.find("test@test.com").await.unwrap();
    assert!(text_links[0].ends_with(&format!("/api/confirm/{}", stored.confirm_token)));
}

#[sqlx::test(migrations = "./migrations")]
async fn subscribe_succeeds_if_confirmation_email_fails(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    Mock::given(path("/email"))
        .and(method("POST"))
        // Ensure that send-email fails
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let res = app.subscribe(&NewSubscriber::valid()).await.unwrap();

    assert_eq!(StatusCode::OK, res.status());
    assert!(app.find("test@test.com").await.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn subscription_can_be_confirmed_once(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    mount_email_ok(&app).await;

    app.subscribe(&NewSubscriber::valid()).await.unwrap();

    let emails = sent_emails(&app.email_server).await;
    let link = extract_links(emails[0]["TextBody"].as_str().unwrap()).remove(0);

    let res = app
        .client
        .get(&link)
        .send()
        .await
        .expect("Failed to follow confirmation link");

    assert_eq!(StatusCode::OK, res.status());
    assert!(app.find("test@test.com").await.unwrap().confirmed);

    let again = app.client.get(&link).send().await.unwrap();

    assert_eq!(StatusCode::BAD_REQUEST, again.status());
    let body: serde_json::Value = again.json().await.unwrap();
    assert_eq!("Subscription already confirmed", body["error"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn confirm_rejects_malformed_and_unknown_tokens(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let malformed = app.confirm("not-a-token").await.unwrap();
    assert_eq!(StatusCode::BAD_REQUEST, malformed.status());

    let unknown = app.confirm(&"a".repeat(43)).await.unwrap();
    assert_eq!(StatusCode::NOT_FOUND, unknown.status());
}

#[sqlx::test(migrations = "./migrations")]
async fn unsubscribe_deletes_subscription(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    mount_email_ok(&app).await;

    app.subscribe(&NewSubscriber::valid()).await.unwrap();
    let token = app.find("test@test.com").await.unwrap().unsubscribe_token;

    let res = app.unsubscribe(&token).await.unwrap();

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(0, app.subscription_count().await);

    let again = app.unsubscribe(&token).await.unwrap();
    assert_eq!(StatusCode::NOT_FOUND, again.status());
}

#[sqlx::test(migrations = "./migrations")]
async fn unsubscribe_does_not_accept_confirm_token(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;
    mount_email_ok(&app).await;

    app.subscribe(&NewSubscriber::valid()).await.unwrap();
    let token = app.find("test@test.com").await.unwrap().confirm_token;

    let res = app.unsubscribe(&token).await.unwrap();

    assert_eq!(StatusCode::NOT_FOUND, res.status());
    assert_eq!(1, app.subscription_count().await);
}

#[sqlx::test(migrations = "./migrations")]
async fn unsubscribe_rejects_malformed_token(pool: PgPool) {
    let app = TestApp::spawn(&pool).await;

    let res = app.unsubscribe("short").await.unwrap();

    assert_eq!(StatusCode::BAD_REQUEST, res.status());
}
