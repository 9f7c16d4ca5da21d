use serde_json::{json, Value};

use crate::helpers::{course, email_body, TestApp};

#[tokio::test]
async fn unsubscribe_removes_the_subscription_and_sends_an_email() {
    // Arrange
    let app = TestApp::spawn().await;
    app.accept_emails().await;
    app.subscribe("a@x.com", course("10001", "Algorithms", "OPEN"))
        .await;
    app.subscribe("a@x.com", course("10002", "Compilers", "OPEN"))
        .await;

    // Act
    let response = app
        .post_unsubscribe(&json!({
            "email": "a@x.com",
            "course": course("10001", "Algorithms", "OPEN"),
        }))
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let returned: Value = response.json().await.unwrap();
    assert_eq!(returned["CRN"], "10001");
    let crns: Value = app
        .get_subscribed_crns("a@x.com")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(crns, json!(["10002"]));
    let emails = app.received_emails(3).await;
    assert_eq!(
        email_body(&emails[2])["Subject"],
        "CRN:10001 Title:\"Algorithms\" is now unsubscribed!"
    );
}

#[tokio::test]
async fn unsubscribe_for_an_unknown_user_returns_200_and_sends_an_email() {
    // Arrange
    let app = TestApp::spawn().await;
    app.accept_emails().await;

    // Act
    let response = app
        .post_unsubscribe(&json!({
            "email": "nobody@x.com",
            "course": course("10001", "Algorithms", "OPEN"),
        }))
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let returned: Value = response.json().await.unwrap();
    assert_eq!(returned, course("10001", "Algorithms", "OPEN"));
    let emails = app.received_emails(1).await;
    let body = email_body(&emails[0]);
    assert_eq!(body["To"], "nobody@x.com");
    assert_eq!(
        body["Subject"],
        "CRN:10001 Title:\"Algorithms\" is now unsubscribed!"
    );
    // No user record is created
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn unsubscribe_from_a_crn_not_in_the_list_returns_200_and_keeps_the_list() {
    // Arrange
    let app = TestApp::spawn().await;
    app.accept_emails().await;
    app.subscribe("a@x.com", course("10001", "Algorithms", "OPEN"))
        .await;

    // Act
    let response = app
        .post_unsubscribe(&json!({
            "email": "a@x.com",
            "course": course("10002", "Compilers", "OPEN"),
        }))
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let crns: Value = app
        .get_subscribed_crns("a@x.com")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(crns, json!(["10001"]));
    let emails = app.received_emails(2).await;
    assert_eq!(
        email_body(&emails[1])["Subject"],
        "CRN:10002 Title:\"Compilers\" is now unsubscribed!"
    );
}

#[tokio::test]
async fn unsubscribing_twice_leaves_the_list_unchanged() {
    // Arrange
    let app = TestApp::spawn().await;
    app.accept_emails().await;
    app.subscribe("a@x.com", course("10001", "Algorithms", "OPEN"))
        .await;
    app.subscribe("a@x.com", course("10002", "Compilers", "OPEN"))
        .await;
    let body = json!({
        "email": "a@x.com",
        "course": course("10001", "Algorithms", "OPEN"),
    });

    // Act
    let first = app.post_unsubscribe(&body).await;
    let second = app.post_unsubscribe(&body).await;

    // Assert
    assert_eq!(200, first.status().as_u16());
    assert_eq!(200, second.status().as_u16());
    let crns: Value = app
        .get_subscribed_crns("a@x.com")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(crns, json!(["10002"]));
    // Two subscribe emails, then one unsubscribe email per call
    let emails = app.received_emails(4).await;
    assert_eq!(emails.len(), 4);
}

#[tokio::test]
async fn unsubscribe_all_removes_every_subscription() {
    // Arrange
    let app = TestApp::spawn().await;
    app.accept_emails().await;
    app.subscribe("a@x.com", course("10001", "Algorithms", "OPEN"))
        .await;
    app.subscribe("a@x.com", course("10002", "Compilers", "OPEN"))
        .await;

    // Act
    let response = app.post_unsubscribe_all("a@x.com").await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "removed": 2 }));
    let subscriptions: Value = app
        .get_subscriptions("a@x.com")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(subscriptions, json!([]));
    // The user record itself is kept
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn unsubscribe_all_on_an_empty_list_removes_nothing() {
    // Arrange
    let app = TestApp::spawn().await;
    app.accept_emails().await;
    app.subscribe("a@x.com", course("10001", "Algorithms", "OPEN"))
        .await;
    app.post_unsubscribe_all("a@x.com").await;

    // Act
    let response = app.post_unsubscribe_all("a@x.com").await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "removed": 0 }));
}

#[tokio::test]
async fn unsubscribe_all_for_an_unknown_user_removes_nothing() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.post_unsubscribe_all("nobody@x.com").await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "removed": 0 }));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn unsubscribe_all_returns_400_for_an_invalid_email() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.post_unsubscribe_all("not-an-email").await;

    // Assert
    assert_eq!(400, response.status().as_u16());
}
