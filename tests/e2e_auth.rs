//! E2E authentication tests for wicket.
//!
//! Tests login, account creation and password reset over a real TCP
//! connection.

mod common;

use common::TestServer;
use wicket::protocol::Status;

/// Test successful login flow.
#[tokio::test]
async fn test_login_success() {
    let server = TestServer::start().await;
    server.seed_account("testuser", "password123").await;

    let mut client = server.client().await;

    let status = client.login("testuser", "password123").await.unwrap();
    assert_eq!(status, Status::LoggedIn, "Login should succeed");

    server.stop().await;
}

/// Test login with wrong password.
#[tokio::test]
async fn test_login_wrong_password() {
    let server = TestServer::start().await;
    server.seed_account("testuser", "password123").await;

    let mut client = server.client().await;

    let status = client.login("testuser", "wrongpassword").await.unwrap();
    assert_eq!(
        status,
        Status::LogInFailed,
        "Login should fail with wrong password"
    );

    server.stop().await;
}

/// Test login with non-existent user.
#[tokio::test]
async fn test_login_nonexistent_user() {
    let server = TestServer::start().await;

    let mut client = server.client().await;

    let status = client.login("nobody", "password123").await.unwrap();
    assert_eq!(
        status,
        Status::UserNotFound,
        "Login should report the user as missing"
    );

    server.stop().await;
}

/// Test that a failed login leaves the connection usable.
#[tokio::test]
async fn test_failed_login_allows_retry() {
    let server = TestServer::start().await;
    server.seed_account("testuser", "password123").await;

    let mut client = server.client().await;

    let status = client.login("testuser", "wrongpassword").await.unwrap();
    assert_eq!(status, Status::LogInFailed);

    // Same connection, correct password this time
    let status = client.login("testuser", "password123").await.unwrap();
    assert_eq!(status, Status::LoggedIn, "Retry on the same connection");

    server.stop().await;
}

/// Test account creation followed by login with the same credentials.
#[tokio::test]
async fn test_create_then_login() {
    let server = TestServer::start().await;

    let mut client = server.client().await;
    let status = client.create("newuser", "newpassword").await.unwrap();
    assert_eq!(status, Status::UserAdded, "Create should succeed");

    // Log in on a fresh connection
    let mut client = server.client().await;
    let status = client.login("newuser", "newpassword").await.unwrap();
    assert_eq!(
        status,
        Status::LoggedIn,
        "Created account should be able to log in"
    );

    server.stop().await;
}

/// Test that creating a duplicate username is rejected.
#[tokio::test]
async fn test_create_duplicate_username() {
    let server = TestServer::start().await;
    server.seed_account("taken", "original").await;

    let mut client = server.client().await;
    let status = client.create("taken", "other").await.unwrap();
    assert_eq!(
        status,
        Status::UserNameNotAvailable,
        "Duplicate username should be rejected"
    );

    // The original credentials still work
    let mut client = server.client().await;
    let status = client.login("taken", "original").await.unwrap();
    assert_eq!(
        status,
        Status::LoggedIn,
        "Original account should be untouched"
    );

    server.stop().await;
}

/// Test password reset: the old password stops working, the new one works.
#[tokio::test]
async fn test_reset_password() {
    let server = TestServer::start().await;
    server.seed_account("resetme", "oldpassword").await;

    let mut client = server.client().await;
    let status = client.reset("resetme", "newpassword").await.unwrap();
    assert_eq!(status, Status::PasswordReset, "Reset should succeed");

    let mut client = server.client().await;
    let status = client.login("resetme", "oldpassword").await.unwrap();
    assert_eq!(
        status,
        Status::LogInFailed,
        "Old password should no longer work"
    );

    let mut client = server.client().await;
    let status = client.login("resetme", "newpassword").await.unwrap();
    assert_eq!(status, Status::LoggedIn, "New password should work");

    server.stop().await;
}

/// Test password reset for a non-existent user.
#[tokio::test]
async fn test_reset_nonexistent_user() {
    let server = TestServer::start().await;

    let mut client = server.client().await;
    let status = client.reset("nobody", "newpassword").await.unwrap();
    assert_eq!(status, Status::UserNotFound);

    server.stop().await;
}

/// Test that a reset does not log the connection in.
#[tokio::test]
async fn test_reset_leaves_connection_unauthenticated() {
    let server = TestServer::start().await;
    server.seed_account("resetme", "oldpassword").await;

    let mut client = server.client().await;
    client.reset("resetme", "newpassword").await.unwrap();

    assert_eq!(server.registry().count().await, 0);

    // Another unauthenticated request still works on the same connection
    let status = client.login("resetme", "newpassword").await.unwrap();
    assert_eq!(status, Status::LoggedIn);

    server.stop().await;
}

/// Test that several accounts can be created from one connection.
#[tokio::test]
async fn test_multiple_creates_on_one_connection() {
    let server = TestServer::start().await;

    let mut client = server.client().await;
    for name in ["alpha", "beta", "gamma"] {
        let status = client.create(name, "password").await.unwrap();
        assert_eq!(status, Status::UserAdded, "Create {name} should succeed");
    }

    let repo = wicket::db::AccountRepository::new(server.db().pool());
    assert_eq!(repo.count().await.unwrap(), 3);

    server.stop().await;
}
