//! Full member lifecycle against the live mock provider.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP with a `ureq::Agent` as the transport. Validates
//! request building, Basic auth, and both success and problem-details
//! decoding end-to-end.

use mailchimp_core::{ApiError, Client, Fields, MemberStatus};
use serde_json::{json, Value};
use url::Url;

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

/// Bind a random port and serve `app` on a background thread.
fn spawn_server(app: axum::Router) -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, app).await
        })
        .unwrap();
    });
    addr
}

#[test]
fn member_lifecycle() {
    // Step 1: start the mock provider.
    let addr = spawn_server(mock_server::app_with_key("the_api_key-us13"));
    let agent = ureq::Agent::new_with_defaults();
    let mut client = Client::new("the_api_key-us13", &agent).unwrap();
    client.set_base_url(Url::parse(&format!("http://{addr}/3.0")).unwrap());

    // Step 2: unknown member is a structured 404.
    let err = client.get_member("list_id", "john@reese.com").unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(
        err.to_string(),
        "Error 404 Resource Not Found (The requested resource could not be found.)."
    );

    // Step 3: subscribe enrolls a new member.
    let member = client
        .subscribe("list_id", "John@Reese.com", &fields(json!({"merge_fields":{"FNAME":"John"}})))
        .unwrap();
    assert_eq!(member.id, "a12bef585f1cae41a46e7edd45ade769");
    assert_eq!(member.status, MemberStatus::Subscribed);
    assert_eq!(member.email_address(), Some("John@Reese.com"));
    assert_eq!(member.field("merge_fields"), Some(&json!({"FNAME":"John"})));

    // Step 4: explicit unsubscribe through update_subscription.
    let member = client
        .update_subscription("list_id", "john@reese.com", &fields(json!({"status":"unsubscribed"})))
        .unwrap();
    assert_eq!(member.status, MemberStatus::Unsubscribed);

    // Step 5: subscribe again leaves the existing status alone.
    let member = client
        .subscribe("list_id", "john@reese.com", &Fields::new())
        .unwrap();
    assert_eq!(member.status, MemberStatus::Unsubscribed);

    // Step 6: update_subscription resubscribes by default.
    let member = client
        .update_subscription("list_id", "john@reese.com", &Fields::new())
        .unwrap();
    assert_eq!(member.status, MemberStatus::Subscribed);

    // Step 7: get reflects the latest state.
    let fetched = client.get_member("list_id", "JOHN@reese.com").unwrap();
    assert_eq!(fetched, member);

    // Step 8: invalid merge fields come back as a provider error.
    let err = client
        .update_subscription("list_id", "john@reese.com", &fields(json!({"merge_fields":"nope"})))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error 400 Invalid Resource (Your merge fields were invalid.)."
    );
}

#[test]
fn wrong_key_is_rejected() {
    let addr = spawn_server(mock_server::app_with_key("the_api_key-us13"));
    let agent = ureq::Agent::new_with_defaults();
    let mut client = Client::new("other_key-us13", &agent).unwrap();
    client.set_base_url(Url::parse(&format!("http://{addr}/3.0/")).unwrap());

    let err = client
        .subscribe("list_id", "john@reese.com", &Fields::new())
        .unwrap_err();
    let details = err.error_response().unwrap();
    assert_eq!(details.status, 401);
    assert_eq!(details.title, "API Key Invalid");
}

#[test]
fn unreachable_host_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let agent = ureq::Agent::new_with_defaults();
    let mut client = Client::new("the_api_key-us13", &agent).unwrap();
    client.set_base_url(Url::parse(&format!("http://{addr}/3.0/")).unwrap());

    let err = client.get_member("list_id", "john@reese.com").unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}
