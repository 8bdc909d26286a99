//! End-to-end forwarding tests against a live gate and a mock hub.

use std::time::Duration;

use reqwest::StatusCode;

mod common;

use common::{client, start_gate, start_programmable_backend, unused_addr, MockReply};

#[tokio::test]
async fn test_get_issues_redirect_signal_without_backend_contact() {
    let (backend, recorder) =
        start_programmable_backend(|_| async { MockReply::new(200, "unexpected") }).await;
    let gate = start_gate(backend).await;
    let cookie = gate.login("alice").await;

    let res = client()
        .get(gate.url("/user/alice/files/a%20b.ipynb?download=1"))
        .header("Cookie", cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-accel-redirect"], "/entrance/");
    assert_eq!(
        res.headers()["x-reproxy-url"],
        format!("http://{backend}/user/alice/files/a%20b.ipynb?download=1").as_str()
    );
    assert_eq!(res.headers()["x-remote-user"], "alice");
    assert!(res.headers().contains_key("x-request-id"));
    assert!(res.bytes().await.unwrap().is_empty());
    assert!(recorder.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_post_is_replayed_and_relayed() {
    let (backend, recorder) = start_programmable_backend(|_| async {
        MockReply::new(201, "spawned")
            .with_header("X-Custom", "kept")
            .with_header("Keep-Alive", "timeout=5")
    })
    .await;
    let gate = start_gate(backend).await;
    let cookie = gate.login("alice").await;

    let res = client()
        .post(gate.url("/hub/spawn/alice?next=%2Fuser%2Falice"))
        .header("Cookie", cookie.as_str())
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("User-Agent", "integration")
        .header("Authorization", "Bearer secret")
        .header("REMOTE_USER", "mallory")
        .body("profile=gpu&note=a+b")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["x-custom"], "kept");
    assert!(res.headers().get("keep-alive").is_none());
    assert_eq!(res.text().await.unwrap(), "spawned");

    let requests = recorder.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let seen = &requests[0];
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.target, "/hub/spawn/alice?next=%2Fuser%2Falice");
    assert_eq!(seen.header("remote_user"), Some("alice"));
    assert_eq!(seen.header_count("remote_user"), 1);
    assert_eq!(seen.header("x-real-ip"), Some("127.0.0.1"));
    assert_eq!(seen.header("x-forwarded-for"), Some("127.0.0.1"));
    assert_eq!(seen.header("x-forwarded-proto"), Some("http"));
    assert_eq!(seen.header("user-agent"), Some("integration"));
    assert_eq!(seen.header("cookie"), Some(cookie.as_str()));
    assert_eq!(seen.header("authorization"), None);
    assert_eq!(seen.body, b"profile=gpu&note=a+b");
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let (backend, recorder) =
        start_programmable_backend(|_| async { MockReply::new(200, "unexpected") }).await;
    let gate = start_gate(backend).await;
    let cookie = gate.login("alice").await;

    for method in [reqwest::Method::PUT, reqwest::Method::DELETE, reqwest::Method::PATCH] {
        let res = client()
            .request(method, gate.url("/hub/api/users/alice"))
            .header("Cookie", cookie.as_str())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(res.bytes().await.unwrap().is_empty());
    }
    assert!(recorder.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_without_session_redirects_to_login() {
    let (backend, recorder) =
        start_programmable_backend(|_| async { MockReply::new(200, "unexpected") }).await;
    let gate = start_gate(backend).await;

    let res = client()
        .post(gate.url("/hub/spawn"))
        .header("Cookie", "PHPSESSID=forged")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/login");
    assert!(recorder.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    let gate = start_gate(unused_addr().await).await;
    let cookie = gate.login("alice").await;

    let res = client()
        .post(gate.url("/hub/login"))
        .header("Cookie", cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_slow_backend_is_gateway_timeout_and_not_retried() {
    let (backend, recorder) = start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        MockReply::new(200, "late")
    })
    .await;
    let gate = start_gate(backend).await;
    let cookie = gate.login("alice").await;

    let res = client()
        .post(gate.url("/hub/spawn"))
        .header("Cookie", cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(recorder.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_backend_redirect_is_relayed_not_followed() {
    let (backend, recorder) = start_programmable_backend(|_| async {
        MockReply::new(302, "").with_header("Location", "/hub/home")
    })
    .await;
    let gate = start_gate(backend).await;
    let cookie = gate.login("alice").await;

    let res = client()
        .post(gate.url("/hub/login"))
        .header("Cookie", cookie)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/hub/home");
    assert_eq!(recorder.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (backend, _) = start_programmable_backend(|_| async { MockReply::new(200, "") }).await;
    let gate = start_gate(backend).await;
    let cookie = gate.login("alice").await;

    let res = client()
        .get(gate.url("/logout"))
        .header("Cookie", cookie.as_str())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);

    let res = client()
        .get(gate.url("/hub/home"))
        .header("Cookie", cookie.as_str())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/login");
}
