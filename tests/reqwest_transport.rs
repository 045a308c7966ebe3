use gosub_request::option::body::{body_form, body_json};
use gosub_request::option::header::{authorization_bearer, header};
use gosub_request::option::query::query;
use gosub_request::option::{base_url, client, context};
use gosub_request::{ClientConfig, Context, ContextError, Request, ReqwestTransport, StatusError};
use mockito::Matcher;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: u64,
    name: String,
}

#[derive(Serialize)]
struct NewItem {
    name: &'static str,
}

#[tokio::test]
async fn fetch_json_merges_query_and_sets_accept() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/items/7")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("lang".into(), "en".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .match_header("accept", "application/json")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":7,"name":"lamp"}"#)
        .create_async()
        .await;

    let item: Item = Request::get(format!("{}/items/7?page=1&lang=en", server.url()))
        .with(query("page", "2"))
        .with(authorization_bearer("secret"))
        .fetch_json()
        .await
        .unwrap();

    assert_eq!(
        item,
        Item {
            id: 7,
            name: "lamp".into()
        }
    );
    m.assert_async().await;
}

#[tokio::test]
async fn error_status_carries_response_details() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("DELETE", "/items/9")
        .with_status(404)
        .with_header("x-trace", "abc")
        .with_body("no such item")
        .create_async()
        .await;

    let err = Request::delete(format!("{}/items/9", server.url()))
        .done()
        .await
        .unwrap_err();

    assert!(err.is_status(StatusError::NOT_FOUND));
    let response = err.response().unwrap();
    assert_eq!(response.method(), "DELETE");
    assert_eq!(response.headers().get("x-trace").unwrap(), "abc");
    assert_eq!(response.body().as_ref(), b"no such item");
    assert!(err.to_string().ends_with("404 Not Found: no such item"));
}

#[tokio::test]
async fn error_body_is_truncated() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/big")
        .with_status(500)
        .with_body("x".repeat(10_000))
        .create_async()
        .await;

    let err = Request::get(format!("{}/big", server.url()))
        .with(gosub_request::option::error_body_limit(16))
        .fetch()
        .await
        .unwrap_err();

    assert!(err.is_status(StatusError::INTERNAL_SERVER_ERROR));
    assert_eq!(err.response().unwrap().body().len(), 16);
}

#[tokio::test]
async fn json_body_is_posted() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("POST", "/items")
        .match_header("content-type", "application/json; charset=UTF-8")
        .match_body(Matcher::Json(serde_json::json!({ "name": "chair" })))
        .with_status(201)
        .with_body(r#"{"id":1,"name":"chair"}"#)
        .create_async()
        .await;

    let created: Item = Request::post("/items")
        .with(base_url(server.url()))
        .with(body_json(NewItem { name: "chair" }))
        .fetch_json()
        .await
        .unwrap();

    assert_eq!(created.id, 1);
    m.assert_async().await;
}

#[tokio::test]
async fn form_body_and_custom_transport() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("PUT", "/form")
        .match_header("user-agent", "inventory-test")
        .match_header("x-team", "ops")
        .match_body("a=1&b=two+words")
        .with_status(204)
        .create_async()
        .await;

    let config = ClientConfig {
        user_agent: "inventory-test".into(),
        ..ClientConfig::default()
    };
    let transport = Arc::new(ReqwestTransport::with_config(&config).unwrap());

    Request::put(format!("{}/form", server.url()))
        .with(client(transport))
        .with(header("X-Team", "ops"))
        .with(body_form([("b", "two words"), ("a", "1")]))
        .done()
        .await
        .unwrap();

    m.assert_async().await;
}

#[tokio::test]
async fn canceled_context_stops_before_sending() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/never")
        .expect(0)
        .create_async()
        .await;

    let token = CancellationToken::new();
    token.cancel();

    let err = Request::get(format!("{}/never", server.url()))
        .with(context(Context::background().with_cancel(token)))
        .done()
        .await
        .unwrap_err();

    assert!(err.is_transport());
    let gosub_request::Error::Transport(source) = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(
        source.downcast_ref::<ContextError>(),
        Some(&ContextError::Canceled)
    );
    m.assert_async().await;
}

#[tokio::test]
async fn streamed_body_can_be_read_incrementally() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/stream")
        .with_status(200)
        .with_body("line one\nline two\n")
        .create_async()
        .await;

    let mut body = Request::get(format!("{}/stream", server.url()))
        .open()
        .await
        .unwrap();

    let mut collected = Vec::new();
    while let Some(chunk) = body.chunk().await.unwrap() {
        collected.extend_from_slice(&chunk);
    }
    body.close().await.unwrap();

    assert_eq!(collected, b"line one\nline two\n");
    assert!(body.is_closed());
}

#[tokio::test(flavor = "multi_thread")]
async fn deadline_applies_to_body_reads() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/slow")
        .with_status(200)
        .with_chunked_body(|w| {
            w.write_all(b"first")?;
            w.flush()?;
            std::thread::sleep(Duration::from_secs(2));
            w.write_all(b"second")
        })
        .create_async()
        .await;

    let ctx = Context::background().with_timeout(Duration::from_millis(500));
    let mut body = Request::get(format!("{}/slow", server.url()))
        .with(context(ctx))
        .open()
        .await
        .unwrap();

    let err = loop {
        match body.chunk().await {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("body ended before the deadline"),
            Err(err) => break err,
        }
    };
    let _ = body.close().await;

    let gosub_request::Error::Io(source) = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(
        source.downcast_ref::<ContextError>(),
        Some(&ContextError::DeadlineExceeded)
    );
}
