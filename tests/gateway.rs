//! Gateway binding served on a real listener.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use m2_connections::connection::{handler_fn, SharedApplication};
use m2_connections::http::{EchoHandler, HttpResponse, Request};
use m2_connections::lifecycle::Shutdown;
use m2_connections::routing::Router;
use m2_connections::{GatewayConnection, Reply};

async fn start(application: SharedApplication) -> (String, Shutdown, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        GatewayConnection::default()
            .serve(listener, application, rx)
            .await
            .unwrap();
    });
    (format!("http://{}", addr), shutdown, handle)
}

#[tokio::test]
async fn echo_round_trip() {
    let app: SharedApplication = Arc::new(Router::new().prefix("/echo", EchoHandler));
    let (base, shutdown, handle) = start(app).await;

    let response = reqwest::Client::new()
        .post(format!("{}/echo/x", base))
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(response.text().await.unwrap(), "hello");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("gateway stops after shutdown")
        .unwrap();
}

#[tokio::test]
async fn handler_status_and_headers_reach_the_client() {
    let app: SharedApplication = Arc::new(Router::new().exact(
        "/teapot",
        handler_fn(|req: Request| async move {
            let query = req.header("QUERY").unwrap_or("").to_string();
            Ok(Some(Reply::Http(
                HttpResponse::new(418, "I'm a teapot", query).with_header("X-Kind", "teapot"),
            )))
        }),
    ));
    let (base, shutdown, _handle) = start(app).await;

    let response = reqwest::get(format!("{}/teapot?brew=1", base)).await.unwrap();

    assert_eq!(response.status(), 418);
    assert_eq!(response.headers()["x-kind"], "teapot");
    assert_eq!(response.text().await.unwrap(), "brew=1");
    shutdown.trigger();
}

#[tokio::test]
async fn unrouted_path_is_404() {
    let app: SharedApplication = Arc::new(Router::new().prefix("/echo", EchoHandler));
    let (base, shutdown, _handle) = start(app).await;

    let response = reqwest::get(format!("{}/elsewhere", base)).await.unwrap();
    assert_eq!(response.status(), 404);
    shutdown.trigger();
}

#[tokio::test]
async fn no_reply_is_500() {
    let app: SharedApplication = Arc::new(
        Router::new().prefix("/", handler_fn(|_req: Request| async { Ok(None) })),
    );
    let (base, shutdown, _handle) = start(app).await;

    let response = reqwest::get(format!("{}/poll", base)).await.unwrap();
    assert_eq!(response.status(), 500);
    shutdown.trigger();
}
