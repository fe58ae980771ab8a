use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use httpmock::{Method::GET, MockServer};
use huntress_mcp::http::ApiClient;
use huntress_mcp::rate::RateGate;
use huntress_mcp::{web, Config, Credentials, Dispatcher};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const SESSION_HEADER: &str = "mcp-session-id";

fn app(api_url: &str, env_creds: Option<Credentials>) -> axum::Router {
    let cfg = Config {
        api_url: api_url.to_string(),
        ..Config::default()
    };
    let d = Dispatcher::with_parts(
        ApiClient::new(&cfg).unwrap(),
        RateGate::default(),
        Arc::new(move || env_creds.clone()),
    );
    web::router(Arc::new(d), CancellationToken::new())
}

fn post_mcp(uri: &str, body: &Value, session: Option<&str>) -> Request<Body> {
    let mut req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream");
    if let Some(id) = session {
        req = req.header(SESSION_HEADER, id);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

fn initialize() -> Value {
    json!({
        "jsonrpc": "2.0", "id": 1, "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "0"}
        }
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// JSON-RPC messages carried in an event-stream (or plain JSON) body.
async fn messages(response: axum::response::Response) -> Vec<Value> {
    let body = tokio::time::timeout(Duration::from_secs(5), response.into_body().collect())
        .await
        .expect("reply stream should end")
        .unwrap()
        .to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    if let Ok(v) = serde_json::from_str::<Value>(&text) {
        return vec![v];
    }
    text.lines()
        .filter_map(|l| l.strip_prefix("data:"))
        .filter_map(|d| serde_json::from_str(d.trim()).ok())
        .collect()
}

#[tokio::test]
async fn health_reports_credentials() {
    let res = app("http://127.0.0.1:9", None)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!res.headers().contains_key(SESSION_HEADER));
    let v = json_body(res).await;
    assert_eq!(v["status"], "ok");
    assert_eq!(v["hasCredentials"], false);
    assert!(v["timestamp"].is_string());

    let res = app("http://127.0.0.1:9", None)
        .oneshot(
            Request::builder()
                .uri("/health?api_key=k&api_secret=s")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(res).await["hasCredentials"], true);
}

#[tokio::test]
async fn discovery_lists_tools_without_credentials() {
    let res = app("http://127.0.0.1:9", None)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let v = json_body(res).await;
    assert_eq!(v["serverInfo"]["name"], "huntress-mcp");
    assert_eq!(v["tools"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let res = app("http://127.0.0.1:9", None)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/mcp")
                .header("origin", "https://client.example")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn initialize_opens_a_session() {
    let res = app("http://127.0.0.1:9", None)
        .oneshot(post_mcp("/mcp", &initialize(), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let session = res.headers().get(SESSION_HEADER).expect("session id");
    assert!(!session.to_str().unwrap().is_empty());
    let replies = messages(res).await;
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[0]["result"]["serverInfo"]["name"], "huntress-mcp");
}

#[tokio::test]
async fn unknown_session_is_rejected() {
    let res = app("http://127.0.0.1:9", None)
        .oneshot(post_mcp(
            "/mcp",
            &json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            Some("not-a-session"),
        ))
        .await
        .unwrap();
    assert!(res.status().is_client_error());
}

#[tokio::test]
async fn query_credentials_reach_upstream_within_a_session() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/incidents")
                .query_param("status", "active")
                .header("authorization", "Basic azpz");
            then.status(200).json_body(json!({"incident_reports": []}));
        })
        .await;
    let app = app(&server.base_url(), None);

    let res = app
        .clone()
        .oneshot(post_mcp("/mcp", &initialize(), None))
        .await
        .unwrap();
    let session = res.headers()[SESSION_HEADER].to_str().unwrap().to_string();
    messages(res).await;

    let res = app
        .clone()
        .oneshot(post_mcp(
            "/mcp",
            &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            Some(&session),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let call = json!({
        "jsonrpc": "2.0", "id": 5, "method": "tools/call",
        "params": {"name": "list_incidents", "arguments": {"status": "active"}}
    });
    let res = app
        .oneshot(post_mcp("/mcp?apiKey=k&apiSecret=s", &call, Some(&session)))
        .await
        .unwrap();
    let replies = messages(res).await;
    m.assert_async().await;
    let reply = replies.iter().find(|r| r["id"] == 5).expect("tools/call reply");
    assert!(reply["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("incident_reports"));
}
