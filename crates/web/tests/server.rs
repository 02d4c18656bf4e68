use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cgi_http::access_log::{AccessLog, AccessLogEntry};
use cgi_http::connection::{SessionConfig, StatusPolicy};
use cgi_web::router::{Router, get};
use cgi_web::{Server, handler_fn};
use indoc::indoc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone, Default)]
struct CollectingLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CollectingLog {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl AccessLog for CollectingLog {
    fn record(&self, entry: &AccessLogEntry) {
        self.lines.lock().unwrap().push(entry.to_string());
    }
}

async fn hello() -> &'static str {
    "<h1>hello</h1>"
}

async fn answer() -> u64 {
    42
}

async fn spawn_server(policy: StatusPolicy, access_log: CollectingLog) -> SocketAddr {
    let router = Router::builder()
        .route("/hello", get(handler_fn(hello)))
        .route("/answer", get(handler_fn(answer)))
        .build()
        .unwrap();

    let config = SessionConfig::builder().read_timeout(Duration::from_secs(5)).status_policy(policy).build();

    let server = Server::builder()
        .router(router)
        .bind("127.0.0.1:0")
        .fallback_path(concat!(env!("CARGO_MANIFEST_DIR"), "/static/404.html"))
        .session_config(config)
        .access_log(access_log)
        .build()
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));
    addr
}

async fn exchange(addr: SocketAddr, parts: &[&str]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    for part in parts {
        stream.write_all(part.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

async fn wait_for_lines(log: &CollectingLog, count: usize) -> Vec<String> {
    for _ in 0..100 {
        let lines = log.lines();
        if lines.len() >= count {
            return lines;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    log.lines()
}

#[tokio::test]
async fn test_hello_over_tcp() {
    let log = CollectingLog::default();
    let addr = spawn_server(StatusPolicy::default(), log.clone()).await;

    let request = indoc! {r##"
        GET /hello?name=world HTTP/1.1
        Host: 127.0.0.1
        User-Agent: integration-test
        X-Request-Id: abc-123

        "##};
    let (head, tail) = request.split_at(10);
    let response = exchange(addr, &[head, tail]).await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    let lower = response.to_ascii_lowercase();
    assert!(lower.contains("content-type: text/html; charset=utf-8\r\n"));
    assert!(lower.contains("content-length: 14\r\n"));
    assert!(lower.contains("connection: close\r\n"));
    assert!(lower.contains("x-request-id: abc-123\r\n"));
    assert!(lower.contains("date: "));
    assert!(response.ends_with("\r\n\r\n<h1>hello</h1>"));

    let lines = wait_for_lines(&log, 1).await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("\"GET /hello?name=world HTTP/1.1\" 200  \"integration-test\""), "{}", lines[0]);
}

#[tokio::test]
async fn test_fallback_page_over_tcp() {
    let log = CollectingLog::default();
    let addr = spawn_server(StatusPolicy::default(), log.clone()).await;

    let response = exchange(addr, &["GET /missing HTTP/1.0\r\n\r\n"]).await;

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "{response}");
    assert!(response.contains("404 NO FOUND"));

    let lines = wait_for_lines(&log, 1).await;
    assert!(lines[0].contains("\"GET /missing HTTP/1.0\" 200  \"\""), "{}", lines[0]);
}

#[tokio::test]
async fn test_strict_policy_over_tcp() {
    let log = CollectingLog::default();
    let addr = spawn_server(StatusPolicy::strict(), log.clone()).await;

    let response = exchange(addr, &["GET /missing HTTP/1.1\r\nHost: x\r\n\r\n"]).await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"), "{response}");

    let response = exchange(addr, &["GET /answer HTTP/1.1\r\nHost: x\r\n\r\n"]).await;
    assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"), "{response}");
    assert!(response.contains("currently does not support u64 as the return value of the handler"));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let log = CollectingLog::default();
    let addr = spawn_server(StatusPolicy::default(), log.clone()).await;

    let garbage = exchange(addr, &["NOT HTTP AT ALL\r\n\r\n"]);
    let hello = exchange(addr, &["GET /hello HTTP/1.1\r\nHost: x\r\n\r\n"]);
    let (garbage, hello) = tokio::join!(garbage, hello);

    assert!(garbage.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{garbage}");
    assert!(hello.ends_with("<h1>hello</h1>"), "{hello}");

    let lines = wait_for_lines(&log, 1).await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("\"GET /hello HTTP/1.1\" 200"));
}
