use std::time::Duration;

use cgi_http::connection::SessionConfig;
use cgi_web::router::{Router, get, post};
use cgi_web::{Server, handler_fn};

async fn hello_world() -> &'static str {
    "<h1>hello world</h1>"
}

async fn bytes() -> Vec<u8> {
    b"raw bytes".to_vec()
}

async fn answer() -> u32 {
    42
}

async fn broken() -> Result<String, std::io::Error> {
    Err(std::io::Error::other("this handler always fails"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let router = Router::builder()
        .route("/", get(handler_fn(hello_world)))
        .route("/bytes", get(handler_fn(bytes)))
        .route("/answer", get(handler_fn(answer)))
        .route("/broken", get(handler_fn(broken)))
        .route("/echo", post(handler_fn(hello_world)))
        .build()?;

    let session_config = SessionConfig::builder().read_timeout(Duration::from_secs(10)).write_timeout(Duration::from_secs(10)).build();

    Server::builder()
        .router(router)
        .bind("127.0.0.1:3000")
        .fallback_path(concat!(env!("CARGO_MANIFEST_DIR"), "/static/404.html"))
        .session_config(session_config)
        .build()?
        .start()
        .await;

    Ok(())
}
