#![allow(dead_code)]

use once_cell::sync::Lazy;
use opsbridge::endpoints::{AuthConfig, AuthScheme, EndpointsSpec, PaginationConfig};
use opsbridge::services::http::{HttpService, TokenCache};
use opsbridge::services::logger::Logger;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serializes tests that read or mutate process environment variables.
pub static ENV_LOCK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

const NETWORK_ENV_KEYS: &[&str] = &[
    "API_BASE",
    "BEARER_TOKEN",
    "API_TOKEN",
    "ACTION1_TOKEN",
    "API_CLIENT_ID",
    "API_CLIENT_SECRET",
    "API_KEY",
    "BASIC_USER",
    "BASIC_PASS",
    "ORG_ID",
    "ALLOW_DESTRUCTIVE",
];

pub fn clear_network_env() {
    for key in NETWORK_ENV_KEYS {
        std::env::remove_var(key);
    }
}

pub fn restore_env(key: &str, previous: Option<String>) {
    match previous {
        Some(value) => std::env::set_var(key, value),
        None => std::env::remove_var(key),
    }
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl StubResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            body: body.to_string(),
        }
    }

    pub fn json_text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain".to_string(),
            body: body.to_string(),
        }
    }
}

/// Minimal canned-response HTTP server. Every request is served the next
/// queued response on its own connection (`Connection: close`), and the raw
/// request text is recorded for assertions.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    queue: Arc<Mutex<VecDeque<StubResponse>>>,
}

impl StubServer {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn enqueue(&self, response: StubResponse) {
        self.queue.lock().unwrap().push_back(response);
    }
}

pub async fn spawn_stub(responses: Vec<StubResponse>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    let requests: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue: Arc<Mutex<VecDeque<StubResponse>>> = Arc::new(Mutex::new(responses.into()));

    let request_log = requests.clone();
    let response_queue = queue.clone();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let raw = read_request(socket).await;
            let (raw, socket) = match raw {
                Some(pair) => pair,
                None => continue,
            };
            request_log.lock().unwrap().push(raw);
            let response = response_queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| StubResponse::text(500, "stub exhausted"));
            write_response(socket, &response).await;
        }
    });

    StubServer {
        base_url: format!("http://{}", addr),
        requests,
        queue,
    }
}

async fn read_request(mut socket: TcpStream) -> Option<(String, TcpStream)> {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    Some((String::from_utf8_lossy(&buf).to_string(), socket))
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

async fn write_response(mut socket: TcpStream, response: &StubResponse) {
    let reason = match response.status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    };
    let payload = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason,
        response.content_type,
        response.body.len(),
        response.body
    );
    let _ = socket.write_all(payload.as_bytes()).await;
    let _ = socket.shutdown().await;
}

pub fn test_spec(base_url: &str, pagination: PaginationConfig) -> EndpointsSpec {
    EndpointsSpec {
        base_url: base_url.to_string(),
        auth: AuthConfig {
            scheme: AuthScheme::Bearer,
            header: None,
        },
        pagination,
        resources: HashMap::new(),
        actions: HashMap::new(),
        job_status: None,
    }
}

pub fn test_http(base_url: &str, pagination: PaginationConfig) -> HttpService {
    test_http_with_spec(test_spec(base_url, pagination))
}

pub fn test_http_with_spec(spec: EndpointsSpec) -> HttpService {
    HttpService::new(Logger::new("test"), Arc::new(spec), TokenCache::new())
        .expect("http service must build")
}
