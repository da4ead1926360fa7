//! Mock WebDAV server: records every request and answers from a queue.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::routing::any;
use axum::Router;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Path prefix the mock serves under; `/{*path}` does not match `/` itself.
pub const DAV_ROOT: &str = "/dav";

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::status(200)
    }
}

impl MockResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: Vec::new(),
        }
    }

    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    /// A 207 whose body lists `entries`.
    pub fn multistatus(entries: &[DavEntry]) -> Self {
        Self {
            status: 207,
            content_type: "application/xml; charset=utf-8",
            body: multistatus_xml(entries).into_bytes(),
        }
    }
}

/// One `<d:response>` in a multistatus body.
#[derive(Debug, Clone)]
pub struct DavEntry {
    pub href: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: &'static str,
}

impl DavEntry {
    pub fn dir(href: &str) -> Self {
        Self {
            href: href.to_string(),
            is_dir: true,
            size: 0,
            modified: "Mon, 01 Jan 2024 00:00:00 GMT",
        }
    }

    pub fn file(href: &str, size: u64, modified: &'static str) -> Self {
        Self {
            href: href.to_string(),
            is_dir: false,
            size,
            modified,
        }
    }
}

pub fn multistatus_xml(entries: &[DavEntry]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?><d:multistatus xmlns:d="DAV:">"#);
    for entry in entries {
        let resource_type = if entry.is_dir {
            "<d:resourcetype><d:collection/></d:resourcetype>"
        } else {
            "<d:resourcetype/>"
        };
        xml.push_str(&format!(
            "<d:response><d:href>{}</d:href><d:propstat><d:prop>{}\
             <d:getcontentlength>{}</d:getcontentlength>\
             <d:getlastmodified>{}</d:getlastmodified>\
             </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>",
            entry.href, resource_type, entry.size, entry.modified
        ));
    }
    xml.push_str("</d:multistatus>");
    xml
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
}

pub struct MockWebDav {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockWebDav {
    pub async fn start() -> Self {
        let state = MockState {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
        };

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/{*path}", any(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    pub async fn enqueue(&self, response: MockResponse) {
        self.state.responses.lock().await.push_back(response);
    }

    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().await.clone()
    }

    /// Server URL to put in a WebDAV config.
    pub fn server_url(&self) -> String {
        format!("http://{}{}", self.addr, DAV_ROOT)
    }
}

impl Drop for MockWebDav {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_request(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();

    let body = axum::body::to_bytes(req.into_body(), 1024 * 1024)
        .await
        .unwrap_or_default()
        .to_vec();

    state.requests.lock().await.push(CapturedRequest {
        method,
        path,
        headers,
        body,
    });

    let mock = state
        .responses
        .lock()
        .await
        .pop_front()
        .unwrap_or_default();

    Response::builder()
        .status(StatusCode::from_u16(mock.status).unwrap())
        .header("content-type", mock.content_type)
        .body(Body::from(mock.body))
        .unwrap()
}
