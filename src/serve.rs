//! HTTP front end
//!
//! `voicecheckr serve` → binds `HOST:PORT` and answers `POST /detect` with
//! `{"classification": ..., "confidence": ...}`.
//!
//! Routing is a pure function of method, path, API-key header and body so it
//! can be tested without sockets; the server loop only moves bytes.

use std::io::Read;
use std::sync::Arc;
use std::thread;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::core::VoiceAnalyzer;

pub const SERVICE_NAME: &str = "voicecheckr";
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
const SUPPORTED_LANGUAGES: [&str; 5] = ["Tamil", "English", "Hindi", "Malayalam", "Telugu"];

/// Listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub workers: usize,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_key: String::new(),
            workers: 4,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Deserialize)]
struct DetectRequest {
    audio: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    status_code: u16,
}

/// Status code and JSON body of one response
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(500, &format!("failed to serialize response: {}", e)),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        let body = serde_json::to_string(&ErrorBody {
            error: message,
            status_code: status,
        })
        .unwrap_or_else(|_| format!("{{\"status_code\":{}}}", status));
        Self { status, body }
    }

    fn empty(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Shared request handler: the analyzer plus access control
pub struct DetectionService {
    analyzer: VoiceAnalyzer,
    api_key: String,
    max_body_bytes: usize,
}

impl DetectionService {
    pub fn new(analyzer: VoiceAnalyzer, api_key: impl Into<String>, max_body_bytes: usize) -> Self {
        Self {
            analyzer,
            api_key: api_key.into(),
            max_body_bytes,
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Route one request
    pub fn route(&self, method: &Method, url: &str, api_key: Option<&str>, body: &[u8]) -> Reply {
        let path = url.split('?').next().unwrap_or("/");

        match (method, path) {
            (&Method::Options, _) => Reply::empty(204),
            (&Method::Get, "/") => Reply::json(200, &service_info()),
            (&Method::Get, "/health") => Reply::json(
                200,
                &json!({ "status": "healthy", "service": SERVICE_NAME }),
            ),
            (&Method::Post, "/detect") => self.detect(api_key, body),
            (_, "/" | "/health" | "/detect") => Reply::error(405, "Method not allowed"),
            _ => Reply::error(404, "Not found"),
        }
    }

    fn detect(&self, api_key: Option<&str>, body: &[u8]) -> Reply {
        match api_key {
            None | Some("") => {
                warn!("Request received without API key");
                return Reply::error(401, "Missing API key. Provide X-API-Key in request headers.");
            }
            Some(key) if key != self.api_key => {
                warn!("Request rejected: invalid API key");
                return Reply::error(403, "Invalid API key");
            }
            Some(_) => {}
        }

        if body.len() > self.max_body_bytes {
            return Reply::error(413, "Request body too large");
        }

        let request: DetectRequest = match serde_json::from_slice(body) {
            Ok(r) => r,
            Err(e) => {
                warn!("Malformed request body: {}", e);
                return Reply::error(400, &format!("Invalid request body: {}", e));
            }
        };
        if request.audio.trim().is_empty() {
            return Reply::error(400, "Audio field cannot be empty");
        }

        debug!("Processing detection request ({} base64 chars)", request.audio.len());
        match self.analyzer.detect(&request.audio) {
            Ok(result) => Reply::json(200, &result),
            Err(e) if e.is_client_fault() => {
                warn!("Rejected audio: {}", e);
                Reply::error(400, &format!("Invalid audio data: {}", e))
            }
            Err(e) => {
                error!("Detection failed: {}", e);
                Reply::error(500, "Internal server error during voice detection")
            }
        }
    }
}

fn service_info() -> serde_json::Value {
    json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Detects AI-generated vs human voice in audio samples",
        "supported_languages": SUPPORTED_LANGUAGES,
        "endpoints": {
            "detect": "/detect",
            "health": "/health"
        }
    })
}

/// Bind and serve until the process exits
pub fn start(config: ServerConfig, analyzer: VoiceAnalyzer) -> std::io::Result<()> {
    let address = config.address();
    let server = Server::http(&address)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let server = Arc::new(server);
    let service = Arc::new(DetectionService::new(
        analyzer,
        config.api_key,
        config.max_body_bytes,
    ));

    info!("Listening on http://{} with {} workers", address, config.workers.max(1));

    let handles: Vec<_> = (0..config.workers.max(1))
        .map(|id| {
            let server = Arc::clone(&server);
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    if let Err(e) = handle_request(request, &service) {
                        error!("worker {}: failed to respond: {}", id, e);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            error!("worker thread panicked");
        }
    }
    Ok(())
}

fn handle_request(mut request: Request, service: &DetectionService) -> std::io::Result<()> {
    let method = request.method().clone();
    let url = request.url().to_string();
    let api_key = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("X-API-Key"))
        .map(|h| h.value.as_str().to_string());

    let limit = service.max_body_bytes();
    let reply = if request.body_length().map_or(false, |len| len > limit) {
        Reply::error(413, "Request body too large")
    } else {
        let mut body = Vec::new();
        request
            .as_reader()
            .take(limit as u64 + 1)
            .read_to_end(&mut body)?;
        service.route(&method, &url, api_key.as_deref(), &body)
    };

    debug!("{} {} -> {}", method, url, reply.status);
    request.respond(to_response(reply))
}

fn to_response(reply: Reply) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_string(reply.body).with_status_code(StatusCode(reply.status));

    let headers = [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type, X-API-Key"),
    ];
    for (name, value) in headers {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response.add_header(header);
        }
    }
    response
}
