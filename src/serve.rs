//! HTTP server for the browser chat
//!
//! `diacheck serve` → starts server, opens browser, chat in the page
//!
//! Requests are handled one at a time on the calling thread, so the session
//! is simply a local owned by the loop.

use crate::model::Classifier;
use crate::session::{ChatMessage, ChatSession};
use serde::{Deserialize, Serialize};
use std::io::Read;
use tiny_http::{Header, Method, Request, Response, Server};

// Embed the UI directly in the binary
const CHAT_UI_HTML: &str = include_str!("chat_ui.html");

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    fn failure(error: impl Into<String>) -> Self {
        Self { ok: false, data: None, error: Some(error.into()) }
    }
}

#[derive(Deserialize, Debug)]
pub struct ChatParams {
    pub message: String,
}

/// Start server, open browser, serve the chat
pub fn start<C: Classifier + ?Sized>(port: u16, model: &C, open_browser: bool) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);
    eprintln!("\n\x1b[1;32mDiabetes Check Chatbot\x1b[0m");
    eprintln!("   {}\n", url);
    tracing::info!(%addr, "web chat listening");

    if open_browser {
        let _ = open::that(&url);
    }

    let mut session = ChatSession::new();
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &mut session, model) {
            tracing::warn!(error = %e, "request failed");
        }
    }

    Ok(())
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).expect("static header is valid")
}

fn html_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]).expect("static header is valid")
}

/// Largest chat request body read; anything past it is cut off
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// What a route answers with, before it is written to the socket
#[derive(Debug)]
enum Reply {
    Page,
    Json { status: u16, body: String },
    NotFound,
}

impl Reply {
    fn json<T: Serialize>(status: u16, body: &T) -> std::io::Result<Self> {
        Ok(Reply::Json {
            status,
            body: serde_json::to_string(body)?,
        })
    }
}

fn handle_request<C: Classifier + ?Sized>(
    mut request: Request,
    session: &mut ChatSession,
    model: &C,
) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();
    tracing::debug!(?method, path, "request");

    let reply = route(&method, path, || read_body(request.as_reader()), session, model)?;

    match reply {
        Reply::Page => request.respond(Response::from_string(CHAT_UI_HTML).with_header(html_header())),
        Reply::Json { status, body } => request.respond(
            Response::from_string(body)
                .with_status_code(status)
                .with_header(json_header()),
        ),
        Reply::NotFound => request.respond(Response::from_string("Not found").with_status_code(404)),
    }
}

/// Dispatch on method and path; the body is only read by routes that need it
fn route<C, B>(method: &Method, path: &str, body: B, session: &mut ChatSession, model: &C) -> std::io::Result<Reply>
where
    C: Classifier + ?Sized,
    B: FnOnce() -> Result<String, String>,
{
    match (method, path) {
        (Method::Get, "/") => Ok(Reply::Page),

        (Method::Get, "/api/messages") => Reply::json(200, &ApiResponse::success(session.messages())),

        (Method::Post, "/api/chat") => match body().and_then(|b| parse_chat_body(&b)) {
            Ok(params) => {
                let reply: ChatMessage = session.handle_turn(&params.message, model).clone();
                Reply::json(200, &ApiResponse::success(reply))
            }
            Err(msg) => Reply::json(400, &ApiResponse::failure(msg)),
        },

        (Method::Post, "/api/reset") => {
            *session = ChatSession::new();
            Reply::json(200, &ApiResponse::success(session.messages()))
        }

        _ => Ok(Reply::NotFound),
    }
}

fn read_body<R: Read>(reader: R) -> Result<String, String> {
    let mut body = String::new();
    reader
        .take(MAX_BODY_BYTES)
        .read_to_string(&mut body)
        .map_err(|e| format!("could not read request body: {}", e))?;
    Ok(body)
}

fn parse_chat_body(body: &str) -> Result<ChatParams, String> {
    serde_json::from_str::<ChatParams>(body).map_err(|e| format!("expected {{\"message\": \"...\"}}: {}", e))
}
