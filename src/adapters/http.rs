//! HTTP control surface.
//!
//! The route table and JSON handling live in [`dispatch`], independent of
//! any server, so the whole surface is exercised by host tests. The
//! `espidf` feature adds the thin [`serve`] wrapper that binds it to
//! `EspHttpServer`.

use log::warn;
use serde::Deserialize;

use crate::app::ports::StoragePort;
use crate::app::CommandApi;
use crate::error::MenuError;
use crate::menu::{NodeKind, TimerMode};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SelectBody {
    path: String,
}

#[derive(Deserialize)]
struct StartBody {
    path: String,
    #[serde(default)]
    seconds: Option<u32>,
}

#[derive(Deserialize)]
struct AddBody {
    parent: String,
    name: String,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default = "AddBody::default_mode")]
    mode: TimerMode,
    #[serde(default)]
    fixed: Option<u32>,
}

impl AddBody {
    fn default_mode() -> TimerMode {
        TimerMode::Fixed
    }
}

#[derive(Deserialize)]
struct DeleteBody {
    parent: String,
    name: String,
}

#[derive(Deserialize)]
struct WifiBody {
    ssid: String,
    #[serde(default)]
    pass: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Transport-agnostic response: status code plus a JSON body.
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    fn ok(body: String) -> Self {
        Self { status: 200, body }
    }

    fn accepted() -> Self {
        Self::ok(r#"{"ok":true}"#.to_string())
    }

    fn with_version(version: u64) -> Self {
        Self::ok(format!(r#"{{"ok":true,"version":{version}}}"#))
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status: 400,
            body: format!(r#"{{"error":"bad_request","message":{}}}"#, json_str(message)),
        }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            body: r#"{"error":"unknown_route"}"#.to_string(),
        }
    }
}

impl From<MenuError> for Response {
    fn from(e: MenuError) -> Self {
        let status = match e {
            MenuError::NotFound => 404,
            MenuError::AlreadyExists => 409,
            MenuError::InvalidArgument(_) => 400,
            MenuError::Persistence | MenuError::Parse => 500,
        };
        Self {
            status,
            body: format!(
                r#"{{"error":{},"message":{}}}"#,
                json_str(e.tag()),
                json_str(&e.to_string())
            ),
        }
    }
}

fn json_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Route one request. `method` is uppercase (`"GET"`, `"POST"`).
pub fn dispatch<S: StoragePort>(
    api: &CommandApi<S>,
    method: &str,
    uri: &str,
    body: &[u8],
) -> Response {
    match (method, uri) {
        // Opening the menu in the browser doubles as a wake gesture.
        ("GET", "/api/menu") => {
            api.wake();
            Response::ok(api.menu_snapshot())
        }

        ("GET", "/api/state") => match serde_json::to_string(&api.status()) {
            Ok(json) => Response::ok(json),
            Err(e) => {
                warn!("status serialisation failed: {e}");
                Response {
                    status: 500,
                    body: r#"{"error":"internal"}"#.to_string(),
                }
            }
        },

        ("POST", "/api/select") => match parse::<SelectBody>(body) {
            Ok(req) => result_of(api.select_path(&req.path).map(|()| Response::accepted())),
            Err(resp) => resp,
        },

        ("POST", "/api/user/start") => match parse::<StartBody>(body) {
            Ok(req) => result_of(
                api.start_node(&req.path, req.seconds)
                    .map(|()| Response::accepted()),
            ),
            Err(resp) => resp,
        },

        ("POST", "/api/admin/add") => match parse::<AddBody>(body) {
            Ok(req) => result_of(
                api.add_node(&req.parent, &req.name, req.kind, req.mode, req.fixed)
                    .map(Response::with_version),
            ),
            Err(resp) => resp,
        },

        ("POST", "/api/admin/delete") => match parse::<DeleteBody>(body) {
            Ok(req) => result_of(
                api.delete_node(&req.parent, &req.name)
                    .map(Response::with_version),
            ),
            Err(resp) => resp,
        },

        ("POST", "/api/wifi") => match parse::<WifiBody>(body) {
            Ok(req) => {
                if req.ssid.is_empty() || req.ssid.len() > 32 || req.pass.len() > 64 {
                    return Response::bad_request("ssid or password out of range");
                }
                match api.save_credentials(&req.ssid, &req.pass) {
                    // Applied on next boot; confirm the write only.
                    Ok(()) => Response::accepted(),
                    Err(e) => {
                        warn!("credential write failed: {e}");
                        Response {
                            status: 500,
                            body: r#"{"error":"persistence_failure"}"#.to_string(),
                        }
                    }
                }
            }
            Err(resp) => resp,
        },

        _ => Response::not_found(),
    }
}

fn parse<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| Response::bad_request(&e.to_string()))
}

fn result_of(result: Result<Response, MenuError>) -> Response {
    result.unwrap_or_else(Response::from)
}

// ---------------------------------------------------------------------------
// ESP-IDF server binding
// ---------------------------------------------------------------------------

#[cfg(feature = "espidf")]
mod server {
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::http::Method;
    use esp_idf_svc::io::{Read, Write};
    use log::error;

    use super::dispatch;
    use crate::app::ports::StoragePort;
    use crate::app::CommandApi;
    use crate::error::{Error, Result};

    const MAX_BODY: usize = 1024;

    const ROUTES: &[(&str, &str)] = &[
        ("GET", "/api/menu"),
        ("GET", "/api/state"),
        ("POST", "/api/select"),
        ("POST", "/api/user/start"),
        ("POST", "/api/admin/add"),
        ("POST", "/api/admin/delete"),
        ("POST", "/api/wifi"),
    ];

    /// Bind the route table to an `EspHttpServer`. The returned server must
    /// be kept alive for as long as the API should be reachable.
    pub fn serve<S: StoragePort + Send + 'static>(
        api: CommandApi<S>,
    ) -> Result<EspHttpServer<'static>> {
        let mut server = EspHttpServer::new(&Configuration::default()).map_err(|e| {
            error!("http server start failed: {e}");
            Error::Init("http server start failed")
        })?;

        for (method, uri) in ROUTES {
            let api = api.clone();
            let method_enum = match *method {
                "GET" => Method::Get,
                _ => Method::Post,
            };
            server
                .fn_handler::<anyhow::Error, _>(uri, method_enum, move |mut req| {
                    let mut body = [0u8; MAX_BODY];
                    let mut len = 0;
                    loop {
                        let n = req.read(&mut body[len..])?;
                        if n == 0 {
                            break;
                        }
                        len += n;
                        if len == MAX_BODY {
                            break;
                        }
                    }

                    let resp = dispatch(&api, method, uri, &body[..len]);
                    let status_line = resp.status.to_string();
                    let mut out = req.into_response(
                        resp.status,
                        Some(&status_line),
                        &[("Content-Type", "application/json")],
                    )?;
                    out.write_all(resp.body.as_bytes())?;
                    Ok(())
                })
                .map_err(|e| {
                    error!("route {uri} registration failed: {e}");
                    Error::Init("http route registration failed")
                })?;
        }

        Ok(server)
    }
}

#[cfg(feature = "espidf")]
pub use server::serve;
