//! Static file serving for the mobile controller page.
//!
//! Request paths are resolved lexically against the root directory before
//! anything touches the file system:
//!
//! | Request                       | Result                          |
//! |-------------------------------|---------------------------------|
//! | `/`                           | the entry document              |
//! | `/css/app.css`                | `<root>/css/app.css`            |
//! | `/a/../b.js`                  | `<root>/b.js`                   |
//! | `/../secret`, `/%2e%2e/x`     | 403, never opened               |
//! | missing file                  | 404                             |
//! | other read failure            | 500 with the OS error code      |
//!
//! Content types come from the file extension (`mime_guess`).

use std::io;
use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use super::MobileState;

/// Outcome of resolving a request path.
#[derive(Debug, PartialEq, Eq)]
pub enum ResolvedPath {
    File(PathBuf),
    /// The path escapes the root.
    Forbidden,
    /// The path is not valid percent-encoded UTF-8.
    Malformed,
}

/// Maps a URL path onto a file below `root`.
pub fn resolve_path(root: &Path, entry_document: &str, url_path: &str) -> ResolvedPath {
    let decoded = match urlencoding::decode(url_path) {
        Ok(decoded) => decoded,
        Err(_) => return ResolvedPath::Malformed,
    };

    let mut parts: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return ResolvedPath::Forbidden;
                }
            }
            // Drive prefixes would replace the root on Windows.
            s if s.contains(':') || s.contains('\0') => return ResolvedPath::Forbidden,
            s => parts.push(s),
        }
    }

    if parts.is_empty() {
        return ResolvedPath::File(root.join(entry_document.trim_start_matches('/')));
    }
    let mut path = root.to_path_buf();
    path.extend(parts);
    ResolvedPath::File(path)
}

/// Fallback handler: serves `uri.path()` from the root directory.
pub async fn serve_static(State(state): State<MobileState>, uri: Uri) -> Response {
    let path = match resolve_path(&state.root_dir, &state.entry_document, uri.path()) {
        ResolvedPath::File(path) => path,
        ResolvedPath::Forbidden => {
            warn!("Mobile server: refused path outside root: {}", uri.path());
            return (StatusCode::FORBIDDEN, "Access denied").into_response();
        }
        ResolvedPath::Malformed => {
            return (StatusCode::BAD_REQUEST, "Malformed path").into_response();
        }
    };

    match tokio::fs::read(&path).await {
        Ok(body) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            debug!("Mobile server: 200 {} ({mime})", uri.path());
            ([(header::CONTENT_TYPE, mime.to_string())], body).into_response()
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Mobile server: 404 {}", uri.path());
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
        Err(e) => {
            warn!("Mobile server: failed to read {}: {e}", path.display());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Server error: {}", error_code(&e)),
            )
                .into_response()
        }
    }
}

/// The OS error number when there is one, else the error kind.
fn error_code(e: &io::Error) -> String {
    match e.raw_os_error() {
        Some(code) => code.to_string(),
        None => format!("{:?}", e.kind()),
    }
}
