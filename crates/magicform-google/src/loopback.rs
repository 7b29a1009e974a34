//! Loopback redirect listener for the installed-app flow.
//!
//! Google redirects the browser to `http://localhost:<port>/?code=..&state=..`
//! once the user grants consent. This module accepts that single request and
//! hands the code back to the caller.

use reqwest::Url;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::error::AuthError;

const SUCCESS_MESSAGE: &str =
    "The authentication flow has completed. You may close this window.";

/// Bind the loopback listener. Port 0 picks a free port.
pub async fn bind(port: u16) -> Result<TcpListener, AuthError> {
    Ok(TcpListener::bind(("127.0.0.1", port)).await?)
}

/// Redirect URI matching a listener bound with [`bind`].
pub fn redirect_uri(listener: &TcpListener) -> Result<String, AuthError> {
    let port = listener.local_addr()?.port();
    Ok(format!("http://localhost:{port}/"))
}

/// Wait for the OAuth redirect and return the authorization code.
///
/// Requests that carry neither `code` nor `error` (favicon probes and the
/// like) are answered with 404 and ignored.
pub async fn wait_for_code(
    listener: &TcpListener,
    expected_state: &str,
) -> Result<String, AuthError> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        tracing::debug!("loopback connection from {peer}");

        let Some(target) = read_request_target(&mut stream).await? else {
            respond(&mut stream, "400 Bad Request", "Bad request").await?;
            continue;
        };

        match parse_redirect(&target, expected_state) {
            Ok(Some(code)) => {
                respond(&mut stream, "200 OK", SUCCESS_MESSAGE).await?;
                return Ok(code);
            }
            Ok(None) => respond(&mut stream, "404 Not Found", "Not found").await?,
            Err(e) => {
                respond(&mut stream, "400 Bad Request", &e.to_string()).await?;
                return Err(e);
            }
        }
    }
}

/// Read the request line and drain the headers, returning the request target.
async fn read_request_target(stream: &mut TcpStream) -> Result<Option<String>, AuthError> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let mut header = String::new();
    loop {
        header.clear();
        let n = reader.read_line(&mut header).await?;
        if n == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(Some(target.to_string())),
        _ => Ok(None),
    }
}

/// Extract the code from a redirect target such as `/?code=..&state=..`.
fn parse_redirect(target: &str, expected_state: &str) -> Result<Option<String>, AuthError> {
    let url = Url::parse(&format!("http://localhost{target}"))
        .map_err(|e| AuthError::InvalidUrl(format!("{target}: {e}")))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(AuthError::Denied(error));
    }
    let Some(code) = code else {
        return Ok(None);
    };
    if state.as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }
    Ok(Some(code))
}

async fn respond(stream: &mut TcpStream, status: &str, message: &str) -> Result<(), AuthError> {
    let body = format!(
        "<!DOCTYPE html><html><body><p>{}</p></body></html>",
        escape_html(message)
    );
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
