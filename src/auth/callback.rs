//! Single-shot local listener for the OAuth redirect.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use crate::error::{Error, Result};

/// Static page returned to the browser whatever the callback contained.
const CONFIRMATION_PAGE: &str = "<html><head><meta http-equiv='refresh' content='10;url=https://photos.google.com'></head><body>Please return to the app.</body></html>";

/// Largest request head we read from the browser.
const MAX_REQUEST_BYTES: usize = 8192;

/// Why a callback was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("provider returned error '{0}'")]
    ProviderError(String),

    #[error("callback is missing the authorization code")]
    MissingCode,

    #[error("callback is missing the state parameter")]
    MissingState,

    #[error("state mismatch (received '{received}')")]
    StateMismatch { received: String },
}

/// Query parameters carried by the redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse the parameters out of a request target such as
    /// `/Authentication/Callback?code=...&state=...`.
    pub fn from_target(target: &str) -> Result<Self> {
        let url = Url::parse("http://localhost")?.join(target)?;
        let mut params = Self::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(params)
    }

    /// Check the callback against the nonce sent with the authorization
    /// request and return the authorization code.
    pub fn validate(self, expected_state: &str) -> std::result::Result<String, Rejection> {
        if let Some(error) = self.error {
            return Err(Rejection::ProviderError(error));
        }

        let code = self.code.ok_or(Rejection::MissingCode)?;
        let state = self.state.ok_or(Rejection::MissingState)?;

        if state != expected_state {
            return Err(Rejection::StateMismatch { received: state });
        }

        Ok(code)
    }
}

/// Listener bound to the configured redirect URI.
pub struct CallbackListener {
    listener: TcpListener,
    path: String,
}

impl CallbackListener {
    /// Bind to the host and port of the redirect URI.
    ///
    /// The URI must match the provider registration exactly, so any problem
    /// here is a configuration error.
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let url = Url::parse(redirect_uri)
            .map_err(|e| Error::RedirectUri(format!("{}: {}", redirect_uri, e)))?;

        if url.scheme() != "http" {
            return Err(Error::RedirectUri(format!(
                "{}: only http loopback redirects can be served locally",
                redirect_uri
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| Error::RedirectUri(format!("{}: missing host", redirect_uri)))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::RedirectUri(format!("{}: missing port", redirect_uri)))?;

        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| Error::RedirectUri(format!("cannot bind {}:{}: {}", host, port, e)))?;

        tracing::debug!("Listening for authorization callback on {}", redirect_uri);

        Ok(Self {
            listener,
            path: url.path().to_string(),
        })
    }

    /// Port the listener is bound to.
    pub fn port(&self) -> Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Wait for the redirect and return its query parameters.
    ///
    /// Requests on any other path get a 404 and the listener keeps waiting.
    /// The listener is consumed and stops listening once the redirect has
    /// been answered. `None` waits forever.
    pub async fn accept_one(self, timeout: Option<Duration>) -> Result<CallbackParams> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.serve())
                .await
                .map_err(|_| Error::CallbackTimeout(limit))?,
            None => self.serve().await,
        }
    }

    async fn serve(self) -> Result<CallbackParams> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;

            let request = match read_request_head(&mut stream).await {
                Ok(request) => request,
                Err(e) => {
                    tracing::debug!("Dropping connection from {}: {}", peer, e);
                    continue;
                }
            };

            let target = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/")
                .to_string();

            if !self.matches_path(&target) {
                tracing::debug!("Ignoring request for {} from {}", target, peer);
                respond(&mut stream, "404 Not Found", "Not found").await;
                continue;
            }

            tracing::debug!("Authorization callback received from {}", peer);
            respond(&mut stream, "200 OK", CONFIRMATION_PAGE).await;
            drop(self.listener);
            tracing::debug!("Callback listener stopped");

            return CallbackParams::from_target(&target);
        }
    }

    fn matches_path(&self, target: &str) -> bool {
        let path = target.split(['?', '#']).next().unwrap_or_default();
        path.trim_end_matches('/') == self.path.trim_end_matches('/')
    }
}

/// Read up to the end of the request head.
async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buffer = vec![0u8; MAX_REQUEST_BYTES];
    let mut read = 0;
    loop {
        let n = stream.read(&mut buffer[read..]).await?;
        read += n;
        if n == 0 || read == buffer.len() || buffer[..read].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buffer[..read]).into_owned())
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        tracing::debug!("Failed to send {} response: {}", status, e);
    }
    if let Err(e) = stream.shutdown().await {
        tracing::debug!("Failed to close callback connection: {}", e);
    }
}
