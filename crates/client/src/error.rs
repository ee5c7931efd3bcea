/// Errors surfaced by the live-session client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The WebSocket connection could not be established or died.
    #[error("WebSocket failure: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server answered with a non-success status.
    #[error("Server rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    /// An operation that needs an open conversation was called without one.
    #[error("No conversation is open")]
    NotOpen,
}
