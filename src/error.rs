use thiserror::Error;

/// Errors surfaced by an injected chain API handle.
///
/// The concrete RPC transport lives outside this crate; whatever it fails
/// with is carried here as a message so role implementations can log and
/// propagate without depending on a transport crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The underlying RPC call failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A queried storage item or block does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The push feed closed or could not be opened.
    #[error("subscription closed")]
    SubscriptionClosed,

    /// A caller-supplied identifier or argument could not be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ApiError {
    pub fn rpc(msg: impl Into<String>) -> Self {
        ApiError::Rpc(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ApiError::InvalidArgument(msg.into())
    }
}

/// Errors emitted by a [`Listener`](crate::Listener).
///
/// `Connect` is fatal: the listener is unusable until `init()` is retried.
/// `Subscribe` leaves the listener initialized but not subscribed; the caller
/// may retry. No retry loop is owned by this crate.
#[derive(Error, Debug, Clone)]
pub enum ListenerError {
    /// The per-chain API handle could not be constructed.
    #[error("[{chain}] failed to construct API handle: {source}")]
    Connect { chain: String, source: ApiError },

    /// The live subscription could not be opened.
    #[error("[{chain}] failed to open subscription: {source}")]
    Subscribe { chain: String, source: ApiError },
}

impl ListenerError {
    /// The chain id this error was raised for.
    pub fn chain(&self) -> &str {
        match self {
            ListenerError::Connect { chain, .. } | ListenerError::Subscribe { chain, .. } => chain,
        }
    }
}

/// Error returned by an event handler.
///
/// Handlers are external consumers; their failure modes are opaque to the
/// core, which only needs something to log before skipping the remaining
/// handlers for the offending event.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    pub fn new(msg: impl Into<String>) -> Self {
        HandlerError(msg.into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError(err.to_string())
    }
}
