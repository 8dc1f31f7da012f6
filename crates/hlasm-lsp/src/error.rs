//! Error kinds that cross the LSP boundary (`spec.md` §7).
//!
//! Parse/CA diagnostics never reach this type — they stay on the per-file
//! diagnostic list (`hlasm-core`). This covers request failures and
//! programmer errors: the two kinds the orchestrator must report back to
//! `tower_lsp` as a JSON-RPC error or, for programmer errors, abort on.

use tower_lsp::jsonrpc;

/// A request-level failure, reported through a response channel rather than
/// accumulated as a diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The request's response channel was invalidated before it ran
    /// (`spec.md` §4.8 cancellation).
    #[error("request canceled")]
    Canceled,
    /// The request's workspace was removed while it was queued.
    #[error("workspace removed")]
    RemovingWorkspace,
    /// The configuration document failed to parse.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl From<RequestError> for jsonrpc::Error {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Canceled => jsonrpc::Error {
                code: jsonrpc::ErrorCode::RequestCancelled,
                message: err.to_string().into(),
                data: None,
            },
            other => jsonrpc::Error::invalid_params(other.to_string()),
        }
    }
}
