use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success RPC response, with the body the endpoint returned so
    /// the failure can be diagnosed without replaying the call.
    #[error("RPC {rpc_name} failed with status {status}: {body}")]
    Api {
        rpc_name: String,
        status: u16,
        body: String,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
