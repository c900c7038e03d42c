pub mod client;
pub mod error;
pub mod payload;

pub use client::RpcClient;
pub use error::IngestError;
pub use payload::{BusinessPayload, PayloadContext, PriceKind, ServicePayload};
