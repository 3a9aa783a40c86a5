//! Promise-style client contract.
//!
//! A [`FetchTransport`] takes a [`FetchRequest`] and resolves to a
//! [`FetchResponse`]. The [`FetchInterceptor`] implements the same trait over
//! an original transport, so it can stand in wherever the original was used.

mod interceptor;
mod types;

use crate::error::TransportError;
use async_trait::async_trait;

pub use interceptor::FetchInterceptor;
pub use types::{FetchRequest, FetchResponse};

#[async_trait]
pub trait FetchTransport: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError>;
}
