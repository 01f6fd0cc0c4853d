//! # Response-Generation Capability Contract

use crate::conversation::Message;
use anyhow::Result;
use async_trait::async_trait;

/// The response-generation capability the pipeline is written against.
///
/// `history` is the ordered prior message list of the conversation as the
/// resolver returned it; implementations may use it for context or ignore
/// it. The reply is returned verbatim; no trimming or normalization is
/// promised beyond what the capability itself guarantees.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, text: &str, history: &[Message]) -> Result<String>;
}
