//! Research API Adapters
//!
//! ResearchApiPort 的具体实现

mod fake_research_api;
mod http_research_client;

pub use fake_research_api::FakeResearchApi;
pub use http_research_client::{HttpResearchClient, HttpResearchClientConfig};
