//! Kernel module - infrastructure clients and the background processor.

pub mod ai;
pub mod crm_sync;
pub mod deps;
pub mod enrichment;
pub mod processor;
pub mod scraper_client;
pub mod test_dependencies;
pub mod traits;

pub use ai::{ClaudeClient, DEFAULT_CLAUDE_MODEL};
pub use crm_sync::CrmSync;
pub use deps::TwentyAdapter;
pub use processor::{Processor, ProcessorConfig};
pub use scraper_client::ScraperApiClient;
pub use traits::*;
