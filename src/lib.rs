pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod sink;

pub use config::Config;
pub use error::{DeliveryError, RelayError, Result};
pub use models::{HostStats, LifecycleEvent, LogDocument, RawResult, RunContext, SanitizedResult};
pub use services::{DocumentBuilder, FeedSummary, RelayService, feed, sanitize};
pub use sink::{DocumentSink, ElasticsearchSink};
