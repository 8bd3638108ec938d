pub mod document_builder;
pub mod event_feed;
pub mod relay_service;
pub mod sanitizer;

pub use document_builder::DocumentBuilder;
pub use event_feed::{FeedSummary, feed};
pub use relay_service::RelayService;
pub use sanitizer::sanitize;
