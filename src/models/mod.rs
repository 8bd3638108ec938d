pub mod context;
pub mod document;
pub mod event;

pub use context::RunContext;
pub use document::{LogDocument, SanitizedResult, format_timestamp};
pub use event::{HostStats, LifecycleEvent, RawResult};
