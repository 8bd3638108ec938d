mod elasticsearch;
#[cfg(test)]
pub(crate) mod recording;

pub use elasticsearch::{ElasticsearchSink, REQUEST_TIMEOUT};

use crate::error::DeliveryError;
use crate::models::LogDocument;

/// Destination for built documents. One call is one delivery attempt.
#[allow(async_fn_in_trait)]
pub trait DocumentSink {
    async fn send(&self, document: &LogDocument) -> Result<(), DeliveryError>;
}
