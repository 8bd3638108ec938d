use super::DocumentSink;
use crate::error::DeliveryError;
use crate::models::LogDocument;
use std::sync::Mutex;

/// In-memory sink that keeps every document it is handed.
#[derive(Default)]
pub(crate) struct RecordingSink {
    documents: Mutex<Vec<LogDocument>>,
    failure: Option<DeliveryError>,
}

impl RecordingSink {
    pub(crate) fn failing(err: DeliveryError) -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            failure: Some(err),
        }
    }

    pub(crate) fn documents(&self) -> Vec<LogDocument> {
        self.documents.lock().unwrap().clone()
    }
}

impl DocumentSink for RecordingSink {
    async fn send(&self, document: &LogDocument) -> Result<(), DeliveryError> {
        self.documents.lock().unwrap().push(document.clone());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
