mod client;

pub use client::InferenceClient;

use crate::error::InferenceError;
use crate::models::{ImageRef, PredictionResult};

/// Seam between the capture workflow and the remote grader, so the workflow
/// can be exercised without a live service.
pub trait Classifier: Send + Sync + 'static {
    fn classify(
        &self,
        image: &ImageRef,
    ) -> impl std::future::Future<Output = Result<PredictionResult, InferenceError>> + Send;
}

impl Classifier for InferenceClient {
    async fn classify(&self, image: &ImageRef) -> Result<PredictionResult, InferenceError> {
        InferenceClient::classify(self, image).await
    }
}
