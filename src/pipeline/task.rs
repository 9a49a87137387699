use std::time::Duration;

use bytes::Bytes;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::pipeline::client::{InferenceClient, InferenceOutput};
use crate::pipeline::repo::{record_dead_letter, Prediction};
use crate::realtime::events::RoomEvent;
use crate::state::AppState;
use crate::uploads::repo::{Image, ImageStatus};

pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Error from an exhausted retry loop.
#[derive(Debug)]
pub struct RetryError {
    pub attempts: u32,
    pub message: String,
}

/// Call the inference service, retrying with exponential backoff. The call
/// itself carries no timeout; a hung service stalls only this task.
pub async fn call_with_retry(
    client: &dyn InferenceClient,
    data: Bytes,
    content_type: &str,
    max_attempts: u32,
) -> Result<InferenceOutput, RetryError> {
    let mut backoff = INITIAL_BACKOFF;
    let mut last_error = String::new();
    for attempt in 1..=max_attempts {
        match client.predict(data.clone(), content_type).await {
            Ok(output) => return Ok(output),
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "inference attempt failed");
                last_error = e.to_string();
                if attempt < max_attempts {
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
    Err(RetryError {
        attempts: max_attempts,
        message: last_error,
    })
}

/// One detached unit of work per uploaded image. Runs after the upload
/// response has been sent; outcomes are reported only through the owner's
/// room (and the dead-letter table on failure), never to the original
/// request.
pub struct ProcessingTask {
    state: AppState,
    image_id: Uuid,
    user_id: Uuid,
    content_type: String,
    data: Bytes,
}

impl ProcessingTask {
    pub fn new(
        state: AppState,
        image_id: Uuid,
        user_id: Uuid,
        content_type: String,
        data: Bytes,
    ) -> Self {
        Self {
            state,
            image_id,
            user_id,
            content_type,
            data,
        }
    }

    pub fn spawn(self) {
        tokio::spawn(self.run());
    }

    async fn run(self) {
        if let Err(e) = Image::set_status(&self.state.db, self.image_id, ImageStatus::Submitted).await
        {
            error!(image_id = %self.image_id, error = %e, "status update failed");
        }

        match call_with_retry(
            self.state.inference.as_ref(),
            self.data.clone(),
            &self.content_type,
            MAX_ATTEMPTS,
        )
        .await
        {
            Ok(output) => self.complete(output).await,
            Err(e) => self.fail(e.attempts, e.message).await,
        }
    }

    async fn complete(&self, output: InferenceOutput) {
        let prediction = match Prediction::create(
            &self.state.db,
            self.image_id,
            self.user_id,
            &output.predictions,
        )
        .await
        {
            Ok(p) => p,
            Err(e) => {
                self.fail(1, format!("persist prediction: {e}")).await;
                return;
            }
        };

        if let Err(e) = Image::set_status(&self.state.db, self.image_id, ImageStatus::Predicted).await
        {
            error!(image_id = %self.image_id, error = %e, "status update failed");
        }

        let delivered = self.state.rooms.publish(
            self.user_id,
            RoomEvent::PredictionComplete {
                image_id: self.image_id,
                prediction_id: prediction.id,
                predictions: output.predictions,
                processed_image: output.image,
            },
        );
        info!(
            image_id = %self.image_id,
            prediction_id = %prediction.id,
            user_id = %self.user_id,
            delivered,
            "prediction complete"
        );
    }

    async fn fail(&self, attempts: u32, error_message: String) {
        error!(
            image_id = %self.image_id,
            user_id = %self.user_id,
            attempts,
            error = %error_message,
            "image processing failed"
        );

        if let Err(e) = Image::set_status(&self.state.db, self.image_id, ImageStatus::Failed).await {
            error!(image_id = %self.image_id, error = %e, "status update failed");
        }
        if let Err(e) = record_dead_letter(
            &self.state.db,
            self.image_id,
            self.user_id,
            attempts,
            &error_message,
        )
        .await
        {
            error!(image_id = %self.image_id, error = %e, "dead letter insert failed");
        }

        self.state.rooms.publish(
            self.user_id,
            RoomEvent::ProcessingError {
                msg: "Error processing image".into(),
                error: error_message,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails `failures` times, then succeeds.
    struct FlakyClient {
        calls: Arc<AtomicU32>,
        failures: u32,
    }

    #[async_trait]
    impl InferenceClient for FlakyClient {
        async fn predict(
            &self,
            _data: Bytes,
            _content_type: &str,
        ) -> anyhow::Result<InferenceOutput> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                anyhow::bail!("connection refused (attempt {call})");
            }
            Ok(InferenceOutput {
                predictions: serde_json::json!([{"label": "ok"}]),
                image: None,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_first_try_without_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = FlakyClient {
            calls: calls.clone(),
            failures: 0,
        };
        let out = call_with_retry(&client, Bytes::from_static(b"x"), "image/png", MAX_ATTEMPTS)
            .await
            .expect("success");
        assert_eq!(out.predictions[0]["label"], "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_before_attempts_run_out() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = FlakyClient {
            calls: calls.clone(),
            failures: 2,
        };
        let out = call_with_retry(&client, Bytes::from_static(b"x"), "image/png", MAX_ATTEMPTS)
            .await
            .expect("recovers on third attempt");
        assert_eq!(out.predictions[0]["label"], "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let client = FlakyClient {
            calls: calls.clone(),
            failures: u32::MAX,
        };
        let err = call_with_retry(&client, Bytes::from_static(b"x"), "image/png", MAX_ATTEMPTS)
            .await
            .expect_err("exhausted");
        assert_eq!(err.attempts, MAX_ATTEMPTS);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
        assert!(err.message.contains("connection refused"));
    }
}
