//! Router handoff publisher.
//!
//! Publishes the slim pointer messages of the ingestion pipeline to the
//! downstream router stream. The stream is ensured once at construction;
//! publishes await the JetStream acknowledgement so a reported success means
//! the broker has the message.

use async_nats::jetstream::{self, stream};
use usagehub_core::ports::Publisher;
use usagehub_core::types::{Route, RouterMessage};

use crate::{Error, NatsClient, Result, TRACING_TARGET};

/// Name of the downstream router stream.
pub const ROUTER_STREAM: &str = "USAGEHUB_ROUTER";

/// JetStream publisher for the downstream router.
#[derive(Debug, Clone)]
pub struct RouterPublisher {
    jetstream: jetstream::Context,
}

impl RouterPublisher {
    /// Creates the publisher, ensuring the router stream exists.
    pub async fn new(client: &NatsClient) -> Result<Self> {
        let jetstream = client.jetstream().clone();

        let stream_config = stream::Config {
            name: ROUTER_STREAM.to_string(),
            description: Some("usagehub router handoff".to_string()),
            subjects: vec![format!("{}.>", Self::subject_root())],
            ..Default::default()
        };

        match jetstream.get_stream(ROUTER_STREAM).await {
            Ok(_) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    stream = ROUTER_STREAM,
                    "Using existing router stream"
                );
            }
            Err(_) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    stream = ROUTER_STREAM,
                    "Creating router stream"
                );
                jetstream
                    .create_stream(stream_config)
                    .await
                    .map_err(|e| Error::stream(ROUTER_STREAM, e.to_string()))?;
            }
        }

        Ok(Self { jetstream })
    }

    fn subject_root() -> &'static str {
        "usagehub.router"
    }

    /// Maps a route to its stream subject.
    pub fn subject(route: Route) -> String {
        let suffix = match route {
            Route::Ingest => "ingest",
            Route::SpreadsheetReport => "spreadsheet",
            Route::Replay => "replay",
        };
        format!("{}.{}", Self::subject_root(), suffix)
    }

    async fn publish_json(&self, subject: String, message: &RouterMessage) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        let payload_size = payload.len();

        self.jetstream
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| Error::delivery_failed(&subject, e.to_string()))?
            .await
            .map_err(|e| Error::delivery_failed(&subject, e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            subject = %subject,
            payload_size = payload_size,
            "Published router message"
        );

        Ok(())
    }
}

#[async_trait::async_trait]
impl Publisher for RouterPublisher {
    async fn publish(&self, route: Route, message: &RouterMessage) -> usagehub_core::Result<()> {
        self.publish_json(Self::subject(route), message)
            .await
            .map_err(usagehub_core::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_mapping() {
        assert_eq!(RouterPublisher::subject(Route::Ingest), "usagehub.router.ingest");
        assert_eq!(
            RouterPublisher::subject(Route::SpreadsheetReport),
            "usagehub.router.spreadsheet"
        );
        assert_eq!(RouterPublisher::subject(Route::Replay), "usagehub.router.replay");
    }

    #[test]
    fn test_subjects_fall_under_stream_root() {
        for route in [Route::Ingest, Route::SpreadsheetReport, Route::Replay] {
            assert!(RouterPublisher::subject(route).starts_with("usagehub.router."));
        }
    }
}
