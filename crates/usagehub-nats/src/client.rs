//! NATS client connection management and configuration.

use std::time::Duration;

use async_nats::{Client, ConnectOptions, jetstream};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::{Error, Result, TRACING_TARGET};

/// Connection settings for the NATS broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatsConfig {
    /// Server URLs (`nats://` or `tls://`).
    pub servers: Vec<String>,
    /// Client name reported to the broker.
    pub name: String,
    /// Connection establishment timeout.
    #[serde(default = "NatsConfig::default_connect_timeout")]
    pub connect_timeout: Duration,
    /// Username for user/password authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Password for user/password authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl NatsConfig {
    fn default_connect_timeout() -> Duration {
        Duration::from_secs(5)
    }

    /// Minimal configuration for a named client against one server.
    pub fn new(server: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            servers: vec![server.into()],
            name: name.into(),
            connect_timeout: Self::default_connect_timeout(),
            user: None,
            password: None,
        }
    }
}

/// NATS client wrapper with a JetStream context.
#[derive(Debug, Clone)]
pub struct NatsClient {
    client: Client,
    jetstream: jetstream::Context,
    config: NatsConfig,
}

impl NatsClient {
    /// Connects to the broker and initializes JetStream.
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        tracing::info!(
            target: TRACING_TARGET,
            servers = ?config.servers,
            name = %config.name,
            "Connecting to NATS"
        );

        let mut connect_opts = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout);

        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            connect_opts = connect_opts.user_and_password(user.clone(), password.clone());
        }

        let client = timeout(
            config.connect_timeout,
            async_nats::connect_with_options(config.servers.join(","), connect_opts),
        )
        .await
        .map_err(|_| Error::Timeout {
            timeout: config.connect_timeout,
        })?
        .map_err(|e| Error::Connection(Box::new(e)))?;

        let jetstream = jetstream::new(client.clone());

        let server_info = client.server_info();
        tracing::info!(
            target: TRACING_TARGET,
            server_host = %server_info.host,
            server_version = %server_info.version,
            "Connected to NATS"
        );

        Ok(Self {
            client,
            jetstream,
            config,
        })
    }

    /// Returns the underlying NATS client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the JetStream context.
    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }

    /// Returns the configuration.
    pub fn config(&self) -> &NatsConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = NatsConfig::new("nats://localhost:4222", "usagehub");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.user.is_none());
    }
}
