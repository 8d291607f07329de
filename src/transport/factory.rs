use super::{Backend, HttpBackend, MockBackend};
use crate::config::{BackendKind, Config};
use crate::core::AetherError;
use std::collections::HashMap;

type BackendCreator = Box<dyn Fn(&Config) -> Result<Box<dyn Backend>, AetherError> + Send + Sync>;

pub struct BackendFactory {
    creators: HashMap<BackendKind, BackendCreator>,
}

impl Default for BackendFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendFactory {
    pub fn new() -> Self {
        let mut creators = HashMap::new();

        creators.insert(
            BackendKind::Mock,
            Box::new(|config: &Config| {
                let backend =
                    MockBackend::new(config.mock.min_latency_ms, config.mock.max_latency_ms);
                Ok(Box::new(backend) as Box<dyn Backend>)
            }) as BackendCreator,
        );

        creators.insert(
            BackendKind::Http,
            Box::new(|config: &Config| {
                let backend = HttpBackend::new(config.endpoint())?;
                Ok(Box::new(backend) as Box<dyn Backend>)
            }) as BackendCreator,
        );

        Self { creators }
    }

    pub fn create(&self, config: &Config) -> Result<Box<dyn Backend>, AetherError> {
        tracing::info!(backend = ?config.backend, "creating backend");
        self.creators
            .get(&config.backend)
            .ok_or_else(|| AetherError::Config(format!("Backend not found: {:?}", config.backend)))
            .and_then(|creator| creator(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChatTransport;

    #[tokio::test]
    async fn creates_mock_backend_from_config() {
        let config = Config {
            mock: crate::config::MockConfig {
                min_latency_ms: 0,
                max_latency_ms: 0,
            },
            ..Config::default()
        };
        let backend = BackendFactory::new().create(&config).unwrap();
        // catalog delays still apply to the mock, so only check the chat path
        let request = crate::transport::ChatRequest {
            messages: Vec::new(),
            model: "gpt-4-turbo".into(),
            parameters: Default::default(),
        };
        let reply = backend.send(&request).await.unwrap();
        assert_eq!(reply.model.as_deref(), Some("gpt-4-turbo"));
    }

    #[test]
    fn creates_http_backend_from_config() {
        let config = Config {
            backend: BackendKind::Http,
            ..Config::default()
        };
        assert!(BackendFactory::new().create(&config).is_ok());
    }
}
