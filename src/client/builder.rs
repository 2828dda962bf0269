//! Builder for the assistant client.

use std::sync::Arc;

use secrecy::SecretString;

use crate::arbitration::{ModelArbitrator, ModelSwitchObserver};
use crate::auth::ApiKeyAuthManager;
use crate::cache::ResponseCache;
use crate::config::AssistConfig;
use crate::context::{ContextManager, ImportanceEstimator};
use crate::error::GeminiResult;
use crate::reliability::NetworkReliabilityService;
use crate::resilience::{ResilienceOrchestrator, RetryObserver};
use crate::transport::{HttpTransport, ReqwestTransport, RequestBuilder};

use super::client::AssistClient;

/// Builder for `AssistClient`.
///
/// Every collaborator is injectable: tests swap the transport for a
/// mock, and callers can plug in an importance estimator or observers
/// without any global registration.
#[derive(Default)]
pub struct AssistClientBuilder {
    config: Option<AssistConfig>,
    api_key: Option<SecretString>,
    transport: Option<Arc<dyn HttpTransport>>,
    importance_estimator: Option<Arc<dyn ImportanceEstimator>>,
    model_switch_observer: Option<Arc<dyn ModelSwitchObserver>>,
    retry_observer: Option<Arc<dyn RetryObserver>>,
}

impl AssistClientBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a fully constructed configuration.
    pub fn config(mut self, config: AssistConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the API key (shortcut for a default configuration).
    pub fn api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Overrides the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Plugs in an importance estimator for context ranking.
    pub fn importance_estimator(mut self, estimator: Arc<dyn ImportanceEstimator>) -> Self {
        self.importance_estimator = Some(estimator);
        self
    }

    /// Attaches a model-switch observer.
    pub fn model_switch_observer(mut self, observer: Arc<dyn ModelSwitchObserver>) -> Self {
        self.model_switch_observer = Some(observer);
        self
    }

    /// Attaches a retry observer.
    pub fn retry_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.retry_observer = Some(observer);
        self
    }

    /// Builds the client.
    ///
    /// Configuration resolution order: explicit config, explicit API
    /// key, then the environment.
    pub fn build(self) -> GeminiResult<AssistClient> {
        let config = match (self.config, self.api_key) {
            (Some(config), _) => config,
            (None, Some(api_key)) => AssistConfig::builder().api_key(api_key).build()?,
            (None, None) => AssistConfig::from_env()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(
                config.fallback.default_timeout,
                config.connect_timeout,
            )?),
        };

        let auth_manager = ApiKeyAuthManager::from_config(&config);
        let request_builder = RequestBuilder::new(
            config.base_url.clone(),
            config.api_version.clone(),
            Box::new(auth_manager),
        );

        let mut resilience =
            ResilienceOrchestrator::new(config.retry.clone(), config.circuit_breaker.clone());
        if let Some(observer) = self.retry_observer {
            resilience = resilience.with_retry_observer(observer);
        }

        let cache = ResponseCache::new(config.cache.clone());
        let reliability = NetworkReliabilityService::new(config.fallback.clone());

        let context = match self.importance_estimator {
            Some(estimator) => ContextManager::with_estimator(estimator),
            None => ContextManager::new(),
        };

        let mut arbitrator = ModelArbitrator::new();
        if let Some(observer) = self.model_switch_observer {
            arbitrator = arbitrator.with_observer(observer);
        }

        Ok(AssistClient::from_parts(
            config,
            transport,
            request_builder,
            resilience,
            cache,
            reliability,
            context,
            arbitrator,
        ))
    }
}
