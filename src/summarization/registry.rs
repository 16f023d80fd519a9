//! Process-wide cache of summarization clients keyed by model identifier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{SummarizationClient, SummarizationClientError};

/// Creates a ready-to-use summarization client for a model.
///
/// Implementations may perform expensive work (model lookup, warm-up); the registry guarantees
/// that a successful creation happens at most once per model name.
#[async_trait]
pub trait SummarizerFactory: Send + Sync {
    /// Build a client for `model`.
    async fn create(
        &self,
        model: &str,
    ) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError>;
}

type Slot = Arc<OnceCell<Arc<dyn SummarizationClient>>>;

/// Lazily populated model cache with at-most-once initialization per model name.
///
/// Entries live for the lifetime of the registry and are never invalidated. A failed
/// initialization leaves the slot empty so the next request tries again.
pub struct ModelRegistry {
    factory: Arc<dyn SummarizerFactory>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl ModelRegistry {
    /// Create an empty registry that builds clients through `factory`.
    pub fn new(factory: Arc<dyn SummarizerFactory>) -> Self {
        Self {
            factory,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached client for `model`, initializing it on first use.
    pub async fn client(
        &self,
        model: &str,
    ) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
        let slot = self.slot(model);
        let client = slot
            .get_or_try_init(|| async {
                let client = self.factory.create(model).await?;
                tracing::info!(model, "Summarization model cached");
                Ok::<_, SummarizationClientError>(client)
            })
            .await?;
        Ok(client.clone())
    }

    /// Names of models that finished initialization.
    pub fn loaded_models(&self) -> Vec<String> {
        let slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn slot(&self, model: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots
            .entry(model.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarization::SummarizationRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoClient;

    #[async_trait]
    impl SummarizationClient for EchoClient {
        async fn generate_summary(
            &self,
            request: SummarizationRequest,
        ) -> Result<String, SummarizationClientError> {
            Ok(request.prompt)
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        calls: AtomicUsize,
        fail_first: bool,
    }

    #[async_trait]
    impl SummarizerFactory for CountingFactory {
        async fn create(
            &self,
            _model: &str,
        ) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_first && call == 0 {
                return Err(SummarizationClientError::ProviderUnavailable("cold".into()));
            }
            Ok(Arc::new(EchoClient))
        }
    }

    #[tokio::test]
    async fn concurrent_callers_initialize_once() {
        let factory = Arc::new(CountingFactory::default());
        let registry = Arc::new(ModelRegistry::new(factory.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.client("llama3.2").await.is_ok()
            }));
        }
        for handle in handles {
            assert!(handle.await.expect("join"));
        }

        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.loaded_models(), vec!["llama3.2".to_string()]);
    }

    #[tokio::test]
    async fn models_are_cached_independently() {
        let factory = Arc::new(CountingFactory::default());
        let registry = ModelRegistry::new(factory.clone());

        registry.client("a").await.expect("a");
        registry.client("b").await.expect("b");
        registry.client("a").await.expect("a again");

        assert_eq!(factory.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_initialization_is_retried() {
        let factory = Arc::new(CountingFactory {
            fail_first: true,
            ..CountingFactory::default()
        });
        let registry = ModelRegistry::new(factory.clone());

        assert!(registry.client("bart").await.is_err());
        assert!(registry.loaded_models().is_empty());
        assert!(registry.client("bart").await.is_ok());
        assert_eq!(factory.calls.load(Ordering::SeqCst), 2);
    }
}
