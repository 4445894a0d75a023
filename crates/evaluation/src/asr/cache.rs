use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use super::AsrBackend;
use crate::error::EvaluationError;

/// Loads a language-specific acoustic backend. A trait so tests can supply
/// scripted loaders and deployments can choose the ONNX implementation.
pub trait AcousticModelLoader: Send + Sync + 'static {
    fn load(&self, language: &str) -> Result<Arc<dyn AsrBackend>, EvaluationError>;
}

/// Loader that always reports the acoustic tier as unavailable. Used by
/// builds without an acoustic backend compiled in; the evaluator propagates
/// the load error and the affected job fails.
pub struct UnavailableAcousticLoader;

impl AcousticModelLoader for UnavailableAcousticLoader {
    fn load(&self, language: &str) -> Result<Arc<dyn AsrBackend>, EvaluationError> {
        Err(EvaluationError::ModelLoad(format!(
            "no acoustic model backend is available for '{language}'"
        )))
    }
}

/// Per-language acoustic model cache: lazy-load on first use, retained for
/// the lifetime of the owning engine, never evicted (the supported-language
/// set is small). Owned by the evaluator and injected at construction.
pub struct AcousticModelCache {
    models: DashMap<String, Arc<dyn AsrBackend>>,
    loader: Arc<dyn AcousticModelLoader>,
}

impl AcousticModelCache {
    pub fn new(loader: Arc<dyn AcousticModelLoader>) -> Self {
        Self {
            models: DashMap::new(),
            loader,
        }
    }

    /// Returns the backend for `language`, loading it on first use.
    pub fn get_or_load(&self, language: &str) -> Result<Arc<dyn AsrBackend>, EvaluationError> {
        if let Some(backend) = self.models.get(language) {
            return Ok(backend.clone());
        }

        let backend = self.loader.load(language)?;
        info!(language, backend = backend.name(), "Acoustic model loaded");
        self.models.insert(language.to_string(), backend.clone());
        Ok(backend)
    }

    /// Number of models currently resident.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::asr::{AsrRequest, TranscriptionResult};

    struct NullBackend(String);

    #[async_trait]
    impl AsrBackend for NullBackend {
        async fn transcribe(
            &self,
            _request: AsrRequest,
        ) -> Result<TranscriptionResult, EvaluationError> {
            Ok(TranscriptionResult {
                text: String::new(),
                language: Some(self.0.clone()),
                confidence: None,
            })
        }

        fn name(&self) -> &str {
            "null"
        }

        fn supports_language(&self, lang: &str) -> bool {
            lang == self.0
        }
    }

    struct CountingLoader(Arc<AtomicUsize>);

    impl AcousticModelLoader for CountingLoader {
        fn load(&self, language: &str) -> Result<Arc<dyn AsrBackend>, EvaluationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullBackend(language.to_string())))
        }
    }

    #[test]
    fn test_loads_once_per_language() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = AcousticModelCache::new(Arc::new(CountingLoader(loads.clone())));

        cache.get_or_load("hi").unwrap();
        cache.get_or_load("hi").unwrap();
        cache.get_or_load("ta").unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_load_failure_is_not_cached() {
        let cache = AcousticModelCache::new(Arc::new(UnavailableAcousticLoader));

        assert!(cache.get_or_load("hi").is_err());
        assert!(cache.is_empty());
    }
}
