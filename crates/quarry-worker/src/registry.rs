// Executor registry for per-job-type extraction logic
// Decision: factory functions allow one worker binary to host several job
// families; the runtime itself only ever sees the JobExecutor trait
// Decision: builder pattern for fluent registration

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use quarry_core::JobExecutor;

/// Factory function producing the executor for one job type.
pub type ExecutorFactory = Box<dyn Fn() -> Arc<dyn JobExecutor> + Send + Sync>;

/// Registry that maps job-type names to their executor factories.
///
/// # Example
///
/// ```ignore
/// let registry = ExecutorRegistry::builder()
///     .executor("noop", || Arc::new(NoopExecutor))
///     .build();
///
/// let executor = registry.create("noop")?;
/// ```
pub struct ExecutorRegistry {
    factories: HashMap<&'static str, ExecutorFactory>,
}

impl ExecutorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with the built-in `noop` smoke executor registered
    pub fn with_defaults() -> Self {
        Self::builder()
            .executor("noop", || Arc::new(crate::executors::NoopExecutor))
            .build()
    }

    /// Register an executor factory for a job type
    pub fn register(&mut self, job_type: &'static str, factory: ExecutorFactory) {
        self.factories.insert(job_type, factory);
    }

    /// Create the executor for a job type
    ///
    /// # Errors
    ///
    /// Returns an error if the job type is not registered.
    pub fn create(&self, job_type: &str) -> Result<Arc<dyn JobExecutor>> {
        let factory = self.factories.get(job_type).ok_or_else(|| {
            anyhow!(
                "Unknown job type: '{}'. Registered types: {:?}",
                job_type,
                self.types()
            )
        })?;
        Ok(factory())
    }

    /// Check if a job type is registered
    pub fn has(&self, job_type: &str) -> bool {
        self.factories.contains_key(job_type)
    }

    /// Get all registered job types
    pub fn types(&self) -> Vec<&str> {
        self.factories.keys().copied().collect()
    }

    /// Create a builder for fluent registration
    pub fn builder() -> ExecutorRegistryBuilder {
        ExecutorRegistryBuilder::new()
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("job_types", &self.types())
            .finish()
    }
}

/// Builder for creating an ExecutorRegistry with a fluent API.
pub struct ExecutorRegistryBuilder {
    registry: ExecutorRegistry,
}

impl ExecutorRegistryBuilder {
    /// Create a new builder with an empty registry
    pub fn new() -> Self {
        Self {
            registry: ExecutorRegistry::new(),
        }
    }

    /// Register an executor constructor for a job type
    pub fn executor<F, E>(mut self, job_type: &'static str, make: F) -> Self
    where
        F: Fn() -> Arc<E> + Send + Sync + 'static,
        E: JobExecutor + 'static,
    {
        self.registry.register(
            job_type,
            Box::new(move || {
                let executor: Arc<dyn JobExecutor> = make();
                executor
            }),
        );
        self
    }

    /// Build the registry
    pub fn build(self) -> ExecutorRegistry {
        self.registry
    }
}

impl Default for ExecutorRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
