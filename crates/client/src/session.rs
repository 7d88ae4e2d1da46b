use std::fmt;
use std::future::Future;
use std::sync::Arc;

use datafusion::prelude::{SessionConfig, SessionContext};
use dfe_common::{DfeError, EngineConfig, Result, SessionId};
use tokio::runtime::{Builder, Runtime};

pub type SharedSession = Arc<Session>;

/// Engine state behind one [`crate::Engine`].
///
/// Data frames hold a [`SharedSession`] so the runtime they execute on stays
/// alive until the last frame is released, even if the engine is closed first.
pub struct Session {
    pub id: SessionId,
    pub config: EngineConfig,
    pub context: SessionContext,
    runtime: Runtime,
}

impl Session {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let id = SessionId::next();
        let runtime = build_runtime(id, &config)?;
        let context = SessionContext::new_with_config(session_config(&config));
        Ok(Self {
            id,
            config,
            context,
            runtime,
        })
    }

    /// Drives `future` to completion on this session's runtime.
    ///
    /// Must not be called from inside an async context.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn build_runtime(id: SessionId, config: &EngineConfig) -> Result<Runtime> {
    let mut builder = Builder::new_multi_thread();
    builder
        .enable_all()
        .thread_name(format!("dfe-{}", id.0));
    if config.worker_threads > 0 {
        builder.worker_threads(config.worker_threads);
    }
    builder
        .build()
        .map_err(|e| DfeError::Allocation(format!("runtime for {id}: {e}")))
}

fn session_config(config: &EngineConfig) -> SessionConfig {
    let mut out = SessionConfig::new()
        .with_batch_size(config.batch_size_rows)
        .with_information_schema(config.information_schema)
        .with_default_catalog_and_schema(&config.default_catalog, &config.default_schema);
    if config.target_partitions > 0 {
        out = out.with_target_partitions(config.target_partitions);
    }
    out
}
