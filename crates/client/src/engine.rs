use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_schema::SchemaRef;
use datafusion::datasource::MemTable;
use dfe_common::{DfeError, EngineConfig, Result, SessionId};
use tracing::{debug, info, warn};

use crate::error_slot::ErrorSlot;
use crate::options::{CsvOptions, ParquetOptions};
use crate::session::{Session, SharedSession};
use crate::DataFrame;

/// A query session: the entry point for planning SQL and registering tables.
///
/// An engine is exclusively owned. It is released exactly once, explicitly via
/// [`Engine::close`] or when it goes out of scope; a closed engine cannot be
/// used again:
///
/// ```compile_fail
/// use dfe_client::Engine;
/// use dfe_common::EngineConfig;
///
/// let engine = Engine::new(EngineConfig::default()).unwrap();
/// engine.close();
/// let _ = engine.sql("SELECT 1");
/// ```
///
/// Data frames produced by an engine are independent handles; they can be
/// released before or after the engine.
///
/// Every method blocks on the session's own tokio runtime, so none of them
/// may be called from inside an async context; doing so panics. The same
/// holds for dropping the last handle of a session, which shuts the runtime
/// down.
#[derive(Debug)]
pub struct Engine {
    session: SharedSession,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let session = Arc::new(Session::new(config)?);
        info!(session = %session.id, "session created");
        Ok(Self { session })
    }

    /// Creates a session with default config. Construction failure is
    /// reported only by the absence of an engine; the cause is logged.
    pub fn create() -> Option<Self> {
        match Self::new(EngineConfig::default()) {
            Ok(engine) => Some(engine),
            Err(err) => {
                warn!(error = %err, "session creation failed");
                None
            }
        }
    }

    pub fn id(&self) -> SessionId {
        self.session.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.session.config
    }

    /// Parses and plans `query`. Nothing is executed yet except DDL, which the
    /// engine applies eagerly.
    ///
    /// Unknown tables and columns are resolved here, so they fail at this
    /// call rather than at materialization.
    pub fn sql(&self, query: &str) -> Result<DataFrame> {
        debug!(session = %self.session.id, sql = query, "submitting sql");
        let planned = self.session.block_on(self.session.context.sql(query));
        match planned {
            Ok(frame) => Ok(DataFrame::new(self.session.clone(), frame)),
            Err(err) => {
                let err = DfeError::from(err);
                debug!(session = %self.session.id, code = err.code().name(), error = %err, "sql rejected");
                Err(err)
            }
        }
    }

    /// Slot-style [`Engine::sql`]: on failure no frame is returned and `error`
    /// holds the reason. The engine stays usable for further submissions.
    pub fn submit_sql(&self, query: &str, error: &mut ErrorSlot) -> Option<DataFrame> {
        error.capture(self.sql(query))
    }

    /// Registers a CSV file or directory as table `name`.
    pub fn register_csv(&self, name: &str, path: &str, options: &CsvOptions) -> Result<()> {
        let read_options = options.to_read_options();
        self.session
            .block_on(self.session.context.register_csv(name, path, read_options))?;
        info!(session = %self.session.id, table = name, path, "csv table registered");
        Ok(())
    }

    /// Registers a parquet file or directory as table `name`.
    pub fn register_parquet(
        &self,
        name: &str,
        path: &str,
        options: &ParquetOptions,
    ) -> Result<()> {
        let read_options = options.to_read_options();
        self.session.block_on(
            self.session
                .context
                .register_parquet(name, path, read_options),
        )?;
        info!(session = %self.session.id, table = name, path, "parquet table registered");
        Ok(())
    }

    /// Registers in-memory batches as table `name`. All batches must match
    /// `schema`.
    pub fn register_batches(
        &self,
        name: &str,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<()> {
        let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
        let table = MemTable::try_new(schema, vec![batches])?;
        self.session.context.register_table(name, Arc::new(table))?;
        info!(session = %self.session.id, table = name, rows, "memory table registered");
        Ok(())
    }

    /// Removes table `name`. Returns whether a table was registered under it.
    pub fn deregister(&self, name: &str) -> Result<bool> {
        let removed = self.session.context.deregister_table(name)?.is_some();
        debug!(session = %self.session.id, table = name, removed, "table deregistered");
        Ok(removed)
    }

    pub fn has_table(&self, name: &str) -> Result<bool> {
        Ok(self.session.context.table_exist(name)?)
    }

    /// Releases the session. Equivalent to dropping it.
    pub fn close(self) {}
}

impl Drop for Engine {
    fn drop(&mut self) {
        info!(
            session = %self.session.id,
            frames_alive = Arc::strong_count(&self.session) - 1,
            "session released"
        );
    }
}
