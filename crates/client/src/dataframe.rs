use std::io::Write;

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use arrow_schema::SchemaRef;
use datafusion::dataframe::DataFrame as EngineFrame;
use dfe_common::{FrameId, Result, SessionId};
use futures::TryStreamExt;
use tracing::{debug, info_span};

use crate::error_slot::ErrorSlot;
use crate::session::SharedSession;

/// Owned handle to a planned, not yet executed, query result.
///
/// Submitting SQL only plans it; nothing runs until [`DataFrame::collect`],
/// [`DataFrame::show`] or one of their variants is called, so execution-time
/// failures surface there. Every call re-executes the plan.
///
/// The handle is released exactly once, either explicitly via
/// [`DataFrame::release`] or when it goes out of scope.
///
/// Materializing methods block on the session's own runtime and panic when
/// called from inside an async context. Dropping the last handle of a closed
/// session shuts that runtime down, which panics there as well.
#[derive(Debug)]
pub struct DataFrame {
    id: FrameId,
    session: SharedSession,
    inner: EngineFrame,
}

impl DataFrame {
    pub(crate) fn new(session: SharedSession, inner: EngineFrame) -> Self {
        let id = FrameId::next();
        debug!(frame = %id, session = %session.id, "data frame created");
        Self { id, session, inner }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Session that planned this frame.
    pub fn session_id(&self) -> SessionId {
        self.session.id
    }

    /// Output schema of the plan. Available without executing it.
    pub fn schema(&self) -> SchemaRef {
        SchemaRef::new(self.inner.schema().as_arrow().clone())
    }

    /// Indented logical plan, for `--plan` style output.
    pub fn logical_plan_display(&self) -> String {
        self.inner.logical_plan().display_indent().to_string()
    }

    /// Executes the plan and gathers all record batches.
    pub fn collect(&self) -> Result<Vec<RecordBatch>> {
        let _span = info_span!("collect", frame = %self.id).entered();
        let batches = self.session.block_on(collect_frame(self.inner.clone()))?;
        debug!(
            frame = %self.id,
            batches = batches.len(),
            rows = batches.iter().map(RecordBatch::num_rows).sum::<usize>(),
            "data frame materialized"
        );
        Ok(batches)
    }

    /// Number of rows the plan produces.
    ///
    /// The engine may prune projected expressions before counting, so an
    /// expression that fails in [`DataFrame::collect`] can still be counted.
    pub fn count(&self) -> Result<usize> {
        let frame = self.inner.clone();
        Ok(self.session.block_on(frame.count())?)
    }

    /// Executes the plan and renders it as a text table.
    ///
    /// Honors `show_limit` from the session config. An empty result still
    /// renders the column header.
    pub fn render(&self) -> Result<String> {
        let _span = info_span!("render", frame = %self.id).entered();
        let frame = match self.session.config.show_limit {
            Some(limit) => self.inner.clone().limit(0, Some(limit))?,
            None => self.inner.clone(),
        };
        let mut batches = self.session.block_on(collect_frame(frame))?;
        if batches.iter().all(|b| b.num_rows() == 0) {
            batches = vec![RecordBatch::new_empty(self.schema())];
        }
        Ok(pretty_format_batches(&batches)?.to_string())
    }

    /// Executes the plan and writes the rendered table to `out`.
    pub fn show_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let rendered = self.render()?;
        writeln!(out, "{rendered}")?;
        out.flush()?;
        Ok(())
    }

    /// Executes the plan and prints the rendered table to standard output.
    pub fn show(&self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.show_to(&mut lock)
    }

    /// Slot-style [`DataFrame::show`]: returns `false` and fills `error` on
    /// failure. The frame stays valid either way.
    pub fn materialize_and_show(&self, error: &mut ErrorSlot) -> bool {
        error.capture(self.show()).is_some()
    }

    /// Releases the handle. Equivalent to dropping it.
    pub fn release(self) {}
}

impl Drop for DataFrame {
    fn drop(&mut self) {
        debug!(frame = %self.id, session = %self.session.id, "data frame released");
    }
}

async fn collect_frame(frame: EngineFrame) -> Result<Vec<RecordBatch>> {
    let stream = frame.execute_stream().await?;
    let batches = stream.try_collect::<Vec<_>>().await?;
    Ok(batches)
}
