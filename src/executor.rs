//! Execution seam.
//!
//! Sending a finished document to a backend and streaming its rows back is
//! the job of an [`Executor`]. The crate only ships [`StaticExecutor`], which
//! serves rows from memory, and [`UnconfiguredExecutor`], the default for a
//! context nobody wired a transport into.

use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tracing::debug;

use crate::{document::Document, query::QueryKind};

/// Raw rows, consumed lazily.
pub type RowStream = Box<dyn Iterator<Item = Result<serde_json::Value, ExecutionError>> + Send>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("no executor configured for this context")]
    NotConfigured,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend reported errors: {0}")]
    Backend(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

pub trait Executor: Send + Sync {
    /// Runs `document` and returns its rows. `kind` tells the executor
    /// whether the caller wants a single row or a sequence.
    fn execute(&self, document: &Document, kind: QueryKind) -> Result<RowStream, ExecutionError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredExecutor;

impl Executor for UnconfiguredExecutor {
    fn execute(&self, _document: &Document, _kind: QueryKind) -> Result<RowStream, ExecutionError> {
        Err(ExecutionError::NotConfigured)
    }
}

/// Serves a fixed set of rows for every execution.
#[derive(Debug, Default)]
pub struct StaticExecutor {
    rows: Vec<serde_json::Value>,
    executions: AtomicUsize,
}

impl StaticExecutor {
    pub fn new(rows: Vec<serde_json::Value>) -> Self {
        StaticExecutor {
            rows,
            executions: AtomicUsize::new(0),
        }
    }

    /// Rows from JSON text: an array is one row per element, anything else
    /// is a single row.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let rows = match serde_json::from_str(json)? {
            serde_json::Value::Array(rows) => rows,
            row => vec![row],
        };
        Ok(Self::new(rows))
    }

    /// Number of times [`Executor::execute`] has been called.
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

impl Executor for StaticExecutor {
    fn execute(&self, document: &Document, kind: QueryKind) -> Result<RowStream, ExecutionError> {
        let run = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(run, ?kind, query_len = document.text.len(), rows = self.rows.len(), "serving static rows");

        let rows = match kind {
            QueryKind::Item => self.rows.iter().take(1).cloned().collect::<Vec<_>>(),
            QueryKind::Collection => self.rows.clone(),
        };
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}
