//! Data context used to resolve live-data tokens.
//!
//! The context is a read-only JSON tree. One [`ContextProvider`] owns the
//! current value; renderers take a snapshot for the duration of a pass and
//! the provider swaps in a whole new context when the sample data changes.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::json::read_json_file;

#[derive(Debug, Clone, PartialEq)]
pub struct DataContext(Value);

impl Default for DataContext {
    fn default() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }
}

impl DataContext {
    pub fn new(root: Value) -> Self {
        Self(root)
    }

    pub fn root(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(s)?))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let root = read_json_file(path)?;
        tracing::debug!("Loaded data context from {}", path.display());
        Ok(Self(root))
    }
}

impl From<Value> for DataContext {
    fn from(v: Value) -> Self {
        Self(v)
    }
}

/// Owner of the current data context.
#[derive(Debug, Default)]
pub struct ContextProvider {
    current: Arc<DataContext>,
}

impl ContextProvider {
    pub fn new(ctx: DataContext) -> Self {
        Self {
            current: Arc::new(ctx),
        }
    }

    /// Shared read-only view of the current context.
    pub fn snapshot(&self) -> Arc<DataContext> {
        Arc::clone(&self.current)
    }

    /// Replace the whole context. Existing snapshots keep the old value.
    pub fn replace(&mut self, ctx: DataContext) {
        self.current = Arc::new(ctx);
    }
}
