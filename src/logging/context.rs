//! Attributes carried along with a unit of work.

use super::attr::{Arg, Attr, args_to_attrs};
use std::sync::Arc;

/// Immutable list of ambient attributes included in every record logged with it.
///
/// Extending a context returns a new one and leaves the original untouched, so
/// sibling branches never see each other's attributes.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    attrs: Arc<Vec<Attr>>,
}

impl LogContext {
    /// Context with no attributes.
    pub fn background() -> Self {
        Self::default()
    }

    /// A child context with `args` appended after the current attributes.
    pub fn with(&self, args: Vec<Arg>) -> Self {
        self.with_attrs(args_to_attrs(args))
    }

    pub fn with_attrs(&self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        let mut extended = Vec::clone(&self.attrs);
        extended.extend(attrs);
        Self {
            attrs: Arc::new(extended),
        }
    }

    /// Attributes in the order they were attached.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }
}
