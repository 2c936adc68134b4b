//! Node values.
//!
//! A node's value is an open trait object: the engine only needs the keys it
//! registers under and whether it opens a scope. Clients downcast through
//! [`AsAny`] to read their own types back.

use std::any::Any;
use std::fmt;

use smallvec::SmallVec;
use weft_ir::{Key, StringInterner};

/// Upcast to `&dyn Any` for downcasting trait objects.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Keys a value registers under. Most values have one or two.
pub type Keys = SmallVec<[Key; 2]>;

/// Semantic identity of a node.
pub trait Value: AsAny + Send + Sync + fmt::Debug + 'static {
    /// Short kind name, used in dumps and unresolved reports.
    fn kind(&self) -> &'static str;

    /// Keys this node is registered under when created.
    ///
    /// `text` is the source text under the node's span.
    fn keys(&self, text: &str, interner: &StringInterner) -> Keys {
        let _ = (text, interner);
        Keys::new()
    }

    /// Whether the node's span delimits a scope for variables.
    fn opens_scope(&self) -> bool {
        false
    }

    /// One-line rendering for dumps and tree printing.
    fn describe(&self, text: &str, interner: &StringInterner) -> String {
        let _ = (text, interner);
        self.kind().to_owned()
    }
}

impl dyn Value {
    /// Downcast to a concrete value type.
    pub fn downcast_ref<T: Value>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Value>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Root value of every loaded source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRoot;

impl Value for SourceRoot {
    fn kind(&self) -> &'static str {
        "source"
    }

    fn opens_scope(&self) -> bool {
        true
    }
}
