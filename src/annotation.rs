//! Annotation functions.
//!
//! A `#@function <name>` line tags the key=value line right after it. The
//! named function receives the value and returns the values that replace it,
//! each becoming its own item under the original key.
//!
//! ```
//! use ini_directives::{AnnotationRegistry, Loader};
//! use std::sync::Arc;
//!
//! let registry = AnnotationRegistry::new().register_fn("split", |raw: &str| {
//!     raw.split(',').map(|s| s.trim().to_string()).collect()
//! });
//!
//! let ctx = Loader::builder()
//!     .with_annotations(Arc::new(registry))
//!     .load_str("#@function split\nhost = a, b, c\n")?;
//!
//! assert_eq!(ctx.get_values("", "host", 10), vec!["a", "b", "c"]);
//! # Ok::<(), ini_directives::Error>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Once;

/// Upper bound on the values one annotated line can expand into.
pub const MAX_ANNOTATION_VALUES: usize = 100;

/// A function that expands one annotated value into many.
pub trait Annotation: Send + Sync {
    /// Called once, before the first expansion through this registry.
    fn init(&self) {}

    /// Called once, when the registry is dropped.
    fn destroy(&self) {}

    /// Expands `raw` into at most `max_values` values.
    ///
    /// Returning no values means the expansion failed; the line then keeps
    /// its literal value.
    fn expand(&self, raw: &str, max_values: usize) -> Vec<String>;
}

struct FnAnnotation<F>(F);

impl<F> Annotation for FnAnnotation<F>
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn expand(&self, raw: &str, _max_values: usize) -> Vec<String> {
        (self.0)(raw)
    }
}

struct Registered {
    function: Box<dyn Annotation>,
    initialized: Once,
}

/// Named annotation functions available to a load.
///
/// Built once, then shared (typically behind an `Arc`) and never modified.
/// Dropping the last handle calls every function's
/// [`destroy`](Annotation::destroy).
#[derive(Default)]
#[must_use]
pub struct AnnotationRegistry {
    functions: HashMap<String, Registered>,
}

impl AnnotationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` under `name`, replacing any earlier registration.
    pub fn register(mut self, name: impl Into<String>, function: impl Annotation + 'static) -> Self {
        let name = name.into();
        let previous = self.functions.insert(
            name.clone(),
            Registered {
                function: Box::new(function),
                initialized: Once::new(),
            },
        );
        if previous.is_some() {
            tracing::warn!(function = %name, "annotation function registered twice, keeping the last one");
        }
        self
    }

    /// Registers a plain closure with no init or destroy hooks.
    pub fn register_fn<F>(self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        self.register(name, FnAnnotation(function))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Runs the function registered as `name` on `raw`.
    ///
    /// Returns `None` when no such function exists. The result holds at most
    /// [`MAX_ANNOTATION_VALUES`] values.
    pub fn expand(&self, name: &str, raw: &str) -> Option<Vec<String>> {
        let registered = self.functions.get(name)?;
        registered.initialized.call_once(|| registered.function.init());

        let mut values = registered.function.expand(raw, MAX_ANNOTATION_VALUES);
        if values.len() > MAX_ANNOTATION_VALUES {
            tracing::warn!(
                function = %name,
                returned = values.len(),
                "annotation function returned too many values, truncating"
            );
            values.truncate(MAX_ANNOTATION_VALUES);
        }
        Some(values)
    }
}

impl fmt::Debug for AnnotationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AnnotationRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl Drop for AnnotationRegistry {
    fn drop(&mut self) {
        for registered in self.functions.values() {
            registered.function.destroy();
        }
    }
}
