//! Selectors: domain groupings of routines.

use crate::error::ConvertError;
use crate::routine::{Routine, RoutineDecl};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Picks a routine for a requested format pair within one domain.
pub trait Selector: Send + Sync {
    /// Domain name, e.g. `Document` or `Image`.
    fn name(&self) -> &str;

    /// Check whether this selector holds a routine for `input -> output`.
    fn supports_conversion(&self, input: &str, output: &str) -> bool;

    /// Create the routine for `input -> output`.
    ///
    /// Fails with [`ConvertError::Unsupported`] when no routine matches.
    fn create_converter(&self, input: &str, output: &str)
    -> Result<Arc<dyn Routine>, ConvertError>;

    /// Declarations of the routines this selector can hand out.
    fn declarations(&self) -> Vec<&RoutineDecl> {
        Vec::new()
    }
}

/// A named set of routines, kept in registration order.
///
/// Selection is plain membership testing: the first registered routine that
/// supports the pair wins.
#[derive(Clone)]
pub struct RoutineSet {
    name: String,
    routines: IndexMap<String, Arc<dyn Routine>>,
}

impl RoutineSet {
    /// Create an empty set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routines: IndexMap::new(),
        }
    }

    /// Register a routine. Registering an existing id replaces it in place.
    pub fn register(&mut self, routine: impl Routine + 'static) {
        self.register_arc(Arc::new(routine));
    }

    /// Register a shared routine.
    pub fn register_arc(&mut self, routine: Arc<dyn Routine>) {
        let id = routine.decl().id.clone();
        self.routines.insert(id, routine);
    }

    /// Builder-style variant of [`RoutineSet::register`].
    pub fn with(mut self, routine: impl Routine + 'static) -> Self {
        self.register(routine);
        self
    }

    /// Get a routine by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Routine>> {
        self.routines.get(id).cloned()
    }

    /// Find the first routine supporting the pair.
    pub fn find(&self, input: &str, output: &str) -> Option<Arc<dyn Routine>> {
        self.routines
            .values()
            .find(|r| r.supports(input, output))
            .cloned()
    }

    /// Iterate over routines in registration order.
    pub fn routines(&self) -> impl Iterator<Item = &Arc<dyn Routine>> {
        self.routines.values()
    }

    /// Number of registered routines.
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

impl Selector for RoutineSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_conversion(&self, input: &str, output: &str) -> bool {
        self.routines.values().any(|r| r.supports(input, output))
    }

    fn create_converter(
        &self,
        input: &str,
        output: &str,
    ) -> Result<Arc<dyn Routine>, ConvertError> {
        debug!(selector = %self.name, "creating converter for {} -> {}", input, output);
        self.find(input, output)
            .ok_or_else(|| ConvertError::Unsupported {
                selector: self.name.clone(),
                input: input.to_string(),
                output: output.to_string(),
            })
    }

    fn declarations(&self) -> Vec<&RoutineDecl> {
        self.routines.values().map(|r| r.decl()).collect()
    }
}
