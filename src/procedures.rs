//! Grounded procedures: host callables referenced by name from the graph.
//!
//! A grounded node name has the form `lang:[module.]function`, for example
//! `py:foobar` or `rs:math.double`. Without an explicit module the
//! space's configured default module is used. Procedures are registered
//! per `(lang, module, function)` and resolved when an atom naming them is
//! evaluated or executed, never at construction time.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::model::{Handle, Value};
use crate::storage::{MemoryBackend, StorageBackend};
use crate::{AtomSpace, Error, Result};

/// A registered procedure. Receives the calling space and the (already
/// executed) argument handles.
pub type Procedure<B = MemoryBackend> =
    Arc<dyn Fn(&AtomSpace<B>, &[Handle]) -> Result<Value> + Send + Sync>;

// ============================================================================
// Schema names
// ============================================================================

/// Parsed grounded-procedure name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRef {
    pub lang: String,
    pub module: String,
    pub function: String,
}

impl SchemaRef {
    /// Split `lang:rest` into its two halves.
    pub fn split(name: &str) -> Result<(&str, &str)> {
        match name.split_once(':') {
            Some((lang, rest)) if !lang.is_empty() && !rest.is_empty() => Ok((lang, rest)),
            _ => Err(Error::Validation(format!(
                "Expecting a grounded name of the form 'lang:function', got '{name}'"
            ))),
        }
    }

    pub fn parse(name: &str, default_module: &str) -> Result<Self> {
        let (lang, rest) = Self::split(name)?;
        let (module, function) = match rest.rsplit_once('.') {
            Some((module, function)) if !module.is_empty() && !function.is_empty() => (module, function),
            _ => (default_module, rest),
        };
        Ok(Self {
            lang: lang.to_string(),
            module: module.to_string(),
            function: function.to_string(),
        })
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.lang, self.module, self.function)
    }
}

// ============================================================================
// Registry
// ============================================================================

type Module<B> = HashMap<String, Procedure<B>>;

/// lang → module → function → procedure
pub struct ProcedureRegistry<B: StorageBackend = MemoryBackend> {
    namespaces: HashMap<String, HashMap<String, Module<B>>>,
}

impl<B: StorageBackend> ProcedureRegistry<B> {
    pub fn new() -> Self {
        Self { namespaces: HashMap::new() }
    }

    /// Register `f` under `lang:module.function`, replacing any previous
    /// registration. Returns true if one was replaced.
    pub fn register<F>(&mut self, lang: &str, module: &str, function: &str, f: F) -> bool
    where
        F: Fn(&AtomSpace<B>, &[Handle]) -> Result<Value> + Send + Sync + 'static,
    {
        self.namespaces
            .entry(lang.to_string())
            .or_default()
            .entry(module.to_string())
            .or_default()
            .insert(function.to_string(), Arc::new(f))
            .is_some()
    }

    /// Remove a registration. Returns true if it existed.
    pub fn unregister(&mut self, schema: &SchemaRef) -> bool {
        self.namespaces
            .get_mut(&schema.lang)
            .and_then(|modules| modules.get_mut(&schema.module))
            .and_then(|module| module.remove(&schema.function))
            .is_some()
    }

    pub fn contains(&self, schema: &SchemaRef) -> bool {
        self.lookup(schema).is_some()
    }

    /// Find the procedure for `schema`, or fail with a resolution error
    /// naming the function and module.
    pub fn resolve(&self, schema: &SchemaRef) -> Result<Procedure<B>> {
        self.lookup(schema).cloned().ok_or_else(|| {
            Error::Resolution(format!(
                "'{}' not found in module '{}' (schema {schema})",
                schema.function, schema.module
            ))
        })
    }

    fn lookup(&self, schema: &SchemaRef) -> Option<&Procedure<B>> {
        self.namespaces
            .get(&schema.lang)?
            .get(&schema.module)?
            .get(&schema.function)
    }

    /// Every registered procedure, sorted.
    pub fn names(&self) -> Vec<SchemaRef> {
        let mut out: Vec<SchemaRef> = self
            .namespaces
            .iter()
            .flat_map(|(lang, modules)| {
                modules.iter().flat_map(move |(module, funcs)| {
                    funcs.keys().map(move |function| SchemaRef {
                        lang: lang.clone(),
                        module: module.clone(),
                        function: function.clone(),
                    })
                })
            })
            .collect();
        out.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        out
    }

    pub fn len(&self) -> usize {
        self.namespaces
            .values()
            .flat_map(|modules| modules.values())
            .map(|funcs| funcs.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<B: StorageBackend> Default for ProcedureRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: StorageBackend> fmt::Debug for ProcedureRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureRegistry")
            .field("procedures", &self.names().iter().map(ToString::to_string).collect::<Vec<_>>())
            .finish()
    }
}
