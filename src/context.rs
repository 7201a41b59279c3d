use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    document::{Arguments, DocumentGenerator, FieldNaming, GraphQlGenerator},
    executor::{Executor, UnconfiguredExecutor},
    operators::OperatorRegistry,
    query::{CollectionQuery, ItemQuery, Query},
};

/// Execution configuration carried by a [`Context`].
///
/// # Examples
///
/// ```
/// use navql::{ContextConfig, FieldNaming};
///
/// let config = ContextConfig::from_json_str(r#"{ "field_naming": "camel_case" }"#).unwrap();
/// assert_eq!(config.field_naming, FieldNaming::CamelCase);
/// assert_eq!(config.indent, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Backend endpoint, for executors that need one.
    pub endpoint: Option<String>,
    /// Operation name emitted after `query`.
    pub operation_name: Option<String>,
    pub field_naming: FieldNaming,
    /// Spaces per nesting level in generated text.
    pub indent: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            endpoint: None,
            operation_name: None,
            field_naming: FieldNaming::AsIs,
            indent: 2,
        }
    }
}

impl ContextConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Shared by every query node built from it: configuration, the registered
/// include operators, and the generator and executor collaborators.
pub struct Context {
    config: ContextConfig,
    operators: OperatorRegistry,
    generator: Arc<dyn DocumentGenerator>,
    executor: Arc<dyn Executor>,
}

impl Context {
    /// A context with the standard operators, a [`GraphQlGenerator`] built
    /// from `config`, and no executor.
    pub fn new(config: ContextConfig) -> Self {
        Context {
            generator: Arc::new(GraphQlGenerator::from_config(&config)),
            executor: Arc::new(UnconfiguredExecutor),
            operators: OperatorRegistry::standard(),
            config,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn DocumentGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_operators(mut self, operators: OperatorRegistry) -> Self {
        self.operators = operators;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn generator(&self) -> &dyn DocumentGenerator {
        self.generator.as_ref()
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    /// A single-result query on root field `name`.
    pub fn item<T>(self: &Arc<Self>, name: impl Into<String>) -> ItemQuery<T> {
        self.item_with(name, Arguments::new())
    }

    pub fn item_with<T>(self: &Arc<Self>, name: impl Into<String>, arguments: Arguments) -> ItemQuery<T> {
        Query::new(Arc::clone(self), name.into(), arguments)
    }

    /// A multi-result query on root field `name`.
    pub fn collection<T>(self: &Arc<Self>, name: impl Into<String>) -> CollectionQuery<T> {
        self.collection_with(name, Arguments::new())
    }

    pub fn collection_with<T>(
        self: &Arc<Self>,
        name: impl Into<String>,
        arguments: Arguments,
    ) -> CollectionQuery<T> {
        Query::new(Arc::clone(self), name.into(), arguments)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("operators", &self.operators)
            .finish_non_exhaustive()
    }
}
