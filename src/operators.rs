//! Registered include operators.
//!
//! An include operator is a method that, inside an include expression, asks
//! the backend for a limited, filtered, or ordered sub-selection of a nested
//! collection (`x => x.Comments.Take(5)`). Only operators in the registry are
//! recognized by the resolver; every other method call makes the include
//! unsupported.

use thiserror::Error;

/// Name reserved for nested-collection projection.
pub const PROJECTION_METHOD: &str = "Select";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{0}` is reserved for nested-collection projection")]
    Reserved(String),

    #[error("operator `{0}` is already registered")]
    Duplicate(String),
}

/// A parameterized include operator and the names of its declared
/// parameters, in call order (the source collection is not counted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeOperator {
    name: String,
    parameters: Vec<String>,
}

impl IncludeOperator {
    pub fn new<I, S>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IncludeOperator {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    operators: Vec<IncludeOperator>,
}

impl OperatorRegistry {
    /// A registry with no operators; every method call is unsupported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `Take(count)`, `Skip(count)`, `First(count)`, `Where(filter)`,
    /// `OrderBy(field)` and `OrderByDescending(field)`.
    pub fn standard() -> Self {
        let operators = [
            ("Take", "count"),
            ("Skip", "count"),
            ("First", "count"),
            ("Where", "filter"),
            ("OrderBy", "field"),
            ("OrderByDescending", "field"),
        ]
        .into_iter()
        .map(|(name, param)| IncludeOperator::new(name, [param]))
        .collect();

        OperatorRegistry { operators }
    }

    pub fn register(&mut self, operator: IncludeOperator) -> Result<(), RegistryError> {
        if operator.name == PROJECTION_METHOD {
            return Err(RegistryError::Reserved(operator.name));
        }
        if self.get(&operator.name).is_some() {
            return Err(RegistryError::Duplicate(operator.name));
        }
        self.operators.push(operator);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&IncludeOperator> {
        self.operators.iter().find(|op| op.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IncludeOperator> {
        self.operators.iter()
    }
}
