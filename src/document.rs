//! Query documents and the generator seam.
//!
//! A [`DocumentGenerator`] receives a node's name, arguments, ordered include
//! paths and optional selector, and produces the text and variables sent to
//! the backend. Merging overlapping include paths is the generator's
//! business; the resolver never does it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    ast::{Expr, Lambda},
    context::ContextConfig,
    query::QueryKind,
    resolver::{IncludePath, MethodInclude},
};

/// Bound query arguments, variable name → value.
pub type Arguments = BTreeMap<String, serde_json::Value>;

/// The text and variable bindings sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub text: String,
    pub variables: serde_json::Map<String, serde_json::Value>,
}

/// Read-only view of a query node handed to a [`DocumentGenerator`].
#[derive(Debug, Clone, Copy)]
pub struct DocumentRequest<'a> {
    pub name: &'a str,
    pub kind: QueryKind,
    pub arguments: &'a Arguments,
    pub includes: &'a [IncludePath],
    pub selector: Option<&'a Lambda>,
}

pub trait DocumentGenerator: Send + Sync {
    fn generate(&self, request: &DocumentRequest<'_>) -> Document;
}

/// How member names from projections are spelled in the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNaming {
    /// `Author.Books` stays `Author { Books }`
    #[default]
    AsIs,
    /// `Author.Books` becomes `author { books }`
    CamelCase,
}

impl FieldNaming {
    pub fn apply(self, name: &str) -> String {
        match self {
            FieldNaming::AsIs => name.to_string(),
            FieldNaming::CamelCase => lower_camel(name),
        }
    }
}

/// `Author` → `author`, `ID` → `id`, `URLPath` → `urlPath`.
fn lower_camel(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let upper_run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let lowered = match upper_run {
        0 => return name.to_string(),
        n if n == chars.len() => n,
        1 => 1,
        n => n - 1,
    };
    chars
        .iter()
        .enumerate()
        .flat_map(|(i, c)| {
            if i < lowered {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                vec![*c]
            }
        })
        .collect()
}

/// One field of a selection set, keyed by name and arguments.
#[derive(Debug, Default)]
struct Selection {
    fields: Vec<Field>,
}

#[derive(Debug)]
struct Field {
    name: String,
    arguments: Vec<(String, String)>,
    children: Selection,
}

impl Selection {
    fn insert(&mut self, chain: &[Field]) {
        let Some((first, rest)) = chain.split_first() else {
            return;
        };
        let position = self
            .fields
            .iter()
            .position(|f| f.name == first.name && f.arguments == first.arguments);
        let index = match position {
            Some(index) => index,
            None => {
                self.fields.push(Field {
                    name: first.name.clone(),
                    arguments: first.arguments.clone(),
                    children: Selection::default(),
                });
                self.fields.len() - 1
            }
        };
        self.fields[index].children.insert(rest);
    }

    fn render(&self, out: &mut String, depth: usize, indent: usize) {
        for field in &self.fields {
            out.push_str(&" ".repeat(depth * indent));
            field.render_head(out);
            if field.children.fields.is_empty() {
                out.push('\n');
            } else {
                out.push_str(" {\n");
                field.children.render(out, depth + 1, indent);
                out.push_str(&" ".repeat(depth * indent));
                out.push_str("}\n");
            }
        }
    }
}

impl Field {
    fn leaf(name: String) -> Self {
        Field {
            name,
            arguments: vec![],
            children: Selection::default(),
        }
    }

    fn render_head(&self, out: &mut String) {
        out.push_str(&self.name);
        if !self.arguments.is_empty() {
            let rendered: Vec<String> = self
                .arguments
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect();
            out.push('(');
            out.push_str(&rendered.join(", "));
            out.push(')');
        }
    }
}

/// Renders GraphQL query text.
///
/// - node arguments become typed variables (`$first: Int`) passed to the
///   root field;
/// - include paths are merged into one selection tree;
/// - operator segments become arguments of the field they follow
///   (`Comments.Take` with `count: 5` renders `Comments(take: 5)`);
/// - member chains read by the selector are added as fields.
#[derive(Debug, Clone)]
pub struct GraphQlGenerator {
    naming: FieldNaming,
    operation_name: Option<String>,
    indent: usize,
}

impl GraphQlGenerator {
    pub fn new() -> Self {
        Self::from_config(&ContextConfig::default())
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        GraphQlGenerator {
            naming: config.field_naming,
            operation_name: config.operation_name.clone(),
            indent: config.indent,
        }
    }

    fn operator_argument(&self, method: &MethodInclude) -> (String, String) {
        let key = lower_camel(&method.operator);
        let value = match method.arguments.iter().collect::<Vec<_>>().as_slice() {
            [] => "true".to_string(),
            [(_, literal)] => literal.to_string(),
            pairs => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(name, literal)| format!("{name}: {literal}"))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
        };
        (key, value)
    }

    /// Splits an include path into fields, folding operator segments into
    /// the arguments of the preceding field (or of the root field).
    fn include_chain(
        &self,
        include: &IncludePath,
        root_arguments: &mut Vec<(String, String)>,
    ) -> Vec<Field> {
        let mut chain: Vec<Field> = vec![];

        for (index, segment) in include.segments().enumerate() {
            let Some(method) = include.operator_at(index) else {
                chain.push(Field::leaf(self.naming.apply(segment)));
                continue;
            };
            let argument = self.operator_argument(method);
            match chain.last_mut() {
                Some(field) => field.arguments.push(argument),
                None if !root_arguments.contains(&argument) => root_arguments.push(argument),
                None => {}
            }
        }
        chain
    }

    fn render_variables(&self, arguments: &Arguments) -> String {
        let declared: Vec<String> = arguments
            .iter()
            .map(|(name, value)| format!("${name}: {}", variable_type(value)))
            .collect();
        if declared.is_empty() {
            String::new()
        } else {
            format!("({})", declared.join(", "))
        }
    }
}

impl Default for GraphQlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentGenerator for GraphQlGenerator {
    fn generate(&self, request: &DocumentRequest<'_>) -> Document {
        let mut root_arguments: Vec<(String, String)> = request
            .arguments
            .keys()
            .map(|name| (name.clone(), format!("${name}")))
            .collect();

        let mut selection = Selection::default();
        for include in request.includes {
            let chain = self.include_chain(include, &mut root_arguments);
            selection.insert(&chain);
        }

        if let Some(selector) = request.selector {
            for chain in selector_fields(selector) {
                let fields: Vec<Field> = chain
                    .iter()
                    .map(|name| Field::leaf(self.naming.apply(name)))
                    .collect();
                selection.insert(&fields);
            }
        }

        let root = Field {
            name: request.name.to_string(),
            arguments: root_arguments,
            children: selection,
        };

        let mut text = String::from("query");
        if let Some(operation) = &self.operation_name {
            text.push(' ');
            text.push_str(operation);
        }
        text.push_str(&self.render_variables(request.arguments));
        text.push_str(" {\n");
        Selection { fields: vec![root] }.render(&mut text, 1, self.indent);
        text.push_str("}\n");

        Document {
            text,
            variables: request
                .arguments
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

fn variable_type(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Bool(_) => "Boolean".to_string(),
        serde_json::Value::Number(n) if n.is_f64() => "Float".to_string(),
        serde_json::Value::Number(_) => "Int".to_string(),
        serde_json::Value::Array(items) => format!(
            "[{}]",
            items.first().map_or_else(|| "String".to_string(), variable_type)
        ),
        serde_json::Value::Object(_) => "JSON".to_string(),
        serde_json::Value::Null | serde_json::Value::String(_) => "String".to_string(),
    }
}

/// Member chains a selector reads from its row, in source order.
///
/// `p => { t: p.Title, c: p.Comments.Select(c => c.Body) }` reads
/// `[Title]`, `[Comments]` and `[Comments, Body]`.
pub fn selector_fields(selector: &Lambda) -> Vec<Vec<String>> {
    let mut out = vec![];
    if let Some(param) = selector.single_param() {
        let mut roots = vec![(param.to_string(), vec![])];
        collect_fields(&selector.body, &mut roots, &mut out);
    }
    out.retain(|chain| !chain.is_empty());
    out
}

fn chain_of(expr: &Expr, roots: &[(String, Vec<String>)]) -> Option<Vec<String>> {
    match expr {
        Expr::Identifier(name) => roots
            .iter()
            .rev()
            .find(|(root, _)| root == name)
            .map(|(_, prefix)| prefix.clone()),
        Expr::Member { object, name } => {
            let mut chain = chain_of(object, roots)?;
            chain.push(name.clone());
            Some(chain)
        }
        Expr::Index { object, .. } => chain_of(object, roots),
        _ => None,
    }
}

fn collect_fields(expr: &Expr, roots: &mut Vec<(String, Vec<String>)>, out: &mut Vec<Vec<String>>) {
    match expr {
        Expr::Identifier(_) | Expr::Member { .. } => match chain_of(expr, roots) {
            Some(chain) => out.push(chain),
            None => {
                if let Expr::Member { object, .. } = expr {
                    collect_fields(object, roots, out);
                }
            }
        },
        Expr::Index { object, index } => {
            collect_fields(object, roots, out);
            collect_fields(index, roots, out);
        }
        Expr::MethodCall { object, args, .. } => {
            let prefix = chain_of(object, roots);
            match &prefix {
                Some(chain) => out.push(chain.clone()),
                None => collect_fields(object, roots, out),
            }
            for arg in args {
                match (arg, &prefix) {
                    (Expr::Lambda(lambda), Some(chain)) => match lambda.single_param() {
                        Some(param) => {
                            roots.push((param.to_string(), chain.clone()));
                            collect_fields(&lambda.body, roots, out);
                            roots.pop();
                        }
                        None => collect_fields(&lambda.body, roots, out),
                    },
                    (Expr::Lambda(lambda), None) => collect_fields(&lambda.body, roots, out),
                    _ => collect_fields(arg, roots, out),
                }
            }
        }
        Expr::Lambda(lambda) => collect_fields(&lambda.body, roots, out),
        Expr::Not(operand) => collect_fields(operand, roots, out),
        Expr::BinaryOp { left, right, .. } => {
            collect_fields(left, roots, out);
            collect_fields(right, roots, out);
        }
        Expr::Object(pairs) => {
            for (_, value) in pairs {
                collect_fields(value, roots, out);
            }
        }
        Expr::Array(items) => {
            for item in items {
                collect_fields(item, roots, out);
            }
        }
        Expr::Float(_) | Expr::Integer(_) | Expr::String(_) | Expr::Boolean(_) | Expr::Null => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_camel_handles_acronyms() {
        assert_eq!(lower_camel("Author"), "author");
        assert_eq!(lower_camel("ID"), "id");
        assert_eq!(lower_camel("URLPath"), "urlPath");
        assert_eq!(lower_camel("title"), "title");
    }
}
