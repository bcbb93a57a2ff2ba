//! Query-by-example compiler.
//!
//! Turns a partially populated entity template into a conjunctive equality
//! filter over the backing container: populated scalar fields become
//! `<container>.<field> = <literal>` clauses joined with `AND`; absent and
//! non-scalar fields are wildcards. An unconstrained filter is never valid,
//! so a template with zero scalar predicates refuses to compile.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use verdant_types::{Literal, ResourceError, ResourceResult};

pub use verdant_store::FilterQuery;

/// A partial entity: a typed mapping from field name to scalar literal.
///
/// Fields iterate in name order, so compilation is deterministic for a given
/// set of predicates.
#[derive(Debug, Clone, Default)]
pub struct Template {
    fields: BTreeMap<String, Literal>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate on a scalar field
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Literal>) {
        self.fields.insert(field.into(), value.into());
    }

    /// A template constraining only the key field
    pub fn key_only(key_field: &str, key: &str) -> Self {
        let mut template = Self::new();
        template.insert(key_field, key);
        template
    }

    /// Build a template from every populated scalar field of an entity.
    ///
    /// Follows the template rules: strings, integers and booleans become
    /// predicates; nulls are absent; nested objects, arrays and non-integral
    /// numbers are non-scalar and skipped.
    pub fn from_entity<V: Serialize>(value: &V) -> ResourceResult<Self> {
        let json = serde_json::to_value(value)?;
        let map = match json {
            Value::Object(map) => map,
            Value::Null => return Err(ResourceError::NotAnObject("null")),
            Value::Bool(_) => return Err(ResourceError::NotAnObject("boolean")),
            Value::Number(_) => return Err(ResourceError::NotAnObject("number")),
            Value::String(_) => return Err(ResourceError::NotAnObject("string")),
            Value::Array(_) => return Err(ResourceError::NotAnObject("array")),
        };

        let mut template = Self::new();
        for (field, value) in map {
            match value {
                Value::String(s) => template.insert(field, s),
                Value::Bool(b) => template.insert(field, b),
                Value::Number(n) => {
                    // Non-integral numbers are outside the closed literal set
                    if let Some(i) = n.as_i64() {
                        template.insert(field, i);
                    }
                }
                Value::Null | Value::Object(_) | Value::Array(_) => {}
            }
        }
        Ok(template)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compile into a filter query over `container`.
    ///
    /// Fails with [`ResourceError::EmptyTemplate`] when no scalar predicate
    /// is present — callers must always supply at least the key or another
    /// discriminating field.
    pub fn compile(&self, container: &str) -> ResourceResult<FilterQuery> {
        if self.fields.is_empty() {
            return Err(ResourceError::EmptyTemplate);
        }

        let rendered: Vec<String> = self
            .fields
            .iter()
            .map(|(field, literal)| {
                format!("{}.{} = {}", container, field, render_literal(literal))
            })
            .collect();

        let sql = format!("SELECT * FROM {} WHERE {}", container, rendered.join(" AND "));
        let clauses = self.fields.iter().map(|(f, l)| (f.clone(), l.clone())).collect();
        Ok(FilterQuery::new(container, clauses, sql))
    }
}

/// Render a literal for embedding in the filter grammar: string literals are
/// double-quoted and escaped, numeric and boolean literals are bare.
fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => format!("\"{}\"", escape_string(s)),
        Literal::Integer(i) => i.to_string(),
        Literal::Boolean(b) => b.to_string(),
    }
}

/// Escape every character that would terminate or continue past a
/// double-quoted string literal.
fn escape_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Serialize;
    use verdant_types::{Entity, Garden};

    #[test]
    fn key_template_compiles_to_exact_sql() {
        let template = Template::key_only("id", "x");
        let query = template.compile("c").unwrap();
        assert_eq!(query.sql(), "SELECT * FROM c WHERE c.id = \"x\"");
        assert_eq!(query.container(), "c");
        assert_eq!(query.clauses().len(), 1);
    }

    #[test]
    fn empty_template_refuses_to_compile() {
        let template = Template::new();
        let err = template.compile("c").unwrap_err();
        assert!(matches!(err, ResourceError::EmptyTemplate));
    }

    #[test]
    fn clauses_join_with_and_in_field_order() {
        let mut template = Template::new();
        template.insert("public", true);
        template.insert("account_id", "acct:1");
        template.insert("hardiness_zone", 7i64);

        let query = template.compile("gardens").unwrap();
        assert_eq!(
            query.sql(),
            "SELECT * FROM gardens WHERE gardens.account_id = \"acct:1\" \
             AND gardens.hardiness_zone = 7 AND gardens.public = true"
        );
    }

    #[test]
    fn numeric_and_boolean_literals_are_unquoted() {
        let mut template = Template::new();
        template.insert("planted_year", 2023i64);
        let query = template.compile("plants").unwrap();
        assert_eq!(query.sql(), "SELECT * FROM plants WHERE plants.planted_year = 2023");

        let mut template = Template::new();
        template.insert("active", false);
        let query = template.compile("accounts").unwrap();
        assert_eq!(query.sql(), "SELECT * FROM accounts WHERE accounts.active = false");
    }

    #[test]
    fn quote_characters_cannot_terminate_the_literal() {
        let mut template = Template::new();
        template.insert("name", "say \"hi\" AND c.x = 1");
        let query = template.compile("c").unwrap();
        assert_eq!(
            query.sql(),
            "SELECT * FROM c WHERE c.name = \"say \\\"hi\\\" AND c.x = 1\""
        );
    }

    #[test]
    fn backslashes_are_escaped() {
        let mut template = Template::new();
        template.insert("name", "a\\b");
        let query = template.compile("c").unwrap();
        assert_eq!(query.sql(), "SELECT * FROM c WHERE c.name = \"a\\\\b\"");
    }

    #[test]
    fn from_entity_flattens_scalar_fields() {
        let garden = Garden {
            id: "g1".to_string(),
            account_id: "a1".to_string(),
            name: "Back plot".to_string(),
            hardiness_zone: 7,
            public: true,
        };
        let template = Template::from_entity(&garden).unwrap();
        let query = template.compile(Garden::container()).unwrap();
        assert_eq!(
            query.sql(),
            "SELECT * FROM gardens WHERE gardens.account_id = \"a1\" \
             AND gardens.hardiness_zone = 7 AND gardens.id = \"g1\" \
             AND gardens.name = \"Back plot\" AND gardens.public = true"
        );
    }

    #[derive(Serialize)]
    struct WithNested {
        id: String,
        tags: Vec<String>,
        owner: Option<String>,
        dimensions: Dimensions,
    }

    #[derive(Serialize)]
    struct Dimensions {
        width: i64,
        depth: i64,
    }

    #[test]
    fn non_scalar_and_absent_fields_are_skipped() {
        let value = WithNested {
            id: "bed:1".to_string(),
            tags: vec!["raised".to_string()],
            owner: None,
            dimensions: Dimensions { width: 2, depth: 1 },
        };
        let template = Template::from_entity(&value).unwrap();
        let query = template.compile("beds").unwrap();
        assert_eq!(query.sql(), "SELECT * FROM beds WHERE beds.id = \"bed:1\"");
    }

    #[derive(Serialize)]
    struct OnlyNonScalar {
        tags: Vec<String>,
        owner: Option<String>,
    }

    #[test]
    fn only_non_scalar_fields_degenerates_to_empty_template() {
        let value = OnlyNonScalar { tags: vec![], owner: None };
        let template = Template::from_entity(&value).unwrap();
        let err = template.compile("beds").unwrap_err();
        assert!(matches!(err, ResourceError::EmptyTemplate));
    }

    #[test]
    fn non_object_values_are_rejected() {
        let err = Template::from_entity(&"just a string").unwrap_err();
        assert!(matches!(err, ResourceError::NotAnObject("string")));
        let err = Template::from_entity(&7i64).unwrap_err();
        assert!(matches!(err, ResourceError::NotAnObject("number")));
    }

    fn unescape(s: &str) -> Option<String> {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    _ => return None,
                },
                '"' => return None, // bare quote would terminate the literal
                _ => out.push(c),
            }
        }
        Some(out)
    }

    proptest! {
        #[test]
        fn escaping_round_trips_and_never_leaks_a_quote(s in ".*") {
            let escaped = escape_string(&s);
            prop_assert_eq!(unescape(&escaped), Some(s));
        }
    }
}
