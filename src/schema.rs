use std::fmt::{Display, Formatter};

use serde_json::Value;

use crate::resolver::{BoxedResolveFuture, Resolver, SchemaIssue, ValidationOutcome, flatten_issues};
use crate::value::{FieldValues, values_to_json};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaCompileError(String);

impl Display for SchemaCompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to compile schema: {}", self.0)
    }
}

impl std::error::Error for SchemaCompileError {}

/// Resolver backed by a compiled JSON Schema. Field values are bridged to a
/// JSON object and every reported violation is flattened into the uniform
/// error map, keyed by the dotted instance path.
pub struct JsonSchemaResolver {
    schema: jsonschema::Validator,
}

impl JsonSchemaResolver {
    pub fn new(schema: &Value) -> Result<Self, SchemaCompileError> {
        let schema = jsonschema::validator_for(schema)
            .map_err(|error| SchemaCompileError(error.to_string()))?;
        Ok(Self { schema })
    }
}

impl Resolver for JsonSchemaResolver {
    type Fut<'a>
        = BoxedResolveFuture<'a>
    where
        Self: 'a;

    fn resolve<'a>(&'a self, input: &'a FieldValues) -> Self::Fut<'a> {
        Box::pin(async move {
            let instance = values_to_json(input);
            let issues = self
                .schema
                .iter_errors(&instance)
                .map(|error| {
                    SchemaIssue::new(
                        dotted_path(&error.instance_path.to_string()),
                        violated_keyword(&error.schema_path.to_string()),
                        error.to_string(),
                    )
                })
                .collect::<Vec<_>>();

            if issues.is_empty() {
                ValidationOutcome::Success {
                    values: input.clone(),
                }
            } else {
                ValidationOutcome::Error {
                    errors: flatten_issues(issues),
                }
            }
        })
    }
}

fn dotted_path(pointer: &str) -> String {
    pointer.trim_start_matches('/').replace('/', ".")
}

/// The violated keyword is the last segment of the schema path, e.g.
/// `/properties/email/format` reports as `format`.
fn violated_keyword(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("schema")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldName;
    use crate::value::FieldValue;
    use futures::executor::block_on;
    use serde_json::json;

    fn sample_values(email: &str) -> FieldValues {
        let mut values = FieldValues::new();
        values.insert(
            FieldName::from("email"),
            FieldValue::Text(email.to_string()),
        );
        values
    }

    #[test]
    fn passing_document_resolves_to_success() {
        let resolver = JsonSchemaResolver::new(&json!({
            "type": "object",
            "properties": { "email": { "type": "string", "minLength": 1 } },
            "required": ["email"],
        }))
        .expect("schema compiles");

        let values = sample_values("user@example.com");
        let outcome = block_on(resolver.resolve(&values));
        assert_eq!(outcome, ValidationOutcome::Success { values });
    }

    #[test]
    fn violations_map_to_field_errors_by_instance_path() {
        let resolver = JsonSchemaResolver::new(&json!({
            "type": "object",
            "properties": { "email": { "type": "string", "minLength": 1 } },
        }))
        .expect("schema compiles");

        let outcome = block_on(resolver.resolve(&sample_values("")));
        let ValidationOutcome::Error { errors } = outcome else {
            panic!("expected validation errors");
        };
        let entry = errors.get(&FieldName::from("email")).expect("email entry");
        assert_eq!(entry.kind, "minLength");
    }

    #[test]
    fn dotted_path_strips_the_leading_slash() {
        assert_eq!(dotted_path("/contact/0/email"), "contact.0.email");
        assert_eq!(dotted_path(""), "");
    }
}
