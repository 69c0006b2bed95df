use std::future::Future;
use std::pin::Pin;

use crate::field::FieldName;
use crate::state::{FieldError, FieldErrors};
use crate::value::FieldValues;

/// What a validation pass produced: either the validated output values or
/// the full replacement error map. Never both.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationOutcome {
    Success { values: FieldValues },
    Error { errors: FieldErrors },
}

pub type BoxedResolveFuture<'a> = Pin<Box<dyn Future<Output = ValidationOutcome> + Send + 'a>>;

/// Pluggable validation capability. The controller never sees the concrete
/// validation library, only this contract.
pub trait Resolver: Send + Sync {
    type Fut<'a>: Future<Output = ValidationOutcome> + Send + 'a
    where
        Self: 'a;

    fn resolve<'a>(&'a self, input: &'a FieldValues) -> Self::Fut<'a>;
}

impl<F> Resolver for F
where
    F: for<'a> Fn(&'a FieldValues) -> BoxedResolveFuture<'a> + Send + Sync,
{
    type Fut<'a>
        = BoxedResolveFuture<'a>
    where
        Self: 'a;

    fn resolve<'a>(&'a self, input: &'a FieldValues) -> Self::Fut<'a> {
        (self)(input)
    }
}

/// One issue reported by a validation library, in library-neutral shape.
/// `alternatives` holds the sub-issue lists of union/alternative rules, one
/// list per branch that was tried.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaIssue {
    pub path: String,
    pub kind: String,
    pub message: String,
    pub alternatives: Vec<Vec<SchemaIssue>>,
}

impl SchemaIssue {
    pub fn new(path: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
            message: message.into(),
            alternatives: Vec::new(),
        }
    }

    pub fn with_alternatives(mut self, alternatives: Vec<Vec<SchemaIssue>>) -> Self {
        self.alternatives = alternatives;
        self
    }
}

/// Flattens a library's issue list into the uniform error map. First error
/// per field path wins, in first-discovered order. Issues with alternatives
/// contribute their first branch's first sub-issue as the entry, and every
/// branch's sub-issues are appended to the worklist so a path that matches
/// no alternative still surfaces its most specific first failure.
pub fn flatten_issues(issues: Vec<SchemaIssue>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let mut worklist = issues;
    let mut index = 0;

    while index < worklist.len() {
        let issue = &worklist[index];
        let path = FieldName::from(issue.path.as_str());
        if !errors.contains_key(&path) {
            if issue.alternatives.is_empty() {
                errors.insert(
                    path,
                    FieldError::with_message(issue.kind.clone(), issue.message.clone()),
                );
            } else if let Some(first) = issue
                .alternatives
                .first()
                .and_then(|branch| branch.first())
            {
                errors.insert(
                    path,
                    FieldError::with_message(first.kind.clone(), first.message.clone()),
                );
            }
        }

        let alternatives = std::mem::take(&mut worklist[index].alternatives);
        for branch in alternatives {
            worklist.extend(branch);
        }
        index += 1;
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_issue_per_path_wins_in_discovery_order() {
        let errors = flatten_issues(vec![
            SchemaIssue::new("email", "invalid_string", "not an email"),
            SchemaIssue::new("age", "too_small", "must be at least 18"),
            SchemaIssue::new("email", "too_big", "too long"),
        ]);

        assert_eq!(errors.len(), 2);
        let (first_path, first) = errors.get_index(0).expect("first entry");
        assert_eq!(first_path.as_str(), "email");
        assert_eq!(first.kind, "invalid_string");
        assert_eq!(
            errors.get(&FieldName::from("age")).expect("age entry").kind,
            "too_small"
        );
    }

    #[test]
    fn union_issue_surfaces_first_branch_first_sub_issue() {
        let union = SchemaIssue::new("contact", "invalid_union", "no branch matched")
            .with_alternatives(vec![
                vec![SchemaIssue::new("contact", "invalid_string", "not an email")],
                vec![SchemaIssue::new("contact", "invalid_string", "not a phone number")],
            ]);
        let errors = flatten_issues(vec![union]);

        let entry = errors
            .get(&FieldName::from("contact"))
            .expect("contact entry");
        assert_eq!(entry.kind, "invalid_string");
        assert_eq!(entry.message.as_deref(), Some("not an email"));
    }

    #[test]
    fn sibling_alternative_issues_are_reprocessed_for_other_paths() {
        // The second branch fails on a nested path the first branch never
        // mentions; flattening must still surface it.
        let union = SchemaIssue::new("contact", "invalid_union", "no branch matched")
            .with_alternatives(vec![
                vec![SchemaIssue::new("contact", "invalid_string", "not an email")],
                vec![SchemaIssue::new(
                    "contact.country_code",
                    "too_small",
                    "missing country code",
                )],
            ]);
        let errors = flatten_issues(vec![union]);

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors
                .get(&FieldName::from("contact.country_code"))
                .expect("nested entry")
                .kind,
            "too_small"
        );
    }

    #[test]
    fn union_with_empty_first_branch_adds_no_entry_for_that_path() {
        let union = SchemaIssue::new("contact", "invalid_union", "no branch matched")
            .with_alternatives(vec![vec![]]);
        let errors = flatten_issues(vec![union]);

        assert!(errors.is_empty());
    }
}
