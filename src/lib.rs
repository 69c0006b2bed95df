mod context;
mod controller;
mod element;
mod field;
mod resolver;
#[cfg(feature = "schema")]
mod schema;
mod state;
mod store;
mod value;


pub use context::FormContext;
pub use controller::{
    FieldBinding, FormController, FormError, FormId, FormOptions, FormResult, SubmitHandler,
};
pub use element::{FileHandle, InputElement, InputEvent, InputKind, SubmitEvent};
pub use field::{FieldName, FieldStatus, RegisterOptions};
pub use resolver::{BoxedResolveFuture, Resolver, SchemaIssue, ValidationOutcome, flatten_issues};
#[cfg(feature = "schema")]
pub use schema::{JsonSchemaResolver, SchemaCompileError};
pub use state::{FieldError, FieldErrors, FormState, SubmitStatus};
pub use store::{Store, Subscription};
pub use value::{FieldValue, FieldValues, values_to_json};
