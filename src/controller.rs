use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use log::{debug, trace};

use crate::element::{InputElement, InputEvent, SubmitEvent};
use crate::field::{Field, FieldName, FieldStatus, RegisterOptions};
use crate::resolver::{Resolver, ValidationOutcome};
use crate::state::{FieldError, FieldErrors, FormState, SubmitStatus};
use crate::store::Store;
use crate::value::{FieldValues, extract_value};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    MissingProvider,
    FieldNotRegistered(FieldName),
    AlreadySubmitting,
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::MissingProvider => {
                f.write_str("form context accessed outside of a provider scope")
            }
            FormError::FieldNotRegistered(name) => {
                write!(f, "field {name} is not registered")
            }
            FormError::AlreadySubmitting => f.write_str("form submit is already in progress"),
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub(crate) type ResolverFn = Arc<
    dyn Fn(FieldValues) -> Pin<Box<dyn Future<Output = ValidationOutcome> + Send>> + Send + Sync,
>;
type ValidCallback =
    Arc<dyn Fn(FieldValues) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;
type InvalidCallback =
    Arc<dyn Fn(FieldErrors) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct FormOptions {
    pub use_native_validation: bool,
    pub(crate) resolver: Option<ResolverFn>,
}

impl FormOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards each field's `required` flag through its binding so the
    /// rendering layer can enforce it natively.
    pub fn native_validation(mut self, enabled: bool) -> Self {
        self.use_native_validation = enabled;
        self
    }

    pub fn resolver<R>(mut self, resolver: R) -> Self
    where
        R: Resolver + 'static,
    {
        let resolver = Arc::new(resolver);
        let wrapped: ResolverFn = Arc::new(move |values: FieldValues| {
            let resolver = Arc::clone(&resolver);
            Box::pin(async move { resolver.resolve(&values).await })
        });
        self.resolver = Some(wrapped);
        self
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }
}

struct RegistryState {
    id: FormId,
    fields: IndexMap<FieldName, Field>,
    values: FieldValues,
    errors: FieldErrors,
    touched: BTreeSet<FieldName>,
    dirty: BTreeSet<FieldName>,
}

#[derive(Clone)]
pub struct FormController {
    options: FormOptions,
    store: Store<FormState>,
    registry: Arc<RwLock<RegistryState>>,
}

impl FormController {
    pub fn new(options: FormOptions) -> Self {
        let store = Store::new(FormState::initial());
        // Loading flips off as soon as the controller exists; the initial
        // snapshot only ever shows it for subscribers attached before
        // construction finished.
        store.update(|state| {
            let mut next = state.clone();
            next.is_loading = false;
            next
        });
        Self {
            options,
            store,
            registry: Arc::new(RwLock::new(RegistryState {
                id: FormId::next(),
                fields: IndexMap::new(),
                values: FieldValues::new(),
                errors: FieldErrors::new(),
                touched: BTreeSet::new(),
                dirty: BTreeSet::new(),
            })),
        }
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.registry, "reading form id")?.id)
    }

    pub fn store(&self) -> &Store<FormState> {
        &self.store
    }

    pub fn state(&self) -> FormState {
        self.store.get()
    }

    pub fn values(&self) -> FormResult<FieldValues> {
        Ok(read_lock(&self.registry, "reading field values")?
            .values
            .clone())
    }

    pub fn errors(&self) -> FormResult<FieldErrors> {
        Ok(read_lock(&self.registry, "reading field errors")?
            .errors
            .clone())
    }

    pub fn field_status(&self, name: impl Into<FieldName>) -> FormResult<Option<FieldStatus>> {
        Ok(read_lock(&self.registry, "reading field status")?
            .fields
            .get(&name.into())
            .map(Field::status))
    }

    /// Declares a field. Creates the lifecycle record if absent; on an
    /// already registered field the options are refreshed in place, so a
    /// re-register call is never a silent no-op.
    pub fn register(
        &self,
        name: impl Into<FieldName>,
        options: RegisterOptions,
    ) -> FormResult<FieldBinding> {
        let name = name.into();
        {
            let mut registry = write_lock(&self.registry, "registering field")?;
            debug!("register {name}");
            let field = registry
                .fields
                .entry(name.clone())
                .or_insert_with(|| Field::created(name.clone()));
            if let Field::Registered {
                options: existing, ..
            } = field
            {
                *existing = options;
            }
        }

        Ok(FieldBinding {
            controller: self.clone(),
            name,
            options,
            required: self
                .options
                .use_native_validation
                .then_some(options.required),
        })
    }

    /// Removes the field, its captured value, and its marks. Absent fields
    /// are ignored. Stored errors are left for the next validation pass,
    /// which replaces the map wholesale.
    pub fn unregister(&self, name: impl Into<FieldName>) -> FormResult<()> {
        let name = name.into();
        let mut registry = write_lock(&self.registry, "unregistering field")?;
        if registry.fields.shift_remove(&name).is_some() {
            debug!("unregister {name}");
        }
        registry.values.shift_remove(&name);
        registry.touched.remove(&name);
        registry.dirty.remove(&name);
        Ok(())
    }

    /// Runs the built-in checks against one field's live element. Directly
    /// validating a field that never reached `Registered` is a usage error.
    pub fn validate_field(&self, name: impl Into<FieldName>) -> FormResult<Option<FieldError>> {
        let name = name.into();
        let registry = read_lock(&self.registry, "validating field")?;
        match registry.fields.get(&name) {
            Some(field) => native_field_check(field),
            None => Err(FormError::FieldNotRegistered(name)),
        }
    }

    /// Clears captured values, errors, and marks, and publishes a pristine
    /// snapshot. Registered fields and their options survive.
    pub fn reset(&self) -> FormResult<()> {
        {
            let mut registry = write_lock(&self.registry, "resetting form")?;
            registry.values.clear();
            registry.errors.clear();
            registry.touched.clear();
            registry.dirty.clear();
        }
        self.store.update(|state| {
            let mut next = FormState::initial();
            next.is_loading = state.is_loading;
            next
        });
        Ok(())
    }

    pub fn handle_submit<V, Fut>(&self, on_valid: V) -> SubmitHandler
    where
        V: Fn(FieldValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let on_valid: ValidCallback = Arc::new(move |values| Box::pin(on_valid(values)));
        SubmitHandler {
            controller: self.clone(),
            on_valid,
            on_invalid: None,
        }
    }

    pub fn handle_submit_or_else<V, FutV, I, FutI>(
        &self,
        on_valid: V,
        on_invalid: I,
    ) -> SubmitHandler
    where
        V: Fn(FieldValues) -> FutV + Send + Sync + 'static,
        FutV: Future<Output = ()> + Send + 'static,
        I: Fn(FieldErrors) -> FutI + Send + Sync + 'static,
        FutI: Future<Output = ()> + Send + 'static,
    {
        let on_valid: ValidCallback = Arc::new(move |values| Box::pin(on_valid(values)));
        let on_invalid: InvalidCallback = Arc::new(move |errors| Box::pin(on_invalid(errors)));
        SubmitHandler {
            controller: self.clone(),
            on_valid,
            on_invalid: Some(on_invalid),
        }
    }

    fn attach_element(
        &self,
        name: FieldName,
        options: RegisterOptions,
        element: &Arc<dyn InputElement>,
    ) -> FormResult<()> {
        let mut registry = write_lock(&self.registry, "attaching element")?;
        debug!("field {name} registered");
        registry.fields.insert(
            name.clone(),
            Field::Registered {
                name,
                element: Arc::downgrade(element),
                options,
            },
        );
        Ok(())
    }

    /// Raw input capture. Resolves the field by the event target's name and
    /// stores the extracted value; anything unexpected is a silent no-op so
    /// stale UI references can never take the form down. Never validates.
    fn capture_input(&self, event: &InputEvent) {
        let name = FieldName::from(event.target_name());
        let mut registry = match self.registry.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let Some(field) = registry.fields.get(&name) else {
            trace!("input for unknown field {name} ignored");
            return;
        };
        if !field.is_registered() {
            return;
        }
        let Some(element) = field.element() else {
            return;
        };
        let options = field.options().unwrap_or_default();

        match extract_value(element.as_ref(), options) {
            Some(value) => {
                trace!("capture {name}");
                registry.values.insert(name.clone(), value);
            }
            None => {
                registry.values.shift_remove(&name);
            }
        }
        registry.touched.insert(name.clone());
        registry.dirty.insert(name);
    }

    async fn run_submit(
        &self,
        event: &mut dyn SubmitEvent,
        on_valid: &ValidCallback,
        on_invalid: Option<&InvalidCallback>,
    ) -> FormResult<()> {
        event.prevent_default();

        if self.store.get().status.is_submitting() {
            return Err(FormError::AlreadySubmitting);
        }

        debug!("submit started");
        self.publish(|state| state.status = SubmitStatus::Submitting)?;

        let outcome = if let Some(resolver) = self.options.resolver.clone() {
            let values = read_lock(&self.registry, "reading values for validation")?
                .values
                .clone();
            resolver(values).await
        } else {
            let registry = read_lock(&self.registry, "running native validation")?;
            native_validation(&registry)?
        };

        match outcome {
            ValidationOutcome::Success { values } => {
                {
                    let mut registry = write_lock(&self.registry, "storing validated values")?;
                    registry.errors.clear();
                    registry.values = values.clone();
                }
                self.publish(|state| state.errors = FieldErrors::new())?;
                let on_valid = Arc::clone(on_valid);
                on_valid(values).await;
            }
            ValidationOutcome::Error { errors } => {
                {
                    let mut registry = write_lock(&self.registry, "storing field errors")?;
                    registry.errors = errors.clone();
                }
                self.publish({
                    let errors = errors.clone();
                    move |state| state.errors = errors
                })?;
                if let Some(on_invalid) = on_invalid {
                    let on_invalid = Arc::clone(on_invalid);
                    on_invalid(errors).await;
                }
            }
        }

        let errors = read_lock(&self.registry, "reading errors for submit result")?
            .errors
            .clone();
        self.publish(move |state| {
            let successful = errors.is_empty();
            state.status = SubmitStatus::Submitted { successful };
            state.submit_count = state.submit_count.saturating_add(1);
            state.errors = errors;
        })?;
        debug!("submit finished");
        Ok(())
    }

    /// Every publish refreshes the mark sets from the registry before
    /// applying the transition-specific mutation.
    fn publish<F>(&self, mutate: F) -> FormResult<()>
    where
        F: FnOnce(&mut FormState) + Send + 'static,
    {
        let (touched, dirty) = {
            let registry = read_lock(&self.registry, "publishing form state")?;
            (registry.touched.clone(), registry.dirty.clone())
        };
        self.store.update(move |state| {
            let mut next = state.clone();
            next.touched_fields = touched;
            next.dirty_fields = dirty;
            next.is_dirty = !next.dirty_fields.is_empty();
            mutate(&mut next);
            next
        });
        Ok(())
    }
}

/// Binding descriptor returned by `register`: the element-attach callback,
/// the input handler, the field name, and (in native-validation mode) the
/// required flag for the rendering layer.
pub struct FieldBinding {
    controller: FormController,
    name: FieldName,
    options: RegisterOptions,
    required: Option<bool>,
}

impl FieldBinding {
    pub fn name(&self) -> &FieldName {
        &self.name
    }

    pub fn required(&self) -> Option<bool> {
        self.required
    }

    /// Binds the live element, promoting the field to `Registered` with
    /// this binding's options. Call again on remount; the previous weak
    /// reference is simply replaced.
    pub fn attach(&self, element: &Arc<dyn InputElement>) -> FormResult<()> {
        self.controller
            .attach_element(self.name.clone(), self.options, element)
    }

    pub fn on_input(&self, event: &InputEvent) {
        self.controller.capture_input(event);
    }
}

/// The submit event handler produced by `handle_submit`. Cloneable; one
/// handler can drive any number of sequential submissions.
#[derive(Clone)]
pub struct SubmitHandler {
    controller: FormController,
    on_valid: ValidCallback,
    on_invalid: Option<InvalidCallback>,
}

impl SubmitHandler {
    pub async fn submit(&self, event: &mut dyn SubmitEvent) -> FormResult<()> {
        self.controller
            .run_submit(event, &self.on_valid, self.on_invalid.as_ref())
            .await
    }
}

fn native_validation(registry: &RegistryState) -> FormResult<ValidationOutcome> {
    let mut errors = FieldErrors::new();
    for (name, field) in &registry.fields {
        if !field.is_registered() {
            continue;
        }
        // At most one error per field, but every field is checked.
        if let Some(error) = native_field_check(field)? {
            errors.insert(name.clone(), error);
        }
    }

    if errors.is_empty() {
        Ok(ValidationOutcome::Success {
            values: registry.values.clone(),
        })
    } else {
        Ok(ValidationOutcome::Error { errors })
    }
}

fn native_field_check(field: &Field) -> FormResult<Option<FieldError>> {
    let Field::Registered {
        name,
        element,
        options,
    } = field
    else {
        return Err(FormError::FieldNotRegistered(field.name().clone()));
    };
    let Some(element) = element.upgrade() else {
        trace!("field {name}: element is gone, skipping native checks");
        return Ok(None);
    };

    let is_text_empty = element.value().is_empty();

    let mut error = None;
    if options.required && is_text_empty {
        error = Some(FieldError::new("required"));
    }
    Ok(error)
}

pub(crate) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(crate) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
