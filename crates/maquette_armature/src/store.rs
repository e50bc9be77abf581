//! The form store.
//!
//! A [`FormState`] compiles a JSON form definition into an ordered tree of
//! field nodes and owns everything that spans fields: value collection and
//! injection, slash-path resolution, validation dispatch, read-mode
//! toggling, render keys and remote option resolution.

use std::sync::Arc;

use compact_str::CompactString;
use serde_json::Value;
use tracing::{debug, warn};

use maquette_carton::{split_path, KeyGenerator};
use maquette_patina::{evaluate, BoxError, RuleRegistry};

use crate::error::FormError;
use crate::field::{
    build_field_map, collect_values, inject_into, reset_fields, BuildContext, FieldBody, FieldMap,
    FieldNode, PendingValidation,
};
use crate::options::{FetchStatus, OptionsCache, OptionsFetcher};

enum Target<'a> {
    Node(&'a FieldNode),
    Instance,
}

enum TargetMut<'a> {
    Node(&'a mut FieldNode),
    Instance(&'a mut FieldMap),
}

fn resolve<'a>(fields: &'a FieldMap, parts: &[String]) -> Option<Target<'a>> {
    let Some((first, rest)) = parts.split_first() else {
        return Some(Target::Instance);
    };
    let node = fields.get(first)?;
    if rest.is_empty() {
        return Some(Target::Node(node));
    }
    match &node.body {
        FieldBody::Nested(nested) => {
            let index: usize = rest.first()?.parse().ok()?;
            resolve(nested.value.get(index)?, &rest[1..])
        }
        _ => None,
    }
}

fn resolve_mut<'a>(fields: &'a mut FieldMap, parts: &[String]) -> Option<TargetMut<'a>> {
    let Some((first, rest)) = parts.split_first() else {
        return Some(TargetMut::Instance(fields));
    };
    let node = fields.get_mut(first)?;
    if rest.is_empty() {
        return Some(TargetMut::Node(node));
    }
    match &mut node.body {
        FieldBody::Nested(nested) => {
            let index: usize = rest.first()?.parse().ok()?;
            resolve_mut(nested.value.get_mut(index)?, &rest[1..])
        }
        _ => None,
    }
}

fn collect_pending_node(node: &mut FieldNode, out: &mut Vec<PendingValidation>) {
    if let Some(pending) = node.begin_validation() {
        out.push(pending);
    }
    if let FieldBody::Nested(nested) = &mut node.body {
        for instance in nested.value.iter_mut() {
            collect_pending(instance, out);
        }
    }
}

fn collect_pending(fields: &mut FieldMap, out: &mut Vec<PendingValidation>) {
    for node in fields.values_mut() {
        collect_pending_node(node, out);
    }
}

fn set_read_mode(fields: &mut FieldMap, value: bool) {
    for node in fields.values_mut() {
        node.base.read_mode = value;
        if let FieldBody::Nested(nested) = &mut node.body {
            for instance in nested.value.iter_mut() {
                set_read_mode(instance, value);
            }
        }
    }
}

/// The compiled state of one form.
pub struct FormState {
    fields: FieldMap,
    read_mode: bool,
    rules: RuleRegistry,
    cache: Arc<OptionsCache>,
    fetcher: Option<Arc<dyn OptionsFetcher>>,
    keys: KeyGenerator,
    revision: u64,
}

impl FormState {
    /// Compile a form definition (an object with a `fields` map) using the
    /// process-wide options cache.
    pub fn new(definition: &Value) -> Result<Self, FormError> {
        Self::with_cache(definition, OptionsCache::global())
    }

    /// Compile a form definition against a dedicated options cache.
    pub fn with_cache(definition: &Value, cache: Arc<OptionsCache>) -> Result<Self, FormError> {
        let template = definition
            .get("fields")
            .filter(|fields| fields.is_object())
            .ok_or_else(|| FormError::InvalidConfig {
                path: String::new(),
                detail: "form definition must carry a `fields` object".to_string(),
            })?;
        let ctx = BuildContext::new(cache.clone());
        let fields = build_field_map(template, "", &ctx)?;
        debug!(fields = fields.len(), "compiled form definition");
        Ok(Self {
            fields,
            read_mode: false,
            rules: RuleRegistry::new(),
            cache,
            fetcher: None,
            keys: KeyGenerator::new(),
            revision: 0,
        })
    }

    /// Install the transport used to resolve `optionsUrl` / `dataUrl`.
    pub fn set_fetcher(&mut self, fetcher: Arc<dyn OptionsFetcher>) {
        self.fetcher = Some(fetcher);
    }

    fn ctx(&self) -> BuildContext {
        BuildContext::new(self.cache.clone())
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    /// Form-level change counter; bumped by every mutating operation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The root field map, in declaration order.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Resolved values with output mapping applied.
    pub fn values(&self) -> Value {
        self.get_values(true)
    }

    /// Resolved values. Disabled fields are omitted; readOnly and
    /// readAndDeleteOnly fields are included.
    pub fn get_values(&self, apply_mapping: bool) -> Value {
        collect_values(&self.fields, apply_mapping)
    }

    /// Inject a value map at the form root. With `merge` false every field
    /// is reset first, so keys absent from `values` fall back to their
    /// declared defaults.
    pub fn inject_values(&mut self, values: &Value, merge: bool) -> Result<(), FormError> {
        let ctx = self.ctx();
        inject_into(&mut self.fields, values, merge, &ctx)?;
        self.bump();
        Ok(())
    }

    /// Inject values at a path: either a single field (any value shape) or
    /// a nested instance (a value map).
    pub fn inject_values_at(
        &mut self,
        path: &str,
        values: &Value,
        merge: bool,
    ) -> Result<(), FormError> {
        let ctx = self.ctx();
        let parts = split_path(path);
        match resolve_mut(&mut self.fields, &parts) {
            Some(TargetMut::Node(node)) => node.inject_value(Some(values), &ctx)?,
            Some(TargetMut::Instance(fields)) => inject_into(fields, values, merge, &ctx)?,
            None => return Err(FormError::unknown_path(path)),
        }
        self.bump();
        Ok(())
    }

    /// The field at a slash path (alternating names and Nested indices).
    pub fn get_field(&self, path: &str) -> Result<&FieldNode, FormError> {
        let parts = split_path(path);
        match resolve(&self.fields, &parts) {
            Some(Target::Node(node)) => Ok(node),
            _ => Err(FormError::unknown_path(path)),
        }
    }

    pub fn get_field_mut(&mut self, path: &str) -> Result<&mut FieldNode, FormError> {
        let parts = split_path(path);
        match resolve_mut(&mut self.fields, &parts) {
            Some(TargetMut::Node(node)) => Ok(node),
            _ => Err(FormError::unknown_path(path)),
        }
    }

    /// Restore every field to its declared default.
    pub fn reset(&mut self) -> Result<(), FormError> {
        let ctx = self.ctx();
        reset_fields(&mut self.fields, &ctx)?;
        self.bump();
        Ok(())
    }

    /// Restore the field (or nested instance) at a path.
    pub fn reset_path(&mut self, path: &str) -> Result<(), FormError> {
        let ctx = self.ctx();
        let parts = split_path(path);
        match resolve_mut(&mut self.fields, &parts) {
            Some(TargetMut::Node(node)) => node.reset(&ctx)?,
            Some(TargetMut::Instance(fields)) => reset_fields(fields, &ctx)?,
            None => return Err(FormError::unknown_path(path)),
        }
        self.bump();
        Ok(())
    }

    /// Validate every field (nested children included). All fields are
    /// evaluated — a failure never short-circuits the rest — and the
    /// AND-aggregate is returned. Fields without rules are untouched.
    pub async fn validate(&mut self) -> bool {
        let snapshot = self.get_values(true);
        let mut pending = Vec::new();
        collect_pending(&mut self.fields, &mut pending);
        self.run_validations(pending, &snapshot).await
    }

    /// Validate a single field (and, for a Nested field, its children).
    pub async fn validate_field(&mut self, path: &str) -> Result<bool, FormError> {
        let snapshot = self.get_values(true);
        let mut pending = Vec::new();
        collect_pending_node(self.get_field_mut(path)?, &mut pending);
        Ok(self.run_validations(pending, &snapshot).await)
    }

    async fn run_validations(
        &mut self,
        pending: Vec<PendingValidation>,
        snapshot: &Value,
    ) -> bool {
        let mut all_passed = true;
        for item in pending {
            let outcome = evaluate(
                &item.label,
                &item.value,
                &item.rules,
                &item.messages,
                &self.rules,
                snapshot,
                item.epoch,
            )
            .await;
            all_passed &= outcome.passed;
            if let Ok(node) = self.get_field_mut(&item.path) {
                node.apply_validation(&outcome);
            }
        }
        self.bump();
        all_passed
    }

    /// Register a synchronous custom validation rule on this form.
    pub fn register_custom_validation_function<F>(
        &mut self,
        name: &str,
        func: F,
        message: impl Into<String>,
    ) -> Result<(), FormError>
    where
        F: Fn(&Value, &str, &Value) -> bool + Send + Sync + 'static,
    {
        self.rules.register(name, func, message)?;
        Ok(())
    }

    /// Register an asynchronous custom validation rule on this form.
    pub fn register_custom_validation_function_async<F, Fut>(
        &mut self,
        name: &str,
        func: F,
        message: impl Into<String>,
    ) -> Result<(), FormError>
    where
        F: Fn(Value, String, Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<bool, BoxError>> + Send + 'static,
    {
        self.rules.register_async(name, func, message)?;
        Ok(())
    }

    /// Flip (or force) read mode on the form and every field.
    pub fn toggle_read_mode(&mut self, status: Option<bool>) {
        let value = status.unwrap_or(!self.read_mode);
        self.read_mode = value;
        set_read_mode(&mut self.fields, value);
        self.bump();
    }

    pub fn read_mode(&self) -> bool {
        self.read_mode
    }

    /// A render key stable across re-renders for the node at `path`,
    /// scoped by `namespace`.
    pub fn field_key(&mut self, path: &str, namespace: &str) -> Result<CompactString, FormError> {
        let id = self.get_field(path)?.base.id.as_u64();
        Ok(self.keys.key_for(id, namespace))
    }

    /// Append an instance to the Nested field at `path`.
    pub fn add_instance(&mut self, path: &str) -> Result<bool, FormError> {
        let ctx = self.ctx();
        let changed = self.get_field_mut(path)?.add_instance(&ctx)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    /// Remove an instance from the Nested field at `path`.
    pub fn remove_instance(&mut self, path: &str, index: usize) -> Result<bool, FormError> {
        let changed = self.get_field_mut(path)?.remove_instance(index)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    pub fn move_instance(
        &mut self,
        path: &str,
        index: usize,
        new_index: usize,
    ) -> Result<bool, FormError> {
        let changed = self.get_field_mut(path)?.move_instance(index, new_index)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    /// Duplicate an instance of the Nested field at `path`; the copy takes
    /// the source's resolved current data.
    pub fn duplicate_instance(&mut self, path: &str, index: usize) -> Result<bool, FormError> {
        let ctx = self.ctx();
        let changed = self.get_field_mut(path)?.duplicate_instance(index, &ctx)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    /// Apply a batch of grid edits to the DataSheet field at `path`.
    pub fn apply_sheet_changes(
        &mut self,
        path: &str,
        changes: &[crate::field::CellEdit],
        out_of_scope: &[crate::field::GridEdit],
    ) -> Result<(), FormError> {
        self.get_field_mut(path)?.apply_sheet_changes(changes, out_of_scope)?;
        self.bump();
        Ok(())
    }

    /// Insert a pristine row into the DataSheet field at `path`.
    pub fn add_row(&mut self, path: &str, index: Option<usize>) -> Result<bool, FormError> {
        let changed = self.get_field_mut(path)?.add_row(index)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    pub fn remove_row(&mut self, path: &str, index: usize) -> Result<bool, FormError> {
        let changed = self.get_field_mut(path)?.remove_row(index)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    pub fn move_row(
        &mut self,
        path: &str,
        index: usize,
        new_index: usize,
    ) -> Result<bool, FormError> {
        let changed = self.get_field_mut(path)?.move_row(index, new_index)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    pub fn duplicate_row(&mut self, path: &str, index: usize) -> Result<bool, FormError> {
        let changed = self.get_field_mut(path)?.duplicate_row(index)?;
        if changed {
            self.bump();
        }
        Ok(changed)
    }

    /// Fetch a URL through the configured fetcher. With `cache` the fetch
    /// goes through the shared cache cell (one fetch per URL). Failures
    /// are logged and yield `None`; the caller keeps its current data.
    pub async fn resolve_url(&self, url: &str, cache: bool) -> Option<Value> {
        let Some(fetcher) = &self.fetcher else {
            warn!(%url, "no options fetcher configured");
            return None;
        };
        let result = if cache {
            self.cache.resolve(url, fetcher.as_ref()).await
        } else {
            fetcher.fetch(url).await
        };
        match result {
            Ok(data) => Some(data),
            Err(error) => {
                warn!(%url, %error, "options fetch failed");
                None
            }
        }
    }

    /// Resolve the remote data source of the field at `path`, if it has
    /// one, and re-run option matching against its stashed value.
    pub async fn init_field(&mut self, path: &str) -> Result<FetchStatus, FormError> {
        let Some((url, cache)) = self.get_field(path)?.pending_source() else {
            return Ok(FetchStatus::Skipped);
        };
        let Some(data) = self.resolve_url(&url, cache).await else {
            return Ok(FetchStatus::Failed);
        };
        let ctx = self.ctx();
        self.get_field_mut(path)?.apply_remote_data(&data, &ctx)?;
        self.bump();
        Ok(FetchStatus::Applied)
    }
}

impl std::fmt::Debug for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormState")
            .field("fields", &self.fields.len())
            .field("read_mode", &self.read_mode)
            .field("revision", &self.revision)
            .finish()
    }
}
