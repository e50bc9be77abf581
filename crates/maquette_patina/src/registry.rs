//! Registry of custom validation functions.
//!
//! Custom rules are named predicates installed at runtime and referenced
//! from rule strings like any built-in. A rule can be synchronous
//! (returning `bool`) or asynchronous (returning a future of
//! `Result<bool, _>`); an `Err` completion is treated as a plain failure.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use compact_str::CompactString;
use futures::future::BoxFuture;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::RegistryError;

/// Boxed error produced by a failing async rule.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A custom predicate over `(value, attribute, form_values)`.
#[derive(Clone)]
pub enum CustomRuleFn {
    /// Synchronous predicate
    Sync(Arc<dyn Fn(&Value, &str, &Value) -> bool + Send + Sync>),
    /// Asynchronous predicate; `Err` counts as `false`
    Async(Arc<dyn Fn(Value, String, Value) -> BoxFuture<'static, Result<bool, BoxError>> + Send + Sync>),
}

impl fmt::Debug for CustomRuleFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomRuleFn::Sync(_) => f.write_str("CustomRuleFn::Sync(..)"),
            CustomRuleFn::Async(_) => f.write_str("CustomRuleFn::Async(..)"),
        }
    }
}

/// A registered custom rule: the predicate plus its error message.
#[derive(Debug, Clone)]
pub struct CustomRule {
    pub(crate) func: CustomRuleFn,
    pub(crate) message: String,
}

impl CustomRule {
    /// The error message registered with the rule.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Registry holding custom validation rules, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: FxHashMap<CompactString, CustomRule>,
}

impl RuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous rule. Re-registering a name replaces it.
    pub fn register<F>(
        &mut self,
        name: &str,
        func: F,
        message: impl Into<String>,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&Value, &str, &Value) -> bool + Send + Sync + 'static,
    {
        self.insert(name, CustomRuleFn::Sync(Arc::new(func)), message.into())
    }

    /// Register an asynchronous rule. Re-registering a name replaces it.
    pub fn register_async<F, Fut>(
        &mut self,
        name: &str,
        func: F,
        message: impl Into<String>,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Value, String, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
    {
        let wrapped = Arc::new(move |value: Value, attribute: String, form: Value| {
            Box::pin(func(value, attribute, form)) as BoxFuture<'static, Result<bool, BoxError>>
        });
        self.insert(name, CustomRuleFn::Async(wrapped), message.into())
    }

    fn insert(
        &mut self,
        name: &str,
        func: CustomRuleFn,
        message: String,
    ) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if message.is_empty() {
            return Err(RegistryError::EmptyMessage(name.to_string()));
        }
        self.rules
            .insert(CompactString::new(name), CustomRule { func, message });
        Ok(())
    }

    /// Whether a custom rule with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&CustomRule> {
        self.rules.get(name)
    }

    /// Run a rule's predicate. A failed future counts as `false`.
    pub(crate) async fn run(
        rule: &CustomRule,
        value: &Value,
        attribute: &str,
        form_values: &Value,
    ) -> bool {
        match &rule.func {
            CustomRuleFn::Sync(func) => func(value, attribute, form_values),
            CustomRuleFn::Async(func) => {
                func(value.clone(), attribute.to_string(), form_values.clone())
                    .await
                    .unwrap_or(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_requires_message() {
        let mut registry = RuleRegistry::new();
        assert!(matches!(
            registry.register("nope", |_, _, _| true, ""),
            Err(RegistryError::EmptyMessage(_))
        ));
        assert!(registry.register("ok", |_, _, _| true, "bad").is_ok());
        assert!(registry.contains("ok"));
    }

    #[tokio::test]
    async fn test_run_sync_and_async() {
        let mut registry = RuleRegistry::new();
        registry
            .register("is_even", |value, _, _| {
                value.as_i64().is_some_and(|n| n % 2 == 0)
            }, "must be even")
            .unwrap();
        registry
            .register_async("always_errs", |_, _, _| async {
                Err::<bool, BoxError>("boom".into())
            }, "async failed")
            .unwrap();

        let form = json!({});
        let even = registry.get("is_even").unwrap();
        assert!(RuleRegistry::run(even, &json!(4), "n", &form).await);
        assert!(!RuleRegistry::run(even, &json!(3), "n", &form).await);

        // a rejected future is indistinguishable from `false`
        let errs = registry.get("always_errs").unwrap();
        assert!(!RuleRegistry::run(errs, &json!(1), "n", &form).await);
    }
}
