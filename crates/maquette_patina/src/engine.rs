//! Rule evaluation.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::builtin;
use crate::registry::RuleRegistry;
use crate::rule::{Rule, RuleSet};

/// The result of validating one field.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Whether every rule passed
    pub passed: bool,
    /// All failure messages, in rule order
    pub errors: Vec<String>,
    /// The validation epoch this outcome was computed for; stale outcomes
    /// must be discarded by the caller
    pub epoch: u64,
}

/// Evaluate every rule of a field against its current value.
///
/// Rules other than `required` pass vacuously on empty values. Evaluation
/// does not short-circuit: all failure messages are collected. Custom rules
/// take precedence over built-ins of the same name and receive
/// `form_values` so they can reference sibling fields.
pub async fn evaluate(
    label: &str,
    value: &Value,
    rules: &RuleSet,
    custom_messages: &FxHashMap<String, String>,
    registry: &RuleRegistry,
    form_values: &Value,
    epoch: u64,
) -> ValidationOutcome {
    let mut errors = Vec::new();
    let present = builtin::has_value(value);

    for rule in rules.iter() {
        if rule.name() != "required" && !present {
            continue;
        }
        match rule {
            Rule::Regex { compiled, .. } => {
                let matched = match value {
                    Value::String(s) => compiled.is_match(s),
                    Value::Number(n) => compiled.is_match(&n.to_string()),
                    _ => false,
                };
                if !matched {
                    errors.push(resolve_message("regex", label, &[], custom_messages));
                }
            }
            Rule::Named { name, params } => {
                if let Some(custom) = registry.get(name) {
                    if !RuleRegistry::run(custom, value, label, form_values).await {
                        let message = custom_messages
                            .get(name.as_str())
                            .map(|template| builtin::substitute(template, label, name, params))
                            .unwrap_or_else(|| {
                                builtin::substitute(custom.message(), label, name, params)
                            });
                        errors.push(message);
                    }
                } else if let Some(passed) = builtin::check(name, params, value) {
                    if !passed {
                        errors.push(resolve_message(name, label, params, custom_messages));
                    }
                } else {
                    // misconfiguration should be visible, not silent
                    errors.push(format!(
                        "The {label} field has an unknown validation rule ({name})."
                    ));
                }
            }
        }
    }

    ValidationOutcome {
        passed: errors.is_empty(),
        errors,
        epoch,
    }
}

fn resolve_message(
    name: &str,
    label: &str,
    params: &[String],
    custom_messages: &FxHashMap<String, String>,
) -> String {
    match custom_messages.get(name) {
        Some(template) => builtin::substitute(template, label, name, params),
        None => builtin::message_for(name, label, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_messages() -> FxHashMap<String, String> {
        FxHashMap::default()
    }

    #[tokio::test]
    async fn test_evaluate_collects_all_failures() {
        let rules = RuleSet::parse(&json!("required|min:3|alpha")).unwrap();
        let outcome = evaluate(
            "name",
            &json!("a1"),
            &rules,
            &no_messages(),
            &RuleRegistry::new(),
            &json!({}),
            1,
        )
        .await;
        assert!(!outcome.passed);
        // min and alpha both fail, required passes
        assert_eq!(outcome.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_value_skips_non_required() {
        let rules = RuleSet::parse(&json!("min:3|email")).unwrap();
        let outcome = evaluate(
            "mail",
            &json!(""),
            &rules,
            &no_messages(),
            &RuleRegistry::new(),
            &json!({}),
            1,
        )
        .await;
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn test_custom_message_override() {
        let rules = RuleSet::parse(&json!("required")).unwrap();
        let mut messages = FxHashMap::default();
        messages.insert("required".to_string(), "Please fill in :attribute!".to_string());
        let outcome = evaluate(
            "city",
            &json!(null),
            &rules,
            &messages,
            &RuleRegistry::new(),
            &json!({}),
            1,
        )
        .await;
        assert_eq!(outcome.errors, ["Please fill in city!"]);
    }

    #[tokio::test]
    async fn test_custom_rule_with_form_snapshot() {
        let mut registry = RuleRegistry::new();
        registry
            .register("matches_login", |value, _, form| {
                form.get("login") == Some(value)
            }, "The :attribute must match the login.")
            .unwrap();
        let rules = RuleSet::parse(&json!("matches_login")).unwrap();

        let outcome = evaluate(
            "confirmation",
            &json!("admin"),
            &rules,
            &no_messages(),
            &registry,
            &json!({"login": "admin"}),
            1,
        )
        .await;
        assert!(outcome.passed);

        let outcome = evaluate(
            "confirmation",
            &json!("root"),
            &rules,
            &no_messages(),
            &registry,
            &json!({"login": "admin"}),
            2,
        )
        .await;
        assert_eq!(outcome.errors, ["The confirmation must match the login."]);
        assert_eq!(outcome.epoch, 2);
    }

    #[tokio::test]
    async fn test_unknown_rule_is_reported() {
        let rules = RuleSet::parse(&json!("definitely_not_a_rule")).unwrap();
        let outcome = evaluate(
            "x",
            &json!("v"),
            &rules,
            &no_messages(),
            &RuleRegistry::new(),
            &json!({}),
            1,
        )
        .await;
        assert!(!outcome.passed);
    }

    #[tokio::test]
    async fn test_regex_rule() {
        let rules = RuleSet::parse(&json!(["regex:/^[0-9]{4}$/"])).unwrap();
        let ok = evaluate("year", &json!("2024"), &rules, &no_messages(), &RuleRegistry::new(), &json!({}), 1).await;
        assert!(ok.passed);
        let bad = evaluate("year", &json!("24"), &rules, &no_messages(), &RuleRegistry::new(), &json!({}), 1).await;
        assert!(!bad.passed);
    }
}
