//! Rule declarations and their parsed representation.

use compact_str::CompactString;
use serde_json::Value;

use crate::error::RuleParseError;

/// One parsed validation rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// A named rule, built-in or custom, with optional `:param,param…`
    Named {
        /// Rule name (e.g. `"required"`, `"min"`)
        name: CompactString,
        /// Raw parameter strings
        params: Vec<String>,
    },
    /// A `regex:/pattern/flags` literal
    Regex {
        /// The pattern as written (without flags)
        pattern: String,
        /// Compiled pattern, flags folded in
        compiled: regex::Regex,
    },
}

impl Rule {
    /// The rule's name (`"regex"` for regex literals).
    pub fn name(&self) -> &str {
        match self {
            Rule::Named { name, .. } => name.as_str(),
            Rule::Regex { .. } => "regex",
        }
    }
}

/// An ordered set of rules for a single field.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse a rule declaration.
    ///
    /// Accepts a pipe-delimited string (`"required|min:3"`), an array of
    /// such strings, or `null` (no rules). Note that a `|` inside a regex
    /// literal would be split too — use the array form for such patterns.
    pub fn parse(raw: &Value) -> Result<Self, RuleParseError> {
        let mut rules = Vec::new();
        match raw {
            Value::Null => {}
            Value::String(decl) => Self::parse_into(decl, &mut rules)?,
            Value::Array(entries) => {
                for entry in entries {
                    match entry {
                        Value::String(decl) => Self::parse_into(decl, &mut rules)?,
                        _ => return Err(RuleParseError::InvalidShape),
                    }
                }
            }
            _ => return Err(RuleParseError::InvalidShape),
        }
        Ok(Self { rules })
    }

    fn parse_into(declaration: &str, rules: &mut Vec<Rule>) -> Result<(), RuleParseError> {
        for token in declaration.split('|') {
            rules.push(Self::parse_token(token.trim())?);
        }
        Ok(())
    }

    fn parse_token(token: &str) -> Result<Rule, RuleParseError> {
        if token.is_empty() {
            return Err(RuleParseError::EmptyToken);
        }
        if let Some(literal) = token.strip_prefix("regex:") {
            return Self::parse_regex(literal);
        }
        match token.split_once(':') {
            Some((name, raw_params)) => Ok(Rule::Named {
                name: CompactString::new(name),
                params: raw_params.split(',').map(|p| p.trim().to_string()).collect(),
            }),
            None => Ok(Rule::Named {
                name: CompactString::new(token),
                params: Vec::new(),
            }),
        }
    }

    /// Parse a `/pattern/flags` (or bare `pattern`) regex literal.
    fn parse_regex(literal: &str) -> Result<Rule, RuleParseError> {
        let (pattern, flags) = match literal.strip_prefix('/') {
            Some(rest) => match rest.rfind('/') {
                Some(end) => (&rest[..end], &rest[end + 1..]),
                None => (literal, ""),
            },
            None => (literal, ""),
        };

        let mut inline = String::new();
        for flag in flags.chars() {
            match flag {
                'i' => inline.push('i'),
                'm' => inline.push('m'),
                's' => inline.push('s'),
                // `g` is meaningless for a match test
                'g' => {}
                other => return Err(RuleParseError::UnsupportedFlag(other)),
            }
        }

        let full = if inline.is_empty() {
            pattern.to_string()
        } else {
            format!("(?{inline}){pattern}")
        };
        let compiled = regex::Regex::new(&full).map_err(|source| RuleParseError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Rule::Regex {
            pattern: pattern.to_string(),
            compiled,
        })
    }

    /// Whether the set contains no rules at all.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over the rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Whether the set contains the `required` rule.
    pub fn is_required(&self) -> bool {
        self.rules.iter().any(|rule| rule.name() == "required")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pipe_string() {
        let set = RuleSet::parse(&json!("required|min:3|between:1,10")).unwrap();
        let names: Vec<_> = set.iter().map(Rule::name).collect();
        assert_eq!(names, ["required", "min", "between"]);
        assert!(set.is_required());
    }

    #[test]
    fn test_parse_array() {
        let set = RuleSet::parse(&json!(["required", "max:5"])).unwrap();
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn test_parse_params() {
        let set = RuleSet::parse(&json!("in:fr, uk ,de")).unwrap();
        match set.iter().next().unwrap() {
            Rule::Named { params, .. } => assert_eq!(params, &["fr", "uk", "de"]),
            _ => panic!("expected named rule"),
        };
    }

    #[test]
    fn test_parse_regex_literal() {
        let set = RuleSet::parse(&json!(["regex:/^ab+$/i"])).unwrap();
        match set.iter().next().unwrap() {
            Rule::Regex { compiled, .. } => {
                assert!(compiled.is_match("ABB"));
                assert!(!compiled.is_match("ba"));
            }
            _ => panic!("expected regex rule"),
        };
    }

    #[test]
    fn test_parse_regex_invalid() {
        assert!(matches!(
            RuleSet::parse(&json!(["regex:/(/"])),
            Err(RuleParseError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_parse_bad_shapes() {
        assert!(matches!(RuleSet::parse(&json!(3)), Err(RuleParseError::InvalidShape)));
        assert!(matches!(
            RuleSet::parse(&json!("required||min:1")),
            Err(RuleParseError::EmptyToken)
        ));
        assert!(matches!(
            RuleSet::parse(&json!(["regex:/a/x"])),
            Err(RuleParseError::UnsupportedFlag('x'))
        ));
    }

    #[test]
    fn test_parse_null_is_empty() {
        assert!(RuleSet::parse(&Value::Null).unwrap().is_empty());
    }
}
