//! The `DataSheet` field: a spreadsheet-like grid of rows keyed by
//! configured column headers.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FormError;
use crate::field::parse_config;
use crate::mapping::OptionMapping;
use crate::value::as_array;

/// One grid row: column key to cell value, in header order.
pub type SheetRow = IndexMap<String, Value>;

/// A column declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetHeader {
    pub key: String,
    pub label: Option<String>,
    /// Cell value for freshly created rows
    pub default_value: Option<Value>,
    /// Cell value overriding the source cell when a row is duplicated
    pub duplicated_value: Option<Value>,
    pub read_only: bool,
    pub show: bool,
}

impl Default for SheetHeader {
    fn default() -> Self {
        Self {
            key: String::new(),
            label: None,
            default_value: None,
            duplicated_value: None,
            read_only: false,
            show: true,
        }
    }
}

/// An in-bounds cell edit, addressed by row index and column key.
#[derive(Debug, Clone)]
pub struct CellEdit {
    pub row: usize,
    pub key: String,
    pub value: Value,
}

/// An edit outside the current grid (e.g. from pasting), addressed by row
/// index and *visible* column index.
#[derive(Debug, Clone)]
pub struct GridEdit {
    pub row: usize,
    pub col: usize,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SheetConfig {
    value: Option<Value>,
    default_value: Option<Value>,
    headers: Vec<SheetHeader>,
    min: usize,
    max: Option<usize>,
    return_empty_rows: bool,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            value: None,
            default_value: None,
            headers: Vec::new(),
            min: 0,
            max: None,
            return_empty_rows: false,
        }
    }
}

/// State of a `DataSheet` field.
#[derive(Debug, Clone)]
pub struct DataSheetState {
    pub headers: Vec<SheetHeader>,
    pub value: Vec<SheetRow>,
    pub min: usize,
    pub max: Option<usize>,
    pub return_empty_rows: bool,
    pub default_value: Option<Value>,
    pub(crate) mapping: OptionMapping,
}

impl DataSheetState {
    pub(crate) fn build(config: &Value, path: &str) -> Result<(Self, Option<Value>), FormError> {
        let parsed: SheetConfig = parse_config(config, path)?;
        let initial = parsed
            .value
            .or(parsed.default_value.clone())
            .or(Some(Value::Array(Vec::new())));
        let state = Self {
            headers: parsed.headers,
            value: Vec::new(),
            min: parsed.min,
            max: parsed.max,
            return_empty_rows: parsed.return_empty_rows,
            default_value: parsed.default_value,
            mapping: OptionMapping::from_config(config, path)?,
        };
        Ok((state, initial))
    }

    fn at_capacity(&self) -> bool {
        self.max.is_some_and(|max| self.value.len() >= max)
    }

    /// A pristine row: every header key at its `defaultValue` (or `""`).
    pub fn empty_row(&self) -> SheetRow {
        self.headers
            .iter()
            .map(|header| {
                (
                    header.key.clone(),
                    header
                        .default_value
                        .clone()
                        .unwrap_or_else(|| Value::String(String::new())),
                )
            })
            .collect()
    }

    /// Re-resolve the rows from a provided array. Keys outside the header
    /// set are dropped, unset columns are filled from header defaults,
    /// rows past `max` are dropped and the grid is padded to `min`.
    pub(crate) fn inject(&mut self, provided: &Value) {
        self.value.clear();
        for item in as_array(provided) {
            if self.at_capacity() {
                break;
            }
            let Some(object) = item.as_object() else {
                continue;
            };
            let row = self
                .headers
                .iter()
                .map(|header| {
                    let cell = object.get(&header.key).cloned().unwrap_or_else(|| {
                        header
                            .default_value
                            .clone()
                            .unwrap_or_else(|| Value::String(String::new()))
                    });
                    (header.key.clone(), cell)
                })
                .collect();
            self.value.push(row);
        }
        while self.value.len() < self.min {
            let row = self.empty_row();
            self.value.push(row);
        }
    }

    pub(crate) fn set(&mut self, value: &Value) {
        self.inject(value);
    }

    /// Apply a batch of edits. In-bounds edits address cells by key;
    /// out-of-scope edits address *visible* columns by index and may grow
    /// the grid by one row each (respecting `max`). Read-only columns
    /// swallow out-of-scope edits.
    pub(crate) fn apply_changes(&mut self, changes: &[CellEdit], out_of_scope: &[GridEdit]) {
        for change in changes {
            if let Some(row) = self.value.get_mut(change.row) {
                row.insert(change.key.clone(), change.value.clone());
            }
        }
        for change in out_of_scope {
            if change.row + 1 > self.value.len() && !self.at_capacity() {
                let row = self.empty_row();
                self.value.push(row);
            }
            let header = self
                .headers
                .iter()
                .filter(|h| h.show)
                .nth(change.col)
                .filter(|h| !h.read_only && !h.key.is_empty());
            if let Some(header) = header {
                if let Some(row) = self.value.get_mut(change.row) {
                    row.insert(header.key.clone(), change.value.clone());
                }
            }
        }
    }

    /// Insert a pristine row (at `index`, or appended). Refuses past `max`.
    pub(crate) fn add_row(&mut self, index: Option<usize>) -> bool {
        if self.at_capacity() {
            return false;
        }
        let row = self.empty_row();
        match index {
            Some(i) if i < self.value.len() => self.value.insert(i, row),
            _ => self.value.push(row),
        }
        true
    }

    /// Remove the row at `index`. Refuses below `min`.
    pub(crate) fn remove_row(&mut self, index: usize) -> bool {
        if self.value.len() <= self.min || index >= self.value.len() {
            return false;
        }
        self.value.remove(index);
        true
    }

    pub(crate) fn move_row(&mut self, index: usize, new_index: usize) -> bool {
        if index >= self.value.len() || new_index >= self.value.len() || index == new_index {
            return false;
        }
        let row = self.value.remove(index);
        self.value.insert(new_index, row);
        true
    }

    /// Copy the row at `index` right below it, with `duplicatedValue`
    /// header overrides applied. Refuses past `max`.
    pub(crate) fn duplicate_row(&mut self, index: usize) -> bool {
        if self.at_capacity() || index >= self.value.len() {
            return false;
        }
        let mut row = self.value[index].clone();
        for header in &self.headers {
            if let Some(value) = &header.duplicated_value {
                row.insert(header.key.clone(), value.clone());
            }
        }
        self.value.insert(index + 1, row);
        true
    }

    /// Raw output: rows as JSON objects, rows identical to a pristine row
    /// filtered out unless `returnEmptyRows`.
    pub(crate) fn raw_value(&self) -> Value {
        let empty = self.empty_row();
        Value::Array(
            self.value
                .iter()
                .filter(|row| self.return_empty_rows || **row != empty)
                .map(|row| {
                    Value::Object(row.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                })
                .collect(),
        )
    }

    pub(crate) fn default_value_json(&self) -> Value {
        self.default_value
            .clone()
            .unwrap_or_else(|| Value::Array(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sheet(extra: Value) -> DataSheetState {
        let mut config = json!({
            "headers": [
                {"key": "name", "label": "Name"},
                {"key": "qty", "label": "Quantity", "defaultValue": 0},
                {"key": "id", "show": false},
                {"key": "lock", "readOnly": true},
            ]
        });
        if let (Some(target), Some(source)) = (config.as_object_mut(), extra.as_object()) {
            for (k, v) in source {
                target.insert(k.clone(), v.clone());
            }
        }
        DataSheetState::build(&config, "/sheet").unwrap().0
    }

    #[test]
    fn test_inject_fills_defaults_and_drops_unknown_keys() {
        let mut state = sheet(json!({}));
        state.inject(&json!([{"name": "bolt", "weight": 3}]));
        assert_eq!(state.value[0]["name"], json!("bolt"));
        assert_eq!(state.value[0]["qty"], json!(0));
        assert!(!state.value[0].contains_key("weight"));
    }

    #[test]
    fn test_empty_rows_filtered_from_output() {
        let mut state = sheet(json!({"min": 2}));
        state.inject(&json!([{"name": "bolt"}]));
        assert_eq!(state.value.len(), 2);
        // the padding row equals a pristine row and is dropped on read
        assert_eq!(state.raw_value().as_array().unwrap().len(), 1);

        let mut keep = sheet(json!({"min": 2, "returnEmptyRows": true}));
        keep.inject(&json!([{"name": "bolt"}]));
        assert_eq!(keep.raw_value().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_apply_changes_grows_and_respects_visibility() {
        let mut state = sheet(json!({}));
        state.inject(&json!([{"name": "bolt"}]));
        state.apply_changes(
            &[CellEdit { row: 0, key: "qty".into(), value: json!(5) }],
            &[
                // visible col 2 is "lock" (readOnly): swallowed
                GridEdit { row: 1, col: 2, value: json!("x") },
                // visible col 0 is "name"
                GridEdit { row: 1, col: 0, value: json!("nut") },
            ],
        );
        assert_eq!(state.value[0]["qty"], json!(5));
        assert_eq!(state.value.len(), 2);
        assert_eq!(state.value[1]["name"], json!("nut"));
        assert_eq!(state.value[1]["lock"], json!(""));
    }

    #[test]
    fn test_row_cardinality() {
        let mut state = sheet(json!({"min": 1, "max": 2}));
        state.inject(&json!([{"name": "a"}, {"name": "b"}, {"name": "c"}]));
        assert_eq!(state.value.len(), 2);
        assert!(!state.add_row(None));
        assert!(state.remove_row(0));
        assert!(!state.remove_row(0));
    }

    #[test]
    fn test_duplicate_row_override() {
        let mut state = sheet(json!({
            "headers": [
                {"key": "name"},
                {"key": "id", "duplicatedValue": ""},
            ]
        }));
        state.inject(&json!([{"name": "bolt", "id": "b-1"}]));
        assert!(state.duplicate_row(0));
        assert_eq!(state.value[1]["name"], json!("bolt"));
        assert_eq!(state.value[1]["id"], json!(""));
    }
}
