//! Reading and writing response items.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use medq_core::models::{QuestionDefinition, QuestionType, Response, ResponseItem};
use medq_core::RecordId;
use medq_store::Store;

use crate::error::WorkflowError;

/// Context flag that switches item reads to typed answers.
pub const WIDGET_FLAG: &str = "widget_medical_questionnaire";

/// Field updates for [`crate::Workflow::write_items`], keyed by field name.
pub type ItemValues = serde_json::Map<String, serde_json::Value>;

/// Caller context passed along with reads and UI actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, serde_json::Value>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// A key counts as set when its value is truthy.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Array(a)) => !a.is_empty(),
            Some(serde_json::Value::Object(o)) => !o.is_empty(),
        }
    }

    pub fn is_widget(&self) -> bool {
        self.flag(WIDGET_FLAG)
    }
}

/// An item as read by a client, with the question's display projections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: RecordId,
    pub response_id: RecordId,
    pub name: String,
    pub required: bool,
    pub question_type: QuestionType,
    /// Raw text, or the typed answer when read in widget mode.
    pub result: serde_json::Value,
    pub selection_options: Option<String>,
    pub options: Option<String>,
    pub question_id: Option<RecordId>,
    pub sequence: i32,
    pub technical_name: Option<String>,
    pub readonly: bool,
    pub readonly_condition: Option<String>,
    pub is_invisible: bool,
    pub invisible_condition: Option<String>,
}

pub(crate) fn read_items(
    store: &Store,
    ids: &[RecordId],
    context: &Context,
) -> Result<Vec<ItemView>, WorkflowError> {
    ids.iter()
        .map(|&id| {
            let item = store.get::<ResponseItem>(id)?;
            view(store, item, context.is_widget())
        })
        .collect()
}

fn view(store: &Store, item: &ResponseItem, widget: bool) -> Result<ItemView, WorkflowError> {
    let question = match item.question_id {
        Some(question_id) => Some(store.get::<QuestionDefinition>(question_id)?),
        None => None,
    };
    let result = if widget {
        item.typed_result()?.to_json()
    } else {
        item.result
            .clone()
            .map_or(serde_json::Value::Null, serde_json::Value::String)
    };

    Ok(ItemView {
        id: item.id,
        response_id: item.response_id,
        name: item.name.clone(),
        required: item.required,
        question_type: item.question_type,
        result,
        selection_options: item.selection_options.clone(),
        options: item.options.clone(),
        question_id: item.question_id,
        sequence: item.sequence,
        technical_name: question.and_then(|q| q.technical_name()).map(str::to_string),
        readonly: question.is_some_and(|q| q.readonly),
        readonly_condition: question.and_then(|q| q.readonly_condition.clone()),
        is_invisible: question.is_some_and(|q| q.is_invisible),
        invisible_condition: question.and_then(|q| q.invisible_condition.clone()),
    })
}

/// A validated item update.
#[derive(Debug, Default)]
struct ItemPatch {
    result: Option<Option<String>>,
    selection_options: Option<Option<String>>,
    options: Option<Option<String>>,
    question_id: Option<Option<RecordId>>,
}

impl ItemPatch {
    fn apply(&self, item: &mut ResponseItem) {
        if let Some(result) = &self.result {
            item.result = result.clone();
        }
        if let Some(selection_options) = &self.selection_options {
            item.selection_options = selection_options.clone();
        }
        if let Some(options) = &self.options {
            item.options = options.clone();
        }
        if let Some(question_id) = self.question_id {
            item.question_id = question_id;
        }
    }
}

fn text_value(field: &str, value: &serde_json::Value) -> Result<Option<String>, WorkflowError> {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s.clone())),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(WorkflowError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected text, got {other}"),
        }),
    }
}

fn id_value(field: &str, value: &serde_json::Value) -> Result<Option<RecordId>, WorkflowError> {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => Ok(None),
        serde_json::Value::Number(n) => n
            .as_u64()
            .filter(|&id| id > 0)
            .map(|id| Some(RecordId(id)))
            .ok_or_else(|| WorkflowError::InvalidValue {
                field: field.to_string(),
                reason: format!("{n} is not a record id"),
            }),
        other => Err(WorkflowError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a record id, got {other}"),
        }),
    }
}

fn parse_patch(values: &ItemValues) -> Result<ItemPatch, WorkflowError> {
    let mut patch = ItemPatch::default();
    for (field, value) in values {
        match field.as_str() {
            "result" => patch.result = Some(text_value(field, value)?),
            "selection_options" => patch.selection_options = Some(text_value(field, value)?),
            "options" => patch.options = Some(text_value(field, value)?),
            "question_id" => patch.question_id = Some(id_value(field, value)?),
            "id" | "response_id" | "name" | "required" | "question_type" | "sequence"
            | "technical_name" | "readonly" | "readonly_condition" | "is_invisible"
            | "invisible_condition" => return Err(WorkflowError::ReadonlyField(field.clone())),
            _ => return Err(WorkflowError::UnknownField(field.clone())),
        }
    }
    Ok(patch)
}

/// Apply `values` to every item in `ids`. Keys of the form `result_<id>`
/// naming an item being written are the widget's per-item echo and are
/// dropped first.
pub(crate) fn write_items(
    store: &mut Store,
    ids: &[RecordId],
    mut values: ItemValues,
) -> Result<usize, WorkflowError> {
    for id in ids {
        values.remove(&format!("result_{id}"));
    }
    let patch = parse_patch(&values)?;

    for &id in ids {
        let response_id = store.get::<ResponseItem>(id)?.response_id;
        let response = store.get::<Response>(response_id)?;
        if response.is_locked() {
            return Err(WorkflowError::Locked {
                response: response.display_name().to_string(),
            });
        }
        store.update::<ResponseItem, WorkflowError>(id, |item| {
            patch.apply(item);
            Ok(())
        })?;
    }
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(json: serde_json::Value) -> ItemValues {
        match json {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn readonly_and_unknown_fields_are_rejected() {
        assert!(matches!(
            parse_patch(&values(serde_json::json!({ "name": "x" }))),
            Err(WorkflowError::ReadonlyField(f)) if f == "name"
        ));
        assert!(matches!(
            parse_patch(&values(serde_json::json!({ "colour": "x" }))),
            Err(WorkflowError::UnknownField(f)) if f == "colour"
        ));
    }

    #[test]
    fn text_fields_accept_numbers_and_null() {
        let patch = parse_patch(&values(serde_json::json!({ "result": 5, "options": null }))).unwrap();
        assert_eq!(patch.result, Some(Some("5".to_string())));
        assert_eq!(patch.options, Some(None));
        assert_eq!(patch.selection_options, None);
    }

    #[test]
    fn context_flag_truthiness() {
        let ctx = Context::new().with(WIDGET_FLAG, true).with("lang", "");
        assert!(ctx.is_widget());
        assert!(!ctx.flag("lang"));
        assert!(!Context::new().is_widget());
    }
}
