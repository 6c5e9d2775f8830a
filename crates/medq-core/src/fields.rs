//! Explicit field tables used to resolve destination paths.
//!
//! Each record kind declares which of its fields are many-to-one relations
//! (and to which model) and which are scalar values a projection may write.
//! Lookups never go through reflection: a name absent from the table simply
//! does not exist.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::answer::{AnswerValue, format_datetime};
use crate::error::CoreError;
use crate::models::RecordId;

/// The record kinds known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Model {
    Response,
    ResponseItem,
    Questionnaire,
    QuestionDefinition,
    ProcedureRequest,
    Patient,
    Practitioner,
    Service,
}

impl Model {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Response => "medical.questionnaire.response",
            Self::ResponseItem => "medical.questionnaire.response.item",
            Self::Questionnaire => "medical.questionnaire",
            Self::QuestionDefinition => "medical.questionnaire.item",
            Self::ProcedureRequest => "medical.procedure.request",
            Self::Patient => "medical.patient",
            Self::Practitioner => "medical.practitioner",
            Self::Service => "medical.service",
        }
    }

    fn table(&self) -> &'static [(&'static str, FieldDef)] {
        use FieldDef::{Relation, Scalar};
        match self {
            Self::Response => &[
                ("questionnaire_id", Relation(Model::Questionnaire)),
                ("procedure_request_id", Relation(Model::ProcedureRequest)),
                ("patient_id", Relation(Model::Patient)),
                ("performer_id", Relation(Model::Practitioner)),
                ("service_id", Relation(Model::Service)),
                ("note", Scalar(FieldKind::Text)),
            ],
            Self::ProcedureRequest => &[
                ("questionnaire_id", Relation(Model::Questionnaire)),
                ("patient_id", Relation(Model::Patient)),
                ("performer_id", Relation(Model::Practitioner)),
                ("service_id", Relation(Model::Service)),
                ("note", Scalar(FieldKind::Text)),
            ],
            Self::Patient => &[
                ("name", Scalar(FieldKind::Text)),
                ("gender", Scalar(FieldKind::Text)),
                ("birth_date", Scalar(FieldKind::Date)),
                ("weight", Scalar(FieldKind::Float)),
                ("height", Scalar(FieldKind::Float)),
                ("is_smoker", Scalar(FieldKind::Boolean)),
                ("children_count", Scalar(FieldKind::Integer)),
                ("last_screening", Scalar(FieldKind::DateTime)),
                ("notes", Scalar(FieldKind::Text)),
            ],
            Self::Practitioner => &[
                ("name", Scalar(FieldKind::Text)),
                ("identifier", Scalar(FieldKind::Text)),
            ],
            Self::Service => &[
                ("name", Scalar(FieldKind::Text)),
                ("code", Scalar(FieldKind::Text)),
            ],
            Self::Questionnaire => &[("name", Scalar(FieldKind::Text))],
            // Not reachable as projection targets.
            Self::ResponseItem | Self::QuestionDefinition => &[],
        }
    }

    /// Look up a field declared on this model.
    pub fn field(&self, name: &str) -> Option<FieldDef> {
        self.table()
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, def)| *def)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDef {
    /// Many-to-one link to another model.
    Relation(Model),
    Scalar(FieldKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
        })
    }
}

/// A record that destination paths can walk through and write into.
pub trait Record {
    const MODEL: Model;

    fn id(&self) -> RecordId;

    /// Follow a many-to-one field. `Ok(None)` means the link is empty.
    fn link(&self, field: &str) -> Result<Option<RecordId>, CoreError> {
        Err(CoreError::FieldNotFound {
            field: field.to_string(),
            model: Self::MODEL,
        })
    }

    /// Write a typed value into a scalar field.
    fn set_field(&mut self, field: &str, _value: &AnswerValue) -> Result<(), CoreError> {
        Err(CoreError::FieldNotFound {
            field: field.to_string(),
            model: Self::MODEL,
        })
    }
}

fn mismatch(model: Model, field: &str, expected: FieldKind, value: &AnswerValue) -> CoreError {
    CoreError::FieldTypeMismatch {
        field: field.to_string(),
        model,
        expected,
        actual: value.kind_name(),
    }
}

/// Text fields take any value in its display form.
pub fn coerce_text(value: &AnswerValue) -> Option<String> {
    match value {
        AnswerValue::Empty => None,
        AnswerValue::Text(s) => Some(s.clone()),
        AnswerValue::Integer(i) => Some(i.to_string()),
        AnswerValue::Float(f) => Some(f.to_string()),
        AnswerValue::Boolean(b) => Some(b.to_string()),
        AnswerValue::DateTime(dt) => Some(format_datetime(*dt)),
    }
}

pub fn coerce_integer(model: Model, field: &str, value: &AnswerValue) -> Result<Option<i64>, CoreError> {
    match value {
        AnswerValue::Empty => Ok(None),
        AnswerValue::Integer(i) => Ok(Some(*i)),
        AnswerValue::Boolean(b) => Ok(Some(i64::from(*b))),
        other => Err(mismatch(model, field, FieldKind::Integer, other)),
    }
}

pub fn coerce_float(model: Model, field: &str, value: &AnswerValue) -> Result<Option<f64>, CoreError> {
    match value {
        AnswerValue::Empty => Ok(None),
        AnswerValue::Integer(i) => Ok(Some(*i as f64)),
        AnswerValue::Float(f) => Ok(Some(*f)),
        other => Err(mismatch(model, field, FieldKind::Float, other)),
    }
}

pub fn coerce_boolean(model: Model, field: &str, value: &AnswerValue) -> Result<bool, CoreError> {
    match value {
        AnswerValue::Empty => Ok(false),
        AnswerValue::Boolean(b) => Ok(*b),
        other => Err(mismatch(model, field, FieldKind::Boolean, other)),
    }
}

pub fn coerce_date(model: Model, field: &str, value: &AnswerValue) -> Result<Option<jiff::civil::Date>, CoreError> {
    match value {
        AnswerValue::Empty => Ok(None),
        AnswerValue::DateTime(dt) => Ok(Some(dt.date())),
        other => Err(mismatch(model, field, FieldKind::Date, other)),
    }
}

pub fn coerce_datetime(
    model: Model,
    field: &str,
    value: &AnswerValue,
) -> Result<Option<jiff::civil::DateTime>, CoreError> {
    match value {
        AnswerValue::Empty => Ok(None),
        AnswerValue::DateTime(dt) => Ok(Some(*dt)),
        other => Err(mismatch(model, field, FieldKind::DateTime, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_distinguish_relations_and_scalars() {
        assert_eq!(
            Model::Response.field("patient_id"),
            Some(FieldDef::Relation(Model::Patient))
        );
        assert_eq!(
            Model::Patient.field("weight"),
            Some(FieldDef::Scalar(FieldKind::Float))
        );
        assert_eq!(Model::Patient.field("some_field"), None);
    }

    #[test]
    fn float_fields_accept_integers() {
        assert_eq!(
            coerce_float(Model::Patient, "weight", &AnswerValue::Integer(70)).unwrap(),
            Some(70.0)
        );
        assert!(coerce_float(Model::Patient, "weight", &AnswerValue::Text("x".into())).is_err());
    }
}
