//! Records a projection can write answers into.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::answer::AnswerValue;
use crate::error::CoreError;
use crate::fields::{
    Model, Record, coerce_boolean, coerce_date, coerce_datetime, coerce_float, coerce_integer,
    coerce_text,
};
use crate::models::RecordId;

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Patient {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birth_date: Option<jiff::civil::Date>,
    /// Kilograms.
    #[serde(default)]
    pub weight: Option<f64>,
    /// Centimetres.
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub is_smoker: bool,
    #[serde(default)]
    pub children_count: Option<i64>,
    #[serde(default)]
    pub last_screening: Option<jiff::civil::DateTime>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Record for Patient {
    const MODEL: Model = Model::Patient;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_field(&mut self, field: &str, value: &AnswerValue) -> Result<(), CoreError> {
        let model = Self::MODEL;
        match field {
            "name" => self.name = coerce_text(value).unwrap_or_default(),
            "gender" => self.gender = coerce_text(value),
            "birth_date" => self.birth_date = coerce_date(model, field, value)?,
            "weight" => self.weight = coerce_float(model, field, value)?,
            "height" => self.height = coerce_float(model, field, value)?,
            "is_smoker" => self.is_smoker = coerce_boolean(model, field, value)?,
            "children_count" => self.children_count = coerce_integer(model, field, value)?,
            "last_screening" => self.last_screening = coerce_datetime(model, field, value)?,
            "notes" => self.notes = coerce_text(value),
            _ => {
                return Err(CoreError::FieldNotFound {
                    field: field.to_string(),
                    model,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Practitioner {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub identifier: Option<String>,
}

impl Record for Practitioner {
    const MODEL: Model = Model::Practitioner;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_field(&mut self, field: &str, value: &AnswerValue) -> Result<(), CoreError> {
        match field {
            "name" => self.name = coerce_text(value).unwrap_or_default(),
            "identifier" => self.identifier = coerce_text(value),
            _ => {
                return Err(CoreError::FieldNotFound {
                    field: field.to_string(),
                    model: Self::MODEL,
                });
            }
        }
        Ok(())
    }
}

/// A clinical service under which questionnaires are requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Service {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl Record for Service {
    const MODEL: Model = Model::Service;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_field(&mut self, field: &str, value: &AnswerValue) -> Result<(), CoreError> {
        match field {
            "name" => self.name = coerce_text(value).unwrap_or_default(),
            "code" => self.code = coerce_text(value),
            _ => {
                return Err(CoreError::FieldNotFound {
                    field: field.to_string(),
                    model: Self::MODEL,
                });
            }
        }
        Ok(())
    }
}
