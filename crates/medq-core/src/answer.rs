use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::models::question::QuestionType;

/// Canonical date-time text format for stored answers.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_LENGTH: usize = 19;
const DATE_LENGTH: usize = 10;

/// A typed answer, produced from the raw stored text by [`transform_result`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum AnswerValue {
    /// No answer for a type without a natural zero (text, date, selection).
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(jiff::civil::DateTime),
}

impl AnswerValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::DateTime(_) => "date",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Plain JSON rendering, as handed to the filling UI in widget mode.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Empty => serde_json::Value::Null,
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::DateTime(dt) => serde_json::Value::String(format_datetime(*dt)),
        }
    }
}

/// Interpret the raw stored text of an answer according to its question type.
///
/// An unanswered item (`None` or empty text) reads as the type's zero value:
/// `0`, `0.0`, `false`, or [`AnswerValue::Empty`] for the other types.
pub fn transform_result(
    question_type: QuestionType,
    raw: Option<&str>,
) -> Result<AnswerValue, CoreError> {
    let raw = raw.filter(|r| !r.is_empty());

    let value = match (question_type, raw) {
        (QuestionType::Integer, None) => AnswerValue::Integer(0),
        (QuestionType::Integer, Some(r)) => {
            let parsed = r.trim().parse::<i64>().map_err(|e| CoreError::MalformedAnswer {
                raw: r.to_string(),
                expected: "integer",
                reason: e.to_string(),
            })?;
            AnswerValue::Integer(parsed)
        }
        (QuestionType::Float, None) => AnswerValue::Float(0.0),
        (QuestionType::Float, Some(r)) => {
            let parsed = r.trim().parse::<f64>().map_err(|e| CoreError::MalformedAnswer {
                raw: r.to_string(),
                expected: "float",
                reason: e.to_string(),
            })?;
            AnswerValue::Float(parsed)
        }
        (QuestionType::Boolean, r) => AnswerValue::Boolean(r.is_some()),
        (QuestionType::Date, None) => AnswerValue::Empty,
        (QuestionType::Date, Some(r)) => AnswerValue::DateTime(parse_datetime(r)?),
        (_, None) => AnswerValue::Empty,
        (_, Some(r)) => AnswerValue::Text(r.to_string()),
    };

    Ok(value)
}

/// Parse the canonical date-time format. A bare date gets midnight and
/// anything past the seconds (fractions, offsets) is ignored.
pub fn parse_datetime(raw: &str) -> Result<jiff::civil::DateTime, CoreError> {
    let head = raw.get(..DATETIME_LENGTH).unwrap_or(raw);
    let normalized = if head.len() == DATE_LENGTH {
        format!("{head} 00:00:00")
    } else {
        head.to_string()
    };

    jiff::civil::DateTime::strptime(DATETIME_FORMAT, &normalized).map_err(|e| {
        CoreError::MalformedAnswer {
            raw: raw.to_string(),
            expected: "date",
            reason: e.to_string(),
        }
    })
}

pub fn format_datetime(dt: jiff::civil::DateTime) -> String {
    dt.strftime(DATETIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn integer_parses_with_whitespace() {
        assert_eq!(
            transform_result(QuestionType::Integer, Some("3")).unwrap(),
            AnswerValue::Integer(3)
        );
        assert_eq!(
            transform_result(QuestionType::Integer, Some(" -12 ")).unwrap(),
            AnswerValue::Integer(-12)
        );
    }

    #[test]
    fn malformed_integer_is_an_error() {
        let err = transform_result(QuestionType::Integer, Some("3.5")).unwrap_err();
        assert!(matches!(err, CoreError::MalformedAnswer { expected: "integer", .. }));
    }

    #[test]
    fn malformed_float_is_an_error() {
        assert!(transform_result(QuestionType::Float, Some("abc")).is_err());
        assert_eq!(
            transform_result(QuestionType::Float, Some("1.25")).unwrap(),
            AnswerValue::Float(1.25)
        );
    }

    #[test]
    fn boolean_is_text_truthiness() {
        for raw in ["true", "1", "no"] {
            assert_eq!(
                transform_result(QuestionType::Boolean, Some(raw)).unwrap(),
                AnswerValue::Boolean(true)
            );
        }
        assert_eq!(
            transform_result(QuestionType::Boolean, Some("")).unwrap(),
            AnswerValue::Boolean(false)
        );
        assert_eq!(
            transform_result(QuestionType::Boolean, None).unwrap(),
            AnswerValue::Boolean(false)
        );
    }

    #[test]
    fn date_uses_canonical_format() {
        assert_eq!(
            transform_result(QuestionType::Date, Some("2020-01-01 00:00:00")).unwrap(),
            AnswerValue::DateTime(date(2020, 1, 1).at(0, 0, 0, 0))
        );
        assert_eq!(
            transform_result(QuestionType::Date, Some("2021-06-30")).unwrap(),
            AnswerValue::DateTime(date(2021, 6, 30).at(0, 0, 0, 0))
        );
        assert_eq!(
            transform_result(QuestionType::Date, Some("2021-06-30 08:15:00.123456")).unwrap(),
            AnswerValue::DateTime(date(2021, 6, 30).at(8, 15, 0, 0))
        );
        assert!(transform_result(QuestionType::Date, Some("30/06/2021")).is_err());
    }

    #[test]
    fn other_types_pass_through() {
        assert_eq!(
            transform_result(QuestionType::Text, Some("x")).unwrap(),
            AnswerValue::Text("x".into())
        );
        assert_eq!(
            transform_result(QuestionType::Selection, Some("opt_a")).unwrap(),
            AnswerValue::Text("opt_a".into())
        );
        assert_eq!(
            transform_result(QuestionType::Text, None).unwrap(),
            AnswerValue::Empty
        );
    }

    #[test]
    fn unanswered_numbers_read_as_zero() {
        assert_eq!(
            transform_result(QuestionType::Integer, None).unwrap(),
            AnswerValue::Integer(0)
        );
        assert_eq!(
            transform_result(QuestionType::Float, Some("")).unwrap(),
            AnswerValue::Float(0.0)
        );
    }

    #[test]
    fn json_rendering() {
        assert_eq!(AnswerValue::Integer(3).to_json(), serde_json::json!(3));
        assert_eq!(
            AnswerValue::DateTime(date(2020, 1, 1).at(10, 0, 0, 0)).to_json(),
            serde_json::json!("2020-01-01 10:00:00")
        );
        assert_eq!(AnswerValue::Empty.to_json(), serde_json::Value::Null);
    }
}
