//! Completion check: evaluate the questionnaire's check code against the
//! typed answers of a response.

use medq_core::models::{QuestionDefinition, Questionnaire, Response};
use medq_core::{AnswerValue, RecordId};
use medq_expr::{Environment, Expression, Value};
use medq_store::Store;

use crate::error::WorkflowError;

pub fn answer_to_value(answer: AnswerValue) -> Value {
    match answer {
        AnswerValue::Empty => Value::None,
        AnswerValue::Text(s) => Value::Str(s),
        AnswerValue::Integer(i) => Value::Int(i),
        AnswerValue::Float(f) => Value::Float(f),
        AnswerValue::Boolean(b) => Value::Bool(b),
        AnswerValue::DateTime(dt) => Value::DateTime(dt),
    }
}

/// Variables visible to the check code: each item's typed answer under the
/// technical name of its question. Items without one are left out.
pub fn answer_environment(store: &Store, response_id: RecordId) -> Result<Environment, WorkflowError> {
    let mut env = Environment::new();
    for item in store.items_of(response_id) {
        let Some(question_id) = item.question_id else {
            continue;
        };
        let question = store.get::<QuestionDefinition>(question_id)?;
        let Some(name) = question.technical_name() else {
            continue;
        };
        env.insert(name, answer_to_value(item.typed_result()?));
    }
    Ok(env)
}

/// Fails with [`WorkflowError::CheckFailed`] when the check code is falsy.
pub fn check_completion(store: &Store, response_id: RecordId) -> Result<(), WorkflowError> {
    let response = store.get::<Response>(response_id)?;
    let questionnaire = store.get::<Questionnaire>(response.questionnaire_id)?;
    let Some(code) = questionnaire.check_code() else {
        return Ok(());
    };

    let env = answer_environment(store, response_id)?;
    let verdict = Expression::parse(code)
        .and_then(|expr| expr.evaluate(&env))
        .map_err(|source| WorkflowError::Expression {
            response: response.display_name().to_string(),
            source,
        })?;

    tracing::debug!(response_id = %response_id, verdict = %verdict, "completion check evaluated");
    if !verdict.is_truthy() {
        return Err(WorkflowError::CheckFailed {
            response: response.display_name().to_string(),
        });
    }
    Ok(())
}
