//! Writing typed answers into the fields their questions point at.

use medq_core::fields::FieldDef;
use medq_core::models::{
    Patient, Practitioner, ProcedureRequest, QuestionDefinition, Questionnaire, Response,
    ResponseItem, Service,
};
use medq_core::{AnswerValue, CoreError, DestinationPath, Model, RecordId};
use medq_store::{Store, Stored};

use crate::error::WorkflowError;

fn link_via<T: Stored>(store: &Store, id: RecordId, field: &str) -> Result<Option<RecordId>, WorkflowError> {
    Ok(store.get::<T>(id)?.link(field)?)
}

fn set_via<T: Stored>(
    store: &mut Store,
    id: RecordId,
    field: &str,
    value: &AnswerValue,
) -> Result<(), WorkflowError> {
    store.update::<T, WorkflowError>(id, |row| Ok(row.set_field(field, value)?))
}

fn follow(store: &Store, model: Model, id: RecordId, field: &str) -> Result<Option<RecordId>, WorkflowError> {
    match model {
        Model::Response => link_via::<Response>(store, id, field),
        Model::ResponseItem => link_via::<ResponseItem>(store, id, field),
        Model::Questionnaire => link_via::<Questionnaire>(store, id, field),
        Model::QuestionDefinition => link_via::<QuestionDefinition>(store, id, field),
        Model::ProcedureRequest => link_via::<ProcedureRequest>(store, id, field),
        Model::Patient => link_via::<Patient>(store, id, field),
        Model::Practitioner => link_via::<Practitioner>(store, id, field),
        Model::Service => link_via::<Service>(store, id, field),
    }
}

fn write(
    store: &mut Store,
    model: Model,
    id: RecordId,
    field: &str,
    value: &AnswerValue,
) -> Result<(), WorkflowError> {
    match model {
        Model::Response => set_via::<Response>(store, id, field, value),
        Model::ResponseItem => set_via::<ResponseItem>(store, id, field, value),
        Model::Questionnaire => set_via::<Questionnaire>(store, id, field, value),
        Model::QuestionDefinition => set_via::<QuestionDefinition>(store, id, field, value),
        Model::ProcedureRequest => set_via::<ProcedureRequest>(store, id, field, value),
        Model::Patient => set_via::<Patient>(store, id, field, value),
        Model::Practitioner => set_via::<Practitioner>(store, id, field, value),
        Model::Service => set_via::<Service>(store, id, field, value),
    }
}

/// Walk `path` from a response and write `value` into its last field.
///
/// Every segment is checked against the field table of the model reached so
/// far, even once a relation turned out empty; in that case the walk still
/// validates but nothing is written. Returns the record written to, if any.
pub fn write_destination(
    store: &mut Store,
    response_id: RecordId,
    path: &DestinationPath,
    value: &AnswerValue,
) -> Result<Option<(Model, RecordId)>, WorkflowError> {
    let mut model = Model::Response;
    let mut current = Some(response_id);

    for segment in path.relations() {
        match model.field(segment) {
            Some(FieldDef::Relation(target)) => {
                current = match current {
                    Some(id) => follow(store, model, id, segment)?,
                    None => None,
                };
                model = target;
            }
            Some(FieldDef::Scalar(_)) => {
                return Err(CoreError::NotARelation {
                    field: segment.clone(),
                    model,
                }
                .into());
            }
            None => {
                return Err(CoreError::FieldNotFound {
                    field: segment.clone(),
                    model,
                }
                .into());
            }
        }
    }

    let field = path.field();
    match model.field(field) {
        Some(FieldDef::Scalar(_)) => {}
        Some(FieldDef::Relation(_)) => {
            return Err(CoreError::RelationNotWritable {
                field: field.to_string(),
                model,
            }
            .into());
        }
        None => {
            return Err(CoreError::FieldNotFound {
                field: field.to_string(),
                model,
            }
            .into());
        }
    }

    let Some(id) = current else {
        return Ok(None);
    };
    write(store, model, id, field, value)?;
    Ok(Some((model, id)))
}

/// Project every item of a response that has a destination. Returns how
/// many values were written.
pub fn project_answers(store: &mut Store, response_id: RecordId) -> Result<usize, WorkflowError> {
    let mut targets = Vec::new();
    for item in store.items_of(response_id) {
        let Some(question_id) = item.question_id else {
            continue;
        };
        let Some(path) = store.get::<QuestionDefinition>(question_id)?.destination() else {
            continue;
        };
        targets.push((path, item.typed_result()?));
    }

    let mut written = 0;
    for (path, value) in targets {
        if let Some((model, id)) = write_destination(store, response_id, &path, &value)? {
            tracing::debug!(
                response_id = %response_id,
                destination = %path,
                target = %model,
                target_id = %id,
                "answer projected"
            );
            written += 1;
        }
    }
    Ok(written)
}
