use serde::Serialize;

use medq_core::models::Response;
use medq_core::{EventState, RecordId};
use medq_store::Store;

use crate::error::WorkflowError;

/// External representation of a response, also the document that gets signed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDocument {
    pub id: RecordId,
    pub internal_identifier: String,
    pub state: EventState,
    pub questionnaire_id: RecordId,
    pub service_id: Option<RecordId>,
    pub performer_id: Option<RecordId>,
    pub procedure_request_id: Option<RecordId>,
    pub patient_id: RecordId,
    pub item_ids: Vec<ItemEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemEntry {
    pub id: RecordId,
    pub name: String,
    pub result: Option<String>,
}

pub fn generate_serializer(store: &Store, response_id: RecordId) -> Result<ResponseDocument, WorkflowError> {
    let response = store.get::<Response>(response_id)?;
    let item_ids = store
        .items_of(response_id)
        .into_iter()
        .map(|item| ItemEntry {
            id: item.id,
            name: item.name.clone(),
            result: item.result.clone(),
        })
        .collect();

    Ok(ResponseDocument {
        id: response.id,
        internal_identifier: response.internal_identifier.clone(),
        state: response.state,
        questionnaire_id: response.questionnaire_id,
        service_id: response.service_id,
        performer_id: response.performer_id,
        procedure_request_id: response.procedure_request_id,
        patient_id: response.patient_id,
        item_ids,
    })
}
