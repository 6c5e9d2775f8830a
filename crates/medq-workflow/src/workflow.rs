use medq_audit::{AuditAction, AuditEvent};
use medq_core::models::{EventState, NewResponse, ProcedureRequest, Response};
use medq_core::{Model, RecordId};
use medq_store::Store;

use crate::action::{self, WindowAction};
use crate::check::check_completion;
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::items::{self, Context, ItemValues, ItemView};
use crate::lifecycle::EventLifecycle;
use crate::projection::project_answers;
use crate::serializer::{ResponseDocument, generate_serializer};
use crate::signing::{self, DocumentSigner, Sha256Signer};

/// Creation values copied from a procedure request.
pub fn generate_from_request_vals(request: &ProcedureRequest) -> NewResponse {
    NewResponse {
        questionnaire_id: request.questionnaire_id,
        procedure_request_id: Some(request.id),
        patient_id: request.patient_id,
        performer_id: request.performer_id,
        service_id: request.service_id,
        note: None,
    }
}

/// Entry point for everything that happens to questionnaire responses.
///
/// Each mutating operation runs in one store transaction: it either applies
/// to the whole batch or leaves the store untouched. Audit events are only
/// emitted once the transaction has gone through.
pub struct Workflow<S = Sha256Signer> {
    config: WorkflowConfig,
    signer: S,
}

impl Workflow {
    pub fn new(config: WorkflowConfig) -> Self {
        Self::with_signer(config, Sha256Signer)
    }
}

impl<S: DocumentSigner> Workflow<S> {
    pub fn with_signer(config: WorkflowConfig, signer: S) -> Self {
        Self { config, signer }
    }

    fn audit(&self, action: AuditAction, model: Model, id: RecordId) -> AuditEvent {
        AuditEvent::new(action, model, id, self.config.actor.as_str())
    }

    fn run<T>(
        &self,
        store: &mut Store,
        f: impl FnOnce(&mut Store, &mut Vec<AuditEvent>) -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError> {
        let mut events = Vec::new();
        let value = store.transaction(|tx| f(tx, &mut events))?;
        for event in &events {
            event.emit();
        }
        Ok(value)
    }

    fn next_identifier(&self, store: &mut Store) -> String {
        store
            .next_by_code(&self.config.sequence_code)
            .unwrap_or_else(|| self.config.fallback_identifier.clone())
    }

    fn insert_response(
        &self,
        store: &mut Store,
        values: NewResponse,
        events: &mut Vec<AuditEvent>,
    ) -> Result<RecordId, WorkflowError> {
        let internal_identifier = self.next_identifier(store);
        let now = jiff::Timestamp::now();
        let id = store.create(|id| Response {
            id,
            internal_identifier: internal_identifier.clone(),
            questionnaire_id: values.questionnaire_id,
            procedure_request_id: values.procedure_request_id,
            patient_id: values.patient_id,
            performer_id: values.performer_id,
            service_id: values.service_id,
            state: EventState::Preparation,
            note: values.note,
            signature: None,
            occurrence_started_at: None,
            occurrence_completed_at: None,
            created_at: now,
            updated_at: now,
        })?;
        tracing::info!(response_id = %id, identifier = %internal_identifier, "response created");
        events.push(
            self.audit(AuditAction::Create, Model::Response, id)
                .with_details(serde_json::json!({ "internal_identifier": internal_identifier })),
        );
        Ok(id)
    }

    /// Create a response in its initial state, numbered from the response
    /// sequence (or the fallback identifier when none is configured).
    pub fn create_response(
        &self,
        store: &mut Store,
        values: NewResponse,
    ) -> Result<RecordId, WorkflowError> {
        self.run(store, |tx, events| self.insert_response(tx, values, events))
    }

    pub fn generate_from_request(
        &self,
        store: &mut Store,
        request_id: RecordId,
    ) -> Result<RecordId, WorkflowError> {
        self.run(store, |tx, events| {
            let values = generate_from_request_vals(tx.get::<ProcedureRequest>(request_id)?);
            let id = self.insert_response(tx, values, events)?;
            tracing::info!(response_id = %id, request_id = %request_id, "response generated from request");
            Ok(id)
        })
    }

    /// Start filling: one item per question of the questionnaire, then
    /// preparation -> in_progress.
    pub fn preparation2in_progress(
        &self,
        store: &mut Store,
        ids: &[RecordId],
    ) -> Result<(), WorkflowError> {
        self.run(store, |tx, events| {
            let now = jiff::Timestamp::now();
            for &id in ids {
                let mut response = tx.get::<Response>(id)?.clone();
                response.preparation2in_progress(now)?;

                let questions: Vec<_> = tx
                    .questions_of(response.questionnaire_id)
                    .into_iter()
                    .cloned()
                    .collect();
                for question in &questions {
                    let values = question.generate_question(id);
                    let item_id = tx.create(|item_id| values.into_item(item_id))?;
                    tracing::debug!(response_id = %id, item_id = %item_id, question_id = %question.id, "item generated");
                }

                *tx.get_mut::<Response>(id)? = response;
                tracing::info!(response_id = %id, items = questions.len(), "response started");
                events.push(
                    self.audit(AuditAction::Start, Model::Response, id)
                        .with_details(serde_json::json!({ "items": questions.len() })),
                );
            }
            Ok(())
        })
    }

    /// Finish filling. The check code of every response is evaluated before
    /// any of them changes state; then the answers are projected into their
    /// destination fields and each response is signed.
    pub fn in_progress2completed(
        &self,
        store: &mut Store,
        ids: &[RecordId],
    ) -> Result<(), WorkflowError> {
        self.run(store, |tx, events| {
            for &id in ids {
                check_completion(tx, id)?;
            }

            let now = jiff::Timestamp::now();
            for &id in ids {
                let mut response = tx.get::<Response>(id)?.clone();
                response.in_progress2completed(now)?;
                *tx.get_mut::<Response>(id)? = response;
                events.push(self.audit(AuditAction::Complete, Model::Response, id));
            }

            for &id in ids {
                let written = project_answers(tx, id)?;
                if written > 0 {
                    events.push(
                        self.audit(AuditAction::Project, Model::Response, id)
                            .with_details(serde_json::json!({ "fields_written": written })),
                    );
                }
                let signature = signing::sign_document(tx, &self.signer, id)?;
                events.push(
                    self.audit(AuditAction::Sign, Model::Response, id).with_details(
                        serde_json::json!({
                            "algorithm": signature.algorithm,
                            "digest": signature.digest,
                        }),
                    ),
                );
                tracing::info!(response_id = %id, "response completed");
            }
            Ok(())
        })
    }

    /// Back to preparation from any state: items are deleted and the
    /// signature and completion stamp are cleared.
    pub fn back_to_draft(&self, store: &mut Store, ids: &[RecordId]) -> Result<(), WorkflowError> {
        self.run(store, |tx, events| {
            let now = jiff::Timestamp::now();
            for &id in ids {
                let mut response = tx.get::<Response>(id)?.clone();
                let removed = tx.delete_items_of(id);
                response.signature = None;
                response.force_state(EventState::Preparation, now);
                *tx.get_mut::<Response>(id)? = response;

                tracing::info!(response_id = %id, items_removed = removed, "response reverted to draft");
                events.push(
                    self.audit(AuditAction::RevertToDraft, Model::Response, id)
                        .with_details(serde_json::json!({ "items_removed": removed })),
                );
            }
            Ok(())
        })
    }

    /// Delete a response and its items. Completed responses are kept.
    pub fn delete_response(&self, store: &mut Store, id: RecordId) -> Result<(), WorkflowError> {
        self.run(store, |tx, events| {
            let response = tx.get::<Response>(id)?;
            if response.is_locked() {
                return Err(WorkflowError::Locked {
                    response: response.display_name().to_string(),
                });
            }
            tx.delete::<Response>(id)?;
            tracing::info!(response_id = %id, "response deleted");
            events.push(self.audit(AuditAction::Delete, Model::Response, id));
            Ok(())
        })
    }

    pub fn write_items(
        &self,
        store: &mut Store,
        ids: &[RecordId],
        values: ItemValues,
    ) -> Result<(), WorkflowError> {
        self.run(store, |tx, events| {
            let fields: Vec<String> = values.keys().cloned().collect();
            let written = items::write_items(tx, ids, values)?;
            tracing::debug!(items = written, "items written");
            for &id in ids {
                events.push(
                    self.audit(AuditAction::WriteItems, Model::ResponseItem, id)
                        .with_details(serde_json::json!({ "fields": fields })),
                );
            }
            Ok(())
        })
    }

    /// Read items. With the widget flag set in `context`, `result` carries
    /// the typed answer instead of the raw text.
    pub fn read_items(
        &self,
        store: &Store,
        ids: &[RecordId],
        context: &Context,
    ) -> Result<Vec<ItemView>, WorkflowError> {
        items::read_items(store, ids, context)
    }

    /// All items of a response, in question order.
    pub fn response_items(
        &self,
        store: &Store,
        response_id: RecordId,
        context: &Context,
    ) -> Result<Vec<ItemView>, WorkflowError> {
        store.get::<Response>(response_id)?;
        let ids = store.item_ids_of(response_id);
        items::read_items(store, &ids, context)
    }

    pub fn fill_questionnaire(
        &self,
        store: &Store,
        response_id: RecordId,
        context: &Context,
    ) -> Result<WindowAction, WorkflowError> {
        action::fill_questionnaire(store, response_id, context)
    }

    pub fn serialize(
        &self,
        store: &Store,
        response_id: RecordId,
    ) -> Result<ResponseDocument, WorkflowError> {
        generate_serializer(store, response_id)
    }

    pub fn verify_signature(
        &self,
        store: &Store,
        response_id: RecordId,
    ) -> Result<bool, WorkflowError> {
        signing::verify_signature(store, &self.signer, response_id)
    }
}
