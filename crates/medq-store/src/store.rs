use std::fmt;

use serde::{Deserialize, Serialize};

use medq_core::models::{
    Patient, Practitioner, ProcedureRequest, QuestionDefinition, Questionnaire, Response,
    ResponseItem, Service,
};
use medq_core::{Model, Record, RecordId};

use crate::error::StoreError;
use crate::sequence::Sequence;
use crate::table::Table;

/// Everything the store holds. This is also the on-disk format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub patients: Table<Patient>,
    #[serde(default)]
    pub practitioners: Table<Practitioner>,
    #[serde(default)]
    pub services: Table<Service>,
    #[serde(default)]
    pub questionnaires: Table<Questionnaire>,
    #[serde(default)]
    pub questions: Table<QuestionDefinition>,
    #[serde(default)]
    pub procedure_requests: Table<ProcedureRequest>,
    #[serde(default)]
    pub responses: Table<Response>,
    #[serde(default)]
    pub items: Table<ResponseItem>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

/// A record kind with a table in [`StoreState`].
pub trait Stored: Record + Clone {
    fn table(state: &StoreState) -> &Table<Self>;

    fn table_mut(state: &mut StoreState) -> &mut Table<Self>;

    /// Check that every required or set reference points at a live record.
    fn check_references(&self, _state: &StoreState) -> Result<(), StoreError> {
        Ok(())
    }

    /// Runs before the row is removed: refuse the delete or cascade it.
    fn on_delete(_id: RecordId, _state: &mut StoreState) -> Result<(), StoreError> {
        Ok(())
    }
}

fn require<T: Stored>(
    state: &StoreState,
    model: Model,
    field: &'static str,
    id: Option<RecordId>,
) -> Result<(), StoreError> {
    match id {
        Some(id) if !T::table(state).contains(id) => Err(StoreError::MissingReference {
            model,
            field,
            target: T::MODEL,
            id,
        }),
        _ => Ok(()),
    }
}

fn restrict<T: Stored>(
    state: &StoreState,
    model: Model,
    id: RecordId,
    refers: impl Fn(&T) -> bool,
) -> Result<(), StoreError> {
    if T::table(state).iter().any(refers) {
        return Err(StoreError::RestrictDelete {
            model,
            id,
            referenced_by: T::MODEL,
        });
    }
    Ok(())
}

impl Stored for Patient {
    fn table(state: &StoreState) -> &Table<Self> {
        &state.patients
    }

    fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
        &mut state.patients
    }

    fn on_delete(id: RecordId, state: &mut StoreState) -> Result<(), StoreError> {
        restrict::<Response>(state, Self::MODEL, id, |r| r.patient_id == id)?;
        restrict::<ProcedureRequest>(state, Self::MODEL, id, |r| r.patient_id == id)
    }
}

impl Stored for Practitioner {
    fn table(state: &StoreState) -> &Table<Self> {
        &state.practitioners
    }

    fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
        &mut state.practitioners
    }

    fn on_delete(id: RecordId, state: &mut StoreState) -> Result<(), StoreError> {
        restrict::<Response>(state, Self::MODEL, id, |r| r.performer_id == Some(id))?;
        restrict::<ProcedureRequest>(state, Self::MODEL, id, |r| r.performer_id == Some(id))
    }
}

impl Stored for Service {
    fn table(state: &StoreState) -> &Table<Self> {
        &state.services
    }

    fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
        &mut state.services
    }

    fn on_delete(id: RecordId, state: &mut StoreState) -> Result<(), StoreError> {
        restrict::<Response>(state, Self::MODEL, id, |r| r.service_id == Some(id))?;
        restrict::<ProcedureRequest>(state, Self::MODEL, id, |r| r.service_id == Some(id))
    }
}

impl Stored for Questionnaire {
    fn table(state: &StoreState) -> &Table<Self> {
        &state.questionnaires
    }

    fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
        &mut state.questionnaires
    }

    fn on_delete(id: RecordId, state: &mut StoreState) -> Result<(), StoreError> {
        restrict::<Response>(state, Self::MODEL, id, |r| r.questionnaire_id == id)?;
        restrict::<ProcedureRequest>(state, Self::MODEL, id, |r| r.questionnaire_id == id)?;
        state.questions.retain(|q| q.questionnaire_id != id);
        Ok(())
    }
}

impl Stored for QuestionDefinition {
    fn table(state: &StoreState) -> &Table<Self> {
        &state.questions
    }

    fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
        &mut state.questions
    }

    fn check_references(&self, state: &StoreState) -> Result<(), StoreError> {
        require::<Questionnaire>(state, Self::MODEL, "questionnaire_id", Some(self.questionnaire_id))
    }

    fn on_delete(id: RecordId, state: &mut StoreState) -> Result<(), StoreError> {
        // Items keep their snapshot; only the link goes.
        for item in state.items.iter_mut() {
            if item.question_id == Some(id) {
                item.question_id = None;
            }
        }
        Ok(())
    }
}

impl Stored for ProcedureRequest {
    fn table(state: &StoreState) -> &Table<Self> {
        &state.procedure_requests
    }

    fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
        &mut state.procedure_requests
    }

    fn check_references(&self, state: &StoreState) -> Result<(), StoreError> {
        let model = Self::MODEL;
        require::<Patient>(state, model, "patient_id", Some(self.patient_id))?;
        require::<Questionnaire>(state, model, "questionnaire_id", Some(self.questionnaire_id))?;
        require::<Practitioner>(state, model, "performer_id", self.performer_id)?;
        require::<Service>(state, model, "service_id", self.service_id)
    }

    fn on_delete(id: RecordId, state: &mut StoreState) -> Result<(), StoreError> {
        restrict::<Response>(state, Self::MODEL, id, |r| r.procedure_request_id == Some(id))
    }
}

impl Stored for Response {
    fn table(state: &StoreState) -> &Table<Self> {
        &state.responses
    }

    fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
        &mut state.responses
    }

    fn check_references(&self, state: &StoreState) -> Result<(), StoreError> {
        let model = Self::MODEL;
        require::<Questionnaire>(state, model, "questionnaire_id", Some(self.questionnaire_id))?;
        require::<Patient>(state, model, "patient_id", Some(self.patient_id))?;
        require::<ProcedureRequest>(state, model, "procedure_request_id", self.procedure_request_id)?;
        require::<Practitioner>(state, model, "performer_id", self.performer_id)?;
        require::<Service>(state, model, "service_id", self.service_id)
    }

    fn on_delete(id: RecordId, state: &mut StoreState) -> Result<(), StoreError> {
        state.items.retain(|item| item.response_id != id);
        Ok(())
    }
}

impl Stored for ResponseItem {
    fn table(state: &StoreState) -> &Table<Self> {
        &state.items
    }

    fn table_mut(state: &mut StoreState) -> &mut Table<Self> {
        &mut state.items
    }

    fn check_references(&self, state: &StoreState) -> Result<(), StoreError> {
        require::<Response>(state, Self::MODEL, "response_id", Some(self.response_id))?;
        require::<QuestionDefinition>(state, Self::MODEL, "question_id", self.question_id)
    }
}

/// In-memory record store.
///
/// All mutation goes through typed helpers that keep references valid.
/// Callers that need several changes to land together wrap them in
/// [`Store::transaction`].
#[derive(Debug, Clone, Default)]
pub struct Store {
    state: StoreState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn into_state(self) -> StoreState {
        self.state
    }

    /// Run `f` against the store; if it fails, restore the state it started from.
    pub fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Store) -> Result<T, E>,
        E: fmt::Display,
    {
        let snapshot = self.state.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(error = %e, "transaction failed, rolling back");
                self.state = snapshot;
                Err(e)
            }
        }
    }

    /// Insert a row built from a freshly allocated id.
    ///
    /// The row is only kept if all its references resolve.
    pub fn create<T: Stored>(
        &mut self,
        build: impl FnOnce(RecordId) -> T,
    ) -> Result<RecordId, StoreError> {
        let id = T::table_mut(&mut self.state).insert_with(build);
        let checked = match T::table(&self.state).get(id) {
            Some(row) => row.check_references(&self.state),
            None => Err(StoreError::NotFound {
                model: T::MODEL,
                id,
            }),
        };
        if let Err(e) = checked {
            T::table_mut(&mut self.state).remove(id);
            return Err(e);
        }
        tracing::debug!(model = %T::MODEL, id = %id, "record created");
        Ok(id)
    }

    pub fn get<T: Stored>(&self, id: RecordId) -> Result<&T, StoreError> {
        T::table(&self.state).get(id).ok_or(StoreError::NotFound {
            model: T::MODEL,
            id,
        })
    }

    pub fn get_mut<T: Stored>(&mut self, id: RecordId) -> Result<&mut T, StoreError> {
        T::table_mut(&mut self.state)
            .get_mut(id)
            .ok_or(StoreError::NotFound {
                model: T::MODEL,
                id,
            })
    }

    pub fn exists<T: Stored>(&self, id: RecordId) -> bool {
        T::table(&self.state).contains(id)
    }

    pub fn all<'a, T: Stored + 'a>(&'a self) -> impl Iterator<Item = &'a T> {
        T::table(&self.state).iter()
    }

    /// Apply `f` to a copy of the row and store it back once its
    /// references have been re-checked.
    pub fn update<T, E>(
        &mut self,
        id: RecordId,
        f: impl FnOnce(&mut T) -> Result<(), E>,
    ) -> Result<(), E>
    where
        T: Stored,
        E: From<StoreError>,
    {
        let mut row = self.get::<T>(id)?.clone();
        f(&mut row)?;
        row.check_references(&self.state)?;
        *self.get_mut::<T>(id)? = row;
        Ok(())
    }

    pub fn delete<T: Stored>(&mut self, id: RecordId) -> Result<T, StoreError> {
        if !self.exists::<T>(id) {
            return Err(StoreError::NotFound {
                model: T::MODEL,
                id,
            });
        }
        T::on_delete(id, &mut self.state)?;
        let row = T::table_mut(&mut self.state)
            .remove(id)
            .ok_or(StoreError::NotFound {
                model: T::MODEL,
                id,
            })?;
        tracing::debug!(model = %T::MODEL, id = %id, "record deleted");
        Ok(row)
    }

    /// Questions of a questionnaire in sequence order (ties broken by id).
    pub fn questions_of(&self, questionnaire_id: RecordId) -> Vec<&QuestionDefinition> {
        let mut questions: Vec<_> = self
            .state
            .questions
            .iter()
            .filter(|q| q.questionnaire_id == questionnaire_id)
            .collect();
        questions.sort_by_key(|q| (q.sequence, q.id));
        questions
    }

    /// Items of a response in sequence order (ties broken by id).
    pub fn items_of(&self, response_id: RecordId) -> Vec<&ResponseItem> {
        let mut items: Vec<_> = self
            .state
            .items
            .iter()
            .filter(|item| item.response_id == response_id)
            .collect();
        items.sort_by_key(|item| (item.sequence, item.id));
        items
    }

    pub fn item_ids_of(&self, response_id: RecordId) -> Vec<RecordId> {
        self.items_of(response_id).iter().map(|item| item.id).collect()
    }

    /// Delete every item owned by a response. Returns how many went.
    pub fn delete_items_of(&mut self, response_id: RecordId) -> usize {
        let before = self.state.items.len();
        self.state.items.retain(|item| item.response_id != response_id);
        before - self.state.items.len()
    }

    pub fn define_sequence(&mut self, sequence: Sequence) -> Result<(), StoreError> {
        if self.sequence(&sequence.code).is_some() {
            return Err(StoreError::DuplicateSequence(sequence.code));
        }
        self.state.sequences.push(sequence);
        Ok(())
    }

    pub fn sequence(&self, code: &str) -> Option<&Sequence> {
        self.state.sequences.iter().find(|s| s.code == code)
    }

    /// Draw the next identifier of the sequence registered under `code`.
    /// `None` when no such sequence exists.
    pub fn next_by_code(&mut self, code: &str) -> Option<String> {
        let today = jiff::Zoned::now().date();
        self.next_by_code_on(code, today)
    }

    pub fn next_by_code_on(&mut self, code: &str, today: jiff::civil::Date) -> Option<String> {
        let sequence = self.state.sequences.iter_mut().find(|s| s.code == code)?;
        Some(sequence.draw(today))
    }
}
