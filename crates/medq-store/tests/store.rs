//! Store behaviour: references, deletes, transactions, persistence.

use medq_core::RecordId;
use medq_core::models::{
    EventState, Patient, ProcedureRequest, Questionnaire, Response, ResponseItem, QuestionType,
};
use medq_store::{Sequence, StatePersistence, Store, StoreError};

fn seed() -> (Store, RecordId, RecordId) {
    let mut store = Store::new();
    let patient = store
        .create(|id| Patient {
            id,
            name: "Ada".into(),
            ..Default::default()
        })
        .unwrap();
    let questionnaire = store
        .create(|id| Questionnaire {
            id,
            name: "Intake".into(),
            check_code: None,
        })
        .unwrap();
    (store, patient, questionnaire)
}

fn response(
    id: RecordId,
    patient_id: RecordId,
    questionnaire_id: RecordId,
    procedure_request_id: Option<RecordId>,
) -> Response {
    let now = jiff::Timestamp::now();
    Response {
        id,
        internal_identifier: format!("QR{id}"),
        questionnaire_id,
        procedure_request_id,
        patient_id,
        performer_id: None,
        service_id: None,
        state: EventState::Preparation,
        note: None,
        signature: None,
        occurrence_started_at: None,
        occurrence_completed_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn item(id: RecordId, response_id: RecordId) -> ResponseItem {
    ResponseItem {
        id,
        response_id,
        name: "Q".into(),
        required: true,
        question_type: QuestionType::Text,
        result: None,
        selection_options: None,
        options: None,
        question_id: None,
        sequence: 0,
    }
}

#[test]
fn create_checks_references() {
    let (mut store, patient, _) = seed();
    let err = store
        .create(|id| response(id, patient, RecordId(99), None))
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingReference { field: "questionnaire_id", .. }));
    assert_eq!(store.all::<Response>().count(), 0);
}

#[test]
fn procedure_request_delete_is_restricted() {
    let (mut store, patient, questionnaire) = seed();
    let request = store
        .create(|id| ProcedureRequest {
            id,
            patient_id: patient,
            performer_id: None,
            service_id: None,
            questionnaire_id: questionnaire,
            note: None,
        })
        .unwrap();
    let response_id = store
        .create(|id| response(id, patient, questionnaire, Some(request)))
        .unwrap();

    let err = store.delete::<ProcedureRequest>(request).unwrap_err();
    assert!(matches!(err, StoreError::RestrictDelete { .. }));

    store.delete::<Response>(response_id).unwrap();
    store.delete::<ProcedureRequest>(request).unwrap();
}

#[test]
fn deleting_a_response_cascades_to_items() {
    let (mut store, patient, questionnaire) = seed();
    let response_id = store
        .create(|id| response(id, patient, questionnaire, None))
        .unwrap();
    for _ in 0..3 {
        store.create(|id| item(id, response_id)).unwrap();
    }
    assert_eq!(store.items_of(response_id).len(), 3);

    store.delete::<Response>(response_id).unwrap();
    assert_eq!(store.all::<ResponseItem>().count(), 0);
}

#[test]
fn failed_transaction_restores_state() {
    let (mut store, patient, questionnaire) = seed();
    let before = serde_json::to_string(store.state()).unwrap();

    let result: Result<(), StoreError> = store.transaction(|tx| {
        tx.create(|id| response(id, patient, questionnaire, None))?;
        tx.get::<Patient>(RecordId(42))?;
        Ok(())
    });

    assert!(matches!(result, Err(StoreError::NotFound { .. })));
    assert_eq!(serde_json::to_string(store.state()).unwrap(), before);
}

#[test]
fn update_rechecks_references() {
    let (mut store, patient, questionnaire) = seed();
    let response_id = store
        .create(|id| response(id, patient, questionnaire, None))
        .unwrap();

    let err = store
        .update::<Response, StoreError>(response_id, |r| {
            r.patient_id = RecordId(77);
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingReference { field: "patient_id", .. }));
    assert_eq!(store.get::<Response>(response_id).unwrap().patient_id, patient);
}

#[test]
fn sequences() {
    let mut store = Store::new();
    assert_eq!(store.next_by_code("medical.questionnaire.response"), None);

    store
        .define_sequence(
            Sequence::new("medical.questionnaire.response", "Responses")
                .with_prefix("QR")
                .with_padding(3),
        )
        .unwrap();
    let today = jiff::civil::date(2024, 5, 1);
    assert_eq!(
        store.next_by_code_on("medical.questionnaire.response", today),
        Some("QR001".into())
    );
    assert_eq!(
        store.next_by_code_on("medical.questionnaire.response", today),
        Some("QR002".into())
    );
    assert!(matches!(
        store.define_sequence(Sequence::new("medical.questionnaire.response", "again")),
        Err(StoreError::DuplicateSequence(_))
    ));
}

#[test]
fn persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = StatePersistence::new(dir.path().join("nested").join("state.json"));

    let fresh = persistence.load().unwrap();
    assert!(fresh.patients.is_empty());

    let (store, patient, _) = seed();
    persistence.flush(store.state()).unwrap();

    let loaded = Store::from_state(persistence.load().unwrap());
    assert_eq!(loaded.get::<Patient>(patient).unwrap().name, "Ada");
    assert!(!dir.path().join("nested").join("state.json.tmp").exists());

    // ids keep counting after a reload
    let mut loaded = loaded;
    let next = loaded
        .create(|id| Patient {
            id,
            name: "Grace".into(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(next, RecordId(2));
}
