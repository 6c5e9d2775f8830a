//! End-to-end tests of the response lifecycle against an in-memory store.

use medq_core::models::{
    EventState, NewResponse, Patient, Practitioner, ProcedureRequest, QuestionDefinition,
    QuestionType, Questionnaire, Response, ResponseItem, Service,
};
use medq_core::{CoreError, RecordId};
use medq_store::{Sequence, Store, StoreError};
use medq_workflow::{
    Context, ItemValues, WIDGET_FLAG, Workflow, WorkflowConfig, WorkflowError,
    generate_from_request_vals,
};
use serde_json::json;

struct Fixture {
    store: Store,
    workflow: Workflow,
    patient: RecordId,
    questionnaire: RecordId,
}

struct Question<'a> {
    name: &'a str,
    technical_name: Option<&'a str>,
    question_type: QuestionType,
    destination: Option<&'a str>,
}

impl<'a> Question<'a> {
    fn new(name: &'a str, question_type: QuestionType) -> Self {
        Self {
            name,
            technical_name: None,
            question_type,
            destination: None,
        }
    }

    fn named(mut self, technical_name: &'a str) -> Self {
        self.technical_name = Some(technical_name);
        self
    }

    fn writes_to(mut self, destination: &'a str) -> Self {
        self.destination = Some(destination);
        self
    }
}

impl Fixture {
    fn new(check_code: Option<&str>, questions: Vec<Question<'_>>) -> Self {
        let mut store = Store::new();
        let patient = store
            .create(|id| Patient {
                id,
                name: "Ada Lovelace".into(),
                ..Default::default()
            })
            .unwrap();
        let questionnaire = store
            .create(|id| Questionnaire {
                id,
                name: "Intake".into(),
                check_code: check_code.map(str::to_string),
            })
            .unwrap();
        for (index, question) in questions.into_iter().enumerate() {
            store
                .create(|id| QuestionDefinition {
                    id,
                    questionnaire_id: questionnaire,
                    sequence: index as i32 * 10,
                    name: question.name.to_string(),
                    technical_name: question.technical_name.map(str::to_string),
                    question_type: question.question_type,
                    required: true,
                    selection_options: None,
                    options: None,
                    destination_field: question.destination.map(str::to_string),
                    readonly: false,
                    readonly_condition: None,
                    is_invisible: false,
                    invisible_condition: None,
                })
                .unwrap();
        }
        Self {
            store,
            workflow: Workflow::new(WorkflowConfig::default().with_actor("tester")),
            patient,
            questionnaire,
        }
    }

    fn new_response(&mut self) -> RecordId {
        let values = NewResponse {
            questionnaire_id: self.questionnaire,
            procedure_request_id: None,
            patient_id: self.patient,
            performer_id: None,
            service_id: None,
            note: None,
        };
        self.workflow.create_response(&mut self.store, values).unwrap()
    }

    fn started_response(&mut self) -> RecordId {
        let id = self.new_response();
        self.workflow
            .preparation2in_progress(&mut self.store, &[id])
            .unwrap();
        id
    }

    fn response(&self, id: RecordId) -> &Response {
        self.store.get::<Response>(id).unwrap()
    }

    fn items(&self, response_id: RecordId) -> Vec<RecordId> {
        self.store.item_ids_of(response_id)
    }

    fn answer(&mut self, item: RecordId, text: &str) {
        self.workflow
            .write_items(&mut self.store, &[item], values(json!({ "result": text })))
            .unwrap();
    }

    fn snapshot(&self) -> String {
        serde_json::to_string(self.store.state()).unwrap()
    }
}

fn values(json: serde_json::Value) -> ItemValues {
    match json {
        serde_json::Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn start_generates_one_item_per_question() {
    let mut fx = Fixture::new(
        None,
        vec![
            Question::new("Age", QuestionType::Integer),
            Question::new("Smoker", QuestionType::Boolean),
            Question::new("Comments", QuestionType::Text),
        ],
    );
    let id = fx.started_response();

    let response = fx.response(id);
    assert_eq!(response.state, EventState::InProgress);
    assert!(response.occurrence_started_at.is_some());

    let questions: Vec<RecordId> = fx
        .store
        .questions_of(fx.questionnaire)
        .iter()
        .map(|q| q.id)
        .collect();
    let items = fx.store.items_of(id);
    assert_eq!(items.len(), questions.len());
    for (item, question_id) in items.iter().zip(&questions) {
        let question = fx.store.get::<QuestionDefinition>(*question_id).unwrap();
        assert_eq!(item.response_id, id);
        assert_eq!(item.question_id, Some(*question_id));
        assert_eq!(item.name, question.name);
        assert_eq!(item.question_type, question.question_type);
        assert_eq!(item.result, None);
    }
}

#[test]
fn starting_twice_is_refused_and_adds_nothing() {
    let mut fx = Fixture::new(None, vec![Question::new("Age", QuestionType::Integer)]);
    let id = fx.started_response();
    let before = fx.snapshot();

    let err = fx
        .workflow
        .preparation2in_progress(&mut fx.store, &[id])
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    assert!(err.is_validation());
    assert_eq!(fx.snapshot(), before);
}

#[test]
fn check_code_gates_completion() {
    let mut fx = Fixture::new(
        Some("a > 0"),
        vec![Question::new("A", QuestionType::Integer).named("a")],
    );

    let ok = fx.started_response();
    let item = fx.items(ok)[0];
    fx.answer(item, "5");
    fx.workflow
        .in_progress2completed(&mut fx.store, &[ok])
        .unwrap();
    assert_eq!(fx.response(ok).state, EventState::Completed);
    assert!(fx.response(ok).occurrence_completed_at.is_some());

    let bad = fx.started_response();
    let item = fx.items(bad)[0];
    fx.answer(item, "-1");
    let err = fx
        .workflow
        .in_progress2completed(&mut fx.store, &[bad])
        .unwrap_err();
    assert!(err.is_validation());
    let name = fx.response(bad).display_name().to_string();
    assert_eq!(
        err.to_string(),
        format!("Questionnaire {name} is not correctly fulfilled")
    );
    assert_eq!(fx.response(bad).state, EventState::InProgress);
}

#[test]
fn items_without_technical_name_are_not_visible_to_the_check() {
    let mut fx = Fixture::new(
        Some("a == 1"),
        vec![Question::new("Unnamed", QuestionType::Integer)],
    );
    let id = fx.started_response();
    let err = fx
        .workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Expression { .. }));
    assert!(!err.is_validation());
}

#[test]
fn unanswered_items_read_as_zero_values() {
    let mut fx = Fixture::new(
        Some("count == 0 and not flag and note is None"),
        vec![
            Question::new("Count", QuestionType::Integer).named("count"),
            Question::new("Flag", QuestionType::Boolean).named("flag"),
            Question::new("Note", QuestionType::Text).named("note"),
        ],
    );
    let id = fx.started_response();
    fx.workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap();
    assert_eq!(fx.response(id).state, EventState::Completed);
}

#[test]
fn failing_batch_leaves_every_response_untouched() {
    let mut fx = Fixture::new(
        Some("a > 0"),
        vec![Question::new("A", QuestionType::Integer).named("a")],
    );
    let good = fx.started_response();
    let bad = fx.started_response();
    let good_item = fx.items(good)[0];
    let bad_item = fx.items(bad)[0];
    fx.answer(good_item, "3");
    fx.answer(bad_item, "0");
    let before = fx.snapshot();

    let err = fx
        .workflow
        .in_progress2completed(&mut fx.store, &[good, bad])
        .unwrap_err();
    assert!(matches!(err, WorkflowError::CheckFailed { .. }));
    assert_eq!(fx.snapshot(), before);
    assert_eq!(fx.response(good).state, EventState::InProgress);
}

#[test]
fn completion_projects_typed_answers() {
    let mut fx = Fixture::new(
        None,
        vec![
            Question::new("Weight", QuestionType::Float).writes_to("patient_id.weight"),
            Question::new("Smoker", QuestionType::Boolean).writes_to("patient_id.is_smoker"),
            Question::new("Last screening", QuestionType::Date).writes_to("patient_id.last_screening"),
            Question::new("Remarks", QuestionType::Text).writes_to("note"),
        ],
    );
    let id = fx.started_response();
    let items = fx.items(id);
    fx.answer(items[0], "72.5");
    fx.answer(items[1], "yes");
    fx.answer(items[2], "2020-01-01");
    fx.answer(items[3], "all good");

    fx.workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap();

    let patient = fx.store.get::<Patient>(fx.patient).unwrap();
    assert_eq!(patient.weight, Some(72.5));
    assert!(patient.is_smoker);
    assert_eq!(
        patient.last_screening,
        Some(jiff::civil::date(2020, 1, 1).at(0, 0, 0, 0))
    );
    assert_eq!(fx.response(id).note.as_deref(), Some("all good"));
}

#[test]
fn missing_destination_field_is_a_validation_error() {
    let mut fx = Fixture::new(
        None,
        vec![Question::new("X", QuestionType::Text).writes_to("patient_id.some_field")],
    );
    let id = fx.started_response();
    let item = fx.items(id)[0];
    fx.answer(item, "x");
    let before = fx.snapshot();

    let err = fx
        .workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "Field some_field cannot be found on medical.patient"
    );
    assert_eq!(fx.snapshot(), before);
}

#[test]
fn missing_intermediate_segment_names_the_model() {
    let mut fx = Fixture::new(
        None,
        vec![Question::new("X", QuestionType::Text).writes_to("owner_id.name")],
    );
    let id = fx.started_response();
    let err = fx
        .workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Field owner_id cannot be found on medical.questionnaire.response"
    );
}

#[test]
fn scalar_segments_and_relation_targets_are_rejected() {
    let mut fx = Fixture::new(
        None,
        vec![Question::new("X", QuestionType::Text).writes_to("note.text")],
    );
    let id = fx.started_response();
    let err = fx
        .workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::NotARelation { .. })
    ));

    let mut fx = Fixture::new(
        None,
        vec![Question::new("X", QuestionType::Integer).writes_to("patient_id")],
    );
    let id = fx.started_response();
    let err = fx
        .workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::RelationNotWritable { .. })
    ));
}

#[test]
fn incompatible_value_is_a_validation_error() {
    let mut fx = Fixture::new(
        None,
        vec![Question::new("Weight", QuestionType::Text).writes_to("patient_id.weight")],
    );
    let id = fx.started_response();
    let item = fx.items(id)[0];
    fx.answer(item, "heavy");
    let err = fx
        .workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::FieldTypeMismatch { .. })
    ));
    assert!(err.is_validation());
}

#[test]
fn empty_relation_is_checked_but_not_written() {
    let mut fx = Fixture::new(
        None,
        vec![Question::new("Performer", QuestionType::Text).writes_to("performer_id.name")],
    );
    let id = fx.started_response();
    let item = fx.items(id)[0];
    fx.answer(item, "Dr. Who");
    fx.workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap();
    assert_eq!(fx.store.all::<Practitioner>().count(), 0);

    let mut fx = Fixture::new(
        None,
        vec![Question::new("Performer", QuestionType::Text).writes_to("performer_id.colour")],
    );
    let id = fx.started_response();
    let err = fx
        .workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Field colour cannot be found on medical.practitioner"
    );
}

#[test]
fn completed_responses_are_signed() {
    let mut fx = Fixture::new(None, vec![Question::new("Q", QuestionType::Text)]);
    let id = fx.started_response();
    let item = fx.items(id)[0];
    fx.answer(item, "answer");
    fx.workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap();

    let signature = fx.response(id).signature.clone().unwrap();
    assert_eq!(signature.algorithm, "sha256");
    assert_eq!(signature.digest.len(), 64);
    assert!(fx.workflow.verify_signature(&fx.store, id).unwrap());

    // tamper behind the workflow's back
    fx.store.get_mut::<ResponseItem>(item).unwrap().result = Some("changed".into());
    assert!(!fx.workflow.verify_signature(&fx.store, id).unwrap());
}

#[test]
fn completed_responses_are_locked() {
    let mut fx = Fixture::new(None, vec![Question::new("Q", QuestionType::Text)]);
    let id = fx.started_response();
    let item = fx.items(id)[0];
    fx.workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap();

    let err = fx
        .workflow
        .write_items(&mut fx.store, &[item], values(json!({ "result": "late" })))
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Locked { .. }));
    assert_eq!(fx.store.get::<ResponseItem>(item).unwrap().result, None);

    let err = fx.workflow.delete_response(&mut fx.store, id).unwrap_err();
    assert!(matches!(err, WorkflowError::Locked { .. }));
}

#[test]
fn back_to_draft_removes_items_and_signature() {
    let mut fx = Fixture::new(
        None,
        vec![
            Question::new("A", QuestionType::Text),
            Question::new("B", QuestionType::Text),
            Question::new("C", QuestionType::Text),
        ],
    );
    let id = fx.started_response();
    fx.workflow
        .in_progress2completed(&mut fx.store, &[id])
        .unwrap();
    assert_eq!(fx.items(id).len(), 3);

    fx.workflow.back_to_draft(&mut fx.store, &[id]).unwrap();

    let response = fx.response(id);
    assert_eq!(response.state, EventState::Preparation);
    assert!(response.signature.is_none());
    assert!(response.occurrence_completed_at.is_none());
    assert!(fx.items(id).is_empty());
    assert_eq!(fx.store.all::<ResponseItem>().count(), 0);

    // and it can be started again
    fx.workflow
        .preparation2in_progress(&mut fx.store, &[id])
        .unwrap();
    assert_eq!(fx.items(id).len(), 3);
}

#[test]
fn write_guard_strips_echoed_result_keys() {
    let mut fx = Fixture::new(None, vec![Question::new("Q", QuestionType::Text)]);
    let id = fx.started_response();
    let item = fx.items(id)[0];

    let mut update = ItemValues::new();
    update.insert(format!("result_{item}"), json!("ignored"));
    update.insert("result".into(), json!("kept"));
    fx.workflow
        .write_items(&mut fx.store, &[item], update)
        .unwrap();
    assert_eq!(
        fx.store.get::<ResponseItem>(item).unwrap().result.as_deref(),
        Some("kept")
    );

    let mut update = ItemValues::new();
    update.insert(format!("result_{item}"), json!("ignored"));
    update.insert("other_field".into(), json!("v"));
    let err = fx
        .workflow
        .write_items(&mut fx.store, &[item], update)
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnknownField(field) if field == "other_field"));
    assert_eq!(
        fx.store.get::<ResponseItem>(item).unwrap().result.as_deref(),
        Some("kept")
    );
}

#[test]
fn result_keys_of_other_items_are_unknown_fields() {
    let mut fx = Fixture::new(None, vec![Question::new("Q", QuestionType::Text)]);
    let id = fx.started_response();
    let item = fx.items(id)[0];

    let mut update = ItemValues::new();
    update.insert(format!("result_{}", item.0 + 100), json!("x"));
    let err = fx
        .workflow
        .write_items(&mut fx.store, &[item], update)
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnknownField(_)));
}

#[test]
fn immutable_item_fields_cannot_be_written() {
    let mut fx = Fixture::new(None, vec![Question::new("Q", QuestionType::Text)]);
    let id = fx.started_response();
    let item = fx.items(id)[0];

    for field in ["name", "required", "question_type", "technical_name"] {
        let mut update = ItemValues::new();
        update.insert(field.to_string(), json!("x"));
        let err = fx
            .workflow
            .write_items(&mut fx.store, &[item], update)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ReadonlyField(_)), "{field}");
        assert!(err.is_validation());
    }
}

#[test]
fn widget_reads_return_typed_answers() {
    let mut fx = Fixture::new(
        None,
        vec![
            Question::new("Count", QuestionType::Integer).named("count"),
            Question::new("Flag", QuestionType::Boolean),
        ],
    );
    let id = fx.started_response();
    let items = fx.items(id);
    fx.answer(items[0], "5");

    let plain = fx
        .workflow
        .read_items(&fx.store, &items, &Context::new())
        .unwrap();
    assert_eq!(plain[0].result, json!("5"));
    assert_eq!(plain[1].result, serde_json::Value::Null);
    assert_eq!(plain[0].technical_name.as_deref(), Some("count"));

    let widget = Context::new().with(WIDGET_FLAG, true);
    let typed = fx.workflow.read_items(&fx.store, &items, &widget).unwrap();
    assert_eq!(typed[0].result, json!(5));
    assert_eq!(typed[1].result, json!(false));

    let client = Context::new().with("widget_medical_questionnaire", true);
    let from_client = fx.workflow.read_items(&fx.store, &items, &client).unwrap();
    assert_eq!(from_client[0].result, json!(5));

    // the stored text is untouched
    assert_eq!(
        fx.store.get::<ResponseItem>(items[0]).unwrap().result.as_deref(),
        Some("5")
    );
}

#[test]
fn generate_from_request_copies_references() {
    let mut fx = Fixture::new(None, vec![]);
    let performer = fx
        .store
        .create(|id| Practitioner {
            id,
            name: "Dr. Smith".into(),
            identifier: None,
        })
        .unwrap();
    let service = fx
        .store
        .create(|id| Service {
            id,
            name: "Cardiology".into(),
            code: Some("CARD".into()),
        })
        .unwrap();
    let patient = fx.patient;
    let questionnaire = fx.questionnaire;
    let request = fx
        .store
        .create(|id| ProcedureRequest {
            id,
            patient_id: patient,
            performer_id: Some(performer),
            service_id: Some(service),
            questionnaire_id: questionnaire,
            note: None,
        })
        .unwrap();

    let values = generate_from_request_vals(
        fx.store.get::<ProcedureRequest>(request).unwrap(),
    );
    assert_eq!(values.procedure_request_id, Some(request));

    let id = fx
        .workflow
        .generate_from_request(&mut fx.store, request)
        .unwrap();
    let response = fx.response(id);
    assert_eq!(response.state, EventState::Preparation);
    assert_eq!(response.procedure_request_id, Some(request));
    assert_eq!(response.patient_id, patient);
    assert_eq!(response.performer_id, Some(performer));
    assert_eq!(response.service_id, Some(service));
    assert_eq!(response.questionnaire_id, questionnaire);

    let err = fx.store.delete::<ProcedureRequest>(request).unwrap_err();
    assert!(matches!(err, StoreError::RestrictDelete { .. }));
}

#[test]
fn identifiers_come_from_the_sequence() {
    let mut fx = Fixture::new(None, vec![]);
    let unnumbered = fx.new_response();
    assert_eq!(fx.response(unnumbered).internal_identifier, "/");

    fx.store
        .define_sequence(
            Sequence::new("medical.questionnaire.response", "Questionnaire responses")
                .with_prefix("QR")
                .with_padding(4),
        )
        .unwrap();
    let first = fx.new_response();
    let second = fx.new_response();
    assert_eq!(fx.response(first).internal_identifier, "QR0001");
    assert_eq!(fx.response(second).internal_identifier, "QR0002");
}

#[test]
fn fill_action_opens_the_fill_form() {
    let mut fx = Fixture::new(None, vec![]);
    let id = fx.new_response();
    let context = Context::new().with("lang", "en_US");

    let action = fx
        .workflow
        .fill_questionnaire(&fx.store, id, &context)
        .unwrap();
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json["type"], "ir.actions.act_window");
    assert_eq!(json["res_model"], "medical.questionnaire.response");
    assert_eq!(json["res_id"], id.0);
    assert_eq!(json["target"], "new");
    assert_eq!(json["view_mode"], "form");
    assert_eq!(
        json["views"],
        json!([[
            "medical_clinical_questionnaire.medical_questionnaire_response_fill_form_view",
            "form"
        ]])
    );
    assert_eq!(json["context"]["lang"], "en_US");
    assert_eq!(json["context"]["widget_medical_questionnaire"], true);
    assert!(context.get(WIDGET_FLAG).is_none());
}

#[test]
fn serializer_lists_items() {
    let mut fx = Fixture::new(
        None,
        vec![
            Question::new("First", QuestionType::Text),
            Question::new("Second", QuestionType::Text),
        ],
    );
    let id = fx.started_response();
    let items = fx.items(id);
    fx.answer(items[0], "one");

    let json = serde_json::to_value(fx.workflow.serialize(&fx.store, id).unwrap()).unwrap();
    assert_eq!(json["patient_id"], fx.patient.0);
    assert_eq!(json["state"], "in_progress");
    assert_eq!(
        json["item_ids"],
        json!([
            { "id": items[0].0, "name": "First", "result": "one" },
            { "id": items[1].0, "name": "Second", "result": null },
        ])
    );
}
