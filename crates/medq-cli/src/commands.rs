use std::path::Path;

use eyre::{Result, WrapErr};
use serde::Deserialize;

use medq_core::RecordId;
use medq_core::models::{
    NewResponse, Patient, Practitioner, ProcedureRequest, QuestionDefinition, QuestionType,
    Questionnaire, Response, Service,
};
use medq_store::{Sequence, StatePersistence, Store, StoreError};
use medq_workflow::config::RESPONSE_SEQUENCE_CODE;
use medq_workflow::{Context, ItemValues, WIDGET_FLAG, Workflow, WorkflowConfig, WorkflowError};

use crate::Commands;
use crate::config::{self, MedqConfig};

/// Questionnaire import format.
#[derive(Debug, Deserialize)]
struct QuestionnaireImport {
    name: String,
    #[serde(default)]
    check_code: Option<String>,
    #[serde(default)]
    questions: Vec<QuestionImport>,
}

#[derive(Debug, Deserialize)]
struct QuestionImport {
    name: String,
    question_type: QuestionType,
    #[serde(default)]
    technical_name: Option<String>,
    #[serde(default = "default_required")]
    required: bool,
    #[serde(default)]
    selection_options: Option<String>,
    #[serde(default)]
    options: Option<String>,
    #[serde(default)]
    destination_field: Option<String>,
    #[serde(default)]
    readonly: bool,
    #[serde(default)]
    readonly_condition: Option<String>,
    #[serde(default)]
    is_invisible: bool,
    #[serde(default)]
    invisible_condition: Option<String>,
}

fn default_required() -> bool {
    true
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_date(raw: &str) -> Result<jiff::civil::Date> {
    raw.parse::<jiff::civil::Date>()
        .wrap_err_with(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

fn import_questionnaire(store: &mut Store, path: &Path) -> Result<RecordId> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let import: QuestionnaireImport = serde_json::from_str(&contents)?;

    let id = store.transaction(|tx| -> Result<RecordId, StoreError> {
        let questionnaire_id = tx.create(|id| Questionnaire {
            id,
            name: import.name,
            check_code: import.check_code,
        })?;
        for (index, question) in import.questions.into_iter().enumerate() {
            tx.create(|id| QuestionDefinition {
                id,
                questionnaire_id,
                sequence: (index as i32 + 1) * 10,
                name: question.name,
                technical_name: question.technical_name,
                question_type: question.question_type,
                required: question.required,
                selection_options: question.selection_options,
                options: question.options,
                destination_field: question.destination_field,
                readonly: question.readonly,
                readonly_condition: question.readonly_condition,
                is_invisible: question.is_invisible,
                invisible_condition: question.invisible_condition,
            })?;
        }
        Ok(questionnaire_id)
    })?;
    Ok(id)
}

fn report(error: WorkflowError) -> eyre::Report {
    if error.is_validation() {
        eyre::eyre!("validation failed: {error}")
    } else {
        eyre::Report::new(error)
    }
}

pub fn run(command: Commands, config: MedqConfig) -> Result<()> {
    if let Commands::Init {
        actor,
        state_path,
        json_logs,
    } = command
    {
        return init(config, actor, state_path, json_logs);
    }

    let persistence = StatePersistence::new(config::state_path(&config)?);
    let mut store = Store::from_state(persistence.load()?);
    let workflow = Workflow::new(WorkflowConfig::default().with_actor(config.actor.clone()));

    let changed = execute(command, &mut store, &workflow).map_err(|e| {
        match e.downcast::<WorkflowError>() {
            Ok(error) => report(error),
            Err(other) => other,
        }
    })?;

    if changed {
        persistence.flush(store.state())?;
    }
    Ok(())
}

fn init(
    mut config: MedqConfig,
    actor: Option<String>,
    state_path: Option<std::path::PathBuf>,
    json_logs: bool,
) -> Result<()> {
    if let Some(actor) = actor {
        config.actor = actor;
    }
    if state_path.is_some() {
        config.state_path = state_path;
    }
    config.json_logs = json_logs;
    config::save_config(&config::config_path()?, &config)?;

    let persistence = StatePersistence::new(config::state_path(&config)?);
    if !persistence.local_path.exists() {
        persistence.flush(&Default::default())?;
    }
    println!("state: {}", persistence.local_path.display());
    Ok(())
}

/// Run one command. Returns whether the store changed.
fn execute(command: Commands, store: &mut Store, workflow: &Workflow) -> Result<bool> {
    match command {
        Commands::Init { .. } => Ok(false),
        Commands::AddPatient {
            name,
            gender,
            birth_date,
        } => {
            let birth_date = birth_date.as_deref().map(parse_date).transpose()?;
            let id = store.create(|id| Patient {
                id,
                name,
                gender,
                birth_date,
                ..Default::default()
            })?;
            println!("patient {id}");
            Ok(true)
        }
        Commands::AddPractitioner { name, identifier } => {
            let id = store.create(|id| Practitioner {
                id,
                name,
                identifier,
            })?;
            println!("practitioner {id}");
            Ok(true)
        }
        Commands::AddService { name, code } => {
            let id = store.create(|id| Service { id, name, code })?;
            println!("service {id}");
            Ok(true)
        }
        Commands::AddQuestionnaire { json } => {
            let id = import_questionnaire(store, &json)?;
            println!("questionnaire {id}");
            Ok(true)
        }
        Commands::AddRequest {
            patient,
            questionnaire,
            performer,
            service,
        } => {
            let id = store.create(|id| ProcedureRequest {
                id,
                patient_id: patient,
                performer_id: performer,
                service_id: service,
                questionnaire_id: questionnaire,
                note: None,
            })?;
            println!("request {id}");
            Ok(true)
        }
        Commands::DeleteRequest { id } => {
            store.delete::<ProcedureRequest>(id)?;
            println!("request {id} deleted");
            Ok(true)
        }
        Commands::Create {
            patient,
            questionnaire,
            performer,
            service,
        } => {
            let values = NewResponse {
                questionnaire_id: questionnaire,
                procedure_request_id: None,
                patient_id: patient,
                performer_id: performer,
                service_id: service,
                note: None,
            };
            let id = workflow.create_response(store, values)?;
            println!("response {id}");
            Ok(true)
        }
        Commands::FromRequest { request } => {
            let id = workflow.generate_from_request(store, request)?;
            println!("response {id}");
            Ok(true)
        }
        Commands::List => {
            let responses: Vec<&Response> = store.all::<Response>().collect();
            if responses.is_empty() {
                println!("No responses found.");
            }
            for response in responses {
                println!(
                    "{}\t{}\t{}\tpatient {}\tquestionnaire {}",
                    response.id,
                    response.display_name(),
                    response.state,
                    response.patient_id,
                    response.questionnaire_id
                );
            }
            Ok(false)
        }
        Commands::Show { id } => {
            print_json(&workflow.serialize(store, id)?)?;
            Ok(false)
        }
        Commands::Items { id, widget } => {
            let context = if widget {
                Context::new().with(WIDGET_FLAG, true)
            } else {
                Context::new()
            };
            print_json(&workflow.response_items(store, id, &context)?)?;
            Ok(false)
        }
        Commands::Answer { item, text } => {
            let mut values = ItemValues::new();
            values.insert("result".to_string(), text.into());
            workflow.write_items(store, &[item], values)?;
            Ok(true)
        }
        Commands::Start { ids } => {
            workflow.preparation2in_progress(store, &ids)?;
            Ok(true)
        }
        Commands::Complete { ids } => {
            workflow.in_progress2completed(store, &ids)?;
            Ok(true)
        }
        Commands::Draft { ids } => {
            workflow.back_to_draft(store, &ids)?;
            Ok(true)
        }
        Commands::Fill { id } => {
            print_json(&workflow.fill_questionnaire(store, id, &Context::new())?)?;
            Ok(false)
        }
        Commands::Verify { id } => {
            if workflow.verify_signature(store, id)? {
                println!("response {id}: signature valid");
            } else {
                println!("response {id}: signature missing or invalid");
            }
            Ok(false)
        }
        Commands::Sequence { prefix, padding } => {
            store.define_sequence(
                Sequence::new(RESPONSE_SEQUENCE_CODE, "Questionnaire responses")
                    .with_prefix(prefix)
                    .with_padding(padding),
            )?;
            Ok(true)
        }
    }
}
