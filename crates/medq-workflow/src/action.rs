use serde::Serialize;

use medq_core::models::Response;
use medq_core::{Model, RecordId};
use medq_store::Store;

use crate::error::WorkflowError;
use crate::items::{Context, WIDGET_FLAG};

pub const WINDOW_ACTION_TYPE: &str = "ir.actions.act_window";

/// Form view used to fill a response in.
pub const FILL_FORM_VIEW: &str =
    "medical_clinical_questionnaire.medical_questionnaire_response_fill_form_view";

/// An "open window" instruction for the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowAction {
    #[serde(rename = "type")]
    pub action_type: &'static str,
    pub name: String,
    pub res_model: &'static str,
    pub res_id: RecordId,
    /// `new` opens a modal.
    pub target: &'static str,
    pub view_mode: &'static str,
    /// `(view reference, view kind)` pairs.
    pub views: Vec<(&'static str, &'static str)>,
    pub context: Context,
}

pub(crate) fn fill_questionnaire(
    store: &Store,
    response_id: RecordId,
    context: &Context,
) -> Result<WindowAction, WorkflowError> {
    let response = store.get::<Response>(response_id)?;
    Ok(WindowAction {
        action_type: WINDOW_ACTION_TYPE,
        name: response.display_name().to_string(),
        res_model: Model::Response.name(),
        res_id: response.id,
        target: "new",
        view_mode: "form",
        views: vec![(FILL_FORM_VIEW, "form")],
        context: context.clone().with(WIDGET_FLAG, true),
    })
}
