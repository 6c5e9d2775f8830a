pub mod patient;
pub mod procedure_request;
pub mod question;
pub mod questionnaire;
pub mod record_id;
pub mod response;
pub mod state;

pub use patient::{Patient, Practitioner, Service};
pub use procedure_request::ProcedureRequest;
pub use question::{QuestionDefinition, QuestionType};
pub use questionnaire::Questionnaire;
pub use record_id::RecordId;
pub use response::{DocumentSignature, NewResponse, NewResponseItem, Response, ResponseItem};
pub use state::EventState;
