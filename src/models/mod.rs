pub mod answer;
pub mod credentials;
pub mod loaders;
pub mod payload;
pub mod session;
pub mod ticket;

pub use answer::{AnswerRecord, DoseAnswer, NumericRange};
pub use credentials::StudentCredentials;
pub use loaders::{load_indication_catalog, parse_indication_catalog};
pub use payload::{flatten_warnings, SubmissionPayload, WarningRecord};
pub use session::{ExamSession, SessionPlan, SessionState, SubmitKind, Violation, ViolationKind};
pub use ticket::{ErrorResponse, StartRequest, StartResponse, TicketItem};
