pub mod controller;
pub mod session_ctx;

pub use controller::{
    ExamController, SessionCommand, SessionUpdate, SubmissionReceipt, SubmitNotice,
    WarningsSummary,
};
pub use session_ctx::SessionCtx;
