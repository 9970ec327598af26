//! Entry form and submission gate

pub mod data;
pub mod gate;

pub use data::{ConsentFlag, FormData, FormField};
pub use gate::{
    validate, CompletedSubmission, PendingSubmission, SubmissionEntry, SubmissionGate,
    SubmissionState,
};
