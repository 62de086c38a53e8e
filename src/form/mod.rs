//! Multi-section form engine: formatting, validation, step sequencing and
//! the submission flow shared by the employee and department forms.

pub mod formatters;
pub mod sections;
pub mod sequencer;
pub mod submission;
pub mod validation;

pub use sections::{DepartmentSection, EmployeeSection, FormSection, SectionedRecord};
pub use sequencer::StepSequencer;
pub use submission::{
    FormPhase, PendingSubmission, RecordForm, SubmitError, SubmitMode, FIX_ERRORS_MESSAGE,
};
pub use validation::FieldErrors;
