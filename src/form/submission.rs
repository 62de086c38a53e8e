//! Record submission flow.
//!
//! `RecordForm` owns the record for one edit session and drives the
//! sequencer: validate the active section before advancing, validate the
//! whole record before persisting, and keep everything intact when the
//! backend rejects a save so the user can retry.

use chrono::NaiveDate;
use thiserror::Error;

use super::sections::{FormSection, SectionedRecord};
use super::sequencer::StepSequencer;
use super::validation::FieldErrors;
use crate::gateway::{Gateway, GatewayError};

/// Banner shown when a section fails validation
pub const FIX_ERRORS_MESSAGE: &str = "Please fix the errors before continuing";

/// Whether the session creates a new record or edits a persisted one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update { id: String },
}

/// Where the form is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Submitting,
    Succeeded { id: String },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in progress")]
    Busy,

    #[error("the form has already been submitted")]
    AlreadySubmitted,

    #[error("validation failed: {0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// A validated record on its way to the gateway.
///
/// Obtained from [`RecordForm::begin_submit`]; the form stays busy until
/// [`RecordForm::complete_submission`] is called.
#[derive(Debug, Clone)]
pub struct PendingSubmission<R> {
    pub mode: SubmitMode,
    pub record: R,
}

impl<R: SectionedRecord> PendingSubmission<R> {
    /// Run the create or update call selected by the mode
    pub async fn send(&self, gateway: &dyn Gateway<R>) -> Result<String, GatewayError> {
        match &self.mode {
            SubmitMode::Create => gateway.create(&self.record).await,
            SubmitMode::Update { id } => {
                gateway.update(id, &self.record).await?;
                Ok(id.clone())
            }
        }
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Form controller for one record edit session
pub struct RecordForm<R: SectionedRecord> {
    record: R,
    sequencer: StepSequencer,
    errors: FieldErrors,
    banner: Option<String>,
    phase: FormPhase,
    /// Fixed when the session starts; saving a new record does not turn it
    /// into an edit session
    mode: SubmitMode,
    today: fn() -> NaiveDate,
}

impl<R: SectionedRecord> RecordForm<R> {
    /// Start a create session with a blank record
    pub fn new() -> Self {
        Self::with_record(R::default())
    }

    /// Start a session over `record`; it is an edit session when the record
    /// already carries an identity
    pub fn with_record(record: R) -> Self {
        let steps = R::Section::all().len();
        let mode = match record.identity() {
            Some(id) => SubmitMode::Update { id: id.to_string() },
            None => SubmitMode::Create,
        };
        Self {
            mode,
            record,
            sequencer: StepSequencer::new(steps),
            errors: FieldErrors::new(),
            banner: None,
            phase: FormPhase::Editing,
            today: local_today,
        }
    }

    /// Override the date used by date rules
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    pub fn record(&self) -> &R {
        &self.record
    }

    /// Mutable view for field edits. Clears the error banner.
    pub fn record_mut(&mut self) -> &mut R {
        self.banner = None;
        &mut self.record
    }

    pub fn sequencer(&self) -> &StepSequencer {
        &self.sequencer
    }

    pub fn current_section(&self) -> R::Section {
        R::Section::from_index(self.sequencer.current())
            .unwrap_or_else(|| R::Section::all()[0])
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    /// True while a submission is in flight; the submit action is disabled
    pub fn is_busy(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    /// True when the session was opened over a persisted record
    pub fn is_editing_existing(&self) -> bool {
        matches!(self.mode, SubmitMode::Update { .. })
    }

    pub fn mode(&self) -> &SubmitMode {
        &self.mode
    }

    // ─── Field-level validation ──────────────────────────────────────────────

    /// Re-validate the active section and refresh only that section's errors
    pub fn validate_current_section(&mut self) -> bool {
        let section = self.current_section();
        self.clear_section_errors(section);
        match self.record.validate_section(section, (self.today)()) {
            Ok(()) => true,
            Err(errors) => {
                self.errors.extend(errors);
                false
            }
        }
    }

    fn clear_section_errors(&mut self, section: R::Section) {
        let mut remaining = FieldErrors::new();
        for (field, message) in self.errors.iter() {
            if !section.fields().contains(&field) {
                remaining.insert(field, message);
            }
        }
        self.errors = remaining;
    }

    // ─── Navigation ──────────────────────────────────────────────────────────

    /// Validate the active section and advance on success
    pub fn advance_section(&mut self) -> Result<(), FieldErrors> {
        let section = self.current_section();
        self.clear_section_errors(section);

        match self.record.validate_section(section, (self.today)()) {
            Ok(()) => {
                self.banner = None;
                self.sequencer.next();
                tracing::debug!(
                    kind = R::KIND,
                    step = self.sequencer.current(),
                    "advanced to next section"
                );
                Ok(())
            }
            Err(errors) => {
                self.errors.extend(errors.clone());
                self.banner = Some(FIX_ERRORS_MESSAGE.to_string());
                Err(errors)
            }
        }
    }

    /// Go back one section without validating
    pub fn go_back(&mut self) {
        self.sequencer.previous();
        self.banner = None;
    }

    /// Jump to a section. Out-of-range indices are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        self.sequencer.go_to(index)
    }

    /// Jump to the first section holding a field error, if any
    pub fn go_to_first_error(&mut self) -> bool {
        let target = R::Section::all()
            .iter()
            .find(|s| s.fields().iter().any(|f| self.errors.contains(f)))
            .map(|s| s.index());
        match target {
            Some(index) => self.sequencer.go_to(index),
            None => false,
        }
    }

    // ─── Submission ──────────────────────────────────────────────────────────

    /// Validate the whole record and mark the form busy.
    ///
    /// On validation failure the gateway must not be called; all field
    /// errors are surfaced and the sequencer stays where it is.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission<R>, SubmitError> {
        match self.phase {
            FormPhase::Submitting => return Err(SubmitError::Busy),
            FormPhase::Succeeded { .. } => return Err(SubmitError::AlreadySubmitted),
            FormPhase::Editing => {}
        }

        self.banner = None;
        if let Err(errors) = self.record.validate((self.today)()) {
            tracing::debug!(kind = R::KIND, fields = errors.len(), "submission blocked by validation");
            self.errors = errors.clone();
            self.banner = Some(FIX_ERRORS_MESSAGE.to_string());
            return Err(SubmitError::Invalid(errors));
        }

        self.errors = FieldErrors::new();
        self.phase = FormPhase::Submitting;
        Ok(PendingSubmission {
            mode: self.mode.clone(),
            record: self.record.clone(),
        })
    }

    /// Apply the gateway result of a pending submission
    pub fn complete_submission(&mut self, result: Result<String, GatewayError>) {
        match result {
            Ok(id) => {
                tracing::info!(kind = R::KIND, id = %id, "record saved");
                self.record.set_identity(id.clone());
                self.phase = FormPhase::Succeeded { id };
            }
            Err(e) => {
                tracing::error!(kind = R::KIND, error = %e, "failed to save record");
                self.banner = Some(e.user_message());
                self.phase = FormPhase::Editing;
            }
        }
    }

    /// Validate, persist through `gateway`, and record the outcome
    pub async fn submit(&mut self, gateway: &dyn Gateway<R>) -> Result<String, SubmitError> {
        let pending = self.begin_submit()?;
        let result = pending.send(gateway).await;
        self.complete_submission(result.clone());
        result.map_err(SubmitError::from)
    }

    /// Start over with a blank record on the first section
    pub fn start_new(&mut self) {
        self.record = R::default();
        self.mode = SubmitMode::Create;
        self.sequencer.reset();
        self.errors = FieldErrors::new();
        self.banner = None;
        self.phase = FormPhase::Editing;
    }
}

impl<R: SectionedRecord> Default for RecordForm<R> {
    fn default() -> Self {
        Self::new()
    }
}
