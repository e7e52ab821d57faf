// ── Modal lifecycle controller ──
//
// One add/edit/view modal per resource screen. Opening replaces
// whatever was open (last caller wins); closing or a successful submit
// drops the record. `view` may be promoted to `edit` in place, never
// the other way round.

use std::fmt;
use std::future::Future;

use strum::Display;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ModalMode {
    Add,
    Edit,
    View,
}

/// Title and description shown for one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalCopy {
    pub title: String,
    pub description: String,
}

impl ModalCopy {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalConfig {
    pub add: ModalCopy,
    pub edit: ModalCopy,
    pub view: ModalCopy,
}

impl ModalConfig {
    /// Default copy for an entity such as `"Customer"`.
    pub fn for_entity(entity: &str) -> Self {
        let lower = entity.to_lowercase();
        Self {
            add: ModalCopy::new(
                format!("Add {entity}"),
                format!("Fill in the details to create a new {lower}."),
            ),
            edit: ModalCopy::new(
                format!("Edit {entity}"),
                format!("Update the {lower} details."),
            ),
            view: ModalCopy::new(
                format!("{entity} details"),
                format!("Read-only view of the {lower}."),
            ),
        }
    }

    pub fn copy(&self, mode: ModalMode) -> &ModalCopy {
        match mode {
            ModalMode::Add => &self.add,
            ModalMode::Edit => &self.edit,
            ModalMode::View => &self.view,
        }
    }
}

type SuccessCallback<T> = Box<dyn FnOnce(&T) + Send>;

/// Arguments to [`ModalController::open`].
pub struct OpenOptions<T> {
    initial_data: Option<T>,
    view: bool,
    on_success: Option<SuccessCallback<T>>,
}

impl<T> Default for OpenOptions<T> {
    fn default() -> Self {
        Self {
            initial_data: None,
            view: false,
            on_success: None,
        }
    }
}

impl<T> fmt::Debug for OpenOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("has_initial_data", &self.initial_data.is_some())
            .field("view", &self.view)
            .field("has_on_success", &self.on_success.is_some())
            .finish()
    }
}

impl<T> OpenOptions<T> {
    /// Empty form.
    pub fn create() -> Self {
        Self::default()
    }

    pub fn edit(record: T) -> Self {
        Self {
            initial_data: Some(record),
            ..Self::default()
        }
    }

    pub fn view(record: T) -> Self {
        Self {
            initial_data: Some(record),
            view: true,
            on_success: None,
        }
    }

    pub fn on_success(mut self, callback: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModalError {
    #[error("modal is not open")]
    NotOpen,
    #[error("only a view modal can switch to edit")]
    NotViewMode,
    #[error("view modals cannot be submitted")]
    ReadOnly,
    #[error("a submit is already in progress")]
    AlreadySubmitting,
}

#[derive(Debug, Error)]
pub enum SubmitError<E> {
    #[error(transparent)]
    Modal(ModalError),
    #[error(transparent)]
    Failed(E),
}

struct OpenState<T> {
    mode: ModalMode,
    initial_data: Option<T>,
    on_success: Option<SuccessCallback<T>>,
    submitting: bool,
    /// Identifies this opening so a late submit result can't close a
    /// modal that was reopened in the meantime.
    ticket: u64,
}

/// Work handed out by [`ModalController::begin_submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission<T> {
    pub mode: ModalMode,
    pub initial_data: Option<T>,
    ticket: u64,
}

pub struct ModalController<T> {
    config: ModalConfig,
    state: Option<OpenState<T>>,
    next_ticket: u64,
}

impl<T: Clone> fmt::Debug for ModalController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalController")
            .field("mode", &self.mode())
            .field("submitting", &self.is_submitting())
            .finish_non_exhaustive()
    }
}

impl<T: Clone> ModalController<T> {
    pub fn new(config: ModalConfig) -> Self {
        Self {
            config,
            state: None,
            next_ticket: 0,
        }
    }

    /// Open the modal, replacing anything already open. Mode is `view`
    /// when requested, else `edit` with initial data, else `add`.
    pub fn open(&mut self, options: OpenOptions<T>) {
        let mode = if options.view {
            ModalMode::View
        } else if options.initial_data.is_some() {
            ModalMode::Edit
        } else {
            ModalMode::Add
        };
        self.next_ticket += 1;
        debug!(%mode, replaced = self.state.is_some(), "modal opened");
        self.state = Some(OpenState {
            mode,
            initial_data: options.initial_data,
            on_success: options.on_success,
            submitting: false,
            ticket: self.next_ticket,
        });
    }

    pub fn close(&mut self) {
        if self.state.take().is_some() {
            debug!("modal closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    pub fn mode(&self) -> Option<ModalMode> {
        self.state.as_ref().map(|s| s.mode)
    }

    pub fn initial_data(&self) -> Option<&T> {
        self.state.as_ref().and_then(|s| s.initial_data.as_ref())
    }

    pub fn is_submitting(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.submitting)
    }

    /// Copy for the current mode, if open.
    pub fn copy(&self) -> Option<&ModalCopy> {
        self.mode().map(|m| self.config.copy(m))
    }

    pub fn config(&self) -> &ModalConfig {
        &self.config
    }

    pub fn switch_to_edit(&mut self) -> Result<(), ModalError> {
        let state = self.state.as_mut().ok_or(ModalError::NotOpen)?;
        if state.mode != ModalMode::View {
            return Err(ModalError::NotViewMode);
        }
        state.mode = ModalMode::Edit;
        Ok(())
    }

    /// Mark a submit as started and hand out what the form needs to run
    /// its mutation. Rejects a second submit while one is pending.
    pub fn begin_submit(&mut self) -> Result<Submission<T>, ModalError> {
        let state = self.state.as_mut().ok_or(ModalError::NotOpen)?;
        if state.mode == ModalMode::View {
            return Err(ModalError::ReadOnly);
        }
        if state.submitting {
            return Err(ModalError::AlreadySubmitting);
        }
        state.submitting = true;
        Ok(Submission {
            mode: state.mode,
            initial_data: state.initial_data.clone(),
            ticket: state.ticket,
        })
    }

    /// Settle a submit. On success the callback fires and the modal
    /// closes; on failure it stays open for another attempt. Results
    /// for a modal that has since been reopened or closed leave the
    /// current state alone.
    pub fn finish_submit<E>(
        &mut self,
        submission: &Submission<T>,
        result: Result<T, E>,
    ) -> Result<T, E> {
        let current = self
            .state
            .as_mut()
            .filter(|s| s.ticket == submission.ticket);
        let Some(state) = current else {
            debug!("submit settled after modal was replaced");
            return result;
        };

        match result {
            Ok(saved) => {
                if let Some(callback) = state.on_success.take() {
                    callback(&saved);
                }
                self.state = None;
                Ok(saved)
            }
            Err(e) => {
                state.submitting = false;
                Err(e)
            }
        }
    }

    /// Run `mutation` as this modal's submit. Convenience wrapper around
    /// [`begin_submit`](Self::begin_submit) and
    /// [`finish_submit`](Self::finish_submit).
    pub async fn submit<F, Fut, E>(&mut self, mutation: F) -> Result<T, SubmitError<E>>
    where
        F: FnOnce(ModalMode, Option<T>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let submission = self.begin_submit().map_err(SubmitError::Modal)?;
        let result = mutation(submission.mode, submission.initial_data.clone()).await;
        self.finish_submit(&submission, result)
            .map_err(SubmitError::Failed)
    }
}
