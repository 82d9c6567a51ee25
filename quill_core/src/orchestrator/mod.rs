//! One operation at a time, from captured selection to applied edit.
//!
//! ```text
//! Idle -> SelectionCaptured -> AwaitingAi -> ReviewPending -> Applying -> Idle
//!                                  ^              |
//!                                  |              v
//!                                  +------- Regenerating
//! any state -> Cancelled -> Idle
//! ```
//!
//! The orchestrator owns the single active [`OperationContext`]. Backend
//! calls are split into [`Orchestrator::send`] and [`Orchestrator::receive`]
//! so the host can run the request elsewhere; every request carries a
//! generation stamp and results for anything but the latest generation are
//! discarded.

pub mod prompt;

use std::fmt;

use quill_api::{
    DiffChange, DiffStats, InlineDiff, OffsetRange, OperationContext, OperationKind,
    ReconciliationResult, Selection,
};
use quill_backend_api::{BackendError, ChatMessage, ChatResponse, Usage};
use tracing::{debug, info, warn};

use crate::backends::BackendService;
use crate::diff::{self, DiffResult, TextDiffer};
use crate::inline;
use crate::reconcile::reconcile;
use crate::settings::Settings;
use crate::store::BlockStore;
use crate::text::whitespace_margins;
use crate::{Error, Result};

/// Lifecycle of the active operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationState {
    /// No operation.
    Idle,
    /// A selection is held and the request has not been sent.
    SelectionCaptured,
    /// Waiting for the first (or a model-switched) AI result.
    AwaitingAi,
    /// A result, an error, or both, is shown for review.
    ReviewPending,
    /// The edit is being written to the block.
    Applying,
    /// Waiting for a refined result.
    Regenerating,
    /// The operation was discarded.
    Cancelled,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::SelectionCaptured => "selection captured",
            Self::AwaitingAi => "awaiting AI",
            Self::ReviewPending => "review pending",
            Self::Applying => "applying",
            Self::Regenerating => "regenerating",
            Self::Cancelled => "cancelled",
        })
    }
}

/// A chat request ready to be executed, stamped with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Generation the result must be delivered with.
    pub generation: u64,
    /// Backend to run the request on.
    pub backend_id: String,
    /// Messages to send.
    pub messages: Vec<ChatMessage>,
}

/// AI output under review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Text returned by the backend.
    pub replacement: String,
    /// Reviewable character diff against the displayed original.
    pub changes: DiffResult,
    /// Two-track rendering of the same diff.
    pub inline: InlineDiff,
    /// Counts for `changes`.
    pub stats: DiffStats,
    /// Token usage, if reported.
    pub usage: Option<Usage>,
}

impl Review {
    fn new(original: &str, response: ChatResponse) -> Self {
        let replacement = response.content;
        let spans = TextDiffer::new().compute_spans(original, &replacement);
        let inline = inline::split_tracks(original, &replacement, &spans);
        let changes: DiffResult = spans.into_iter().map(DiffChange::from).collect();
        Self {
            stats: diff::diff_stats(&changes),
            replacement,
            changes,
            inline,
            usage: response.usage,
        }
    }

    /// Text produced by the current accept/reject choices.
    #[must_use]
    pub fn merged_text(&self) -> String {
        diff::merge_accepted_changes(&self.changes)
    }

    fn set_changes(&mut self, changes: DiffResult) {
        self.stats = diff::diff_stats(&changes);
        self.changes = changes;
    }
}

/// Commands issued by the review surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCommand {
    /// Write the edit. `None` applies the merged accept/reject result.
    Apply(Option<String>),
    /// Discard the operation.
    Cancel,
    /// Ask for a refined result with the given instruction.
    Regenerate(String),
    /// Re-run the operation on another backend.
    SwitchBackend(String),
}

/// Result of [`Orchestrator::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The block was updated.
    Applied(ReconciliationResult),
    /// The operation was discarded.
    Cancelled,
    /// A new request must be executed.
    Pending(PendingRequest),
}

/// Drives the active operation. Single writer: every transition goes
/// through `&mut self`.
#[derive(Debug)]
pub struct Orchestrator {
    service: BackendService,
    settings: Settings,
    state: OperationState,
    generation: u64,
    context: Option<OperationContext>,
    review: Option<Review>,
    last_error: Option<BackendError>,
}

impl Orchestrator {
    /// Orchestrator over `service`, resolving prompts and the current
    /// provider from `settings`.
    #[must_use]
    pub const fn new(service: BackendService, settings: Settings) -> Self {
        Self {
            service,
            settings,
            state: OperationState::Idle,
            generation: 0,
            context: None,
            review: None,
            last_error: None,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> OperationState {
        self.state
    }

    /// Generation of the most recent request.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The active operation, if any.
    #[must_use]
    pub const fn context(&self) -> Option<&OperationContext> {
        self.context.as_ref()
    }

    /// The result under review, if one arrived.
    #[must_use]
    pub const fn review(&self) -> Option<&Review> {
        self.review.as_ref()
    }

    /// Failure of the latest request, shown alongside any earlier review.
    #[must_use]
    pub const fn last_error(&self) -> Option<&BackendError> {
        self.last_error.as_ref()
    }

    /// Settings, including any provider switch made during review.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Backend façade, for hosts that execute requests on another thread.
    #[must_use]
    pub const fn service(&self) -> &BackendService {
        &self.service
    }

    /// Whether an operation is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state != OperationState::Idle
    }

    /// Start an operation on a captured selection.
    ///
    /// Any operation in progress is cancelled first. `instruction`
    /// overrides the prompt configured for `operation`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySelection`] for blank selections, [`Error::NotConfigured`]
    /// when no backend is registered, and [`Error::MissingInstruction`] when
    /// the operation resolves to an empty prompt.
    pub fn begin_selection(
        &mut self,
        operation: OperationKind,
        selection: Selection,
        block_id: Option<&str>,
        instruction: Option<&str>,
    ) -> Result<()> {
        if self.is_active() {
            info!(state = %self.state, "replacing active operation");
            self.cancel();
        }
        if selection.selected_text.trim().is_empty() {
            return Err(Error::EmptySelection);
        }
        let backend_id = self.resolve_backend()?;

        let explicit = instruction
            .map(str::trim)
            .filter(|instruction| !instruction.is_empty());
        let instruction = explicit.map_or_else(|| self.settings.prompt_for(operation), str::to_owned);
        if instruction.trim().is_empty() {
            return Err(Error::MissingInstruction { operation });
        }
        if operation == OperationKind::CustomInput {
            if let Some(explicit) = explicit {
                self.settings.remember_custom_input(explicit);
            }
        }

        let display_text = if selection.is_full_block_replace {
            selection.selected_text.clone()
        } else {
            selection.display_text().to_owned()
        };
        self.context = Some(OperationContext {
            operation,
            instruction,
            block_id: block_id.map(str::to_owned),
            backend_id,
            original_full_text: selection.block_full_text,
            selected_text: selection.selected_text,
            selection_range: selection.range,
            is_full_block_replace: selection.is_full_block_replace,
            display_text,
        });
        self.transition(OperationState::SelectionCaptured);
        Ok(())
    }

    /// Start an operation that replaces a whole block.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySelection`] when the block has no visible text, plus the
    /// errors of [`Orchestrator::begin_selection`].
    pub fn begin_block_operation(
        &mut self,
        operation: OperationKind,
        block_id: &str,
        block_text: &str,
        instruction: Option<&str>,
    ) -> Result<()> {
        if block_text.trim().is_empty() {
            return Err(Error::EmptySelection);
        }
        self.begin_selection(
            operation,
            Selection::full_block(block_text),
            Some(block_id),
            instruction,
        )
    }

    /// Build the first request for the captured selection.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless a selection was just captured.
    pub fn send(&mut self) -> Result<PendingRequest> {
        self.expect_state("send", &[OperationState::SelectionCaptured])?;
        let context = self.context.as_ref().ok_or(Error::NoActiveOperation)?;
        let messages = prompt::operation_messages(&context.instruction, &context.display_text);
        let backend_id = context.backend_id.clone();
        Ok(self.stamp(OperationState::AwaitingAi, backend_id, messages))
    }

    /// Execute `request` on its backend. Does not touch orchestrator state.
    ///
    /// # Errors
    ///
    /// Backend failures, wrapped in [`Error::Backend`].
    pub fn execute(&self, request: &PendingRequest) -> Result<ChatResponse> {
        self.service.complete(&request.backend_id, &request.messages)
    }

    /// Deliver the outcome of the request stamped `generation`.
    ///
    /// # Errors
    ///
    /// [`Error::StaleResult`] when the request was superseded or the
    /// operation ended; the result is dropped. A backend failure is returned
    /// after moving to review with the error recorded and any earlier
    /// review kept.
    pub fn receive(&mut self, generation: u64, outcome: Result<ChatResponse>) -> Result<&Review> {
        let waiting = matches!(
            self.state,
            OperationState::AwaitingAi | OperationState::Regenerating
        );
        if generation != self.generation || !waiting {
            warn!(
                generation,
                current = self.generation,
                state = %self.state,
                "discarding superseded AI result"
            );
            return Err(Error::StaleResult { generation });
        }
        let context = self.context.as_ref().ok_or(Error::NoActiveOperation)?;

        match outcome {
            Ok(response) => {
                let review = Review::new(&context.display_text, response);
                self.last_error = None;
                self.transition(OperationState::ReviewPending);
                Ok(&*self.review.insert(review))
            }
            Err(err) => {
                self.last_error = Some(match &err {
                    Error::Backend { source, .. } => source.clone(),
                    other => BackendError::configuration(other.to_string()),
                });
                self.transition(OperationState::ReviewPending);
                Err(err)
            }
        }
    }

    /// Execute `request` and deliver its outcome.
    ///
    /// # Errors
    ///
    /// Same as [`Orchestrator::receive`].
    pub fn run(&mut self, request: &PendingRequest) -> Result<&Review> {
        let outcome = self.execute(request);
        self.receive(request.generation, outcome)
    }

    /// Flip acceptance of one change.
    ///
    /// # Errors
    ///
    /// [`Error::NoReview`] without a result to review.
    pub fn toggle_change(&mut self, index: usize) -> Result<&Review> {
        let review = self.review_mut("toggle a change")?;
        let changes = diff::toggle_at_index(&review.changes, index);
        review.set_changes(changes);
        Ok(review)
    }

    /// Accept every change.
    ///
    /// # Errors
    ///
    /// [`Error::NoReview`] without a result to review.
    pub fn accept_all(&mut self) -> Result<&Review> {
        let review = self.review_mut("accept all changes")?;
        let changes = diff::accept_all(&review.changes);
        review.set_changes(changes);
        Ok(review)
    }

    /// Reject every change.
    ///
    /// # Errors
    ///
    /// [`Error::NoReview`] without a result to review.
    pub fn reject_all(&mut self) -> Result<&Review> {
        let review = self.review_mut("reject all changes")?;
        let changes = diff::reject_all(&review.changes);
        review.set_changes(changes);
        Ok(review)
    }

    /// Write the reviewed edit into its block.
    ///
    /// `final_text` overrides the merged accept/reject result. On success the
    /// operation ends; on failure it stays in review so the user can retry
    /// or cancel.
    ///
    /// # Errors
    ///
    /// [`Error::NoReview`], [`Error::NoTargetBlock`],
    /// [`Error::BlockUnavailable`], [`Error::AnchorMismatch`] or
    /// [`Error::BlockUpdate`].
    pub fn apply(
        &mut self,
        store: &dyn BlockStore,
        final_text: Option<String>,
    ) -> Result<ReconciliationResult> {
        self.expect_state("apply", &[OperationState::ReviewPending])?;
        let review = self.review.as_ref().ok_or(Error::NoReview)?;
        let context = self.context.as_ref().ok_or(Error::NoActiveOperation)?;
        let block_id = context.block_id.clone().ok_or(Error::NoTargetBlock)?;
        let replacement = final_text.unwrap_or_else(|| review.merged_text());
        let selection = anchor_core(context);
        let full_block = context.is_full_block_replace;

        self.transition(OperationState::Applying);
        match splice_into_block(store, &block_id, &selection, &replacement, full_block) {
            Ok(result) => {
                info!(block = %block_id, tier = ?result.tier, "edit applied");
                self.clear();
                self.transition(OperationState::Idle);
                Ok(result)
            }
            Err(err) => {
                warn!(block = %block_id, error = %err, "apply failed");
                self.transition(OperationState::ReviewPending);
                Err(err)
            }
        }
    }

    /// Ask for a refined result. The previous review stays visible until
    /// the new one arrives.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] outside review, [`Error::MissingInstruction`]
    /// for a blank refinement.
    pub fn regenerate(&mut self, refinement: &str) -> Result<PendingRequest> {
        self.expect_state("regenerate", &[OperationState::ReviewPending])?;
        let context = self.context.as_ref().ok_or(Error::NoActiveOperation)?;
        let refinement = refinement.trim();
        if refinement.is_empty() {
            return Err(Error::MissingInstruction {
                operation: context.operation,
            });
        }

        let messages = match &self.review {
            Some(review) => prompt::refinement_messages(
                &context.instruction,
                &context.display_text,
                &review.replacement,
                refinement,
            ),
            None => prompt::operation_messages(
                &format!("{}\n{refinement}", context.instruction),
                &context.display_text,
            ),
        };
        let backend_id = context.backend_id.clone();
        Ok(self.stamp(OperationState::Regenerating, backend_id, messages))
    }

    /// Re-run the operation on another backend and make it the current
    /// provider. Results still in flight from the previous backend are
    /// discarded when they arrive.
    ///
    /// # Errors
    ///
    /// [`Error::NoActiveOperation`] without an operation,
    /// [`Error::InvalidState`] while applying, and
    /// [`Error::BackendNotRegistered`] for unknown ids.
    pub fn switch_backend(&mut self, backend_id: &str) -> Result<PendingRequest> {
        if matches!(self.state, OperationState::Idle | OperationState::Cancelled) {
            return Err(Error::NoActiveOperation);
        }
        self.expect_state(
            "switch backend",
            &[
                OperationState::SelectionCaptured,
                OperationState::AwaitingAi,
                OperationState::ReviewPending,
                OperationState::Regenerating,
            ],
        )?;
        if !self.service.contains(backend_id) {
            return Err(Error::BackendNotRegistered {
                backend: backend_id.to_owned(),
            });
        }
        self.settings.set_current_provider(backend_id);

        let context = self.context.as_mut().ok_or(Error::NoActiveOperation)?;
        backend_id.clone_into(&mut context.backend_id);
        let messages = prompt::operation_messages(&context.instruction, &context.display_text);
        Ok(self.stamp(OperationState::AwaitingAi, backend_id.to_owned(), messages))
    }

    /// Discard the operation. Effective immediately: results still in
    /// flight are dropped when they arrive.
    pub fn cancel(&mut self) {
        if self.state == OperationState::Idle {
            return;
        }
        self.transition(OperationState::Cancelled);
        self.generation += 1;
        self.clear();
        self.transition(OperationState::Idle);
    }

    /// Route a review command.
    ///
    /// # Errors
    ///
    /// Whatever the routed operation returns.
    pub fn dispatch(
        &mut self,
        command: ReviewCommand,
        store: &dyn BlockStore,
    ) -> Result<CommandOutcome> {
        match command {
            ReviewCommand::Apply(final_text) => {
                self.apply(store, final_text).map(CommandOutcome::Applied)
            }
            ReviewCommand::Cancel => {
                self.cancel();
                Ok(CommandOutcome::Cancelled)
            }
            ReviewCommand::Regenerate(refinement) => {
                self.regenerate(&refinement).map(CommandOutcome::Pending)
            }
            ReviewCommand::SwitchBackend(backend_id) => {
                self.switch_backend(&backend_id).map(CommandOutcome::Pending)
            }
        }
    }

    fn resolve_backend(&self) -> Result<String> {
        if let Some(id) = self
            .settings
            .current_provider_id
            .as_deref()
            .filter(|id| self.service.contains(id))
        {
            return Ok(id.to_owned());
        }
        self.service.ids().into_iter().next().ok_or(Error::NotConfigured)
    }

    fn stamp(
        &mut self,
        next: OperationState,
        backend_id: String,
        messages: Vec<ChatMessage>,
    ) -> PendingRequest {
        self.generation += 1;
        self.transition(next);
        PendingRequest {
            generation: self.generation,
            backend_id,
            messages,
        }
    }

    fn review_mut(&mut self, action: &'static str) -> Result<&mut Review> {
        self.expect_state(action, &[OperationState::ReviewPending])?;
        self.review.as_mut().ok_or(Error::NoReview)
    }

    fn expect_state(&self, action: &'static str, allowed: &[OperationState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                action,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, next: OperationState) {
        debug!(from = %self.state, to = %next, generation = self.generation, "operation state");
        self.state = next;
    }

    fn clear(&mut self) {
        self.context = None;
        self.review = None;
        self.last_error = None;
    }
}

/// Selection narrowed to the text the backend actually saw, so whitespace
/// picked up at the selection edges stays in the block.
fn anchor_core(context: &OperationContext) -> Selection {
    let mut selection = context.selection();
    if selection.is_full_block_replace {
        return selection;
    }
    let (leading, trailing) = whitespace_margins(&selection.selected_text);
    if leading + trailing == 0 {
        return selection;
    }
    selection.range = selection.range.map(|range| {
        OffsetRange::new(range.start + leading, range.end.saturating_sub(trailing))
    });
    selection.selected_text = context.display_text.clone();
    selection
}

fn splice_into_block(
    store: &dyn BlockStore,
    block_id: &str,
    selection: &Selection,
    replacement: &str,
    full_block: bool,
) -> Result<ReconciliationResult> {
    let current = store
        .block_text(block_id)
        .ok_or_else(|| Error::BlockUnavailable {
            block_id: block_id.to_owned(),
        })?;

    let result = reconcile(&current, selection, replacement, full_block);
    let Some(new_content) = result.new_content.as_deref().filter(|_| result.success) else {
        return Err(Error::AnchorMismatch {
            reason: result.error.unwrap_or_default(),
        });
    };

    store
        .update_block_text(block_id, new_content)
        .map_err(|source| Error::BlockUpdate {
            block_id: block_id.to_owned(),
            source,
        })?;
    Ok(result)
}
