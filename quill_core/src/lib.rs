//! Core library for quill's select, transform and merge-back workflow.
//!
//! The crate is layered around three responsibilities:
//! - diffing an original text against an AI rewrite for review
//! - anchoring a selection and reconciling the rewrite into a possibly edited block
//! - driving one operation at a time from selection to apply or cancel

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs
)]
#![cfg_attr(
    not(test),
    deny(
        clippy::dbg_macro,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stderr,
        clippy::print_stdout,
        clippy::todo,
        clippy::unwrap_used
    )
)]

/// Selection capture against a host document.
pub mod anchor;
/// Backend lookup and invocation façade.
pub mod backends;
/// Character diffing, accept/reject merging and textual patches.
pub mod diff;
/// Two-track inline rendering data.
pub mod inline;
/// Operation state machine.
pub mod orchestrator;
/// Splicing replacement text back into a block.
pub mod reconcile;
/// User settings and provider management.
pub mod settings;
/// Host block storage interface.
pub mod store;
mod text;

pub use quill_api as api;

use quill_api::OperationKind;
use quill_backend_api::BackendError;

use crate::diff::patch::PatchError;
use crate::orchestrator::OperationState;
use crate::store::StoreError;

/// Common result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No AI backend is available to answer requests.
    #[error("no AI backend is configured")]
    NotConfigured,
    /// Requested backend id is unknown.
    #[error("backend not registered: {backend}")]
    BackendNotRegistered {
        /// Identifier that failed to resolve.
        backend: String,
    },
    /// Backend request failed.
    #[error("backend {backend} failed: {source}")]
    Backend {
        /// Backend that produced the error.
        backend: String,
        /// Classified backend failure.
        #[source]
        source: BackendError,
    },
    /// Every reconciliation tier failed to locate the selection.
    #[error("selection could not be located in the current block: {reason}")]
    AnchorMismatch {
        /// Reason reported by reconciliation.
        reason: String,
    },
    /// Patch text was malformed or no longer matches the document.
    #[error(transparent)]
    Patch(#[from] PatchError),
    /// The host could not provide the block text.
    #[error("block {block_id} could not be read")]
    BlockUnavailable {
        /// Block that failed to load.
        block_id: String,
    },
    /// The host rejected the block update.
    #[error("failed to update block {block_id}: {source}")]
    BlockUpdate {
        /// Block that failed to save.
        block_id: String,
        /// Error reported by the store.
        #[source]
        source: StoreError,
    },
    /// The operation does not know which block to write to.
    #[error("operation has no target block")]
    NoTargetBlock,
    /// Nothing was selected.
    #[error("selection is empty")]
    EmptySelection,
    /// The operation resolved to an empty instruction.
    #[error("operation {operation} has no instruction")]
    MissingInstruction {
        /// Operation lacking an instruction.
        operation: OperationKind,
    },
    /// The command needs an operation in progress.
    #[error("no operation is active")]
    NoActiveOperation,
    /// The command is not valid in the current state.
    #[error("cannot {action} while {state}")]
    InvalidState {
        /// Attempted action.
        action: &'static str,
        /// State the orchestrator was in.
        state: OperationState,
    },
    /// Result of a superseded request was discarded.
    #[error("discarded result of superseded request (generation {generation})")]
    StaleResult {
        /// Generation the late result belonged to.
        generation: u64,
    },
    /// Apply was requested before any AI result arrived.
    #[error("no AI result is available to apply")]
    NoReview,
    /// Settings JSON could not be read or written.
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl Error {
    /// Guidance shown to the user for this failure.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::NotConfigured | Self::BackendNotRegistered { .. } => {
                "No AI provider is configured. Open the settings to add one."
            }
            Self::Backend { source, .. } => source.user_message(),
            Self::AnchorMismatch { .. } => {
                "The selected text could not be found in the block anymore. Cancel, or retry after selecting it again."
            }
            Self::Patch(PatchError::Stale { .. }) => {
                "The document changed since this edit was prepared. Review the changes and try again."
            }
            Self::Patch(PatchError::Malformed { .. }) => "The stored edit is corrupted and cannot be applied.",
            Self::BlockUnavailable { .. } | Self::NoTargetBlock => {
                "The target block could not be found. It may have been deleted."
            }
            Self::BlockUpdate { .. } => "Saving the change failed. Please try again.",
            Self::EmptySelection => "Select some text first.",
            Self::MissingInstruction { .. } => "Enter an instruction for the AI first.",
            Self::NoActiveOperation | Self::InvalidState { .. } | Self::StaleResult { .. } => {
                "This action is no longer available."
            }
            Self::NoReview => "Wait for the AI result before applying.",
            Self::Settings(_) => "The settings could not be read.",
        }
    }

    /// Whether the operation stays open so the user can retry or cancel.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Backend { .. }
                | Self::AnchorMismatch { .. }
                | Self::Patch(PatchError::Stale { .. })
                | Self::BlockUnavailable { .. }
                | Self::BlockUpdate { .. }
                | Self::NoReview
        )
    }
}
