//! Error taxonomy for the actor core.
//!
//! Membership violations and unknown factory kinds were hard asserts in
//! earlier engine generations; here they are typed errors so a single bad
//! actor or data file cannot abort the whole simulation. Expected conditions
//! (stale target, spell not ready, empty query) are not errors at all - they
//! stay as `Option`/`bool` sentinels in normal control flow.

use thiserror::Error;

use crate::actor::ActorId;

/// Errors surfaced by the actor registry, factory and persistence paths.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The factory has no template registered under the requested kind name.
    #[error("no actor template registered for kind `{0}`")]
    UnknownKind(String),

    /// A handle was resolved against a set it is not a member of.
    #[error("actor {0} is not a member of this set")]
    NotAMember(ActorId),

    /// An ownership transfer would collide with an existing member.
    #[error("actor {0} is already a member of the destination set")]
    AlreadyMember(ActorId),

    /// A spawn request's data file could not be resolved to a template.
    #[error("failed to load actor data from `{path}`: {reason}")]
    LoadFailed {
        /// The offending data-file path.
        path: String,
        /// Why resolution failed.
        reason: String,
    },

    /// A property bag was structurally unusable during load.
    #[error(transparent)]
    Bag(#[from] propbag::BagError),
}
