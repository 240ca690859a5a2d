//! The coordinator's inbox: a single-consumer channel that every replica
//! endpoint posts exactly one [`Outcome`] to.
//!
//! Wrapping the sender half in a type alias is what lets a remote RPC
//! "hand back its reply out-of-band" (see the design notes on mailbox
//! delivery): the sender is `Clone + Send + 'static` and can be carried
//! across an RPC boundary by a real transport the way an actor's mailbox
//! address would be.

use objrepl_types::Outcome;
use tokio::sync::mpsc;

/// The producer handle every endpoint uses to post its outcome.
pub type OutcomeSender = mpsc::UnboundedSender<Outcome>;

/// The coordinator's consumer handle.
pub type OutcomeReceiver = mpsc::UnboundedReceiver<Outcome>;

/// Creates a fresh inbox for one replication request.
#[must_use]
pub fn channel() -> (OutcomeSender, OutcomeReceiver) {
    mpsc::unbounded_channel()
}
