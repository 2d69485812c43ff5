#![forbid(unsafe_code)]

//! Interaction runtime for Knurl.
//!
//! Ties the event classifier and the widget model together: a [`Region`]
//! owns widgets, runs the activation state machine over incoming events,
//! queues deferred actions, and records undo steps. Embedders feed events
//! in, drain [`UiSignal`]s out, and call [`Region::flush_deferred`] once
//! per frame.

pub mod after_queue;
pub mod controller;
pub mod region;
pub mod undo;

pub use after_queue::{AfterAction, AfterQueue};
pub use controller::{ButtonState, InteractionSession};
pub use region::{Region, UiSignal};
pub use undo::UndoJournal;
