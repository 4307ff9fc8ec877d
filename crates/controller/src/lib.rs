//! Client-side lifecycle controller for server-executed transcription
//! jobs.
//!
//! [`session::JobSession`] owns the identity of the one job a client
//! tracks. [`controller::JobController`] is the state machine that
//! starts it, folds each polled snapshot into a [`view::JobView`] and
//! decides when the job is over. [`driver::spawn_controller`] runs a
//! controller on its own task with a fixed-period poll timer.
//!
//! Render/update notifications are broadcast as
//! [`events::ControllerEvent`]s; subscribe through
//! [`driver::ControllerHandle::subscribe`].

pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod events;
pub mod session;
pub mod transport;
pub mod view;
