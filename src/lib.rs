//! Engine crate for trigbench, a workbench for tuning VR controller trigger
//! effects against a live effect service.
//!
//! The pipeline: slot edits land in the [`state::ChannelBank`], get coalesced
//! per channel by the [`debounce::DebounceScheduler`], are clamped against
//! the [`catalog`], and go out as typed commands over a
//! [`link::EffectTransport`] whose connection a [`link::LinkSupervisor`]
//! keeps alive. Presets round-trip the full parameter set as JSON. The UI
//! layer lives in a separate crate and drives [`TriggerEngine`].

pub mod catalog;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod engine;
pub mod link;
pub mod preset;
pub mod state;

pub use config::Config;
pub use engine::TriggerEngine;
pub use link::{ConnectionState, ControllerTarget, LinkEvent};
