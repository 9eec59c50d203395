//! ATEM Surface - exposes Blackmagic ATEM switchers to a show-control host
//!
//! The crate turns a live switcher state mirror into host-facing actions, feedbacks, variables and
//! presets, and turns host actions back into device commands. The protocol client lives behind
//! [`device::SwitcherDevice`] and the host framework behind [`host::ModuleHost`].

pub mod actions;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod fade;
pub mod feedbacks;
pub mod host;
pub mod models;
pub mod options;
pub mod presets;
pub mod sources;
pub mod state;
pub mod variables;

pub use engine::AtemInstance;
