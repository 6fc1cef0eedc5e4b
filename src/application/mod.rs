//! Application layer containing the remit orchestration.
//!
//! `RemitCore` drives the stage and confirm steps through partner adapters
//! resolved from an `AdapterRegistry`, and `QueryFacade` serves the read
//! paths over the recorded history.

pub mod adapter;
pub mod orchestrator;
pub mod query;
pub mod registry;
