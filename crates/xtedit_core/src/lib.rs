//! Public library API for inspecting and editing typed value-graph documents.

/// Value graph model, reference heap, handler registry, commands, history, and edit sessions.
pub mod doc;
