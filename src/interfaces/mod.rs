//! Edges of the crate: CSV request files in, CSV audit trail out, and the
//! replay loop that feeds one into the remit core.

pub mod csv;
pub mod replay;
