//! Transit network consolidator.
//!
//! Exports describe a network as many overlapping per-file snapshots, each
//! entity valid on some set of days. This crate merges them into one
//! network in which every entity version has a well-defined, disjoint
//! validity calendar, and reconstructs route geometry along the way.

pub mod calendar;
pub mod consolidate;
pub mod domain;
pub mod merge;
pub mod pipeline;
pub mod shape_graph;
pub mod source;
pub mod store;
