//! Resource Assigner (component C6).
//!
//! `candidates` filters a pool by skill/type match and availability window.
//! `assign` runs the full per-task assignment pass in priority order.
//! `conflicts` is the defensive post-pass that should always find nothing:
//! it re-derives overlapping assignments independently of the assign pass
//! and clusters them by shared entity using a small BDD, the same
//! technique the teacher's solver crate uses for resource-leveling conflict
//! analysis.

pub mod assign;
pub mod candidates;
pub mod conflicts;

pub use assign::{assign_all, AssignmentOutcome};
pub use candidates::{is_available, matching_candidates, sorted_by_load};
pub use conflicts::{detect_conflicts, BddStats, ConflictAnalysis, ConflictCluster, ResourceConflict};
