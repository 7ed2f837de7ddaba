//! CP model builder, bounded solver driver, and schedule writer
//! (components C3/C4/C5).
//!
//! `dag` validates acyclicity before a model is ever built. `anchors`
//! resolves each dependency type to the pair of interval endpoints it
//! relates. `lag` samples and exactly evaluates the calendar-lag step
//! function a precedence constraint must respect. `model` builds the CP
//! model onto a fresh solver; `driver` runs the two-stage lexicographic
//! solve over it; `writer` independently re-validates pool capacity and
//! commits the result through a `Store`.

pub mod anchors;
pub mod dag;
pub mod driver;
pub mod lag;
pub mod model;
pub mod writer;

pub use dag::topological_sort;
pub use driver::{solve, SolveOutcome, Solution};
pub use model::{build, BuiltModel, ModelInput};
pub use writer::commit;
