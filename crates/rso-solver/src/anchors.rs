//! Dependency-type anchor selection (§4.3).
//!
//! Each `DependencyType` picks a different pair of interval endpoints to
//! relate: the predecessor's anchor is the time the lag is measured from,
//! the successor's anchor is the time the lag constrains.

use rso_core::DependencyType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
}

/// Returns `(predecessor_anchor, successor_anchor)` for a dependency type,
/// per the table in §4.3:
///
/// | type | anchor of predecessor | anchor of successor |
/// |---|---|---|
/// | FS | end   | start |
/// | SS | start | start |
/// | FF | end   | end   |
/// | SF | start | end   |
pub fn anchors_for(dep_type: DependencyType) -> (Anchor, Anchor) {
    match dep_type {
        DependencyType::FinishToStart => (Anchor::End, Anchor::Start),
        DependencyType::StartToStart => (Anchor::Start, Anchor::Start),
        DependencyType::FinishToFinish => (Anchor::End, Anchor::End),
        DependencyType::StartToFinish => (Anchor::Start, Anchor::End),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_to_start_anchors() {
        assert_eq!(
            anchors_for(DependencyType::FinishToStart),
            (Anchor::End, Anchor::Start)
        );
    }

    #[test]
    fn start_to_finish_anchors() {
        assert_eq!(
            anchors_for(DependencyType::StartToFinish),
            (Anchor::Start, Anchor::End)
        );
    }

    #[test]
    fn finish_to_finish_both_end() {
        assert_eq!(
            anchors_for(DependencyType::FinishToFinish),
            (Anchor::End, Anchor::End)
        );
    }

    #[test]
    fn start_to_start_both_start() {
        assert_eq!(
            anchors_for(DependencyType::StartToStart),
            (Anchor::Start, Anchor::Start)
        );
    }
}
