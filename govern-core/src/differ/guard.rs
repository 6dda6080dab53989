//! Cycle guard for recursive struct and interface comparisons.
//!
//! Each struct, interface or named-type comparison pushes a
//! [`ComparisonPair`] that lives on the caller's stack frame and points at
//! the pair below it. Meeting a pair that is already open on the current
//! branch means the comparison has looped; it is then assumed identical.
//! Guarding named pairs bounds recursion that never passes through a
//! composite, such as `type S []S` or `type F func() F`.
//!
//! `left` is always an id in the old arena and `right` one in the new
//! arena, so pairs match only in that order.
//!
//! Known limitation: a difference that is reachable only through a cycle
//! that has already been cut this way is not reported.

use crate::types::TypeId;

/// A struct or interface comparison in progress.
#[derive(Clone, Copy, Debug)]
pub struct ComparisonPair<'p> {
    pub left: TypeId,
    pub right: TypeId,
    pub previous: Option<&'p ComparisonPair<'p>>,
}

impl<'p> ComparisonPair<'p> {
    pub fn new(left: TypeId, right: TypeId, previous: Option<&'p ComparisonPair<'p>>) -> Self {
        Self {
            left,
            right,
            previous,
        }
    }

    /// Same old node against the same new node.
    pub fn identical(&self, other: &ComparisonPair<'_>) -> bool {
        self.left == other.left && self.right == other.right
    }

    /// Whether an equivalent pair is already open below this one.
    pub fn is_repeat(&self) -> bool {
        self.ancestors().any(|open| open.identical(self))
    }

    fn ancestors(&self) -> impl Iterator<Item = &'p ComparisonPair<'p>> {
        std::iter::successors(self.previous, |pair| pair.previous)
    }

    /// Number of open comparisons including this one.
    pub fn depth(&self) -> usize {
        1 + self.ancestors().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_pair_is_not_repeat() {
        let pair = ComparisonPair::new(TypeId(1), TypeId(2), None);
        assert!(!pair.is_repeat());
        assert_eq!(pair.depth(), 1);
    }

    #[test]
    fn test_repeat_detected_in_same_order_only() {
        let root = ComparisonPair::new(TypeId(1), TypeId(2), None);
        let middle = ComparisonPair::new(TypeId(3), TypeId(4), Some(&root));

        let same = ComparisonPair::new(TypeId(1), TypeId(2), Some(&middle));
        assert!(same.is_repeat());

        // Ids live in different arenas: old #2 vs new #1 is a new pair.
        let swapped = ComparisonPair::new(TypeId(2), TypeId(1), Some(&middle));
        assert!(!swapped.is_repeat());
        let crossed = ComparisonPair::new(TypeId(4), TypeId(3), Some(&middle));
        assert!(!crossed.is_repeat());

        let other = ComparisonPair::new(TypeId(1), TypeId(4), Some(&middle));
        assert!(!other.is_repeat());
        assert_eq!(other.depth(), 3);
    }

    #[test]
    fn test_sibling_branches_do_not_see_each_other() {
        let root = ComparisonPair::new(TypeId(0), TypeId(0), None);
        let left_branch = ComparisonPair::new(TypeId(5), TypeId(6), Some(&root));
        assert!(!left_branch.is_repeat());

        // A sibling of left_branch only sees root.
        let right_branch = ComparisonPair::new(TypeId(5), TypeId(6), Some(&root));
        assert!(!right_branch.is_repeat());
    }
}
