//! Arity-based overload selection.
//!
//! This is the only overload logic the binding layer performs. It never looks
//! at argument types; shape-based disambiguation is done by the IR builder.

/// Anything that accepts a range of argument counts.
pub trait Arity {
    /// Minimum number of arguments.
    fn min_args(&self) -> usize;

    /// Maximum number of arguments, `None` when a rest parameter is present.
    fn max_args(&self) -> Option<usize>;

    fn accepts(&self, argc: usize) -> bool {
        argc >= self.min_args() && self.max_args().is_none_or(|max| argc <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverloadSelection {
    /// Exactly one candidate accepts the argument count.
    Unique(usize),
    /// Several candidates remain, in declaration order.
    Ambiguous(Vec<usize>),
    NoMatch,
}

/// Filter `candidates` by argument count, preserving declaration order.
pub fn select_by_arity<A: Arity>(candidates: &[A], argc: usize) -> OverloadSelection {
    let matching: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.accepts(argc))
        .map(|(i, _)| i)
        .collect();
    match matching.len() {
        0 => OverloadSelection::NoMatch,
        1 => OverloadSelection::Unique(matching[0]),
        _ => OverloadSelection::Ambiguous(matching),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sig(usize, Option<usize>);

    impl Arity for Sig {
        fn min_args(&self) -> usize {
            self.0
        }
        fn max_args(&self) -> Option<usize> {
            self.1
        }
    }

    #[test]
    fn test_unique_by_count() {
        let sigs = [Sig(1, Some(1)), Sig(2, Some(2))];
        assert_eq!(select_by_arity(&sigs, 2), OverloadSelection::Unique(1));
    }

    #[test]
    fn test_same_arity_is_ambiguous() {
        let sigs = [Sig(1, Some(1)), Sig(1, Some(1)), Sig(0, None)];
        assert_eq!(
            select_by_arity(&sigs, 1),
            OverloadSelection::Ambiguous(vec![0, 1, 2])
        );
    }

    #[test]
    fn test_no_match() {
        let sigs = [Sig(2, Some(3))];
        assert_eq!(select_by_arity(&sigs, 0), OverloadSelection::NoMatch);
        assert_eq!(select_by_arity(&sigs, 4), OverloadSelection::NoMatch);
    }
}
