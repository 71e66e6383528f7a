//! Pre-order subtree search

use crate::pattern::{Captures, Pattern};
use crate::syntax::SyntaxNode;

/// Pre-order iterator over a node and all of its descendants
pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // reversed so the first child is visited next
        self.stack.extend(node.child_nodes().collect::<Vec<_>>().into_iter().rev());
        Some(node)
    }
}

/// Walk `root` (possibly absent) in pre-order, root first
pub fn descendants(root: Option<&SyntaxNode>) -> Descendants<'_> {
    Descendants {
        stack: root.into_iter().collect(),
    }
}

/// Whether `root` or any node below it satisfies `predicate`
///
/// Stops at the first hit. An absent root has no descendants.
pub fn any_descendant<F>(root: Option<&SyntaxNode>, predicate: F) -> bool
where
    F: FnMut(&SyntaxNode) -> bool,
{
    descendants(root).any(predicate)
}

/// Whether any node in the subtree matches `pattern` under `seed` captures
pub fn any_match<'a>(
    root: Option<&'a SyntaxNode>,
    pattern: &Pattern,
    seed: &Captures<'a>,
) -> bool {
    descendants(root).any(|node| pattern.matches_with(node, seed.clone()).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{NodeKind, parse_ruby};

    #[test]
    fn test_pre_order() {
        let root = parse_ruby("a(b(c), d)").unwrap();
        let names: Vec<_> = descendants(root.as_ref())
            .filter_map(|n| n.method_name())
            .collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_absent_root() {
        assert!(!any_descendant(None, |_| true));
        assert_eq!(descendants(None).count(), 0);
    }

    #[test]
    fn test_includes_root() {
        let root = parse_ruby("raise").unwrap();
        assert!(any_descendant(root.as_ref(), |n| n.method_name() == Some("raise")));
    }

    #[test]
    fn test_finds_deeply_nested_node() {
        let root = parse_ruby("if ok\n  log(x)\nelse\n  notify(wrap(raise))\nend").unwrap();
        let pattern = Pattern::parse("(send nil? :raise)").unwrap();
        assert!(any_match(root.as_ref(), &pattern, &Captures::new()));
    }

    #[test]
    fn test_short_circuits() {
        let root = parse_ruby("a; b; c").unwrap();
        let mut visited = 0;
        let found = any_descendant(root.as_ref(), |n| {
            visited += 1;
            n.is(NodeKind::Send)
        });
        assert!(found);
        // begin, then the first send
        assert_eq!(visited, 2);
    }
}
