/*
Rendering of document trees through termtree.

termtree::Tree is a foreign type, so the conversion lives on a local trait
implemented for the document tree.
 */
use termtree::Tree as TermTree;
use tracing::instrument;

use crate::domain::{DomainResult, NodeId, Tree};

pub trait TreeDisplay {
    /// Build a printable tree rooted at `element`.
    fn to_termtree(&self, element: NodeId, with_attributes: bool) -> DomainResult<TermTree<String>>;
}

impl TreeDisplay for Tree {
    #[instrument(level = "debug", skip(self))]
    fn to_termtree(&self, element: NodeId, with_attributes: bool) -> DomainResult<TermTree<String>> {
        let mut node = TermTree::new(self.name(element)?.to_string());
        for &child in self.children(element)? {
            if self.is_element(child) {
                node.push(self.to_termtree(child, with_attributes)?);
            } else if with_attributes {
                node.push(TermTree::new(format!(
                    "{}: {}",
                    self.name(child)?,
                    self.value(child)?
                )));
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_termtree_renders_hierarchy() {
        let mut tree = Tree::new();
        let root = tree.root();
        let fish = tree.add_element(root, "fish").unwrap();
        tree.add_attribute(fish, "scales", 4).unwrap();

        let rendered = tree.to_termtree(root, true).unwrap().to_string();
        assert!(rendered.starts_with("root\n"));
        assert!(rendered.contains("fish"));
        assert!(rendered.contains("scales: 4"));

        let elements_only = tree.to_termtree(root, false).unwrap().to_string();
        assert!(!elements_only.contains("scales"));
    }
}
