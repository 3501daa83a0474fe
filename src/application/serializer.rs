//! Tree to text serialization
//!
//! Elements are written as `name {` ... `}` blocks and attributes as
//! `name: value` lines, two spaces of indentation per level below the
//! serialization root. Elements named `data` are written back as escaped,
//! quoted `data:` attributes unless serializing internally.

use std::collections::BTreeMap;

use tracing::{instrument, trace};

use crate::application::escape::{quote, split_continuation};
use crate::domain::{DomainResult, NodeId, Tree};

const INDENT: &str = "  ";

/// Serialize the children of `element`.
///
/// With `internal` set, `data` elements are written as plain elements.
#[instrument(level = "trace", skip(tree))]
pub fn serialize(tree: &Tree, element: NodeId, internal: bool) -> DomainResult<String> {
    let base = tree.depth(element);
    let mut out = String::new();
    write_children(tree, element, base, internal, &mut out)?;
    Ok(out)
}

fn write_children(
    tree: &Tree,
    element: NodeId,
    base: usize,
    internal: bool,
    out: &mut String,
) -> DomainResult<()> {
    for &child in tree.children(element)? {
        let indent = INDENT.repeat(tree.depth(child) - base - 1);
        let name = tree.name(child)?;

        if tree.is_attribute(child) {
            out.push_str(&format!("{indent}{name}: {}\n", tree.value(child)?));
        } else if !internal && name == "data" {
            let literal = escape_data(tree, child, &indent)?;
            out.push_str(&format!("{indent}data: {literal}\n"));
        } else {
            out.push_str(&format!("{indent}{name} {{\n"));
            write_children(tree, child, base, internal, out)?;
            out.push_str(&format!("{indent}}}\n"));
        }
    }
    Ok(())
}

/// Render a `data` element as the value of a `data:` attribute.
///
/// Works on a scratch copy: nested `data` elements are collapsed into
/// single-line string attributes from the deepest level up, then the whole
/// subtree is escaped and split into continuation lines.
fn escape_data(tree: &Tree, data: NodeId, indent: &str) -> DomainResult<String> {
    let mut scratch = tree.extract(data)?;
    let root = scratch.root();

    let mut levels: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
    for nested in scratch.iter_elements(root, Some("data")) {
        levels.entry(scratch.depth(nested)).or_default().push(nested);
    }

    while let Some((depth, nested_at_depth)) = levels.pop_last() {
        trace!(depth, count = nested_at_depth.len(), "collapsing nested data");
        for nested in nested_at_depth {
            let Some(parent) = scratch.parent(nested) else {
                continue;
            };
            let index = scratch.index_of(parent, nested)?;
            let literal = quote(&serialize(&scratch, nested, true)?);
            scratch.remove(parent, nested)?;
            let attribute = scratch.create_attribute("data", literal);
            scratch.insert(parent, index, attribute)?;
        }
    }

    let text = serialize(&scratch, root, true)?;
    Ok(split_continuation(&quote(&text), indent))
}
