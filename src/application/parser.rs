//! Scanner turning Defold text into a document tree
//!
//! The scanner walks the text with a cursor and repeatedly matches the next
//! lexical unit: an embedded `data:` attribute, a `name: value` attribute, an
//! element open `name {` or an element close `}`. Open elements are tracked on
//! an explicit chain; embedded documents are decoded and scanned recursively
//! on the same chain.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, instrument, trace, warn};

use crate::application::error::ParseError;
use crate::application::escape::decode_literals;
use crate::domain::{NodeId, Tree};

/// Alternatives are tried in priority order at each position.
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?:^|\s)data:\s+(?P<payload>.+(?:\s+".*)*)"#,
        r#"|(?:^|\s)(?P<key>\w+):\s+(?P<value>.+(?:\s+".*)*)"#,
        r"|(?P<open>\w*)\W\{",
        r"|(?P<close>\})",
    ))
    .unwrap()
});

/// Parse `text` into a fresh tree.
///
/// `path` only labels error messages.
#[instrument(level = "debug", skip(text))]
pub fn parse(text: &str, path: Option<&Path>) -> Result<Tree, ParseError> {
    let mut tree = Tree::new();
    let root = tree.root();
    parse_into(&mut tree, root, text, path)?;
    Ok(tree)
}

/// Parse `text` and append the resulting nodes under `element`.
pub fn parse_into(
    tree: &mut Tree,
    element: NodeId,
    text: &str,
    path: Option<&Path>,
) -> Result<(), ParseError> {
    if !tree.is_element(element) {
        return Err(ParseError::new(path, "parse target is not an element"));
    }
    let mut scanner = Scanner {
        tree,
        chain: vec![element],
        path,
    };
    scanner.scan(text)?;
    debug!(nodes = scanner.tree.iter_all(element).count(), "parsed document");
    Ok(())
}

struct Scanner<'a> {
    tree: &'a mut Tree,
    /// Open elements, innermost last
    chain: Vec<NodeId>,
    path: Option<&'a Path>,
}

impl<'a> Scanner<'a> {
    /// Scan one (sub-)document. Elements below the current chain length are
    /// out of reach for its closing braces.
    fn scan(&mut self, text: &str) -> Result<(), ParseError> {
        let floor = self.chain.len();
        let mut cursor = 0;

        while let Some(caps) = TOKEN_REGEX.captures(&text[cursor..]) {
            let Some(unit) = caps.get(0) else { break };
            let skipped = &text[cursor..cursor + unit.start()];
            if !skipped.trim().is_empty() {
                warn!(skipped = skipped.trim(), "ignoring unrecognized text");
            }
            let unit_text = unit.as_str();
            let at = cursor + unit.start() + unit_text.len() - unit_text.trim_start().len();
            self.apply(&caps, text, at, floor)?;
            cursor += unit.end();
        }

        let rest = &text[cursor..];
        if !rest.trim().is_empty() {
            let offset = cursor + rest.len() - rest.trim_start().len();
            return Err(self.error(text, offset, format!("unexpected text {:?}", snippet(rest))));
        }
        if self.chain.len() > floor {
            warn!(open = self.chain.len() - floor, "elements left open at end of document");
            self.chain.truncate(floor);
        }
        Ok(())
    }

    fn apply(
        &mut self,
        caps: &Captures<'_>,
        text: &str,
        at: usize,
        floor: usize,
    ) -> Result<(), ParseError> {
        let top = self.top();

        if let Some(payload) = caps.name("payload") {
            let decoded = decode_literals(payload.as_str())
                .map_err(|reason| self.error(text, at, format!("bad data value: {reason}")))?;
            trace!(len = decoded.len(), "entering embedded document");
            let data = self
                .tree
                .add_element(top, "data")
                .map_err(|e| self.error(text, at, e.to_string()))?;
            self.chain.push(data);
            self.scan(&decoded)?;
            self.chain.pop();
        } else if let (Some(key), Some(value)) = (caps.name("key"), caps.name("value")) {
            self.tree
                .add_attribute(top, key.as_str(), value.as_str())
                .map_err(|e| self.error(text, at, e.to_string()))?;
        } else if let Some(open) = caps.name("open") {
            if open.as_str().is_empty() {
                return Err(self.error(text, at, "element without a name"));
            }
            let element = self
                .tree
                .add_element(top, open.as_str())
                .map_err(|e| self.error(text, at, e.to_string()))?;
            self.chain.push(element);
        } else if caps.name("close").is_some() {
            if self.chain.len() <= floor {
                return Err(self.error(text, at, "unexpected '}' without an open element"));
            }
            self.chain.pop();
        }
        Ok(())
    }

    fn top(&self) -> NodeId {
        // the chain never drops below the element parsing started at
        self.chain[self.chain.len() - 1]
    }

    fn error(&self, text: &str, offset: usize, reason: impl Into<String>) -> ParseError {
        let line = text[..offset].matches('\n').count() + 1;
        ParseError::new(self.path, format!("{} (line {line})", reason.into()))
    }
}

fn snippet(rest: &str) -> String {
    rest.trim().chars().take(40).collect()
}
