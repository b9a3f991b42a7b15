//! Provenance metadata attached to every parser.
//!
//! Each parser owns one immutable `Meta` node created when the parser is
//! built. Nodes point at the metadata of their direct sub-parsers, so the
//! nodes reachable from a root parser mirror the grammar as a DAG. Nothing in
//! here is consulted while matching; it only feeds failure reporting.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a parser node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MetaId(u64);

impl MetaId {
    fn next() -> Self {
        MetaId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for MetaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural tag of a parser node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Primitive,
    Sequence,
    Choice,
    InclusiveChoice,
    Map,
    Repeat,
    Token,
    Recursive,
    Custom,
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Primitive => "primitive",
            Kind::Sequence => "sequence",
            Kind::Choice => "choice",
            Kind::InclusiveChoice => "inclusive choice",
            Kind::Map => "map",
            Kind::Repeat => "repeat",
            Kind::Token => "token",
            Kind::Recursive => "recursive",
            Kind::Custom => "custom",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Meta {
    id: MetaId,
    kind: Kind,
    label: Option<String>,
    children: Vec<Arc<Meta>>,
}

impl PartialEq for Meta {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Meta {}

impl Meta {
    pub fn new(kind: Kind, label: Option<String>, children: Vec<Arc<Meta>>) -> Arc<Self> {
        Arc::new(Self {
            id: MetaId::next(),
            kind,
            label,
            children,
        })
    }

    /// A fresh node with the same shape and a new label.
    pub(crate) fn relabel(&self, label: String) -> Arc<Self> {
        Self::new(self.kind, Some(label), self.children.clone())
    }

    pub fn id(&self) -> MetaId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn children(&self) -> &[Arc<Meta>] {
        &self.children
    }

    /// `label#id`, or `kind#id` for anonymous nodes.
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => format!("{label}{}", self.id),
            None => format!("{}{}", self.kind, self.id),
        }
    }

    /// Pre-order walk visiting every distinct node once.
    pub fn walk(&self) -> Vec<&Meta> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.walk_into(&mut seen, &mut out);
        out
    }

    fn walk_into<'a>(&'a self, seen: &mut HashSet<MetaId>, out: &mut Vec<&'a Meta>) {
        if !seen.insert(self.id) {
            return;
        }
        out.push(self);
        for child in &self.children {
            child.walk_into(seen, out);
        }
    }

    pub fn find(&self, id: MetaId) -> Option<&Meta> {
        self.walk().into_iter().find(|m| m.id == id)
    }

    /// The chain of nodes from this one down to `id`, both ends included.
    pub fn path_to(&self, id: MetaId) -> Option<Vec<&Meta>> {
        let mut dead_ends = HashSet::new();
        let mut path = Vec::new();
        if self.search(id, &mut dead_ends, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn search<'a>(
        &'a self,
        id: MetaId,
        dead_ends: &mut HashSet<MetaId>,
        path: &mut Vec<&'a Meta>,
    ) -> bool {
        if dead_ends.contains(&self.id) {
            return false;
        }
        path.push(self);
        if self.id == id {
            return true;
        }
        for child in &self.children {
            if child.search(id, dead_ends, path) {
                return true;
            }
        }
        path.pop();
        dead_ends.insert(self.id);
        false
    }

    /// Flattened, serializable view of the DAG below this node.
    pub fn graph(&self) -> Graph {
        let nodes = self
            .walk()
            .into_iter()
            .map(|m| GraphNode {
                id: m.id,
                kind: m.kind,
                label: m.label.clone(),
                children: m.children.iter().map(|c| c.id).collect(),
            })
            .collect();
        Graph {
            root: self.id,
            nodes,
        }
    }

    /// Indented outline of the grammar. Shared nodes are expanded once.
    pub fn render_tree(&self) -> String {
        let mut seen = HashSet::new();
        let mut out = String::new();
        self.render_into(0, &mut seen, &mut out);
        out
    }

    fn render_into(&self, depth: usize, seen: &mut HashSet<MetaId>, out: &mut String) {
        let indent = "  ".repeat(depth);
        if !seen.insert(self.id) {
            out.push_str(&format!("{indent}{} (shared)\n", self.describe()));
            return;
        }
        out.push_str(&format!("{indent}{}\n", self.describe()));
        for child in &self.children {
            child.render_into(depth + 1, seen, out);
        }
    }
}

impl Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: MetaId,
    pub kind: Kind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub children: Vec<MetaId>,
}

/// Metadata DAG as a flat node list, for grammar visualisation tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graph {
    pub root: MetaId,
    pub nodes: Vec<GraphNode>,
}

impl Graph {
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = Meta::new(Kind::Primitive, None, vec![]);
        let b = Meta::new(Kind::Primitive, None, vec![]);
        assert_ne!(a.id(), b.id());
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_describe() {
        let anon = Meta::new(Kind::Sequence, None, vec![]);
        let named = Meta::new(Kind::Primitive, Some("digit".to_string()), vec![]);
        assert_eq!(anon.describe(), format!("sequence#{}", anon.id().get()));
        assert_eq!(named.describe(), format!("digit#{}", named.id().get()));
    }

    #[test]
    fn test_shared_child_walked_once() {
        let leaf = Meta::new(Kind::Primitive, Some("x".to_string()), vec![]);
        let left = Meta::new(Kind::Map, None, vec![leaf.clone()]);
        let root = Meta::new(Kind::Sequence, None, vec![left.clone(), leaf.clone()]);

        let ids: Vec<MetaId> = root.walk().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![root.id(), left.id(), leaf.id()]);
        assert!(root.render_tree().contains("(shared)"));
    }

    #[test]
    fn test_path_to() {
        let leaf = Meta::new(Kind::Primitive, None, vec![]);
        let other = Meta::new(Kind::Primitive, None, vec![]);
        let mid = Meta::new(Kind::Repeat, None, vec![leaf.clone()]);
        let root = Meta::new(Kind::Choice, None, vec![other, mid.clone()]);

        let path: Vec<MetaId> = root
            .path_to(leaf.id())
            .unwrap()
            .iter()
            .map(|m| m.id())
            .collect();
        assert_eq!(path, vec![root.id(), mid.id(), leaf.id()]);

        let stranger = Meta::new(Kind::Primitive, None, vec![]);
        assert!(root.path_to(stranger.id()).is_none());
    }

    #[test]
    fn test_graph_export() {
        let leaf = Meta::new(Kind::Primitive, Some("digit".to_string()), vec![]);
        let root = Meta::new(Kind::Repeat, None, vec![leaf.clone()]);
        let graph = root.graph();
        assert_eq!(graph.root, root.id());
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].children, vec![leaf.id()]);

        let json = graph.to_json().unwrap();
        assert!(json.contains("\"kind\": \"repeat\""));
        assert!(json.contains("\"label\": \"digit\""));
        let yaml = graph.to_yaml().unwrap();
        assert!(yaml.contains("kind: primitive"));
    }
}
