//! Patricia trie over RIDs
//!
//! One trie holds the forwarding entries of a single size class. It is a
//! classic bit-indexed Patricia trie without null links: every node tests
//! one bit (`key_bit`) of the RID, and a link either descends to a node with
//! a larger `key_bit` ([`Link::Child`]) or points back up to the node that
//! holds the key found along that path ([`Link::Thread`]). The root holds
//! the all-zero RID with `key_bit == 0` and starts with both links threaded
//! to itself.
//!
//! Nodes live in an arena and are addressed by [`NodeId`], so back-edges are
//! plain indices rather than shared ownership.
//!
//! INVARIANTS:
//! - `Child(c)` from `n` implies `c.key_bit > n.key_bit`
//! - `Thread(c)` from `n` implies `c.key_bit <= n.key_bit`
//! - `search(rid)` reaches the node holding `rid` in a single descent

use std::fmt;

use crate::error::FibError;

use super::encoder::prefix_distance;
use super::rid::Rid;
use super::stats::{Classification, Statistics};

/// Arena index of a trie node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The root node, always present
pub const ROOT: NodeId = NodeId(0);

/// Outgoing link of a trie node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Link {
    /// Descending link, owned subtree
    Child(NodeId),
    /// Back-edge to the node holding the key on this path
    Thread(NodeId),
}

impl Link {
    pub fn target(self) -> NodeId {
        match self {
            Link::Child(id) | Link::Thread(id) => id,
        }
    }
}

/// A forwarding entry: RID, declared size and the name it was encoded from
///
/// The name is kept only to tell true positives from Bloom collisions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    pub rid: Rid,
    pub size: usize,
    pub prefix: String,
}

impl Entry {
    pub fn new(rid: Rid, size: usize, prefix: impl Into<String>) -> Self {
        Self {
            rid,
            size,
            prefix: prefix.into(),
        }
    }

    /// The default entry held by the root
    pub fn root() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug)]
struct Node {
    key_bit: usize,
    entry: Entry,
    left: Link,
    right: Link,
}

/// Result of [`Trie::insert`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(NodeId),
    /// An entry with the same RID already exists; nothing changed
    Duplicate(NodeId),
}

impl InsertOutcome {
    pub fn node(self) -> NodeId {
        match self {
            InsertOutcome::Inserted(id) | InsertOutcome::Duplicate(id) => id,
        }
    }

    pub fn is_inserted(self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// A node visited by a lookup traversal
#[derive(Clone, Copy, Debug)]
pub struct Visit<'a> {
    pub node: NodeId,
    pub key_bit: usize,
    pub class: Classification,
    /// `|F\R|` between the request and the node's entry
    pub distance: usize,
    pub entry: &'a Entry,
}

/// Owned copy of a [`Visit`], as returned by [`Trie::trace`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitRecord {
    pub node: NodeId,
    pub key_bit: usize,
    pub class: Classification,
    pub distance: usize,
    pub prefix: String,
}

/// Pre-order view of one node and its two links
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeView {
    pub node: NodeId,
    pub key_bit: usize,
    pub prefix: String,
    pub rid_prefix: String,
    pub left: Link,
    pub right: Link,
}

/// Patricia trie for one size class
#[derive(Clone, Debug)]
pub struct Trie {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl Trie {
    /// An empty trie: just the all-zero root, threaded to itself
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                key_bit: 0,
                entry: Entry::root(),
                left: Link::Thread(ROOT),
                right: Link::Thread(ROOT),
            }],
            free: Vec::new(),
        }
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Number of forwarding entries (root excluded)
    pub fn entries(&self) -> usize {
        self.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.entries() == 0
    }

    pub fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.live(id).map(|n| &n.entry)
    }

    pub fn key_bit(&self, id: NodeId) -> Option<usize> {
        self.live(id).map(|n| n.key_bit)
    }

    /// `(left, right)` links of a node
    pub fn links(&self, id: NodeId) -> Option<(Link, Link)> {
        self.live(id).map(|n| (n.left, n.right))
    }

    fn live(&self, id: NodeId) -> Option<&Node> {
        if self.free.contains(&id) {
            return None;
        }
        self.nodes.get(id.0)
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    #[inline]
    fn branch(&self, id: NodeId, right: bool) -> Link {
        let node = self.node(id);
        if right {
            node.right
        } else {
            node.left
        }
    }

    #[inline]
    fn set_branch(&mut self, id: NodeId, right: bool, link: Link) {
        let node = self.node_mut(id);
        if right {
            node.right = link;
        } else {
            node.left = link;
        }
    }

    /// Link from a node with `from_key` to `to`, kind derived from key bits
    #[inline]
    fn link_to(&self, from_key: usize, to: NodeId) -> Link {
        if self.node(to).key_bit > from_key {
            Link::Child(to)
        } else {
            Link::Thread(to)
        }
    }

    /// Follow `rid`'s bits from `start` until a back-edge
    ///
    /// Returns the node that issued the back-edge, the side it was taken on
    /// and the node it points to.
    fn descend(&self, start: NodeId, rid: &Rid) -> (NodeId, bool, NodeId) {
        let mut t = start;
        loop {
            let right = rid.bit(self.node(t).key_bit);
            match self.branch(t, right) {
                Link::Child(c) => t = c,
                Link::Thread(c) => return (t, right, c),
            }
        }
    }

    /// Exact search: bitwise equality, not containment
    pub fn search(&self, rid: &Rid) -> Option<NodeId> {
        let (_, _, t) = self.descend(ROOT, rid);
        (self.node(t).entry.rid == *rid).then_some(t)
    }

    fn alloc(&mut self, node: Node) -> Result<NodeId, FibError> {
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            return Ok(id);
        }

        self.nodes
            .try_reserve(1)
            .map_err(|_| FibError::AllocationFailure { what: "trie node" })?;
        self.nodes.push(node);
        Ok(NodeId(self.nodes.len() - 1))
    }

    /// Insert an entry
    ///
    /// The new node becomes a branch point on bit `d`, the first bit where
    /// its RID differs from the closest existing key. It is spliced in above
    /// the first node on its path whose `key_bit` is `>= d`, or at the first
    /// back-edge; its two links are itself and the displaced subtree.
    pub fn insert(&mut self, entry: Entry) -> Result<InsertOutcome, FibError> {
        let rid = entry.rid;

        let (_, _, closest) = self.descend(ROOT, &rid);
        if self.node(closest).entry.rid == rid {
            return Ok(InsertOutcome::Duplicate(closest));
        }

        let d = rid.first_differing_bit(&self.node(closest).entry.rid);

        // find where the new node goes: parent p, side, displaced node h
        let mut p = ROOT;
        let mut side = rid.bit(self.node(p).key_bit);
        let mut h = self.branch(p, side).target();
        loop {
            let h_key = self.node(h).key_bit;
            if h_key >= d || h_key <= self.node(p).key_bit {
                break;
            }
            p = h;
            side = rid.bit(h_key);
            h = self.branch(p, side).target();
        }

        let n = self.alloc(Node {
            key_bit: d,
            entry,
            left: Link::Thread(ROOT),
            right: Link::Thread(ROOT),
        })?;

        let displaced = self.link_to(d, h);
        if rid.bit(d) {
            self.set_branch(n, false, displaced);
            self.set_branch(n, true, Link::Thread(n));
        } else {
            self.set_branch(n, false, Link::Thread(n));
            self.set_branch(n, true, displaced);
        }

        let p_key = self.node(p).key_bit;
        let link = self.link_to(p_key, n);
        self.set_branch(p, side, link);

        Ok(InsertOutcome::Inserted(n))
    }

    /// Remove the entry whose RID equals `rid`
    ///
    /// The node `p` that issued the back-edge to the target `t` is unlinked:
    /// its grandparent takes over `p`'s other subtree, the back-edge that
    /// pointed at `p` is redirected to `t`, and `t` adopts `p`'s entry.
    ///
    /// # Errors
    /// - `RemovalUnsupported` for the root (default) entry
    /// - `EntryNotFound` if no entry has exactly this RID
    pub fn remove(&mut self, rid: &Rid) -> Result<Entry, FibError> {
        let mut g = ROOT;
        let mut p = ROOT;
        let mut t = ROOT;
        loop {
            let right = rid.bit(self.node(t).key_bit);
            g = p;
            p = t;
            match self.branch(t, right) {
                Link::Child(c) => t = c,
                Link::Thread(c) => {
                    t = c;
                    break;
                }
            }
        }

        if self.node(t).entry.rid != *rid {
            return Err(FibError::EntryNotFound);
        }
        if t == ROOT {
            return Err(FibError::RemovalUnsupported {
                reason: "the default entry cannot be removed",
            });
        }

        let p_side = rid.bit(self.node(p).key_bit);

        if t != p {
            // redirect the back-edge that points at p's key
            let p_rid = self.node(p).entry.rid;
            let (pp, pp_side, _) = self.descend(p, &p_rid);
            let pp_key = self.node(pp).key_bit;
            let link = self.link_to(pp_key, t);
            self.set_branch(pp, pp_side, link);
        }

        // g takes over the subtree on p's other side
        let sibling = self.branch(p, !p_side).target();
        let g_side = rid.bit(self.node(g).key_bit);
        let g_key = self.node(g).key_bit;
        let link = self.link_to(g_key, sibling);
        self.set_branch(g, g_side, link);

        let removed = if t != p {
            let moved = std::mem::take(&mut self.node_mut(p).entry);
            std::mem::replace(&mut self.node_mut(t).entry, moved)
        } else {
            std::mem::take(&mut self.node_mut(p).entry)
        };

        self.node_mut(p).left = Link::Thread(p);
        self.node_mut(p).right = Link::Thread(p);
        self.free.push(p);

        Ok(removed)
    }

    /// Walk the trie for a request, classifying every visited node
    ///
    /// A node is a candidate if the request contains its RID on the
    /// node's `key_bit` leading bits. Candidates whose full RID is contained
    /// in the request are TPs when the node's name is a substring of the
    /// request name and FPs otherwise; everything else is a TN. The right
    /// subtree is only entered from candidates (a '1' decision bit the
    /// request lacks cannot lead to containment), the left subtree always.
    ///
    /// Returns the number of visited nodes.
    pub fn traverse<F>(&self, request: &Rid, request_name: &str, mut on_visit: F) -> usize
    where
        F: FnMut(&Visit<'_>),
    {
        self.walk(ROOT, request, request_name, &mut on_visit)
    }

    fn walk<F>(&self, id: NodeId, request: &Rid, request_name: &str, on_visit: &mut F) -> usize
    where
        F: FnMut(&Visit<'_>),
    {
        let node = self.node(id);
        let entry = &node.entry;

        let candidate = request.contains_masked(&entry.rid, node.key_bit);
        let class = if candidate && entry.size > 0 && request.contains(&entry.rid) {
            if request_name.contains(entry.prefix.as_str()) {
                Classification::TruePositive
            } else {
                Classification::FalsePositive
            }
        } else {
            Classification::TrueNegative
        };

        on_visit(&Visit {
            node: id,
            key_bit: node.key_bit,
            class,
            distance: prefix_distance(request_name, &entry.prefix, entry.size),
            entry,
        });

        let mut visited = 1;
        if candidate {
            if let Link::Child(right) = node.right {
                visited += self.walk(right, request, request_name, on_visit);
            }
        }
        if let Link::Child(left) = node.left {
            visited += self.walk(left, request, request_name, on_visit);
        }

        visited
    }

    /// Traverse and accumulate every classification into `stats`
    pub fn classify_and_traverse(
        &self,
        request: &Rid,
        request_name: &str,
        stats: &mut Statistics,
    ) -> usize {
        self.traverse(request, request_name, |visit| {
            stats.record_visit(visit.distance, visit.class)
        })
    }

    /// Visit sequence of a traversal
    pub fn trace(&self, request: &Rid, request_name: &str) -> Vec<VisitRecord> {
        let mut records = Vec::new();
        self.traverse(request, request_name, |visit| {
            records.push(VisitRecord {
                node: visit.node,
                key_bit: visit.key_bit,
                class: visit.class,
                distance: visit.distance,
                prefix: visit.entry.prefix.clone(),
            })
        });
        records
    }

    /// Nodes reachable through descending links, in pre-order
    pub fn nodes_preorder(&self) -> Vec<NodeView> {
        let mut views = Vec::with_capacity(self.len());
        let mut stack = vec![ROOT];

        while let Some(id) = stack.pop() {
            let node = self.node(id);
            views.push(NodeView {
                node: id,
                key_bit: node.key_bit,
                prefix: node.entry.prefix.clone(),
                rid_prefix: node.entry.rid.prefix_hex(node.key_bit),
                left: node.left,
                right: node.right,
            });

            // left first on output
            if let Link::Child(right) = node.right {
                stack.push(right);
            }
            if let Link::Child(left) = node.left {
                stack.push(left);
            }
        }

        views
    }

    /// Check key-bit monotonicity of every link and that all live nodes are reachable
    pub fn check_invariants(&self) -> bool {
        let views = self.nodes_preorder();
        let consistent = views.iter().all(|view| {
            [view.left, view.right].iter().all(|link| match *link {
                Link::Child(c) => self.node(c).key_bit > view.key_bit,
                Link::Thread(c) => self.node(c).key_bit <= view.key_bit,
            })
        });

        consistent && views.len() == self.len()
    }

    /// Release every node, returning how many were reachable
    ///
    /// Back-edges (the root's self-links included) are never followed.
    pub fn erase(mut self) -> usize {
        let mut released = 0;
        let mut stack = vec![ROOT];

        while let Some(id) = stack.pop() {
            let node = self.node_mut(id);
            let (left, right) = (node.left, node.right);
            node.entry = Entry::default();
            released += 1;

            if let Link::Child(c) = left {
                stack.push(c);
            }
            if let Link::Child(c) = right {
                stack.push(c);
            }
        }

        self.nodes.clear();
        self.free.clear();
        released
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Trie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let describe = |link: Link| {
            let target = self.node(link.target());
            format!(
                "[{} ({})]",
                target.entry.rid.prefix_hex(target.key_bit),
                target.key_bit
            )
        };

        for view in self.nodes_preorder() {
            writeln!(
                f,
                "{} <-- [{} ({})] --> {}",
                describe(view.left),
                view.rid_prefix,
                view.key_bit,
                describe(view.right)
            )?;
        }
        Ok(())
    }
}
