// internal
use crate::hash::{empty_root, hash_leaf, hash_nodes, NamespacedHash};
use crate::namespace::Namespace;
use crate::proof::{NamespaceProof, Proof};
use crate::visitor::{NodeVisitor, NoopVisitor};
use crate::NmtError;

/// Largest power of two strictly smaller than `n`; trees split there so the
/// left subtree is always full. Exposed so verifiers and store walkers can
/// replay the exact construction shape.
pub fn split_point(n: usize) -> usize {
    debug_assert!(n > 1);
    if n.is_power_of_two() {
        n / 2
    } else {
        n.next_power_of_two() / 2
    }
}

struct Leaf {
    namespace: Namespace,
    data: Vec<u8>,
    hash: NamespacedHash,
}

/// Append-only merkle tree over namespace-ordered leaves.
///
/// Leaves must arrive with non-decreasing namespaces, which puts parity
/// leaves (committed under the maximal sentinel) at the tail. The first
/// `root` call seals the tree and offers every node to the visitor exactly
/// once, children before parents; proofs can be generated at any point.
pub struct NamespaceMerkleTree<V = NoopVisitor> {
    leaves: Vec<Leaf>,
    visitor: V,
    root: Option<NamespacedHash>,
}

impl NamespaceMerkleTree<NoopVisitor> {
    pub fn new() -> Self {
        Self::with_visitor(NoopVisitor)
    }
}

impl Default for NamespaceMerkleTree<NoopVisitor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: NodeVisitor> NamespaceMerkleTree<V> {
    pub fn with_visitor(visitor: V) -> Self {
        Self {
            leaves: Vec::new(),
            visitor,
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Append a leaf. Fails when `namespace` sorts below the previous leaf
    /// or when the tree is already sealed.
    pub fn push(&mut self, namespace: Namespace, data: &[u8]) -> Result<(), NmtError> {
        if self.root.is_some() {
            return Err(NmtError::Sealed);
        }
        if let Some(last) = self.leaves.last() {
            if namespace < last.namespace {
                return Err(NmtError::OrderingViolation {
                    index: self.leaves.len(),
                    prev: last.namespace,
                    next: namespace,
                });
            }
        }
        let hash = hash_leaf(namespace, data);
        self.leaves.push(Leaf {
            namespace,
            data: data.to_vec(),
            hash,
        });
        Ok(())
    }

    /// Compute the root, replaying every node through the visitor. A visitor
    /// failure aborts and no commitment is produced; the result is cached so
    /// nodes are never visited twice.
    pub fn root(&mut self) -> Result<NamespacedHash, NmtError> {
        if let Some(root) = self.root {
            return Ok(root);
        }
        let root = if self.leaves.is_empty() {
            empty_root()
        } else {
            for leaf in &self.leaves {
                self.visitor
                    .visit_leaf(&leaf.hash, leaf.namespace, &leaf.data)?;
            }
            self.compute_and_visit(0, self.leaves.len())?
        };
        self.root = Some(root);
        Ok(root)
    }

    /// Range proof for a single leaf.
    pub fn prove_inclusion(&self, index: usize) -> Result<Proof, NmtError> {
        if index >= self.leaves.len() {
            return Err(NmtError::LeafOutOfRange {
                index,
                len: self.leaves.len(),
            });
        }
        Ok(Proof {
            start: index,
            end: index + 1,
            siblings: self.range_siblings(index, index + 1),
        })
    }

    /// Proof for everything committed under `namespace`: a presence proof
    /// over its contiguous run, an absence proof via the successor leaf when
    /// the namespace falls in a gap of the committed range, or an empty
    /// proof when the namespace lies outside the range altogether.
    pub fn prove_namespace(&self, namespace: Namespace) -> NamespaceProof {
        if self.leaves.is_empty() {
            return NamespaceProof::Presence {
                proof: Proof::default(),
            };
        }
        let start = self
            .leaves
            .partition_point(|leaf| leaf.namespace < namespace);
        let end = self
            .leaves
            .partition_point(|leaf| leaf.namespace <= namespace);
        if start < end {
            return NamespaceProof::Presence {
                proof: Proof {
                    start,
                    end,
                    siblings: self.range_siblings(start, end),
                },
            };
        }
        if !self.current_root().contains(namespace) {
            return NamespaceProof::Presence {
                proof: Proof::default(),
            };
        }
        // In range yet absent: the first leaf past the gap proves nothing
        // else could carry the namespace.
        NamespaceProof::Absence {
            proof: Proof {
                start,
                end: start + 1,
                siblings: self.range_siblings(start, start + 1),
            },
            leaf: self.leaves[start].hash,
        }
    }

    fn current_root(&self) -> NamespacedHash {
        match self.root {
            Some(root) => root,
            None if self.leaves.is_empty() => empty_root(),
            None => self.subtree_root(0, self.leaves.len()),
        }
    }

    fn compute_and_visit(&self, a: usize, b: usize) -> Result<NamespacedHash, NmtError> {
        if b - a == 1 {
            return Ok(self.leaves[a].hash);
        }
        let mid = a + split_point(b - a);
        let left = self.compute_and_visit(a, mid)?;
        let right = self.compute_and_visit(mid, b)?;
        let parent = hash_nodes(&left, &right);
        self.visitor.visit_inner(&parent, &left, &right)?;
        Ok(parent)
    }

    fn subtree_root(&self, a: usize, b: usize) -> NamespacedHash {
        if b - a == 1 {
            return self.leaves[a].hash;
        }
        let mid = a + split_point(b - a);
        hash_nodes(&self.subtree_root(a, mid), &self.subtree_root(mid, b))
    }

    /// Roots of the maximal subtrees outside `[start, end)`, left to right;
    /// together with the in-range leaf hashes they rebuild the root.
    fn range_siblings(&self, start: usize, end: usize) -> Vec<NamespacedHash> {
        let mut siblings = Vec::new();
        self.collect_siblings(0, self.leaves.len(), start, end, &mut siblings);
        siblings
    }

    fn collect_siblings(
        &self,
        a: usize,
        b: usize,
        start: usize,
        end: usize,
        out: &mut Vec<NamespacedHash>,
    ) {
        if b <= start || a >= end {
            out.push(self.subtree_root(a, b));
            return;
        }
        if a >= start && b <= end {
            return;
        }
        let mid = a + split_point(b - a);
        self.collect_siblings(a, mid, start, end, out);
        self.collect_siblings(mid, b, start, end, out);
    }
}
