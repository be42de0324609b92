//! Arena-backed value tree for literal tensor expressions.
//!
//! Nodes are addressed by [`ValueId`]. A tensor stores the ids of its
//! children, and every child is allocated before its parent, so the tree
//! is acyclic by construction. Each node carries a write-once shape memo
//! filled by [`ValueArena::shape`](crate::shape).

use std::cell::OnceCell;

use crate::shape::Shape;
use crate::token::Span;

/// Index of a node in a [`ValueArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(usize);

impl ValueId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A scalar leaf or a tensor of child values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Tensor(Vec<ValueId>),
}

#[derive(Debug)]
struct Node {
    value: Value,
    span: Option<Span>,
    shape: OnceCell<Shape>,
}

/// Owner of every value node of one literal (or one compilation unit).
#[derive(Debug, Default)]
pub struct ValueArena {
    nodes: Vec<Node>,
}

impl ValueArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn scalar(&mut self, value: f64) -> ValueId {
        self.alloc(Value::Scalar(value), None)
    }

    /// Allocate a tensor. Its shape is not checked until first queried.
    pub fn tensor(&mut self, children: Vec<ValueId>) -> ValueId {
        self.alloc(Value::Tensor(children), None)
    }

    /// Allocate a value remembering where its literal starts.
    pub fn alloc(&mut self, value: Value, span: Option<Span>) -> ValueId {
        let id = ValueId(self.nodes.len());
        self.nodes.push(Node {
            value,
            span,
            shape: OnceCell::new(),
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: ValueId) -> Option<&Value> {
        self.nodes.get(id.0).map(|n| &n.value)
    }

    #[must_use]
    pub fn is_scalar(&self, id: ValueId) -> bool {
        matches!(self.get(id), Some(Value::Scalar(_)))
    }

    #[must_use]
    pub fn is_tensor(&self, id: ValueId) -> bool {
        matches!(self.get(id), Some(Value::Tensor(_)))
    }

    /// Children of a tensor; empty for scalars and unknown ids.
    #[must_use]
    pub fn children(&self, id: ValueId) -> &[ValueId] {
        match self.get(id) {
            Some(Value::Tensor(children)) => children,
            _ => &[],
        }
    }

    #[must_use]
    pub fn span(&self, id: ValueId) -> Option<&Span> {
        self.nodes.get(id.0).and_then(|n| n.span.as_ref())
    }

    /// The memoized shape, if a successful query has already run.
    #[must_use]
    pub fn cached_shape(&self, id: ValueId) -> Option<&Shape> {
        self.nodes.get(id.0).and_then(|n| n.shape.get())
    }

    pub(crate) fn memo(&self, id: ValueId) -> Option<&OnceCell<Shape>> {
        self.nodes.get(id.0).map(|n| &n.shape)
    }

    /// Swap the child at `index` of `tensor`, returning the old child.
    ///
    /// A cached shape on `tensor` or its ancestors is NOT invalidated.
    /// Returns `None` (and changes nothing) if `tensor` is not a tensor,
    /// `index` is out of range, or `child` was not allocated before
    /// `tensor`.
    pub fn replace_child(
        &mut self,
        tensor: ValueId,
        index: usize,
        child: ValueId,
    ) -> Option<ValueId> {
        if child >= tensor {
            return None;
        }
        match self.nodes.get_mut(tensor.0).map(|n| &mut n.value) {
            Some(Value::Tensor(children)) => children
                .get_mut(index)
                .map(|slot| std::mem::replace(slot, child)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_allocation_order() {
        let mut arena = ValueArena::new();
        let a = arena.scalar(1.0);
        let b = arena.scalar(2.0);
        let t = arena.tensor(vec![a, b]);
        assert_eq!((a.index(), b.index(), t.index()), (0, 1, 2));
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.children(t), &[a, b]);
        assert!(arena.children(a).is_empty());
    }

    #[test]
    fn variant_predicates() {
        let mut arena = ValueArena::new();
        let s = arena.scalar(1.5);
        let t = arena.tensor(vec![s]);
        assert!(arena.is_scalar(s) && !arena.is_tensor(s));
        assert!(arena.is_tensor(t) && !arena.is_scalar(t));
        assert_eq!(arena.get(s), Some(&Value::Scalar(1.5)));
    }

    #[test]
    fn replace_child_refuses_later_nodes() {
        let mut arena = ValueArena::new();
        let s = arena.scalar(1.0);
        let t = arena.tensor(vec![s]);
        let later = arena.scalar(2.0);
        assert_eq!(arena.replace_child(t, 0, later), None);
        assert_eq!(arena.replace_child(t, 0, t), None);
        assert_eq!(arena.replace_child(t, 1, s), None);
        assert_eq!(arena.replace_child(s, 0, s), None);
        assert_eq!(arena.children(t), &[s]);
    }
}
