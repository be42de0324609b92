//! Tensor shapes and lazy, memoized shape inference.
//!
//! A tensor is well-formed when all siblings at every nesting depth have
//! identical shapes, the same rule numpy applies when it rejects an
//! "inhomogeneous" array. `[[1, 2], [3, 4]]` has shape `(2, 2)`;
//! `[[1, 2], [3]]` is ragged.
//!
//! Validation is lazy: a tensor is only checked when its shape is first
//! asked for. Ragged literals that are never used never raise.

use std::fmt;

use crate::token::Span;
use crate::value::{Value, ValueArena, ValueId};

/// Ordered dimension sizes. Rank 0 is a scalar.
///
/// The uninitialized shape compares unequal to everything, itself
/// included, so `Shape` is `PartialEq` but not `Eq`.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    dims: Option<Vec<usize>>,
}

impl Shape {
    #[must_use]
    pub const fn uninitialized() -> Self {
        Self { dims: None }
    }

    #[must_use]
    pub const fn scalar() -> Self {
        Self {
            dims: Some(Vec::new()),
        }
    }

    #[must_use]
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self {
            dims: Some(dims.into()),
        }
    }

    /// Number of dimensions; `None` while uninitialized.
    #[must_use]
    pub fn rank(&self) -> Option<usize> {
        self.dims.as_ref().map(Vec::len)
    }

    #[must_use]
    pub fn dims(&self) -> Option<&[usize]> {
        self.dims.as_deref()
    }

    #[must_use]
    pub const fn is_uninitialized(&self) -> bool {
        self.dims.is_none()
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.rank() == Some(0)
    }

    /// `[outer] ++ self`.
    fn with_outer(&self, outer: usize) -> Self {
        let inner = self.dims().unwrap_or_default();
        let mut dims = Vec::with_capacity(inner.len() + 1);
        dims.push(outer);
        dims.extend_from_slice(inner);
        Self::new(dims)
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        match (&self.dims, &other.dims) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(dims) = &self.dims else {
            return write!(f, "<uninitialized>");
        };
        write!(f, "(")?;
        for (i, dim) in dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, ")")
    }
}

/// Classifies a shape error.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeErrorKind {
    /// Tensor with no children.
    EmptyTensor,
    /// Sibling `index` nests to a different child count than sibling 0.
    RankMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    /// Sibling `index` has a different shape than sibling 0.
    ShapeMismatch {
        index: usize,
        expected: Shape,
        found: Shape,
    },
    /// Id not in the arena, or a child allocated after its parent.
    InvalidValue(ValueId),
}

impl fmt::Display for ShapeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTensor => write!(f, "tensor must have at least one element"),
            Self::RankMismatch {
                index,
                expected,
                found,
            } => {
                write!(
                    f,
                    "ragged tensor: element {index} has {found} sub-element(s), \
                     expected {expected}"
                )
            }
            Self::ShapeMismatch {
                index,
                expected,
                found,
            } => {
                write!(
                    f,
                    "ragged tensor: element {index} has shape {found}, \
                     expected {expected}"
                )
            }
            Self::InvalidValue(id) => write!(f, "invalid value #{}", id.index()),
        }
    }
}

/// Error produced while inferring a tensor's shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}{}", location(span.as_ref()))]
pub struct ShapeError {
    pub kind: ShapeErrorKind,
    /// The tensor that failed validation.
    pub value: ValueId,
    /// Where that tensor's literal starts, if known.
    pub span: Option<Span>,
}

fn location(span: Option<&Span>) -> String {
    span.map_or_else(String::new, |s| {
        format!(" at {}: line {}, column {}", s.file, s.line, s.column)
    })
}

impl ValueArena {
    /// Shape of `id`, validating on first query and memoizing on success.
    ///
    /// Once cached, a tensor's shape is returned as-is even if its
    /// children were replaced afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError` if `id` or any tensor below it is ragged or
    /// empty. Nothing is cached for a failed tensor.
    pub fn shape(&self, id: ValueId) -> Result<Shape, ShapeError> {
        let Some(memo) = self.memo(id) else {
            return Err(self.shape_error(ShapeErrorKind::InvalidValue(id), id));
        };
        if let Some(shape) = memo.get() {
            return Ok(shape.clone());
        }

        let shape = compute_shape(self, id)?;
        if self.is_tensor(id) && memo.set(shape.clone()).is_ok() {
            tracing::trace!(value = id.index(), shape = %shape, "shape memoized");
        }
        Ok(shape)
    }

    fn shape_error(&self, kind: ShapeErrorKind, id: ValueId) -> ShapeError {
        tracing::debug!(value = id.index(), error = %kind, "shape check failed");
        ShapeError {
            kind,
            value: id,
            span: self.span(id).cloned(),
        }
    }

    /// Child count one level down: 0 for a scalar.
    fn next_level_rank(&self, parent: ValueId, child: ValueId) -> Result<usize, ShapeError> {
        match self.get(child) {
            Some(Value::Scalar(_)) if child < parent => Ok(0),
            Some(Value::Tensor(children)) if child < parent => Ok(children.len()),
            _ => Err(self.shape_error(ShapeErrorKind::InvalidValue(child), parent)),
        }
    }
}

/// Compute the shape of `id` from its children, ignoring `id`'s own memo.
///
/// Child tensors are validated through [`ValueArena::shape`], so their
/// results are memoized along the way.
///
/// # Errors
///
/// Returns `ShapeError` for empty or ragged tensors at any depth.
pub fn compute_shape(arena: &ValueArena, id: ValueId) -> Result<Shape, ShapeError> {
    let children = match arena.get(id) {
        Some(Value::Scalar(_)) => return Ok(Shape::scalar()),
        Some(Value::Tensor(children)) => children,
        None => return Err(arena.shape_error(ShapeErrorKind::InvalidValue(id), id)),
    };
    let Some((&first, rest)) = children.split_first() else {
        return Err(arena.shape_error(ShapeErrorKind::EmptyTensor, id));
    };

    let expected = arena.next_level_rank(id, first)?;
    for (offset, &child) in rest.iter().enumerate() {
        let found = arena.next_level_rank(id, child)?;
        if found != expected {
            return Err(arena.shape_error(
                ShapeErrorKind::RankMismatch {
                    index: offset + 1,
                    expected,
                    found,
                },
                id,
            ));
        }
    }

    // An empty child tensor also reports rank 0, so check the variants.
    if children.iter().all(|&c| arena.is_scalar(c)) {
        return Ok(Shape::new([children.len()]));
    }

    let child_shapes = children
        .iter()
        .map(|&c| arena.shape(c))
        .collect::<Result<Vec<_>, _>>()?;
    let common = &child_shapes[0];
    for (index, found) in child_shapes.iter().enumerate().skip(1) {
        if found != common {
            return Err(arena.shape_error(
                ShapeErrorKind::ShapeMismatch {
                    index,
                    expected: common.clone(),
                    found: found.clone(),
                },
                id,
            ));
        }
    }

    Ok(common.with_outer(children.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(arena: &mut ValueArena, len: usize) -> ValueId {
        let items = (0..len).map(|_| arena.scalar(1.0)).collect();
        arena.tensor(items)
    }

    #[test]
    fn uninitialized_never_equal() {
        let u = Shape::uninitialized();
        assert_ne!(u, u.clone());
        assert_ne!(u, Shape::scalar());
        assert_eq!(Shape::default().rank(), None);
    }

    #[test]
    fn equality_is_rank_and_dims() {
        assert_eq!(Shape::new([2, 3]), Shape::new(vec![2, 3]));
        assert_ne!(Shape::new([2, 3]), Shape::new([3, 2]));
        assert_ne!(Shape::new([2]), Shape::new([2, 1]));
        assert_eq!(Shape::scalar(), Shape::new(Vec::new()));
    }

    #[test]
    fn display() {
        assert_eq!(Shape::new([2, 3]).to_string(), "(2, 3)");
        assert_eq!(Shape::scalar().to_string(), "()");
        assert_eq!(Shape::uninitialized().to_string(), "<uninitialized>");
    }

    #[test]
    fn scalar_shape_is_rank_zero_and_not_cached() {
        let mut arena = ValueArena::new();
        let s = arena.scalar(1.0);
        assert!(arena.shape(s).expect("shape").is_scalar());
        assert!(arena.cached_shape(s).is_none());
    }

    #[test]
    fn three_levels() {
        let mut arena = ValueArena::new();
        let mut rows = Vec::new();
        for _ in 0..2 {
            let row = (0..3).map(|_| vector(&mut arena, 4)).collect();
            rows.push(arena.tensor(row));
        }
        let t = arena.tensor(rows);
        assert_eq!(arena.shape(t).expect("shape"), Shape::new([2, 3, 4]));
    }

    #[test]
    fn children_are_memoized_during_parent_check() {
        let mut arena = ValueArena::new();
        let a = vector(&mut arena, 2);
        let b = vector(&mut arena, 2);
        let t = arena.tensor(vec![a, b]);
        assert!(arena.cached_shape(a).is_none());
        arena.shape(t).expect("shape");
        assert_eq!(arena.cached_shape(a), Some(&Shape::new([2])));
        assert_eq!(arena.cached_shape(t), Some(&Shape::new([2, 2])));
    }

    #[test]
    fn repeated_queries_reuse_the_memo() {
        let mut arena = ValueArena::new();
        let a = vector(&mut arena, 3);
        let t = arena.tensor(vec![a]);
        let first = arena.shape(t).expect("shape");
        let second = arena.shape(t).expect("memoized shape");
        assert_eq!(first, second);
        assert_eq!(arena.cached_shape(t), Some(&Shape::new([1, 3])));
    }

    #[test]
    fn failure_is_not_cached() {
        let mut arena = ValueArena::new();
        let a = vector(&mut arena, 2);
        let b = vector(&mut arena, 3);
        let t = arena.tensor(vec![a, b]);
        assert!(arena.shape(t).is_err());
        assert!(arena.cached_shape(t).is_none());
        assert!(arena.shape(t).is_err());
    }

    #[test]
    fn empty_child_among_scalars_is_rejected() {
        let mut arena = ValueArena::new();
        let s = arena.scalar(1.0);
        let empty = arena.tensor(Vec::new());
        let t = arena.tensor(vec![s, empty]);
        let err = arena.shape(t).unwrap_err();
        assert_eq!(err.kind, ShapeErrorKind::EmptyTensor);
        assert_eq!(err.value, empty);
    }

    #[test]
    fn unknown_id() {
        let arena = ValueArena::new();
        let mut other = ValueArena::new();
        let id = other.scalar(0.0);
        let err = arena.shape(id).unwrap_err();
        assert_eq!(err.kind, ShapeErrorKind::InvalidValue(id));
    }
}
