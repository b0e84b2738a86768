//! Semantic equality of mapping keys and key-set partitioning.

use crate::format::canonical_time;
use crate::value::{Kind, OpaqueKind, Value};
use valdiff_common::ValDiffError;

/// Deep structural equality of two mapping keys. `None` is an empty held value.
pub fn key_equal(a: Option<&Value>, b: Option<&Value>) -> Result<bool, ValDiffError> {
    let (a, b) = match (a, b) {
        (None, None) => return Ok(true),
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(false),
    };
    if a.ty() != b.ty() {
        return Ok(false);
    }

    let equal = match (a.kind(), b.kind()) {
        (Kind::Bool(x), Kind::Bool(y)) => x == y,
        (Kind::Int(x), Kind::Int(y)) => x == y,
        (Kind::Uint(x), Kind::Uint(y)) => x == y,
        (Kind::Float(x), Kind::Float(y)) => x == y,
        (Kind::Complex(xr, xi), Kind::Complex(yr, yi)) => xr == yr && xi == yi,
        (Kind::Str(x), Kind::Str(y)) => x == y,
        (Kind::Array(xs), Kind::Array(ys)) => {
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (x, y) in xs.iter().zip(ys) {
                if !key_equal(Some(x), Some(y))? {
                    return Ok(false);
                }
            }
            true
        }
        (Kind::Record(xs), Kind::Record(ys)) => {
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (x, y) in xs.iter().zip(ys) {
                if !key_equal(Some(&x.value), Some(&y.value))? {
                    return Ok(false);
                }
            }
            true
        }
        (Kind::Ref(x), Kind::Ref(y)) => match (x, y) {
            (Some(x), Some(y)) => x.id() == y.id(),
            (None, None) => true,
            _ => false,
        },
        (Kind::Dyn(x), Kind::Dyn(y)) => key_equal(x.as_deref(), y.as_deref())?,
        (Kind::Opaque(x), Kind::Opaque(y))
            if x.kind != OpaqueKind::Func && y.kind != OpaqueKind::Func =>
        {
            x.id == y.id
        }
        (Kind::Time(x), Kind::Time(y)) => canonical_time(x) == canonical_time(y),
        (Kind::Seq(_), _) | (Kind::Map(_), _) | (Kind::Opaque(_), _) => {
            return Err(ValDiffError::UnsupportedKey {
                ty: a.ty().to_string(),
            })
        }
        // Same type identity but different categories: never equal.
        _ => false,
    };
    Ok(equal)
}

/// Indices of the keys of `a` and `b` split into (only in a, in both, only in b).
///
/// Common pairs are `(index in a, index in b)`, ordered by `a`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct KeyPartition {
    pub only_a: Vec<usize>,
    pub both: Vec<(usize, usize)>,
    pub only_b: Vec<usize>,
}

pub fn partition_keys(
    a: &[(Value, Value)],
    b: &[(Value, Value)],
) -> Result<KeyPartition, ValDiffError> {
    let mut partition = KeyPartition::default();
    let mut matched_b = vec![false; b.len()];

    for (i, (ak, _)) in a.iter().enumerate() {
        let mut found = None;
        for (j, (bk, _)) in b.iter().enumerate() {
            if key_equal(Some(ak), Some(bk))? {
                found = Some(j);
                break;
            }
        }
        match found {
            Some(j) => {
                matched_b[j] = true;
                partition.both.push((i, j));
            }
            None => partition.only_a.push(i),
        }
    }

    for (j, (bk, _)) in b.iter().enumerate() {
        if matched_b[j] {
            continue;
        }
        // Duplicate-equal keys in b still count as shared when any key in a matches.
        let mut shared = false;
        for (ak, _) in a {
            if key_equal(Some(ak), Some(bk))? {
                shared = true;
                break;
            }
        }
        if !shared {
            partition.only_b.push(j);
        }
    }

    Ok(partition)
}
