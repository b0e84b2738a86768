//! The recursive comparison engine.
//!
//! Every node goes through the same ladder, first match wins:
//! absence, nominal type, cycle guard, timestamp normalization, custom comparator,
//! numeric tolerance, then the per-category structural rule.

use crate::format::{canonical_time, render, render_complex, render_float, render_identity};
use crate::guard::{CycleGuard, Side, Visit, VisitKey};
use crate::keys::partition_keys;
use crate::labels::LabelScope;
use crate::path::{Path, PathSegment};
use crate::policy::ComparatorPolicy;
use crate::sink::DiffSink;
use crate::value::{Field, Identity, Kind, Value};
use chrono::{DateTime, FixedOffset};
use tracing::trace;
use valdiff_common::{DiffKind, StructuredDiff, ValDiffError, MISSING_MARKER, NIL_MARKER};

/// Path and labels visible at the node being compared
#[derive(Debug, Clone)]
struct Scope {
    path: Path,
    labels: LabelScope,
}

impl Scope {
    fn descend(&self, segment: PathSegment) -> Self {
        Self {
            path: self.path.child(segment),
            labels: self.labels.clone(),
        }
    }
}

/// A value plus, when it was reached through a reference, that reference's identity.
#[derive(Clone, Copy)]
struct Node<'v> {
    value: &'v Value,
    addr: Option<Identity>,
}

impl<'v> Node<'v> {
    fn detached(value: &'v Value) -> Self {
        Self { value, addr: None }
    }

    fn addressed(value: &'v Value, id: Identity) -> Self {
        Self {
            value,
            addr: Some(id),
        }
    }
}

/// Single-use walker: owns the cycle guard of one comparison call.
pub(crate) struct Walker<'a> {
    policy: &'a ComparatorPolicy,
    guard: CycleGuard,
    sink: &'a mut dyn DiffSink,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(policy: &'a ComparatorPolicy, sink: &'a mut dyn DiffSink) -> Self {
        Self {
            policy,
            guard: CycleGuard::new(),
            sink,
        }
    }

    pub(crate) fn run(mut self, a: &Value, b: &Value) -> Result<(), ValDiffError> {
        let scope = Scope {
            path: Path::root(),
            labels: LabelScope::root(self.policy.labels()),
        };
        self.diff(&scope, Some(Node::detached(a)), Some(Node::detached(b)))?;
        trace!(visited = self.guard.len(), "walk complete");
        Ok(())
    }

    fn emit(
        &mut self,
        scope: &Scope,
        kind: DiffKind,
        value_a: String,
        value_b: String,
    ) -> Result<(), ValDiffError> {
        let diff = StructuredDiff {
            path: scope.path.to_string(),
            kind,
            labels: scope.labels.snapshot(self.policy.labels()),
            value_a,
            value_b,
        };
        trace!(path = %diff.path, kind = ?diff.kind, "diff");
        self.sink.emit(diff)
    }

    fn diff(
        &mut self,
        scope: &Scope,
        a: Option<Node<'_>>,
        b: Option<Node<'_>>,
    ) -> Result<(), ValDiffError> {
        let policy = self.policy;

        let (a, b) = match (a, b) {
            (None, None) => return Ok(()),
            (None, Some(b)) => {
                return self.emit(scope, DiffKind::Nil, NIL_MARKER.to_string(), render(b.value, true))
            }
            (Some(a), None) => {
                return self.emit(scope, DiffKind::Nil, render(a.value, true), NIL_MARKER.to_string())
            }
            (Some(a), Some(b)) => (a, b),
        };
        let (av, bv) = (a.value, b.value);

        if !policy.ignore_type_names() && av.ty() != bv.ty() {
            return self.emit(scope, DiffKind::Type, av.ty().to_string(), bv.ty().to_string());
        }

        if let (Some(aid), Some(bid)) = (a.addr, b.addr) {
            let visit = self
                .guard
                .visit(VisitKey::new(aid, av.ty()), VisitKey::new(bid, bv.ty()));
            match visit {
                Visit::First => {}
                Visit::Revisited => return Ok(()),
                Visit::Conflict(Side::Left) => {
                    return self.emit(
                        scope,
                        DiffKind::Cycle,
                        format!("{} (previously visited)", render(av, true)),
                        render(bv, true),
                    )
                }
                Visit::Conflict(Side::Right) => {
                    return self.emit(
                        scope,
                        DiffKind::Cycle,
                        render(av, true),
                        format!("{} (previously visited)", render(bv, true)),
                    )
                }
            }
        }

        if let (Kind::Time(x), Kind::Time(y)) = (av.kind(), bv.kind()) {
            return self.diff_time(scope, x, y);
        }

        if let Some(equals) = policy.custom_comparator(av.ty()) {
            if !(**equals)(av, bv) {
                return self.emit(scope, DiffKind::Value, render(av, false), render(bv, false));
            }
            return Ok(());
        }

        if let Some(tolerance) = policy.tolerance() {
            if let (Some(x), Some(y)) = (av.as_f64(), bv.as_f64()) {
                if !tolerance.equal(x, y) {
                    return self.emit(scope, DiffKind::Value, render(av, false), render(bv, false));
                }
                return Ok(());
            }
        }

        self.diff_category(scope, av, bv)
    }

    fn diff_category(&mut self, scope: &Scope, av: &Value, bv: &Value) -> Result<(), ValDiffError> {
        match (av.kind(), bv.kind()) {
            (Kind::Bool(x), Kind::Bool(y)) => {
                if x != y {
                    return self.emit(scope, DiffKind::Value, x.to_string(), y.to_string());
                }
                Ok(())
            }
            (Kind::Int(x), Kind::Int(y)) => {
                if x != y {
                    return self.emit(scope, DiffKind::Value, x.to_string(), y.to_string());
                }
                Ok(())
            }
            (Kind::Uint(x), Kind::Uint(y)) => {
                if x != y {
                    return self.emit(scope, DiffKind::Value, x.to_string(), y.to_string());
                }
                Ok(())
            }
            (Kind::Float(x), Kind::Float(y)) => {
                if x != y {
                    return self.emit(scope, DiffKind::Value, render_float(*x), render_float(*y));
                }
                Ok(())
            }
            (
                Kind::Int(_) | Kind::Uint(_) | Kind::Float(_),
                Kind::Int(_) | Kind::Uint(_) | Kind::Float(_),
            ) => {
                // Mixed numeric kinds under one type identity, e.g. document numbers.
                if !numbers_equal(av.kind(), bv.kind()) {
                    return self.emit(scope, DiffKind::Value, render(av, false), render(bv, false));
                }
                Ok(())
            }
            (Kind::Complex(xr, xi), Kind::Complex(yr, yi)) => {
                if xr != yr || xi != yi {
                    return self.emit(
                        scope,
                        DiffKind::Value,
                        render_complex(*xr, *xi),
                        render_complex(*yr, *yi),
                    );
                }
                Ok(())
            }
            (Kind::Str(x), Kind::Str(y)) => {
                if x != y {
                    return self.emit(scope, DiffKind::Value, format!("{:?}", x), format!("{:?}", y));
                }
                Ok(())
            }
            (Kind::Array(xs), Kind::Array(ys)) => {
                // Arrays of one type share a length; differing lengths need ignored type names.
                if xs.len() != ys.len() {
                    return self.length_mismatch(scope, av, xs.len(), bv, ys.len());
                }
                self.diff_elements(scope, xs, ys)
            }
            (Kind::Seq(xs), Kind::Seq(ys)) => {
                if xs.len() != ys.len() {
                    return self.length_mismatch(scope, av, xs.len(), bv, ys.len());
                }
                self.diff_elements(scope, xs, ys)
            }
            (Kind::Map(xs), Kind::Map(ys)) => self.diff_map(scope, xs, ys),
            (Kind::Record(xs), Kind::Record(ys)) => {
                if xs.len() != ys.len() {
                    return self.emit(scope, DiffKind::Type, av.ty().to_string(), bv.ty().to_string());
                }
                self.diff_record(scope, xs, ys)
            }
            (Kind::Ref(x), Kind::Ref(y)) => match (x, y) {
                (None, None) => Ok(()),
                (None, Some(_)) => {
                    self.emit(scope, DiffKind::Nil, NIL_MARKER.to_string(), render(bv, true))
                }
                (Some(_), None) => {
                    self.emit(scope, DiffKind::Nil, render(av, true), NIL_MARKER.to_string())
                }
                (Some(x), Some(y)) => {
                    let xt = x.borrow();
                    let yt = y.borrow();
                    self.diff(
                        scope,
                        Some(Node::addressed(&xt, x.id())),
                        Some(Node::addressed(&yt, y.id())),
                    )
                }
            },
            (Kind::Dyn(x), Kind::Dyn(y)) => self.diff(
                scope,
                x.as_deref().map(Node::detached),
                y.as_deref().map(Node::detached),
            ),
            (Kind::Opaque(x), Kind::Opaque(y)) => {
                if x.id != y.id {
                    return self.emit(
                        scope,
                        DiffKind::Value,
                        render_identity(x.id),
                        render_identity(y.id),
                    );
                }
                Ok(())
            }
            (Kind::Time(x), Kind::Time(y)) => self.diff_time(scope, x, y),
            // Categories differ; only reachable when type names are ignored.
            (
                Kind::Bool(_)
                | Kind::Int(_)
                | Kind::Uint(_)
                | Kind::Float(_)
                | Kind::Complex(..)
                | Kind::Str(_)
                | Kind::Array(_)
                | Kind::Seq(_)
                | Kind::Map(_)
                | Kind::Record(_)
                | Kind::Ref(_)
                | Kind::Dyn(_)
                | Kind::Opaque(_)
                | Kind::Time(_),
                _,
            ) => self.emit(scope, DiffKind::Type, av.ty().to_string(), bv.ty().to_string()),
        }
    }

    fn diff_time(
        &mut self,
        scope: &Scope,
        x: &DateTime<FixedOffset>,
        y: &DateTime<FixedOffset>,
    ) -> Result<(), ValDiffError> {
        let (x, y) = (canonical_time(x), canonical_time(y));
        if x != y {
            return self.emit(scope, DiffKind::Value, x, y);
        }
        Ok(())
    }

    fn length_mismatch(
        &mut self,
        scope: &Scope,
        av: &Value,
        a_len: usize,
        bv: &Value,
        b_len: usize,
    ) -> Result<(), ValDiffError> {
        self.emit(
            scope,
            DiffKind::Length,
            format!("{}[{}]", av.ty(), a_len),
            format!("{}[{}]", bv.ty(), b_len),
        )
    }

    fn diff_elements(&mut self, scope: &Scope, xs: &[Value], ys: &[Value]) -> Result<(), ValDiffError> {
        for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
            self.diff(
                &scope.descend(PathSegment::Index(i)),
                Some(Node::detached(x)),
                Some(Node::detached(y)),
            )?;
        }
        Ok(())
    }

    fn diff_map(
        &mut self,
        scope: &Scope,
        xs: &[(Value, Value)],
        ys: &[(Value, Value)],
    ) -> Result<(), ValDiffError> {
        let partition = partition_keys(xs, ys)?;

        for &i in &partition.only_a {
            let (key, value) = &xs[i];
            let child = scope.descend(PathSegment::Key(render(key, true)));
            self.emit(&child, DiffKind::LeftOnly, render(value, true), MISSING_MARKER.to_string())?;
        }
        for &(i, j) in &partition.both {
            let child = scope.descend(PathSegment::Key(render(&xs[i].0, true)));
            self.diff(&child, Some(Node::detached(&xs[i].1)), Some(Node::detached(&ys[j].1)))?;
        }
        for &j in &partition.only_b {
            let (key, value) = &ys[j];
            let child = scope.descend(PathSegment::Key(render(key, true)));
            self.emit(&child, DiffKind::RightOnly, MISSING_MARKER.to_string(), render(value, true))?;
        }
        Ok(())
    }

    fn diff_record(&mut self, scope: &Scope, xs: &[Field], ys: &[Field]) -> Result<(), ValDiffError> {
        let labels = scope.labels.enter_record(self.policy.labels(), xs);
        for (x, y) in xs.iter().zip(ys) {
            let child = Scope {
                path: scope.path.child(PathSegment::Field(x.name.clone())),
                labels: labels.clone(),
            };
            self.diff(&child, Some(Node::detached(&x.value)), Some(Node::detached(&y.value)))?;
        }
        Ok(())
    }
}

/// Exact value of an integer, or of a float with no fractional part.
fn exact_integer(kind: &Kind) -> Option<i128> {
    match *kind {
        Kind::Int(v) => Some(i128::from(v)),
        Kind::Uint(v) => Some(i128::from(v)),
        Kind::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(v as i128),
        _ => None,
    }
}

/// Numeric equality across integer, unsigned and float kinds without rounding through `f64`.
fn numbers_equal(a: &Kind, b: &Kind) -> bool {
    match (a, b) {
        (Kind::Float(x), Kind::Float(y)) => x == y,
        _ => match (exact_integer(a), exact_integer(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyBuilder;
    use crate::sink::StructuredSink;
    use crate::value::{Opaque, OpaqueKind, Ref};
    use chrono::TimeZone;
    use valdiff_common::Label;

    fn walk(policy: &ComparatorPolicy, a: &Value, b: &Value) -> Vec<StructuredDiff> {
        let mut sink = StructuredSink::new();
        Walker::new(policy, &mut sink).run(a, b).unwrap();
        sink.into_diffs()
    }

    fn walk_default(a: &Value, b: &Value) -> Vec<StructuredDiff> {
        walk(&ComparatorPolicy::default(), a, b)
    }

    fn lines(diffs: &[StructuredDiff]) -> Vec<String> {
        diffs.iter().map(StructuredDiff::to_line).collect()
    }

    fn point(x: i64, y: f64) -> Value {
        Value::record("Point", [("x", Value::int(x)), ("y", Value::float(y))])
    }

    #[test]
    fn test_equal_records() {
        assert!(walk_default(&point(1, 2.3), &point(1, 2.3)).is_empty());
    }

    #[test]
    fn test_scalar_field_mismatch() {
        let diffs = walk_default(&point(1, 2.3), &point(2, 2.3));
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "x");
        assert_eq!(diffs[0].kind, DiffKind::Value);
        assert_eq!(diffs[0].value_a, "1");
        assert_eq!(diffs[0].value_b, "2");
        assert!(diffs[0].labels.is_empty());
    }

    #[test]
    fn test_continues_past_first_difference() {
        let diffs = walk_default(&point(1, 2.3), &point(2, 2.4));
        assert_eq!(lines(&diffs), vec!["x: 1 != 2", "y: 2.3 != 2.4"]);
    }

    #[test]
    fn test_absence() {
        let some = Value::dynamic("any", Some(Value::int(3)));
        let none = Value::dynamic("any", None);
        assert_eq!(lines(&walk_default(&none, &some)), vec!["nil != 3"]);
        assert_eq!(lines(&walk_default(&some, &none)), vec!["3 != nil"]);
        assert!(walk_default(&none, &none).is_empty());
        assert_eq!(walk_default(&none, &some)[0].kind, DiffKind::Nil);
    }

    #[test]
    fn test_nominal_type_mismatch_stops_descent() {
        let a = Value::record("A", [("x", Value::int(1))]);
        let b = Value::record("B", [("x", Value::int(2))]);
        let diffs = walk_default(&a, &b);
        assert_eq!(lines(&diffs), vec!["A != B"]);
        assert_eq!(diffs[0].kind, DiffKind::Type);
    }

    #[test]
    fn test_ignored_type_names_compare_structurally() {
        let policy = PolicyBuilder::new().ignore_type_names(true).build().unwrap();
        let a = Value::record("A", [("x", Value::int(1))]);
        let b = Value::record("B", [("x", Value::int(1))]);
        assert!(walk(&policy, &a, &b).is_empty());

        let c = Value::record("B", [("x", Value::int(2))]);
        assert_eq!(lines(&walk(&policy, &a, &c)), vec!["x: 1 != 2"]);
    }

    #[test]
    fn test_ignored_type_names_with_different_shapes() {
        let policy = PolicyBuilder::new().ignore_type_names(true).build().unwrap();
        let diffs = walk(&policy, &Value::int(1), &Value::string("1"));
        assert_eq!(lines(&diffs), vec!["i64 != String"]);

        let a = Value::record("A", [("x", Value::int(1))]);
        let b = Value::record("B", [("x", Value::int(1)), ("y", Value::int(1))]);
        assert_eq!(walk(&policy, &a, &b)[0].kind, DiffKind::Type);

        // Integers and floats still compare by value.
        assert!(walk(&policy, &Value::int(2), &Value::float(2.0)).is_empty());
    }

    #[test]
    fn test_mixed_numbers_compare_exactly() {
        let number = |kind: Kind| Value::new("number", kind);

        let diffs = walk_default(
            &number(Kind::Int(9_007_199_254_740_993)),
            &number(Kind::Float(9_007_199_254_740_992.0)),
        );
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Value);

        assert_eq!(walk_default(&number(Kind::Int(-1)), &number(Kind::Uint(u64::MAX))).len(), 1);
        assert_eq!(walk_default(&number(Kind::Int(1)), &number(Kind::Float(1.5))).len(), 1);
        assert!(walk_default(&number(Kind::Int(5)), &number(Kind::Uint(5))).is_empty());
        assert!(walk_default(&number(Kind::Uint(2)), &number(Kind::Float(2.0))).is_empty());
    }

    #[test]
    fn test_sequence_length_mismatch_suppresses_elements() {
        let a = Value::seq("[]int", vec![Value::int(1), Value::int(2)]);
        let b = Value::seq("[]int", vec![Value::int(9), Value::int(2), Value::int(3)]);
        let diffs = walk_default(&a, &b);
        assert_eq!(lines(&diffs), vec!["[]int[2] != []int[3]"]);
        assert_eq!(diffs[0].kind, DiffKind::Length);
    }

    #[test]
    fn test_sequence_elements() {
        let a = Value::seq("[]int", vec![Value::int(1), Value::int(2), Value::int(3)]);
        let b = Value::seq("[]int", vec![Value::int(0), Value::int(2), Value::int(4)]);
        assert_eq!(lines(&walk_default(&a, &b)), vec!["[0]: 1 != 0", "[2]: 3 != 4"]);
    }

    #[test]
    fn test_array_elements() {
        let a = Value::array("[2]bool", vec![Value::bool(true), Value::bool(false)]);
        let b = Value::array("[2]bool", vec![Value::bool(true), Value::bool(true)]);
        assert_eq!(lines(&walk_default(&a, &b)), vec!["[1]: false != true"]);
    }

    #[test]
    fn test_string_mismatch_is_quoted() {
        let a = Value::record("T", [("s", Value::string("a b"))]);
        let b = Value::record("T", [("s", Value::string("a\"b"))]);
        assert_eq!(lines(&walk_default(&a, &b)), vec![r#"s: "a b" != "a\"b""#]);
    }

    #[test]
    fn test_map_partition() {
        let map = |entries: Vec<(&str, i64)>| {
            Value::map(
                "map[string]int",
                entries
                    .into_iter()
                    .map(|(k, v)| (Value::string(k), Value::int(v)))
                    .collect(),
            )
        };
        let a = map(vec![("a", 1), ("b", 2), ("d", 4)]);
        let b = map(vec![("a", 1), ("c", 3), ("d", 5)]);

        let diffs = walk_default(&a, &b);
        assert_eq!(
            lines(&diffs),
            vec![
                r#"["b"]: 2 != (missing)"#,
                r#"["d"]: 4 != 5"#,
                r#"["c"]: (missing) != 3"#,
            ]
        );
        assert_eq!(diffs[0].kind, DiffKind::LeftOnly);
        assert_eq!(diffs[2].kind, DiffKind::RightOnly);
    }

    #[test]
    fn test_unsupported_map_key_is_fatal() {
        let key = Value::seq("[]int", vec![Value::int(1)]);
        let a = Value::map("M", vec![(key.clone(), Value::int(1))]);
        let b = Value::map("M", vec![(key, Value::int(1))]);

        let mut sink = StructuredSink::new();
        let policy = ComparatorPolicy::default();
        let err = Walker::new(&policy, &mut sink).run(&a, &b).unwrap_err();
        assert!(matches!(err, ValDiffError::UnsupportedKey { .. }));
    }

    #[test]
    fn test_null_references() {
        let target = Ref::new(Value::int(5));
        let some = Value::reference("*int", Some(target));
        let none = Value::reference("*int", None);
        assert_eq!(lines(&walk_default(&none, &some)), vec!["nil != &5"]);
        assert_eq!(lines(&walk_default(&some, &none)), vec!["&5 != nil"]);
        assert!(walk_default(&none, &none).is_empty());
    }

    #[test]
    fn test_references_recurse_into_targets() {
        let a = Value::reference("*Point", Some(Ref::new(point(1, 1.0))));
        let b = Value::reference("*Point", Some(Ref::new(point(1, 1.5))));
        assert_eq!(lines(&walk_default(&a, &b)), vec!["y: 1 != 1.5"]);
    }

    fn ring(values: &[i64]) -> Value {
        let nodes: Vec<Ref> = values
            .iter()
            .map(|v| Ref::new(Value::int(*v)))
            .collect();
        for (i, node) in nodes.iter().enumerate() {
            let next = nodes[(i + 1) % nodes.len()].clone();
            node.set(Value::record(
                "Node",
                [
                    ("value", Value::int(values[i])),
                    ("next", Value::reference("*Node", Some(next))),
                ],
            ));
        }
        Value::reference("*Node", Some(nodes[0].clone()))
    }

    #[test]
    fn test_identical_cycles_terminate_equal() {
        assert!(walk_default(&ring(&[1]), &ring(&[1])).is_empty());
        assert!(walk_default(&ring(&[1, 2, 3]), &ring(&[1, 2, 3])).is_empty());
    }

    #[test]
    fn test_cycle_value_mismatch() {
        let diffs = walk_default(&ring(&[1, 2]), &ring(&[1, 5]));
        assert_eq!(lines(&diffs), vec!["next.value: 2 != 5"]);
    }

    #[test]
    fn test_divergent_cycle_shapes() {
        // a: 1 -> 1 -> ... ; b: 1 -> 1' -> 1 -> ...
        let diffs = walk_default(&ring(&[1]), &ring(&[1, 1]));
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Cycle);
        assert_eq!(diffs[0].path, "next");
        assert!(diffs[0].value_a.ends_with("(previously visited)"));
    }

    #[test]
    fn test_shared_target_is_compared_once() {
        let shared_a = Ref::new(Value::int(1));
        let shared_b = Ref::new(Value::int(2));
        let pair = |r: &Ref| {
            Value::record(
                "Pair",
                [
                    ("l", Value::reference("*int", Some(r.clone()))),
                    ("r", Value::reference("*int", Some(r.clone()))),
                ],
            )
        };
        let diffs = walk_default(&pair(&shared_a), &pair(&shared_b));
        assert_eq!(lines(&diffs), vec!["l: 1 != 2"]);
    }

    #[test]
    fn test_opaque_by_identity() {
        let f = Opaque::with_id(OpaqueKind::Func, 0x10);
        let g = Opaque::with_id(OpaqueKind::Func, 0x20);
        let a = Value::opaque("fn()", f);
        assert!(walk_default(&a, &Value::opaque("fn()", f)).is_empty());
        assert_eq!(
            lines(&walk_default(&a, &Value::opaque("fn()", g))),
            vec!["0x10 != 0x20"]
        );
    }

    #[test]
    fn test_complex_numbers() {
        let diffs = walk_default(&Value::complex(1.0, 2.0), &Value::complex(1.0, -2.0));
        assert_eq!(lines(&diffs), vec!["(1+2i) != (1-2i)"]);
    }

    #[test]
    fn test_time_compared_by_canonical_form() {
        let plus2 = FixedOffset::east_opt(2 * 3600).unwrap();
        let a = Value::time(plus2.with_ymd_and_hms(2022, 7, 1, 1, 31, 31).unwrap());
        let b = Value::time(plus2.with_ymd_and_hms(2022, 7, 2, 1, 31, 31).unwrap());
        let diffs = walk_default(&a, &b);
        assert_eq!(
            lines(&diffs),
            vec!["2022-07-01T01:31:31+02:00 != 2022-07-02T01:31:31+02:00"]
        );
        assert!(walk_default(&a, &a.clone()).is_empty());
    }

    #[test]
    fn test_time_takes_precedence_over_custom_comparator() {
        let policy = PolicyBuilder::new()
            .custom_comparator("DateTime", |_, _| true)
            .build()
            .unwrap();
        let a = Value::time(chrono::Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let b = Value::time(chrono::Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(walk(&policy, &a, &b).len(), 1);
    }

    #[test]
    fn test_custom_comparator_overrides_structure() {
        let policy = PolicyBuilder::new()
            .custom_comparator("Point", |a, b| {
                let x = |v: &Value| v.fields().map(|f| f[0].value.as_f64());
                x(a) == x(b)
            })
            .build()
            .unwrap();

        assert!(walk(&policy, &point(1, 2.0), &point(1, 9.0)).is_empty());
        let diffs = walk(&policy, &point(1, 2.0), &point(3, 2.0));
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].value_a, "Point {x: 1, y: 2}");
        assert_eq!(diffs[0].value_b, "Point {x: 3, y: 2}");
    }

    #[test]
    fn test_custom_comparator_precedes_tolerance() {
        let policy = PolicyBuilder::new()
            .numeric_epsilon(100.0)
            .custom_comparator("f64", |a, b| a.as_f64() == b.as_f64())
            .build()
            .unwrap();
        assert_eq!(walk(&policy, &Value::float(1.0), &Value::float(2.0)).len(), 1);
    }

    #[test]
    fn test_numeric_tolerance() {
        let policy = PolicyBuilder::new().numeric_epsilon(0.5).build().unwrap();
        assert!(walk(&policy, &point(1, 2.4), &point(1, 2.3)).is_empty());
        assert!(walk(&policy, &point(1, 2.0), &point(1, 2.5)).is_empty());

        let diffs = walk(&policy, &point(1, 2.0), &point(1, 2.6));
        assert_eq!(lines(&diffs), vec!["y: 2 != 2.6"]);

        // Integers convert too.
        assert!(walk(&policy, &Value::int(3), &Value::int(3)).is_empty());
        assert_eq!(walk(&policy, &Value::int(3), &Value::int(4)).len(), 1);
    }

    #[test]
    fn test_labels_scoped_to_record_subtree() {
        let policy = PolicyBuilder::new().label_fields(["name"]).build().unwrap();
        let item = |name: &str, qty: i64| {
            Value::record(
                "Item",
                [("name", Value::string(name)), ("qty", Value::int(qty))],
            )
        };
        let order = |first: Value, second: Value| {
            Value::record(
                "Order",
                [
                    ("first", first),
                    ("second", second),
                    ("total", Value::int(0)),
                ],
            )
        };
        let a = order(item("apple", 1), item("", 2));
        let b = order(item("apple", 5), item("", 7));

        let diffs = walk(&policy, &a, &b);
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].path, "first.qty");
        assert_eq!(diffs[0].labels, vec![Label::new("name", "apple")]);
        assert_eq!(diffs[1].path, "second.qty");
        assert_eq!(diffs[1].labels, vec![Label::new("name", "")]);
    }

    #[test]
    fn test_label_from_left_side_on_string_field() {
        let policy = PolicyBuilder::new().label_fields(["str"]).build().unwrap();
        let wrap = |s: &str| {
            Value::record(
                "Outer",
                [
                    ("n", Value::int(1)),
                    ("child", Value::record("Inner", [("str", Value::string(s))])),
                ],
            )
        };
        let diffs = walk(&policy, &wrap("strValue A"), &wrap("strValue B"));
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "child.str");
        assert_eq!(diffs[0].labels, vec![Label::new("str", "strValue A")]);
        assert_eq!(diffs[0].value_a, "\"strValue A\"");
        assert_eq!(diffs[0].value_b, "\"strValue B\"");
    }

    #[test]
    fn test_outer_label_visible_inside_nested_sequences() {
        let policy = PolicyBuilder::new().label_fields(["id"]).build().unwrap();
        let doc = |v: i64| {
            Value::record(
                "Doc",
                [
                    ("id", Value::string("doc-1")),
                    ("rows", Value::seq("[]int", vec![Value::int(0), Value::int(v)])),
                ],
            )
        };
        let diffs = walk(&policy, &doc(1), &doc(2));
        assert_eq!(diffs[0].path, "rows[1]");
        assert_eq!(diffs[0].labels, vec![Label::new("id", "doc-1")]);
    }
}
