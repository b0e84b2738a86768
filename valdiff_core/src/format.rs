//! Deterministic single-value rendering used in diff records.

use crate::value::{Identity, Kind, Value};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::collections::HashSet;
use std::fmt::Write;

/// Render a value for display. Strings are quoted when `quote` is set; nested strings are
/// always quoted.
pub fn render(value: &Value, quote: bool) -> String {
    let mut out = String::new();
    let mut stack = HashSet::new();
    write_value(&mut out, value, quote, &mut stack);
    out
}

/// Canonical form used when comparing timestamps.
pub fn canonical_time(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn render_float(v: f64) -> String {
    v.to_string()
}

pub fn render_complex(re: f64, im: f64) -> String {
    format!("({}{:+}i)", re, im)
}

pub fn render_identity(id: Identity) -> String {
    format!("{:#x}", id)
}

fn write_value(out: &mut String, value: &Value, quote: bool, stack: &mut HashSet<Identity>) {
    match value.kind() {
        Kind::Bool(v) => {
            let _ = write!(out, "{}", v);
        }
        Kind::Int(v) => {
            let _ = write!(out, "{}", v);
        }
        Kind::Uint(v) => {
            let _ = write!(out, "{}", v);
        }
        Kind::Float(v) => out.push_str(&render_float(*v)),
        Kind::Complex(re, im) => out.push_str(&render_complex(*re, *im)),
        Kind::Str(s) => {
            if quote {
                let _ = write!(out, "{:?}", s);
            } else {
                out.push_str(s);
            }
        }
        Kind::Array(items) | Kind::Seq(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, true, stack);
            }
            out.push(']');
        }
        Kind::Map(entries) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, k, true, stack);
                out.push_str(": ");
                write_value(out, v, true, stack);
            }
            out.push('}');
        }
        Kind::Record(fields) => {
            out.push_str(value.ty());
            out.push_str(" {");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&field.name);
                out.push_str(": ");
                write_value(out, &field.value, true, stack);
            }
            out.push('}');
        }
        Kind::Ref(None) | Kind::Dyn(None) => out.push_str(valdiff_common::NIL_MARKER),
        Kind::Ref(Some(target)) => {
            if !stack.insert(target.id()) {
                let _ = write!(out, "&<cycle {}>", render_identity(target.id()));
                return;
            }
            out.push('&');
            write_value(out, &target.borrow(), true, stack);
            stack.remove(&target.id());
        }
        Kind::Dyn(Some(held)) => write_value(out, held, quote, stack),
        Kind::Opaque(handle) => out.push_str(&render_identity(handle.id)),
        Kind::Time(t) => out.push_str(&canonical_time(t)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Opaque, OpaqueKind, Ref};
    use chrono::TimeZone;

    #[test]
    fn test_scalars() {
        assert_eq!(render(&Value::int(-4), true), "-4");
        assert_eq!(render(&Value::uint(4), true), "4");
        assert_eq!(render(&Value::float(2.3), true), "2.3");
        assert_eq!(render(&Value::float(1.0), true), "1");
        assert_eq!(render(&Value::bool(false), true), "false");
        assert_eq!(render(&Value::complex(1.0, -2.5), true), "(1-2.5i)");
    }

    #[test]
    fn test_string_quoting() {
        let v = Value::string("say \"hi\"");
        assert_eq!(render(&v, true), r#""say \"hi\"""#);
        assert_eq!(render(&v, false), r#"say "hi""#);
    }

    #[test]
    fn test_composites() {
        let seq = Value::seq("Vec<String>", vec![Value::string("a"), Value::string("b")]);
        assert_eq!(render(&seq, false), r#"["a", "b"]"#);

        let map = Value::map("Map", vec![(Value::string("k"), Value::int(1))]);
        assert_eq!(render(&map, true), r#"{"k": 1}"#);

        let rec = Value::record("Point", [("x", Value::int(1)), ("y", Value::int(2))]);
        assert_eq!(render(&rec, true), "Point {x: 1, y: 2}");
    }

    #[test]
    fn test_nil_and_held_values() {
        assert_eq!(render(&Value::reference("*T", None), true), "nil");
        assert_eq!(render(&Value::dynamic("any", None), true), "nil");
        assert_eq!(
            render(&Value::dynamic("any", Some(Value::string("x"))), true),
            r#""x""#
        );
    }

    #[test]
    fn test_cycle_renders_finitely() {
        let node = Ref::new(Value::int(0));
        node.set(Value::record(
            "Node",
            [("next", Value::reference("*Node", Some(node.clone())))],
        ));
        let root = Value::reference("*Node", Some(node.clone()));

        let text = render(&root, true);
        assert_eq!(
            text,
            format!("&Node {{next: &<cycle {}>}}", render_identity(node.id()))
        );
    }

    #[test]
    fn test_opaque_is_hex() {
        let f = Value::opaque("fn()", Opaque::with_id(OpaqueKind::Func, 255));
        assert_eq!(render(&f, true), "0xff");
    }

    #[test]
    fn test_canonical_time() {
        let t = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2022, 7, 1, 1, 31, 31)
            .unwrap();
        assert_eq!(canonical_time(&t), "2022-07-01T01:31:31+02:00");
    }
}
