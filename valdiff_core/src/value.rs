use chrono::{DateTime, FixedOffset, Offset};
use std::cell::{Ref as CellRef, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

/// Stable identity token of a reference-bearing value.
///
/// Tokens come from a process-wide counter, so two distinct `Ref`s never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(pub u64);

impl fmt::LowerHex for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A value together with its nominal type identity
#[derive(Debug, Clone)]
pub struct Value {
    ty: String,
    kind: Kind,
}

/// The closed set of value categories
#[derive(Debug, Clone)]
pub enum Kind {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    /// Fixed-length sequence
    Array(Vec<Value>),
    /// Variable-length sequence
    Seq(Vec<Value>),
    /// Entries in iteration order
    Map(Vec<(Value, Value)>),
    /// Fields in declaration order
    Record(Vec<Field>),
    /// Pointer-like reference; `None` is a null reference
    Ref(Option<Ref>),
    /// Polymorphic held value; `None` is an empty holder
    Dyn(Option<Box<Value>>),
    /// Function, channel or raw pointer, compared by identity only
    Opaque(Opaque),
    Time(DateTime<FixedOffset>),
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Bool(_) => "bool",
            Kind::Int(_) => "int",
            Kind::Uint(_) => "uint",
            Kind::Float(_) => "float",
            Kind::Complex(..) => "complex",
            Kind::Str(_) => "string",
            Kind::Array(_) => "array",
            Kind::Seq(_) => "sequence",
            Kind::Map(_) => "map",
            Kind::Record(_) => "record",
            Kind::Ref(_) => "ref",
            Kind::Dyn(_) => "dyn",
            Kind::Opaque(_) => "opaque",
            Kind::Time(_) => "time",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Shared, identity-bearing reference to a value.
///
/// Cloning a `Ref` shares the target, which is how self-referential graphs are built:
///
/// ```
/// use valdiff_core::{Ref, Value};
///
/// let node = Ref::new(Value::int(0));
/// node.set(Value::record("Node", [("next", Value::reference("*Node", Some(node.clone())))]));
/// ```
#[derive(Clone)]
pub struct Ref {
    id: Identity,
    cell: Rc<RefCell<Value>>,
}

impl Ref {
    pub fn new(value: Value) -> Self {
        Self {
            id: Identity(next_identity()),
            cell: Rc::new(RefCell::new(value)),
        }
    }

    pub fn id(&self) -> Identity {
        self.id
    }

    /// Replace the target; used to close cycles after construction.
    pub fn set(&self, value: Value) {
        *self.cell.borrow_mut() = value;
    }

    pub fn borrow(&self) -> CellRef<'_, Value> {
        self.cell.borrow()
    }
}

// Targets may point back at this reference, so only the identity is printed.
impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({:#x})", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueKind {
    Func,
    Channel,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opaque {
    pub kind: OpaqueKind,
    pub id: Identity,
}

impl Opaque {
    /// A fresh opaque handle with its own identity.
    pub fn new(kind: OpaqueKind) -> Self {
        Self {
            kind,
            id: Identity(next_identity()),
        }
    }

    pub fn with_id(kind: OpaqueKind, id: u64) -> Self {
        Self {
            kind,
            id: Identity(id),
        }
    }
}

impl Value {
    pub fn new(ty: impl Into<String>, kind: Kind) -> Self {
        Self {
            ty: ty.into(),
            kind,
        }
    }

    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn into_kind(self) -> Kind {
        self.kind
    }

    /// Re-declare the value under another nominal type, e.g. `type Celsius float64`.
    pub fn with_type(mut self, ty: impl Into<String>) -> Self {
        self.ty = ty.into();
        self
    }

    pub fn bool(v: bool) -> Self {
        Self::new("bool", Kind::Bool(v))
    }

    pub fn int(v: i64) -> Self {
        Self::new("i64", Kind::Int(v))
    }

    pub fn uint(v: u64) -> Self {
        Self::new("u64", Kind::Uint(v))
    }

    pub fn float(v: f64) -> Self {
        Self::new("f64", Kind::Float(v))
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Self::new("complex128", Kind::Complex(re, im))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self::new("String", Kind::Str(v.into()))
    }

    pub fn array(ty: impl Into<String>, items: Vec<Value>) -> Self {
        Self::new(ty, Kind::Array(items))
    }

    pub fn seq(ty: impl Into<String>, items: Vec<Value>) -> Self {
        Self::new(ty, Kind::Seq(items))
    }

    pub fn map(ty: impl Into<String>, entries: Vec<(Value, Value)>) -> Self {
        Self::new(ty, Kind::Map(entries))
    }

    pub fn record<N, I>(ty: impl Into<String>, fields: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Value)>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, value)| Field::new(name, value))
            .collect();
        Self::new(ty, Kind::Record(fields))
    }

    pub fn reference(ty: impl Into<String>, target: Option<Ref>) -> Self {
        Self::new(ty, Kind::Ref(target))
    }

    pub fn dynamic(ty: impl Into<String>, held: Option<Value>) -> Self {
        Self::new(ty, Kind::Dyn(held.map(Box::new)))
    }

    pub fn opaque(ty: impl Into<String>, handle: Opaque) -> Self {
        Self::new(ty, Kind::Opaque(handle))
    }

    pub fn time<Tz: chrono::TimeZone>(t: DateTime<Tz>) -> Self {
        let offset = t.offset().fix();
        Self::new("DateTime", Kind::Time(t.with_timezone(&offset)))
    }

    /// Numeric view used by the tolerance comparator; `None` for non-numeric kinds.
    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            Kind::Int(v) => Some(v as f64),
            Kind::Uint(v) => Some(v as f64),
            Kind::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            Kind::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Look through non-empty held values to the innermost concrete value.
    pub fn unwrap_held(&self) -> &Value {
        let mut value = self;
        while let Kind::Dyn(Some(held)) = &value.kind {
            value = held;
        }
        value
    }

    pub fn fields(&self) -> Option<&[Field]> {
        match &self.kind {
            Kind::Record(fields) => Some(fields),
            _ => None,
        }
    }
}
