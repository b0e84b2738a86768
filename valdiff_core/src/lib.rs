pub mod comparator;
#[cfg(feature = "documents")]
pub mod document;
pub mod format;
pub mod guard;
pub mod inspect;
pub mod keys;
pub mod labels;
pub mod path;
pub mod policy;
pub mod sink;
pub mod value;
mod walker;

pub use comparator::{diff, fdiff, log_diff, Comparator};
#[cfg(feature = "documents")]
pub use document::{is_json_file, is_toml_file, is_yaml_file, load_document, DocumentFormat};
pub use format::render;
pub use guard::{CycleGuard, Side, Visit, VisitKey};
pub use inspect::Inspect;
pub use labels::{LabelNames, LabelScope};
pub use path::{Path, PathSegment};
pub use policy::{ComparatorPolicy, NumericTolerance, PolicyBuilder, DEFAULT_GUARD_BAND};
pub use sink::{DiffSink, StructuredSink, TextSink, TracingSink, WriterSink};
pub use value::{Field, Identity, Kind, Opaque, OpaqueKind, Ref, Value};

pub use valdiff_common::{DiffKind, DiffReport, Label, StructuredDiff, ValDiffError};
