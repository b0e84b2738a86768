use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker rendered for an absent value.
pub const NIL_MARKER: &str = "nil";

/// Marker rendered for a mapping entry that only one side has.
pub const MISSING_MARKER: &str = "(missing)";

/// Contextual annotation captured from a string field of an enclosing record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Why two values diverge at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Both sides present, values differ
    Value,
    /// Nominal type identities (or shapes) differ
    Type,
    /// Variable sequences of different length
    Length,
    /// Exactly one side is nil
    Nil,
    /// Mapping key only exists on the left
    LeftOnly,
    /// Mapping key only exists on the right
    RightOnly,
    /// Reference graphs have different shapes
    Cycle,
}

/// A single point of divergence between two values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDiff {
    /// Breadcrumb path, e.g. "items[2].name"; empty for the root
    pub path: String,
    pub kind: DiffKind,
    /// Labels visible at this path, one per configured label name
    pub labels: Vec<Label>,
    /// Rendering of the left value
    pub value_a: String,
    /// Rendering of the right value
    pub value_b: String,
}

impl StructuredDiff {
    /// Render as a single human-readable line.
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StructuredDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} != {}", self.value_a, self.value_b)
        } else {
            write!(f, "{}: {} != {}", self.path, self.value_a, self.value_b)
        }
    }
}

/// Result of a single comparison call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffReport<T> {
    pub diffs: Vec<T>,
}

impl<T> DiffReport<T> {
    pub fn new(diffs: Vec<T>) -> Self {
        Self { diffs }
    }

    /// True iff no divergence was reported.
    pub fn is_equal(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Split into the diff list and the equality flag.
    pub fn into_parts(self) -> (Vec<T>, bool) {
        let equal = self.diffs.is_empty();
        (self.diffs, equal)
    }
}

/// How object-like documents are mapped onto values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectMode {
    /// Objects become mappings keyed by string
    #[default]
    Map,
    /// Objects become records; enables label capture
    Record,
}

/// Output format of the command-line adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn default_guard_band() -> f64 {
    1e-7
}

/// Comparator policy settings as stored in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSettings {
    /// Compare only by structural shape, ignoring nominal type names
    #[serde(default)]
    pub ignore_type_names: bool,

    /// Absolute tolerance for numeric comparisons
    #[serde(default)]
    pub numeric_epsilon: Option<f64>,

    /// Fixed band added to the tolerance to absorb float noise
    #[serde(default = "default_guard_band")]
    pub guard_band: f64,

    /// Record field names captured as labels (e.g. "name", "id")
    #[serde(default)]
    pub label_fields: Vec<String>,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            ignore_type_names: false,
            numeric_epsilon: None,
            guard_band: default_guard_band(),
            label_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub object_mode: ObjectMode,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub diff: DiffSettings,

    #[serde(default)]
    pub output: OutputSettings,

    /// Enable portable mode (config alongside binary)
    #[serde(default, skip_serializing)]
    pub portable_mode: bool,
}
