use crate::inspect::Inspect;
use crate::labels::LabelNames;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use valdiff_common::{DiffSettings, ValDiffError};

/// Band added to every tolerance to absorb float representation noise.
pub const DEFAULT_GUARD_BAND: f64 = 1e-7;

/// Caller-supplied equality for one type identity
pub type Equals = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Absolute-difference float equality
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericTolerance {
    pub epsilon: f64,
    pub guard_band: f64,
}

impl NumericTolerance {
    pub fn equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.epsilon + self.guard_band
    }
}

/// Immutable set of equality overrides consulted at every node.
///
/// Built once with [`PolicyBuilder`] and shared across calls and threads.
#[derive(Clone, Default)]
pub struct ComparatorPolicy {
    ignore_type_names: bool,
    custom: HashMap<String, Equals>,
    tolerance: Option<NumericTolerance>,
    labels: LabelNames,
}

impl ComparatorPolicy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::new()
    }

    pub fn ignore_type_names(&self) -> bool {
        self.ignore_type_names
    }

    pub fn custom_comparator(&self, ty: &str) -> Option<&Equals> {
        self.custom.get(ty)
    }

    pub fn tolerance(&self) -> Option<NumericTolerance> {
        self.tolerance
    }

    pub fn labels(&self) -> &LabelNames {
        &self.labels
    }
}

impl fmt::Debug for ComparatorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut custom: Vec<&String> = self.custom.keys().collect();
        custom.sort();
        f.debug_struct("ComparatorPolicy")
            .field("ignore_type_names", &self.ignore_type_names)
            .field("custom", &custom)
            .field("tolerance", &self.tolerance)
            .field("labels", &self.labels)
            .finish()
    }
}

pub struct PolicyBuilder {
    ignore_type_names: bool,
    custom: HashMap<String, Equals>,
    epsilon: Option<f64>,
    guard_band: f64,
    label_fields: Vec<String>,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self {
            ignore_type_names: false,
            custom: HashMap::new(),
            epsilon: None,
            guard_band: DEFAULT_GUARD_BAND,
            label_fields: Vec::new(),
        }
    }

    /// Seed a builder from the `[diff]` section of the configuration file.
    pub fn from_settings(settings: &DiffSettings) -> Self {
        let mut builder = Self::new()
            .ignore_type_names(settings.ignore_type_names)
            .guard_band(settings.guard_band)
            .label_fields(settings.label_fields.iter().cloned());
        if let Some(epsilon) = settings.numeric_epsilon {
            builder = builder.numeric_epsilon(epsilon);
        }
        builder
    }

    pub fn ignore_type_names(mut self, ignore: bool) -> Self {
        self.ignore_type_names = ignore;
        self
    }

    pub fn numeric_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    pub fn guard_band(mut self, band: f64) -> Self {
        self.guard_band = band;
        self
    }

    pub fn label_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_fields = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn custom_comparator<F>(mut self, ty: impl Into<String>, equals: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.custom.insert(ty.into(), Arc::new(equals));
        self
    }

    /// Register a comparator for the type identity `T` reports through [`Inspect`].
    pub fn custom_comparator_for<T, F>(self, equals: F) -> Self
    where
        T: Inspect + ?Sized,
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.custom_comparator(T::type_name(), equals)
    }

    pub fn build(self) -> Result<ComparatorPolicy, ValDiffError> {
        if !self.guard_band.is_finite() || self.guard_band < 0.0 {
            return Err(ValDiffError::Config(format!(
                "guard band must be a finite, non-negative number, got {}",
                self.guard_band
            )));
        }

        let tolerance = match self.epsilon {
            Some(epsilon) if !epsilon.is_finite() || epsilon < 0.0 => {
                return Err(ValDiffError::Config(format!(
                    "numeric epsilon must be a finite, non-negative number, got {}",
                    epsilon
                )));
            }
            Some(epsilon) => Some(NumericTolerance {
                epsilon,
                guard_band: self.guard_band,
            }),
            None => None,
        };

        if self.label_fields.iter().any(|name| name.is_empty()) {
            return Err(ValDiffError::Config(
                "label field names must not be empty".to_string(),
            ));
        }

        Ok(ComparatorPolicy {
            ignore_type_names: self.ignore_type_names,
            custom: self.custom,
            tolerance,
            labels: LabelNames::new(self.label_fields),
        })
    }
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
