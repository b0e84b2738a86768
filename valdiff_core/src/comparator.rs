use crate::inspect::Inspect;
use crate::policy::ComparatorPolicy;
use crate::sink::{DiffSink, StructuredSink, TextSink, TracingSink, WriterSink};
use crate::value::Value;
use crate::walker::Walker;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;
use valdiff_common::{DiffReport, StructuredDiff, ValDiffError};

/// Entry point for comparisons under one shared policy.
///
/// Cheap to clone; every call gets its own cycle guard and label scope, so one comparator can
/// serve many calls (and threads, since the policy is `Send + Sync`).
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    policy: Arc<ComparatorPolicy>,
}

impl Comparator {
    pub fn new(policy: ComparatorPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn from_shared(policy: Arc<ComparatorPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ComparatorPolicy {
        &self.policy
    }

    /// Walk `a` and `b`, streaming each divergence into `sink`.
    pub fn diff_into<S: DiffSink>(&self, sink: &mut S, a: &Value, b: &Value) -> Result<(), ValDiffError> {
        debug!("Comparing {} against {}", a.ty(), b.ty());
        let before = sink.count();
        Walker::new(&self.policy, &mut *sink).run(a, b)?;
        debug!("Comparison finished with {} differences", sink.count() - before);
        Ok(())
    }

    pub fn diff_text(&self, a: &Value, b: &Value) -> Result<DiffReport<String>, ValDiffError> {
        let mut sink = TextSink::new();
        self.diff_into(&mut sink, a, b)?;
        Ok(DiffReport::new(sink.into_lines()))
    }

    pub fn diff_structured(
        &self,
        a: &Value,
        b: &Value,
    ) -> Result<DiffReport<StructuredDiff>, ValDiffError> {
        let mut sink = StructuredSink::new();
        self.diff_into(&mut sink, a, b)?;
        Ok(DiffReport::new(sink.into_diffs()))
    }

    pub fn diff_text_of<T: Inspect + ?Sized>(
        &self,
        a: &T,
        b: &T,
    ) -> Result<DiffReport<String>, ValDiffError> {
        self.diff_text(&a.to_value(), &b.to_value())
    }

    pub fn diff_structured_of<T: Inspect + ?Sized>(
        &self,
        a: &T,
        b: &T,
    ) -> Result<DiffReport<StructuredDiff>, ValDiffError> {
        self.diff_structured(&a.to_value(), &b.to_value())
    }
}

/// Compare two inspectable values under the default policy.
pub fn diff<T: Inspect + ?Sized>(a: &T, b: &T) -> Result<DiffReport<String>, ValDiffError> {
    Comparator::default().diff_text_of(a, b)
}

/// Write one line per difference to `writer`; returns how many were written.
pub fn fdiff<T: Inspect + ?Sized, W: Write>(
    writer: W,
    a: &T,
    b: &T,
) -> Result<usize, ValDiffError> {
    let mut sink = WriterSink::new(writer);
    Comparator::default().diff_into(&mut sink, &a.to_value(), &b.to_value())?;
    Ok(sink.count())
}

/// Report each difference as a tracing event; returns how many were reported.
pub fn log_diff<T: Inspect + ?Sized>(a: &T, b: &T) -> Result<usize, ValDiffError> {
    let mut sink = TracingSink::new();
    Comparator::default().diff_into(&mut sink, &a.to_value(), &b.to_value())?;
    Ok(sink.count())
}
