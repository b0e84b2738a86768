use std::io::Write;
use tracing::info;
use valdiff_common::{StructuredDiff, ValDiffError};

/// Append-only destination for diff records.
pub trait DiffSink {
    fn emit(&mut self, diff: StructuredDiff) -> Result<(), ValDiffError>;

    /// Number of records accepted so far.
    fn count(&self) -> usize;
}

/// Collects `"{path}: {a} != {b}"` lines
#[derive(Debug, Default)]
pub struct TextSink {
    lines: Vec<String>,
}

impl TextSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl DiffSink for TextSink {
    fn emit(&mut self, diff: StructuredDiff) -> Result<(), ValDiffError> {
        self.lines.push(diff.to_line());
        Ok(())
    }

    fn count(&self) -> usize {
        self.lines.len()
    }
}

#[derive(Debug, Default)]
pub struct StructuredSink {
    diffs: Vec<StructuredDiff>,
}

impl StructuredSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diffs(&self) -> &[StructuredDiff] {
        &self.diffs
    }

    pub fn into_diffs(self) -> Vec<StructuredDiff> {
        self.diffs
    }
}

impl DiffSink for StructuredSink {
    fn emit(&mut self, diff: StructuredDiff) -> Result<(), ValDiffError> {
        self.diffs.push(diff);
        Ok(())
    }

    fn count(&self) -> usize {
        self.diffs.len()
    }
}

/// Streams one line per diff to a writer
pub struct WriterSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiffSink for WriterSink<W> {
    fn emit(&mut self, diff: StructuredDiff) -> Result<(), ValDiffError> {
        writeln!(self.writer, "{}", diff)?;
        self.written += 1;
        Ok(())
    }

    fn count(&self) -> usize {
        self.written
    }
}

/// Reports each diff as a tracing event
#[derive(Debug, Default)]
pub struct TracingSink {
    emitted: usize,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiffSink for TracingSink {
    fn emit(&mut self, diff: StructuredDiff) -> Result<(), ValDiffError> {
        info!(
            path = %diff.path,
            kind = ?diff.kind,
            a = %diff.value_a,
            b = %diff.value_b,
            "value mismatch"
        );
        self.emitted += 1;
        Ok(())
    }

    fn count(&self) -> usize {
        self.emitted
    }
}
