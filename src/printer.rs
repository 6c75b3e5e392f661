//! Printer hand-off.
//!
//! The output subsystem is an external collaborator. After resolution it is
//! told which vertices it will receive values from.

use crate::resolver::VertexId;

/// Sink for the list of vertices whose results get printed.
#[cfg_attr(test, mockall::automock)]
pub trait PrinterSink {
    /// Called once per successful resolution with every activated vertex
    /// that requires printing, in execution order.
    fn initialise(&mut self, vertices: &[VertexId]);
}

/// Printer that only remembers what it was handed. Used by the binary, which
/// has no output subsystem of its own.
#[derive(Debug, Default)]
pub struct RecordingPrinter {
    pub vertices: Vec<VertexId>,
}

impl PrinterSink for RecordingPrinter {
    fn initialise(&mut self, vertices: &[VertexId]) {
        self.vertices = vertices.to_vec();
    }
}
