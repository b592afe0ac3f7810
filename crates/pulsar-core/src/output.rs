//! Output sink and tee (spec §4.11): every write a module makes through its
//! sink is copied both to the process-wide `tracing` output and to its
//! owning tree node's `output` transcript, which survives the module's own
//! destruction (spec §4.11: "safe to use after the module instance has
//! been destroyed only via the tree node, which outlives the instance").

use std::io;
use std::sync::Arc;

use pulsar_tree::ModuleTree;

/// A `std::io::Write` adapter tying one module instance's output to its
/// tree node. Line-buffered is acceptable per spec §4.6; Pulsar tees every
/// `write` call as-is rather than batching by newline, which is a strict
/// superset of "line-buffered is acceptable".
pub struct TeeWriter {
    tree: Arc<ModuleTree>,
    id: u64,
}

impl TeeWriter {
    pub(crate) fn new(tree: Arc<ModuleTree>, id: u64) -> Self {
        TeeWriter { tree, id }
    }

    /// Convenience for modules that just want to log a line rather than
    /// drive the `Write` impl directly.
    pub fn write_line(&self, line: &str) {
        tracing::info!(target: "pulsar::module_output", node = self.id, "{line}");
        self.tree.append_output(self.id, line);
        self.tree.append_output(self.id, "\n");
    }
}

impl io::Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = String::from_utf8_lossy(buf);
        tracing::info!(target: "pulsar::module_output", node = self.id, "{}", chunk.trim_end_matches('\n'));
        self.tree.append_output(self.id, &chunk);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Nothing is buffered beyond what `ModuleTreeNode::append_output`
        // already committed synchronously; flush is a no-op (spec §4.11:
        // "flush-on-handle-drop is required" — satisfied trivially since
        // every write already lands in the tree node immediately).
        Ok(())
    }
}
