//! JSON-Lines export of the conversion graph.
//!
//! One self-describing JSON object per line: a `node` record when a value
//! node is created, a `slots` record when slots are appended to it, and an
//! `entry` record for every bridge entry. Write errors do not interrupt the
//! conversion; the first one is kept and returned by [`GraphExporter::finish`].

use crate::bridge::BridgeEntry;
use crate::node::{IndexRange, NodeId, ValueKind};
use mpflat_core::{FlatError, Result};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum GraphRecord<'a> {
    Node {
        id: NodeId,
        name: &'a str,
        kind: ValueKind,
    },
    Slots {
        node: NodeId,
        name: &'a str,
        range: IndexRange,
    },
    Entry {
        bridge: &'a str,
        index: usize,
        #[serde(flatten)]
        entry: BridgeEntry,
    },
}

/// Sequential writer of graph records.
pub struct GraphExporter {
    out: Box<dyn Write>,
    records: usize,
    error: Option<io::Error>,
}

impl fmt::Debug for GraphExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphExporter")
            .field("records", &self.records)
            .field("failed", &self.error.is_some())
            .finish()
    }
}

impl GraphExporter {
    /// Create or truncate the export file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    /// Export into any writer.
    pub fn from_writer(out: impl Write + 'static) -> Self {
        Self {
            out: Box::new(out),
            records: 0,
            error: None,
        }
    }

    /// Number of records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    pub(crate) fn node(&mut self, id: NodeId, name: &str, kind: ValueKind) {
        self.write(&GraphRecord::Node { id, name, kind });
    }

    pub(crate) fn slots(&mut self, node: NodeId, name: &str, range: IndexRange) {
        self.write(&GraphRecord::Slots { node, name, range });
    }

    pub(crate) fn entry(&mut self, bridge: &str, index: usize, entry: BridgeEntry) {
        self.write(&GraphRecord::Entry {
            bridge,
            index,
            entry,
        });
    }

    fn write(&mut self, record: &GraphRecord<'_>) {
        if self.error.is_some() {
            return;
        }
        let res = serde_json::to_writer(&mut self.out, record)
            .map_err(io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"));
        match res {
            Ok(()) => self.records += 1,
            Err(e) => {
                tracing::warn!("graph export stopped: {e}");
                self.error = Some(e);
            }
        }
    }

    /// Flush the stream and report the first write error, if any.
    pub fn finish(mut self) -> Result<usize> {
        if let Some(e) = self.error.take() {
            return Err(FlatError::GraphExport(e.to_string()));
        }
        self.out.flush()?;
        Ok(self.records)
    }
}
