use crate::snapshot::Snapshot;
use std::io::Write;
use std::path::Path;
use tally_core::Result;

pub struct JsonExporter;

impl JsonExporter {
    pub async fn export(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<()> {
        let json = Self::to_string(snapshot)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn to_string(snapshot: &Snapshot) -> Result<String> {
        Ok(serde_json::to_string_pretty(snapshot)?)
    }

    /// Renders the whole document before touching `sink`, so a render
    /// failure never leaves a partial response behind.
    pub fn write<W: Write>(snapshot: &Snapshot, mut sink: W) -> Result<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        sink.write_all(&body)?;
        sink.flush()?;
        Ok(())
    }
}
