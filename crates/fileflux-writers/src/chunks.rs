//! Chunk serialization in the three supported output formats.

use fileflux_core::{Chunk, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Output format for chunk artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One markdown file per chunk.
    #[default]
    Md,
    /// Single JSON array file.
    Json,
    /// Single JSON-lines file, one chunk per line.
    Jsonl,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Md),
            "json" => Ok(Self::Json),
            "jsonl" => Ok(Self::Jsonl),
            _ => Err(format!("unknown output format '{s}'; expected md, json or jsonl")),
        }
    }
}

/// Writes chunk artifacts into a `chunks/` directory.
#[derive(Debug, Clone, Copy)]
pub struct ChunkWriter {
    format: OutputFormat,
}

impl ChunkWriter {
    /// Create a writer for the given format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write all chunks under `<base>/chunks/` and return the paths
    /// written.
    ///
    /// # Errors
    /// Returns I/O errors from directory creation or file writes.
    pub fn write(&self, base: &Path, chunks: &[Chunk]) -> Result<Vec<PathBuf>> {
        let dir = base.join("chunks");
        fs::create_dir_all(&dir)?;
        let written = match self.format {
            OutputFormat::Md => self.write_markdown(&dir, chunks)?,
            OutputFormat::Json => self.write_json(&dir, chunks)?,
            OutputFormat::Jsonl => self.write_jsonl(&dir, chunks)?,
        };
        tracing::debug!(count = chunks.len(), format = ?self.format, "wrote chunk artifacts");
        Ok(written)
    }

    fn write_markdown(&self, dir: &Path, chunks: &[Chunk]) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let path = dir.join(format!("{:03}.md", chunk.index));
            let mut body = String::new();
            if let Some(summary) = chunk.prop_str(fileflux_core::chunk::props::ENRICHED_SUMMARY) {
                body.push_str("> ");
                body.push_str(summary);
                body.push_str("\n\n");
            }
            body.push_str(&chunk.content);
            body.push('\n');
            fs::write(&path, body)?;
            paths.push(path);
        }
        Ok(paths)
    }

    fn write_json(&self, dir: &Path, chunks: &[Chunk]) -> Result<Vec<PathBuf>> {
        let path = dir.join("chunks.json");
        let json = serde_json::to_string_pretty(chunks)?;
        fs::write(&path, json)?;
        Ok(vec![path])
    }

    fn write_jsonl(&self, dir: &Path, chunks: &[Chunk]) -> Result<Vec<PathBuf>> {
        let path = dir.join("chunks.jsonl");
        let mut file = fs::File::create(&path)?;
        for chunk in chunks {
            serde_json::to_writer(&mut file, chunk)?;
            file.write_all(b"\n")?;
        }
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_chunks() -> Vec<Chunk> {
        vec![Chunk::new("a", 0, "first"), Chunk::new("b", 1, "second")]
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("md").unwrap(), OutputFormat::Md);
        assert_eq!(OutputFormat::from_str("JSONL").unwrap(), OutputFormat::Jsonl);
        assert!(OutputFormat::from_str("xml").is_err());
    }

    #[test]
    fn test_write_markdown_one_file_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ChunkWriter::new(OutputFormat::Md)
            .write(dir.path(), &sample_chunks())
            .unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("chunks/000.md"));
        let body = std::fs::read_to_string(&paths[1]).unwrap();
        assert!(body.contains("second"));
    }

    #[test]
    fn test_write_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ChunkWriter::new(OutputFormat::Json)
            .write(dir.path(), &sample_chunks())
            .unwrap();
        let body = std::fs::read_to_string(&paths[0]).unwrap();
        let parsed: Vec<Chunk> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].index, 1);
    }

    #[test]
    fn test_write_jsonl_one_line_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ChunkWriter::new(OutputFormat::Jsonl)
            .write(dir.path(), &sample_chunks())
            .unwrap();
        let body = std::fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(body.lines().count(), 2);
        let first: Chunk = serde_json::from_str(body.lines().next().unwrap()).unwrap();
        assert_eq!(first.content, "first");
    }
}
