//! DOCX zip container I/O.
//!
//! Entries are kept in archive order together with their compression,
//! timestamp and mode, so a rewrite changes nothing but the parts that were
//! explicitly replaced.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use docfill_core::{Error, Result};

/// Upper bound on the buffer reserved up front for one entry. The declared
/// size comes from the archive header and is not trusted beyond this.
const MAX_PREALLOC: u64 = 64 << 20;

fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}

/// Internal path of the main document body.
pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";

pub struct DocxPackage {
    pub entries: Vec<DocxEntry>,
}

pub struct DocxEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub last_modified: zip::DateTime,
    pub unix_mode: Option<u32>,
    pub is_dir: bool,
}

fn archive_err(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Archive(format!("{}: {}", context, e))
}

impl DocxPackage {
    pub fn read(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file).map_err(|e| match e {
            Error::Archive(msg) => Error::Archive(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut zip = ZipArchive::new(reader).map_err(|e| archive_err("open zip", e))?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip.by_index(i).map_err(|e| archive_err("zip entry", e))?;
            let mut data = Vec::with_capacity(initial_capacity(file.size()));
            file.read_to_end(&mut data)?;
            entries.push(DocxEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                last_modified: file.last_modified().unwrap_or_default(),
                unix_mode: file.unix_mode(),
                is_dir: file.is_dir(),
            });
        }
        debug!("Read DOCX package with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Read on the blocking pool.
    pub async fn read_async(path: PathBuf) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::read(&path))
            .await
            .map_err(|e| Error::Internal(format!("read task failed: {}", e)))?
    }

    pub fn entry(&self, name: &str) -> Option<&DocxEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// The main document XML as UTF-8 text.
    pub fn main_document_xml(&self) -> Result<String> {
        let entry = self.entry(MAIN_DOCUMENT_PART).ok_or_else(|| {
            Error::DocumentStructure(format!("missing {}", MAIN_DOCUMENT_PART))
        })?;
        String::from_utf8(entry.data.clone())
            .map_err(|e| Error::Xml(format!("{} is not UTF-8: {}", MAIN_DOCUMENT_PART, e)))
    }

    /// Serialize the package, substituting the data of the named entries.
    pub fn to_bytes(&self, replacements: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>> {
        let cursor = self.write_into(Cursor::new(Vec::new()), replacements)?;
        Ok(cursor.into_inner())
    }

    pub fn write(&self, output: &Path, replacements: &HashMap<String, Vec<u8>>) -> Result<()> {
        let file = std::fs::File::create(output)?;
        self.write_into(file, replacements)?;
        Ok(())
    }

    fn write_into<W: Write + Seek>(
        &self,
        writer: W,
        replacements: &HashMap<String, Vec<u8>>,
    ) -> Result<W> {
        let mut zout = ZipWriter::new(writer);
        for ent in &self.entries {
            let data = replacements.get(&ent.name).unwrap_or(&ent.data);
            let mut opts = SimpleFileOptions::default()
                .compression_method(ent.compression)
                .last_modified_time(ent.last_modified);
            if let Some(mode) = ent.unix_mode {
                opts = opts.unix_permissions(mode);
            }
            if ent.is_dir || ent.name.ends_with('/') {
                zout.add_directory(ent.name.as_str(), opts)
                    .map_err(|e| archive_err(&format!("add dir {}", ent.name), e))?;
            } else {
                zout.start_file(ent.name.as_str(), opts)
                    .map_err(|e| archive_err(&format!("start file {}", ent.name), e))?;
                zout.write_all(data)?;
            }
        }
        zout.finish().map_err(|e| archive_err("finish zip", e))
    }
}
