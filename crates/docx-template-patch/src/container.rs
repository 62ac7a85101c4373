//! Zip container access for DOCX files.
//!
//! A `.docx` file is a zip archive; the document body lives in the
//! `word/document.xml` member. This module reads that member into a string,
//! holds edits in memory, and writes the whole archive back atomically.

use std::fs::File;
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{PatchError, Result};

/// Archive member that holds the document body markup.
pub const BODY_MEMBER: &str = "word/document.xml";

/// An opened DOCX container with its body text held in memory.
///
/// The body is read once at `open`; mutations go through [`set_body`] and
/// nothing touches the filesystem again until [`save`].
///
/// [`set_body`]: DocxContainer::set_body
/// [`save`]: DocxContainer::save
#[derive(Debug)]
pub struct DocxContainer {
    path: PathBuf,
    body: String,
    revision: u32,
}

impl DocxContainer {
    /// Open a DOCX file and decode its body member.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| PatchError::ContainerRead(format!("cannot open {:?}: {}", path, e)))?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| PatchError::ContainerRead(format!("{:?} is not a valid zip: {}", path, e)))?;

        let mut body = String::new();
        {
            let mut member = archive.by_name(BODY_MEMBER).map_err(|e| {
                PatchError::ContainerRead(format!("{:?} has no {}: {}", path, BODY_MEMBER, e))
            })?;
            member.read_to_string(&mut body).map_err(|e| {
                PatchError::ContainerRead(format!("{} is not valid UTF-8: {}", BODY_MEMBER, e))
            })?;
        }

        debug!("loaded {} ({} chars) from {:?}", BODY_MEMBER, body.len(), path);
        Ok(Self {
            path: path.to_path_buf(),
            body,
            revision: 0,
        })
    }

    /// Path the container was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded text of the body member.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Replace the in-memory body text. Does not write to disk.
    pub fn set_body(&mut self, text: String) {
        self.body = text;
        self.revision += 1;
    }

    /// Number of body replacements since `open`.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Re-serialize the archive with the current body and write it to `path`.
    ///
    /// Every member of the original archive is copied across; only the body
    /// member's content changes. The write goes to a temp sibling first and
    /// is renamed into place, so a crash mid-write never corrupts the
    /// original file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let src_file = File::open(&self.path)
            .map_err(|e| PatchError::ContainerWrite(format!("cannot reopen {:?}: {}", self.path, e)))?;
        let mut archive = ZipArchive::new(src_file)
            .map_err(|e| PatchError::ContainerWrite(format!("cannot reread archive: {}", e)))?;

        let temp_path = path.with_extension("docx.tmp");
        let dst_file = File::create(&temp_path)
            .map_err(|e| PatchError::ContainerWrite(format!("cannot create {:?}: {}", temp_path, e)))?;
        let mut writer = ZipWriter::new(dst_file);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);

        for i in 0..archive.len() {
            let mut member = archive
                .by_index(i)
                .map_err(|e| PatchError::ContainerWrite(format!("cannot read member {}: {}", i, e)))?;
            let name = member.name().to_string();
            writer
                .start_file(name.clone(), options)
                .map_err(|e| PatchError::ContainerWrite(format!("cannot start member {}: {}", name, e)))?;
            if name == BODY_MEMBER {
                writer
                    .write_all(self.body.as_bytes())
                    .map_err(|e| PatchError::ContainerWrite(format!("cannot write body: {}", e)))?;
            } else {
                let mut buf = Vec::new();
                member
                    .read_to_end(&mut buf)
                    .map_err(|e| PatchError::ContainerWrite(format!("cannot copy member {}: {}", name, e)))?;
                writer
                    .write_all(&buf)
                    .map_err(|e| PatchError::ContainerWrite(format!("cannot copy member {}: {}", name, e)))?;
            }
        }

        writer
            .finish()
            .map_err(|e| PatchError::ContainerWrite(format!("cannot finalize archive: {}", e)))?;
        std::fs::rename(&temp_path, path)
            .map_err(|e| PatchError::ContainerWrite(format!("cannot rename {:?} into place: {}", temp_path, e)))?;

        info!("saved patched container to {:?} (revision {})", path, self.revision);
        Ok(())
    }
}
