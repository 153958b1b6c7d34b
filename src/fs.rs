//! Path-based loading and saving.
//!
//! Saving never truncates an existing container in place: the archive is written to a temporary
//! file next to the destination and renamed over it only once encoding succeeded.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::audio::AudioDecoder;
use crate::container::{decode_document, encode_document};
use crate::document::Document;
use crate::opts::ContainerOpts;
use crate::{Error, Result};

/// Open the container at `path` and decode it.
pub fn load_document<D>(
    path: impl AsRef<Path>,
    decoder: &D,
    opts: &ContainerOpts,
) -> Result<Document>
where
    D: AudioDecoder + ?Sized,
{
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::corrupt(format!("failed to open '{}'", path.display()), e))?;
    decode_document(BufReader::new(file), decoder, opts)
}

/// Encode `document` and atomically replace whatever is at `path`.
pub fn save_document(
    document: &Document,
    path: impl AsRef<Path>,
    opts: &ContainerOpts,
) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".transcript-doc-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| {
            Error::write(
                format!("failed to create temp file in '{}'", dir.display()),
                e,
            )
        })?;

    let mut writer = encode_document(document, BufWriter::new(tmp.as_file_mut()), opts)?;
    writer
        .flush()
        .map_err(|e| Error::write("failed to flush container", e))?;
    drop(writer);

    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::write("failed to sync container", e))?;
    tmp.persist(path).map_err(|e| {
        Error::write(
            format!("failed to move container to '{}'", path.display()),
            e.error,
        )
    })?;

    debug!(path = %path.display(), "saved container");
    Ok(())
}
