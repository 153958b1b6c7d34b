//! The on-disk container: a zip archive with one JSON metadata entry plus one binary entry per
//! audio source.
//!
//! Layout:
//! - `document.json` holds `{"sources": [{"fileName": ...}], "content": [...]}`
//! - every source's raw audio lives in an entry named exactly by its `fileName`
//!
//! Writing is deterministic: source entries in source-list order, then the metadata entry, all
//! stamped with the zip epoch. Reading decodes every source's audio on a bounded pool of worker
//! threads and fails as a whole if any single source fails.

use std::borrow::Cow;
use std::io::{Cursor, Read, Seek, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::audio::{AudioDecoder, DecodedAudio};
use crate::document::{Document, Paragraph, Source, SourceMedia};
use crate::opts::ContainerOpts;
use crate::{Error, Result};

/// Name of the metadata entry. Reserved; no source may use it.
pub const METADATA_ENTRY: &str = "document.json";

/// The persisted form of a [`Source`]: its key and nothing else.
#[derive(Debug, Serialize, Deserialize)]
struct SourceRef<'a> {
    #[serde(rename = "fileName")]
    file_name: Cow<'a, str>,
}

#[derive(Debug, Serialize)]
struct ManifestOut<'a> {
    sources: Vec<SourceRef<'a>>,
    content: &'a [Paragraph],
}

#[derive(Debug, Deserialize)]
struct ManifestIn {
    sources: Vec<SourceRef<'static>>,
    content: Vec<Paragraph>,
}

/// Read a container and materialize every source through `decoder`.
///
/// Fails with:
/// - [`Error::CorruptContainer`] if the archive or its metadata entry is unreadable
/// - [`Error::InvariantViolation`] if the metadata describes an invalid document
///   (only when [`ContainerOpts::validate_on_decode`] is set)
/// - [`Error::MissingAsset`] if a declared source has no entry
/// - [`Error::DecodeFailure`] if `decoder` rejects any source
pub fn decode_document<R, D>(reader: R, decoder: &D, opts: &ContainerOpts) -> Result<Document>
where
    R: Read + Seek,
    D: AudioDecoder + ?Sized,
{
    let span = info_span!("decode_document");
    let _enter = span.enter();

    let mut archive =
        ZipArchive::new(reader).map_err(|e| Error::corrupt("failed to open archive", e))?;
    let manifest = read_manifest(&mut archive)?;

    let sources = manifest
        .sources
        .into_iter()
        .map(|s| Source::new(s.file_name.into_owned()))
        .collect();
    let mut document = Document::new(sources, manifest.content);

    if opts.validate_on_decode {
        document.validate()?;
    }

    let mut assets = Vec::with_capacity(document.sources.len());
    for source in &document.sources {
        assets.push(read_asset(&mut archive, source.file_name())?);
    }

    let decoded = decode_sources(&document.sources, &assets, decoder, opts.max_parallel_decodes)?;
    for ((source, bytes), decoded) in document.sources.iter_mut().zip(assets).zip(decoded) {
        source.attach(SourceMedia {
            bytes,
            decoded: Arc::new(decoded),
        });
    }

    info!(
        sources = document.sources.len(),
        paragraphs = document.content.len(),
        items = document.item_count(),
        "decoded container"
    );
    Ok(document)
}

/// Decode a container held in memory.
pub fn decode_from_slice<D>(bytes: &[u8], decoder: &D, opts: &ContainerOpts) -> Result<Document>
where
    D: AudioDecoder + ?Sized,
{
    decode_document(Cursor::new(bytes), decoder, opts)
}

/// Write `document` as a container into `writer` and hand the writer back.
///
/// Every source must be materialized; its raw bytes are written verbatim and its decoded audio
/// is discarded. On [`Error::WriteFailure`] the destination holds an incomplete archive and must
/// not be treated as a container.
pub fn encode_document<W>(document: &Document, writer: W, opts: &ContainerOpts) -> Result<W>
where
    W: Write + Seek,
{
    let span = info_span!("encode_document");
    let _enter = span.enter();

    document.validate()?;

    let mut zip = ZipWriter::new(writer);

    for source in &document.sources {
        let name = source.file_name();
        let bytes = source.raw_bytes().ok_or_else(|| {
            Error::invariant(format!("source '{name}' has no audio bytes to write"))
        })?;

        zip.start_file(name, entry_options(opts.audio_compression.method()))
            .map_err(|e| Error::write(format!("failed to start entry '{name}'"), e))?;
        zip.write_all(bytes)
            .map_err(|e| Error::write(format!("failed to write entry '{name}'"), e))?;
        debug!(file_name = name, bytes = bytes.len(), "wrote source entry");
    }

    let manifest = ManifestOut {
        sources: document
            .sources
            .iter()
            .map(|s| SourceRef {
                file_name: Cow::Borrowed(s.file_name()),
            })
            .collect(),
        content: &document.content,
    };

    zip.start_file(METADATA_ENTRY, entry_options(CompressionMethod::Deflated))
        .map_err(|e| Error::write("failed to start metadata entry", e))?;
    serde_json::to_writer(&mut zip, &manifest)
        .map_err(|e| Error::write("failed to write metadata entry", e))?;

    let writer = zip
        .finish()
        .map_err(|e| Error::write("failed to finalize archive", e))?;

    info!(sources = document.sources.len(), "encoded container");
    Ok(writer)
}

/// Encode a container into a fresh buffer.
pub fn encode_to_vec(document: &Document, opts: &ContainerOpts) -> Result<Vec<u8>> {
    let cursor = encode_document(document, Cursor::new(Vec::new()), opts)?;
    Ok(cursor.into_inner())
}

fn entry_options(method: CompressionMethod) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(method)
        .last_modified_time(DateTime::default())
}

fn read_manifest<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<ManifestIn> {
    let entry = match archive.by_name(METADATA_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(Error::corrupt_msg(format!(
                "metadata entry '{METADATA_ENTRY}' is missing"
            )));
        }
        Err(e) => return Err(Error::corrupt("failed to open metadata entry", e)),
    };

    serde_json::from_reader(entry).map_err(|e| Error::corrupt("invalid metadata entry", e))
}

fn read_asset<R: Read + Seek>(archive: &mut ZipArchive<R>, file_name: &str) -> Result<Arc<[u8]>> {
    let mut entry = match archive.by_name(file_name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(Error::MissingAsset {
                file_name: file_name.to_string(),
            });
        }
        Err(e) => {
            return Err(Error::corrupt(
                format!("failed to open entry '{file_name}'"),
                e,
            ));
        }
    };

    let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| Error::corrupt(format!("failed to read entry '{file_name}'"), e))?;
    Ok(bytes.into())
}

/// Decode every source on up to `max_parallel` scoped worker threads.
///
/// Workers pull indices from a shared counter and stop picking up work as soon as any decode
/// fails. A panicking decoder counts as a failure of the source it was decoding. Each result lands in its own slot; the slots are only read after every worker joined.
fn decode_sources<D>(
    sources: &[Source],
    assets: &[Arc<[u8]>],
    decoder: &D,
    max_parallel: usize,
) -> Result<Vec<DecodedAudio>>
where
    D: AudioDecoder + ?Sized,
{
    let workers = max_parallel.max(1).min(sources.len());
    if workers == 0 {
        return Ok(Vec::new());
    }

    let next = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);

    let worker = || {
        let mut done: Vec<(usize, Result<DecodedAudio>)> = Vec::new();
        while !failed.load(Ordering::Acquire) {
            let idx = next.fetch_add(1, Ordering::AcqRel);
            let (Some(source), Some(bytes)) = (sources.get(idx), assets.get(idx)) else {
                break;
            };

            let name = source.file_name();
            let res = panic::catch_unwind(AssertUnwindSafe(|| decode_one(decoder, name, bytes)))
                .unwrap_or_else(|_| {
                    warn!(file_name = name, "decoder panicked");
                    Err(Error::DecodeFailure {
                        file_name: name.to_string(),
                        message: "decoder panicked".to_string(),
                    })
                });
            if res.is_err() {
                failed.store(true, Ordering::Release);
            }
            done.push((idx, res));
        }
        done
    };

    let joined: Vec<thread::Result<Vec<(usize, Result<DecodedAudio>)>>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers).map(|_| scope.spawn(worker)).collect();
        handles.into_iter().map(|h| h.join()).collect()
    });

    let mut slots: Vec<Option<Result<DecodedAudio>>> = sources.iter().map(|_| None).collect();
    for outcome in joined {
        let done = outcome.map_err(|_| Error::DecodeFailure {
            file_name: String::new(),
            message: "decode worker panicked outside the decoder".to_string(),
        })?;
        for (idx, res) in done {
            slots[idx] = Some(res);
        }
    }

    // Report the failing source that comes first in the document, not whichever thread lost
    // the race.
    for slot in &mut slots {
        if matches!(slot, Some(Err(_))) {
            if let Some(Err(err)) = slot.take() {
                return Err(err);
            }
        }
    }

    sources
        .iter()
        .zip(slots)
        .map(|(source, slot)| match slot {
            Some(res) => res,
            None => Err(Error::DecodeFailure {
                file_name: source.file_name().to_string(),
                message: "decode was abandoned".to_string(),
            }),
        })
        .collect()
}

fn decode_one<D>(decoder: &D, file_name: &str, bytes: &[u8]) -> Result<DecodedAudio>
where
    D: AudioDecoder + ?Sized,
{
    let span = info_span!("decode_source", file_name);
    let _enter = span.enter();

    match decoder.decode(file_name, bytes) {
        Ok(audio) => {
            debug!(
                sample_rate = audio.sample_rate,
                channels = audio.channels,
                frames = audio.frames(),
                "decoded source"
            );
            Ok(audio)
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "failed to decode source");
            Err(Error::decode(file_name, err))
        }
    }
}
