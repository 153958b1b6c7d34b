use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use transcript_doc::logging::{self, LogFormat};
use transcript_doc::{
    AudioCompression, ContainerOpts, Document, SymphoniaDecoder, compute_timed, load_document,
    save_document,
};

#[derive(Parser, Debug)]
#[command(name = "transcript-doc")]
#[command(about = "Inspect, seek and repack transcript containers")]
struct Params {
    /// Maximum number of sources decoded in parallel (defaults to the CPU count).
    #[arg(long = "jobs", global = true)]
    jobs: Option<usize>,

    /// Skip invariant checks when loading.
    #[arg(long = "no-validate", global = true, default_value_t = false)]
    no_validate: bool,

    /// Emit human-readable logs instead of JSON.
    #[arg(long = "text-logs", global = true, default_value_t = false)]
    text_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of a container.
    Inspect { path: PathBuf },

    /// Print every item from the one playing at `--time` onward, one JSON object per line.
    Seek {
        path: PathBuf,

        /// Position on the document timeline, in seconds.
        #[arg(short = 't', long = "time", allow_negative_numbers = true)]
        time: f64,
    },

    /// Print the content tree with absolute start times.
    Timeline { path: PathBuf },

    /// Load a container and write it back out.
    Repack {
        input: PathBuf,
        output: PathBuf,

        #[arg(long = "audio-compression", value_enum, default_value_t = AudioCompression::Stored)]
        audio_compression: AudioCompression,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceSummary<'a> {
    file_name: &'a str,
    bytes: usize,
    sample_rate: Option<u32>,
    channels: Option<usize>,
    duration_seconds: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    sources: Vec<SourceSummary<'a>>,
    paragraphs: usize,
    items: usize,
    words: usize,
    duration_seconds: f64,
}

fn main() -> Result<()> {
    let params = Params::parse();
    logging::init(if params.text_logs {
        LogFormat::Text
    } else {
        LogFormat::Json
    });

    let mut opts = ContainerOpts {
        validate_on_decode: !params.no_validate,
        ..ContainerOpts::default()
    };
    if let Some(jobs) = params.jobs {
        opts.max_parallel_decodes = jobs;
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match params.command {
        Command::Inspect { path } => {
            let doc = load(&path, &opts)?;
            serde_json::to_writer_pretty(&mut out, &summarize(&doc))?;
            writeln!(out)?;
        }
        Command::Seek { path, time } => {
            let doc = load(&path, &opts)?;
            for item in doc.seek(time) {
                serde_json::to_writer(&mut out, &item)?;
                writeln!(out)?;
            }
        }
        Command::Timeline { path } => {
            let doc = load(&path, &opts)?;
            serde_json::to_writer_pretty(&mut out, &compute_timed(&doc.content))?;
            writeln!(out)?;
        }
        Command::Repack {
            input,
            output,
            audio_compression,
        } => {
            let doc = load(&input, &opts)?;
            opts.audio_compression = audio_compression;
            save_document(&doc, &output, &opts)
                .with_context(|| format!("failed to write '{}'", output.display()))?;
            info!(input = %input.display(), output = %output.display(), "repacked container");
        }
    }

    out.flush()?;
    Ok(())
}

fn load(path: &Path, opts: &ContainerOpts) -> Result<Document> {
    load_document(path, &SymphoniaDecoder::new(), opts)
        .with_context(|| format!("failed to load '{}'", path.display()))
}

fn summarize(doc: &Document) -> Summary<'_> {
    let sources = doc
        .sources
        .iter()
        .map(|s| SourceSummary {
            file_name: s.file_name(),
            bytes: s.raw_bytes().map_or(0, <[u8]>::len),
            sample_rate: s.decoded().map(|d| d.sample_rate),
            channels: s.decoded().map(|d| d.channels),
            duration_seconds: s.decoded().map(|d| d.duration_seconds()),
        })
        .collect();

    Summary {
        sources,
        paragraphs: doc.content.len(),
        items: doc.item_count(),
        words: doc.iter().filter(|it| it.item.is_word()).count(),
        duration_seconds: doc.duration(),
    }
}
