use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};

use pigsqueeze::{CodecOptions, Image, Slot};

#[derive(Parser, Debug)]
#[command(
    name = "pigsqueeze",
    version,
    about = "Hide identifier-tagged payloads in JPEG APPn segments and PNG ancillary chunks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Codec options as JSON (multi_fragment, scan_mode, strict_fragments, verify_crc)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store DATA in an APPn segment of a JPEG
    WriteJpg {
        #[command(flatten)]
        files: WriteFiles,

        /// APPn segment number
        #[arg(short, long)]
        segment: u8,

        /// Identifier stored in front of the payload
        #[arg(short, long)]
        identifier: String,
    },

    /// Store DATA in a private ancillary chunk of a PNG
    WritePng {
        #[command(flatten)]
        files: WriteFiles,

        /// Four-letter chunk type, first letter lowercase
        #[arg(short, long)]
        chunk: String,

        /// Identifier stored in front of the payload
        #[arg(short, long)]
        identifier: String,
    },

    /// Read the payload stored in an APPn segment of a JPEG
    ReadJpg {
        #[command(flatten)]
        files: ReadFiles,

        /// APPn segment number
        #[arg(short, long)]
        segment: u8,

        /// Identifier the payload was stored with
        #[arg(short, long)]
        identifier: String,
    },

    /// Read the payload stored in a private ancillary chunk of a PNG
    ReadPng {
        #[command(flatten)]
        files: ReadFiles,

        /// Four-letter chunk type
        #[arg(short, long)]
        chunk: String,

        /// Identifier the payload was stored with
        #[arg(short, long)]
        identifier: String,
    },
}

#[derive(Args, Debug)]
struct WriteFiles {
    /// Image to embed into
    #[arg(value_name = "INPUT_IMAGE")]
    input: PathBuf,

    /// File holding the payload
    #[arg(value_name = "DATA")]
    data: PathBuf,

    /// Where to write the new image
    #[arg(value_name = "OUTPUT_FILE")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ReadFiles {
    /// Image to read from
    #[arg(value_name = "INPUT_IMAGE")]
    input: PathBuf,

    /// Where to write the payload
    #[arg(value_name = "OUTPUT_FILE")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let options = load_options(cli.config.as_deref())?;

    match cli.command {
        Command::WriteJpg {
            files,
            segment,
            identifier,
        } => write_payload(&files, &Slot::Segment(segment), &identifier, options),
        Command::WritePng {
            files,
            chunk,
            identifier,
        } => write_payload(&files, &Slot::Chunk(chunk), &identifier, options),
        Command::ReadJpg {
            files,
            segment,
            identifier,
        } => read_payload(&files, &Slot::Segment(segment), &identifier, options),
        Command::ReadPng {
            files,
            chunk,
            identifier,
        } => read_payload(&files, &Slot::Chunk(chunk), &identifier, options),
    }
}

/// Loads codec options from `path`, or defaults when none is given.
fn load_options(path: Option<&Path>) -> Result<CodecOptions> {
    let Some(path) = path else {
        return Ok(CodecOptions::default());
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let options = CodecOptions::from_json(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    log::debug!("Loaded options from {}: {:?}", path.display(), options);
    Ok(options)
}

fn open_image(path: &Path, options: CodecOptions) -> Result<Image> {
    let image = Image::open(path, options)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    log::debug!("{}: {}", path.display(), image.format());
    Ok(image)
}

fn write_payload(files: &WriteFiles, slot: &Slot, identifier: &str, options: CodecOptions) -> Result<()> {
    let mut image = open_image(&files.input, options)?;
    let data = std::fs::read(&files.data)
        .with_context(|| format!("Failed to read {}", files.data.display()))?;

    image
        .write(slot, identifier, &data)
        .with_context(|| format!("Failed to write {} bytes to {}", data.len(), slot))?;

    let mut output = File::create(&files.output)
        .with_context(|| format!("Failed to create {}", files.output.display()))?;
    image.save_to(&mut output)?;

    log::info!(
        "Wrote {} bytes to {} as {:?}: {}",
        data.len(),
        slot,
        identifier,
        files.output.display()
    );
    Ok(())
}

fn read_payload(files: &ReadFiles, slot: &Slot, identifier: &str, options: CodecOptions) -> Result<()> {
    let image = open_image(&files.input, options)?;

    let payload = image
        .read(slot, identifier)
        .with_context(|| format!("Failed to read {}", slot))?;

    // The output is only touched when there is something to write
    match payload {
        Some(data) if !data.is_empty() => {
            std::fs::write(&files.output, &data)
                .with_context(|| format!("Failed to write {}", files.output.display()))?;
            log::info!("Read {} bytes from {}: {}", data.len(), slot, files.output.display());
        }
        _ => log::info!("No data in {}", slot),
    }

    Ok(())
}
