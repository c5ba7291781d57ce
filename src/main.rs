//! Hitrun CLI - Command-line tool for Simpsons: Hit & Run asset files.
//!
//! This is the main entry point for the hitrun command-line application.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use hitrun::prelude::*;

/// Hitrun - Pure3D, RCF and RSD asset tool
#[derive(Parser)]
#[command(name = "hitrun")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the chunk tree of a Pure3D file
    P3dTree {
        /// Path to the P3D file
        #[arg(short, long, env = "INPUT_P3D")]
        input: PathBuf,

        /// Maximum depth to print
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Decode a Pure3D file and list its resources
    P3dInfo {
        /// Path to the P3D file
        #[arg(short, long, env = "INPUT_P3D")]
        input: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List contents of an RCF archive
    RcfList {
        /// Path to the RCF file
        #[arg(short, long, env = "INPUT_RCF")]
        rcf: PathBuf,

        /// Filter pattern (regex, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show offsets, sizes and hashes
        #[arg(short, long)]
        detailed: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Extract files from an RCF archive
    RcfExtract {
        /// Path to the RCF file
        #[arg(short, long, env = "INPUT_RCF")]
        rcf: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern (regex, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Pack a directory into an RCF archive
    RcfPack {
        /// Directory to pack
        #[arg(short, long)]
        input: PathBuf,

        /// Output RCF file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode an RSD stream to WAV
    RsdDecode {
        /// RSD file, or an archive entry name when --rcf is given
        #[arg(short, long)]
        input: String,

        /// Read the stream from this RCF archive
        #[arg(short, long, env = "INPUT_RCF")]
        rcf: Option<PathBuf>,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::P3dTree { input, depth } => {
            cmd_p3d_tree(&input, depth)?;
        }
        Commands::P3dInfo { input, json } => {
            cmd_p3d_info(&input, json)?;
        }
        Commands::RcfList {
            rcf,
            filter,
            detailed,
            json,
        } => {
            cmd_rcf_list(&rcf, filter.as_deref(), detailed, json)?;
        }
        Commands::RcfExtract { rcf, output, filter } => {
            cmd_rcf_extract(&rcf, &output, filter.as_deref())?;
        }
        Commands::RcfPack { input, output } => {
            cmd_rcf_pack(&input, &output)?;
        }
        Commands::RsdDecode { input, rcf, output } => {
            cmd_rsd_decode(&input, rcf.as_deref(), &output)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_p3d_tree(input: &Path, max_depth: Option<usize>) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let tree = ChunkTree::parse(data).context("Failed to parse P3D file")?;

    fn walk(chunk: hitrun::p3d::ChunkRef<'_>, depth: usize, max_depth: Option<usize>) {
        println!(
            "{:indent$}{} @ {:#x} payload={} total={}",
            "",
            chunk.chunk_type(),
            chunk.offset(),
            chunk.payload_size(),
            chunk.total_size(),
            indent = depth * 2
        );
        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        for child in chunk.children() {
            walk(child, depth + 1, max_depth);
        }
    }

    walk(tree.root(), 0, max_depth);
    println!("\nTotal: {} chunks", tree.len());
    if tree.trailing_bytes() > 0 {
        println!("Trailing bytes: {}", tree.trailing_bytes());
    }

    Ok(())
}

#[derive(Serialize)]
struct ResourceSummary<'a> {
    kind: &'static str,
    name: &'a str,
}

#[derive(Serialize)]
struct WarningSummary {
    chunk_type: String,
    offset: usize,
    error: String,
}

#[derive(Serialize)]
struct ContainerSummary<'a> {
    resources: Vec<ResourceSummary<'a>>,
    warnings: Vec<WarningSummary>,
    composite_props: Option<usize>,
    trailing_bytes: usize,
}

fn cmd_p3d_info(input: &Path, json: bool) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;

    let start = Instant::now();
    let registry = DecoderRegistry::standard();
    let store = ResourceStore::new();
    let report = load_container(data, &registry, &store, &LoadOptions::default())
        .context("Failed to load P3D file")?;
    let elapsed = start.elapsed();

    let summary = ContainerSummary {
        resources: report
            .resources
            .iter()
            .map(|r| ResourceSummary {
                kind: r.kind(),
                name: r.name(),
            })
            .collect(),
        warnings: report
            .warnings
            .iter()
            .map(|w| WarningSummary {
                chunk_type: w.chunk_type.to_string(),
                offset: w.offset,
                error: w.error.to_string(),
            })
            .collect(),
        composite_props: report.composite.as_ref().map(|c| c.props.len()),
        trailing_bytes: report.trailing_bytes,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for resource in &summary.resources {
        println!("{:<10} {}", resource.kind, resource.name);
    }
    for warning in &summary.warnings {
        eprintln!("warning: {} @ {:#x}: {}", warning.chunk_type, warning.offset, warning.error);
    }
    if let Some(props) = summary.composite_props {
        println!("Composite model: {} props", props);
    }
    println!(
        "\nDecoded {} resources in {:?} ({} warnings, {} registered)",
        summary.resources.len(),
        elapsed,
        summary.warnings.len(),
        report.registered
    );

    Ok(())
}

#[derive(Serialize)]
struct EntrySummary<'a> {
    name: Option<&'a str>,
    hash: u32,
    offset: u32,
    size: u32,
}

fn cmd_rcf_list(rcf_path: &Path, filter: Option<&str>, detailed: bool, json: bool) -> Result<()> {
    let archive = RcfArchive::open(rcf_path).context("Failed to open RCF archive")?;
    let filter = filter.map(compile_filter).transpose()?;

    let entries: Vec<EntrySummary<'_>> = archive
        .entries()
        .iter()
        .map(|e| {
            let (hash, offset, size) = (e.hash, e.offset, e.size);
            EntrySummary {
                name: archive.entry_name(hash),
                hash,
                offset,
                size,
            }
        })
        .filter(|e| matches_filter(filter.as_ref(), e.name))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let name = entry.name.map_or_else(|| format!("<{:08x}>", entry.hash), str::to_string);
        if detailed {
            println!("{:08x} {:>10} {:>10} {}", entry.hash, entry.offset, entry.size, name);
        } else {
            println!("{}", name);
        }
    }

    println!("\nTotal: {} entries", entries.len());

    Ok(())
}

fn cmd_rcf_extract(rcf_path: &Path, output: &Path, filter: Option<&str>) -> Result<()> {
    println!("Opening RCF archive: {}", rcf_path.display());

    let start = Instant::now();
    let archive = RcfArchive::open(rcf_path).context("Failed to open RCF archive")?;
    println!("Loaded {} entries in {:?}", archive.len(), start.elapsed());

    let filter = filter.map(compile_filter).transpose()?;
    let hashes: Vec<u32> = archive
        .entries()
        .iter()
        .map(|e| e.hash)
        .filter(|&hash| matches_filter(filter.as_ref(), archive.entry_name(hash)))
        .collect();

    println!("Extracting {} entries...", hashes.len());

    let pb = ProgressBar::new(hashes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let errors: Vec<anyhow::Error> = hashes
        .par_iter()
        .filter_map(|&hash| {
            let result = extract_entry(&archive, hash, output);
            pb.inc(1);
            result.err()
        })
        .collect();

    pb.finish_with_message("Done");
    for error in &errors {
        eprintln!("Error: {:#}", error);
    }
    println!(
        "Extraction completed in {:?} ({} errors)",
        start.elapsed(),
        errors.len()
    );

    Ok(())
}

fn extract_entry(archive: &RcfArchive, hash: u32, output: &Path) -> Result<()> {
    let relative = match archive.entry_name(hash) {
        Some(name) => entry_path(name)?,
        None => PathBuf::from(format!("{hash:08x}.bin")),
    };
    let output_path = output.join(&relative);
    let label = relative.display();

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let stream = archive
        .get_stream_by_hash(hash)
        .with_context(|| format!("Failed to read {label}"))?;
    fs::write(&output_path, stream.as_bytes()).with_context(|| format!("Failed to write {label}"))?;
    Ok(())
}

/// Map an archive name to a relative output path.
///
/// Only plain components are accepted, so an entry can never land outside
/// the extraction directory.
fn entry_path(name: &str) -> Result<PathBuf> {
    let normalized = name.replace('\\', "/");
    let path = Path::new(&normalized);
    let mut components = path.components().peekable();
    if components.peek().is_none() {
        anyhow::bail!("Refusing to extract entry with empty name");
    }
    if !components.all(|c| matches!(c, Component::Normal(_))) {
        anyhow::bail!("Refusing to extract {name}: path leaves the output directory");
    }
    Ok(path.to_path_buf())
}

fn cmd_rcf_pack(input: &Path, output: &Path) -> Result<()> {
    println!("Packing: {} -> {}", input.display(), output.display());

    let mut writer = RcfWriter::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.context("Failed to walk input directory")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(input)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("\\");
        let data = fs::read(entry.path()).with_context(|| format!("Failed to read {}", entry.path().display()))?;
        writer.add(name, data);
    }

    let mut out = BufWriter::new(fs::File::create(output).context("Failed to create output file")?);
    writer.write_to(&mut out).context("Failed to write archive")?;
    out.flush()?;

    println!("Packed {} files", writer.len());

    Ok(())
}

fn cmd_rsd_decode(input: &str, rcf: Option<&Path>, output: &Path) -> Result<()> {
    let pcm = match rcf {
        Some(rcf_path) => {
            let archive = RcfArchive::open(rcf_path).context("Failed to open RCF archive")?;
            load_audio(&archive, input).with_context(|| format!("Failed to decode {input}"))?
        }
        None => {
            let data = fs::read(input).context("Failed to read input file")?;
            hitrun::rsd::decode(&data).context("Failed to decode RSD stream")?
        }
    };

    let mut out = BufWriter::new(fs::File::create(output).context("Failed to create output file")?);
    pcm.write_wav(&mut out).context("Failed to write WAV file")?;
    out.flush()?;

    println!(
        "Decoded {} channels at {} Hz, {:?}",
        pcm.channels,
        pcm.sample_rate,
        pcm.duration()
    );

    Ok(())
}

fn compile_filter(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){pattern}")).with_context(|| format!("Invalid filter pattern: {pattern}"))
}

/// Unnamed entries only match when there is no filter.
fn matches_filter(filter: Option<&Regex>, name: Option<&str>) -> bool {
    match (filter, name) {
        (None, _) => true,
        (Some(re), Some(name)) => re.is_match(name),
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_is_case_insensitive() {
        let re = compile_filter(r"\.rsd$").unwrap();
        assert!(matches_filter(Some(&re), Some("sound\\music\\THEME.RSD")));
        assert!(!matches_filter(Some(&re), Some("art\\car.p3d")));
        assert!(!matches_filter(Some(&re), None));
        assert!(matches_filter(None, None));
    }

    #[test]
    fn test_pack_then_extract() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::create_dir_all(input.join("sound")).unwrap();
        fs::write(input.join("sound").join("a.rsd"), b"abc").unwrap();
        fs::write(input.join("b.p3d"), b"xyz").unwrap();

        let archive_path = dir.path().join("out.rcf");
        cmd_rcf_pack(&input, &archive_path).unwrap();

        let archive = RcfArchive::open(&archive_path).unwrap();
        assert_eq!(archive.read("sound/a.rsd").unwrap(), b"abc");

        let output = dir.path().join("extracted");
        cmd_rcf_extract(&archive_path, &output, Some("rsd")).unwrap();
        assert_eq!(fs::read(output.join("sound/a.rsd")).unwrap(), b"abc");
        assert!(!output.join("b.p3d").exists());
    }

    #[test]
    fn test_entry_path_rejects_escapes() {
        assert_eq!(entry_path("sound\\music\\theme.rsd").unwrap(), PathBuf::from("sound/music/theme.rsd"));
        for name in ["..\\..\\x", "sound/../../x", "/etc/passwd", "\\abs.bin", ".\\x", ""] {
            assert!(entry_path(name).is_err(), "{name:?} accepted");
        }
    }

    #[test]
    fn test_extract_skips_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RcfWriter::new();
        writer.add("..\\escape.txt", b"bad".to_vec());
        writer.add("ok.txt", b"good".to_vec());
        let archive_path = dir.path().join("evil.rcf");
        fs::write(&archive_path, writer.to_bytes().unwrap()).unwrap();

        let output = dir.path().join("out");
        cmd_rcf_extract(&archive_path, &output, None).unwrap();
        assert_eq!(fs::read(output.join("ok.txt")).unwrap(), b"good");
        assert!(!dir.path().join("escape.txt").exists());

        let archive = RcfArchive::open(&archive_path).unwrap();
        let hash = archive
            .entries()
            .iter()
            .map(|e| e.hash)
            .find(|&h| archive.entry_name(h) == Some("..\\escape.txt"))
            .unwrap();
        assert!(extract_entry(&archive, hash, &output).is_err());
    }
}
