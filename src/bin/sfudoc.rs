//! sfudoc CLI - HTML ↔ LaTeX converter for СФУ.ДОК documents

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser, Subcommand};
#[cfg(feature = "cli")]
use sfudoc::{
    decode_with_options, encode_with_options,
    utils::analysis::{metrics_source, unresolved_images},
    ConversionError, DecodeOptions, DocumentSnapshot, EncodeOptions, ImageRegistry, LossReport,
    ProfileFields, Template,
};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "sfudoc")]
#[command(version)]
#[command(about = "СФУ.ДОК - bidirectional HTML ↔ LaTeX converter", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert editor HTML to LaTeX
    Encode {
        /// Input file path (reads from stdin if not provided)
        input: Option<String>,

        /// Output file path (writes to stdout if not provided)
        #[arg(short, long)]
        output: Option<String>,

        /// Image registry JSON to start from
        #[arg(short, long)]
        registry: Option<String>,

        /// Where to write the updated registry JSON
        #[arg(long)]
        registry_out: Option<String>,

        /// Template preamble (.tex) to wrap the body in
        #[arg(short, long)]
        template: Option<String>,

        /// Profile JSON used to fill the template placeholders
        #[arg(short, long)]
        profile: Option<String>,

        /// Without a template: emit a complete document with the default preamble
        #[arg(short = 'f', long)]
        full_document: bool,

        /// Write a loss report JSON to this path
        #[arg(long)]
        loss_log: Option<String>,
    },

    /// Convert LaTeX to editor HTML
    Decode {
        /// Input file path (reads from stdin if not provided)
        input: Option<String>,

        /// Output file path (writes to stdout if not provided)
        #[arg(short, long)]
        output: Option<String>,

        /// Image registry JSON used to resolve \includegraphics filenames
        #[arg(short, long)]
        registry: Option<String>,

        /// Put each top-level block on its own line
        #[arg(long)]
        pretty: bool,

        /// Write a loss report JSON to this path
        #[arg(long)]
        loss_log: Option<String>,
    },

    /// Write every registry image to a directory
    ExtractImages {
        /// Image registry JSON
        #[arg(short, long)]
        registry: String,

        /// Target directory
        #[arg(short, long, default_value = ".")]
        output_dir: String,
    },

    /// Report constructs and problems in a LaTeX source
    Check {
        /// Input file path (reads from stdin if not provided)
        input: Option<String>,

        /// Also report images missing from this registry
        #[arg(short, long)]
        registry: Option<String>,
    },

    /// Show a saved document snapshot
    Info {
        /// Snapshot JSON
        snapshot: String,

        /// Rebuild the editor HTML from the snapshot's LaTeX and write it here
        #[arg(long)]
        restore: Option<String>,
    },
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "sfudoc=warn",
        1 => "sfudoc=info",
        _ => "sfudoc=debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

#[cfg(feature = "cli")]
fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Encode {
            input,
            output,
            registry,
            registry_out,
            template,
            profile,
            full_document,
            loss_log,
        } => {
            let html = read_input(input.as_deref())?;
            let registry = load_registry(registry.as_deref())?;
            let template = template
                .map(|path| fs::read_to_string(path).map(Template::new))
                .transpose()?;
            let profile: Option<ProfileFields> = profile
                .map(|path| read_json(&path))
                .transpose()?;
            let options = EncodeOptions {
                template,
                profile,
                full_document,
                ..EncodeOptions::default()
            };
            let encoded = encode_with_options(&html, &registry, &options);
            write_output(output.as_deref(), &encoded.latex)?;
            if let Some(path) = registry_out {
                write_json(&path, &encoded.registry)?;
            }
            finish_report(&encoded.report, loss_log.as_deref())
        }
        Commands::Decode {
            input,
            output,
            registry,
            pretty,
            loss_log,
        } => {
            let latex = read_input(input.as_deref())?;
            let registry = load_registry(registry.as_deref())?;
            let decoded = decode_with_options(&latex, &registry, &DecodeOptions { pretty });
            tracing::info!(dialect = ?decoded.dialect, "decoded");
            write_output(output.as_deref(), &decoded.html)?;
            finish_report(&decoded.report, loss_log.as_deref())
        }
        Commands::ExtractImages {
            registry,
            output_dir,
        } => {
            let registry: ImageRegistry = read_json(&registry)?;
            let dir = PathBuf::from(output_dir);
            fs::create_dir_all(&dir)?;
            for (name, _) in registry.iter() {
                let bytes = registry.decode_payload(name).map_err(to_io)?;
                let path = dir.join(safe_file_name(name));
                fs::write(&path, bytes)?;
                println!("{}", path.display());
            }
            Ok(())
        }
        Commands::Check { input, registry } => {
            let latex = read_input(input.as_deref())?;
            let metrics = metrics_source(&latex);
            println!("{}", to_json(&metrics)?);
            if let Some(path) = registry {
                let registry: ImageRegistry = read_json(&path)?;
                let missing = unresolved_images(&latex, &registry);
                for name in &missing {
                    eprintln!("missing image: {}", name);
                }
                if !missing.is_empty() {
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Info { snapshot, restore } => {
            let text = fs::read_to_string(&snapshot)?;
            let snapshot = DocumentSnapshot::from_json(&text).map_err(to_io)?;
            println!("format version: {}", snapshot.format_version);
            println!("dialect:        {:?}", snapshot.dialect());
            println!("images:         {}", snapshot.images.len());
            if let Some(saved_at) = snapshot.saved_at {
                println!("saved at:       {}", saved_at.to_rfc3339());
            }
            if let Some(path) = restore {
                fs::write(path, snapshot.restore_html())?;
            }
            Ok(())
        }
    }
}

#[cfg(feature = "cli")]
fn to_io(e: ConversionError) -> io::Error {
    match e {
        ConversionError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}

#[cfg(feature = "cli")]
fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn write_output(path: Option<&str>, content: &str) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, content),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

#[cfg(feature = "cli")]
fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> io::Result<T> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| to_io(e.into()))
}

#[cfg(feature = "cli")]
fn to_json<T: serde::Serialize>(value: &T) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| to_io(e.into()))
}

#[cfg(feature = "cli")]
fn write_json<T: serde::Serialize>(path: &str, value: &T) -> io::Result<()> {
    fs::write(path, to_json(value)?)
}

#[cfg(feature = "cli")]
fn load_registry(path: Option<&str>) -> io::Result<ImageRegistry> {
    match path {
        Some(path) => read_json(path),
        None => Ok(ImageRegistry::new()),
    }
}

/// Print losses to stderr and optionally save the report.
#[cfg(feature = "cli")]
fn finish_report(report: &LossReport, loss_log: Option<&str>) -> io::Result<()> {
    for message in report.messages() {
        eprintln!("warning: {}", message);
    }
    if let Some(path) = loss_log {
        write_json(path, report)?;
    }
    Ok(())
}

/// Registry keys are written as bare file names inside the target directory.
#[cfg(feature = "cli")]
fn safe_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.png".to_string())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install sfudoc --features cli");
    eprintln!("  sfudoc <encode|decode|extract-images|check|info> [OPTIONS]");
}
