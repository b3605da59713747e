// src/main.rs
use anyhow::Context;
use clap::Parser;
use journal_format::{DocumentProcessor, JournalConfig, LayoutMode};
use std::path::PathBuf;

/// Reformat a manuscript .docx into the journal house style
#[derive(Parser, Debug)]
#[command(name = "journal-format")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input .docx manuscript
    #[arg(required = true)]
    document: PathBuf,

    /// Logo image (PNG or JPEG) for the masthead
    #[arg(short, long)]
    logo: PathBuf,

    /// Journal configuration (TOML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output .docx; defaults to <input>_formatted.docx
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the configured layout: full_page, columns_after_abstract, two_column
    #[arg(long)]
    layout: Option<LayoutMode>,

    /// Do not convert the result to PDF
    #[arg(long)]
    no_render: bool,

    /// Print the formatting report as JSON
    #[arg(long)]
    report: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => JournalConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => JournalConfig::default(),
    };
    if let Some(layout) = args.layout {
        config.layout = layout;
    }

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = args
            .document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        args.document.with_file_name(format!("{stem}_formatted.docx"))
    });

    let mut processor = DocumentProcessor::new(config)?;
    if args.no_render {
        processor = processor.without_renderer();
    }

    let outcome = processor
        .process_file(&args.document, &args.logo, &output)
        .with_context(|| format!("Failed to format {}", args.document.display()))?;

    println!("✅ Formatted document saved to {}", outcome.document.display());
    match &outcome.pdf {
        Some(pdf) => println!("✅ PDF saved to {}", pdf.display()),
        None if !args.no_render => println!("⚠️  PDF conversion failed, see log"),
        None => {}
    }
    if args.report {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    }

    Ok(())
}
