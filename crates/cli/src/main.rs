//! CLI tool for filling PowerPoint templates from CSV data.

use anyhow::{Context, Result};
use clap::Parser;
use deckfill_core::{DataIndex, FillOptions, PlaceholderReport};
use deckfill_pptx::{Deck, DeckWalker};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Fill `{{token}}` placeholders in a PowerPoint template with values and
/// images from a CSV file.
#[derive(Parser, Debug)]
#[command(name = "deckfill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Template presentation (.pptx)
    template: PathBuf,

    /// CSV file with slide_num, placeholder and value columns
    #[arg(short, long, required_unless_present = "list_placeholders")]
    data: Option<PathBuf>,

    /// Output file (default: <template>_output.pptx next to the template)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the native placeholders of every slide
    #[arg(long)]
    list_placeholders: bool,

    /// Print the placeholder listing as JSON
    #[arg(long, requires = "list_placeholders")]
    json: bool,

    /// Directory relative image paths are resolved against
    #[arg(long)]
    image_root: Option<PathBuf>,

    /// CSV field delimiter (a single character, or "tab")
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Fill the template but do not write the output
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let mut deck = Deck::open(&args.template)
        .with_context(|| format!("Failed to open template {}", args.template.display()))?;
    let walker = DeckWalker::new(fill_options(args));

    if args.list_placeholders {
        let reports = walker
            .discover(&deck)
            .context("Failed to list placeholders")?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            print!("{}", format_reports(&reports));
        }
    }

    let Some(data) = &args.data else {
        return Ok(());
    };

    let index = DataIndex::from_path(data, walker.options())
        .with_context(|| format!("Failed to read data from {}", data.display()))?;
    if args.verbose {
        eprintln!("Loaded data for {} slide(s)", index.len());
    }

    let summary = walker
        .substitute(&mut deck, &index)
        .context("Failed to fill template")?;
    if args.verbose {
        eprintln!(
            "  Filled {} slide(s): {} token(s), {} image(s), {} link(s)",
            summary.slides_visited, summary.tokens_replaced, summary.images_swapped, summary.links_rewritten
        );
    }

    if args.dry_run {
        if args.verbose {
            eprintln!("Dry run, output not written");
        }
        return Ok(());
    }

    let output_path = get_output_path(&args.template, args.output.as_deref());
    deck.save(&output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    if args.verbose {
        eprintln!("Written to: {}", output_path.display());
    }

    Ok(())
}

fn fill_options(args: &Args) -> FillOptions {
    let options = FillOptions::new().with_delimiter(args.delimiter);
    match &args.image_root {
        Some(root) => options.with_image_root(root),
        None => options,
    }
}

/// Parse a delimiter argument into a single byte.
fn parse_delimiter(value: &str) -> std::result::Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(format!("delimiter must be a single ASCII character, got '{}'", value)),
        },
    }
}

/// Render the placeholder listing, grouped by slide.
fn format_reports(reports: &[PlaceholderReport]) -> String {
    let mut out = String::new();
    let mut current = None;
    for report in reports {
        if current != Some(report.slide_number) {
            let _ = writeln!(out, "Slide {}:", report.slide_number);
            current = Some(report.slide_number);
        }
        let _ = writeln!(out, "  Placeholder {} - {}", report.idx, report.placeholder_type);
    }
    out
}

/// Determine the output path for a filled template.
fn get_output_path(template: &Path, output: Option<&Path>) -> PathBuf {
    if let Some(path) = output {
        return path.to_path_buf();
    }

    let stem = template
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let output_filename = format!("{}_output.pptx", stem);

    match template.parent() {
        Some(parent) => parent.join(output_filename),
        None => PathBuf::from(output_filename),
    }
}
