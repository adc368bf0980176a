use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use docmatch_core::{DocumentPair, ReconcileConfig, Reconciler, ReconciliationReport};

#[derive(Parser)]
#[command(name = "docmatch")]
#[command(about = "Match formulas between a rendered page layout and its document object tree")]
struct Args {
    /// Path to the JSON document pair (pages with fragments + tree paragraphs)
    #[arg(short, long)]
    input: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Log per-candidate scores and filter decisions
    #[arg(short, long)]
    verbose: bool,

    /// Print the default configuration as YAML and exit
    #[arg(long)]
    show_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if args.show_config {
        print!("{}", ReconcileConfig::default().to_yaml()?);
        return Ok(());
    }

    println!("🦀 Docmatch Formula Reconciler");

    let Some(input) = args.input.as_deref() else {
        println!("⚠️  No input given. Use --input <pair.json> or --show-config.");
        return Ok(());
    };

    if !Path::new(input).exists() {
        println!("⚠️  Input document pair not found at: {}", input);
        println!("   Please check the file path.");
        return Ok(());
    }

    let config = ReconcileConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    println!("📄 Processing: {}", input);

    match run(input, config, args.profile) {
        Ok(report) => {
            print_summary(&report);

            let output_path = args
                .output
                .clone()
                .unwrap_or_else(|| default_output_path(input, args.config.as_deref()));
            report.save_to_json(&output_path)?;
            println!("💾 Report saved to: {}", output_path);
        }
        Err(e) => {
            eprintln!("❌ Processing failed: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn load_pair(path: &str) -> Result<DocumentPair> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid document pair JSON in {path}"))
}

fn run(input: &str, config: ReconcileConfig, profile: bool) -> Result<ReconciliationReport> {
    let pair = load_pair(input)?;
    let reconciler = Reconciler::new(config)?;
    Ok(reconciler.reconcile_with_profiling(&pair, profile))
}

fn default_output_path(input: &str, config: Option<&str>) -> String {
    let input_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let config_suffix = config
        .and_then(|p| Path::new(p).file_stem())
        .and_then(|s| s.to_str())
        .map(|s| format!("_{s}"))
        .unwrap_or_default();
    format!("{input_name}{config_suffix}_docmatch.json")
}

fn print_summary(report: &ReconciliationReport) {
    let summary = &report.summary;
    println!("✅ Reconciliation finished (run {})", report.run_id);
    println!("📊 Formulas:");
    println!(
        "   - Layout: {} ({} compliant, {} filtered as non-formula)",
        summary.layout_formulas, summary.compliant_layout_formulas, summary.filtered_layout
    );
    println!("   - Object tree: {}", summary.tree_formulas);
    println!(
        "🔗 Matched: {} (exact {}, fuzzy {}, positional {})",
        summary.matched(),
        summary.exact_matches,
        summary.fuzzy_matches,
        summary.positional_matches
    );
    if summary.unmatched_layout > 0 || summary.unmatched_tree > 0 {
        println!(
            "⚠️  Unmatched: {} layout, {} object tree",
            summary.unmatched_layout, summary.unmatched_tree
        );
    }
    if summary.matched() == 0 && (summary.layout_formulas > 0 || summary.tree_formulas > 0) {
        println!("⚠️  No formulas could be paired; annotations cannot be placed");
    }

    if summary.layout_images > 0 || summary.tree_images > 0 {
        println!(
            "🖼️  Images: {} layout, {} object tree, {} paired by order",
            summary.layout_images, summary.tree_images, summary.image_matches
        );
    }

    println!("📝 Annotations: {}", summary.annotations);
    for annotation in &report.annotations {
        println!("   ¶{}: {}", annotation.paragraph_index, annotation.message);
    }
}
