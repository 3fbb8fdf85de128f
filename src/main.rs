//! Secure PDF redaction CLI.
//!
//! Finds sensitive text, scores it, and permanently removes it from PDF
//! documents, with verification that no residual text remains.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use expunge::{
    ConfidenceScorer, ExpungeResult, MatchStrategy, MatchingConfig, MatchingEngine, MuPdfAccess,
    PageText, PdfAccess, RedactionOptions, RedactionService, SearchTerm,
};

/// PDF Redaction Tool
///
/// Locates sensitive text in PDF documents, scores each match, and
/// securely removes approved matches with verification.
#[derive(Parser)]
#[command(name = "expunge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find and score matches without modifying the document
    Find {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Search terms (can be specified multiple times)
        #[arg(short, long, value_name = "TERM", required = true)]
        term: Vec<String>,

        /// Matching strategy: exact_only, fuzzy_only, hybrid, phonetic
        #[arg(long, default_value = "hybrid")]
        strategy: String,

        /// Fuzzy similarity threshold (0-100)
        #[arg(long, default_value_t = 80.0)]
        threshold: f64,

        /// Emit the match report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find, score, and securely redact matches
    Redact {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Search terms (can be specified multiple times)
        #[arg(short, long, value_name = "TERM", required = true)]
        term: Vec<String>,

        /// Matching strategy: exact_only, fuzzy_only, hybrid, phonetic
        #[arg(long, default_value = "hybrid")]
        strategy: String,

        /// Fuzzy similarity threshold (0-100)
        #[arg(long, default_value_t = 80.0)]
        threshold: f64,

        /// Calibrated confidence (0-1) required for auto-approval
        #[arg(long, default_value_t = 0.85)]
        auto_approve_threshold: f64,
    },

    /// Extract text from a PDF (for debugging and verification)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn parse_strategy(name: &str) -> Result<MatchStrategy> {
    match name {
        "exact_only" => Ok(MatchStrategy::ExactOnly),
        "fuzzy_only" => Ok(MatchStrategy::FuzzyOnly),
        "hybrid" => Ok(MatchStrategy::Hybrid),
        "phonetic" => Ok(MatchStrategy::Phonetic),
        other => anyhow::bail!(
            "unknown strategy '{other}' (expected exact_only, fuzzy_only, hybrid, or phonetic)"
        ),
    }
}

/// Loads page texts from a PDF through the access layer.
fn load_pages(access: &MuPdfAccess) -> ExpungeResult<Vec<PageText>> {
    (1..=access.page_count()?)
        .map(|n| Ok(PageText::new(n, access.extract_text(n, None)?)))
        .collect()
}

/// Runs matching and scoring, returning the scored batch.
fn find_and_score(
    access: &MuPdfAccess,
    terms: &[String],
    strategy: MatchStrategy,
    threshold: f64,
) -> Result<expunge::MatchBatch> {
    let pages = load_pages(access).context("Failed to extract page text")?;

    let engine = MatchingEngine::new(MatchingConfig {
        strategy,
        threshold,
        ..MatchingConfig::default()
    })
    .context("Failed to build matching engine")?;

    let search_terms: Vec<SearchTerm> = terms.iter().map(|t| SearchTerm::new(t.clone())).collect();
    let mut batch = engine.find_matches(&search_terms, &pages);

    let scorer = ConfidenceScorer::default();
    for m in &mut batch.matches {
        scorer.score_and_apply(m, None);
    }

    Ok(batch)
}

fn run_find(
    input: &Path,
    terms: &[String],
    strategy: &str,
    threshold: f64,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let strategy = parse_strategy(strategy)?;
    let access = MuPdfAccess::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let batch = find_and_score(&access, terms, strategy, threshold)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&batch.matches)?);
        return Ok(());
    }

    for m in &batch.matches {
        println!(
            "page {:>3}  {:5.1}%  [{}]  \"{}\"",
            m.page_number,
            m.final_confidence.unwrap_or(0.0) * 100.0,
            m.cluster_id.as_deref().unwrap_or("-"),
            m.matched_text
        );
        if verbose {
            println!("          context: {}", m.context.trim());
        }
    }
    for (term, err) in &batch.errors {
        eprintln!("⚠ term '{term}' failed: {err}");
    }
    println!(
        "{} match(es), {} term error(s)",
        batch.matches.len(),
        batch.errors.len()
    );
    Ok(())
}

fn run_redact(
    input: &Path,
    output: &Path,
    terms: &[String],
    strategy: &str,
    threshold: f64,
    auto_approve_threshold: f64,
    verbose: bool,
) -> Result<()> {
    let strategy = parse_strategy(strategy)?;
    let mut access = MuPdfAccess::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut batch = find_and_score(&access, terms, strategy, threshold)?;

    if batch.matches.is_empty() {
        println!("⚠ No matches found, nothing to redact");
        return Ok(());
    }

    let service = RedactionService::new(RedactionOptions {
        auto_approve_threshold,
        ..RedactionOptions::default()
    });

    let mut plan = service
        .plan(&access, &mut batch.matches)
        .context("Failed to resolve match geometry")?;

    if verbose {
        println!("Input:  {}", input.display());
        println!("Output: {}", output.display());
        println!("Approved: {} record(s)", plan.records.len());
        println!("Needs review: {} match(es)", plan.needs_review.len());
        println!("Dropped (no geometry): {}", plan.dropped);
    }

    if plan.records.is_empty() {
        println!(
            "⚠ No matches met the auto-approve threshold ({} awaiting review)",
            plan.needs_review.len()
        );
        return Ok(());
    }

    let outcome = service
        .redact(&mut access, &mut plan.records, output, |p| {
            MuPdfAccess::open(p)
        })
        .context("Redaction failed")?;

    if verbose {
        let stats = &outcome.statistics;
        println!("\nRedaction Summary:");
        println!("  Matches:            {}", stats.total_matches);
        println!("  Redactions applied: {}", stats.redactions_applied);
        println!("  Pages affected:     {}", stats.pages_affected);
        println!("  Avg confidence:     {:.2}", stats.average_confidence);
        println!("  Processing time:    {:?}", stats.processing_time);
    }

    if outcome.success {
        println!(
            "✓ Redacted and verified {} region(s) → {}",
            outcome.statistics.redactions_applied,
            output.display()
        );
        Ok(())
    } else {
        for failed in &outcome.failed_records {
            eprintln!(
                "✗ residual text in region for '{}' on page {} ({} char(s))",
                failed.matched_text, failed.page_number, failed.residual_chars
            );
        }
        Err(expunge::ExpungeError::VerificationFailure {
            failed_regions: outcome.failed_records.len(),
        }
        .into())
    }
}

fn run_extract(input: &Path, output: Option<&Path>) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let text = expunge::extract_text_from_pdf(input).with_context(|| "Text extraction failed")?;

    if let Some(output_path) = output {
        std::fs::write(output_path, &text)
            .with_context(|| format!("Failed to write to {}", output_path.display()))?;
        println!(
            "✓ Extracted {} characters → {}",
            text.len(),
            output_path.display()
        );
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Find {
            input,
            term,
            strategy,
            threshold,
            json,
        } => run_find(input, term, strategy, *threshold, *json, cli.verbose),
        Commands::Redact {
            input,
            output,
            term,
            strategy,
            threshold,
            auto_approve_threshold,
        } => run_redact(
            input,
            output,
            term,
            strategy,
            *threshold,
            *auto_approve_threshold,
            cli.verbose,
        ),
        Commands::Extract { input, output } => run_extract(input, output.as_deref()),
    }
}
