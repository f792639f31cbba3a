use crate::config::Settings;
use crate::core::classifier::{classify_sheet, SheetMatch};
use crate::core::conformity::{ConformityReport, ConformityStatistics, VerificationMode};
use crate::error::{TegError, TegResult};
use crate::import::{BatchOutcome, CommitStatus, ImportSummary, Importer};
use crate::sink::JsonDirSink;
use crate::types::ProductType;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Institution name given on the command line, or the workbook's file stem
fn institution_for(file: &Path, institution: Option<String>) -> String {
    institution.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

fn print_json<T: Serialize>(value: &T) -> TegResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a percentage for display
fn format_rate(pct: f64) -> String {
    format!("{:.2}%", pct)
}

fn print_summary(summary: &ImportSummary) {
    println!("{}", "📖 Worksheets".bold());
    for sheet in &summary.processed_sheets {
        println!(
            "   {} {} ({} records, {} errors)",
            "✅".green(),
            sheet.to_string().bright_blue(),
            sheet.records,
            sheet.errors
        );
    }
    for warning in &summary.warnings {
        println!("   {} {}", "⚠️ ".yellow(), warning.yellow());
    }
    println!();

    println!("{}", "📊 Records".bold());
    for (product, count) in &summary.by_product {
        if *count > 0 {
            println!("   {:<20} {}", product.label(), count);
        }
    }
    println!("   {:<20} {}\n", "total".bold(), summary.total_lines);

    if summary.error_count > 0 {
        println!(
            "{}",
            format!("❌ {} rows rejected", summary.error_count).bold().red()
        );
    }
    if !summary.errors.is_empty() {
        for error in &summary.errors {
            println!("   {}", error);
        }
        println!();
    }
}

fn print_statistics(statistics: &ConformityStatistics) {
    println!("{}", "🔍 Conformity".bold());
    println!(
        "   {:<20} {:>10} {:>14} {:>8} {:>11}",
        "product", "conformant", "non-conformant", "total", "unverified"
    );
    for (product, counts) in &statistics.by_product {
        println!(
            "   {:<20} {:>10} {:>14} {:>8} {:>11}",
            product.label(),
            counts.conformant,
            counts.non_conformant,
            counts.total,
            counts.unverified
        );
    }
    let global = &statistics.global;
    println!(
        "   {:<20} {:>10} {:>14} {:>8} {:>11}",
        "all".bold(),
        global.conformant,
        global.non_conformant,
        global.total,
        global.unverified
    );
    if global.skipped_zero > 0 {
        println!(
            "   {} records with zero calculated and declared rates left out",
            global.skipped_zero
        );
    }

    let rate = format_rate(global.conformity_rate);
    let rate = if global.non_conformant == 0 {
        rate.bold().green()
    } else {
        rate.bold().yellow()
    };
    println!("\n   Conformity rate: {}\n", rate);
}

/// Execute the preview command
pub fn preview(
    file: PathBuf,
    institution: Option<String>,
    settings: Settings,
    json: bool,
) -> TegResult<()> {
    let institution = institution_for(&file, institution);
    let preview = Importer::new(settings).preview(&file, &institution)?;

    if json {
        return print_json(&preview);
    }

    println!("{}", "🔎 TEG Verify - Preview".bold().green());
    println!("   File:        {}", file.display());
    println!("   Institution: {}\n", institution);
    print_summary(&preview.summary);
    print_statistics(&preview.statistics);
    println!("{}", "📋 Preview only - nothing was stored".yellow());

    Ok(())
}

/// Execute the import command
pub fn import(
    file: PathBuf,
    out: PathBuf,
    institution: Option<String>,
    settings: Settings,
    json: bool,
) -> TegResult<()> {
    let institution = institution_for(&file, institution);
    let mut sink = JsonDirSink::new(&out).map_err(|e| {
        TegError::Config(format!("output directory '{}': {}", out.display(), e))
    })?;

    let report = Importer::new(settings).commit(&file, &institution, &mut sink)?;

    if json {
        print_json(&report)?;
        return report.ensure_persisted();
    }

    println!("{}", "🔥 TEG Verify - Import".bold().green());
    println!("   File:        {}", file.display());
    println!("   Institution: {}", institution);
    println!("   Output:      {}", out.display());
    println!("   Run:         {}\n", report.run_id);
    print_summary(&report.summary);

    println!("{}", "💾 Batches".bold());
    for (product, outcome) in &report.batches {
        match outcome {
            BatchOutcome::Persisted(n) => println!(
                "   {} {:<20} {} records → {}",
                "✅".green(),
                product.label(),
                n,
                sink.path_for(*product).display()
            ),
            BatchOutcome::Failed(message) => println!(
                "   {} {:<20} {}",
                "❌".red(),
                product.label(),
                message.red()
            ),
            BatchOutcome::Skipped => {}
        }
    }
    println!();

    match report.status {
        CommitStatus::Success => println!("{}", "✅ Import Complete!".bold().green()),
        CommitStatus::Partial => println!("{}", "⚠️  Import partially stored".bold().yellow()),
        CommitStatus::Failed => println!("{}", "❌ Import failed".bold().red()),
        CommitStatus::Empty => println!("{}", "❌ Nothing to import".bold().red()),
    }

    report.ensure_persisted()
}

/// Execute the verify command
pub fn verify(
    file: PathBuf,
    institution: Option<String>,
    simplified: bool,
    settings: Settings,
    json: bool,
) -> TegResult<()> {
    let institution = institution_for(&file, institution);
    let mode = if simplified {
        VerificationMode::Simplified
    } else {
        VerificationMode::Batch
    };
    let report = Importer::new(settings).verify(&file, &institution, mode)?;

    if json {
        return print_json(&report);
    }

    println!("{}", "🔍 TEG Verify - Conformity".bold().green());
    println!("   File:      {}", file.display());
    println!(
        "   Mode:      {}",
        match report.mode {
            VerificationMode::Batch => "batch",
            VerificationMode::Simplified => "simplified",
        }
    );
    println!("   Tolerance: {}\n", report.tolerance);

    print_non_conformant(&report);
    print_statistics(&report.statistics);

    Ok(())
}

fn print_non_conformant(report: &ConformityReport) {
    let failures: Vec<_> = report.non_conformant().collect();
    if failures.is_empty() {
        println!("{}", "✅ No non-conformant record\n".green());
        return;
    }

    println!(
        "{}",
        format!("❌ {} non-conformant records", failures.len())
            .bold()
            .red()
    );
    for check in failures {
        if let Some(verdict) = &check.verdict {
            println!(
                "   {} row {:<5} calculated {:>8}  declared {:>8}  gap {:.4}",
                check.origin.sheet.bright_blue(),
                check.origin.row,
                format_rate(verdict.calculated_rate),
                format_rate(verdict.declared_rate * 100.0),
                verdict.difference
            );
        }
    }
    println!();
}

#[derive(Serialize)]
struct Classification {
    sheet: String,
    product: Option<ProductType>,
    detail: String,
}

fn describe(sheet_match: &SheetMatch) -> String {
    match sheet_match {
        SheetMatch::Exact(_) => "exact alias".to_string(),
        SheetMatch::Scored { score, .. } => format!("score {}", score),
        SheetMatch::Ambiguous { candidates, score } => {
            let names: Vec<&str> = candidates.iter().map(|p| p.key()).collect();
            format!("ambiguous at score {}: {}", score, names.join(", "))
        }
        SheetMatch::Unrecognized => "no alias matched".to_string(),
    }
}

/// Execute the classify command
pub fn classify(names: Vec<String>, settings: Settings, json: bool) -> TegResult<()> {
    let results: Vec<Classification> = names
        .into_iter()
        .map(|name| {
            let sheet_match = classify_sheet(&name, &settings.aliases);
            Classification {
                product: sheet_match.product(),
                detail: describe(&sheet_match),
                sheet: name,
            }
        })
        .collect();

    if json {
        return print_json(&results);
    }

    println!(
        "{} (aliases {})\n",
        "🏷️  TEG Verify - Sheet classification".bold().green(),
        settings.aliases.version
    );
    for result in &results {
        match result.product {
            Some(product) => println!(
                "   {} '{}' → {} ({})",
                "✅".green(),
                result.sheet,
                product.to_string().bright_blue(),
                result.detail
            ),
            None => println!(
                "   {} '{}' ({})",
                "⚠️ ".yellow(),
                result.sheet,
                result.detail.yellow()
            ),
        }
    }

    Ok(())
}
