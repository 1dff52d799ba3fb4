use std::io::Write;
use std::path::Path;

use certlist_core::{ExtractionResult, MemberRecord};

use crate::{ExportError, ExportFormat};

/// Write a single document's result in `format`.
pub fn export_result(
    result: &ExtractionResult,
    format: ExportFormat,
    w: &mut dyn Write,
) -> Result<(), ExportError> {
    export_results(std::slice::from_ref(result), format, w)
}

/// Write several documents' results in `format`.
///
/// JSON is an array of results, CSV has one header row followed by every
/// member of every document, text prints one section per document.
pub fn export_results(
    results: &[ExtractionResult],
    format: ExportFormat,
    w: &mut dyn Write,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, results)?;
            writeln!(w)?;
        }
        ExportFormat::Csv => w.write_all(export_csv(results).as_bytes())?,
        ExportFormat::Text => w.write_all(export_text(results).as_bytes())?,
    }
    Ok(())
}

/// Export results to the given path, creating or truncating it.
pub fn export_to_path(
    results: &[ExtractionResult],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    export_results(results, format, &mut file)?;
    file.flush()?;
    Ok(())
}

fn csv_escape(s: &str) -> String {
    if s.contains('"') || s.contains(',') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn opt_num(n: Option<u32>) -> String {
    n.map(|n| n.to_string()).unwrap_or_default()
}

fn export_csv(results: &[ExtractionResult]) -> String {
    let mut out = String::from(
        "Source,County,Party,State,Petition,Office,ED/AD,ED,AD,OfficeHolder,Address,Tally,EntryType,Vacancy\n",
    );
    for m in results.iter().flat_map(|r| &r.members) {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            csv_escape(&m.data_source),
            csv_escape(&m.county),
            csv_escape(m.party.as_deref().unwrap_or("")),
            csv_escape(&m.state),
            opt_num(m.petition_number),
            csv_escape(&m.office),
            csv_escape(&m.ed_ad),
            m.electoral_district,
            m.assembly_district,
            csv_escape(&m.office_holder),
            csv_escape(m.address.as_deref().unwrap_or("")),
            opt_num(m.tally),
            csv_escape(&m.entry_type),
            m.vacancy,
        ));
    }
    out
}

fn member_line(m: &MemberRecord) -> String {
    let petition = m
        .petition_number
        .map(|p| format!("#{p}"))
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!("  {:>6}  {:<8} {}", petition, m.ed_ad, m.office_holder);
    if let Some(address) = &m.address {
        line.push_str(&format!(", {address}"));
    }
    if let Some(tally) = m.tally {
        line.push_str(&format!(" ({tally} votes)"));
    }
    if !m.entry_type.is_empty() {
        line.push_str(&format!(" [{}]", m.entry_type));
    }
    line
}

fn export_text(results: &[ExtractionResult]) -> String {
    let mut out = String::from("Certified List Extraction\n");
    out.push_str(&"=".repeat(60));
    out.push('\n');

    for r in results {
        let title = match (&r.county, &r.party) {
            (Some(county), Some(party)) => format!("{} ({county}, {party})", r.source),
            (Some(county), None) => format!("{} ({county})", r.source),
            _ => r.source.clone(),
        };
        out.push_str(&format!("\n{}\n", title));
        out.push_str(&"-".repeat(title.chars().count()));
        out.push('\n');
        out.push_str(&format!(
            "  {} pages | {} with tables | {} members | {} vacancies | {} failed rows\n\n",
            r.stats.pages,
            r.stats.pages_with_table,
            r.members.len(),
            r.vacancies(),
            r.failures.len(),
        ));

        for m in &r.members {
            out.push_str(&member_line(m));
            out.push('\n');
        }

        if !r.failures.is_empty() {
            out.push_str("\n  Failed rows:\n");
            for f in &r.failures {
                out.push_str(&format!("    page {}: {}\n", f.page, f.reason));
                out.push_str(&format!("      {}\n", f.line.trim()));
            }
        }
    }
    out
}
