use std::io::Write;

use certlist_core::{ExtractionResult, MemberRecord};
use certlist_store::{ListSummary, MemberPage};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the per-document summary line block.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    result: &ExtractionResult,
    color: ColorMode,
) -> std::io::Result<()> {
    let county = result.county.as_deref().unwrap_or("unknown county");
    let party = result.party.as_deref().unwrap_or("unknown party");
    if color.enabled() {
        writeln!(w, "{} ({}, {})", result.source.bold(), county, party)?;
    } else {
        writeln!(w, "{} ({}, {})", result.source, county, party)?;
    }

    let stats = &result.stats;
    let counts = format!(
        "  {} pages, {} with a member table, {} rows",
        stats.pages, stats.pages_with_table, stats.rows_seen
    );
    if color.enabled() {
        writeln!(w, "{}", counts.dimmed())?;
        writeln!(
            w,
            "  {} members, {} vacancies, {} failed rows",
            result.members.len().green(),
            result.vacancies().yellow(),
            if result.failures.is_empty() {
                result.failures.len().green().to_string()
            } else {
                result.failures.len().red().to_string()
            }
        )?;
    } else {
        writeln!(w, "{}", counts)?;
        writeln!(
            w,
            "  {} members, {} vacancies, {} failed rows",
            result.members.len(),
            result.vacancies(),
            result.failures.len()
        )?;
    }
    Ok(())
}

fn member_line(m: &MemberRecord) -> String {
    let petition = m
        .petition_number
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    let tally = m.tally.map(|t| t.to_string()).unwrap_or_default();
    format!(
        "{:>6}  {:<8} {:<28} {:<44} {:>5}  {}",
        petition,
        m.ed_ad,
        m.office_holder,
        m.address.as_deref().unwrap_or(""),
        tally,
        m.entry_type
    )
}

/// Print member rows, vacancies highlighted.
pub fn print_members(
    w: &mut dyn Write,
    members: &[MemberRecord],
    color: ColorMode,
) -> std::io::Result<()> {
    for m in members {
        let line = member_line(m);
        if color.enabled() && m.is_vacancy() {
            writeln!(w, "{}", line.yellow())?;
        } else {
            writeln!(w, "{}", line)?;
        }
    }
    Ok(())
}

/// Print the rows that could not be parsed, with their page and reason.
pub fn print_failures(
    w: &mut dyn Write,
    result: &ExtractionResult,
    color: ColorMode,
) -> std::io::Result<()> {
    if result.failures.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "Failed rows:".red().bold())?;
    } else {
        writeln!(w, "Failed rows:")?;
    }
    for f in &result.failures {
        if color.enabled() {
            writeln!(w, "  page {} [{}] {}", f.page, f.reason.kind().red(), f.reason)?;
            writeln!(w, "    {}", f.line.trim().dimmed())?;
        } else {
            writeln!(w, "  page {} [{}] {}", f.page, f.reason.kind(), f.reason)?;
            writeln!(w, "    {}", f.line.trim())?;
        }
    }
    Ok(())
}

/// Print a full extraction result: summary, members, failures.
pub fn print_result(
    w: &mut dyn Write,
    result: &ExtractionResult,
    color: ColorMode,
) -> std::io::Result<()> {
    print_extraction_summary(w, result, color)?;
    writeln!(w)?;
    print_members(w, &result.members, color)?;
    print_failures(w, result, color)?;
    writeln!(w)?;
    Ok(())
}

/// Print one page of stored members plus a pagination footer.
pub fn print_member_page(
    w: &mut dyn Write,
    page: &MemberPage,
    color: ColorMode,
) -> std::io::Result<()> {
    if page.members.is_empty() {
        writeln!(w, "No members match.")?;
        return Ok(());
    }
    let mut county: Option<&str> = None;
    for m in &page.members {
        if county != Some(m.county.as_str()) {
            let heading = format!("{} ({})", m.county, m.party.as_deref().unwrap_or("?"));
            if color.enabled() {
                writeln!(w, "{}", heading.bold())?;
            } else {
                writeln!(w, "{}", heading)?;
            }
            county = Some(m.county.as_str());
        }
        print_members(w, std::slice::from_ref(m), color)?;
    }

    let footer = format!(
        "Showing {}-{} of {}",
        page.offset + 1,
        page.offset + page.members.len(),
        page.total
    );
    let next = page
        .has_more()
        .then(|| format!(" (next: --offset {})", page.offset + page.members.len()))
        .unwrap_or_default();
    if color.enabled() {
        writeln!(w, "\n{}{}", footer.dimmed(), next.dimmed())?;
    } else {
        writeln!(w, "\n{}{}", footer, next)?;
    }
    Ok(())
}

/// Print imported documents.
pub fn print_lists(w: &mut dyn Write, lists: &[ListSummary], color: ColorMode) -> std::io::Result<()> {
    if lists.is_empty() {
        writeln!(w, "No certified lists imported yet.")?;
        return Ok(());
    }
    for l in lists {
        let id = format!("#{}", l.id);
        let label = format!(
            "{} ({}, {})",
            l.source,
            l.county.as_deref().unwrap_or("unknown county"),
            l.party.as_deref().unwrap_or("unknown party"),
        );
        let counts = format!("{} members, {} failed rows", l.members, l.failures);
        if color.enabled() {
            writeln!(w, "{:>5}  {}  {}", id.cyan(), label, counts.dimmed())?;
        } else {
            writeln!(w, "{:>5}  {}  {}", id, label, counts)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use certlist_core::{ExtractionFailure, ExtractionStats, FailureReason};

    fn result() -> ExtractionResult {
        ExtractionResult {
            county: Some("Queens County".into()),
            party: Some("Democratic".into()),
            members: vec![MemberRecord {
                petition_number: None,
                office: "County Committee".into(),
                ed_ad: "12/25".into(),
                electoral_district: 12,
                assembly_district: 25,
                office_holder: "Vacancy".into(),
                address: None,
                tally: None,
                entry_type: "Uncontested".into(),
                county: "Queens County".into(),
                party: Some("Democratic".into()),
                state: "NY".into(),
                data_source: "queens.pdf".into(),
                vacancy: true,
            }],
            failures: vec![ExtractionFailure {
                page: 3,
                line: "  99  Dog Catcher  1/1  ".into(),
                reason: FailureReason::MissingCountyContext,
            }],
            source: "queens.pdf".into(),
            stats: ExtractionStats {
                pages: 3,
                pages_with_table: 2,
                rows_seen: 2,
                rows_parsed: 1,
                rows_failed: 1,
            },
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> std::io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn plain_result_has_no_escape_codes() {
        let out = render(|w| print_result(w, &result(), ColorMode(false)));
        assert!(!out.contains('\x1b'));
        assert!(out.starts_with("queens.pdf (Queens County, Democratic)"));
        assert!(out.contains("1 members, 1 vacancies, 1 failed rows"));
        assert!(out.contains("page 3 [missing_county_context]"));
        assert!(out.contains("    99  Dog Catcher  1/1\n"));
    }

    #[test]
    fn colored_result_uses_escape_codes() {
        let out = render(|w| print_result(w, &result(), ColorMode(true)));
        assert!(out.contains('\x1b'));
    }

    #[test]
    fn member_page_footer_points_at_next_offset() {
        let page = MemberPage {
            members: result().members,
            total: 4,
            limit: 1,
            offset: 2,
        };
        let out = render(|w| print_member_page(w, &page, ColorMode(false)));
        assert!(out.starts_with("Queens County (Democratic)\n"));
        assert!(out.contains("Showing 3-3 of 4 (next: --offset 3)"));
    }

    #[test]
    fn empty_lists_message() {
        let out = render(|w| print_lists(w, &[], ColorMode(false)));
        assert_eq!(out, "No certified lists imported yet.\n");
    }
}
