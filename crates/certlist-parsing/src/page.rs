use once_cell::sync::Lazy;
use regex::Regex;

use certlist_core::PageText;

use crate::config::ParsingConfig;

/// Lines of a page lying strictly between the table header and its footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRegion {
    header: usize,
    footer: usize,
}

impl TableRegion {
    /// Returns `None` unless the header comes before the footer.
    pub fn new(header: usize, footer: usize) -> Option<Self> {
        (header < footer).then_some(Self { header, footer })
    }

    pub fn header_index(&self) -> usize {
        self.header
    }

    pub fn footer_index(&self) -> usize {
        self.footer
    }

    /// Number of member rows in the region.
    pub fn len(&self) -> usize {
        self.footer - self.header - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The member rows of `page`, exclusive of both markers.
    pub fn rows<'a>(&self, page: &'a PageText) -> &'a [String] {
        page.lines().get(self.header + 1..self.footer).unwrap_or(&[])
    }
}

/// What one page declares: its county, party and member table, each optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageAnalysis {
    pub county: Option<String>,
    pub party: Option<String>,
    pub table: Option<TableRegion>,
}

static COUNTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)IN\s+THE\s+CITY\s+OF\s+NEW\s+YORK,?\s+([^\n]+?),[^\n]*\bParty").unwrap()
});

static PARTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)duly\s+elected\s+as\s+([^\n]+?)\s+County\s+Committee").unwrap()
});

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Tally\s+Entry\s+Type").unwrap());

static FOOTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Page\s+\d+\s+of\s+\d+").unwrap());

/// Analyze one page with the default patterns.
pub fn analyze_page(page: &PageText) -> PageAnalysis {
    analyze_page_with_config(page, &ParsingConfig::default())
}

pub(crate) fn analyze_page_with_config(page: &PageText, config: &ParsingConfig) -> PageAnalysis {
    let text = page.text();
    PageAnalysis {
        county: capture(&text, config.county_re.as_ref().unwrap_or(&COUNTY_RE)),
        party: capture(&text, config.party_re.as_ref().unwrap_or(&PARTY_RE)),
        table: find_table_region_with_config(page, config),
    }
}

/// County named in the page's locality announcement, if any.
pub fn extract_county(page: &PageText) -> Option<String> {
    capture(&page.text(), &COUNTY_RE)
}

/// Party named in the page's election statement, if any.
pub fn extract_party(page: &PageText) -> Option<String> {
    capture(&page.text(), &PARTY_RE)
}

/// Locate the member table on a page.
///
/// The header is the first line carrying the column labels and the footer is
/// the first "Page N of M" line on the page. Both must exist and the header
/// must come first, otherwise the page has no table.
pub fn find_table_region(page: &PageText) -> Option<TableRegion> {
    find_table_region_with_config(page, &ParsingConfig::default())
}

pub(crate) fn find_table_region_with_config(
    page: &PageText,
    config: &ParsingConfig,
) -> Option<TableRegion> {
    let header_re = config.header_re.as_ref().unwrap_or(&HEADER_RE);
    let footer_re = config.footer_re.as_ref().unwrap_or(&FOOTER_RE);

    let lines = page.lines();
    let header = lines.iter().position(|l| header_re.is_match(l))?;
    let footer = lines.iter().position(|l| footer_re.is_match(l))?;

    TableRegion::new(header, footer)
}

fn capture(text: &str, re: &Regex) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}
