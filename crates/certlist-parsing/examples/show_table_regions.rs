//! Print what the page analyzer sees on each page of a text dump.
//!
//! Pages are separated by form feeds, as written by `pdftotext -layout`.
//!
//! Usage: cargo run --example show_table_regions -- /path/to/list.txt

use certlist_parsing::{CertifiedListExtractor, PageText};

fn main() {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: show_table_regions <file.txt>");
        std::process::exit(2);
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to read {path}: {e}");
            std::process::exit(1);
        }
    };

    let extractor = CertifiedListExtractor::new();
    for (i, raw) in text.split('\x0c').enumerate() {
        let page = PageText::new(raw);
        let analysis = extractor.analyze_page(&page);

        println!("=== page {} ({} lines)", i + 1, page.lines().len());
        if let Some(county) = &analysis.county {
            println!("  county: {county}");
        }
        if let Some(party) = &analysis.party {
            println!("  party:  {party}");
        }
        match analysis.table {
            Some(region) => {
                println!(
                    "  table:  lines {}..{} ({} rows)",
                    region.header_index() + 1,
                    region.footer_index(),
                    region.len()
                );
                for row in region.rows(&page) {
                    println!("    | {row}");
                }
            }
            None => println!("  table:  none"),
        }
    }
}
