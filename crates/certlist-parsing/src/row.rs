use once_cell::sync::Lazy;
use regex::Regex;

use certlist_core::{MemberRecord, RowField, RowParseError};

use crate::config::ParsingConfig;

/// Columns are separated by two or more whitespace characters. A single space
/// never separates fields, so names and addresses keep their inner spaces.
static FIELD_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

static DISTRICT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s*/\s*(\d+)$").unwrap());

static VACANCY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^vacancy\b").unwrap());

static DEFAULT_OFFICE_RES: Lazy<Vec<Regex>> =
    Lazy::new(|| vec![Regex::new(r"(?i)County\s+Committee").unwrap()]);

/// Split a row into its whitespace-delimited columns.
///
/// Trailing whitespace is ignored and a leading empty field (from leading
/// indentation) is dropped.
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = FIELD_SPLIT_RE
        .split(line.trim_end())
        .map(str::trim)
        .collect();
    if fields.first() == Some(&"") {
        fields.remove(0);
    }
    fields
}

/// Left-to-right cursor over the columns of one row.
struct Fields<'a> {
    fields: Vec<&'a str>,
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            fields: split_fields(line),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.fields.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let field = self.peek()?;
        self.pos += 1;
        Some(field)
    }

    /// Consume the next field only if `accept` holds for it.
    fn next_if(&mut self, accept: impl Fn(&str) -> bool) -> Option<&'a str> {
        match self.peek() {
            Some(field) if accept(field) => self.next(),
            _ => None,
        }
    }

    fn rest(&self) -> &[&'a str] {
        self.fields.get(self.pos..).unwrap_or(&[])
    }
}

/// Parse one member row with the default patterns.
///
/// `county` comes from the page context; this function never infers it.
pub fn parse_member_row(line: &str, county: &str) -> Result<MemberRecord, RowParseError> {
    parse_member_row_with_config(line, county, &ParsingConfig::default())
}

/// Config-aware version of [`parse_member_row`].
///
/// Fields are consumed strictly in printed order; each must pass its check
/// before the next is looked at, since a wrong guess early on shifts every
/// later column:
///
/// 1. optional petition number (positive integer)
/// 2. office (must match an office pattern)
/// 3. `ED/AD`
/// 4. office holder; unless it is the vacancy sentinel, followed by the
///    address (free text) and the tally (plain integer)
/// 5. entry type, if anything is left
pub(crate) fn parse_member_row_with_config(
    line: &str,
    county: &str,
    config: &ParsingConfig,
) -> Result<MemberRecord, RowParseError> {
    let county = county.trim();
    if county.is_empty() {
        return Err(RowParseError::MissingCounty {
            line: line.to_string(),
        });
    }

    let mut fields = Fields::new(line);

    let petition_number = fields
        .next_if(|f| INTEGER_RE.is_match(f) && f.parse::<u32>().is_ok_and(|n| n > 0))
        .and_then(|f| f.parse().ok());

    let office = fields
        .next_if(|f| is_office(f, config))
        .ok_or_else(|| RowParseError::OfficeFieldInvalid {
            found: fields.peek().map(str::to_string),
            line: line.to_string(),
        })?;

    let district_error = |found: Option<&str>| RowParseError::DistrictFieldInvalid {
        found: found.map(str::to_string),
        line: line.to_string(),
    };
    let ed_ad = fields.next().ok_or_else(|| district_error(None))?;
    let (electoral_district, assembly_district) =
        parse_district(ed_ad).ok_or_else(|| district_error(Some(ed_ad)))?;

    let vacancy_re = config.vacancy_re.as_ref().unwrap_or(&VACANCY_RE);
    let shape_error = |expected: RowField| RowParseError::UnexpectedFieldShape {
        expected,
        line: line.to_string(),
    };

    let (office_holder, address, tally, vacancy) =
        if let Some(holder) = fields.next_if(|f| vacancy_re.is_match(f)) {
            (holder, None, None, true)
        } else {
            let holder = fields
                .next()
                .ok_or_else(|| shape_error(RowField::OfficeHolder))?;
            let address = fields.next().ok_or_else(|| shape_error(RowField::Address))?;
            let tally_field = fields.next();
            let tally = tally_field
                .filter(|f| INTEGER_RE.is_match(f))
                .and_then(|f| f.parse::<u32>().ok())
                .ok_or_else(|| RowParseError::TallyFieldInvalid {
                    found: tally_field.map(str::to_string),
                    line: line.to_string(),
                })?;
            (holder, Some(address.to_string()), Some(tally), false)
        };

    let entry_type = fields.next().unwrap_or_default();
    if !fields.rest().is_empty() {
        tracing::debug!(ignored = ?fields.rest(), line, "ignoring fields after entry type");
    }

    Ok(MemberRecord {
        petition_number,
        office: office.to_string(),
        ed_ad: ed_ad.to_string(),
        electoral_district,
        assembly_district,
        office_holder: office_holder.to_string(),
        address,
        tally,
        entry_type: entry_type.to_string(),
        county: county.to_string(),
        party: None,
        state: config.default_state.clone(),
        data_source: String::new(),
        vacancy,
    })
}

fn is_office(field: &str, config: &ParsingConfig) -> bool {
    config
        .office_patterns
        .iter(&DEFAULT_OFFICE_RES)
        .any(|re| re.is_match(field))
}

/// Split `ED/AD` into two positive district numbers.
fn parse_district(field: &str) -> Option<(u32, u32)> {
    let caps = DISTRICT_RE.captures(field)?;
    let ed: u32 = caps[1].parse().ok()?;
    let ad: u32 = caps[2].parse().ok()?;
    (ed > 0 && ad > 0).then_some((ed, ad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParsingConfigBuilder;

    const MICKEY: &str = "633    County Committee   103/76   Mickey Mouse                    1 Epcot Street 21B New York, NY 10000           0              Uncontested";

    #[test]
    fn test_canonical_row() {
        let m = parse_member_row(MICKEY, "Disney County").unwrap();
        assert_eq!(m.petition_number, Some(633));
        assert_eq!(m.office, "County Committee");
        assert_eq!(m.ed_ad, "103/76");
        assert_eq!(m.electoral_district, 103);
        assert_eq!(m.assembly_district, 76);
        assert_eq!(m.office_holder, "Mickey Mouse");
        assert_eq!(
            m.address.as_deref(),
            Some("1 Epcot Street 21B New York, NY 10000")
        );
        assert_eq!(m.tally, Some(0));
        assert_eq!(m.entry_type, "Uncontested");
        assert_eq!(m.county, "Disney County");
        assert_eq!(m.state, "NY");
        assert_eq!(m.party, None);
        assert!(!m.is_vacancy());
    }

    #[test]
    fn test_single_spaces_never_split() {
        let fields = split_fields("County Committee  1/2  Mary Ann Van Buren  12 W 4th St Apt 3 New York, NY 10012  17  Contested");
        assert_eq!(
            fields,
            vec![
                "County Committee",
                "1/2",
                "Mary Ann Van Buren",
                "12 W 4th St Apt 3 New York, NY 10012",
                "17",
                "Contested",
            ]
        );
    }

    #[test]
    fn test_leading_and_trailing_whitespace() {
        let line = "     County Committee   5/65   Jane Roe   10 Pike St New York, NY 10002   42   Uncontested    ";
        let m = parse_member_row(line, "New York County").unwrap();
        assert_eq!(m.petition_number, None);
        assert_eq!(m.office_holder, "Jane Roe");
        assert_eq!(m.tally, Some(42));
        assert_eq!(m.entry_type, "Uncontested");
    }

    #[test]
    fn test_tab_runs_delimit() {
        let line = "12\t\tCounty Committee\t\t7/74\t\tJohn Doe\t\t1 Main St\t\t3\t\tContested";
        let m = parse_member_row(line, "Kings County").unwrap();
        assert_eq!(m.petition_number, Some(12));
        assert_eq!(m.address.as_deref(), Some("1 Main St"));
        assert_eq!(m.tally, Some(3));
    }

    #[test]
    fn test_vacancy_has_no_address_or_tally() {
        let line = "County Committee   103/76   Vacancy                Uncontested";
        let m = parse_member_row(line, "Disney County").unwrap();
        assert!(m.is_vacancy());
        assert_eq!(m.office_holder, "Vacancy");
        assert_eq!(m.address, None);
        assert_eq!(m.tally, None);
        assert_eq!(m.entry_type, "Uncontested");
    }

    #[test]
    fn test_vacancy_is_case_insensitive() {
        let m = parse_member_row("County Committee   1/65   VACANCY", "New York County").unwrap();
        assert!(m.is_vacancy());
        assert_eq!(m.entry_type, "");
    }

    #[test]
    fn test_holder_containing_vacancy_word_is_not_sentinel() {
        let line = "County Committee   1/65   Ann Vacancy-Smith   2 Elm St   4   Contested";
        // Only a holder field starting with the sentinel counts as a vacancy.
        let m = parse_member_row(line, "New York County").unwrap();
        assert!(!m.is_vacancy());
        assert_eq!(m.tally, Some(4));
    }

    #[test]
    fn test_non_numeric_tally_fails() {
        let line = "633   County Committee   103/76   Mickey Mouse   1 Epcot Street   Uncontested";
        let err = parse_member_row(line, "Disney County").unwrap_err();
        assert_eq!(
            err,
            RowParseError::TallyFieldInvalid {
                found: Some("Uncontested".to_string()),
                line: line.to_string(),
            }
        );
    }

    #[test]
    fn test_missing_tally_fails() {
        let line = "County Committee   103/76   Mickey Mouse   1 Epcot Street";
        let err = parse_member_row(line, "Disney County").unwrap_err();
        assert!(matches!(err, RowParseError::TallyFieldInvalid { found: None, .. }));
    }

    #[test]
    fn test_invalid_office() {
        let line = "633   Judge of the Civil Court   103/76   Mickey Mouse   1 Epcot St   0   Uncontested";
        let err = parse_member_row(line, "Disney County").unwrap_err();
        match err {
            RowParseError::OfficeFieldInvalid { found, line: l } => {
                assert_eq!(found.as_deref(), Some("Judge of the Civil Court"));
                assert_eq!(l, line);
            }
            other => panic!("expected OfficeFieldInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_petition_only_row_fails_on_office() {
        let err = parse_member_row("633", "Disney County").unwrap_err();
        assert!(matches!(err, RowParseError::OfficeFieldInvalid { found: None, .. }));
    }

    #[test]
    fn test_zero_petition_is_not_a_petition_number() {
        let line = "0   County Committee   1/2   Jane Roe   5 Oak St   9   Contested";
        let err = parse_member_row(line, "Kings County").unwrap_err();
        assert!(matches!(
            err,
            RowParseError::OfficeFieldInvalid { found: Some(ref f), .. } if f == "0"
        ));
    }

    #[test]
    fn test_invalid_district() {
        let line = "County Committee   ED 103   Mickey Mouse   1 Epcot St   0   Uncontested";
        let err = parse_member_row(line, "Disney County").unwrap_err();
        assert_eq!(err.field(), Some(RowField::District));
        assert!(matches!(
            err,
            RowParseError::DistrictFieldInvalid { found: Some(ref f), .. } if f == "ED 103"
        ));
    }

    #[test]
    fn test_zero_district_is_invalid() {
        let line = "County Committee   0/76   Mickey Mouse   1 Epcot St   0   Uncontested";
        let err = parse_member_row(line, "Disney County").unwrap_err();
        assert!(matches!(err, RowParseError::DistrictFieldInvalid { .. }));
    }

    #[test]
    fn test_missing_district() {
        let err = parse_member_row("County Committee", "Disney County").unwrap_err();
        assert!(matches!(err, RowParseError::DistrictFieldInvalid { found: None, .. }));
    }

    #[test]
    fn test_missing_holder_and_address() {
        let err = parse_member_row("County Committee   1/2", "Disney County").unwrap_err();
        assert_eq!(err.field(), Some(RowField::OfficeHolder));

        let err = parse_member_row("County Committee   1/2   Jane Roe", "Disney County").unwrap_err();
        assert_eq!(err.field(), Some(RowField::Address));
    }

    #[test]
    fn test_missing_county_rejected() {
        let err = parse_member_row(MICKEY, "  ").unwrap_err();
        assert_eq!(err, RowParseError::MissingCounty { line: MICKEY.to_string() });
    }

    #[test]
    fn test_entry_type_optional() {
        let line = "County Committee   2/3   Jane Roe   5 Oak St   9";
        let m = parse_member_row(line, "Queens County").unwrap();
        assert_eq!(m.tally, Some(9));
        assert_eq!(m.entry_type, "");
    }

    #[test]
    fn test_extra_trailing_fields_ignored() {
        let line = "County Committee   2/3   Jane Roe   5 Oak St   9   Contested   Footnote";
        let m = parse_member_row(line, "Queens County").unwrap();
        assert_eq!(m.entry_type, "Contested");
    }

    #[test]
    fn test_extra_field_before_tally_misassigns() {
        // Whitespace-delimited parsing cannot tell an extra free-text column
        // from the tally: the row fails instead of being silently shifted.
        let line = "County Committee   2/3   Jane Roe   5 Oak St   Apt 4   9   Contested";
        let err = parse_member_row(line, "Queens County").unwrap_err();
        assert!(matches!(err, RowParseError::TallyFieldInvalid { found: Some(ref f), .. } if f == "Apt 4"));
    }

    #[test]
    fn test_custom_office_and_state() {
        let config = ParsingConfigBuilder::new()
            .add_office_pattern("(?i)State Committee".to_string())
            .default_state("nj")
            .build()
            .unwrap();
        let line = "State Committee   4/40   Jane Roe   5 Oak St   9   Contested";
        let m = parse_member_row_with_config(line, "Hudson County", &config).unwrap();
        assert_eq!(m.office, "State Committee");
        assert_eq!(m.state, "NJ");

        // Defaults still accepted when extending.
        assert!(parse_member_row_with_config(MICKEY, "Disney County", &config).is_ok());
        // But not by the default config.
        assert!(parse_member_row(line, "Hudson County").is_err());
    }

    #[test]
    fn test_custom_vacancy_sentinel() {
        let config = ParsingConfigBuilder::new()
            .vacancy_regex(r"(?i)^(vacancy|vacant)$")
            .build()
            .unwrap();
        let m = parse_member_row_with_config(
            "County Committee   3/40   Vacant   Uncontested",
            "Bronx County",
            &config,
        )
        .unwrap();
        assert!(m.is_vacancy());
    }
}
