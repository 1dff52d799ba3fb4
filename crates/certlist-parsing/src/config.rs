use certlist_core::DEFAULT_STATE;
use certlist_core::config_file::ParsingSection;
use regex::Regex;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T> ListOverride<T> {
    /// Iterate the effective values without cloning them.
    pub fn iter<'a>(&'a self, defaults: &'a [T]) -> Box<dyn Iterator<Item = &'a T> + 'a> {
        match self {
            ListOverride::Default => Box::new(defaults.iter()),
            ListOverride::Replace(v) => Box::new(v.iter()),
            ListOverride::Extend(v) => Box::new(defaults.iter().chain(v.iter())),
        }
    }
}

/// Configuration for the certified list extraction pipeline.
///
/// All regex fields are `Option<Regex>`; `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── page.rs ──
    /// Locality announcement; group 1 captures the county.
    pub(crate) county_re: Option<Regex>,
    /// "duly elected as ... County Committee"; group 1 captures the party.
    pub(crate) party_re: Option<Regex>,
    /// Line that opens the member table.
    pub(crate) header_re: Option<Regex>,
    /// Line that closes the member table ("Page N of M").
    pub(crate) footer_re: Option<Regex>,

    // ── row.rs ──
    /// Patterns a field must match to count as a committee office.
    pub(crate) office_patterns: ListOverride<Regex>,
    /// Office-holder sentinel marking an unfilled seat.
    pub(crate) vacancy_re: Option<Regex>,
    /// State code attached to every record (default: `NY`).
    pub(crate) default_state: String,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            county_re: None,
            party_re: None,
            header_re: None,
            footer_re: None,
            office_patterns: ListOverride::Default,
            vacancy_re: None,
            default_state: DEFAULT_STATE.to_string(),
        }
    }
}

impl ParsingConfig {
    /// Get the state code attached to records.
    pub fn default_state(&self) -> &str {
        &self.default_state
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    county_re: Option<String>,
    party_re: Option<String>,
    header_re: Option<String>,
    footer_re: Option<String>,
    office_patterns: ListOverride<String>,
    vacancy_re: Option<String>,
    default_state: Option<String>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the `[parsing]` section of a config file.
    pub fn from_section(section: &ParsingSection) -> Self {
        let mut builder = Self::new();
        builder.county_re = section.county_pattern.clone();
        builder.party_re = section.party_pattern.clone();
        builder.header_re = section.header_pattern.clone();
        builder.footer_re = section.footer_pattern.clone();
        builder.vacancy_re = section.vacancy_pattern.clone();
        builder.default_state = section.state.clone();
        if let Some(patterns) = &section.office_patterns {
            builder = builder.set_office_patterns(patterns.clone());
        }
        for pattern in section.extra_office_patterns.iter().flatten() {
            builder = builder.add_office_pattern(pattern.clone());
        }
        builder
    }

    // ── Page markers ──

    pub fn county_regex(mut self, pattern: &str) -> Self {
        self.county_re = Some(pattern.to_string());
        self
    }

    pub fn party_regex(mut self, pattern: &str) -> Self {
        self.party_re = Some(pattern.to_string());
        self
    }

    pub fn header_regex(mut self, pattern: &str) -> Self {
        self.header_re = Some(pattern.to_string());
        self
    }

    pub fn footer_regex(mut self, pattern: &str) -> Self {
        self.footer_re = Some(pattern.to_string());
        self
    }

    // ── Row fields ──

    pub fn vacancy_regex(mut self, pattern: &str) -> Self {
        self.vacancy_re = Some(pattern.to_string());
        self
    }

    pub fn set_office_patterns(mut self, patterns: Vec<String>) -> Self {
        self.office_patterns = ListOverride::Replace(patterns);
        self
    }

    /// Add an office pattern. After [`set_office_patterns`](Self::set_office_patterns)
    /// this appends to the replacement list; otherwise it extends the defaults.
    pub fn add_office_pattern(mut self, pattern: String) -> Self {
        match &mut self.office_patterns {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(pattern),
            ListOverride::Default => self.office_patterns = ListOverride::Extend(vec![pattern]),
        }
        self
    }

    pub fn default_state(mut self, state: &str) -> Self {
        self.default_state = Some(state.to_string());
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        let compile_all = |patterns: Vec<String>| -> Result<Vec<Regex>, regex::Error> {
            patterns.iter().map(|p| Regex::new(p)).collect()
        };

        let office_patterns = match self.office_patterns {
            ListOverride::Default => ListOverride::Default,
            ListOverride::Replace(patterns) => ListOverride::Replace(compile_all(patterns)?),
            ListOverride::Extend(patterns) => ListOverride::Extend(compile_all(patterns)?),
        };

        Ok(ParsingConfig {
            county_re: compile(self.county_re)?,
            party_re: compile(self.party_re)?,
            header_re: compile(self.header_re)?,
            footer_re: compile(self.footer_re)?,
            office_patterns,
            vacancy_re: compile(self.vacancy_re)?,
            default_state: self
                .default_state
                .map(|s| s.trim().to_uppercase())
                .unwrap_or_else(|| DEFAULT_STATE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParsingConfig::default();
        assert_eq!(config.default_state(), "NY");
        assert!(config.header_re.is_none());
        assert!(matches!(config.office_patterns, ListOverride::Default));
    }

    #[test]
    fn test_builder_basic() {
        let config = ParsingConfigBuilder::new()
            .default_state(" nj ")
            .footer_regex(r"Sheet \d+")
            .build()
            .unwrap();
        assert_eq!(config.default_state(), "NJ");
        assert!(config.footer_re.is_some());
        assert!(config.county_re.is_none());
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = ParsingConfigBuilder::new().header_regex(r"[invalid").build();
        assert!(result.is_err());

        let result = ParsingConfigBuilder::new()
            .add_office_pattern("(unclosed".to_string())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_add_after_set_appends_to_replacement() {
        let config = ParsingConfigBuilder::new()
            .set_office_patterns(vec!["State Committee".to_string()])
            .add_office_pattern("District Leader".to_string())
            .build()
            .unwrap();
        match config.office_patterns {
            ListOverride::Replace(v) => assert_eq!(v.len(), 2),
            other => panic!("expected Replace, got {:?}", other),
        }
    }

    #[test]
    fn test_from_section() {
        let section = ParsingSection {
            state: Some("ny".to_string()),
            header_pattern: Some(r"Votes\s+Type".to_string()),
            extra_office_patterns: Some(vec!["(?i)State Committee".to_string()]),
            ..Default::default()
        };
        let config = ParsingConfigBuilder::from_section(&section).build().unwrap();
        assert_eq!(config.default_state(), "NY");
        assert!(config.header_re.is_some());
        assert!(matches!(config.office_patterns, ListOverride::Extend(ref v) if v.len() == 1));
    }

    #[test]
    fn test_list_override_iter() {
        let defaults = ["a", "b"];
        let collect = |o: &ListOverride<&'static str>| o.iter(&defaults).copied().collect::<Vec<_>>();

        assert_eq!(collect(&ListOverride::Default), vec!["a", "b"]);
        assert_eq!(collect(&ListOverride::Replace(vec!["x"])), vec!["x"]);
        assert_eq!(collect(&ListOverride::Extend(vec!["c"])), vec!["a", "b", "c"]);
    }
}
