use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::lists::Site;

/// Parsed records plus the count of lines that did not yield one.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub sites: Vec<Site>,
    pub skipped: usize,
}

/// Parse `stack,name,url[,ignored...]` lines. Fields are comma-split and
/// trimmed; a line is accepted only when the first three fields are all
/// non-empty, extra fields are ignored. Blank lines are dropped without
/// counting as skipped. Embedded commas cannot be quoted or escaped.
/// Malformed or empty input yields zero records, never an error.
pub fn parse_csv(raw: &str) -> ParseReport {
    let mut report = ParseReport::default();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(',').map(str::trim);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(stack), Some(name), Some(url))
                if !stack.is_empty() && !name.is_empty() && !url.is_empty() =>
            {
                report.sites.push(Site {
                    stack: stack.to_string(),
                    name: name.to_string(),
                    url: url.to_string(),
                });
            }
            _ => report.skipped += 1,
        }
    }

    report
}

pub fn read_csv_file(path: &Path) -> Result<ParseReport> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read CSV file {}", path.display()))?;
    Ok(parse_csv(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_line_count_matches_lines_with_three_usable_fields() {
        let report = parse_csv(
            "tech,GitHub,https://github.com\n\n,X,\ndocs,MDN,https://developer.mozilla.org,extra",
        );
        assert_eq!(report.sites.len(), 2);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn blank_and_short_lines_are_skipped() {
        let report = parse_csv("tech,GitHub,https://github.com\n\n,X,");
        assert_eq!(report.sites.len(), 1);
        assert_eq!(
            report.sites[0],
            Site {
                stack: "tech".to_string(),
                name: "GitHub".to_string(),
                url: "https://github.com".to_string(),
            }
        );
        // ",X," carries no usable stack or url, so it is skipped.
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn two_field_line_is_skipped_and_counted() {
        let report = parse_csv("tech,GitHub\nonly-one\n");
        assert!(report.sites.is_empty());
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn fields_are_trimmed_and_extras_ignored() {
        let report = parse_csv("  tech ,  GitHub , https://github.com , note , more ");
        assert_eq!(report.sites.len(), 1);
        let site = &report.sites[0];
        assert_eq!(site.stack, "tech");
        assert_eq!(site.name, "GitHub");
        assert_eq!(site.url, "https://github.com");
    }

    #[test]
    fn empty_input_yields_zero_records() {
        assert!(parse_csv("").sites.is_empty());
        assert!(parse_csv("\n\n\n").sites.is_empty());
    }
}
