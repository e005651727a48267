//! Header-to-field mapping report for an input file.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    cli::{MappingArgs, ReportFormat},
    format::read_source,
    profile::Profile,
    resolve::{HeaderMatch, resolve_headers, separate_name_fragments},
    table,
};

#[derive(Debug, Serialize)]
pub struct MappingReport {
    pub profile: String,
    pub fields: Vec<HeaderMatch>,
    /// Source headers no field was taken from.
    pub unused_headers: Vec<String>,
}

impl MappingReport {
    pub fn build(headers: &[String], profile: &Profile, matches: Vec<HeaderMatch>) -> Self {
        let unused_headers = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| !matches.iter().any(|m| m.column == Some(*idx)))
            .map(|(_, header)| header.clone())
            .collect();
        Self {
            profile: profile.name.to_string(),
            fields: matches,
            unused_headers,
        }
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.fields
            .iter()
            .map(|m| {
                vec![
                    m.field.clone(),
                    m.header.clone().unwrap_or_else(|| "-".to_string()),
                    m.synonym.clone().unwrap_or_default(),
                ]
            })
            .collect()
    }
}

pub fn execute(args: &MappingArgs) -> Result<()> {
    let profile = args.source.profile.load();
    let source = read_source(&args.source)?;
    let mut matches = resolve_headers(
        source.headers(),
        &profile.synonyms,
        args.source.match_policy(),
    );
    separate_name_fragments(
        source.headers(),
        &profile.synonyms,
        profile.schema.roles(),
        &mut matches,
    );
    let report = MappingReport::build(source.headers(), &profile, matches);

    match args.format {
        ReportFormat::Table => {
            let headers = vec![
                "field".to_string(),
                "source column".to_string(),
                "synonym".to_string(),
            ];
            table::print_table(&headers, &report.rows());
            if !report.unused_headers.is_empty() {
                println!("\nUnused columns: {}", report.unused_headers.iter().join(", "));
            }
        }
        ReportFormat::Yaml => {
            let rendered =
                serde_yaml::to_string(&report).context("Serializing mapping report as YAML")?;
            print!("{rendered}");
        }
        ReportFormat::Json => {
            let rendered = serde_json::to_string_pretty(&report)
                .context("Serializing mapping report as JSON")?;
            println!("{rendered}");
        }
    }
    info!(
        "Mapped {} of {} field(s) from {:?}",
        report.fields.iter().filter(|m| m.is_mapped()).count(),
        report.fields.len(),
        args.source.input
    );
    Ok(())
}
