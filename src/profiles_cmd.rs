//! Listing of the compiled-in output profiles.

use anyhow::Result;
use itertools::Itertools;
use log::info;

use crate::{cli::ProfilesArgs, profile, table};

pub fn execute(args: &ProfilesArgs) -> Result<()> {
    match args.profile {
        Some(choice) => {
            let profile = choice.load();
            println!("{} - {}\n", profile.name, profile.description);
            let headers = vec![
                "#".to_string(),
                "field".to_string(),
                "synonyms".to_string(),
            ];
            let rows = profile
                .schema
                .fields()
                .iter()
                .enumerate()
                .map(|(idx, field)| {
                    let synonyms = profile
                        .synonyms
                        .entry(field)
                        .map(|entry| {
                            let mut listed = entry.synonyms.iter().join(", ");
                            if !entry.whole_headers.is_empty() {
                                if !listed.is_empty() {
                                    listed.push_str("; ");
                                }
                                listed.push_str("exact: ");
                                listed.push_str(&entry.whole_headers.iter().join(", "));
                            }
                            listed
                        })
                        .unwrap_or_else(|| derived_note(&profile, field).to_string());
                    vec![(idx + 1).to_string(), field.clone(), synonyms]
                })
                .collect::<Vec<_>>();
            table::print_table(&headers, &rows);
            info!(
                "Listed {} field(s) of profile '{}'",
                rows.len(),
                profile.name
            );
        }
        None => {
            let headers = vec![
                "profile".to_string(),
                "fields".to_string(),
                "description".to_string(),
            ];
            let rows = profile::all()
                .into_iter()
                .map(|profile| {
                    vec![
                        profile.name.to_string(),
                        profile.schema.fields().len().to_string(),
                        profile.description.to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            table::print_table(&headers, &rows);
        }
    }
    Ok(())
}

fn derived_note(profile: &profile::Profile, field: &str) -> &'static str {
    if field == profile.schema.roles().person_type {
        "(derived from the document)"
    } else {
        "(left empty)"
    }
}
