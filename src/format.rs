use std::fs::File;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    cli::{FormatArgs, InputArgs},
    io_utils,
    pipeline::{ProcessOptions, process_detailed},
    reader::{self, ReadOptions},
    record::SourceTable,
    table,
    writer::{self, WriteOptions},
};

pub fn execute(args: &FormatArgs) -> Result<()> {
    let profile = args.source.profile.load();
    let output_path = writer::resolve_output_path(args.output.as_deref());
    let writing_to_stdout = io_utils::is_dash(&output_path);
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    info!(
        "Formatting '{}' -> {} (profile '{}')",
        args.source.input.display(),
        if writing_to_stdout {
            "stdout".to_string()
        } else {
            format!("{output_path:?}")
        },
        profile.name
    );

    let source = read_source(&args.source)?;
    let options = ProcessOptions {
        match_policy: args.source.match_policy(),
        unidentified: args.unidentified.into(),
        invalid_documents: args.invalid_documents.into(),
    };
    debug!("Process options: {:?}", options);
    let outcome = process_detailed(&source, &profile.synonyms, &profile.schema, &options)?;

    if args.preview > 0 && !writing_to_stdout {
        print!("{}", table::render_preview(&outcome.output, args.preview));
    }

    writer::write_table(
        &outcome.output,
        &output_path,
        &WriteOptions {
            delimiter: args.output_delimiter,
            encoding: output_encoding,
        },
    )?;

    if let Some(path) = &args.summary_json {
        let file = File::create(path).with_context(|| format!("Creating summary file {path:?}"))?;
        serde_json::to_writer_pretty(file, &outcome.summary)
            .with_context(|| format!("Writing summary JSON to {path:?}"))?;
    }
    info!(
        "Processing complete: {} record(s) formatted",
        outcome.summary.output_rows
    );
    Ok(())
}

/// Reads the input named by the shared input flags.
pub fn read_source(args: &InputArgs) -> Result<SourceTable> {
    let options = ReadOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_optional_encoding(args.input_encoding.as_deref())?,
    };
    Ok(reader::read_path(&args.input, &options)?)
}
