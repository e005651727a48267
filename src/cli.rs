use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::{
    assemble::InvalidDocumentPolicy, dedup::UnidentifiedPolicy, profile, resolve::MatchPolicy,
};

const TROUBLESHOOTING: &str = "\
Common problems:
  1. The CSV file cannot be read:
     - check which separator the file uses (',', ';', tab and '|' are detected)
     - fields containing line breaks must be quoted
     - pass --input-encoding (e.g. latin1) or save the file as .xlsx
  2. Columns are not recognized:
     - the first row must hold the column headers
     - accepted names for the CPF/CNPJ column include 'documento' and 'cpf/cnpj'
     - run `cadastro-formatter mapping -i <file>` to see how headers were matched
  3. Missing data:
     - fields without a matching column are left empty";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Format personal and company registration exports into the standard import layout",
    long_about = None,
    after_help = TROUBLESHOOTING
)]
pub struct Cli {
    /// Also log how headers were matched and documents classified
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,
    /// Only log warnings, such as records without a document being merged
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize, deduplicate and write a CSV or spreadsheet export
    Format(FormatArgs),
    /// Show which source column each canonical field is taken from
    Mapping(MappingArgs),
    /// List the available output profiles and their fields
    Profiles(ProfilesArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ProfileChoice {
    #[default]
    Standard,
    Extended,
}

impl ProfileChoice {
    pub fn load(self) -> profile::Profile {
        match self {
            ProfileChoice::Standard => profile::standard(),
            ProfileChoice::Extended => profile::extended(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum UnidentifiedChoice {
    /// Merge every record without a document into one
    #[default]
    Collapse,
    /// Keep every record without a document
    Keep,
}

impl From<UnidentifiedChoice> for UnidentifiedPolicy {
    fn from(choice: UnidentifiedChoice) -> Self {
        match choice {
            UnidentifiedChoice::Collapse => UnidentifiedPolicy::Collapse,
            UnidentifiedChoice::Keep => UnidentifiedPolicy::Keep,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum InvalidDocumentChoice {
    /// Keep the digits of documents that are neither CPF nor CNPJ
    #[default]
    Keep,
    /// Leave such documents empty
    Blank,
}

impl From<InvalidDocumentChoice> for InvalidDocumentPolicy {
    fn from(choice: InvalidDocumentChoice) -> Self {
        match choice {
            InvalidDocumentChoice::Keep => InvalidDocumentPolicy::Keep,
            InvalidDocumentChoice::Blank => InvalidDocumentPolicy::Blank,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Table,
    Yaml,
    Json,
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input file (.csv, .tsv, .txt, .xlsx, .xls, .ods)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output profile selecting the target columns
    #[arg(short = 'p', long = "profile", value_enum, default_value_t)]
    pub profile: ProfileChoice,
    /// CSV delimiter character (supports ',', 'tab', ';', '|'); detected when omitted
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited input; detected when omitted
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Let each source column feed at most one canonical field
    #[arg(long = "exclusive-headers")]
    pub exclusive_headers: bool,
}

impl InputArgs {
    pub fn match_policy(&self) -> MatchPolicy {
        if self.exclusive_headers {
            MatchPolicy::Exclusive
        } else {
            MatchPolicy::Shared
        }
    }
}

#[derive(Debug, Args)]
pub struct FormatArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Output file; `.csv`/`.tsv` or `-` write delimited text, anything else XLSX
    /// (defaults to dados_pessoais_formatados.xlsx)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter for delimited output (defaults by extension, then ',')
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for delimited output (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// How records without a CPF/CNPJ are deduplicated
    #[arg(long = "unidentified", value_enum, default_value_t)]
    pub unidentified: UnidentifiedChoice,
    /// What to do with documents that have neither 11 nor 14 digits
    #[arg(long = "invalid-documents", value_enum, default_value_t)]
    pub invalid_documents: InvalidDocumentChoice,
    /// Number of formatted rows to print as a preview (0 disables)
    #[arg(long, default_value_t = 5)]
    pub preview: usize,
    /// Write the run summary as JSON to this path
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MappingArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Report format
    #[arg(long = "format", value_enum, default_value_t)]
    pub format: ReportFormat,
}

#[derive(Debug, Args)]
pub struct ProfilesArgs {
    /// Only show this profile, including its synonyms
    #[arg(short = 'p', long = "profile", value_enum)]
    pub profile: Option<ProfileChoice>,
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        "pipe" => Ok(b'|'),
        other if other.len() == 1 && other.is_ascii() => Ok(other.as_bytes()[0]),
        other => Err(format!(
            "Delimiter must be a single ASCII character or one of tab/comma/semicolon/pipe, got '{other}'"
        )),
    }
}
