//! CPF/CNPJ cleanup and classification.
//!
//! Classification looks at the digit count only: 11 digits is a person (CPF),
//! 14 digits is a company (CNPJ). Check digits are not verified.

use std::fmt;

use serde::Serialize;

pub const PERSON_DIGITS: usize = 11;
pub const COMPANY_DIGITS: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PersonType {
    Person,
    Company,
    Unknown,
}

impl PersonType {
    pub fn from_digit_count(count: usize) -> Self {
        match count {
            PERSON_DIGITS => PersonType::Person,
            COMPANY_DIGITS => PersonType::Company,
            _ => PersonType::Unknown,
        }
    }

    /// Code used by the import layout: `F` (física), `J` (jurídica), empty otherwise.
    pub fn code(self) -> &'static str {
        match self {
            PersonType::Person => "F",
            PersonType::Company => "J",
            PersonType::Unknown => "",
        }
    }
}

impl fmt::Display for PersonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PersonType::Person => "Person",
            PersonType::Company => "Company",
            PersonType::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentClassification {
    pub digits: String,
    pub person_type: PersonType,
}

impl DocumentClassification {
    pub fn unknown() -> Self {
        Self {
            digits: String::new(),
            person_type: PersonType::Unknown,
        }
    }

    /// Digits were found but their count matches neither CPF nor CNPJ.
    pub fn is_invalid_length(&self) -> bool {
        !self.digits.is_empty() && self.person_type == PersonType::Unknown
    }
}

/// Strips every non-digit character and classifies by the remaining length.
///
/// Digits are kept even when the length is not a known document size.
pub fn classify(raw: &str) -> DocumentClassification {
    if raw.trim().is_empty() {
        return DocumentClassification::unknown();
    }
    let digits = raw
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    let person_type = PersonType::from_digit_count(digits.len());
    DocumentClassification {
        digits,
        person_type,
    }
}

pub fn classify_column(values: &[String]) -> Vec<DocumentClassification> {
    values.iter().map(|value| classify(value)).collect()
}
