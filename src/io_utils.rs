//! I/O helpers shared by the reader and writer: encoding resolution and
//! detection, delimiter sniffing, and CSV reader/writer construction.
//!
//! - **Encoding**: an explicit label wins; otherwise a byte-order mark, then
//!   strict UTF-8, then the Windows-1252 superset of Latin-1 are tried in turn.
//! - **Delimiter**: an explicit delimiter wins; otherwise `,`, `;`, tab and `|`
//!   are tried on a sample and the one producing the widest consistent
//!   records is kept.
//! - **stdout**: the `-` path convention routes CSV output to standard output.

use std::{
    borrow::Cow,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use itertools::Itertools;
use log::debug;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';
pub const DELIMITER_CANDIDATES: &[u8] = &[b',', b';', b'\t', b'|'];
const DELIMITER_SAMPLE_ROWS: usize = 50;

/// Encodings tried, in order, when the input declares none.
pub fn fallback_encodings() -> [&'static Encoding; 2] {
    [UTF_8, WINDOWS_1252]
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Like [`resolve_encoding`] but `None` when no label was given, leaving
/// detection to [`decode_detect`].
pub fn resolve_optional_encoding(label: Option<&str>) -> Result<Option<&'static Encoding>> {
    label.map(|value| resolve_encoding(Some(value))).transpose()
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Decodes `bytes` using a byte-order mark when present, otherwise the first
/// of [`fallback_encodings`] that decodes without errors.
pub fn decode_detect(bytes: &[u8]) -> Result<(String, &'static Encoding)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let text = decode_strict(&bytes[bom_len..], encoding)
            .ok_or_else(|| anyhow!("Input declares {} but fails to decode", encoding.name()))?;
        return Ok((text.into_owned(), encoding));
    }
    for encoding in fallback_encodings() {
        if let Some(text) = decode_strict(bytes, encoding) {
            debug!("Decoded input as {}", encoding.name());
            return Ok((text.into_owned(), encoding));
        }
    }
    Err(anyhow!(
        "Could not determine the text encoding (tried {})",
        fallback_encodings().iter().map(|e| e.name()).join(", ")
    ))
}

fn decode_strict<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    encoding.decode_without_bom_handling_and_without_replacement(bytes)
}

pub fn delimiter_for_extension(path: &Path) -> Option<u8> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => Some(DEFAULT_TSV_DELIMITER),
        _ => None,
    }
}

/// Picks the candidate delimiter that splits the sample into the most rows
/// agreeing with the header width, preferring wider headers on ties.
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let mut best: Option<(u8, usize, usize)> = None;
    for &candidate in DELIMITER_CANDIDATES {
        let mut reader = open_csv_reader(text.as_bytes(), candidate, false);
        let widths = reader
            .records()
            .take(DELIMITER_SAMPLE_ROWS)
            .map_while(|record| record.ok().map(|r| r.len()))
            .collect::<Vec<_>>();
        let Some(&header_width) = widths.first() else {
            continue;
        };
        if header_width < 2 {
            continue;
        }
        let consistent = widths.iter().filter(|&&w| w == header_width).count();
        debug!(
            "Delimiter '{}' -> width {header_width}, {consistent}/{} consistent row(s){}",
            printable_delimiter(candidate),
            widths.len(),
            if widths.iter().all_equal() { "" } else { " (ragged)" }
        );
        let better = match best {
            None => true,
            Some((_, best_consistent, best_width)) => {
                (consistent, header_width) > (best_consistent, best_width)
            }
        };
        if better {
            best = Some((candidate, consistent, header_width));
        }
    }
    best.map(|(delimiter, _, _)| delimiter)
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    path.and_then(delimiter_for_extension)
        .unwrap_or(DEFAULT_CSV_DELIMITER)
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8, has_headers: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(has_headers)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_writer(
    path: Option<&Path>,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };

    let writer: Box<dyn Write> = if encoding == UTF_8 {
        base
    } else {
        Box::new(TranscodingWriter::new(base, encoding))
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}

/// Buffers UTF-8 output and re-encodes complete sequences into the target encoding.
struct TranscodingWriter<W: Write> {
    inner: W,
    encoding: &'static Encoding,
    buffer: Vec<u8>,
}

impl<W: Write> TranscodingWriter<W> {
    fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            buffer: Vec::new(),
        }
    }

    fn flush_buffer(&mut self, force: bool) -> io::Result<()> {
        let valid_up_to = match std::str::from_utf8(&self.buffer) {
            Ok(_) => self.buffer.len(),
            Err(err) if err.error_len().is_some() => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Invalid UTF-8 sequence in output stream",
                ));
            }
            Err(err) => err.valid_up_to(),
        };
        if valid_up_to > 0 {
            let chunk = self.buffer.drain(..valid_up_to).collect::<Vec<_>>();
            let text = String::from_utf8(chunk)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            self.encode_and_write(&text)?;
        }
        if force && !self.buffer.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Incomplete UTF-8 sequence at end of output stream",
            ));
        }
        Ok(())
    }

    fn encode_and_write(&mut self, text: &str) -> io::Result<()> {
        let (encoded, _output_encoding, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to encode text using {}", self.encoding.name()),
            ));
        }
        self.inner.write_all(encoded.as_ref())
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.flush_buffer(false)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer(true)?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_semicolon_when_commas_live_inside_values() {
        let text = "Nome;Endereco;CPF\nAna;Rua A, 10;123\nBia;Rua B, 20;456\n";
        assert_eq!(sniff_delimiter(text), Some(b';'));
    }

    #[test]
    fn sniffs_tab_and_comma() {
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), Some(b'\t'));
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), Some(b','));
        assert_eq!(sniff_delimiter("single\nvalue\n"), None);
    }

    #[test]
    fn detects_latin1_after_utf8_fails() {
        let bytes = b"Raz\xe3o Social\n";
        let (text, encoding) = decode_detect(bytes).expect("decode");
        assert_eq!(text, "Razão Social\n");
        assert_eq!(encoding, WINDOWS_1252);
    }

    #[test]
    fn honours_utf8_bom() {
        let bytes = "\u{feff}Município".as_bytes();
        let (text, encoding) = decode_detect(bytes).expect("decode");
        assert_eq!(text, "Município");
        assert_eq!(encoding, UTF_8);
    }

    #[test]
    fn transcoding_writer_emits_target_encoding() {
        let mut output = Vec::new();
        {
            let mut writer = TranscodingWriter::new(&mut output, WINDOWS_1252);
            let bytes = "ação".as_bytes();
            writer.write_all(&bytes[..2]).unwrap();
            writer.write_all(&bytes[2..]).unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(output, b"a\xe7\xe3o");
    }

    #[test]
    fn unknown_encoding_label_is_an_error() {
        assert!(resolve_encoding(Some("klingon")).is_err());
        assert_eq!(resolve_optional_encoding(None).unwrap(), None);
        assert_eq!(resolve_optional_encoding(Some("latin1")).unwrap(), Some(WINDOWS_1252));
    }
}
