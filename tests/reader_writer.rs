mod common;

use std::fs;

use cadastro_formatter::{
    ProcessOptions, process, profile,
    reader::{self, ReadOptions},
    record::SourceTable,
    writer::{self, WriteOptions},
};

use common::{CLIENTS_CSV, TestWorkspace, read_delimited};

#[test]
fn semicolon_export_is_detected() {
    let table = reader::read_bytes(CLIENTS_CSV.as_bytes(), "clientes.csv", &ReadOptions::default())
        .expect("read");
    assert_eq!(
        table.headers(),
        &["Nome", "CPF/CNPJ", "E-mail", "Cidade", "UF"]
    );
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.cell(2, 0), Some("ACME LTDA"));
}

#[test]
fn latin1_export_is_decoded() {
    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode("Nome,CPF\nJoão Conceição,123.456.789-09\n");
    let table = reader::read_bytes(&bytes, "clientes.csv", &ReadOptions::default()).expect("read");
    assert_eq!(table.cell(0, 0), Some("João Conceição"));
}

#[test]
fn explicit_delimiter_overrides_detection() {
    let table = reader::read_bytes(
        b"Nome|CPF\nAna|123.456.789-09\n",
        "clientes.txt",
        &ReadOptions {
            delimiter: Some(b'|'),
            encoding: None,
        },
    )
    .expect("read");
    assert_eq!(table.headers(), &["Nome", "CPF"]);
    assert_eq!(table.cell(0, 1), Some("123.456.789-09"));
}

#[test]
fn blank_lines_are_skipped() {
    let table = reader::read_bytes(
        b"Nome,CPF\nAna,123.456.789-09\n,\nBia,98765432100\n",
        "clientes.csv",
        &ReadOptions::default(),
    )
    .expect("read");
    assert_eq!(table.row_count(), 2);
}

fn formatted_clients() -> cadastro_formatter::record::OutputTable {
    let source = reader::read_bytes(CLIENTS_CSV.as_bytes(), "clientes.csv", &ReadOptions::default())
        .expect("read");
    let profile = profile::standard();
    process(
        &source,
        &profile.synonyms,
        &profile.schema,
        &ProcessOptions::default(),
    )
    .expect("process")
}

#[test]
fn workbook_output_reads_back_as_text() {
    let output = formatted_clients();
    let bytes = writer::to_xlsx_bytes(&output).expect("workbook");
    let table: SourceTable =
        reader::read_bytes(&bytes, writer::DEFAULT_OUTPUT_NAME, &ReadOptions::default())
            .expect("read workbook");

    assert_eq!(table.headers(), output.fields());
    assert_eq!(table.row_count(), output.len());
    let cpf = output.field_index("cpf").expect("cpf");
    // digits stay text, leading zeros included
    assert_eq!(table.cell(1, cpf), Some("12345678000195"));
    let email = output.field_index("email").expect("email");
    assert_eq!(table.cell(0, email), Some("maria@example.com"));
}

#[test]
fn spreadsheet_birth_dates_stay_dates() {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Nome").expect("header");
    worksheet.write_string(0, 1, "CPF").expect("header");
    worksheet.write_string(0, 2, "Data de Nascimento").expect("header");
    worksheet.write_string(1, 0, "Ana Souza").expect("cell");
    worksheet.write_string(1, 1, "123.456.789-09").expect("cell");
    let birth = ExcelDateTime::from_ymd(1991, 1, 1).expect("date");
    worksheet
        .write_datetime_with_format(1, 2, &birth, &date_format)
        .expect("date cell");
    let bytes = workbook.save_to_buffer().expect("workbook");

    let source = reader::read_bytes(&bytes, "clientes.xlsx", &ReadOptions::default()).expect("read");
    assert_eq!(source.cell(0, 2), Some("01/01/1991"));

    let profile = profile::extended();
    let output = process(
        &source,
        &profile.synonyms,
        &profile.schema,
        &ProcessOptions::default(),
    )
    .expect("process");
    assert_eq!(output.value(0, "data_nascimento"), Some("01/01/1991"));
}

#[test]
fn delimited_output_honours_encoding_and_delimiter() {
    let workspace = TestWorkspace::new();
    let path = workspace.file("saida.txt");
    let source = SourceTable::from_strings(["Nome", "CPF"], [["João", "123.456.789-09"]]);
    let profile = profile::standard();
    let output = process(
        &source,
        &profile.synonyms,
        &profile.schema,
        &ProcessOptions::default(),
    )
    .expect("process");

    writer::write_table(
        &output,
        &path,
        &WriteOptions {
            delimiter: Some(b';'),
            encoding: encoding_rs::WINDOWS_1252,
        },
    )
    .expect("write");

    let bytes = fs::read(&path).expect("read back");
    let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(&bytes);
    assert!(!had_errors);
    assert!(!bytes.windows(2).any(|pair| pair == "ã".as_bytes()));
    let (headers, rows) = read_delimited(&decoded, b';');
    let name = headers.iter().position(|h| h == "razao_social").unwrap();
    assert_eq!(rows[0][name], "João");
}
