#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

pub fn t(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

pub fn n(v: f64) -> Cell {
    Cell::Number(v)
}

pub struct SheetFixture {
    pub name: String,
    /// Index 0 is spreadsheet row `first_row`.
    pub rows: Vec<Vec<Cell>>,
    /// 1-based spreadsheet row of `rows[0]`.
    pub first_row: usize,
}

impl SheetFixture {
    pub fn new(name: &str, rows: Vec<Vec<Cell>>) -> Self {
        Self { name: name.to_string(), rows, first_row: 1 }
    }

    pub fn starting_at(mut self, first_row: usize) -> Self {
        self.first_row = first_row;
        self
    }
}

const CONTENT_TYPES_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

/// Writes a minimal but valid xlsx package with inline-string cells.
pub fn build_xlsx(sheets: &[SheetFixture]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut content_types = String::from(CONTENT_TYPES_HEAD);
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut workbook_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );

    for (idx, sheet) in sheets.iter().enumerate() {
        let number = idx + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            number
        ));
        workbook.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(&sheet.name),
            number,
            number
        ));
        workbook_rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            number, number
        ));
    }
    content_types.push_str("</Types>");
    workbook.push_str("</sheets></workbook>");
    workbook_rels.push_str("</Relationships>");

    write_part(&mut zip, "[Content_Types].xml", &content_types, options);
    write_part(&mut zip, "_rels/.rels", ROOT_RELS, options);
    write_part(&mut zip, "xl/workbook.xml", &workbook, options);
    write_part(&mut zip, "xl/_rels/workbook.xml.rels", &workbook_rels, options);
    for (idx, sheet) in sheets.iter().enumerate() {
        let path = format!("xl/worksheets/sheet{}.xml", idx + 1);
        write_part(&mut zip, &path, &worksheet_xml(sheet), options);
    }

    zip.finish().expect("finish xlsx archive").into_inner()
}

fn write_part(zip: &mut ZipWriter<Cursor<Vec<u8>>>, path: &str, body: &str, options: SimpleFileOptions) {
    zip.start_file(path, options).expect("start zip entry");
    zip.write_all(body.as_bytes()).expect("write zip entry");
}

fn worksheet_xml(sheet: &SheetFixture) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    for (offset, cells) in sheet.rows.iter().enumerate() {
        let row_number = sheet.first_row + offset;
        xml.push_str(&format!(r#"<row r="{}">"#, row_number));
        for (col, cell) in cells.iter().enumerate() {
            let reference = format!("{}{}", column_letters(col), row_number);
            match cell {
                Cell::Text(s) => xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    reference,
                    escape(s)
                )),
                Cell::Number(v) => {
                    xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, v))
                }
                Cell::Bool(b) => xml.push_str(&format!(
                    r#"<c r="{}" t="b"><v>{}</v></c>"#,
                    reference,
                    u8::from(*b)
                )),
                Cell::Empty => {}
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_letters(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
