//! XML document format for datasets.
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <anydataset>
//!   <row>
//!     <field name="fieldname1">value of fieldname 1</field>
//!     <field name="fieldname2">value of fieldname 2</field>
//!   </row>
//! </anydataset>
//! ```
//!
//! Rows are the element children of the root named `row`; fields are the
//! `field` children of a row. A field without a `name` attribute makes the
//! whole document malformed. Repeated names inside one row load as a
//! multi-valued field, in document order.

use std::path::Path;

use anydata_error::{AnyDataError, Result};
use anydata_types::Row;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

const ROOT_ELEMENT: &str = "anydataset";
const ROW_ELEMENT: &[u8] = b"row";
const FIELD_ELEMENT: &[u8] = b"field";
const NAME_ATTRIBUTE: &str = "name";

// Element depth of rows and fields below the document root.
const ROW_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;

fn xml_error(err: impl std::fmt::Display) -> AnyDataError {
    AnyDataError::xml(err.to_string())
}

fn field_name(element: &BytesStart<'_>, source: &Path) -> Result<String> {
    let attr = element
        .try_get_attribute(NAME_ATTRIBUTE)
        .map_err(xml_error)?
        .ok_or_else(|| AnyDataError::malformed(source, "field element without a name attribute"))?;
    Ok(attr.unescape_value().map_err(xml_error)?.into_owned())
}

/// Parse a dataset document into accepted rows.
///
/// `source` only labels errors.
pub fn parse_rows(text: &str, source: &Path) -> Result<Vec<Row>> {
    let mut reader = Reader::from_str(text);
    let mut rows = Vec::new();
    let mut depth = 0_usize;
    let mut row: Option<Row> = None;
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(element) => {
                depth += 1;
                let name = element.name();
                if depth == ROW_DEPTH && name.as_ref() == ROW_ELEMENT {
                    row = Some(Row::new());
                } else if depth == FIELD_DEPTH && row.is_some() && name.as_ref() == FIELD_ELEMENT {
                    field = Some((field_name(&element, source)?, String::new()));
                }
            }
            Event::Empty(element) => {
                let name = element.name();
                if depth + 1 == ROW_DEPTH && name.as_ref() == ROW_ELEMENT {
                    rows.push(Row::new());
                } else if depth + 1 == FIELD_DEPTH && name.as_ref() == FIELD_ELEMENT {
                    if let Some(row) = row.as_mut() {
                        row.add_field(&field_name(&element, source)?, "");
                    }
                }
            }
            Event::Text(text) => {
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(data) => {
                if let Some((_, value)) = field.as_mut() {
                    let bytes = data.into_inner();
                    value.push_str(std::str::from_utf8(&bytes).map_err(xml_error)?);
                }
            }
            Event::End(element) => {
                let name = element.name();
                if depth == FIELD_DEPTH && name.as_ref() == FIELD_ELEMENT {
                    if let (Some(row), Some((field_name, value))) = (row.as_mut(), field.take()) {
                        row.add_field(&field_name, value);
                    }
                } else if depth == ROW_DEPTH && name.as_ref() == ROW_ELEMENT {
                    if let Some(mut finished) = row.take() {
                        finished.accept_changes();
                        rows.push(finished);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}

/// Render rows as a dataset document.
pub fn render_rows<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
        .map_err(xml_error)?;

    for row in rows {
        if row.is_empty() {
            writer
                .write_event(Event::Empty(BytesStart::new("row")))
                .map_err(xml_error)?;
            continue;
        }
        writer
            .write_event(Event::Start(BytesStart::new("row")))
            .map_err(xml_error)?;
        for (name, value) in row.fields() {
            for item in value.as_slice() {
                writer
                    .create_element("field")
                    .with_attribute((NAME_ATTRIBUTE, name.as_str()))
                    .write_text_content(BytesText::new(item))
                    .map_err(xml_error)?;
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new("row")))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
        .map_err(xml_error)?;
    String::from_utf8(writer.into_inner())
        .map_err(|err| AnyDataError::internal(format!("rendered XML is not UTF-8: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<anydataset>
  <row>
    <field name="id">1</field>
    <field name="tag">red</field>
    <field name="tag">blue</field>
  </row>
  <row/>
  <row>
    <field name="note">  padded &amp; escaped  </field>
    <field name="empty"/>
    <field name="raw"><![CDATA[<b>bold</b>]]></field>
  </row>
</anydataset>
"#;

    #[test]
    fn parses_rows_and_multi_values() {
        let rows = parse_rows(SAMPLE, Path::new("sample.anydata.xml")).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("id"), Some("1"));
        assert_eq!(rows[0].get_as_array("tag"), ["red", "blue"]);
        assert!(!rows[0].has_changes());
        assert!(rows[1].is_empty());
        assert_eq!(rows[2].get("note"), Some("  padded & escaped  "));
        assert_eq!(rows[2].get("empty"), Some(""));
        assert_eq!(rows[2].get("raw"), Some("<b>bold</b>"));
    }

    #[test]
    fn missing_name_is_malformed() {
        let doc = r#"<anydataset><row><field>x</field></row></anydataset>"#;
        let err = parse_rows(doc, Path::new("bad.anydata.xml")).unwrap_err();
        assert!(matches!(err, AnyDataError::MalformedSource { .. }));
    }

    #[test]
    fn broken_document_is_xml_error() {
        let doc = r#"<anydataset><row><field name="a">x</row></anydataset>"#;
        let err = parse_rows(doc, Path::new("bad.anydata.xml")).unwrap_err();
        assert!(matches!(err, AnyDataError::Xml { .. }));
    }

    #[test]
    fn nested_field_elements_are_ignored() {
        let doc = r#"<anydataset><row><field name="a">1</field><extra><field name="b">2</field></extra></row></anydataset>"#;
        let rows = parse_rows(doc, Path::new("x")).unwrap();
        assert_eq!(rows[0].field_names().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn render_then_parse_keeps_rows() {
        let rows = parse_rows(SAMPLE, Path::new("sample")).unwrap();
        let text = render_rows(&rows).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains(r#"<field name="tag">blue</field>"#));
        let again = parse_rows(&text, Path::new("sample")).unwrap();
        assert_eq!(again, rows);
    }

    #[test]
    fn render_escapes_markup() {
        let row: Row = [("a<b", "1 & 2")].into_iter().collect();
        let text = render_rows([&row]).unwrap();
        assert!(text.contains("a&lt;b"));
        assert!(text.contains("1 &amp; 2"));
    }
}
