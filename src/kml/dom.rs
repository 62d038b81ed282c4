//! Minimal element tree built from quick-xml events.
//!
//! KML parsing needs two passes over the document (styles may be referenced
//! before they are defined), so the reader first materializes the elements it
//! cares about into this tree. Names are stored without namespace prefixes.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::util::{local_name, resolve_entity};

/// An XML element with its attributes, child elements, and direct text.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated text and CDATA directly inside this element.
    pub text: String,
}

impl Element {
    fn from_start(e: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(local_name(e.name().as_ref())).into_owned();
        let attributes = e
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).into_owned();
                let raw = String::from_utf8_lossy(&attr.value).into_owned();
                let value = match quick_xml::escape::unescape(&raw) {
                    Ok(v) => v.into_owned(),
                    Err(_) => raw,
                };
                (key, value)
            })
            .collect();
        Self {
            name,
            attributes,
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children named `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first direct child named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }

    /// First descendant named `name`, depth first.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant named `name`, in document order.
    pub fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.find_all(name, out);
        }
    }
}

/// Parse a complete XML document and return its root element.
///
/// Fails on malformed XML, on a missing root, and on unclosed elements.
pub fn parse_document(content: &str) -> Result<Element> {
    // Text is kept untrimmed here: trimming per event would eat the spaces
    // around entity references. Callers trim when reading values.
    let mut reader = Reader::from_str(content);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(Error::MalformedDocument(
                        "content after the root element".into(),
                    ));
                }
                stack.push(Element::from_start(&e));
            }
            Event::Empty(e) => {
                let element = Element::from_start(&e);
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    Error::MalformedDocument("unexpected closing tag".into())
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if let Some(current) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        current.text.push_str(&resolved);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::MalformedDocument(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| Error::MalformedDocument("no root element".into()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(Error::MalformedDocument(
                "more than one root element".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let root = parse_document(
            r#"<?xml version="1.0"?>
            <kml:kml xmlns:kml="http://www.opengis.net/kml/2.2">
              <kml:Document id="d&amp;1">
                <name>Caf&#233; &amp; bar</name>
                <description><![CDATA[<b>bold</b>]]></description>
                <Placemark/>
              </kml:Document>
            </kml:kml>"#,
        )
        .unwrap();

        assert_eq!(root.name, "kml");
        let doc = root.child("Document").unwrap();
        assert_eq!(doc.attr("id"), Some("d&1"));
        assert_eq!(doc.child_text("name"), Some("Café & bar"));
        assert_eq!(doc.child_text("description"), Some("<b>bold</b>"));
        assert_eq!(doc.children_named("Placemark").count(), 1);
        assert!(root.find("Placemark").is_some());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_document("").is_err());
        assert!(parse_document("<kml><Document></kml>").is_err());
        assert!(parse_document("<kml>").is_err());
        assert!(parse_document("<a/><b/>").is_err());
    }

    #[test]
    fn test_find_all_in_document_order() {
        let root =
            parse_document("<a><Style id='1'/><b><Style id='2'/></b><Style id='3'/></a>").unwrap();
        let mut out = Vec::new();
        root.find_all("Style", &mut out);
        let ids: Vec<_> = out.iter().filter_map(|e| e.attr("id")).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
