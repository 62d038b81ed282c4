//! Parsed documents and format selection.
//!
//! A [`Document`] is what a codec produces: the feature tree, the styles it
//! references, and the problems recovered from while parsing.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Diagnostic, Error, Result};
use crate::geojson::GeoJsonCodec;
use crate::kml::KmlCodec;
use crate::model::{Feature, FeatureKind, StyleSheet};
use crate::util::decode_text;

/// A text encoding of a feature tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Kml,
    GeoJson,
}

impl Format {
    /// Pick a format from a file extension (`.kml`, `.geojson`, `.json`).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Format> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "kml" => Some(Format::Kml),
            "geojson" | "json" => Some(Format::GeoJson),
            _ => None,
        }
    }

    /// Guess a format from document content: XML starts with `<`, JSON with `{`.
    pub fn detect(content: &[u8]) -> Option<Format> {
        let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
        match content.iter().find(|b| !b.is_ascii_whitespace())? {
            b'<' => Some(Format::Kml),
            b'{' => Some(Format::GeoJson),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Kml => "kml",
            Format::GeoJson => "geojson",
        }
    }

    /// A codec for this format with default configuration.
    pub fn codec(self) -> Box<dyn Codec> {
        match self {
            Format::Kml => Box::new(KmlCodec::new()),
            Format::GeoJson => Box::new(GeoJsonCodec::new()),
        }
    }
}

/// Text encoding of a feature tree in one format.
///
/// `parse` either fails with a malformed-document error or yields a whole
/// tree; per-element problems end up in [`Document::diagnostics`].
pub trait Codec {
    fn parse(&self, content: &str) -> Result<Document>;

    /// Serialize a tree. Formats without styles ignore `styles`.
    fn serialize(&self, root: &Feature, styles: &StyleSheet) -> String;
}

/// A feature tree together with its styles.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root folder.
    pub root: Feature,
    pub styles: StyleSheet,
    /// Problems recovered from while parsing. Empty for built documents.
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: a root folder and no styles.
    pub fn new() -> Self {
        Self {
            root: Feature::folder(),
            styles: StyleSheet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Read a file, choosing the format by extension and falling back to
    /// content sniffing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let format = Format::from_path(path)
            .or_else(|| Format::detect(&bytes))
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        debug!(path = %path.display(), ?format, "opening document");
        let doc = Self::from_bytes(&bytes, format)?;
        info!(
            path = %path.display(),
            features = doc.root.walk().count() - 1,
            styles = doc.styles.len(),
            diagnostics = doc.diagnostics.len(),
            "loaded document"
        );
        Ok(doc)
    }

    /// Decode and parse raw bytes. Non-UTF-8 KML is decoded by its declared
    /// encoding.
    pub fn from_bytes(bytes: &[u8], format: Format) -> Result<Self> {
        Self::from_str(&decode_text(bytes), format)
    }

    pub fn from_str(content: &str, format: Format) -> Result<Self> {
        format.codec().parse(content)
    }

    /// Serialize with the default codec configuration for `format`.
    pub fn to_string(&self, format: Format) -> String {
        format.codec().serialize(&self.root, &self.styles)
    }

    /// Features that `format` cannot represent and that serializing will
    /// leave out.
    pub fn unexportable(&self, format: Format) -> Vec<Diagnostic> {
        self.root
            .walk()
            .filter(|(_, f)| match f.kind() {
                FeatureKind::Unknown => true,
                FeatureKind::GroundOverlay => format == Format::GeoJson,
                _ => false,
            })
            .map(|(_, f)| Diagnostic::UnexportableFeature {
                kind: f.kind().as_str().to_string(),
                name: f.name.clone(),
            })
            .collect()
    }

    pub fn write_to<W: Write>(&self, format: Format, writer: &mut W) -> Result<()> {
        match format {
            Format::Kml => KmlCodec::new().write(&self.root, &self.styles, writer),
            Format::GeoJson => GeoJsonCodec::new().write(&self.root, writer),
        }
    }

    /// Write to a file in the format named by its extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = Format::from_path(path)
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        let mut file = fs::File::create(path)?;
        self.write_to(format, &mut file)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("a/b.KML"), Some(Format::Kml));
        assert_eq!(Format::from_path("x.geojson"), Some(Format::GeoJson));
        assert_eq!(Format::from_path("x.json"), Some(Format::GeoJson));
        assert_eq!(Format::from_path("x.gpx"), None);
        assert_eq!(Format::from_path("noext"), None);
    }

    #[test]
    fn test_format_detect() {
        assert_eq!(Format::detect(b"\xEF\xBB\xBF  <kml/>"), Some(Format::Kml));
        assert_eq!(Format::detect(b"\n{\"type\":\"Feature\"}"), Some(Format::GeoJson));
        assert_eq!(Format::detect(b"   "), None);
    }

    #[test]
    fn test_unexportable_depends_on_format() {
        let mut doc = Document::new();
        doc.root
            .add_child(Feature::ground_overlay(Default::default()).with_name("scan"))
            .unwrap();
        doc.root.add_child(Feature::unknown("Unknown object - Compass")).unwrap();

        assert_eq!(doc.unexportable(Format::Kml).len(), 1);
        let lost = doc.unexportable(Format::GeoJson);
        assert_eq!(lost.len(), 2);
        assert_eq!(
            lost[0],
            Diagnostic::UnexportableFeature {
                kind: "GroundOverlay".into(),
                name: Some("scan".into()),
            }
        );
    }

    #[test]
    fn test_new_is_empty_folder() {
        let doc = Document::new();
        assert!(doc.root.is_folder());
        assert!(doc.root.children().is_empty());
        assert_eq!(doc.root.bounding_box(), None);
    }
}
