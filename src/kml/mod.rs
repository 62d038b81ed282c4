//! KML support.
//!
//! Reads and writes the subset of KML covering folders, placemarks with
//! point/line/polygon/multi geometries, ground overlays, line and polygon
//! styles, and extended data. Unrecognized elements are ignored.
//!
//! # Example
//!
//! ```
//! use geotree::kml::KmlCodec;
//! use geotree::FeatureKind;
//!
//! let doc = KmlCodec::new().parse(
//!     r##"<kml><Document>
//!           <Style id="s1"><LineStyle><width>2</width></LineStyle></Style>
//!           <Placemark><styleUrl>#s1</styleUrl>
//!             <Point><coordinates>2.3,48.8,0</coordinates></Point>
//!           </Placemark>
//!         </Document></kml>"##,
//! )?;
//! let point = &doc.root.children()[0];
//! assert_eq!(point.kind(), FeatureKind::Point);
//! assert_eq!(point.style_ref.as_deref(), Some("s1"));
//! # Ok::<(), geotree::Error>(())
//! ```

use std::io::Write;

mod dom;
mod reader;
mod writer;

pub use reader::read_kml;
pub use writer::write_kml;

use crate::document::{Codec, Document};
use crate::error::Result;
use crate::model::{Feature, StyleSheet};

/// Configuration for KML reading and writing.
#[derive(Debug, Clone)]
pub struct KmlConfig {
    /// Read `innerBoundaryIs` rings as polygon holes (default true).
    pub parse_holes: bool,
    /// Start output with an `<?xml ...?>` declaration (default true).
    pub xml_declaration: bool,
    /// Spaces per nesting level in output (default 2).
    pub indent: usize,
}

impl Default for KmlConfig {
    fn default() -> Self {
        Self {
            parse_holes: true,
            xml_declaration: true,
            indent: 2,
        }
    }
}

/// KML codec.
#[derive(Debug, Clone, Default)]
pub struct KmlCodec {
    config: KmlConfig,
}

impl KmlCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the codec with custom settings.
    pub fn with_config(mut self, config: KmlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &KmlConfig {
        &self.config
    }
}

impl Codec for KmlCodec {
    fn parse(&self, content: &str) -> Result<Document> {
        read_kml(content, &self.config)
    }

    fn serialize(&self, root: &Feature, styles: &StyleSheet) -> String {
        write_kml(root, styles, &self.config)
    }
}

impl KmlCodec {
    /// Parse KML text. Inherent shorthand for [`Codec::parse`].
    pub fn parse(&self, content: &str) -> Result<Document> {
        read_kml(content, &self.config)
    }

    /// Serialize a tree and its styles. Inherent shorthand for [`Codec::serialize`].
    pub fn serialize(&self, root: &Feature, styles: &StyleSheet) -> String {
        write_kml(root, styles, &self.config)
    }

    /// Serialize into any writer.
    pub fn write<W: Write>(
        &self,
        root: &Feature,
        styles: &StyleSheet,
        writer: &mut W,
    ) -> Result<()> {
        writer.write_all(self.serialize(root, styles).as_bytes())?;
        Ok(())
    }
}
