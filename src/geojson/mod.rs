//! GeoJSON support.
//!
//! Folders map to `FeatureCollection`s and placemarks to `Feature`s.
//! Styles have no GeoJSON form: they are dropped on export and absent on
//! import. Altitude is not written.

use std::io::Write;

mod reader;
mod writer;

pub use reader::read_geojson;
pub use writer::{to_geojson_value, write_geojson};

use crate::document::{Codec, Document};
use crate::error::Result;
use crate::model::{Feature, StyleSheet};

/// Configuration for GeoJSON output.
#[derive(Debug, Clone)]
pub struct GeoJsonConfig {
    /// Indent the output (default true).
    pub pretty: bool,
    /// Add the CRS84 `crs` member to the root collection (default true).
    pub emit_crs: bool,
}

impl Default for GeoJsonConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            emit_crs: true,
        }
    }
}

/// GeoJSON codec.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonCodec {
    config: GeoJsonConfig,
}

impl GeoJsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the codec with custom settings.
    pub fn with_config(mut self, config: GeoJsonConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GeoJsonConfig {
        &self.config
    }

    pub fn parse(&self, content: &str) -> Result<Document> {
        read_geojson(content)
    }

    pub fn serialize(&self, root: &Feature) -> String {
        write_geojson(root, &self.config)
    }

    pub fn write<W: Write>(&self, root: &Feature, writer: &mut W) -> Result<()> {
        let value = to_geojson_value(root, &self.config);
        if self.config.pretty {
            serde_json::to_writer_pretty(writer, &value)?;
        } else {
            serde_json::to_writer(writer, &value)?;
        }
        Ok(())
    }
}

impl Codec for GeoJsonCodec {
    fn parse(&self, content: &str) -> Result<Document> {
        read_geojson(content)
    }

    /// The style sheet is ignored.
    fn serialize(&self, root: &Feature, _styles: &StyleSheet) -> String {
        write_geojson(root, &self.config)
    }
}
