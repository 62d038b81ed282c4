//! WASM bindings for browser-based conversion.
//!
//! Exposes the two conversions to JavaScript via wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::document::{Document, Format};

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

fn convert(input: &str, from: Format, to: Format) -> Result<String, JsValue> {
    let doc = Document::from_str(input, from).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(doc.to_string(to))
}

/// Convert KML text to GeoJSON text. Styles are dropped.
#[wasm_bindgen]
pub fn kml_to_geojson(input: &str) -> Result<String, JsValue> {
    convert(input, Format::Kml, Format::GeoJson)
}

/// Convert GeoJSON text to KML text.
#[wasm_bindgen]
pub fn geojson_to_kml(input: &str) -> Result<String, JsValue> {
    convert(input, Format::GeoJson, Format::Kml)
}
