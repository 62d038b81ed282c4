//! Shared styles, referenced from features by id.
//!
//! Features never own a style. They carry a `style_ref` key that is resolved
//! against a [`StyleSheet`] at serialization or build time, so a sheet can be
//! replaced or dropped independently of the tree.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from a packed `0xAARRGGBB` value.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Packed `0xAARRGGBB` value.
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Parse a KML color, which is `aabbggrr` hex.
    ///
    /// A leading `#` is tolerated. Six-digit values are read as `bbggrr` with
    /// full opacity.
    pub fn from_kml_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        let value = u32::from_str_radix(s, 16).ok()?;
        match s.len() {
            8 => Some(Self {
                a: (value >> 24) as u8,
                b: (value >> 16) as u8,
                g: (value >> 8) as u8,
                r: value as u8,
            }),
            6 => Some(Self {
                a: 0xff,
                b: (value >> 16) as u8,
                g: (value >> 8) as u8,
                r: value as u8,
            }),
            _ => None,
        }
    }

    /// Format as KML `aabbggrr` hex.
    pub fn to_kml_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}{:02x}", self.a, self.b, self.g, self.r)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.to_argb())
    }
}

/// Visual attributes of lines and areas.
///
/// Every attribute is optional; [`Style::resolved`] fills the gaps from the
/// default style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub line_color: Option<Color>,
    pub line_width: Option<f32>,
    pub fill_color: Option<Color>,
}

impl Style {
    pub const DEFAULT_LINE_COLOR: Color = Color::from_argb(0x9010_1010);
    pub const DEFAULT_LINE_WIDTH: f32 = 5.0;
    pub const DEFAULT_FILL_COLOR: Color = Color::from_argb(0x2010_1010);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line(mut self, color: Color, width: f32) -> Self {
        self.line_color = Some(color);
        self.line_width = Some(width);
        self
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    /// Style used when a feature has no style, or a dangling reference.
    pub fn fallback() -> Self {
        Self {
            line_color: Some(Self::DEFAULT_LINE_COLOR),
            line_width: Some(Self::DEFAULT_LINE_WIDTH),
            fill_color: Some(Self::DEFAULT_FILL_COLOR),
        }
    }

    /// Copy with every unset attribute taken from [`Style::fallback`].
    pub fn resolved(&self) -> Self {
        Self {
            line_color: self.line_color.or(Some(Self::DEFAULT_LINE_COLOR)),
            line_width: self.line_width.or(Some(Self::DEFAULT_LINE_WIDTH)),
            fill_color: self.fill_color.or(Some(Self::DEFAULT_FILL_COLOR)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line_color.is_none() && self.line_width.is_none() && self.fill_color.is_none()
    }
}

/// Resolves a feature's `style_ref` to a concrete style.
///
/// Handed to visual builders so they never hold a reference into the sheet.
pub trait StyleResolver {
    /// Look up a style by id. Unknown ids yield `None`.
    fn lookup(&self, id: &str) -> Option<&Style>;

    /// Effective style for a reference, falling back to [`Style::fallback`]
    /// for missing or dangling references.
    fn resolve(&self, style_ref: Option<&str>) -> Style {
        style_ref
            .and_then(|id| self.lookup(id))
            .map(Style::resolved)
            .unwrap_or_else(Style::fallback)
    }
}

/// Mapping from style id to style.
///
/// Ids are kept sorted so the sheet serializes in a stable order.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: BTreeMap<String, Style>,
    /// Ids handed out by `add`; only these take part in deduplication.
    generated: BTreeSet<String>,
    next_id: usize,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a style under a fresh id and return the id.
    ///
    /// A structurally equal style previously added through this method is
    /// reused instead of duplicated. Ids already present are never reused.
    pub fn add(&mut self, style: Style) -> String {
        if let Some((id, _)) = self
            .styles
            .iter()
            .find(|(id, s)| **s == style && self.generated.contains(*id))
        {
            return id.clone();
        }

        let id = loop {
            let candidate = format!("style{}", self.next_id);
            self.next_id += 1;
            if !self.styles.contains_key(&candidate) {
                break candidate;
            }
        };
        self.styles.insert(id.clone(), style);
        self.generated.insert(id.clone());
        id
    }

    /// Insert or replace the style stored under an explicit id.
    pub fn insert(&mut self, id: impl Into<String>, style: Style) -> Option<Style> {
        let id = id.into();
        self.generated.remove(&id);
        self.styles.insert(id, style)
    }

    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.get(id)
    }

    /// Remove a style. Features still referencing `id` are left dangling.
    pub fn remove(&mut self, id: &str) -> Option<Style> {
        self.generated.remove(id);
        self.styles.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Iterate over `(id, style)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Style)> {
        self.styles.iter().map(|(id, s)| (id.as_str(), s))
    }
}

/// Sheets are equal when they hold the same styles under the same ids.
impl PartialEq for StyleSheet {
    fn eq(&self, other: &Self) -> bool {
        self.styles == other.styles
    }
}

impl StyleResolver for StyleSheet {
    fn lookup(&self, id: &str) -> Option<&Style> {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kml_color_byte_order() {
        let c = Color::from_kml_hex("7f0000ff").unwrap();
        assert_eq!(c, Color::rgba(0xff, 0, 0, 0x7f));
        assert_eq!(c.to_kml_hex(), "7f0000ff");
        assert_eq!(c.to_argb(), 0x7fff_0000);
        assert_eq!(Color::from_kml_hex("#00ff00").unwrap(), Color::rgba(0, 0xff, 0, 0xff));
        assert_eq!(Color::from_kml_hex("zz"), None);
        assert_eq!(Color::from_kml_hex("12345"), None);
    }

    #[test]
    fn test_argb_roundtrip() {
        let c = Color::from_argb(0x9010_1010);
        assert_eq!(c.a, 0x90);
        assert_eq!(c.to_argb(), 0x9010_1010);
    }

    #[test]
    fn test_add_generates_fresh_ids() {
        let mut sheet = StyleSheet::new();
        let red = Style::new().with_line(Color::rgba(255, 0, 0, 255), 2.0);
        let blue = Style::new().with_line(Color::rgba(0, 0, 255, 255), 2.0);

        let a = sheet.add(red.clone());
        let b = sheet.add(blue);
        assert_ne!(a, b);
        assert_eq!(sheet.get(&a), Some(&red));
    }

    #[test]
    fn test_add_deduplicates_equal_styles() {
        let mut sheet = StyleSheet::new();
        let s = Style::new().with_fill(Color::rgba(1, 2, 3, 4));
        let a = sheet.add(s.clone());
        let b = sheet.add(s);
        assert_eq!(a, b);
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_add_skips_ids_taken_by_insert() {
        let mut sheet = StyleSheet::new();
        sheet.insert("style0", Style::new().with_fill(Color::rgba(9, 9, 9, 9)));
        let id = sheet.add(Style::new().with_fill(Color::rgba(1, 1, 1, 1)));
        assert_eq!(id, "style1");
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn test_explicit_ids_are_never_merged() {
        let mut sheet = StyleSheet::new();
        let s = Style::new().with_fill(Color::rgba(1, 2, 3, 4));
        sheet.insert("style3", s.clone());
        sheet.insert("shared", s.clone());

        let id = sheet.add(s.clone());
        assert_ne!(id, "style3");
        assert_ne!(id, "shared");
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.add(s), id);
    }

    #[test]
    fn test_insert_over_generated_id_stops_dedup() {
        let mut sheet = StyleSheet::new();
        let s = Style::new().with_fill(Color::rgba(1, 2, 3, 4));
        let id = sheet.add(s.clone());
        sheet.insert(id.clone(), s.clone());
        assert_ne!(sheet.add(s), id);
    }

    #[test]
    fn test_removed_id_is_not_reissued() {
        let mut sheet = StyleSheet::new();
        let a = sheet.add(Style::new().with_fill(Color::rgba(1, 1, 1, 1)));
        sheet.remove(&a);
        let b = sheet.add(Style::new().with_fill(Color::rgba(2, 2, 2, 2)));
        assert_ne!(a, b);
    }

    #[test]
    fn test_resolve_falls_back() {
        let mut sheet = StyleSheet::new();
        sheet.insert("thin", Style::new().with_line(Color::rgba(0, 0, 0, 255), 1.0));

        assert_eq!(sheet.resolve(None), Style::fallback());
        assert_eq!(sheet.resolve(Some("missing")), Style::fallback());

        let thin = sheet.resolve(Some("thin"));
        assert_eq!(thin.line_width, Some(1.0));
        assert_eq!(thin.fill_color, Some(Style::DEFAULT_FILL_COLOR));
    }
}
