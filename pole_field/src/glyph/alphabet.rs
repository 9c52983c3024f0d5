//! The alphabet - glyph lookup keyed by character.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::Glyph;
use crate::error::ConfigError;

/// Serialized form of an alphabet file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlphabetDefinition {
    #[serde(default)]
    pub base_height: f32,
    pub glyphs: Vec<Glyph>,
}

/// Validated, immutable glyph set.
#[derive(Debug, Clone, Default)]
pub struct Alphabet {
    base_height: f32,
    glyphs: HashMap<char, Arc<Glyph>>,
    rejected: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet from glyph definitions.
    ///
    /// Glyphs with malformed flow data are reported once and left out; the
    /// rest of the alphabet stays usable.
    pub fn new(base_height: f32, glyphs: impl IntoIterator<Item = Glyph>) -> Self {
        let mut alphabet = Self {
            base_height,
            ..Self::default()
        };

        for glyph in glyphs {
            match glyph.validate() {
                Ok(()) => {
                    alphabet.glyphs.insert(glyph.id, Arc::new(glyph));
                }
                Err(e) => {
                    tracing::warn!(glyph = %glyph.id, error = %e, "ignoring glyph");
                    alphabet.rejected.push(glyph.id);
                }
            }
        }

        alphabet
    }

    /// Parse an alphabet from its JSON definition.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let definition: AlphabetDefinition = serde_json::from_str(json)?;
        Ok(Self::from_definition(definition))
    }

    pub fn from_definition(definition: AlphabetDefinition) -> Self {
        Self::new(definition.base_height, definition.glyphs)
    }

    /// Look up a glyph, falling back to the lowercase form of the character.
    pub fn get(&self, c: char) -> Option<&Arc<Glyph>> {
        self.glyphs
            .get(&c)
            .or_else(|| c.to_lowercase().next().and_then(|lc| self.glyphs.get(&lc)))
    }

    /// Unscaled layout width of a string, including kerning.
    pub fn width_of(&self, text: &str) -> f32 {
        let mut width = 0.0;
        let mut prev: Option<&Arc<Glyph>> = None;
        for c in text.chars() {
            if let Some(glyph) = self.get(c) {
                width += glyph.width + glyph.kerning(prev.map(|g| g.as_ref()));
                prev = Some(glyph);
            }
        }
        width
    }

    pub fn base_height(&self) -> f32 {
        self.base_height
    }

    /// Characters dropped during validation.
    pub fn rejected(&self) -> &[char] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}
