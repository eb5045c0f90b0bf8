//! Alphabet slots, per-slot overrides and the page grid layout.
//!
//! Everything letter-specific lives in one declarative table: the order of the
//! slots, their codepoints, and the vertical offset / scale / margin / anchor
//! overrides that the normalizer and the assigner consume. No stage branches on a
//! letter's identity.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::config::ConfigError;

/// How a slot's expected position on the page is predicted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorRule {
    /// The centre of the slot's grid cell.
    #[default]
    Grid,
    /// The grid cell centre shifted by `(dx, dy)` cell pitches.
    ///
    /// `dx` is measured along the reading direction, `dy` downwards.
    Offset { dx: f32, dy: f32 },
    /// The centre of the box assigned to another slot, shifted by `(dx, dy)` pitches.
    ///
    /// Falls back to the grid cell when the neighbour is unfilled.
    RelativeTo { slot: String, dx: f32, dy: f32 },
}

/// Per-slot overrides consumed by the normalizer and the assigner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotOverride {
    /// Vertical shift on the glyph canvas in pixels; positive moves the glyph down.
    pub vertical_offset: i32,
    /// Multiplier applied on top of the fit-to-canvas scale.
    pub scale: f32,
    /// Canvas margin for this slot; `None` uses the canvas default.
    pub margin: Option<u32>,
    /// Expected position rule.
    pub anchor: AnchorRule,
    /// Search radius around the anchor in cell pitches; `None` uses the assigner default.
    pub anchor_radius: Option<f32>,
}

impl Default for SlotOverride {
    fn default() -> Self {
        Self {
            vertical_offset: 0,
            scale: 1.0,
            margin: None,
            anchor: AnchorRule::Grid,
            anchor_radius: None,
        }
    }
}

impl SlotOverride {
    /// Override that only shifts the glyph vertically.
    pub fn shifted(vertical_offset: i32) -> Self {
        Self {
            vertical_offset,
            ..Self::default()
        }
    }
}

/// One entry of the configured alphabet order, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSpec {
    /// Logical letter identifier, e.g. `"alef"`.
    pub name: String,
    /// Unicode codepoint the glyph is mapped to.
    pub codepoint: char,
    /// Optional overrides.
    #[serde(default)]
    pub overrides: SlotOverride,
}

impl SlotSpec {
    /// Creates a slot spec without overrides.
    pub fn new(name: impl Into<String>, codepoint: char) -> Self {
        Self {
            name: name.into(),
            codepoint,
            overrides: SlotOverride::default(),
        }
    }

    /// Sets the overrides.
    pub fn with_overrides(mut self, overrides: SlotOverride) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A validated slot with its position in the alphabet order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlphabetSlot {
    pub index: usize,
    pub name: String,
    pub codepoint: char,
    pub overrides: SlotOverride,
}

impl AlphabetSlot {
    /// File stem used for per-slot artifacts, e.g. `03_dalet`.
    pub fn file_stem(&self) -> String {
        format!("{:02}_{}", self.index, self.name)
    }
}

/// The ordered list of slots a page is expected to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct Alphabet {
    slots: Vec<AlphabetSlot>,
    by_name: HashMap<String, usize>,
}

impl Alphabet {
    /// Builds an alphabet from configured slot specs.
    ///
    /// Names and codepoints must be unique, codepoints must be in the Basic
    /// Multilingual Plane and must not collide with the space glyph, and anchor
    /// rules may only reference other existing slots.
    pub fn from_specs(specs: &[SlotSpec]) -> Result<Self, ConfigError> {
        if specs.is_empty() {
            return Err(ConfigError::InvalidAlphabet {
                message: "alphabet must contain at least one slot".to_string(),
            });
        }

        let mut by_name = HashMap::with_capacity(specs.len());
        let mut codepoints = HashSet::with_capacity(specs.len());
        let mut slots = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::InvalidAlphabet {
                    message: format!("slot {} has an empty name", index),
                });
            }
            if by_name.insert(spec.name.clone(), index).is_some() {
                return Err(ConfigError::InvalidAlphabet {
                    message: format!("duplicate slot name '{}'", spec.name),
                });
            }
            let cp = spec.codepoint as u32;
            if cp > 0xFFFF {
                return Err(ConfigError::InvalidAlphabet {
                    message: format!(
                        "codepoint U+{:04X} of '{}' is outside the Basic Multilingual Plane",
                        cp, spec.name
                    ),
                });
            }
            if spec.codepoint.is_control() || spec.codepoint == ' ' {
                return Err(ConfigError::InvalidAlphabet {
                    message: format!("codepoint U+{:04X} of '{}' is reserved", cp, spec.name),
                });
            }
            if !codepoints.insert(spec.codepoint) {
                return Err(ConfigError::InvalidAlphabet {
                    message: format!("codepoint U+{:04X} is assigned twice", cp),
                });
            }
            let scale = spec.overrides.scale;
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ConfigError::InvalidAlphabet {
                    message: format!("scale override of '{}' must be positive", spec.name),
                });
            }
            if let Some(radius) = spec.overrides.anchor_radius
                && (!radius.is_finite() || radius <= 0.0)
            {
                return Err(ConfigError::InvalidAlphabet {
                    message: format!("anchor radius of '{}' must be positive", spec.name),
                });
            }

            slots.push(AlphabetSlot {
                index,
                name: spec.name.clone(),
                codepoint: spec.codepoint,
                overrides: spec.overrides.clone(),
            });
        }

        for slot in &slots {
            if let AnchorRule::RelativeTo { slot: other, .. } = &slot.overrides.anchor {
                if other == &slot.name || !by_name.contains_key(other) {
                    return Err(ConfigError::InvalidAlphabet {
                        message: format!(
                            "slot '{}' anchors to unknown slot '{}'",
                            slot.name, other
                        ),
                    });
                }
            }
        }

        Ok(Self { slots, by_name })
    }

    /// The default alphabet: the 22 Hebrew letters followed by the five final forms.
    pub fn hebrew() -> Self {
        // The default table is valid by construction.
        Self::from_specs(&hebrew_slot_specs()).unwrap_or_else(|e| unreachable!("{e}"))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[AlphabetSlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&AlphabetSlot> {
        self.slots.get(index)
    }

    /// Looks a slot up by its logical name.
    pub fn by_name(&self, name: &str) -> Option<&AlphabetSlot> {
        self.by_name.get(name).map(|&i| &self.slots[i])
    }
}

/// Slot specs of the default Hebrew alphabet with canonical Unicode codepoints.
///
/// Letters that sit above the line or descend below it carry a vertical offset so
/// the centred canvases keep a common baseline.
pub fn hebrew_slot_specs() -> Vec<SlotSpec> {
    const LETTERS: [(&str, char, i32); 27] = [
        ("alef", '\u{05D0}', 0),
        ("bet", '\u{05D1}', 0),
        ("gimel", '\u{05D2}', 0),
        ("dalet", '\u{05D3}', 0),
        ("he", '\u{05D4}', 0),
        ("vav", '\u{05D5}', 0),
        ("zayin", '\u{05D6}', 0),
        ("het", '\u{05D7}', 0),
        ("tet", '\u{05D8}', 0),
        ("yod", '\u{05D9}', -110),
        ("kaf", '\u{05DB}', 0),
        ("lamed", '\u{05DC}', -60),
        ("mem", '\u{05DE}', 0),
        ("nun", '\u{05E0}', 0),
        ("samekh", '\u{05E1}', 0),
        ("ayin", '\u{05E2}', 0),
        ("pe", '\u{05E4}', 0),
        ("tsadi", '\u{05E6}', 0),
        ("qof", '\u{05E7}', 70),
        ("resh", '\u{05E8}', 0),
        ("shin", '\u{05E9}', 0),
        ("tav", '\u{05EA}', 0),
        ("final_kaf", '\u{05DA}', 70),
        ("final_mem", '\u{05DD}', 0),
        ("final_nun", '\u{05DF}', 70),
        ("final_pe", '\u{05E3}', 70),
        ("final_tsadi", '\u{05E5}', 70),
    ];

    LETTERS
        .iter()
        .map(|&(name, codepoint, offset)| {
            let spec = SlotSpec::new(name, codepoint);
            if offset != 0 {
                spec.with_overrides(SlotOverride::shifted(offset))
            } else {
                spec
            }
        })
        .collect()
}

/// Reading direction of each text line on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadingDirection {
    #[default]
    RightToLeft,
    LeftToRight,
}

/// Physical layout of the letter grid on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Number of physical rows.
    pub rows: usize,
    /// Maximum number of letters per row.
    pub max_columns: usize,
    /// Explicit number of letters in each row. When absent, rows are filled with
    /// `max_columns` letters until the alphabet is exhausted.
    pub row_lengths: Option<Vec<usize>>,
    /// Direction letters are written within a row.
    pub direction: ReadingDirection,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            rows: 7,
            max_columns: 4,
            row_lengths: None,
            direction: ReadingDirection::RightToLeft,
        }
    }
}

impl GridLayout {
    /// Resolves how many slots each row holds for an alphabet of `slot_count` slots.
    pub fn row_lengths(&self, slot_count: usize) -> Result<Vec<usize>, ConfigError> {
        if self.rows == 0 || self.max_columns == 0 {
            return Err(ConfigError::InvalidGrid {
                message: "rows and max_columns must be greater than 0".to_string(),
            });
        }

        let lengths = match &self.row_lengths {
            Some(lengths) => {
                if lengths.len() != self.rows {
                    return Err(ConfigError::InvalidGrid {
                        message: format!(
                            "row_lengths has {} entries but the grid has {} rows",
                            lengths.len(),
                            self.rows
                        ),
                    });
                }
                if let Some(&too_long) = lengths.iter().find(|&&l| l > self.max_columns) {
                    return Err(ConfigError::InvalidGrid {
                        message: format!(
                            "row length {} exceeds max_columns {}",
                            too_long, self.max_columns
                        ),
                    });
                }
                lengths.clone()
            }
            None => {
                let mut remaining = slot_count;
                (0..self.rows)
                    .map(|_| {
                        let take = remaining.min(self.max_columns);
                        remaining -= take;
                        take
                    })
                    .collect()
            }
        };

        let capacity: usize = lengths.iter().sum();
        if capacity != slot_count {
            return Err(ConfigError::InvalidGrid {
                message: format!(
                    "grid holds {} letters but the alphabet has {} slots",
                    capacity, slot_count
                ),
            });
        }
        Ok(lengths)
    }

    /// Slot index ranges covered by each row.
    pub fn slot_ranges(&self, slot_count: usize) -> Result<Vec<std::ops::Range<usize>>, ConfigError> {
        let mut start = 0;
        Ok(self
            .row_lengths(slot_count)?
            .into_iter()
            .map(|len| {
                let range = start..start + len;
                start += len;
                range
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hebrew_alphabet() {
        let alphabet = Alphabet::hebrew();
        assert_eq!(alphabet.len(), 27);
        assert_eq!(alphabet.get(0).unwrap().codepoint, 'א');
        assert_eq!(alphabet.by_name("final_tsadi").unwrap().index, 26);
        assert_eq!(alphabet.by_name("yod").unwrap().overrides.vertical_offset, -110);
        assert_eq!(alphabet.get(3).unwrap().file_stem(), "03_dalet");
    }

    #[test]
    fn test_duplicate_codepoint_rejected() {
        let specs = vec![SlotSpec::new("a", 'a'), SlotSpec::new("b", 'a')];
        assert!(matches!(
            Alphabet::from_specs(&specs),
            Err(ConfigError::InvalidAlphabet { .. })
        ));
    }

    #[test]
    fn test_unknown_anchor_reference_rejected() {
        let specs = vec![
            SlotSpec::new("a", 'a'),
            SlotSpec::new("b", 'b').with_overrides(SlotOverride {
                anchor: AnchorRule::RelativeTo {
                    slot: "zz".to_string(),
                    dx: 1.0,
                    dy: 0.0,
                },
                ..SlotOverride::default()
            }),
        ];
        assert!(Alphabet::from_specs(&specs).is_err());
    }

    #[test]
    fn test_non_bmp_codepoint_rejected() {
        let specs = vec![SlotSpec::new("emoji", '\u{1F600}')];
        assert!(Alphabet::from_specs(&specs).is_err());
    }

    #[test]
    fn test_default_row_lengths() {
        let grid = GridLayout::default();
        assert_eq!(grid.row_lengths(27).unwrap(), vec![4, 4, 4, 4, 4, 4, 3]);
        let ranges = grid.slot_ranges(27).unwrap();
        assert_eq!(ranges[6], 24..27);
    }

    #[test]
    fn test_grid_capacity_mismatch() {
        let grid = GridLayout::default();
        assert!(grid.row_lengths(30).is_err());

        let explicit = GridLayout {
            row_lengths: Some(vec![4, 4, 4, 4, 4, 4, 4]),
            ..GridLayout::default()
        };
        assert!(explicit.row_lengths(27).is_err());
    }

    #[test]
    fn test_slot_spec_serde() {
        let json = r#"{"name":"yod","codepoint":"י","overrides":{"vertical_offset":-80,"anchor":{"kind":"offset","dx":0.1,"dy":0.0}}}"#;
        let spec: SlotSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.codepoint, '\u{05D9}');
        assert_eq!(spec.overrides.vertical_offset, -80);
        assert_eq!(spec.overrides.scale, 1.0);
        assert_eq!(spec.overrides.anchor, AnchorRule::Offset { dx: 0.1, dy: 0.0 });
    }
}
