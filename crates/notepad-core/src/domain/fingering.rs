//! Chord fingering notation.
//!
//! A fingering holds one position per string, low E first. Two textual
//! forms are accepted:
//!
//! - compact, six characters: `X32010`
//! - hyphenated, six fields: `X-3-2-0-1-0`, needed once a fret reaches 10
//!   (`8-10-10-9-8-8`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Strings on a standard guitar.
pub const STRING_COUNT: usize = 6;

/// Highest fret accepted in a fingering.
pub const MAX_FRET: u8 = 24;

/// What a single string does in a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringPosition {
    Muted,
    Open,
    Fretted(u8),
}

impl StringPosition {
    pub fn fret(&self) -> Option<u8> {
        match self {
            StringPosition::Fretted(fret) => Some(*fret),
            _ => None,
        }
    }

    pub fn is_sounding(&self) -> bool {
        !matches!(self, StringPosition::Muted)
    }
}

impl fmt::Display for StringPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringPosition::Muted => f.write_str("X"),
            StringPosition::Open => f.write_str("0"),
            StringPosition::Fretted(fret) => write!(f, "{}", fret),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingeringError {
    #[error("Fingering is empty")]
    Empty,

    #[error("Fingering must describe 6 strings, found {found}")]
    WrongFieldCount { found: usize },

    #[error("Invalid value '{value}' for string {string}")]
    InvalidField { string: usize, value: String },

    #[error("Fret {fret} on string {string} is above the 24th fret")]
    FretOutOfRange { string: usize, fret: u32 },

    #[error("At least one string must sound")]
    NoSoundingStrings,
}

/// A validated six-string fingering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingering([StringPosition; STRING_COUNT]);

impl Fingering {
    pub fn new(positions: [StringPosition; STRING_COUNT]) -> Result<Self, FingeringError> {
        for (index, position) in positions.iter().enumerate() {
            if let StringPosition::Fretted(fret) = position {
                if *fret == 0 || *fret > MAX_FRET {
                    return Err(FingeringError::FretOutOfRange {
                        string: index + 1,
                        fret: u32::from(*fret),
                    });
                }
            }
        }
        if !positions.iter().any(StringPosition::is_sounding) {
            return Err(FingeringError::NoSoundingStrings);
        }
        Ok(Self(positions))
    }

    pub fn parse(text: &str) -> Result<Self, FingeringError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FingeringError::Empty);
        }

        let fields: Vec<&str> = if text.contains('-') {
            text.split('-').map(str::trim).collect()
        } else {
            // Compact form: every character is one string.
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        };

        if fields.len() != STRING_COUNT {
            return Err(FingeringError::WrongFieldCount {
                found: fields.len(),
            });
        }

        let mut positions = [StringPosition::Muted; STRING_COUNT];
        for (index, field) in fields.iter().enumerate() {
            positions[index] = parse_field(index + 1, field)?;
        }

        Self::new(positions)
    }

    pub fn positions(&self) -> &[StringPosition; STRING_COUNT] {
        &self.0
    }

    /// Fretted strings as `(string index, fret)`.
    pub fn fretted(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, position)| position.fret().map(|fret| (index, fret)))
    }

    pub fn min_fret(&self) -> Option<u8> {
        self.fretted().map(|(_, fret)| fret).min()
    }

    pub fn max_fret(&self) -> Option<u8> {
        self.fretted().map(|(_, fret)| fret).max()
    }

    pub fn sounding_strings(&self) -> usize {
        self.0.iter().filter(|p| p.is_sounding()).count()
    }
}

fn parse_field(string: usize, field: &str) -> Result<StringPosition, FingeringError> {
    if field.eq_ignore_ascii_case("x") {
        return Ok(StringPosition::Muted);
    }

    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FingeringError::InvalidField {
            string,
            value: field.to_string(),
        });
    }

    let fret: u32 = field.parse().map_err(|_| FingeringError::FretOutOfRange {
        string,
        fret: u32::MAX,
    })?;

    match fret {
        0 => Ok(StringPosition::Open),
        f if f <= u32::from(MAX_FRET) => Ok(StringPosition::Fretted(f as u8)),
        f => Err(FingeringError::FretOutOfRange { string, fret: f }),
    }
}

impl FromStr for Fingering {
    type Err = FingeringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical form: compact when every fret is a single digit, hyphenated otherwise.
impl fmt::Display for Fingering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compact = self.fretted().all(|(_, fret)| fret < 10);
        for (index, position) in self.0.iter().enumerate() {
            if index > 0 && !compact {
                f.write_str("-")?;
            }
            write!(f, "{}", position)?;
        }
        Ok(())
    }
}

impl Serialize for Fingering {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingering {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Fingering::parse(&text).map_err(serde::de::Error::custom)
    }
}
