//! Chord diagram geometry and SVG rendering.

use serde::Serialize;

use super::fingering::{Fingering, STRING_COUNT, StringPosition};

/// Smallest fret window a diagram shows.
pub const MIN_VISIBLE_FRETS: u8 = 4;

const STRING_GAP: u32 = 20;
const FRET_GAP: u32 = 24;
const MARGIN_LEFT: u32 = 36;
const MARGIN_RIGHT: u32 = 16;
const MARGIN_TOP: u32 = 44;
const MARGIN_BOTTOM: u32 = 16;
const DOT_RADIUS: u32 = 7;

/// A single fretted note, fret numbers are absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dot {
    pub string: usize,
    pub fret: u8,
}

/// One finger held across several adjacent strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Barre {
    pub fret: u8,
    pub first_string: usize,
    pub last_string: usize,
}

/// Layout of a chord on a fretboard window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordDiagram {
    pub fingering: Fingering,
    /// Absolute fret shown at the top of the window.
    pub base_fret: u8,
    pub fret_count: u8,
    pub muted: Vec<usize>,
    pub open: Vec<usize>,
    pub dots: Vec<Dot>,
    pub barre: Option<Barre>,
}

impl ChordDiagram {
    pub fn new(fingering: Fingering) -> Self {
        let base_fret = match (fingering.min_fret(), fingering.max_fret()) {
            (Some(min), Some(max)) if max > MIN_VISIBLE_FRETS => min,
            _ => 1,
        };
        let fret_count = fingering
            .max_fret()
            .map(|max| max - base_fret + 1)
            .unwrap_or(0)
            .max(MIN_VISIBLE_FRETS);

        let barre = detect_barre(&fingering);

        let mut muted = Vec::new();
        let mut open = Vec::new();
        let mut dots = Vec::new();
        for (string, position) in fingering.positions().iter().enumerate() {
            match position {
                StringPosition::Muted => muted.push(string),
                StringPosition::Open => open.push(string),
                StringPosition::Fretted(fret) => {
                    let under_barre = barre.is_some_and(|b| {
                        b.fret == *fret && (b.first_string..=b.last_string).contains(&string)
                    });
                    if !under_barre {
                        dots.push(Dot {
                            string,
                            fret: *fret,
                        });
                    }
                }
            }
        }

        Self {
            fingering,
            base_fret,
            fret_count,
            muted,
            open,
            dots,
            barre,
        }
    }

    /// Row of `fret` inside the window, starting at 1.
    pub fn relative_fret(&self, fret: u8) -> u8 {
        fret + 1 - self.base_fret
    }

    pub fn width(&self) -> u32 {
        MARGIN_LEFT + STRING_GAP * (STRING_COUNT as u32 - 1) + MARGIN_RIGHT
    }

    pub fn height(&self) -> u32 {
        MARGIN_TOP + FRET_GAP * u32::from(self.fret_count) + MARGIN_BOTTOM
    }

    pub fn to_svg(&self, title: Option<&str>) -> String {
        let width = self.width();
        let height = self.height();
        let board_bottom = MARGIN_TOP + FRET_GAP * u32::from(self.fret_count);
        let board_right = string_x(STRING_COUNT - 1);

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"#
        );

        if let Some(title) = title {
            svg.push_str(&format!(
                r#"<text x="{}" y="14" text-anchor="middle" font-size="13">{}</text>"#,
                width / 2,
                escape_xml(title)
            ));
        }

        for string in 0..STRING_COUNT {
            let x = string_x(string);
            svg.push_str(&format!(
                r#"<line x1="{x}" y1="{MARGIN_TOP}" x2="{x}" y2="{board_bottom}" stroke="black" stroke-width="1"/>"#
            ));
        }

        for row in 0..=u32::from(self.fret_count) {
            let y = MARGIN_TOP + row * FRET_GAP;
            let stroke = if row == 0 && self.base_fret == 1 { 4 } else { 1 };
            svg.push_str(&format!(
                r#"<line x1="{MARGIN_LEFT}" y1="{y}" x2="{board_right}" y2="{y}" stroke="black" stroke-width="{stroke}"/>"#
            ));
        }

        if self.base_fret > 1 {
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="end" font-size="11">{}fr</text>"#,
                MARGIN_LEFT - 6,
                MARGIN_TOP + FRET_GAP / 2 + 4,
                self.base_fret
            ));
        }

        let marker_y = MARGIN_TOP - 10;
        for &string in &self.muted {
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="middle" font-size="12">X</text>"#,
                string_x(string),
                marker_y + 4
            ));
        }
        for &string in &self.open {
            svg.push_str(&format!(
                r#"<circle cx="{}" cy="{marker_y}" r="5" fill="none" stroke="black" stroke-width="1"/>"#,
                string_x(string)
            ));
        }

        if let Some(barre) = self.barre {
            let y = self.fret_center_y(barre.fret);
            let x = string_x(barre.first_string) - DOT_RADIUS;
            let w = string_x(barre.last_string) - string_x(barre.first_string) + 2 * DOT_RADIUS;
            svg.push_str(&format!(
                r#"<rect x="{x}" y="{}" width="{w}" height="{}" rx="{DOT_RADIUS}" fill="black"/>"#,
                y - DOT_RADIUS,
                2 * DOT_RADIUS
            ));
        }

        for dot in &self.dots {
            svg.push_str(&format!(
                r#"<circle cx="{}" cy="{}" r="{DOT_RADIUS}" fill="black"/>"#,
                string_x(dot.string),
                self.fret_center_y(dot.fret)
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    fn fret_center_y(&self, fret: u8) -> u32 {
        MARGIN_TOP + u32::from(self.relative_fret(fret)) * FRET_GAP - FRET_GAP / 2
    }
}

impl From<Fingering> for ChordDiagram {
    fn from(fingering: Fingering) -> Self {
        Self::new(fingering)
    }
}

fn string_x(string: usize) -> u32 {
    MARGIN_LEFT + STRING_GAP * string as u32
}

/// The lowest fret forms a barre when it is held on two or more strings and
/// every string in between is fretted.
fn detect_barre(fingering: &Fingering) -> Option<Barre> {
    let fret = fingering.min_fret()?;
    let positions = fingering.positions();

    let first = positions.iter().position(|p| p.fret() == Some(fret))?;
    let last = positions.iter().rposition(|p| p.fret() == Some(fret))?;
    if first == last {
        return None;
    }

    if positions[first..=last].iter().all(|p| p.fret().is_some()) {
        Some(Barre {
            fret,
            first_string: first,
            last_string: last,
        })
    } else {
        None
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
