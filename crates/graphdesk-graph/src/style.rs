//! Graph view style system.
//!
//! Group colours come from a fixed table for the well-known categories and
//! from a cyclic palette for everything else.

use crate::model::VisualNode;
use graphdesk_core::MasteryStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `#rgb`; the leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Some(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color `{value}`"))
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_hex()
    }
}

// Category colors
pub const COMPETENCY_COLOR: Color = Color::rgb(0xd6, 0x27, 0x28);
pub const SKILL_COLOR: Color = Color::rgb(0x1f, 0x77, 0xb4);
pub const CONCEPT_COLOR: Color = Color::rgb(0x2c, 0xa0, 0x2c);
pub const STAGE_COLOR: Color = Color::rgb(0x94, 0x67, 0xbd);

pub const KNOWN_GROUP_COLORS: [(&str, Color); 4] = [
    ("Competency", COMPETENCY_COLOR),
    ("Skill", SKILL_COLOR),
    ("Concept", CONCEPT_COLOR),
    ("Stage", STAGE_COLOR),
];

pub const PALETTE: [Color; 10] = [
    Color::rgb(0x1f, 0x77, 0xb4),
    Color::rgb(0xff, 0x7f, 0x0e),
    Color::rgb(0x2c, 0xa0, 0x2c),
    Color::rgb(0xd6, 0x27, 0x28),
    Color::rgb(0x94, 0x67, 0xbd),
    Color::rgb(0x8c, 0x56, 0x4b),
    Color::rgb(0xe3, 0x77, 0xc2),
    Color::rgb(0x7f, 0x7f, 0x7f),
    Color::rgb(0xbc, 0xbd, 0x22),
    Color::rgb(0x17, 0xbe, 0xcf),
];

pub fn palette_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

pub fn known_group_color(group: &str) -> Option<Color> {
    KNOWN_GROUP_COLORS
        .iter()
        .find(|(name, _)| *name == group)
        .map(|(_, color)| *color)
}

/// Colour per distinct group; unknown groups take the palette entry at their
/// first-seen position among all groups in `nodes`.
pub fn assign_group_colors(nodes: &[VisualNode]) -> BTreeMap<String, Color> {
    let mut colors = BTreeMap::new();
    let mut seen = 0usize;
    for node in nodes {
        if colors.contains_key(&node.group) {
            continue;
        }
        let color = known_group_color(&node.group).unwrap_or_else(|| palette_color(seen));
        colors.insert(node.group.clone(), color);
        seen += 1;
    }
    colors
}

pub const HIGHLIGHT_BORDER: Color = Color::rgb(0x33, 0x33, 0x33);

/// Extra node decoration for a mastery status; never changes group or label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHighlight {
    pub background: Color,
    pub border: Color,
    pub border_width: u8,
}

pub fn status_highlight(status: Option<MasteryStatus>) -> Option<StatusHighlight> {
    let (background, border_width) = match status? {
        MasteryStatus::Mastered => (Color::rgb(0x4c, 0xaf, 0x50), 1),
        MasteryStatus::InProgress => (Color::rgb(0xff, 0xeb, 0x3b), 3),
        MasteryStatus::NotStarted => (Color::rgb(0x9e, 0x9e, 0x9e), 1),
    };
    Some(StatusHighlight {
        background,
        border: HIGHLIGHT_BORDER,
        border_width,
    })
}
