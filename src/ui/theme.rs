//! Terminal palette.
//!
//! Evidence tiers get a traffic-light scale so the strength of a policy's
//! evidence reads at a glance. When color is disabled every method returns
//! the text untouched, which keeps plain output byte-stable for tests and
//! pipes.

use colored::{Color, Colorize};

use crate::model::types::{EvidenceQuality, FacetValue};

pub mod colors {
    use colored::Color;

    /// Headings and policy names.
    pub const HEADING: Color = Color::TrueColor {
        r: 122,
        g: 162,
        b: 247,
    };

    /// Secondary metadata (country, years).
    pub const MUTED: Color = Color::TrueColor {
        r: 105,
        g: 114,
        b: 158,
    };

    pub const EVIDENCE_HIGH: Color = Color::TrueColor {
        r: 158,
        g: 206,
        b: 106,
    };
    pub const EVIDENCE_MODERATE: Color = Color::TrueColor {
        r: 115,
        g: 218,
        b: 202,
    };
    pub const EVIDENCE_EMERGING: Color = Color::TrueColor {
        r: 224,
        g: 175,
        b: 104,
    };
    pub const EVIDENCE_LOW: Color = Color::TrueColor {
        r: 255,
        g: 158,
        b: 100,
    };
    pub const EVIDENCE_NONE: Color = Color::TrueColor {
        r: 247,
        g: 118,
        b: 142,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub enabled: bool,
}

impl Theme {
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn colored() -> Self {
        Self { enabled: true }
    }

    pub fn heading(&self, text: &str) -> String {
        if self.enabled {
            text.color(colors::HEADING).bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(text, colors::MUTED)
    }

    pub fn evidence(&self, quality: EvidenceQuality) -> String {
        self.paint(quality.label(), evidence_color(quality))
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }
}

pub fn evidence_color(quality: EvidenceQuality) -> Color {
    match quality {
        EvidenceQuality::High => colors::EVIDENCE_HIGH,
        EvidenceQuality::Moderate => colors::EVIDENCE_MODERATE,
        EvidenceQuality::Emerging => colors::EVIDENCE_EMERGING,
        EvidenceQuality::Low => colors::EVIDENCE_LOW,
        EvidenceQuality::None => colors::EVIDENCE_NONE,
    }
}
