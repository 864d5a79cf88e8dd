//! Intensity to visual bucket classification
//!
//! Thresholds use exclusive lower bounds: an intensity sitting exactly on a
//! threshold belongs to the lower bucket (0.3 is `Low`, 0.5 is `Medium`,
//! 0.7 is `MediumHigh`).

use serde::{Deserialize, Serialize};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

pub const BLUE: Rgb = Rgb(0x3B, 0x82, 0xF6);
pub const YELLOW: Rgb = Rgb(0xEA, 0xB3, 0x08);
pub const ORANGE: Rgb = Rgb(0xF9, 0x73, 0x16);
pub const RED: Rgb = Rgb(0xEF, 0x44, 0x44);

/// Stroke settings shared by every bucket
pub const STROKE_WEIGHT: f32 = 2.0;
pub const STROKE_OPACITY: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DensityLevel {
    Low,
    Medium,
    MediumHigh,
    High,
}

impl std::fmt::Display for DensityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DensityLevel::Low => write!(f, "low"),
            DensityLevel::Medium => write!(f, "medium"),
            DensityLevel::MediumHigh => write!(f, "medium-high"),
            DensityLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityBucket {
    pub level: DensityLevel,
    pub color_token: &'static str,
    pub color: Rgb,
    pub fill_opacity: f32,
    pub pulsing: bool,
}

/// Maps an intensity to its bucket
///
/// Total over `f64`: anything at or below 0.3 (including negatives and NaN)
/// is `Low`, anything above 0.7 is `High`.
pub fn classify(intensity: f64) -> DensityBucket {
    if intensity > 0.7 {
        DensityBucket {
            level: DensityLevel::High,
            color_token: "red",
            color: RED,
            fill_opacity: 0.6,
            pulsing: true,
        }
    } else if intensity > 0.5 {
        DensityBucket {
            level: DensityLevel::MediumHigh,
            color_token: "orange",
            color: ORANGE,
            fill_opacity: 0.5,
            pulsing: false,
        }
    } else if intensity > 0.3 {
        DensityBucket {
            level: DensityLevel::Medium,
            color_token: "yellow",
            color: YELLOW,
            fill_opacity: 0.4,
            pulsing: false,
        }
    } else {
        DensityBucket {
            level: DensityLevel::Low,
            color_token: "blue",
            color: BLUE,
            fill_opacity: 0.3,
            pulsing: false,
        }
    }
}

/// One row of the crowd density legend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendEntry {
    pub label: &'static str,
    pub range: &'static str,
    pub color: Rgb,
    pub pulsing: bool,
}

pub const LEGEND: [LegendEntry; 4] = [
    LegendEntry {
        label: "Low",
        range: "0-30%",
        color: BLUE,
        pulsing: false,
    },
    LegendEntry {
        label: "Medium",
        range: "30-60%",
        color: YELLOW,
        pulsing: false,
    },
    LegendEntry {
        label: "High",
        range: "60-80%",
        color: ORANGE,
        pulsing: false,
    },
    LegendEntry {
        label: "Extreme",
        range: "80-100%",
        color: RED,
        pulsing: true,
    },
];

pub const LEGEND_TITLE: &str = "Crowd Density";
pub const LEGEND_FOOTER: &str = "Live updates every 3s";
