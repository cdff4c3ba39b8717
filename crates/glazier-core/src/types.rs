//! # Domain Types
//!
//! Core domain types used throughout Glazier.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Thickness     │   │    Material     │   │     Shape       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sixteenths     │   │  Clear          │   │  Rectangular    │       │
//! │  │  4 = 1/4"       │   │  LowIron        │   │  Circular       │       │
//! │  │  6 = 3/8"       │   │  Tinted         │   │  Irregular      │       │
//! │  └─────────────────┘   │  Frosted        │   └─────────────────┘       │
//! │                        │  Mirror         │                              │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────┐     │
//! │  │ QuoteRequest = Shape + Material + Thickness + options + qty   │     │
//! │  └───────────────────────────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dimensions are exact decimal inches. JSON accepts them as numbers or
//! strings and writes them back as strings. Fraction entry ("23 7/8") is
//! parsed by the form before the request reaches this crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ParseThicknessError;

// =============================================================================
// Thickness
// =============================================================================

/// Glass thickness in whole sixteenths of an inch.
///
/// ## Why Sixteenths?
/// Stock glass comes in 1/8", 3/16", 1/4", 3/8", 1/2", 5/8", 3/4" and 1".
/// Every one of those is a whole number of sixteenths, so thickness is an
/// exact integer key with a total order ("thinnest stocked" is well defined).
///
/// Serialized as the reduced fraction label: `"1/4"`, `"3/16"`, `"1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Thickness(u16);

impl Thickness {
    /// Creates a thickness from sixteenths of an inch.
    #[inline]
    pub const fn from_sixteenths(sixteenths: u16) -> Self {
        Thickness(sixteenths)
    }

    /// Returns the thickness in sixteenths of an inch.
    #[inline]
    pub const fn sixteenths(&self) -> u16 {
        self.0
    }

    /// Returns the thickness in decimal inches (display only).
    #[inline]
    pub fn inches(&self) -> f64 {
        self.0 as f64 / 16.0
    }

    /// Returns the reduced fraction label without the inch mark.
    ///
    /// ## Example
    /// ```rust
    /// use glazier_core::types::Thickness;
    ///
    /// assert_eq!(Thickness::from_sixteenths(4).label(), "1/4");
    /// assert_eq!(Thickness::from_sixteenths(3).label(), "3/16");
    /// assert_eq!(Thickness::from_sixteenths(16).label(), "1");
    /// assert_eq!(Thickness::from_sixteenths(20).label(), "1 1/4");
    /// ```
    pub fn label(&self) -> String {
        let whole = self.0 / 16;
        let rem = self.0 % 16;
        if rem == 0 {
            return whole.to_string();
        }

        let divisor = gcd(rem, 16);
        let fraction = format!("{}/{}", rem / divisor, 16 / divisor);
        if whole == 0 {
            fraction
        } else {
            format!("{} {}", whole, fraction)
        }
    }
}

fn gcd(mut a: u16, mut b: u16) -> u16 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\"", self.label())
    }
}

/// Parses `"1/4"`, `"3/16\""`, `"1 1/4"`, `"1"` or decimal `"0.25"`.
impl FromStr for Thickness {
    type Err = ParseThicknessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| ParseThicknessError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim().trim_end_matches('"').trim_end_matches("in").trim();
        if trimmed.is_empty() {
            return Err(err("empty"));
        }

        let inches = match trimmed.split_once(' ') {
            Some((whole, fraction)) => {
                let whole: f64 = whole.parse().map_err(|_| err("bad whole inches"))?;
                whole + parse_fraction(fraction.trim()).ok_or_else(|| err("bad fraction"))?
            }
            None if trimmed.contains('/') => {
                parse_fraction(trimmed).ok_or_else(|| err("bad fraction"))?
            }
            None => trimmed.parse::<f64>().map_err(|_| err("not a number"))?,
        };

        let sixteenths = inches * 16.0;
        if !sixteenths.is_finite() || sixteenths <= 0.0 {
            return Err(err("must be positive"));
        }
        if (sixteenths - sixteenths.round()).abs() > 1e-9 {
            return Err(err("must be a whole number of sixteenths"));
        }
        if sixteenths > u16::MAX as f64 {
            return Err(err("too thick"));
        }

        Ok(Thickness(sixteenths.round() as u16))
    }
}

fn parse_fraction(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

impl Serialize for Thickness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for Thickness {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Material
// =============================================================================

/// Glass material stocked by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Clear,
    LowIron,
    Tinted,
    Frosted,
    /// Silvered glass. Cannot be tempered or clipped; always flat-polished.
    Mirror,
}

impl Material {
    /// All stocked materials, in display order.
    pub const ALL: [Material; 5] = [
        Material::Clear,
        Material::LowIron,
        Material::Tinted,
        Material::Frosted,
        Material::Mirror,
    ];

    #[inline]
    pub const fn is_mirror(&self) -> bool {
        matches!(self, Material::Mirror)
    }

    /// Returns the snake_case name used in JSON and the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Material::Clear => "clear",
            Material::LowIron => "low_iron",
            Material::Tinted => "tinted",
            Material::Frosted => "frosted",
            Material::Mirror => "mirror",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Shape
// =============================================================================

/// The cut shape, carrying the dimensions that shape needs.
///
/// A circle has only a diameter, so "circle with a width" cannot be written.
/// `Irregular` covers every other non-rectangular cut; it is priced on its
/// bounding box and draws the shape markup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Rectangular {
        #[ts(type = "string")]
        width_in: Decimal,
        #[ts(type = "string")]
        height_in: Decimal,
    },
    Circular {
        #[ts(type = "string")]
        diameter_in: Decimal,
    },
    Irregular {
        #[ts(type = "string")]
        width_in: Decimal,
        #[ts(type = "string")]
        height_in: Decimal,
    },
}

impl Shape {
    #[inline]
    pub const fn is_circular(&self) -> bool {
        matches!(self, Shape::Circular { .. })
    }

    #[inline]
    pub const fn is_rectangular(&self) -> bool {
        matches!(self, Shape::Rectangular { .. })
    }

    /// Returns each (name, inches) dimension the shape carries.
    pub fn dimensions(&self) -> Vec<(&'static str, Decimal)> {
        match *self {
            Shape::Rectangular { width_in, height_in } | Shape::Irregular { width_in, height_in } => {
                vec![("width_in", width_in), ("height_in", height_in)]
            }
            Shape::Circular { diameter_in } => vec![("diameter_in", diameter_in)],
        }
    }
}

// =============================================================================
// Quote Request
// =============================================================================

/// One piece of glass to price. Exists only for the duration of one call.
///
/// ## Example
/// ```rust
/// use glazier_core::types::{Material, QuoteRequest, Shape, Thickness};
/// use rust_decimal::Decimal;
///
/// let request = QuoteRequest::new(
///     Shape::Rectangular { width_in: Decimal::from(24), height_in: Decimal::from(36) },
///     Material::Clear,
///     Thickness::from_sixteenths(4),
/// )
/// .polished(true)
/// .tempered(true);
///
/// assert_eq!(request.quantity, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteRequest {
    pub shape: Shape,
    pub material: Material,
    #[ts(as = "String")]
    pub thickness: Thickness,
    #[serde(default)]
    pub polish: bool,
    #[serde(default)]
    pub beveled: bool,
    #[serde(default)]
    pub tempered: bool,
    /// Contractor pricing (discounted).
    #[serde(default)]
    pub contractor: bool,
    /// Number of clipped corners (0-4).
    #[serde(default)]
    pub corner_count: u32,
    /// Leg length of each corner clip in inches; selects the size tier.
    #[serde(default)]
    #[ts(type = "string | null")]
    pub corner_clip_in: Option<Decimal>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl QuoteRequest {
    /// Creates a request for a single plain piece (no options).
    pub fn new(shape: Shape, material: Material, thickness: Thickness) -> Self {
        QuoteRequest {
            shape,
            material,
            thickness,
            polish: false,
            beveled: false,
            tempered: false,
            contractor: false,
            corner_count: 0,
            corner_clip_in: None,
            quantity: default_quantity(),
        }
    }

    pub fn polished(mut self, polish: bool) -> Self {
        self.polish = polish;
        self
    }

    pub fn beveled(mut self, beveled: bool) -> Self {
        self.beveled = beveled;
        self
    }

    pub fn tempered(mut self, tempered: bool) -> Self {
        self.tempered = tempered;
        self
    }

    pub fn contractor(mut self, contractor: bool) -> Self {
        self.contractor = contractor;
        self
    }

    /// Sets clipped corners: how many, and the clip leg length in inches.
    pub fn clipped_corners(mut self, count: u32, clip_in: Decimal) -> Self {
        self.corner_count = count;
        self.corner_clip_in = Some(clip_in);
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
