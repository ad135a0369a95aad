//! Catalog of optical media.
//!
//! Media are immutable and come from a fixed table. Only the refractive index
//! takes part in the optics; the color and description are for presentation.

use serde::Serialize;

use crate::error::{OpticsError, OpticsResult};

/// Speed of light in vacuum in km/s.
pub const SPEED_OF_LIGHT: f64 = 299_792.458;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Medium {
    pub name: &'static str,
    pub refractive_index: f64,
    /// Hex color in the form `#rrggbb`.
    pub color: &'static str,
    pub description: &'static str,
}

pub const VACUUM: Medium = Medium {
    name: "Vacuum",
    refractive_index: 1.00,
    color: "#1a1a2e",
    description: "Empty space, where light travels fastest.",
};
pub const AIR: Medium = Medium {
    name: "Air",
    refractive_index: 1.0003,
    color: "#eef2f3",
    description: "The air we breathe.",
};
pub const WATER: Medium = Medium {
    name: "Water",
    refractive_index: 1.33,
    color: "#00b4d8",
    description: "Like in a swimming pool.",
};
pub const GLASS: Medium = Medium {
    name: "Glass",
    refractive_index: 1.50,
    color: "#a8dadc",
    description: "Like a window pane or a lens.",
};
pub const DIAMOND: Medium = Medium {
    name: "Diamond",
    refractive_index: 2.42,
    color: "#e0aaff",
    description: "Super sparkly and optically dense.",
};

/// All catalog media, ordered by refractive index.
pub const CATALOG: [Medium; 5] = [VACUUM, AIR, WATER, GLASS, DIAMOND];

impl Medium {
    /// A medium outside the catalog, e.g. from a command line override.
    pub fn custom(refractive_index: f64) -> OpticsResult<Self> {
        validate_index(refractive_index)?;
        Ok(Self {
            name: "Custom",
            refractive_index,
            color: "#808080",
            description: "A user supplied refractive index.",
        })
    }

    /// Speed of light inside the medium in km/s.
    pub fn light_speed(&self) -> f64 {
        SPEED_OF_LIGHT / self.refractive_index
    }

    /// Parses [`Medium::color`] into its red, green and blue components.
    pub fn rgb(&self) -> OpticsResult<[u8; 3]> {
        let hex = self.color.strip_prefix('#').unwrap_or(self.color);
        let invalid = || OpticsError::InvalidInput(format!("invalid color '{}'", self.color));
        if hex.len() != 6 {
            return Err(invalid());
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        Ok([(value >> 16) as u8, (value >> 8) as u8, value as u8])
    }
}

/// Looks up a catalog medium by name, ignoring case.
pub fn by_name(name: &str) -> OpticsResult<Medium> {
    CATALOG
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
        .copied()
        .ok_or_else(|| OpticsError::UnknownMedium(name.to_string()))
}

/// Checks that a refractive index is finite and strictly positive.
pub fn validate_index(n: f64) -> OpticsResult<()> {
    if !n.is_finite() || n <= 0.0 {
        return Err(OpticsError::InvalidInput(format!(
            "refractive index must be finite and > 0, got {n}"
        )));
    }
    Ok(())
}
