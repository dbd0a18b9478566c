//! Grid configuration: cell size, emission pacing and cell outline style.

use crate::error::{GridError, GridResult};
use crate::glyph::Icon;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Edge length of a square cell, in pixels
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,

    /// Delay between two consecutive emissions, in milliseconds
    #[serde(default)]
    pub emission_delay_ms: u64,

    /// Outline style for cell rectangles
    #[serde(default)]
    pub style: CellStyle,

    /// Icon used when no glyph factory is installed
    #[serde(default)]
    pub default_icon: Icon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    /// Stroke color
    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_fill_color")]
    pub fill_color: String,

    /// Stroke width in pixels
    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: f64,
}

/// Smallest accepted cell edge, in pixels
pub const MIN_CELL_SIZE: f64 = 1.0;

fn default_cell_size() -> f64 { 80.0 }
fn default_color() -> String { "#000".to_string() }
fn default_fill_color() -> String { "#fff".to_string() }
fn default_weight() -> f64 { 1.0 }
fn default_fill_opacity() -> f64 { 0.1 }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            emission_delay_ms: 0,
            style: CellStyle::default(),
            default_icon: Icon::default(),
        }
    }
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            color: default_color(),
            fill_color: default_fill_color(),
            weight: default_weight(),
            fill_opacity: default_fill_opacity(),
        }
    }
}

impl GridConfig {
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_emission_delay(mut self, delay: Duration) -> Self {
        self.emission_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn emission_delay(&self) -> Duration {
        Duration::from_millis(self.emission_delay_ms)
    }

    pub fn validate(&self) -> GridResult<()> {
        if !self.cell_size.is_finite() || self.cell_size < MIN_CELL_SIZE {
            return Err(GridError::invalid_config(format!(
                "cell_size must be at least {} pixel, got {}",
                MIN_CELL_SIZE, self.cell_size
            )));
        }
        if !(0.0..=1.0).contains(&self.style.fill_opacity) {
            return Err(GridError::invalid_config(format!(
                "style.fill_opacity must be within [0, 1], got {}",
                self.style.fill_opacity
            )));
        }
        if !self.style.weight.is_finite() || self.style.weight < 0.0 {
            return Err(GridError::invalid_config(format!(
                "style.weight must be non-negative, got {}",
                self.style.weight
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GridConfig::default();
        assert_eq!(config.cell_size, 80.0);
        assert_eq!(config.emission_delay(), Duration::ZERO);
        assert_eq!(config.style.color, "#000");
        assert_eq!(config.style.fill_color, "#fff");
        assert_eq!(config.style.weight, 1.0);
        assert_eq!(config.style.fill_opacity, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GridConfig = serde_json::from_str(r#"{"cell_size": 64, "style": {"color": "red"}}"#).unwrap();
        assert_eq!(config.cell_size, 64.0);
        assert_eq!(config.style.color, "red");
        assert_eq!(config.style.fill_opacity, 0.1);
        assert_eq!(config.default_icon, Icon::default());
    }

    #[test]
    fn test_validate_rejects_bad_cell_size() {
        for size in [0.0, -5.0, 1e-6, 0.5, f64::NAN, f64::INFINITY] {
            let config = GridConfig::default().with_cell_size(size);
            assert!(matches!(config.validate(), Err(GridError::InvalidConfig { .. })));
        }
    }

    #[test]
    fn test_validate_rejects_bad_opacity() {
        let mut config = GridConfig::default();
        config.style.fill_opacity = 1.5;
        assert!(config.validate().is_err());
    }
}
