//! Temperature conversion for CSV rows.

use crate::error::{IngestError, Result};

/// One temperature expressed in both scales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl TemperatureReading {
    /// Build a reading from Celsius. Rejects NaN and infinities.
    pub fn from_celsius(celsius: f64) -> Result<Self> {
        if !celsius.is_finite() {
            return Err(IngestError::Validation(format!(
                "temperature must be a finite number, got {celsius}"
            )));
        }
        Ok(Self {
            celsius,
            fahrenheit: celsius_to_fahrenheit(celsius),
        })
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Parse a temperature written as text (CSV cells arrive as strings).
pub fn parse_temperature(raw: &str) -> Result<f64> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|_| IngestError::Validation(format!("temperature is not numeric: {raw:?}")))?;
    if !v.is_finite() {
        return Err(IngestError::Validation(format!(
            "temperature must be a finite number, got {raw:?}"
        )));
    }
    Ok(v)
}
