//! Municipality code representations.
//!
//! Codes arrive in whatever type the source format used: text in a CSV
//! cell, a number or a string in a `GeoJSON` property. Raw codes compare by
//! representation, so `"005"` and `5` are different keys until both sides
//! are coerced into a [`MunicipalityCode`].

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Canonical integer municipality code (DANE `COD_MUN`, e.g. `27001`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MunicipalityCode(pub i64);

impl std::fmt::Display for MunicipalityCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a raw code cannot be cast to an integer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodeError {
    /// Text that is neither an integer nor a number.
    #[error("municipality code '{value}' is not numeric")]
    NotNumeric {
        /// The offending text.
        value: String,
    },

    /// NaN, infinite, or outside the `i64` range.
    #[error("municipality code {value} cannot be represented as an integer")]
    OutOfRange {
        /// The offending number.
        value: f64,
    },
}

/// A municipality code as it was read, before coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMunicipalityCode {
    /// Integral number.
    Integer(i64),
    /// Floating-point number (e.g. `27001.0` from a float-typed column).
    Float(f64),
    /// Text (e.g. `"27001"` or zero-padded `"005"`).
    Text(String),
}

impl RawMunicipalityCode {
    /// Casts the code to the canonical integer domain.
    ///
    /// Text is trimmed and parsed as an integer, falling back to a float
    /// parse. Floats are truncated toward zero, the same as an integer cast.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError`] for non-numeric text and for non-finite or
    /// out-of-range floats.
    pub fn coerce(&self) -> Result<MunicipalityCode, CodeError> {
        match self {
            Self::Integer(v) => Ok(MunicipalityCode(*v)),
            Self::Float(v) => truncate(*v),
            Self::Text(s) => {
                let trimmed = s.trim();
                if let Ok(v) = trimmed.parse::<i64>() {
                    return Ok(MunicipalityCode(v));
                }
                let v = trimmed.parse::<f64>().map_err(|_| CodeError::NotNumeric {
                    value: s.clone(),
                })?;
                truncate(v)
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(v: f64) -> Result<MunicipalityCode, CodeError> {
    if !v.is_finite() || v >= i64::MAX as f64 || v < i64::MIN as f64 {
        return Err(CodeError::OutOfRange { value: v });
    }
    Ok(MunicipalityCode(v.trunc() as i64))
}

// Floats compare by bit pattern so that raw codes can key a hash map.
impl PartialEq for RawMunicipalityCode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for RawMunicipalityCode {}

impl Hash for RawMunicipalityCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Integer(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Text(v) => v.hash(state),
        }
    }
}

impl std::fmt::Display for RawMunicipalityCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for RawMunicipalityCode {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for RawMunicipalityCode {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}
