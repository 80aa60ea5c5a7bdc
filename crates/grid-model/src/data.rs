//! Typed value storage for variables and axes.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Numeric element type of a persisted variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// 16-bit signed integer ("short").
    I16,
    /// 32-bit signed integer ("int").
    I32,
    /// 32-bit float ("float").
    F32,
    /// 64-bit float ("double").
    F64,
}

impl ElementType {
    /// Parse a NetCDF-style type name.
    pub fn parse(s: &str) -> ModelResult<Self> {
        match s {
            "short" => Ok(Self::I16),
            "int" => Ok(Self::I32),
            "float" => Ok(Self::F32),
            "double" => Ok(Self::F64),
            other => Err(ModelError::UnknownElementType(other.to_string())),
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::I16 => "short",
            Self::I32 => "int",
            Self::F32 => "float",
            Self::F64 => "double",
        };
        write!(f, "{}", name)
    }
}

/// A flat, typed value array.
///
/// Variables store their values row-major with the horizontal plane
/// innermost (…, y, x). Conversions to f32/f64 are lossy only in the
/// documented integer-to-float sense.
#[derive(Debug, Clone, PartialEq)]
pub enum DataArray {
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl DataArray {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type of the stored values.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::I16(_) => ElementType::I16,
            Self::I32(_) => ElementType::I32,
            Self::F32(_) => ElementType::F32,
            Self::F64(_) => ElementType::F64,
        }
    }

    /// Copy out as f32 (the engine's working representation).
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            Self::I16(v) => v.iter().map(|&x| x as f32).collect(),
            Self::I32(v) => v.iter().map(|&x| x as f32).collect(),
            Self::F32(v) => v.clone(),
            Self::F64(v) => v.iter().map(|&x| x as f32).collect(),
        }
    }

    /// Copy out as f64.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Self::I16(v) => v.iter().map(|&x| x as f64).collect(),
            Self::I32(v) => v.iter().map(|&x| x as f64).collect(),
            Self::F32(v) => v.iter().map(|&x| x as f64).collect(),
            Self::F64(v) => v.clone(),
        }
    }

    /// Build an array of the requested element type from f64 values.
    pub fn from_f64s(ty: ElementType, values: &[f64]) -> Self {
        match ty {
            ElementType::I16 => Self::I16(values.iter().map(|&x| x as i16).collect()),
            ElementType::I32 => Self::I32(values.iter().map(|&x| x as i32).collect()),
            ElementType::F32 => Self::F32(values.iter().map(|&x| x as f32).collect()),
            ElementType::F64 => Self::F64(values.to_vec()),
        }
    }

    /// Build an array of the requested element type from f32 values.
    pub fn from_f32s(ty: ElementType, values: Vec<f32>) -> Self {
        match ty {
            ElementType::F32 => Self::F32(values),
            other => Self::from_f64s(other, &values.iter().map(|&x| x as f64).collect::<Vec<_>>()),
        }
    }

    /// Copy out the contiguous element range `[start, start + len)`.
    pub fn slice(&self, start: usize, len: usize) -> Self {
        match self {
            Self::I16(v) => Self::I16(v[start..start + len].to_vec()),
            Self::I32(v) => Self::I32(v[start..start + len].to_vec()),
            Self::F32(v) => Self::F32(v[start..start + len].to_vec()),
            Self::F64(v) => Self::F64(v[start..start + len].to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_parse() {
        assert_eq!(ElementType::parse("float").unwrap(), ElementType::F32);
        assert_eq!(ElementType::parse("double").unwrap(), ElementType::F64);
        assert_eq!(ElementType::parse("short").unwrap(), ElementType::I16);
        assert!(ElementType::parse("string").is_err());
    }

    #[test]
    fn test_conversion_roundtrip() {
        let a = DataArray::from_f64s(ElementType::F32, &[1.0, 2.5, -3.0]);
        assert_eq!(a.element_type(), ElementType::F32);
        assert_eq!(a.to_f64(), vec![1.0, 2.5, -3.0]);
    }

    #[test]
    fn test_slice() {
        let a = DataArray::F64(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(a.slice(2, 3), DataArray::F64(vec![2.0, 3.0, 4.0]));
    }
}
