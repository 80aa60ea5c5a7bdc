//! Dataset schema: dimensions, variables and attributes.
//!
//! The schema is a plain value type describing one dataset. Coordinate
//! systems and interpolation engines refer to schema entries by *name*
//! rather than holding references, so the schema can be freely cloned and
//! rewritten when a view changes the grid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{DataArray, ElementType};
use crate::error::{ModelError, ModelResult};

/// Attribute name carrying the fill sentinel of a variable.
pub const FILL_VALUE_ATTR: &str = "_FillValue";

/// An attribute value, either textual or numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Double(f64),
    Doubles(Vec<f64>),
}

impl AttrValue {
    /// The textual content, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The scalar numeric content, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Doubles(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

/// A named dimension with a fixed or unlimited length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub length: usize,
    pub unlimited: bool,
}

impl Dimension {
    /// Create a fixed-length dimension.
    pub fn new(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
            unlimited: false,
        }
    }

    /// Create an unlimited (record) dimension.
    pub fn unlimited(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
            unlimited: true,
        }
    }
}

/// Tag marking a variable as one component of a spatial vector pair.
///
/// `direction` is free text containing `x`/`longitude` for the first
/// component or `y`/`latitude` for the second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialVector {
    pub counterpart: String,
    pub direction: String,
}

/// A variable: element type, dimension list, attributes and optional
/// in-memory data (axes and projection variables carry their values).
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    element_type: ElementType,
    dims: Vec<String>,
    attributes: BTreeMap<String, AttrValue>,
    data: Option<DataArray>,
    spatial_vector: Option<SpatialVector>,
}

impl Variable {
    /// Create a data-less variable. Dimensions are listed outermost first;
    /// the horizontal plane is the innermost (y, x) pair.
    pub fn new(name: impl Into<String>, element_type: ElementType, dims: Vec<String>) -> Self {
        Self {
            name: name.into(),
            element_type,
            dims,
            attributes: BTreeMap::new(),
            data: None,
            spatial_vector: None,
        }
    }

    /// Builder-style attachment of in-memory data.
    pub fn with_data(mut self, data: DataArray) -> Self {
        self.data = Some(data);
        self
    }

    /// Builder-style attachment of an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style spatial-vector tagging.
    pub fn with_spatial_vector(
        mut self,
        counterpart: impl Into<String>,
        direction: impl Into<String>,
    ) -> Self {
        self.spatial_vector = Some(SpatialVector {
            counterpart: counterpart.into(),
            direction: direction.into(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn set_element_type(&mut self, ty: ElementType) {
        self.element_type = ty;
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn set_dims(&mut self, dims: Vec<String>) {
        self.dims = dims;
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&DataArray> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: DataArray) {
        self.data = Some(data);
    }

    pub fn spatial_vector(&self) -> Option<&SpatialVector> {
        self.spatial_vector.as_ref()
    }
}

/// A dataset schema: ordered dimensions and variables plus global
/// attributes.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    dimensions: Vec<Dimension>,
    variables: Vec<Variable>,
    attributes: BTreeMap<String, AttrValue>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dimension, replacing any existing one of the same name.
    pub fn add_dimension(&mut self, dim: Dimension) {
        match self.dimensions.iter().position(|d| d.name == dim.name) {
            Some(pos) => self.dimensions[pos] = dim,
            None => self.dimensions.push(dim),
        }
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn dimension_mut(&mut self, name: &str) -> Option<&mut Dimension> {
        self.dimensions.iter_mut().find(|d| d.name == name)
    }

    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimension(name).is_some()
    }

    pub fn remove_dimension(&mut self, name: &str) {
        self.dimensions.retain(|d| d.name != name);
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// The record dimension, if the dataset has one.
    pub fn unlimited_dimension(&self) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.unlimited)
    }

    /// Add a variable, replacing any existing one of the same name.
    pub fn add_variable(&mut self, var: Variable) {
        match self.variables.iter().position(|v| v.name == var.name) {
            Some(pos) => self.variables[pos] = var,
            None => self.variables.push(var),
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    pub fn remove_variable(&mut self, name: &str) {
        self.variables.retain(|v| v.name != name);
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    pub fn global_attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn set_global_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Attribute lookup on a variable.
    pub fn attribute(&self, var: &str, name: &str) -> Option<&AttrValue> {
        self.variable(var).and_then(|v| v.attribute(name))
    }

    /// Set an attribute on a variable, erroring when the variable is
    /// missing.
    pub fn set_attribute(
        &mut self,
        var: &str,
        name: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> ModelResult<()> {
        let v = self
            .variable_mut(var)
            .ok_or_else(|| ModelError::UnknownVariable(var.to_string()))?;
        v.set_attribute(name, value);
        Ok(())
    }

    /// Remove an attribute from a variable if both exist.
    pub fn remove_attribute(&mut self, var: &str, name: &str) {
        if let Some(v) = self.variable_mut(var) {
            v.remove_attribute(name);
        }
    }

    /// Names of all variables carrying the given attribute.
    pub fn find_variables_with_attribute(&self, attr: &str) -> Vec<String> {
        self.variables
            .iter()
            .filter(|v| v.attribute(attr).is_some())
            .map(|v| v.name.clone())
            .collect()
    }

    /// The fill sentinel of a variable. Without a `_FillValue` attribute
    /// NaN is the missing marker already, so NaN is returned.
    pub fn fill_value(&self, var: &str) -> f64 {
        self.attribute(var, FILL_VALUE_ATTR)
            .and_then(|a| a.as_f64())
            .unwrap_or(f64::NAN)
    }

    /// Number of elements in one record slice of a variable (all
    /// dimensions except an unlimited one).
    pub fn slice_len(&self, var: &Variable) -> usize {
        var.dims()
            .iter()
            .filter_map(|d| self.dimension(d))
            .filter(|d| !d.unlimited)
            .map(|d| d.length)
            .product()
    }

    /// Slice in-memory data of a variable at the given record position.
    ///
    /// Variables without an unlimited dimension return their full data for
    /// every position.
    pub fn memory_slice(&self, name: &str, unlim_pos: usize) -> ModelResult<DataArray> {
        let var = self
            .variable(name)
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))?;
        let data = var
            .data()
            .ok_or_else(|| ModelError::NoData(name.to_string()))?;
        let has_unlimited = var
            .dims()
            .iter()
            .any(|d| self.dimension(d).is_some_and(|dim| dim.unlimited));
        if !has_unlimited {
            return Ok(data.clone());
        }
        let record = self.slice_len(var);
        let start = unlim_pos * record;
        if start + record > data.len() {
            return Err(ModelError::invalid_slice(
                name,
                format!(
                    "record {} of size {} exceeds data length {}",
                    unlim_pos,
                    record,
                    data.len()
                ),
            ));
        }
        Ok(data.slice(start, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_with_record_var() -> Schema {
        let mut schema = Schema::new();
        schema.add_dimension(Dimension::unlimited("time", 2));
        schema.add_dimension(Dimension::new("x", 3));
        schema.add_variable(
            Variable::new("v", ElementType::F32, vec!["time".into(), "x".into()])
                .with_data(DataArray::F32(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])),
        );
        schema
    }

    #[test]
    fn test_memory_slice_record() {
        let schema = schema_with_record_var();
        assert_eq!(
            schema.memory_slice("v", 1).unwrap(),
            DataArray::F32(vec![3.0, 4.0, 5.0])
        );
        assert!(schema.memory_slice("v", 2).is_err());
    }

    #[test]
    fn test_memory_slice_static() {
        let mut schema = Schema::new();
        schema.add_dimension(Dimension::new("x", 2));
        schema.add_variable(
            Variable::new("x", ElementType::F64, vec!["x".into()])
                .with_data(DataArray::F64(vec![10.0, 20.0])),
        );
        // no unlimited dimension: full data at any position
        assert_eq!(
            schema.memory_slice("x", 5).unwrap(),
            DataArray::F64(vec![10.0, 20.0])
        );
    }

    #[test]
    fn test_fill_value_default_nan() {
        let schema = schema_with_record_var();
        assert!(schema.fill_value("v").is_nan());
    }

    #[test]
    fn test_attribute_roundtrip() {
        let mut schema = schema_with_record_var();
        schema.set_attribute("v", "units", "K").unwrap();
        assert_eq!(
            schema.attribute("v", "units").and_then(|a| a.as_text()),
            Some("K")
        );
        schema.remove_attribute("v", "units");
        assert!(schema.attribute("v", "units").is_none());
        assert!(schema.set_attribute("missing", "units", "K").is_err());
    }

    #[test]
    fn test_find_variables_with_attribute() {
        let mut schema = schema_with_record_var();
        schema.set_attribute("v", "grid_mapping_name", "stereographic").unwrap();
        assert_eq!(
            schema.find_variables_with_attribute("grid_mapping_name"),
            vec!["v".to_string()]
        );
    }
}
