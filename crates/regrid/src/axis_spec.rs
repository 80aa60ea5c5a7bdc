//! Textual output-axis specifications.
//!
//! Three forms are accepted:
//!
//! * an explicit list: `"0,10,20,30"`;
//! * an arithmetic expansion: `"0,10,...,100"` (step taken from the first
//!   two values, last value inclusive within half a step);
//! * open-ended: `"auto,2500,auto"` — a step with start and end filled in
//!   later from the projected bounding box of the source.

use crate::error::{RegridError, Result};

/// A parsed axis specification, possibly awaiting bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    step: Option<f64>,
    start: Option<f64>,
    end: Option<f64>,
    values: Option<Vec<f64>>,
}

impl AxisSpec {
    /// Parse a specification string.
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(RegridError::AxisSpec(spec.to_string()));
        }

        if parts.len() == 3 && parts[0] == "auto" && parts[2] == "auto" {
            let step = parse_number(parts[1], spec)?;
            if step == 0.0 {
                return Err(RegridError::AxisSpec(spec.to_string()));
            }
            return Ok(Self {
                step: Some(step),
                start: None,
                end: None,
                values: None,
            });
        }

        if let Some(dots) = parts.iter().position(|&p| p == "...") {
            // first,second,...,last
            if dots != 2 || parts.len() != 4 {
                return Err(RegridError::AxisSpec(spec.to_string()));
            }
            let first = parse_number(parts[0], spec)?;
            let second = parse_number(parts[1], spec)?;
            let last = parse_number(parts[3], spec)?;
            let step = second - first;
            if step == 0.0 || (last - first) / step < 0.0 {
                return Err(RegridError::AxisSpec(spec.to_string()));
            }
            return Ok(Self {
                step: None,
                start: None,
                end: None,
                values: Some(expand(first, step, last)),
            });
        }

        let values = parts
            .iter()
            .map(|p| parse_number(p, spec))
            .collect::<Result<Vec<f64>>>()?;
        if values.is_empty() {
            return Err(RegridError::AxisSpec(spec.to_string()));
        }
        Ok(Self {
            step: None,
            start: None,
            end: None,
            values: Some(values),
        })
    }

    /// Whether start/end still have to be supplied from a bounding box.
    pub fn requires_bounds(&self) -> bool {
        self.values.is_none() && (self.start.is_none() || self.end.is_none())
    }

    /// Supply the detected bounds of an open-ended specification. The
    /// start snaps down to a multiple of the step so neighbouring grids
    /// align.
    pub fn set_bounds(&mut self, start: f64, end: f64) {
        self.start = Some(start);
        self.end = Some(end);
    }

    /// The axis values. Errors when bounds are still missing.
    pub fn values(&self) -> Result<Vec<f64>> {
        if let Some(values) = &self.values {
            return Ok(values.clone());
        }
        let (Some(step), Some(start), Some(end)) = (self.step, self.start, self.end) else {
            return Err(RegridError::AxisSpec(
                "axis bounds not yet detected".to_string(),
            ));
        };
        let aligned = (start / step).floor() * step;
        // the expanded axis must cover the detected end
        let n = (((end - aligned) / step) - 1e-9).ceil().max(0.0) as i64;
        Ok((0..=n).map(|i| aligned + step * i as f64).collect())
    }
}

fn parse_number(text: &str, spec: &str) -> Result<f64> {
    text.parse()
        .map_err(|_| RegridError::AxisSpec(spec.to_string()))
}

fn expand(first: f64, step: f64, last: f64) -> Vec<f64> {
    let mut values = Vec::new();
    let n = ((last - first) / step + 0.5).floor() as i64;
    for i in 0..=n.max(0) {
        values.push(first + step * i as f64);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_list() {
        let spec = AxisSpec::parse("0,10,20,30").unwrap();
        assert!(!spec.requires_bounds());
        assert_eq!(spec.values().unwrap(), vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_arithmetic_expansion() {
        let spec = AxisSpec::parse("0,10,...,40").unwrap();
        assert_eq!(spec.values().unwrap(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_descending_expansion() {
        let spec = AxisSpec::parse("40,30,...,0").unwrap();
        assert_eq!(spec.values().unwrap(), vec![40.0, 30.0, 20.0, 10.0, 0.0]);
    }

    #[test]
    fn test_auto_bounds() {
        let mut spec = AxisSpec::parse("auto,2500,auto").unwrap();
        assert!(spec.requires_bounds());
        assert!(spec.values().is_err());
        spec.set_bounds(-5200.0, 4800.0);
        let values = spec.values().unwrap();
        assert_eq!(values[0], -7500.0);
        assert_eq!(*values.last().unwrap(), 5000.0);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(AxisSpec::parse("").is_err());
        assert!(AxisSpec::parse("1,2,,4").is_err());
        assert!(AxisSpec::parse("0,0,...,10").is_err());
        assert!(AxisSpec::parse("0,10,...,-30").is_err());
        assert!(AxisSpec::parse("auto,0,auto").is_err());
    }
}
