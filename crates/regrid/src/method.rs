//! Interpolation method tags and their families.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegridError;
use crate::forward::ForwardAggregation;

/// Interpolation method for grid reprojection.
///
/// Three families: projection-based backward kernels, coordinate-based
/// nearest neighbour, and forward aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    /// Nearest grid point (preserves exact values).
    Nearest,
    /// Bilinear interpolation (smooth, slight value changes).
    Bilinear,
    /// Bicubic interpolation (smoothest, more compute).
    Bicubic,
    /// Nearest neighbour on lon/lat coordinates, latitude-sorted search.
    CoordNn,
    /// Nearest neighbour on lon/lat coordinates, KD-tree search.
    CoordNnKd,
    /// Forward aggregation: sum of contributing source cells.
    ForwardSum,
    /// Forward aggregation: mean of contributing source cells.
    ForwardMean,
    /// Forward aggregation: median of contributing source cells.
    ForwardMedian,
    /// Forward aggregation: maximum of contributing source cells.
    ForwardMax,
    /// Forward aggregation: minimum of contributing source cells.
    ForwardMin,
}

/// Sampling kernel of the backward interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Nearest,
    Bilinear,
    Bicubic,
}

impl InterpolationMethod {
    /// Whether this method samples the source through projected axis
    /// positions (nearest/bilinear/bicubic).
    pub fn is_projection_kernel(&self) -> bool {
        matches!(self, Self::Nearest | Self::Bilinear | Self::Bicubic)
    }

    /// Whether this method locates source cells through their lon/lat
    /// coordinates.
    pub fn is_coordinate(&self) -> bool {
        matches!(self, Self::CoordNn | Self::CoordNnKd)
    }

    /// Whether this method aggregates source cells forward into output
    /// cells.
    pub fn is_forward(&self) -> bool {
        self.aggregation().is_some()
    }

    /// The backward sampling kernel, when the method uses one. Coordinate
    /// methods resolve to nearest sampling on precomputed integer
    /// positions.
    pub fn kernel(&self) -> Option<Kernel> {
        match self {
            Self::Nearest | Self::CoordNn | Self::CoordNnKd => Some(Kernel::Nearest),
            Self::Bilinear => Some(Kernel::Bilinear),
            Self::Bicubic => Some(Kernel::Bicubic),
            _ => None,
        }
    }

    /// The forward reduction, when the method is a forward aggregation.
    pub fn aggregation(&self) -> Option<ForwardAggregation> {
        match self {
            Self::ForwardSum => Some(ForwardAggregation::Sum),
            Self::ForwardMean => Some(ForwardAggregation::Mean),
            Self::ForwardMedian => Some(ForwardAggregation::Median),
            Self::ForwardMax => Some(ForwardAggregation::Max),
            Self::ForwardMin => Some(ForwardAggregation::Min),
            _ => None,
        }
    }
}

impl FromStr for InterpolationMethod {
    type Err = RegridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "bicubic" => Ok(Self::Bicubic),
            "coord_nn" => Ok(Self::CoordNn),
            "coord_nn_kd" => Ok(Self::CoordNnKd),
            "forward_sum" => Ok(Self::ForwardSum),
            "forward_mean" => Ok(Self::ForwardMean),
            "forward_median" => Ok(Self::ForwardMedian),
            "forward_max" => Ok(Self::ForwardMax),
            "forward_min" => Ok(Self::ForwardMin),
            other => Err(RegridError::UnknownMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
            Self::CoordNn => "coord_nn",
            Self::CoordNnKd => "coord_nn_kd",
            Self::ForwardSum => "forward_sum",
            Self::ForwardMean => "forward_mean",
            Self::ForwardMedian => "forward_median",
            Self::ForwardMax => "forward_max",
            Self::ForwardMin => "forward_min",
        };
        write!(f, "{}", tag)
    }
}
