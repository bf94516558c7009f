//! Semantic tags describing how a volume's channels are interpreted.

use std::fmt;
use std::str::FromStr;

/// Interpretation of the channel vector stored at each voxel.
///
/// The tag is metadata only; storage is identical for every model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelType {
    /// Plain vector of values.
    #[default]
    Vect,
    /// Diffusion tensor.
    Tensor,
    /// Two-compartment tensor.
    BiTensor,
    /// Multi-fiber orientation model.
    Fibers,
    /// Spherical harmonic coefficients.
    Spharm,
    /// Diffusion kurtosis.
    Kurtosis,
    /// Neurite orientation dispersion and density.
    Noddi,
    /// Exponential decay.
    ExpDecay,
    /// Multi-compartment spherical mean.
    Mcsmt,
}

impl ModelType {
    /// Every model, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Vect,
        Self::Tensor,
        Self::BiTensor,
        Self::Fibers,
        Self::Spharm,
        Self::Kurtosis,
        Self::Noddi,
        Self::ExpDecay,
        Self::Mcsmt,
    ];

    /// Lower-case name, as used in file names and headers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vect => "vect",
            Self::Tensor => "tensor",
            Self::BiTensor => "bitensor",
            Self::Fibers => "fibers",
            Self::Spharm => "spharm",
            Self::Kurtosis => "kurtosis",
            Self::Noddi => "noddi",
            Self::ExpDecay => "expdecay",
            Self::Mcsmt => "mcsmt",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown model name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model type: {0:?}")]
pub struct ParseModelTypeError(pub String);

impl FromStr for ModelType {
    type Err = ParseModelTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|model| model.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseModelTypeError(s.to_string()))
    }
}
