//! Parameters for creating derived volumes.

use crate::element::ElementType;

/// How a derived volume picks its element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypePolicy {
    /// Keep the element type of the source volume.
    Preserve,
    /// Use [`VolumeParams::default_element`] regardless of the source.
    #[default]
    Promote,
}

/// Parameters for prototyping and resampling volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeParams {
    /// Element type policy for derived volumes. Default: promote.
    pub type_policy: TypePolicy,

    /// Element type used when promoting. Default: `f32`.
    pub default_element: ElementType,
}

impl Default for VolumeParams {
    fn default() -> Self {
        Self {
            type_policy: TypePolicy::Promote,
            default_element: ElementType::F32,
        }
    }
}

impl VolumeParams {
    /// Params that keep the source element type.
    #[must_use]
    pub fn preserving() -> Self {
        Self {
            type_policy: TypePolicy::Preserve,
            ..Default::default()
        }
    }

    /// Params that promote every derived volume to `element`.
    #[must_use]
    pub fn promoting_to(element: ElementType) -> Self {
        Self {
            type_policy: TypePolicy::Promote,
            default_element: element,
        }
    }

    /// Set the type policy.
    #[must_use]
    pub const fn with_type_policy(mut self, policy: TypePolicy) -> Self {
        self.type_policy = policy;
        self
    }

    /// Set the element type used when promoting.
    #[must_use]
    pub const fn with_default_element(mut self, element: ElementType) -> Self {
        self.default_element = element;
        self
    }

    /// Element type a volume derived from `source` should use.
    #[must_use]
    pub const fn element_for(&self, source: ElementType) -> ElementType {
        match self.type_policy {
            TypePolicy::Preserve => source,
            TypePolicy::Promote => self.default_element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = VolumeParams::default();
        assert_eq!(params.type_policy, TypePolicy::Promote);
        assert_eq!(params.default_element, ElementType::F32);
        assert_eq!(params.element_for(ElementType::U8), ElementType::F32);
    }

    #[test]
    fn test_preserving() {
        let params = VolumeParams::preserving();
        assert_eq!(params.element_for(ElementType::I16), ElementType::I16);
    }

    #[test]
    fn test_promoting_to() {
        let params = VolumeParams::promoting_to(ElementType::F64);
        assert_eq!(params.element_for(ElementType::U16), ElementType::F64);
    }

    #[test]
    fn test_builder_chain() {
        let params = VolumeParams::default()
            .with_default_element(ElementType::I32)
            .with_type_policy(TypePolicy::Preserve);
        assert_eq!(params.default_element, ElementType::I32);
        assert_eq!(params.element_for(ElementType::U8), ElementType::U8);
    }
}
