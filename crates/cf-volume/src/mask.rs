//! Integer label maps with a name dictionary.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::element::{ElementType, VoxelBuffer};
use crate::error::{Result, VolumeError};
use crate::sample::Sample;
use crate::sampling::Sampling;
use crate::shapes::Region;
use crate::volume::Volume;

/// Label used for background voxels.
pub const BACKGROUND: i32 = 0;

/// One integer label per voxel of a [`Sampling`], plus optional label names.
///
/// Label `0` is background; every other label is foreground. Labels without a
/// registered name read as `"region<label>"`.
///
/// # Example
///
/// ```
/// use cf_volume::{Mask, Sample, Sampling};
///
/// let mut mask = Mask::new(Sampling::unit([4, 4, 4]).unwrap());
/// mask.set(Sample::new(1, 1, 1), 3).unwrap();
/// mask.set_name(3, "thalamus");
///
/// assert!(mask.foreground(Sample::new(1, 1, 1)));
/// assert_eq!(mask.name(3), "thalamus");
/// assert_eq!(mask.name(7), "region7");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    sampling: Arc<Sampling>,
    labels: Vec<i32>,
    names: BTreeMap<i32, String>,
}

impl Mask {
    /// An all-background mask.
    #[must_use]
    pub fn new(sampling: impl Into<Arc<Sampling>>) -> Self {
        let sampling = sampling.into();
        Self {
            labels: vec![BACKGROUND; sampling.size()],
            sampling,
            names: BTreeMap::new(),
        }
    }

    /// Rasterises a region: samples whose world position it contains get `label`.
    #[must_use]
    pub fn from_region<R: Region + ?Sized>(
        sampling: impl Into<Arc<Sampling>>,
        region: &R,
        label: i32,
    ) -> Self {
        let mut out = Self::new(sampling);
        let candidates = match region.bounding_box() {
            Some(bbox) => out.sampling.iterate_box(&bbox),
            None => out.sampling.iter(),
        };
        for sample in candidates {
            if region.contains(&out.sampling.world(sample)) {
                if let Ok(idx) = out.sampling.index(sample) {
                    out.labels[idx] = label;
                }
            }
        }
        out
    }

    /// Discretises channel 0 of a volume by rounding to the nearest label.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_volume(volume: &Volume) -> Self {
        let mut out = Self::new(volume.shared_sampling());
        for (idx, label) in out.labels.iter_mut().enumerate() {
            *label = volume.get_index(idx, 0).round() as i32;
        }
        out
    }

    /// A single-channel `i32` volume holding the labels.
    #[must_use]
    pub fn to_volume(&self) -> Volume {
        Volume::single_channel(
            Arc::clone(&self.sampling),
            VoxelBuffer::I32(self.labels.clone()),
        )
    }

    /// The grid the mask lives on.
    #[must_use]
    pub fn sampling(&self) -> &Sampling {
        &self.sampling
    }

    /// Labels in linear voxel order.
    #[must_use]
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    // ------------------------------------------------------------------
    // Label access
    // ------------------------------------------------------------------

    /// Label at a sample.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::IndexOutOfRange`] if the sample is outside the grid.
    pub fn get(&self, sample: Sample) -> Result<i32> {
        Ok(self.labels[self.sampling.index(sample)?])
    }

    /// Writes the label at a sample.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::IndexOutOfRange`] if the sample is outside the grid.
    pub fn set(&mut self, sample: Sample, label: i32) -> Result<()> {
        let idx = self.sampling.index(sample)?;
        self.labels[idx] = label;
        Ok(())
    }

    /// Label at a linear index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()`.
    #[must_use]
    pub fn get_index(&self, idx: usize) -> i32 {
        self.labels[idx]
    }

    /// Writes the label at a linear index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()`.
    pub fn set_index(&mut self, idx: usize, label: i32) {
        self.labels[idx] = label;
    }

    /// True when the sample is inside the grid and carries a non-zero label.
    #[must_use]
    pub fn foreground(&self, sample: Sample) -> bool {
        self.get(sample).is_ok_and(|label| label != BACKGROUND)
    }

    /// True when the sample is inside the grid and carries label zero.
    #[must_use]
    pub fn background(&self, sample: Sample) -> bool {
        self.get(sample).is_ok_and(|label| label == BACKGROUND)
    }

    /// [`foreground`](Self::foreground) for a linear index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()`.
    #[must_use]
    pub fn foreground_index(&self, idx: usize) -> bool {
        self.labels[idx] != BACKGROUND
    }

    /// [`background`](Self::background) for a linear index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()`.
    #[must_use]
    pub fn background_index(&self, idx: usize) -> bool {
        self.labels[idx] == BACKGROUND
    }

    /// Number of foreground voxels.
    #[must_use]
    pub fn count_foreground(&self) -> usize {
        self.labels.iter().filter(|&&l| l != BACKGROUND).count()
    }

    /// Distinct labels present in the voxels, background included.
    #[must_use]
    pub fn labels_present(&self) -> BTreeSet<i32> {
        self.labels.iter().copied().collect()
    }

    // ------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------

    /// Sets every voxel to `label`.
    pub fn set_all_label(&mut self, label: i32) {
        self.labels.fill(label);
    }

    /// Writes `label` wherever `other` is foreground.
    ///
    /// With identical grids the masks are compared voxel by voxel. Otherwise every
    /// sample of `self` is mapped to the nearest sample of `other`, and `label` is
    /// written only where that sample is inside `other` and foreground.
    pub fn set_all_from(&mut self, other: &Self, label: i32) {
        if other.sampling() == self.sampling() {
            info!(label, "Setting mask from mask with identical sampling");
            for (dst, &src) in self.labels.iter_mut().zip(&other.labels) {
                if src != BACKGROUND {
                    *dst = label;
                }
            }
        } else {
            info!(
                label,
                from = ?other.sampling.num(),
                to = ?self.sampling.num(),
                "Setting mask from mask with different sampling"
            );
            for (idx, sample) in self.sampling.iter().enumerate() {
                let mapped = other.sampling.nearest(&self.sampling.world(sample));
                if other.foreground(mapped) {
                    self.labels[idx] = label;
                }
            }
        }
    }

    /// Copies labels and names from a mask on the same grid.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::SamplingMismatch`] if the grids differ.
    pub fn assign(&mut self, other: &Self) -> Result<()> {
        if other.sampling() != self.sampling() {
            return Err(VolumeError::SamplingMismatch);
        }
        self.labels.clone_from(&other.labels);
        self.names.clone_from(&other.names);
        Ok(())
    }

    /// Nearest-neighbour copy onto another grid. Samples that map outside this
    /// mask stay background. Label names carry over.
    #[must_use]
    pub fn resample(&self, target: &Sampling) -> Self {
        info!(from = ?self.sampling.num(), to = ?target.num(), "Resampling mask");
        let mut out = Self::new(target.clone());
        for (idx, sample) in target.iter().enumerate() {
            if let Ok(label) = self.get(self.sampling.nearest(&target.world(sample))) {
                out.labels[idx] = label;
            }
        }
        out.names.clone_from(&self.names);
        out
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    /// Registers a name for a label.
    pub fn set_name(&mut self, label: i32, name: impl Into<String>) {
        self.names.insert(label, name.into());
    }

    /// Name of a label, or `"region<label>"` when none is registered.
    #[must_use]
    pub fn name(&self, label: i32) -> String {
        self.names
            .get(&label)
            .cloned()
            .unwrap_or_else(|| format!("region{label}"))
    }

    /// True when a name is registered for the label.
    #[must_use]
    pub fn has_name(&self, label: i32) -> bool {
        self.names.contains_key(&label)
    }

    /// Labels with a registered name, ascending.
    #[must_use]
    pub fn defined_labels(&self) -> BTreeSet<i32> {
        self.names.keys().copied().collect()
    }

    /// Registers names from `(label, name)` pairs, replacing existing ones.
    pub fn add_lookup<S: Into<String>>(&mut self, pairs: impl IntoIterator<Item = (i32, S)>) {
        for (label, name) in pairs {
            self.set_name(label, name);
        }
    }

    /// Registers names from textual `(index, name)` rows, such as a lookup table
    /// read from disk. Rows whose index is not an integer are skipped with a
    /// warning.
    pub fn add_lookup_rows<K, S>(&mut self, rows: impl IntoIterator<Item = (K, S)>)
    where
        K: AsRef<str>,
        S: Into<String>,
    {
        for (index, name) in rows {
            match index.as_ref().trim().parse::<i32>() {
                Ok(label) => self.set_name(label, name),
                Err(_) => warn!(index = index.as_ref(), "Skipping lookup row with non-integer index"),
            }
        }
    }

    /// Companion lookup table name for a mask file: a known image extension is
    /// replaced by `csv`, anything else gets `.csv` appended.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_volume::Mask;
    ///
    /// assert_eq!(Mask::lookup_path_for("labels.nii.gz"), "labels.csv");
    /// assert_eq!(Mask::lookup_path_for("labels.raw"), "labels.raw.csv");
    /// ```
    #[must_use]
    pub fn lookup_path_for(filename: &str) -> String {
        const EXTENSIONS: [&str; 4] = ["vtk.gz", "vtk", "nii.gz", "nii"];
        EXTENSIONS
            .iter()
            .find_map(|ext| filename.strip_suffix(ext))
            .map_or_else(|| format!("{filename}.csv"), |stem| format!("{stem}csv"))
    }

    /// A single-channel volume of the given type on the same grid.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidChannels`] if `channels` is zero.
    pub fn proto_volume(&self, element: ElementType, channels: usize) -> Result<Volume> {
        Volume::new(Arc::clone(&self.sampling), element, channels)
    }
}
