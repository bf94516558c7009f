//! Dense multi-channel voxel storage.

use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

use crate::element::{ElementType, VoxelBuffer};
use crate::error::{Result, VolumeError};
use crate::mask::Mask;
use crate::model::ModelType;
use crate::params::VolumeParams;
use crate::sample::Sample;
use crate::sampling::Sampling;

/// Typed multi-channel data on a [`Sampling`].
///
/// Each channel is a separate bank of `size` elements; element `(voxel, channel)`
/// lives at `channel * size + voxel`, and voxels are in the sampling's linear order.
/// Values are read and written as `f64` and converted to the element type on store.
///
/// Sample-addressed accessors return [`VolumeError::IndexOutOfRange`] for samples
/// outside the grid. Index-addressed accessors follow slice semantics and panic on
/// out-of-range indices, as does any channel outside `0..channels`.
///
/// # Example
///
/// ```
/// use cf_volume::{ElementType, Sample, Sampling, Volume};
///
/// let grid = Sampling::unit([4, 4, 4]).unwrap();
/// let mut volume = Volume::new(grid, ElementType::F32, 3).unwrap();
///
/// volume.set(Sample::new(1, 2, 3), 2, 0.5).unwrap();
/// assert_eq!(volume.get(Sample::new(1, 2, 3), 2).unwrap(), 0.5);
/// assert_eq!(volume.get_vector(Sample::new(1, 2, 3)).unwrap(), vec![0.0, 0.0, 0.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    sampling: Arc<Sampling>,
    data: VoxelBuffer,
    channels: usize,
    model: ModelType,
}

impl Volume {
    /// Creates a zero-filled volume.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidChannels`] if `channels` is zero.
    pub fn new(
        sampling: impl Into<Arc<Sampling>>,
        element: ElementType,
        channels: usize,
    ) -> Result<Self> {
        let sampling = sampling.into();
        if channels == 0 {
            return Err(VolumeError::InvalidChannels(channels));
        }
        let len = sampling
            .size()
            .checked_mul(channels)
            .ok_or(VolumeError::InvalidChannels(channels))?;
        Ok(Self {
            data: VoxelBuffer::zeros(element, len),
            sampling,
            channels,
            model: ModelType::Vect,
        })
    }

    /// Wraps an existing buffer in bank layout.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidChannels`] if `channels` is zero and
    /// [`VolumeError::BufferLength`] unless the buffer holds `size * channels`
    /// elements.
    pub fn from_buffer(
        sampling: impl Into<Arc<Sampling>>,
        data: VoxelBuffer,
        channels: usize,
    ) -> Result<Self> {
        let sampling = sampling.into();
        if channels == 0 {
            return Err(VolumeError::InvalidChannels(channels));
        }
        let expected = sampling.size().saturating_mul(channels);
        if data.len() != expected {
            return Err(VolumeError::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            sampling,
            data,
            channels,
            model: ModelType::Vect,
        })
    }

    /// Single-channel volume over a buffer already known to hold `size` elements.
    pub(crate) fn single_channel(sampling: Arc<Sampling>, data: VoxelBuffer) -> Self {
        debug_assert_eq!(data.len(), sampling.size());
        Self {
            sampling,
            data,
            channels: 1,
            model: ModelType::Vect,
        }
    }

    /// Returns the volume with its model tag replaced.
    #[must_use]
    pub const fn with_model(mut self, model: ModelType) -> Self {
        self.model = model;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The grid the volume lives on.
    #[must_use]
    pub fn sampling(&self) -> &Sampling {
        &self.sampling
    }

    /// Shared handle to the grid.
    #[must_use]
    pub fn shared_sampling(&self) -> Arc<Sampling> {
        Arc::clone(&self.sampling)
    }

    /// Element type of the storage.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    /// Number of channels per voxel.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Interpretation of the channel vector.
    #[must_use]
    pub const fn model(&self) -> ModelType {
        self.model
    }

    /// Replaces the model tag.
    pub fn set_model(&mut self, model: ModelType) {
        self.model = model;
    }

    /// The underlying storage.
    #[must_use]
    pub const fn buffer(&self) -> &VoxelBuffer {
        &self.data
    }

    /// Raw native-endian bytes in bank layout.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Every element as `f64`, in bank layout.
    #[must_use]
    pub fn to_values(&self) -> Vec<f64> {
        self.data.to_f64_vec()
    }

    fn offset(&self, idx: usize, channel: usize) -> usize {
        let size = self.sampling.size();
        assert!(
            channel < self.channels,
            "channel {channel} out of range for volume with {} channels",
            self.channels
        );
        assert!(idx < size, "voxel index {idx} out of range for size {size}");
        channel * size + idx
    }

    // ------------------------------------------------------------------
    // Scalar access
    // ------------------------------------------------------------------

    /// Value of one channel at a sample.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::IndexOutOfRange`] if the sample is outside the grid.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channels()`.
    pub fn get(&self, sample: Sample, channel: usize) -> Result<f64> {
        let idx = self.sampling.index(sample)?;
        Ok(self.get_index(idx, channel))
    }

    /// Writes one channel at a sample.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::IndexOutOfRange`] if the sample is outside the grid.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channels()`.
    pub fn set(&mut self, sample: Sample, channel: usize, value: f64) -> Result<()> {
        let idx = self.sampling.index(sample)?;
        self.set_index(idx, channel, value);
        Ok(())
    }

    /// Value of one channel at a linear index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()` or `channel >= channels()`.
    #[must_use]
    pub fn get_index(&self, idx: usize, channel: usize) -> f64 {
        self.data.get(self.offset(idx, channel))
    }

    /// Writes one channel at a linear index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()` or `channel >= channels()`.
    pub fn set_index(&mut self, idx: usize, channel: usize, value: f64) {
        let offset = self.offset(idx, channel);
        self.data.set(offset, value);
    }

    // ------------------------------------------------------------------
    // Vector access
    // ------------------------------------------------------------------

    /// All channels at a sample.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::IndexOutOfRange`] if the sample is outside the grid.
    pub fn get_vector(&self, sample: Sample) -> Result<Vec<f64>> {
        let idx = self.sampling.index(sample)?;
        Ok(self.get_vector_index(idx))
    }

    /// Writes all channels at a sample.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::IndexOutOfRange`] if the sample is outside the grid and
    /// [`VolumeError::ChannelMismatch`] if `values` does not hold one value per
    /// channel.
    pub fn set_vector(&mut self, sample: Sample, values: &[f64]) -> Result<()> {
        self.check_channels(values.len())?;
        let idx = self.sampling.index(sample)?;
        self.set_vector_index(idx, values);
        Ok(())
    }

    /// All channels at a linear index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()`.
    #[must_use]
    pub fn get_vector_index(&self, idx: usize) -> Vec<f64> {
        (0..self.channels).map(|c| self.get_index(idx, c)).collect()
    }

    /// Writes all channels at a linear index; extra values are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()` or `values` is shorter than `channels()`.
    pub fn set_vector_index(&mut self, idx: usize, values: &[f64]) {
        assert!(
            values.len() >= self.channels,
            "expected {} values, got {}",
            self.channels,
            values.len()
        );
        for (channel, &value) in values.iter().enumerate().take(self.channels) {
            self.set_index(idx, channel, value);
        }
    }

    fn check_channels(&self, actual: usize) -> Result<()> {
        if actual == self.channels {
            Ok(())
        } else {
            Err(VolumeError::ChannelMismatch {
                expected: self.channels,
                actual,
            })
        }
    }

    // ------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------

    /// True when the sample is inside the grid and, if a mask is given, in its
    /// foreground.
    #[must_use]
    pub fn valid(&self, sample: Sample, mask: Option<&Mask>) -> bool {
        self.sampling.contains(sample) && mask.is_none_or(|m| m.foreground(sample))
    }

    /// Writes `values` to every voxel, or only to the mask's foreground.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::ChannelMismatch`] if `values` does not hold one value
    /// per channel, and [`VolumeError::SamplingMismatch`] if the mask lives on a
    /// different grid.
    pub fn set_all(&mut self, values: &[f64], mask: Option<&Mask>) -> Result<()> {
        self.check_channels(values.len())?;
        if let Some(mask) = mask {
            if mask.sampling() != self.sampling() {
                return Err(VolumeError::SamplingMismatch);
            }
        }
        for idx in 0..self.sampling.size() {
            if mask.is_none_or(|m| m.foreground_index(idx)) {
                self.set_vector_index(idx, values);
            }
        }
        Ok(())
    }

    /// Sets every element of every channel to `value`.
    pub fn fill(&mut self, value: f64) {
        let len = self.data.len();
        self.data.fill(0..len, value);
    }

    /// Copies values and model tag from a volume with the same grid and channels.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::SamplingMismatch`] or [`VolumeError::ChannelMismatch`]
    /// when the shapes differ.
    pub fn assign(&mut self, other: &Self) -> Result<()> {
        if other.sampling() != self.sampling() {
            return Err(VolumeError::SamplingMismatch);
        }
        self.check_channels(other.channels)?;
        if self.element_type() == other.element_type() {
            self.data.clone_from(&other.data);
        } else {
            for (offset, value) in other.data.to_f64_vec().into_iter().enumerate() {
                self.data.set(offset, value);
            }
        }
        self.model = other.model;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    /// A single-channel volume holding channel `channel`, with the same element
    /// type.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channels()`.
    #[must_use]
    pub fn channel(&self, channel: usize) -> Self {
        let mut out = Self {
            sampling: Arc::clone(&self.sampling),
            data: VoxelBuffer::zeros(self.element_type(), self.sampling.size()),
            channels: 1,
            model: if self.channels == 1 {
                self.model
            } else {
                ModelType::Vect
            },
        };
        for idx in 0..self.sampling.size() {
            out.set_index(idx, 0, self.get_index(idx, channel));
        }
        out
    }

    /// Overwrites channel `channel` with channel 0 of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::SamplingMismatch`] if `source` lives on another grid.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channels()`.
    pub fn set_channel(&mut self, channel: usize, source: &Self) -> Result<()> {
        if source.sampling() != self.sampling() {
            return Err(VolumeError::SamplingMismatch);
        }
        for idx in 0..self.sampling.size() {
            self.set_index(idx, channel, source.get_index(idx, 0));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Derived volumes
    // ------------------------------------------------------------------

    /// A zero-filled volume of the same shape, typed by the default parameters.
    #[must_use]
    pub fn proto(&self) -> Self {
        let params = VolumeParams::default();
        Self {
            sampling: Arc::clone(&self.sampling),
            data: VoxelBuffer::zeros(params.element_for(self.element_type()), self.data.len()),
            channels: self.channels,
            model: self.model,
        }
    }

    /// A zero-filled volume on `sampling` with `channels` channels.
    ///
    /// The model tag carries over only when the channel count is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidChannels`] if `channels` is zero.
    pub fn proto_with(
        &self,
        sampling: impl Into<Arc<Sampling>>,
        channels: usize,
        params: &VolumeParams,
    ) -> Result<Self> {
        let out = Self::new(sampling, params.element_for(self.element_type()), channels)?;
        Ok(if channels == self.channels {
            out.with_model(self.model)
        } else {
            out
        })
    }

    /// Nearest-neighbour copy onto another grid, typed by the default parameters.
    ///
    /// See [`resample_with`](Self::resample_with).
    #[must_use]
    pub fn resample(&self, target: &Sampling) -> Self {
        self.resample_with(target, &VolumeParams::default())
    }

    /// Nearest-neighbour copy onto another grid.
    ///
    /// Each target sample takes the values of the source sample nearest its world
    /// position. Target samples whose nearest source sample is outside the source
    /// grid stay zero. The model tag is kept.
    #[must_use]
    pub fn resample_with(&self, target: &Sampling, params: &VolumeParams) -> Self {
        info!(
            from = ?self.sampling.num(),
            to = ?target.num(),
            channels = self.channels,
            "Resampling volume"
        );
        let mut out = Self {
            sampling: Arc::new(target.clone()),
            data: VoxelBuffer::zeros(
                params.element_for(self.element_type()),
                target.size() * self.channels,
            ),
            channels: self.channels,
            model: self.model,
        };

        let mut skipped = 0usize;
        for (idx, sample) in target.iter().enumerate() {
            match self.sampling.index(self.sampling.nearest(&target.world(sample))) {
                Ok(src) => {
                    for channel in 0..self.channels {
                        out.set_index(idx, channel, self.get_index(src, channel));
                    }
                }
                Err(_) => skipped += 1,
            }
        }
        debug!(skipped, "Target samples outside the source grid");
        out
    }

    /// Nearest-neighbour copy of one channel onto another grid, as a
    /// single-channel volume.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channels()`.
    #[must_use]
    pub fn copy_channel_onto(&self, target: &Sampling, channel: usize, params: &VolumeParams) -> Self {
        let mut out = Self {
            sampling: Arc::new(target.clone()),
            data: VoxelBuffer::zeros(params.element_for(self.element_type()), target.size()),
            channels: 1,
            model: if self.channels == 1 {
                self.model
            } else {
                ModelType::Vect
            },
        };
        for (idx, sample) in target.iter().enumerate() {
            if let Ok(src) = self.sampling.index(self.sampling.nearest(&target.world(sample))) {
                out.set_index(idx, 0, self.get_index(src, channel));
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Re-anchoring
    // ------------------------------------------------------------------

    /// Moves the data onto a grid with the same number of voxels.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::SizeMismatch`] if the voxel counts differ.
    pub fn with_sampling(mut self, sampling: impl Into<Arc<Sampling>>) -> Result<Self> {
        self.set_sampling(sampling)?;
        Ok(self)
    }

    /// In-place form of [`with_sampling`](Self::with_sampling).
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::SizeMismatch`] if the voxel counts differ.
    pub fn set_sampling(&mut self, sampling: impl Into<Arc<Sampling>>) -> Result<()> {
        let sampling = sampling.into();
        if sampling.size() != self.sampling.size() {
            return Err(VolumeError::SizeMismatch {
                expected: self.sampling.size(),
                actual: sampling.size(),
            });
        }
        self.sampling = sampling;
        Ok(())
    }

    /// Moves the grid so sample `(0, 0, 0)` sits at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::NonFiniteStart`] if `start` is not finite.
    pub fn set_origin(&mut self, start: Point3<f64>) -> Result<()> {
        let s = &self.sampling;
        self.sampling = Arc::new(Sampling::with_orientation(
            start,
            s.delta(),
            s.orientation(),
            s.num(),
        )?);
        Ok(())
    }

    /// Changes the grid spacing, keeping its start and orientation.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidDelta`] if any spacing is invalid.
    pub fn set_delta(&mut self, delta: Vector3<f64>) -> Result<()> {
        self.sampling = Arc::new(self.sampling.proto_with_delta(delta, self.sampling.num())?);
        Ok(())
    }
}
