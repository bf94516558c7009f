//! Textual sub-range selection.
//!
//! A range expression holds one token per axis, separated by commas:
//!
//! | token            | selects                                      |
//! |------------------|----------------------------------------------|
//! | `3`              | the single sample 3                          |
//! | `-1`             | the last sample                              |
//! | `1:4`            | samples 1, 2, 3                              |
//! | `0:2:9`          | samples 0, 2, 4, 6, 8 (spacing doubles)      |
//! | `:4`, `2:`       | open ends default to the axis bounds         |
//! | `start:3`, `2:end` | keyword bounds                             |
//! | `end`, `all`, `:` | the whole axis                              |
//!
//! Negative indices count back from the end of the axis.

use tracing::debug;

use crate::error::{Result, VolumeError};
use crate::sampling::Sampling;

/// One axis of a parsed range: first sample, stride and number of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisRange {
    start: usize,
    step: usize,
    count: usize,
}

impl AxisRange {
    const fn whole(num: usize) -> Self {
        Self {
            start: 0,
            step: 1,
            count: num,
        }
    }
}

fn parse_axis(axis: usize, token: &str, num: usize) -> Result<AxisRange> {
    let fail = |reason: &str| VolumeError::RangeParse {
        axis,
        token: token.to_string(),
        reason: reason.to_string(),
    };

    // Signed bound; negative values count from the end.
    let bound = |text: &str, default: usize| -> Result<usize> {
        let text = text.trim();
        match text {
            "" => Ok(default),
            "start" => Ok(0),
            "end" => Ok(num),
            _ => {
                let value: i64 = text.parse().map_err(|_| fail("not an integer"))?;
                let n = i64::try_from(num).map_err(|_| fail("axis too long"))?;
                let value = if value < 0 { n + value } else { value };
                usize::try_from(value).map_err(|_| fail("index before the start of the axis"))
            }
        }
    };

    let token = token.trim();
    if matches!(token, "end" | "all" | ":") {
        return Ok(AxisRange::whole(num));
    }

    let parts: Vec<&str> = token.split(':').collect();
    let (start, step, end) = match parts.as_slice() {
        [single] => {
            if single.is_empty() {
                return Err(fail("empty token"));
            }
            let idx = bound(single, 0)?;
            (idx, 1, idx + 1)
        }
        [start, end] => (bound(start, 0)?, 1, bound(end, num)?),
        [start, step, end] => {
            let step: usize = match step.trim() {
                "" => 1,
                text => text.parse().map_err(|_| fail("step must be a positive integer"))?,
            };
            (bound(start, 0)?, step, bound(end, num)?)
        }
        _ => return Err(fail("too many ':' separators")),
    };

    if start >= num {
        return Err(fail("start is past the end of the axis"));
    }
    if end > num {
        return Err(fail("end is past the end of the axis"));
    }
    if end <= start {
        return Err(fail("empty selection"));
    }
    if step == 0 {
        return Err(fail("step must be a positive integer"));
    }

    Ok(AxisRange {
        start,
        step,
        count: (end - start).div_ceil(step),
    })
}

impl Sampling {
    /// Sub-grid selected by a textual range expression.
    ///
    /// `None`, `"all"` and `"whole"` return the grid unchanged. A stride scales the
    /// spacing of its axis and keeps every sample it lands on: the count is
    /// `ceil((end - start) / step)`, so `0:2:9` selects five samples, not four.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::RangeArity`] unless there are exactly three tokens, and
    /// [`VolumeError::RangeParse`] naming the axis and token for anything malformed
    /// or outside the grid.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_volume::Sampling;
    ///
    /// let grid = Sampling::unit([5, 5, 5]).unwrap();
    /// let sub = grid.range(Some("1,0:2,end")).unwrap();
    /// assert_eq!(sub.num(), [1, 2, 5]);
    /// ```
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn range(&self, expr: Option<&str>) -> Result<Self> {
        let Some(expr) = expr.map(str::trim) else {
            return Ok(self.clone());
        };
        if matches!(expr, "all" | "whole") {
            return Ok(self.clone());
        }

        let tokens: Vec<&str> = expr.split(',').collect();
        let [ti, tj, tk] = tokens.as_slice() else {
            return Err(VolumeError::RangeArity(expr.to_string()));
        };
        let num = self.num();
        let axes = [
            parse_axis(0, ti, num[0])?,
            parse_axis(1, tj, num[1])?,
            parse_axis(2, tk, num[2])?,
        ];
        debug!(expr, ?axes, "Parsed range");

        let mut delta = self.delta();
        for (axis, range) in axes.iter().enumerate() {
            delta[axis] *= range.step as f64;
        }
        let start = self.world_ijk(
            axes[0].start as i32,
            axes[1].start as i32,
            axes[2].start as i32,
        );
        Self::with_orientation(
            start,
            delta,
            self.orientation(),
            axes.map(|range| range.count),
        )
    }
}
