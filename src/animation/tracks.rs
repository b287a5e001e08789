use crate::animation::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    CubicSpline,
}

/// How far the cursor scans linearly before falling back to binary search.
const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last keyframe interval so sequential playback is O(1).
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    /// For `CubicSpline` this holds `[in_tangent, value, out_tangent]` per key.
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Samples without a cursor (binary search). `None` for an empty track or
    /// one whose values do not cover its keys.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.times.is_empty() {
            return self.values.first().copied();
        }
        let next = self.times.partition_point(|&t| t <= time);
        self.sample_at_frame(next.saturating_sub(1), time)
    }

    /// Samples at `time`, starting the keyframe search at `cursor`.
    ///
    /// Scans up to [`MAX_SCAN_OFFSET`] intervals forward or backward from the
    /// cached index, then falls back to binary search (seek, loop wrap).
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        let len = self.times.len();
        match len {
            0 => return self.values.first().copied(),
            1 => return self.value_at(0),
            _ => {}
        }

        let i = cursor.last_index.min(len - 1);
        let found = if time >= self.times[i] {
            (i..=(i + MAX_SCAN_OFFSET).min(len - 1))
                .find(|&idx| idx == len - 1 || time < self.times[idx + 1])
                .filter(|&idx| idx < len - 1 || time >= self.times[len - 1])
        } else {
            (i.saturating_sub(MAX_SCAN_OFFSET)..i)
                .rev()
                .find(|&idx| time >= self.times[idx])
        };

        let index = found.unwrap_or_else(|| {
            self.times
                .partition_point(|&t| t <= time)
                .saturating_sub(1)
        });
        cursor.last_index = index;
        self.sample_at_frame(index, time)
    }

    /// Number of values per keyframe.
    #[must_use]
    pub fn stride(&self) -> usize {
        match self.interpolation {
            InterpolationMode::CubicSpline => 3,
            _ => 1,
        }
    }

    /// Whether `values` holds exactly one entry (or tangent triple) per key.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.values.len() == self.times.len() * self.stride()
    }

    fn value_at(&self, index: usize) -> Option<T> {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.values.get(index * 3 + 1).copied(),
            _ => self.values.get(index).copied(),
        }
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> Option<T> {
        let len = self.times.len();
        if index + 1 >= len {
            return self.value_at(len.checked_sub(1)?);
        }

        let next = index + 1;
        let t0 = self.times[index];
        let dt = self.times[next] - t0;
        let t = if dt > 1e-6 { ((time - t0) / dt).clamp(0.0, 1.0) } else { 0.0 };

        match self.interpolation {
            InterpolationMode::Step => self.value_at(index),
            InterpolationMode::Linear => Some(T::interpolate_linear(
                self.value_at(index)?,
                self.value_at(next)?,
                t,
            )),
            InterpolationMode::CubicSpline => {
                let a = index * 3;
                let b = next * 3;
                Some(T::interpolate_cubic(
                    *self.values.get(a + 1)?,
                    *self.values.get(a + 2)?,
                    *self.values.get(b)?,
                    *self.values.get(b + 1)?,
                    t,
                    dt,
                ))
            }
        }
    }
}
