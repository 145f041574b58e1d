//! Time codes and time-sampled values

use crate::value::Value;
use std::fmt;

/// The time at which attributes are evaluated
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TimeCode {
    /// The attribute's default value, ignoring time samples
    #[default]
    Default,
    /// A point on the stage timeline
    At(f64),
}

impl TimeCode {
    pub fn value(&self) -> Option<f64> {
        match self {
            TimeCode::Default => None,
            TimeCode::At(t) => Some(*t),
        }
    }
}

impl From<f64> for TimeCode {
    fn from(t: f64) -> Self {
        TimeCode::At(t)
    }
}

impl From<f32> for TimeCode {
    fn from(t: f32) -> Self {
        TimeCode::At(t as f64)
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeCode::Default => write!(f, "default"),
            TimeCode::At(t) => write!(f, "{}", t),
        }
    }
}

/// Values keyed by time, kept sorted by time. A `None` sample blocks the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSamples {
    samples: Vec<(f64, Option<Value>)>,
}

impl TimeSamples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sample, replacing any sample already at `time`
    pub fn insert(&mut self, time: f64, value: Option<Value>) {
        match self.samples.binary_search_by(|(t, _)| t.total_cmp(&time)) {
            Ok(i) => self.samples[i].1 = value,
            Err(i) => self.samples.insert(i, (time, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|(t, _)| *t)
    }

    /// First and last sample times
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.samples.first()?.0, self.samples.last()?.0))
    }

    /// Resolve the value at `time`.
    ///
    /// Outside the sampled range the nearest end sample is held. Between two
    /// samples numeric values are blended linearly; anything that cannot be
    /// blended is held from the earlier sample.
    pub fn evaluate(&self, time: f64) -> Option<Value> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;

        if time <= first.0 {
            return first.1.clone();
        }
        if time >= last.0 {
            return last.1.clone();
        }

        // First sample strictly after `time`; both neighbours exist here.
        let upper = self.samples.partition_point(|(t, _)| *t <= time);
        let (t0, v0) = &self.samples[upper - 1];
        let (t1, v1) = &self.samples[upper];

        if *t0 == time {
            return v0.clone();
        }

        match (v0, v1) {
            (Some(a), Some(b)) => {
                let alpha = (time - t0) / (t1 - t0);
                a.lerp(b, alpha).or_else(|| Some(a.clone()))
            }
            (held, _) => held.clone(),
        }
    }
}
