// Fixed-window sample history for one bound variable
use crate::domain::variable::VariableValue;
use serde::Serialize;
use std::collections::VecDeque;

/// Number of samples kept per chart.
pub const HISTORY_LEN: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
}

impl Default for SeriesStats {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            count: 0,
        }
    }
}

impl SeriesStats {
    /// Seed from server-supplied bounds, falling back to the default seed.
    pub fn seeded(min: Option<f64>, max: Option<f64>) -> Self {
        let seed = Self::default();
        Self {
            min: min.unwrap_or(seed.min),
            max: max.unwrap_or(seed.max),
            ..seed
        }
    }

    fn record(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.count += 1;
    }

    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeSeriesBuffer {
    samples: VecDeque<VariableValue>,
    stats: SeriesStats,
}

impl Default for TimeSeriesBuffer {
    fn default() -> Self {
        Self::with_stats(SeriesStats::default())
    }
}

impl TimeSeriesBuffer {
    pub fn with_stats(stats: SeriesStats) -> Self {
        Self {
            samples: std::iter::repeat(VariableValue::Unavailable)
                .take(HISTORY_LEN)
                .collect(),
            stats,
        }
    }

    pub fn push(&mut self, sample: VariableValue) {
        self.samples.pop_front();
        self.samples.push_back(sample);

        if let VariableValue::Numeric(value) = sample {
            self.stats.record(value);
        }
    }

    pub fn reset(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = VariableValue::Unavailable);
        self.stats = SeriesStats::default();
    }

    pub fn average(&self) -> Option<f64> {
        self.stats.average()
    }

    pub fn stats(&self) -> &SeriesStats {
        &self.stats
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> impl Iterator<Item = &VariableValue> {
        self.samples.iter()
    }

    /// Chart-ready view: numeric samples as values, everything else as gaps.
    pub fn numeric_samples(&self) -> Vec<Option<f64>> {
        self.samples().map(VariableValue::as_f64).collect()
    }

    /// "Min: x | Max: y | Avg: z" line shown under a variable, if any numeric
    /// sample has been seen.
    pub fn summary(&self) -> Option<String> {
        let avg = self.stats.average()?;
        Some(format!(
            "Min: {:.1} | Max: {:.1} | Avg: {:.1}",
            self.stats.min, self.stats.max, avg
        ))
    }
}

/// Relative time labels for each slot of the window, oldest first.
pub fn axis_labels(rate_ms: u32) -> Vec<String> {
    (0..HISTORY_LEN)
        .map(|i| {
            let offset_ms = (HISTORY_LEN - i) as u64 * rate_ms as u64;
            format!("-{}s", offset_ms as f64 / 1000.0)
        })
        .collect()
}
