//! Rescaling strategies against floating-point underflow.
//!
//! Partial likelihoods shrink geometrically with the number of edges they
//! span. A policy multiplies freshly combined buffers by a power of e once
//! enough edges have been traversed since the last rescale, recording the
//! exponent so the evaluator can take it back out in log space.

use crate::likelihood::cla::ClaBuffer;
use std::fmt;

/// Default number of traversed edges that triggers a rescale.
pub const DEFAULT_TRIGGER_SENSITIVITY: usize = 50;

/// Default value the largest entry of a pattern is scaled up to.
pub const DEFAULT_MAX_VALUE: f64 = 10000.0;

// =#========================================================================#=
// UNDERFLOW POLICY
// =#========================================================================#=
/// Strategy invoked after every CLA combination.
///
/// When called, the buffer's corrections already hold the sum of its
/// internal neighbors' corrections and `num_edges` counts the edges
/// traversed since their last rescale, so a policy only has to decide
/// whether to rescale now.
pub trait UnderflowPolicy: fmt::Debug {
    /// Rescales `buffer` if needed and records the correction.
    fn on_combine(&self, buffer: &mut ClaBuffer, pattern_counts: &[f64]);

    /// Whether buffers need per-pattern corrections.
    fn per_pattern(&self) -> bool {
        false
    }

    /// Whether per-site log-likelihoods can be reported exactly.
    fn supports_site_likelihoods(&self) -> bool {
        self.per_pattern()
    }
}

/// Never rescales. Suitable for small trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUnderflowPolicy;

impl UnderflowPolicy for NoUnderflowPolicy {
    fn on_combine(&self, _buffer: &mut ClaBuffer, _pattern_counts: &[f64]) {}

    fn supports_site_likelihoods(&self) -> bool {
        true
    }
}

/// Rescales per pattern, accumulating one count-weighted correction per buffer.
#[derive(Debug, Clone, Copy)]
pub struct SimpleUnderflowPolicy {
    trigger: usize,
    max_value: f64,
}

impl SimpleUnderflowPolicy {
    /// # Panics
    /// Panics if `trigger` is zero or `max_value` is not positive.
    pub fn new(trigger: usize, max_value: f64) -> Self {
        assert!(trigger > 0, "Trigger sensitivity must be positive");
        assert!(max_value > 0.0, "Rescale ceiling must be positive");
        SimpleUnderflowPolicy { trigger, max_value }
    }
}

impl Default for SimpleUnderflowPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_SENSITIVITY, DEFAULT_MAX_VALUE)
    }
}

impl UnderflowPolicy for SimpleUnderflowPolicy {
    fn on_combine(&self, buffer: &mut ClaBuffer, pattern_counts: &[f64]) {
        if buffer.num_edges < self.trigger {
            return;
        }
        let mut total = 0.0;
        rescale(buffer, self.max_value, |pattern, exponent| {
            total += exponent * pattern_counts[pattern];
        });
        buffer.log_scale += total;
        buffer.num_edges = 0;
    }
}

/// Like [SimpleUnderflowPolicy], but keeps one correction per pattern so
/// that per-site likelihoods stay exact.
#[derive(Debug, Clone, Copy)]
pub struct PatternSpecificUnderflowPolicy {
    trigger: usize,
    max_value: f64,
}

impl PatternSpecificUnderflowPolicy {
    /// # Panics
    /// Panics if `trigger` is zero or `max_value` is not positive.
    pub fn new(trigger: usize, max_value: f64) -> Self {
        assert!(trigger > 0, "Trigger sensitivity must be positive");
        assert!(max_value > 0.0, "Rescale ceiling must be positive");
        PatternSpecificUnderflowPolicy { trigger, max_value }
    }
}

impl Default for PatternSpecificUnderflowPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_SENSITIVITY, DEFAULT_MAX_VALUE)
    }
}

impl UnderflowPolicy for PatternSpecificUnderflowPolicy {
    fn on_combine(&self, buffer: &mut ClaBuffer, _pattern_counts: &[f64]) {
        if buffer.num_edges < self.trigger {
            return;
        }
        let mut exponents = vec![0.0; buffer.dims().num_patterns];
        rescale(buffer, self.max_value, |pattern, exponent| exponents[pattern] = exponent);
        for (correction, exponent) in buffer.pattern_log_scale.iter_mut().zip(exponents) {
            *correction += exponent;
        }
        buffer.num_edges = 0;
    }

    fn per_pattern(&self) -> bool {
        true
    }
}

/// Multiplies each pattern by `e^f` with `f = floor(ln(max_value / max))`,
/// where `max` is the pattern's largest entry over rates and states, and
/// reports `f` per pattern. Patterns that are all zero are left alone.
fn rescale<F: FnMut(usize, f64)>(buffer: &mut ClaBuffer, max_value: f64, mut record: F) {
    let dims = buffer.dims();
    let stride = dims.num_patterns * dims.num_states;
    let values = buffer.values_mut();
    for pattern in 0..dims.num_patterns {
        let offset = pattern * dims.num_states;
        let mut max = 0.0_f64;
        for r in 0..dims.num_rates {
            for &value in &values[r * stride + offset..r * stride + offset + dims.num_states] {
                max = max.max(value);
            }
        }
        if max <= 0.0 {
            continue;
        }
        let exponent = (max_value / max).ln().floor();
        let factor = exponent.exp();
        for r in 0..dims.num_rates {
            for value in &mut values[r * stride + offset..r * stride + offset + dims.num_states] {
                *value *= factor;
            }
        }
        record(pattern, exponent);
    }
}
