//! Conditional likelihood arrays.

use std::fmt;

/// Dimensions shared by all buffers of a [BufferPool](crate::likelihood::BufferPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaDims {
    pub num_rates: usize,
    pub num_patterns: usize,
    pub num_states: usize,
    /// Whether buffers carry one underflow correction per pattern.
    pub per_pattern_scaling: bool,
}

impl ClaDims {
    /// Number of `f64` values of one buffer.
    pub fn len(&self) -> usize {
        self.num_rates * self.num_patterns * self.num_states
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =#========================================================================#=
// CLA BUFFER
// =#========================================================================#=
/// Partial likelihoods for one directed edge, laid out `[rate][pattern][state]`,
/// plus the underflow bookkeeping that travels with them.
///
/// Buffers are handed out by the pool and owned by exactly one slot at a time.
pub struct ClaBuffer {
    id: usize,
    generation: u64,
    dims: ClaDims,
    values: Vec<f64>,
    /// Sum of count-weighted log rescale factors applied in this buffer's clade.
    pub(crate) log_scale: f64,
    /// Per pattern log rescale factors; empty unless `per_pattern_scaling`.
    pub(crate) pattern_log_scale: Vec<f64>,
    /// Edges traversed since the last rescale in this buffer's clade.
    pub(crate) num_edges: usize,
}

impl ClaBuffer {
    /// Creates a zero-initialized buffer.
    pub(crate) fn new(id: usize, generation: u64, dims: ClaDims) -> Self {
        ClaBuffer {
            id,
            generation,
            dims,
            values: vec![0.0; dims.len()],
            log_scale: 0.0,
            pattern_log_scale: if dims.per_pattern_scaling { vec![0.0; dims.num_patterns] } else { Vec::new() },
            num_edges: 0,
        }
    }

    /// Unique id of this buffer within its pool.
    pub fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dims(&self) -> ClaDims {
        self.dims
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Count-weighted log rescale factor accumulated in this buffer's clade.
    pub fn log_scale(&self) -> f64 {
        self.log_scale
    }

    /// Per pattern log rescale factors, empty unless tracked per pattern.
    pub fn pattern_log_scale(&self) -> &[f64] {
        &self.pattern_log_scale
    }

    /// Edges traversed since the last rescale.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Returns the slice of rate category `rate` and pattern `pattern`.
    #[inline]
    pub fn entry(&self, rate: usize, pattern: usize) -> &[f64] {
        let start = (rate * self.dims.num_patterns + pattern) * self.dims.num_states;
        &self.values[start..start + self.dims.num_states]
    }

    /// Resets the bookkeeping to the sums over the given neighbor buffers,
    /// counting one traversed edge per neighbor (tips included).
    pub(crate) fn reset_bookkeeping(&mut self, num_neighbors: usize, internals: &[&ClaBuffer]) {
        self.num_edges = num_neighbors + internals.iter().map(|b| b.num_edges).sum::<usize>();
        self.log_scale = internals.iter().map(|b| b.log_scale).sum();
        for (p, value) in self.pattern_log_scale.iter_mut().enumerate() {
            *value = internals.iter().map(|b| b.pattern_log_scale[p]).sum();
        }
    }
}

impl fmt::Debug for ClaBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaBuffer")
            .field("id", &self.id)
            .field("len", &self.values.len())
            .field("log_scale", &self.log_scale)
            .field("num_edges", &self.num_edges)
            .finish()
    }
}
