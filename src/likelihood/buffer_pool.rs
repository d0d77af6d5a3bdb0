//! Pool of reusable conditional likelihood buffers.

use crate::likelihood::cla::{ClaBuffer, ClaDims};
use tracing::debug;

// =#========================================================================#=
// BUFFER POOL
// =#========================================================================#=
/// Free list of [ClaBuffer]s of one size.
///
/// Buffers are zero-initialized when created, but not when reused: whoever
/// acquires a buffer has to overwrite it completely. The pool grows on
/// demand and only shrinks on [`reset`](BufferPool::reset). Since buffers are
/// moved out on [`acquire`](BufferPool::acquire) and moved back on
/// [`release`](BufferPool::release), a buffer can never be held twice.
///
/// # Example
/// ```
/// use phylik::likelihood::{BufferPool, ClaDims};
///
/// let dims = ClaDims { num_rates: 1, num_patterns: 3, num_states: 4, per_pattern_scaling: false };
/// let mut pool = BufferPool::new(dims);
/// let a = pool.acquire();
/// let b = pool.acquire();
/// assert_ne!(a.id(), b.id());
/// pool.release(a);
/// pool.release(b);
/// let _c = pool.acquire();
/// assert_eq!(pool.created_count(), 2);
/// assert_eq!(pool.pool_size(), 1);
/// ```
#[derive(Debug)]
pub struct BufferPool {
    dims: ClaDims,
    free: Vec<ClaBuffer>,
    created: usize,
    outstanding: usize,
    generation: u64,
}

impl BufferPool {
    /// Creates an empty pool for buffers of the given dimensions.
    pub fn new(dims: ClaDims) -> Self {
        BufferPool { dims, free: Vec::new(), created: 0, outstanding: 0, generation: 0 }
    }

    /// Returns the dimensions of the buffers handed out.
    pub fn dims(&self) -> ClaDims {
        self.dims
    }

    /// Hands out a buffer, reusing a released one when available.
    ///
    /// # Panics
    /// Aborts on allocation failure, as any `Vec` allocation does.
    pub fn acquire(&mut self) -> ClaBuffer {
        self.outstanding += 1;
        match self.free.pop() {
            Some(buffer) => buffer,
            None => {
                let buffer = ClaBuffer::new(self.created, self.generation, self.dims);
                self.created += 1;
                buffer
            }
        }
    }

    /// Takes a buffer back. Buffers from before the last reset are dropped.
    pub fn release(&mut self, buffer: ClaBuffer) {
        if buffer.generation() != self.generation {
            return;
        }
        debug_assert!(self.outstanding > 0, "Released more buffers than acquired");
        debug_assert!(self.free.iter().all(|b| b.id() != buffer.id()), "Buffer {} released twice", buffer.id());
        self.outstanding -= 1;
        self.free.push(buffer);
    }

    /// Drops all pooled buffers and switches to new dimensions.
    ///
    /// Buffers still held elsewhere are dropped when released.
    pub fn reset(&mut self, dims: ClaDims) {
        debug!(created = self.created, pooled = self.free.len(), "resetting buffer pool");
        self.dims = dims;
        self.free.clear();
        self.created = 0;
        self.outstanding = 0;
        self.generation += 1;
    }

    /// Number of buffers waiting in the free list.
    pub fn pool_size(&self) -> usize {
        self.free.len()
    }

    /// Number of buffers created since the last reset.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Number of buffers currently handed out.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}
