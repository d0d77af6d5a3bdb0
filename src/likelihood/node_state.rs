//! Per-node likelihood state: transition matrices and two CLA slots.
//!
//! Every non-root node `c` owns the two directions of the edge to its parent:
//! - the *filial* slot holds the CLA at `c` computed away from its parent
//! - the *parental* slot holds the CLA at the parent computed away from `c`
//!
//! So the CLA "at X away from Y" lives in `X.filial` if Y is X's parent and
//! in `Y.parental` otherwise.

use crate::likelihood::buffer_pool::BufferPool;
use crate::likelihood::cla::ClaBuffer;
use crate::substitution::TransitionMatrices;

/// Which of the two slots of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Filial,
    Parental,
}

/// Observable state of a CLA slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// Content (if any) is stale.
    Invalid,
    /// Content is current.
    Valid,
    /// Content is stale, but the pre-proposal content is kept for a revert.
    CachedForRevert,
}

// =#========================================================================#=
// CLA SLOT
// =#========================================================================#=
/// A working buffer with validity flag, plus the buffer saved for revert.
#[derive(Debug, Default)]
pub struct ClaSlot {
    working: Option<ClaBuffer>,
    cached: Option<ClaBuffer>,
    valid: bool,
    journaled: bool,
}

impl ClaSlot {
    pub fn state(&self) -> SlotState {
        match (self.valid, &self.cached) {
            (true, _) => SlotState::Valid,
            (false, Some(_)) => SlotState::CachedForRevert,
            (false, None) => SlotState::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The current buffer, if valid.
    pub fn buffer(&self) -> Option<&ClaBuffer> {
        self.working.as_ref().filter(|_| self.valid)
    }

    pub(crate) fn is_journaled(&self) -> bool {
        self.journaled
    }

    /// Takes the working buffer for recomputation, or acquires a new one.
    pub(crate) fn take_for_write(&mut self, pool: &mut BufferPool) -> ClaBuffer {
        self.valid = false;
        self.working.take().unwrap_or_else(|| pool.acquire())
    }

    /// Stores a freshly computed buffer.
    pub(crate) fn store(&mut self, buffer: ClaBuffer) {
        self.working = Some(buffer);
        self.valid = true;
    }

    /// Marks the content stale. When `save` is set and the slot is valid and
    /// not yet saved, the current buffer is kept for a revert.
    ///
    /// # Returns
    /// `true` if the slot was valid before
    pub(crate) fn invalidate(&mut self, save: bool) -> bool {
        let was_valid = self.valid;
        if was_valid && save && !self.journaled {
            self.cached = self.working.take();
            self.journaled = true;
        }
        self.valid = false;
        was_valid
    }

    /// Marks the slot as recorded in the revert journal.
    pub(crate) fn set_journaled(&mut self) {
        self.journaled = true;
    }

    /// Puts the saved buffer back (or marks the slot invalid if nothing was
    /// saved), releasing the working buffer if it is replaced.
    pub(crate) fn restore(&mut self, pool: &mut BufferPool) {
        match self.cached.take() {
            Some(cached) => {
                if let Some(working) = self.working.replace(cached) {
                    pool.release(working);
                }
                self.valid = true;
            }
            None => self.valid = false,
        }
        self.journaled = false;
    }

    /// Drops the saved buffer, keeping the current content.
    pub(crate) fn discard(&mut self, pool: &mut BufferPool) {
        if let Some(cached) = self.cached.take() {
            pool.release(cached);
        }
        self.journaled = false;
    }

    /// Returns all buffers to the pool.
    pub(crate) fn clear(&mut self, pool: &mut BufferPool) {
        for buffer in [self.working.take(), self.cached.take()].into_iter().flatten() {
            pool.release(buffer);
        }
        self.valid = false;
        self.journaled = false;
    }
}

// =#========================================================================#=
// PER NODE LIKELIHOOD STATE
// =#========================================================================#=
/// Likelihood state attached to a node.
///
/// Holds the transition matrices of the edge above the node (cached for the
/// edge length they were computed for), the precomputed tip rows for that
/// edge, and the two [ClaSlot]s.
#[derive(Debug, Default)]
pub struct PerNodeLikelihoodState {
    pub(crate) filial: ClaSlot,
    pub(crate) parental: ClaSlot,
    pub(crate) pmatrices: TransitionMatrices,
    /// `tip_rows[(rate * num_codes + code) * num_states + i]` = sum of
    /// `P[rate][i][j]` over the states `j` of `code`.
    pub(crate) tip_rows: Vec<f64>,
    pub(crate) pmatrix_length: Option<f64>,
}

impl PerNodeLikelihoodState {
    pub fn slot(&self, kind: SlotKind) -> &ClaSlot {
        match kind {
            SlotKind::Filial => &self.filial,
            SlotKind::Parental => &self.parental,
        }
    }

    pub(crate) fn slot_mut(&mut self, kind: SlotKind) -> &mut ClaSlot {
        match kind {
            SlotKind::Filial => &mut self.filial,
            SlotKind::Parental => &mut self.parental,
        }
    }

    /// Transition matrices of the edge to the parent.
    pub fn transition_matrices(&self) -> &TransitionMatrices {
        &self.pmatrices
    }

    /// Forgets the cached transition matrices.
    pub(crate) fn invalidate_pmatrices(&mut self) {
        self.pmatrix_length = None;
    }

    /// Returns both slots' buffers to the pool and forgets cached matrices.
    pub(crate) fn clear(&mut self, pool: &mut BufferPool) {
        self.filial.clear(pool);
        self.parental.clear(pool);
        self.pmatrix_length = None;
    }
}
