//! Incremental likelihood evaluation over a [Tree].
//!
//! The evaluator keeps one [PerNodeLikelihoodState] per arena slot of the
//! tree it evaluates. Every directed edge "X away from Y" of the tree has one
//! CLA slot (see [node_state](crate::likelihood::node_state)), so a CLA stays
//! valid whichever node is used as likelihood root. An evaluation only
//! recomputes the invalid slots the chosen root actually depends on.
//!
//! Proposals are made revertible with a journal: between
//! [begin_proposal](LikelihoodEvaluator::begin_proposal) and
//! [restore_from_cache](LikelihoodEvaluator::restore_from_cache) or
//! [discard_cache](LikelihoodEvaluator::discard_cache), every slot that is
//! invalidated or recomputed is recorded once, together with its
//! pre-proposal buffer if it was valid.

use crate::config::LikelihoodConfig;
use crate::data::{PatternData, StateCode};
use crate::likelihood::buffer_pool::BufferPool;
use crate::likelihood::cla::{ClaBuffer, ClaDims};
use crate::likelihood::combine::{Contribution, combine, compute_tip_rows};
use crate::likelihood::error::LikelihoodError;
use crate::likelihood::node_state::{PerNodeLikelihoodState, SlotKind, SlotState};
use crate::likelihood::underflow::UnderflowPolicy;
use crate::model::{NodeId, TaxonIndex, Tree};
use crate::substitution::SubstitutionModel;
use tracing::debug;

/// Where a neighbor's contribution comes from during a combination.
#[derive(Debug, Clone, Copy)]
enum Source {
    /// Tip data of `taxon`, through the edge owned by `edge`.
    Tip { taxon: TaxonIndex, edge: NodeId },
    /// The CLA in slot (`owner`, `kind`), through the edge owned by `edge`.
    Internal { owner: NodeId, kind: SlotKind, edge: NodeId },
}

// =#========================================================================#=
// LIKELIHOOD EVALUATOR
// =#========================================================================#=
/// Computes log-likelihoods of trees for fixed data and model, reusing
/// every conditional likelihood array that is still valid.
///
/// The caller is responsible for invalidation: after changing an edge
/// length call [invalidate_away_from](Self::invalidate_away_from) on the
/// node below the edge; after a topology change call
/// [invalidate_all_away_from](Self::invalidate_all_away_from) and
/// [invalidate_both_ends](Self::invalidate_both_ends) on the nodes whose
/// neighborhood changed; after rerooting or swapping the model call
/// [invalidate_all](Self::invalidate_all).
///
/// # Example
/// ```
/// use phylik::config::LikelihoodConfig;
/// use phylik::data::{AmbiguityTable, PatternData};
/// use phylik::likelihood::LikelihoodEvaluator;
/// use phylik::model::Tree;
/// use phylik::substitution::JukesCantor;
///
/// let data = PatternData::from_sequences(
///     &[("Kiwi", "ACGT"), ("Weka", "ACGA"), ("Kea", "ACTT")],
///     AmbiguityTable::dna(),
/// ).unwrap();
/// let tree = Tree::from_newick("(Kiwi:0.1,Weka:0.2,Kea:0.3);").unwrap();
/// let mut evaluator = LikelihoodEvaluator::new(
///     Box::new(JukesCantor::dna()),
///     data,
///     &LikelihoodConfig::default(),
/// ).unwrap();
///
/// let root = tree.root().unwrap();
/// let ln_l = evaluator.compute_log_likelihood(&tree, root).unwrap();
/// assert!(ln_l < 0.0);
/// ```
#[derive(Debug)]
pub struct LikelihoodEvaluator {
    model: Box<dyn SubstitutionModel>,
    data: PatternData,
    underflow: Box<dyn UnderflowPolicy>,
    pool: BufferPool,
    states: Vec<PerNodeLikelihoodState>,
    /// Tree taxon index -> data taxon index, by name.
    taxon_map: Vec<Option<TaxonIndex>>,
    journal: Vec<(NodeId, SlotKind)>,
    journal_active: bool,
    num_recomputed_last: usize,
}

// =#========================================================================#=
// New, Getters / Accessors, etc. (pub)
// =#========================================================================#=
impl LikelihoodEvaluator {
    /// Creates an evaluator with the underflow policy described by `config`.
    ///
    /// # Errors
    /// Returns [LikelihoodError::StateCountMismatch] if model and data
    /// disagree on the number of states.
    pub fn new(
        model: Box<dyn SubstitutionModel>,
        data: PatternData,
        config: &LikelihoodConfig,
    ) -> Result<Self, LikelihoodError> {
        Self::with_policy(model, data, config.build_policy())
    }

    /// Creates an evaluator with an explicit underflow policy.
    ///
    /// # Errors
    /// Returns [LikelihoodError::StateCountMismatch] if model and data
    /// disagree on the number of states.
    pub fn with_policy(
        model: Box<dyn SubstitutionModel>,
        data: PatternData,
        underflow: Box<dyn UnderflowPolicy>,
    ) -> Result<Self, LikelihoodError> {
        check_state_counts(model.as_ref(), &data)?;
        let dims = ClaDims {
            num_rates: model.rate_categories().len(),
            num_patterns: data.num_patterns(),
            num_states: data.num_states(),
            per_pattern_scaling: underflow.per_pattern(),
        };
        Ok(LikelihoodEvaluator {
            model,
            data,
            underflow,
            pool: BufferPool::new(dims),
            states: Vec::new(),
            taxon_map: Vec::new(),
            journal: Vec::new(),
            journal_active: false,
            num_recomputed_last: 0,
        })
    }

    pub fn model(&self) -> &dyn SubstitutionModel {
        self.model.as_ref()
    }

    pub fn data(&self) -> &PatternData {
        &self.data
    }

    pub fn underflow_policy(&self) -> &dyn UnderflowPolicy {
        self.underflow.as_ref()
    }

    /// Returns the buffer pool, for diagnostics.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Number of CLAs recomputed by the last evaluation.
    pub fn num_recomputed_last(&self) -> usize {
        self.num_recomputed_last
    }

    /// Whether a proposal is being recorded.
    pub fn is_proposal_active(&self) -> bool {
        self.journal_active
    }

    /// Returns the state of one slot of `node`.
    pub fn slot_state(&self, node: NodeId, kind: SlotKind) -> SlotState {
        self.states.get(node).map_or(SlotState::Invalid, |state| state.slot(kind).state())
    }

    /// Returns `(filial, parental)` slot states of every arena slot.
    pub fn slot_states(&self) -> Vec<(SlotState, SlotState)> {
        self.states
            .iter()
            .map(|state| (state.filial.state(), state.parental.state()))
            .collect()
    }

    /// Replaces the substitution model and invalidates everything.
    ///
    /// Buffers are reallocated if the number of rate categories changes.
    ///
    /// # Errors
    /// Returns [LikelihoodError::StateCountMismatch] if the new model does not
    /// fit the data; the old model is kept in that case.
    ///
    /// # Panics
    /// Panics if a proposal is active.
    pub fn set_model(&mut self, model: Box<dyn SubstitutionModel>) -> Result<(), LikelihoodError> {
        assert!(!self.journal_active, "Cannot swap the model during a proposal");
        check_state_counts(model.as_ref(), &self.data)?;
        let dims = ClaDims { num_rates: model.rate_categories().len(), ..self.pool.dims() };
        self.model = model;
        if dims != self.pool.dims() {
            for state in &mut self.states {
                state.clear(&mut self.pool);
            }
            self.pool.reset(dims);
        } else {
            self.invalidate_all();
        }
        Ok(())
    }

    /// Returns all buffers of `node` to the pool, e.g. before the node is
    /// deleted from its tree.
    ///
    /// # Panics
    /// Panics if a proposal is active.
    pub fn release_node(&mut self, node: NodeId) {
        assert!(!self.journal_active, "Cannot release buffers during a proposal");
        if let Some(state) = self.states.get_mut(node) {
            state.clear(&mut self.pool);
        }
    }
}

// =#========================================================================#=
// EVALUATION
// =#========================================================================#=
impl LikelihoodEvaluator {
    /// Computes the log-likelihood of `tree`, using `focal` as likelihood root.
    ///
    /// The result does not depend on the choice of `focal`. Only invalid
    /// CLAs that the evaluation depends on are recomputed.
    ///
    /// # Returns
    /// The log-likelihood, which is `-inf` if some pattern has likelihood zero.
    ///
    /// # Errors
    /// Fails if `focal` is not in the tree, the tree has no edge, an edge on
    /// the way has no length, or a tip has no data.
    pub fn compute_log_likelihood(&mut self, tree: &Tree, focal: NodeId) -> Result<f64, LikelihoodError> {
        let (a, b) = self.refresh(tree, focal)?;
        self.harvest(tree, a, b, None)
    }

    /// Computes the log-likelihood of each pattern (not weighted by counts).
    ///
    /// # Errors
    /// Returns [LikelihoodError::SiteLikelihoodsUnavailable] if the underflow
    /// policy only keeps aggregate corrections; otherwise as
    /// [compute_log_likelihood](Self::compute_log_likelihood).
    pub fn site_log_likelihoods(&mut self, tree: &Tree, focal: NodeId) -> Result<Vec<f64>, LikelihoodError> {
        if !self.underflow.supports_site_likelihoods() {
            return Err(LikelihoodError::SiteLikelihoodsUnavailable);
        }
        let (a, b) = self.refresh(tree, focal)?;
        let mut sites = Vec::with_capacity(self.data.num_patterns());
        self.harvest(tree, a, b, Some(&mut sites))?;
        Ok(sites)
    }

    /// Brings every CLA needed at the edge between `focal` and one of its
    /// neighbors up to date and returns that edge.
    fn refresh(&mut self, tree: &Tree, focal: NodeId) -> Result<(NodeId, NodeId), LikelihoodError> {
        if !tree.contains(focal) {
            return Err(LikelihoodError::UnknownNode(focal));
        }
        let other = tree
            .parent(focal)
            .or_else(|| tree.left_child(focal))
            .ok_or(LikelihoodError::EmptyTree)?;
        self.prepare(tree);

        let order = self.effective_postorder(tree, focal, other);
        for &(node, away_from) in &order {
            self.recompute(tree, node, away_from)?;
        }
        self.num_recomputed_last = order.len();
        debug!(focal, recomputed = order.len(), "refreshed conditional likelihoods");
        Ok((focal, other))
    }

    /// Sizes the per-node states to the arena and maps tree taxa to data rows.
    ///
    /// The taxon map is kept until [invalidate_all](Self::invalidate_all),
    /// which is required before evaluating a different tree.
    fn prepare(&mut self, tree: &Tree) {
        if self.states.len() < tree.arena_len() {
            self.states.resize_with(tree.arena_len(), PerNodeLikelihoodState::default);
        }
        if self.taxon_map.len() != tree.taxa().len() {
            self.taxon_map = tree.taxa().names().iter().map(|name| self.data.taxa().index_of(name)).collect();
        }
    }

    /// Lists the invalid directed edges `(node, away_from)` that the edge
    /// `(a, b)` depends on, children before the CLAs combining them.
    ///
    /// Starting from both ends, the walk moves away from the focal edge and
    /// stops at tips and at valid CLAs, since everything behind a valid CLA
    /// is valid too.
    fn effective_postorder(&self, tree: &Tree, a: NodeId, b: NodeId) -> Vec<(NodeId, NodeId)> {
        let mut order = Vec::new();
        let mut stack = vec![(a, b), (b, a)];
        while let Some((node, away_from)) = stack.pop() {
            if tree.is_tip(node) {
                continue;
            }
            let (owner, kind) = slot_of(tree, node, away_from);
            if self.states[owner].slot(kind).is_valid() {
                continue;
            }
            order.push((node, away_from));
            for neighbor in tree.neighbors(node) {
                if neighbor != away_from {
                    stack.push((neighbor, node));
                }
            }
        }
        order.reverse();
        order
    }

    /// Recomputes the CLA at `node` away from `away_from`, assuming every CLA
    /// it combines is valid.
    fn recompute(&mut self, tree: &Tree, node: NodeId, away_from: NodeId) -> Result<(), LikelihoodError> {
        let mut sources = Vec::with_capacity(4);
        for neighbor in tree.neighbors(node).filter(|&n| n != away_from) {
            let edge = edge_owner(tree, node, neighbor);
            self.ensure_pmatrices(tree, edge)?;
            let source = if tree.is_tip(neighbor) {
                Source::Tip { taxon: self.data_taxon(tree, neighbor)?, edge }
            } else {
                let (owner, kind) = slot_of(tree, neighbor, node);
                Source::Internal { owner, kind, edge }
            };
            sources.push(source);
        }

        let (owner, kind) = slot_of(tree, node, away_from);
        let mut out = self.states[owner].slot_mut(kind).take_for_write(&mut self.pool);
        {
            let num_codes = self.data.ambiguity().num_codes();
            let mut contributions = Vec::with_capacity(sources.len());
            let mut internals: Vec<&ClaBuffer> = Vec::with_capacity(sources.len());
            for source in &sources {
                match *source {
                    Source::Tip { taxon, edge } => contributions.push(Contribution::Tip {
                        rows: &self.states[edge].tip_rows,
                        codes: self.data.tip_codes(taxon),
                        num_codes,
                    }),
                    Source::Internal { owner: o, kind: k, edge } => {
                        let Some(cla) = self.states[o].slot(k).buffer() else {
                            panic!("CLA of node {o} ({k:?}) must be valid before combining into node {node}");
                        };
                        internals.push(cla);
                        contributions.push(Contribution::Internal { pmatrices: &self.states[edge].pmatrices, cla });
                    }
                }
            }
            combine(&mut out, &contributions);
            out.reset_bookkeeping(contributions.len(), &internals);
            self.underflow.on_combine(&mut out, self.data.pattern_counts());
        }

        let slot = self.states[owner].slot_mut(kind);
        slot.store(out);
        if self.journal_active && !slot.is_journaled() {
            slot.set_journaled();
            self.journal.push((owner, kind));
        }
        Ok(())
    }

    /// Makes sure the transition matrices (and tip rows) of the edge above
    /// `edge` match its current length.
    fn ensure_pmatrices(&mut self, tree: &Tree, edge: NodeId) -> Result<(), LikelihoodError> {
        let length = tree.edge_length(edge).ok_or(LikelihoodError::MissingEdgeLength(edge))?;
        let state = &mut self.states[edge];
        if state.pmatrix_length == Some(length) {
            return Ok(());
        }
        self.model.compute_transition_probabilities(length, &mut state.pmatrices);
        let table = self.data.ambiguity();
        let expansions: Vec<&[usize]> =
            (0..table.num_codes()).map(|code| table.states(code as StateCode)).collect();
        compute_tip_rows(&state.pmatrices, &expansions, &mut state.tip_rows);
        state.pmatrix_length = Some(length);
        Ok(())
    }

    /// Returns the data row of tip `node`.
    fn data_taxon(&self, tree: &Tree, node: NodeId) -> Result<TaxonIndex, LikelihoodError> {
        let taxon = tree.taxon(node).ok_or(LikelihoodError::TipWithoutData(node))?;
        self.taxon_map
            .get(taxon)
            .copied()
            .flatten()
            .ok_or_else(|| LikelihoodError::UnknownTaxon(tree.taxa()[taxon].to_string()))
    }

    /// Combines both directions of the edge `(a, b)` into the log-likelihood.
    ///
    /// Per pattern, `Σ_r p_r Σ_i π_i A[i] Σ_j P[r][i][j] B[j]`, where tips
    /// use their observed states directly.
    fn harvest(
        &mut self,
        tree: &Tree,
        a: NodeId,
        b: NodeId,
        mut sites: Option<&mut Vec<f64>>,
    ) -> Result<f64, LikelihoodError> {
        let edge = edge_owner(tree, a, b);
        self.ensure_pmatrices(tree, edge)?;
        let side_a = self.side(tree, a, b)?;
        let side_b = self.side(tree, b, a)?;

        let dims = self.pool.dims();
        let num_codes = self.data.ambiguity().num_codes();
        let frequencies = self.model.state_frequencies();
        let probabilities = self.model.rate_categories().probabilities();
        let edge_state = &self.states[edge];
        let mut from_b = vec![0.0; dims.num_states];
        let mut ln_l = 0.0;

        for (p, &count) in self.data.pattern_counts().iter().enumerate() {
            let mut site = 0.0;
            for (r, &probability) in probabilities.iter().enumerate() {
                match side_b {
                    Side::Tip(taxon) => {
                        let code = self.data.tip_codes(taxon)[p] as usize;
                        let start = (r * num_codes + code) * dims.num_states;
                        from_b.copy_from_slice(&edge_state.tip_rows[start..start + dims.num_states]);
                    }
                    Side::Internal(owner, kind) => {
                        let cla = self.cla(owner, kind).entry(r, p);
                        let pmatrix = edge_state.pmatrices.matrix(r);
                        for (i, target) in from_b.iter_mut().enumerate() {
                            let row = &pmatrix[i * dims.num_states..(i + 1) * dims.num_states];
                            *target = row.iter().zip(cla).map(|(x, y)| x * y).sum();
                        }
                    }
                }
                let rate_sum: f64 = match side_a {
                    Side::Tip(taxon) => {
                        let code = self.data.tip_codes(taxon)[p];
                        self.data.ambiguity().states(code).iter().map(|&i| frequencies[i] * from_b[i]).sum()
                    }
                    Side::Internal(owner, kind) => {
                        let cla = self.cla(owner, kind).entry(r, p);
                        (0..dims.num_states).map(|i| frequencies[i] * cla[i] * from_b[i]).sum()
                    }
                };
                site += probability * rate_sum;
            }
            let ln_site = site.ln() - self.pattern_correction(side_a, p) - self.pattern_correction(side_b, p);
            if let Some(sites) = sites.as_deref_mut() {
                sites.push(ln_site);
            }
            if count > 0.0 {
                ln_l += count * ln_site;
            }
        }
        ln_l -= self.aggregate_correction(side_a) + self.aggregate_correction(side_b);
        Ok(ln_l)
    }

    /// What the harvest reads at `node` looking away from `away_from`.
    fn side(&self, tree: &Tree, node: NodeId, away_from: NodeId) -> Result<Side, LikelihoodError> {
        if tree.is_tip(node) {
            Ok(Side::Tip(self.data_taxon(tree, node)?))
        } else {
            let (owner, kind) = slot_of(tree, node, away_from);
            Ok(Side::Internal(owner, kind))
        }
    }

    fn cla(&self, owner: NodeId, kind: SlotKind) -> &ClaBuffer {
        let Some(cla) = self.states[owner].slot(kind).buffer() else {
            panic!("CLA of node {owner} ({kind:?}) must be valid when harvesting");
        };
        cla
    }

    fn pattern_correction(&self, side: Side, pattern: usize) -> f64 {
        match side {
            Side::Internal(owner, kind) => {
                self.cla(owner, kind).pattern_log_scale().get(pattern).copied().unwrap_or(0.0)
            }
            Side::Tip(_) => 0.0,
        }
    }

    fn aggregate_correction(&self, side: Side) -> f64 {
        match side {
            Side::Internal(owner, kind) => self.cla(owner, kind).log_scale(),
            Side::Tip(_) => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Tip(TaxonIndex),
    Internal(NodeId, SlotKind),
}

// =#========================================================================#=
// INVALIDATION & REVERT
// =#========================================================================#=
impl LikelihoodEvaluator {
    /// Invalidates every CLA that depends on the edge above `node`, that is
    /// every CLA "at X away from Y" with `node` on X's side, except the CLA
    /// at `node` away from its parent, which only combines the edges below.
    ///
    /// The walk does not enter a direction whose CLA was already invalid,
    /// since everything depending on an invalid CLA is invalid as well.
    /// Use this after changing the length of the edge above `node`.
    pub fn invalidate_away_from(&mut self, tree: &Tree, node: NodeId) {
        self.invalidate_walk(tree, node, true);
    }

    /// Like [invalidate_away_from](Self::invalidate_away_from), but walks
    /// the whole tree and includes the CLA at `node` away from its parent.
    /// Needed after topology changes, when the slots met on the way may
    /// have held CLAs of a different clade.
    pub fn invalidate_all_away_from(&mut self, tree: &Tree, node: NodeId) {
        self.invalidate_walk(tree, node, false);
    }

    /// Invalidates every CLA of `tree`, journaling them during a proposal.
    /// Use this after changing all edge lengths at once; unlike
    /// [invalidate_all](Self::invalidate_all) it can be reverted.
    pub fn invalidate_all_slots(&mut self, tree: &Tree) {
        self.prepare(tree);
        for node in tree.preorder_iter() {
            self.invalidate_slot(node, SlotKind::Filial);
            self.invalidate_slot(node, SlotKind::Parental);
        }
    }

    /// Invalidates both directions of the edge above `node`.
    pub fn invalidate_both_ends(&mut self, tree: &Tree, node: NodeId) {
        self.prepare(tree);
        self.invalidate_slot(node, SlotKind::Filial);
        self.invalidate_slot(node, SlotKind::Parental);
    }

    /// Invalidates every CLA and transition matrix, e.g. after model or
    /// rooting changes or before evaluating another tree. Buffers stay
    /// attached for reuse; the tip-to-data mapping is rebuilt on next use.
    ///
    /// # Panics
    /// Panics if a proposal is active.
    pub fn invalidate_all(&mut self) {
        assert!(!self.journal_active, "Cannot invalidate everything during a proposal");
        self.taxon_map.clear();
        for state in &mut self.states {
            state.filial.invalidate(false);
            state.parental.invalidate(false);
            state.invalidate_pmatrices();
        }
    }

    /// Starts recording a proposal.
    ///
    /// # Panics
    /// Panics if a proposal is already active.
    pub fn begin_proposal(&mut self) {
        assert!(!self.journal_active, "A proposal is already active");
        debug_assert!(self.journal.is_empty());
        self.journal_active = true;
    }

    /// Puts every slot touched since [begin_proposal](Self::begin_proposal)
    /// back into its pre-proposal state.
    ///
    /// Edge lengths and topology must have been restored by the caller.
    ///
    /// # Panics
    /// Panics if no proposal is active.
    pub fn restore_from_cache(&mut self) {
        assert!(self.journal_active, "No proposal to revert");
        for (owner, kind) in self.journal.drain(..) {
            self.states[owner].slot_mut(kind).restore(&mut self.pool);
        }
        self.journal_active = false;
    }

    /// Keeps the current state and returns saved pre-proposal buffers to the pool.
    ///
    /// # Panics
    /// Panics if no proposal is active.
    pub fn discard_cache(&mut self) {
        assert!(self.journal_active, "No proposal to accept");
        for (owner, kind) in self.journal.drain(..) {
            self.states[owner].slot_mut(kind).discard(&mut self.pool);
        }
        self.journal_active = false;
    }

    fn invalidate_walk(&mut self, tree: &Tree, start: NodeId, prune: bool) {
        self.prepare(tree);
        let above_start = tree.parent(start);
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(start, None)];
        while let Some((node, from)) = stack.pop() {
            let node_is_tip = tree.is_tip(node);
            for neighbor in tree.neighbors(node) {
                if Some(neighbor) == from {
                    continue;
                }
                // The filial CLA of the start node does not see its own edge
                let skip = prune && node == start && Some(neighbor) == above_start;
                let descend = if node_is_tip || skip {
                    true
                } else {
                    let (owner, kind) = slot_of(tree, node, neighbor);
                    self.invalidate_slot(owner, kind) || !prune
                };
                if descend {
                    stack.push((neighbor, Some(node)));
                }
            }
        }
    }

    /// Invalidates one slot, journaling it during a proposal.
    ///
    /// # Returns
    /// `true` if the slot was valid before
    fn invalidate_slot(&mut self, owner: NodeId, kind: SlotKind) -> bool {
        let save = self.journal_active;
        let slot = self.states[owner].slot_mut(kind);
        let record = save && slot.is_valid() && !slot.is_journaled();
        let was_valid = slot.invalidate(save);
        if record {
            self.journal.push((owner, kind));
        }
        was_valid
    }
}

/// Slot holding the CLA at `node` away from its neighbor `away_from`.
fn slot_of(tree: &Tree, node: NodeId, away_from: NodeId) -> (NodeId, SlotKind) {
    if tree.parent(node) == Some(away_from) {
        (node, SlotKind::Filial)
    } else {
        (away_from, SlotKind::Parental)
    }
}

/// The node below the edge between neighbors `a` and `b`.
fn edge_owner(tree: &Tree, a: NodeId, b: NodeId) -> NodeId {
    if tree.parent(a) == Some(b) { a } else { b }
}

fn check_state_counts(model: &dyn SubstitutionModel, data: &PatternData) -> Result<(), LikelihoodError> {
    if model.num_states() != data.num_states() {
        return Err(LikelihoodError::StateCountMismatch { model: model.num_states(), data: data.num_states() });
    }
    Ok(())
}
