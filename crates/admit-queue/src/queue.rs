//! The incremental dependency-acceptance queue.
//!
//! Values are offered together with the keys they provide, require and need.
//! Every `offer` and `retract` returns the values whose acceptance changed as
//! a direct or indirect consequence of that single call:
//!
//! - `offer` returns newly accepted values, providers of a required key ahead
//!   of the values requiring it;
//! - `retract` returns deaccepted values, dependents ahead of whatever they
//!   depended on, the retracted value last.
//!
//! A value that cannot be accepted yet stays registered and is reconsidered by
//! every later `offer`.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;

/// The keys a single value provides, requires and needs.
///
/// A required key must be provided by an accepted value that precedes the
/// requirer in acceptance order. A needed key must be provided by an accepted
/// value too, but with no ordering constraint.
#[derive(Debug, Clone)]
pub struct Descriptor<K> {
    pub provides: IndexSet<K>,
    pub requires: IndexSet<K>,
    pub needs: IndexSet<K>,
}

impl<K: Eq + Hash> Descriptor<K> {
    pub fn new<P, R, N>(provides: P, requires: R, needs: N) -> Self
    where
        P: IntoIterator<Item = K>,
        R: IntoIterator<Item = K>,
        N: IntoIterator<Item = K>,
    {
        Self {
            provides: provides.into_iter().collect(),
            requires: requires.into_iter().collect(),
            needs: needs.into_iter().collect(),
        }
    }

    /// Every key that must have an accepted provider: requires first, then
    /// needs. A key named in both is yielded once.
    pub fn constraints(&self) -> impl Iterator<Item = &K> + '_ {
        self.requires
            .iter()
            .chain(self.needs.iter().filter(|k| !self.requires.contains(*k)))
    }

    /// Whether this value can be accepted without any provider.
    pub fn is_unconstrained(&self) -> bool {
        self.requires.is_empty() && self.needs.is_empty()
    }
}

/// A point-in-time copy of the queue, in registration order.
#[derive(Debug, Clone)]
pub struct QueueSnapshot<K, V> {
    pub entries: Vec<SnapshotEntry<K, V>>,
    /// Provider index: key to providers, in registration order per key.
    pub providers: IndexMap<K, IndexSet<V>>,
}

/// One registered value inside a [`QueueSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotEntry<K, V> {
    pub value: V,
    pub descriptor: Descriptor<K>,
    pub accepted: bool,
}

/// What a single [`DependencyQueue::update`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferOutcome<V> {
    /// Newly accepted values, providers before requirers.
    pub accepted: Vec<V>,
    /// Values no longer accepted, dependents before what they depended on.
    pub retracted: Vec<V>,
}

/// Values tentatively proposed for acceptance during one visit.
///
/// Values are prepended as they are entered, so anything visited on behalf of
/// a value ends up in front of it.
struct Proposal<V> {
    order: VecDeque<V>,
    members: HashSet<V>,
}

impl<V: Eq + Hash + Clone> Proposal<V> {
    fn new() -> Self {
        Self {
            order: VecDeque::new(),
            members: HashSet::new(),
        }
    }

    fn contains(&self, value: &V) -> bool {
        self.members.contains(value)
    }

    fn prepend(&mut self, value: V) {
        self.members.insert(value.clone());
        self.order.push_front(value);
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    /// Drop everything prepended since the proposal had `len` entries.
    fn rewind(&mut self, len: usize) {
        while self.order.len() > len {
            if let Some(value) = self.order.pop_front() {
                self.members.remove(&value);
            }
        }
    }
}

/// A value being visited: which constraint and which provider of it is
/// being tried.
struct Frame<'a, K> {
    keys: Vec<&'a K>,
    key: usize,
    candidate: usize,
    /// Proposal length before the current candidate was entered.
    mark: usize,
}

impl<K> Frame<'_, K> {
    fn next_key(&mut self) {
        self.key += 1;
        self.candidate = 0;
    }
}

enum Visit<'a, K> {
    /// Settled without looking at any provider.
    Done(bool),
    Frame(Frame<'a, K>),
}

/// All mutable queue state. Only ever touched with the queue lock held.
struct QueueState<K, V> {
    /// Registered values in registration order.
    descriptors: IndexMap<V, Descriptor<K>>,
    /// Key to every registered value providing it, accepted or not.
    providers: IndexMap<K, IndexSet<V>>,
    accepted: HashSet<V>,
}

impl<K, V> QueueState<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            descriptors: IndexMap::new(),
            providers: IndexMap::new(),
            accepted: HashSet::new(),
        }
    }

    /// Store or replace the descriptor of `value` and index what it provides.
    ///
    /// Returns `true` when an earlier descriptor was replaced.
    fn register(&mut self, value: V, descriptor: Descriptor<K>) -> bool {
        let stale: Vec<K> = match self.descriptors.get(&value) {
            Some(previous) => previous
                .provides
                .iter()
                .filter(|k| !descriptor.provides.contains(*k))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        for key in &stale {
            self.unlink_provider(key, &value);
        }
        for key in &descriptor.provides {
            self.providers
                .entry(key.clone())
                .or_default()
                .insert(value.clone());
        }
        self.descriptors.insert(value, descriptor).is_some()
    }

    fn unlink_provider(&mut self, key: &K, value: &V) {
        if let Some(set) = self.providers.get_mut(key) {
            set.shift_remove(value);
            if set.is_empty() {
                self.providers.shift_remove(key);
            }
        }
    }

    /// Work out what has to be accepted, in order, for `value` to be accepted.
    ///
    /// Returns `None` when some constraint cannot be met, and an empty list
    /// when `value` is already accepted.
    fn propose(&self, value: &V) -> Option<VecDeque<V>> {
        if self.accepted.contains(value) {
            return Some(VecDeque::new());
        }
        let mut proposal = Proposal::new();
        if self.visit(value, &mut proposal) {
            Some(proposal.order)
        } else {
            None
        }
    }

    /// Depth-first search for providers of every constraint of `root`.
    ///
    /// Providers are tried in provider-index order. A provider whose own
    /// search fails is dropped from the proposal along with everything it
    /// pulled in, and the next one is tried.
    fn visit(&self, root: &V, proposal: &mut Proposal<V>) -> bool {
        let mut stack = match self.enter(root, proposal) {
            Visit::Done(satisfied) => return satisfied,
            Visit::Frame(frame) => vec![frame],
        };
        // Outcome of the visit that just finished, reported to its parent.
        let mut finished: Option<bool> = None;

        while let Some(frame) = stack.last_mut() {
            if let Some(satisfied) = finished.take() {
                if satisfied {
                    frame.next_key();
                } else {
                    proposal.rewind(frame.mark);
                    frame.candidate += 1;
                }
            }

            let Some(&key) = frame.keys.get(frame.key) else {
                stack.pop();
                finished = Some(true);
                continue;
            };
            let Some(candidates) = self.providers.get(key) else {
                tracing::trace!("constraint has no registered provider");
                stack.pop();
                finished = Some(false);
                continue;
            };
            let Some(candidate) = candidates.get_index(frame.candidate) else {
                tracing::trace!(
                    candidates = candidates.len(),
                    "no provider of constraint can be accepted"
                );
                stack.pop();
                finished = Some(false);
                continue;
            };
            if self.accepted.contains(candidate) {
                frame.next_key();
                continue;
            }

            frame.mark = proposal.len();
            match self.enter(candidate, proposal) {
                Visit::Done(satisfied) => finished = Some(satisfied),
                Visit::Frame(child) => stack.push(child),
            }
        }
        finished.unwrap_or(false)
    }

    /// Start visiting `value`, prepending it to the proposal.
    fn enter<'a>(&'a self, value: &V, proposal: &mut Proposal<V>) -> Visit<'a, K> {
        // Re-entering a value already in the proposal counts as satisfied.
        // A require cycle with no outside provider is therefore accepted.
        if proposal.contains(value) {
            return Visit::Done(true);
        }
        let Some(descriptor) = self.descriptors.get(value) else {
            return Visit::Done(false);
        };
        proposal.prepend(value.clone());
        Visit::Frame(Frame {
            keys: descriptor.constraints().collect(),
            key: 0,
            candidate: 0,
            mark: 0,
        })
    }

    fn accept(&mut self, proposal: VecDeque<V>, newly: &mut Vec<V>) {
        for value in proposal {
            if self.accepted.insert(value.clone()) {
                newly.push(value);
            }
        }
    }

    /// Keep accepting pending values until a full pass makes no progress.
    fn accept_pending(&mut self, newly: &mut Vec<V>) {
        loop {
            let pending: Vec<V> = self
                .descriptors
                .keys()
                .rev()
                .filter(|v| !self.accepted.contains(*v))
                .cloned()
                .collect();
            let before = newly.len();
            for value in pending {
                if self.accepted.contains(&value) {
                    continue;
                }
                if let Some(proposal) = self.propose(&value) {
                    self.accept(proposal, newly);
                }
            }
            if newly.len() == before {
                break;
            }
        }
    }

    fn has_accepted_provider(&self, key: &K) -> bool {
        self.providers
            .get(key)
            .is_some_and(|set| set.iter().any(|p| self.accepted.contains(p)))
    }

    /// First accepted value, in registration order, missing an accepted
    /// provider for one of its constraints.
    fn first_unsatisfied(&self) -> Option<V> {
        self.descriptors
            .iter()
            .filter(|(value, _)| self.accepted.contains(*value))
            .find(|(_, descriptor)| {
                descriptor
                    .constraints()
                    .any(|key| !self.has_accepted_provider(key))
            })
            .map(|(value, _)| value.clone())
    }

    /// Deaccept accepted values missing a provider until none is left,
    /// prepending each to `deaccepted`.
    fn deaccept_unsatisfied(&mut self, deaccepted: &mut VecDeque<V>) {
        while let Some(broken) = self.first_unsatisfied() {
            self.accepted.remove(&broken);
            deaccepted.push_front(broken);
        }
    }

    fn unresolved(&self, value: &V) -> Vec<K> {
        self.descriptors
            .get(value)
            .map(|descriptor| {
                descriptor
                    .constraints()
                    .filter(|key| !self.has_accepted_provider(key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Decides which offered values can be accepted, and in which order.
///
/// All state sits behind a single lock held for the whole of every call, so
/// `offer`, `retract` and the queries are atomic with respect to each other.
/// Share the queue between threads with an `Arc`.
pub struct DependencyQueue<K, V> {
    state: Mutex<QueueState<K, V>>,
}

impl<K, V> DependencyQueue<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::new()),
        }
    }

    /// Offer `value` with the keys it provides, requires and needs.
    ///
    /// Returns every value accepted as a result of this call, providers of a
    /// required key before their requirers. Returns an empty list when
    /// `value` cannot be accepted yet; it then stays pending.
    ///
    /// Offering a value that is already registered replaces its descriptor.
    /// Accepted values the new descriptor leaves without a provider, `value`
    /// included, are deaccepted. They are not part of the result; use
    /// [`update`](Self::update) when a descriptor may change.
    pub fn offer<P, R, N>(&self, value: V, provides: P, requires: R, needs: N) -> Vec<V>
    where
        P: IntoIterator<Item = K>,
        R: IntoIterator<Item = K>,
        N: IntoIterator<Item = K>,
    {
        self.offer_descriptor(value, Descriptor::new(provides, requires, needs))
    }

    /// Like [`offer`](Self::offer) with a prebuilt [`Descriptor`].
    pub fn offer_descriptor(&self, value: V, descriptor: Descriptor<K>) -> Vec<V> {
        self.update(value, descriptor).accepted
    }

    /// Offer `value` with `descriptor`, reporting both what became accepted
    /// and what stopped being accepted.
    ///
    /// For a value offered for the first time `retracted` is always empty.
    /// When a registered value is offered again, every accepted value left
    /// without an accepted provider is deaccepted first, dependents before
    /// what they depended on, exactly as [`retract`](Self::retract) orders
    /// them. `value` is then proposed as in [`offer`](Self::offer). A value
    /// that is deaccepted and accepted again by the same call is in neither
    /// list.
    pub fn update(&self, value: V, descriptor: Descriptor<K>) -> OfferOutcome<V> {
        let mut state = self.state.lock();
        let replaced = state.register(value.clone(), descriptor);

        let mut retracted = VecDeque::new();
        if replaced {
            state.deaccept_unsatisfied(&mut retracted);
        }

        let mut accepted = Vec::new();
        match state.propose(&value) {
            Some(proposal) => {
                state.accept(proposal, &mut accepted);
                state.accept_pending(&mut accepted);
            }
            None => tracing::debug!(
                registered = state.descriptors.len(),
                "offered value cannot be accepted yet"
            ),
        }

        let mut retracted: Vec<V> = retracted.into();
        if !retracted.is_empty() {
            let restored: HashSet<V> = retracted
                .iter()
                .filter(|v| state.accepted.contains(*v))
                .cloned()
                .collect();
            retracted.retain(|v| !restored.contains(v));
            accepted.retain(|v| !restored.contains(v));
        }

        if !accepted.is_empty() || !retracted.is_empty() {
            tracing::debug!(
                newly_accepted = accepted.len(),
                retracted = retracted.len(),
                accepted = state.accepted.len(),
                "offer changed accepted values"
            );
        }
        OfferOutcome {
            accepted,
            retracted,
        }
    }

    /// Withdraw `value` and deaccept everything that can no longer be
    /// satisfied without it.
    ///
    /// Returns the deaccepted values, dependents before the values they
    /// depended on, `value` itself last. Returns an empty list when `value`
    /// is unknown or was never accepted.
    pub fn retract(&self, value: &V) -> Vec<V> {
        let mut state = self.state.lock();
        let Some(descriptor) = state.descriptors.shift_remove(value) else {
            return Vec::new();
        };
        for key in &descriptor.provides {
            state.unlink_provider(key, value);
        }
        if !state.accepted.remove(value) {
            return Vec::new();
        }

        let mut retracted = VecDeque::from([value.clone()]);
        state.deaccept_unsatisfied(&mut retracted);

        tracing::debug!(
            cascaded = retracted.len() - 1,
            accepted = state.accepted.len(),
            "retract deaccepted values"
        );
        retracted.into()
    }

    pub fn is_registered(&self, value: &V) -> bool {
        self.state.lock().descriptors.contains_key(value)
    }

    pub fn is_accepted(&self, value: &V) -> bool {
        self.state.lock().accepted.contains(value)
    }

    /// Number of registered values, accepted or pending.
    pub fn len(&self) -> usize {
        self.state.lock().descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Accepted values in registration order.
    pub fn accepted(&self) -> Vec<V> {
        let state = self.state.lock();
        state
            .descriptors
            .keys()
            .filter(|v| state.accepted.contains(*v))
            .cloned()
            .collect()
    }

    /// Registered but not accepted values in registration order.
    pub fn pending(&self) -> Vec<V> {
        let state = self.state.lock();
        state
            .descriptors
            .keys()
            .filter(|v| !state.accepted.contains(*v))
            .cloned()
            .collect()
    }

    /// Registered providers of `key`, first registered first.
    pub fn providers_of(&self, key: &K) -> Vec<V> {
        self.state
            .lock()
            .providers
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Constraints of `value` that currently have no accepted provider.
    ///
    /// Empty for unknown values. For a pending value this is usually why it
    /// is still pending; a non-empty result with only cyclic providers means
    /// the providers themselves are pending.
    pub fn unresolved(&self, value: &V) -> Vec<K> {
        self.state.lock().unresolved(value)
    }

    pub fn snapshot(&self) -> QueueSnapshot<K, V> {
        let state = self.state.lock();
        QueueSnapshot {
            entries: state
                .descriptors
                .iter()
                .map(|(value, descriptor)| SnapshotEntry {
                    value: value.clone(),
                    descriptor: descriptor.clone(),
                    accepted: state.accepted.contains(value),
                })
                .collect(),
            providers: state.providers.clone(),
        }
    }
}

impl<K, V> Default for DependencyQueue<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
