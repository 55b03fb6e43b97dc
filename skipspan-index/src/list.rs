//! The interval skip list container and its mutation driver
//!
//! The container owns three cooperating pieces: the tower structure (nodes
//! in an arena, one tower per distinct endpoint index), the marker
//! decorations riding the forward edges, and a directory mapping each
//! marker to its interval. Mutations first locate or create the endpoint
//! nodes, then stamp the marker along the maximal stair-step path between
//! them; removals reverse the stamping and retire nodes that no interval
//! ends at anymore.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use skipspan_core::{Error, Interval, Result};

use crate::node::{Node, NodeArena, NodeId, MAX_HEIGHT};

/// Probability of growing a tower by one more level is 1/BRANCHING_FACTOR.
const BRANCHING_FACTOR: u32 = 4;

/// An in-memory index mapping markers to closed intervals `[start, end]`
/// over a totally ordered domain `K`, answering stabbing and range queries
/// in expected logarithmic time.
///
/// Markers are opaque caller-supplied identifiers; each marker stores at
/// most one interval. The container is strictly single-threaded: queries
/// take `&self`, mutations take `&mut self`.
///
/// # Example
///
/// ```
/// use skipspan_index::IntervalSkipList;
///
/// let mut list = IntervalSkipList::new(i64::MIN, i64::MAX);
/// list.insert("a", 2, 7)?;
/// list.insert("b", 1, 5)?;
///
/// assert_eq!(list.find_containing(&[2]), vec!["b", "a"]);
/// list.remove(&"b");
/// assert_eq!(list.find_containing(&[2]), vec!["a"]);
/// # Ok::<(), skipspan_index::Error>(())
/// ```
pub struct IntervalSkipList<K, M> {
    pub(crate) arena: NodeArena<K, M>,
    pub(crate) compare: Box<dyn Fn(&K, &K) -> Ordering>,
    pub(crate) intervals: HashMap<M, Interval<K>>,
    rng: StdRng,
}

impl<K, M> IntervalSkipList<K, M>
where
    K: Clone + Debug,
    M: Clone + Eq + Hash + Debug,
{
    /// Creates an empty list over the natural order of `K`.
    ///
    /// `min_index` and `max_index` become the sentinel bounds; every stored
    /// endpoint must compare strictly between them.
    pub fn new(min_index: K, max_index: K) -> Self
    where
        K: Ord,
    {
        Self::with_comparator(|a, b| a.cmp(b), min_index, max_index)
    }

    /// Creates an empty list over a caller-supplied total order.
    ///
    /// The comparator must be a pure total-order function; `min_index` and
    /// `max_index` must compare strictly below and above every index the
    /// caller will store.
    pub fn with_comparator(
        compare: impl Fn(&K, &K) -> Ordering + 'static,
        min_index: K,
        max_index: K,
    ) -> Self {
        let mut arena = NodeArena::new();
        let head = arena.alloc(Node::new(min_index, MAX_HEIGHT));
        let tail = arena.alloc(Node::new(max_index, MAX_HEIGHT));
        debug_assert_eq!(head, NodeId::HEAD);
        debug_assert_eq!(tail, NodeId::TAIL);

        Self {
            arena,
            compare: Box::new(compare),
            intervals: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Replaces the height RNG with a seeded one, making tower shapes
    /// deterministic for tests.
    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of stored intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the list stores no intervals.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Read-only view of the interval stored for each marker.
    pub fn intervals_by_marker(&self) -> &HashMap<M, Interval<K>> {
        &self.intervals
    }

    /// The interval stored for `marker`, if any.
    pub fn interval(&self, marker: &M) -> Option<&Interval<K>> {
        self.intervals.get(marker)
    }

    /// Stores `marker` over the closed interval `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the marker is already present,
    /// if `start > end`, or if either endpoint falls outside the sentinel
    /// bounds.
    pub fn insert(&mut self, marker: M, start: K, end: K) -> Result<()> {
        if self.intervals.contains_key(&marker) {
            return Err(Error::InvalidArgument(format!(
                "interval for marker {marker:?} already exists"
            )));
        }
        self.check_bounds(&start, &end)?;
        self.insert_interval(marker, start, end);
        Ok(())
    }

    /// Removes the interval stored for `marker`. Unknown markers are
    /// ignored.
    pub fn remove(&mut self, marker: &M) {
        let Some(interval) = self.intervals.remove(marker) else {
            return;
        };
        trace!(
            "removing {marker:?} from [{:?}, {:?}]",
            interval.start,
            interval.end
        );
        let start_node = self.find_closest_node(&interval.start);
        let end_node = self.find_closest_node(&interval.end);
        self.arena[start_node].starting.remove(marker);
        self.arena[start_node].endpoint.remove(marker);
        self.arena[end_node].ending.remove(marker);
        self.arena[end_node].endpoint.remove(marker);
        self.remove_marker(marker, start_node, end_node);
        // Endpoint nodes are shared between intervals; a node is retired
        // only once nothing starts or ends there. For a point interval both
        // checks collapse onto the same node.
        if self.arena[start_node].endpoint.is_empty() {
            self.remove_node(&interval.start);
        }
        if end_node != start_node && self.arena[end_node].endpoint.is_empty() {
            self.remove_node(&interval.end);
        }
    }

    /// Replaces the interval stored for `marker`, equivalent to a remove
    /// followed by an insert. Validation happens first, so a rejected
    /// update leaves the previous interval in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] under the same endpoint rules as
    /// [`IntervalSkipList::insert`].
    pub fn update(&mut self, marker: M, start: K, end: K) -> Result<()> {
        self.check_bounds(&start, &end)?;
        self.remove(&marker);
        self.insert_interval(marker, start, end);
        Ok(())
    }

    /// Removes every interval. The head's forward pointers return to the
    /// tail sentinel and all interior nodes are dropped.
    pub fn clear(&mut self) {
        trace!("clearing {} intervals", self.intervals.len());
        let min_index = self.arena[NodeId::HEAD].index.clone();
        let max_index = self.arena[NodeId::TAIL].index.clone();
        self.arena = NodeArena::new();
        let head = self.arena.alloc(Node::new(min_index, MAX_HEIGHT));
        let tail = self.arena.alloc(Node::new(max_index, MAX_HEIGHT));
        debug_assert_eq!(head, NodeId::HEAD);
        debug_assert_eq!(tail, NodeId::TAIL);
        self.intervals.clear();
    }

    pub(crate) fn cmp_keys(&self, a: &K, b: &K) -> Ordering {
        (self.compare)(a, b)
    }

    fn check_bounds(&self, start: &K, end: &K) -> Result<()> {
        if self.cmp_keys(start, end) == Ordering::Greater {
            return Err(Error::InvalidArgument(format!(
                "start index {start:?} must not exceed end index {end:?}"
            )));
        }
        if self.cmp_keys(start, &self.arena[NodeId::HEAD].index) != Ordering::Greater {
            return Err(Error::InvalidArgument(format!(
                "start index {start:?} must compare above the minimum sentinel"
            )));
        }
        if self.cmp_keys(end, &self.arena[NodeId::TAIL].index) != Ordering::Less {
            return Err(Error::InvalidArgument(format!(
                "end index {end:?} must compare below the maximum sentinel"
            )));
        }
        Ok(())
    }

    fn insert_interval(&mut self, marker: M, start: K, end: K) {
        trace!("inserting {marker:?} over [{start:?}, {end:?}]");
        let start_node = self.insert_node(&start);
        let end_node = self.insert_node(&end);
        self.arena[start_node].starting.push(marker.clone());
        self.arena[start_node].endpoint.insert(marker.clone());
        self.arena[end_node].ending.push(marker.clone());
        self.arena[end_node].endpoint.insert(marker.clone());
        self.place_marker(&marker, start_node, end_node);
        self.intervals.insert(marker, Interval::new(start, end));
    }

    /// Returns the node pinned to `index`, splicing in a fresh tower of
    /// random height if the index is not occupied yet.
    fn insert_node(&mut self, index: &K) -> NodeId {
        let mut update = [NodeId::HEAD; MAX_HEIGHT];
        let closest = self.find_closest_with_update(index, &mut update);
        if closest != NodeId::TAIL
            && self.cmp_keys(&self.arena[closest].index, index) == Ordering::Equal
        {
            return closest;
        }
        let height = self.random_height();
        let node = self.arena.alloc(Node::new(index.clone(), height));
        for level in 0..height {
            let succ = self.arena[update[level]].next[level];
            self.arena[node].next[level] = succ;
            self.arena[update[level]].next[level] = node;
        }
        trace!("created node for index {index:?} with height {height}");
        self.adjust_markers_on_insert(node, &update);
        node
    }

    /// Unlinks the node pinned to `index`, if any, after re-leveling the
    /// markers that rode its tower.
    fn remove_node(&mut self, index: &K) {
        let mut update = [NodeId::HEAD; MAX_HEIGHT];
        let node = self.find_closest_with_update(index, &mut update);
        if node == NodeId::TAIL || self.cmp_keys(&self.arena[node].index, index) != Ordering::Equal
        {
            return;
        }
        self.adjust_markers_on_remove(node, &update);
        for level in 0..self.arena[node].height {
            let succ = self.arena[node].next[level];
            self.arena[update[level]].next[level] = succ;
        }
        trace!("retired node for index {index:?}");
        self.arena.free(node);
    }

    /// Geometric tower height: grow by one level with probability 1/4,
    /// capped at [`MAX_HEIGHT`].
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < MAX_HEIGHT && self.rng.gen_ratio(1, BRANCHING_FACTOR) {
            height += 1;
        }
        height
    }

    /// Descends from the head toward `index`, recording the last node
    /// visited at each level. Returns the leftmost node whose index is
    /// greater than or equal to `index`.
    pub(crate) fn find_closest_with_update(
        &self,
        index: &K,
        update: &mut [NodeId; MAX_HEIGHT],
    ) -> NodeId {
        let mut node = NodeId::HEAD;
        for level in (0..MAX_HEIGHT).rev() {
            node = self.advance_before(node, level, index);
            update[level] = node;
        }
        self.arena[node].next[0]
    }

    /// Like [`IntervalSkipList::find_closest_with_update`] without the
    /// predecessor bookkeeping.
    pub(crate) fn find_closest_node(&self, index: &K) -> NodeId {
        let mut node = NodeId::HEAD;
        for level in (0..MAX_HEIGHT).rev() {
            node = self.advance_before(node, level, index);
        }
        self.arena[node].next[0]
    }

    /// Advances along one level while the next index compares strictly
    /// below `index`, returning the last node before it.
    pub(crate) fn advance_before(&self, mut node: NodeId, level: usize, index: &K) -> NodeId {
        loop {
            let next = self.arena[node].next[level];
            if next == NodeId::TAIL
                || self.cmp_keys(&self.arena[next].index, index) != Ordering::Less
            {
                return node;
            }
            node = next;
        }
    }

    /// Whether the forward edge of `node` at `level` lands at or before
    /// `index`.
    pub(crate) fn reaches(&self, node: NodeId, level: usize, index: &K) -> bool {
        let next = self.arena[node].next[level];
        next != NodeId::TAIL && self.cmp_keys(&self.arena[next].index, index) != Ordering::Greater
    }

    /// Visits the edges of the maximal stair-step path between two endpoint
    /// nodes: ascend greedily while the level above still lands at or
    /// before the end node, walk flat, and descend as the remaining edges
    /// start to overshoot. Empty when both endpoints share a node.
    pub(crate) fn stair_path(&self, start_node: NodeId, end_node: NodeId) -> Vec<(NodeId, usize)> {
        let end_index = &self.arena[end_node].index;
        let mut edges = Vec::new();
        let mut node = start_node;
        let mut level = 0;
        while self.reaches(node, level, end_index) {
            while level + 1 < self.arena[node].height && self.reaches(node, level + 1, end_index) {
                level += 1;
            }
            edges.push((node, level));
            node = self.arena[node].next[level];
        }
        while node != end_node {
            while level > 0 && !self.reaches(node, level, end_index) {
                level -= 1;
            }
            edges.push((node, level));
            node = self.arena[node].next[level];
        }
        edges
    }

    /// Stamps `marker` on every edge of the stair-step path between its
    /// endpoint nodes.
    pub(crate) fn place_marker(&mut self, marker: &M, start_node: NodeId, end_node: NodeId) {
        for (node, level) in self.stair_path(start_node, end_node) {
            self.arena[node].markers[level].push(marker.clone());
        }
    }

    /// Reverses [`IntervalSkipList::place_marker`].
    pub(crate) fn remove_marker(&mut self, marker: &M, start_node: NodeId, end_node: NodeId) {
        for (node, level) in self.stair_path(start_node, end_node) {
            self.arena[node].markers[level].remove(marker);
        }
    }

    /// Stamps `marker` on the level edge of each node from `from` up to but
    /// not including `to`.
    pub(crate) fn place_marker_on_level(
        &mut self,
        marker: &M,
        mut from: NodeId,
        to: NodeId,
        level: usize,
    ) {
        while from != to {
            self.arena[from].markers[level].push(marker.clone());
            from = self.arena[from].next[level];
        }
    }

    /// Removes `marker` from the level edge of each node from `from` up to
    /// but not including `to`. Nodes the marker never rode are skipped
    /// silently.
    pub(crate) fn remove_marker_on_level(
        &mut self,
        marker: &M,
        mut from: NodeId,
        to: NodeId,
        level: usize,
    ) {
        while from != to {
            self.arena[from].markers[level].remove(marker);
            from = self.arena[from].next[level];
        }
    }
}
