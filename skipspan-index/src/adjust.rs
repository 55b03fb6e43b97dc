//! Marker maintenance around node insertion and removal
//!
//! Splicing a node into the towers splits every edge that crossed its
//! index, and unlinking one merges edges back together. Both operations
//! re-level the markers riding those edges so that each interval keeps
//! decorating the maximal stair-step path between its endpoints: markers
//! crossing a freshly inserted node may now ride a higher level through its
//! tower (promotion), and markers that rode a removed tower may overshoot
//! their endpoint on the merged edge and must step back down (demotion).
//!
//! Every scan iterates a snapshot of the edge set it reads, because the
//! re-leveling mutates those same sets as it goes. Markers promoted or
//! demoted at one level are carried in a pending queue and reconsidered at
//! each following level until they settle.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

use crate::list::IntervalSkipList;
use crate::node::{NodeId, MAX_HEIGHT};

impl<K, M> IntervalSkipList<K, M>
where
    K: Clone + Debug,
    M: Clone + Eq + Hash + Debug,
{
    /// Re-levels markers after `node` was spliced in. `update` holds the
    /// level-by-level predecessors recorded while locating the splice
    /// point; for every level below the new node's height, `update[level]`
    /// now points at `node`.
    pub(crate) fn adjust_markers_on_insert(
        &mut self,
        node: NodeId,
        update: &[NodeId; MAX_HEIGHT],
    ) {
        let top = self.arena[node].height - 1;

        // Phase 1: markers leaving the new node ride out at the highest
        // level that does not overshoot their interval end. A marker that
        // can reach the tower above gives up its footprint on the level
        // below and goes back in the queue; one that cannot settles on the
        // new node's edge at the current level.
        let mut promoted: Vec<M> = Vec::new();
        let mut new_promoted: Vec<M> = Vec::new();
        for level in 0..top {
            let above = self.arena[node].next[level + 1];
            for marker in self.arena[update[level]].markers[level].snapshot() {
                if self.edge_reaches_end(above, &marker) {
                    let from = self.arena[node].next[level];
                    self.remove_marker_on_level(&marker, from, above, level);
                    new_promoted.push(marker);
                } else {
                    self.arena[node].markers[level].push(marker);
                }
            }
            let mut still_promoted = Vec::new();
            for marker in promoted.drain(..) {
                if self.edge_reaches_end(above, &marker) {
                    let from = self.arena[node].next[level];
                    self.remove_marker_on_level(&marker, from, above, level);
                    still_promoted.push(marker);
                } else {
                    self.arena[node].markers[level].push(marker);
                }
            }
            promoted = still_promoted;
            promoted.append(&mut new_promoted);
        }
        for marker in self.arena[update[top]].markers[top].snapshot() {
            self.arena[node].markers[top].push(marker);
        }
        for marker in promoted {
            self.arena[node].markers[top].push(marker);
        }

        // Phase 2: markers arriving at the new node climb as far as its
        // tower allows. A marker whose start lies at or before the
        // predecessor one level up can enter through that predecessor's
        // higher edge instead, shedding its footprint on the segment below.
        let mut promoted: Vec<M> = Vec::new();
        let mut new_promoted: Vec<M> = Vec::new();
        for level in 0..top {
            let pred_above = update[level + 1];
            for marker in self.arena[update[level]].markers[level].snapshot() {
                if self.starts_at_or_before(pred_above, &marker) {
                    self.remove_marker_on_level(&marker, pred_above, node, level);
                    new_promoted.push(marker);
                }
            }
            let mut still_promoted = Vec::new();
            for marker in promoted.drain(..) {
                if self.starts_at_or_before(pred_above, &marker) {
                    self.remove_marker_on_level(&marker, pred_above, node, level);
                    still_promoted.push(marker);
                } else {
                    self.arena[update[level]].markers[level].push(marker);
                }
            }
            promoted = still_promoted;
            promoted.append(&mut new_promoted);
        }
        for marker in promoted {
            self.arena[update[top]].markers[top].push(marker);
        }
    }

    /// Re-levels markers before `node` is spliced out. `update` holds the
    /// level-by-level predecessors of the node; after unlinking, the edge
    /// from `update[level]` will land on `node.next[level]`.
    pub(crate) fn adjust_markers_on_remove(
        &mut self,
        node: NodeId,
        update: &[NodeId; MAX_HEIGHT],
    ) {
        let height = self.arena[node].height;

        // Phase 1: edges arriving from the left get extended to the node's
        // successor at their level. Markers whose interval ends short of
        // that successor are pulled off and walked back down, rebuilding
        // the descending stair between the predecessors until the extended
        // edge fits again.
        let mut demoted: Vec<M> = Vec::new();
        let mut new_demoted: Vec<M> = Vec::new();
        for level in (0..height).rev() {
            let target = self.arena[node].next[level];
            for marker in self.arena[update[level]].markers[level].snapshot() {
                if !self.edge_reaches_end(target, &marker) {
                    self.arena[update[level]].markers[level].remove(&marker);
                    new_demoted.push(marker);
                }
            }
            let mut still_demoted = Vec::new();
            for marker in demoted.drain(..) {
                self.place_marker_on_level(&marker, update[level + 1], update[level], level);
                if self.edge_reaches_end(target, &marker) {
                    self.arena[update[level]].markers[level].push(marker);
                } else {
                    still_demoted.push(marker);
                }
            }
            demoted = still_demoted;
            demoted.append(&mut new_demoted);
        }

        // Phase 2: markers that climbed the doomed tower from the right
        // lose their step up. Each rebuilds its ascent over the successor
        // towers, level by level, until it reaches the level its surviving
        // left-hand edge already carries it at.
        let mut demoted: Vec<M> = Vec::new();
        let mut new_demoted: Vec<M> = Vec::new();
        for level in (0..height).rev() {
            for marker in self.arena[node].markers[level].snapshot() {
                if !self.starts_at_or_before(update[level], &marker) {
                    new_demoted.push(marker);
                }
            }
            let mut still_demoted = Vec::new();
            for marker in demoted.drain(..) {
                let from = self.arena[node].next[level];
                let to = self.arena[node].next[level + 1];
                self.place_marker_on_level(&marker, from, to, level);
                if !self.starts_at_or_before(update[level], &marker) {
                    still_demoted.push(marker);
                }
            }
            demoted = still_demoted;
            demoted.append(&mut new_demoted);
        }
    }

    /// Whether the interval of `marker` ends at or beyond the index of
    /// `target`, i.e. an edge landing on `target` still fits inside it.
    fn edge_reaches_end(&self, target: NodeId, marker: &M) -> bool {
        let end = &self.intervals[marker].end;
        self.cmp_keys(&self.arena[target].index, end) != Ordering::Greater
    }

    /// Whether the interval of `marker` starts at or before the index of
    /// `pred`, i.e. the marker's path already runs through `pred`.
    fn starts_at_or_before(&self, pred: NodeId, marker: &M) -> bool {
        let start = &self.intervals[marker].start;
        self.cmp_keys(start, &self.arena[pred].index) != Ordering::Greater
    }
}
