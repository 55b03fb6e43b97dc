//! Diagnostic check of the marker placement invariant
//!
//! The checker re-derives the stair-step path of every stored interval and
//! compares it against the decorations actually present, then sweeps the
//! arena for strays. It exists for tests and debugging; production callers
//! never need it.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use skipspan_core::{Error, Result};

use crate::list::IntervalSkipList;
use crate::node::NodeId;

impl<K, M> IntervalSkipList<K, M>
where
    K: Clone + Debug,
    M: Clone + Eq + Hash + Debug,
{
    /// Verifies that every stored marker decorates exactly the edges of the
    /// maximal stair-step path between its endpoint nodes, that the
    /// endpoint sets agree with the directory, and that no edge or node
    /// carries anything it should not.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvariantViolation`] on the first discrepancy,
    /// which indicates a bug in the marker maintenance code.
    pub fn verify_marker_invariant(&self) -> Result<()> {
        // Count every stamp up front so decorations outside a marker's
        // path are caught by the totals below.
        let mut stamps: HashMap<&M, usize> = HashMap::new();
        for (id, node) in self.arena.iter() {
            for level_set in &node.markers {
                for marker in level_set.iter() {
                    if !self.intervals.contains_key(marker) {
                        return Err(Error::InvariantViolation(format!(
                            "edge at index {:?} carries unknown marker {marker:?}",
                            node.index
                        )));
                    }
                    *stamps.entry(marker).or_insert(0) += 1;
                }
            }
            if id != NodeId::HEAD && id != NodeId::TAIL && node.endpoint.is_empty() {
                return Err(Error::InvariantViolation(format!(
                    "node at index {:?} is no interval's endpoint",
                    node.index
                )));
            }
        }

        for (marker, interval) in &self.intervals {
            let start_node = self.find_closest_node(&interval.start);
            if self.cmp_keys(&self.arena[start_node].index, &interval.start) != Ordering::Equal {
                return Err(Error::InvariantViolation(format!(
                    "no node at start index {:?} of marker {marker:?}",
                    interval.start
                )));
            }
            let end_node = self.find_closest_node(&interval.end);
            if self.cmp_keys(&self.arena[end_node].index, &interval.end) != Ordering::Equal {
                return Err(Error::InvariantViolation(format!(
                    "no node at end index {:?} of marker {marker:?}",
                    interval.end
                )));
            }
            if !self.arena[start_node].starting.contains(marker) {
                return Err(Error::InvariantViolation(format!(
                    "marker {marker:?} missing from the starting set at {:?}",
                    interval.start
                )));
            }
            if !self.arena[end_node].ending.contains(marker) {
                return Err(Error::InvariantViolation(format!(
                    "marker {marker:?} missing from the ending set at {:?}",
                    interval.end
                )));
            }
            if !self.arena[start_node].endpoint.contains(marker)
                || !self.arena[end_node].endpoint.contains(marker)
            {
                return Err(Error::InvariantViolation(format!(
                    "marker {marker:?} missing from an endpoint set"
                )));
            }

            let path = self.stair_path(start_node, end_node);
            for &(node, level) in &path {
                let tower = &self.arena[node];
                for lvl in 0..tower.height {
                    let stamped = tower.markers[lvl].contains(marker);
                    if lvl == level && !stamped {
                        return Err(Error::InvariantViolation(format!(
                            "marker {marker:?} missing from the level {lvl} edge at {:?}",
                            tower.index
                        )));
                    }
                    if lvl != level && stamped {
                        return Err(Error::InvariantViolation(format!(
                            "marker {marker:?} stamped off its path at {:?}, level {lvl}",
                            tower.index
                        )));
                    }
                }
            }
            let end_tower = &self.arena[end_node];
            for lvl in 0..end_tower.height {
                if end_tower.markers[lvl].contains(marker) {
                    return Err(Error::InvariantViolation(format!(
                        "marker {marker:?} overruns its end node at {:?}",
                        interval.end
                    )));
                }
            }

            let total = stamps.get(marker).copied().unwrap_or(0);
            if total != path.len() {
                return Err(Error::InvariantViolation(format!(
                    "marker {marker:?} has {total} edge stamps, expected {}",
                    path.len()
                )));
            }
        }

        Ok(())
    }
}
