//! Region connectivity graph
//!
//! Undirected adjacency over the region arena plus the two symmetric override
//! relations. Sampling only ever adds edges; [`RegionGraph::reconcile`] then
//! makes the overrides win.

use log::{debug, error};

use super::{Region, RegionError, RegionId};

/// How two regions relate after overrides are taken into account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRelation {
    /// Forced connected
    PositiveOverride,
    /// Forced disconnected
    NegativeOverride,
    /// Connected by sampling
    Connected,
    /// Not connected
    Disconnected,
}

/// Arena of regions indexed by [`RegionId`]
#[derive(Debug, Clone, Default)]
pub struct RegionGraph {
    regions: Vec<Region>,
}

impl RegionGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_regions(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub(crate) fn take_regions(&mut self) -> Vec<Region> {
        std::mem::take(&mut self.regions)
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the graph holds no region
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Region by id
    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(id.0)
    }

    /// All regions in id order
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Region> {
        self.regions.iter_mut()
    }

    /// Fail with [`RegionError::InvalidRegion`] unless `id` names a region
    pub fn check(&self, id: RegionId) -> Result<(), RegionError> {
        if id.0 < self.regions.len() {
            Ok(())
        } else {
            Err(RegionError::InvalidRegion {
                id,
                count: self.regions.len(),
            })
        }
    }

    fn check_pair(&self, a: RegionId, b: RegionId) -> Result<(), RegionError> {
        self.check(a)?;
        self.check(b)
    }

    /// Whether `b` is one step from `a`; every region reaches itself
    pub fn is_connected(&self, a: RegionId, b: RegionId) -> bool {
        self.get(a).is_some_and(|region| region.is_connected_to(b))
    }

    /// Add the undirected edge `a - b`
    pub fn connect(&mut self, a: RegionId, b: RegionId) -> Result<(), RegionError> {
        self.check_pair(a, b)?;
        if self.is_connected(a, b) {
            return Ok(());
        }
        self.regions[a.0].connected.push(b);
        self.regions[b.0].connected.push(a);
        Ok(())
    }

    /// Remove the undirected edge `a - b` if present
    pub fn disconnect(&mut self, a: RegionId, b: RegionId) -> Result<(), RegionError> {
        self.check_pair(a, b)?;
        self.regions[a.0].connected.retain(|&id| id != b);
        self.regions[b.0].connected.retain(|&id| id != a);
        Ok(())
    }

    /// Drop every sampled edge; overrides are kept
    pub fn clear_connections(&mut self) {
        for region in &mut self.regions {
            region.connected.clear();
        }
    }

    /// Force `a` and `b` connected, now and after every bake
    pub fn add_positive_override(&mut self, a: RegionId, b: RegionId) -> Result<(), RegionError> {
        self.check_pair(a, b)?;
        if a == b {
            debug!("Ignoring positive override of region {} with itself", a);
            return Ok(());
        }
        if self.regions[a.0].positive_overrides.contains(&b) {
            return Ok(());
        }
        self.regions[a.0].positive_overrides.push(b);
        if !self.regions[b.0].positive_overrides.contains(&a) {
            self.regions[b.0].positive_overrides.push(a);
        }
        self.connect(a, b)
    }

    /// Forget a positive override pair; the current edge is left alone
    pub fn remove_positive_override(&mut self, a: RegionId, b: RegionId) -> Result<(), RegionError> {
        self.check_pair(a, b)?;
        self.regions[a.0].positive_overrides.retain(|&id| id != b);
        self.regions[b.0].positive_overrides.retain(|&id| id != a);
        Ok(())
    }

    /// Force `a` and `b` apart, now and after every bake
    pub fn add_negative_override(&mut self, a: RegionId, b: RegionId) -> Result<(), RegionError> {
        self.check_pair(a, b)?;
        if a == b {
            debug!("Ignoring negative override of region {} with itself", a);
            return Ok(());
        }
        if self.regions[a.0].negative_overrides.contains(&b) {
            return Ok(());
        }
        self.disconnect(a, b)?;
        self.regions[a.0].negative_overrides.push(b);
        if !self.regions[b.0].negative_overrides.contains(&a) {
            self.regions[b.0].negative_overrides.push(a);
        }
        Ok(())
    }

    /// Forget a negative override pair; the pair stays disconnected until the next bake
    pub fn remove_negative_override(&mut self, a: RegionId, b: RegionId) -> Result<(), RegionError> {
        self.check_pair(a, b)?;
        self.regions[a.0].negative_overrides.retain(|&id| id != b);
        self.regions[b.0].negative_overrides.retain(|&id| id != a);
        Ok(())
    }

    /// Relation between two regions, overrides first
    pub fn relation(&self, a: RegionId, b: RegionId) -> Result<RegionRelation, RegionError> {
        self.check_pair(a, b)?;
        let region = &self.regions[a.0];
        let relation = if region.positive_overrides.contains(&b) {
            RegionRelation::PositiveOverride
        } else if region.negative_overrides.contains(&b) {
            RegionRelation::NegativeOverride
        } else if region.is_connected_to(b) {
            RegionRelation::Connected
        } else {
            RegionRelation::Disconnected
        };
        Ok(relation)
    }

    /// Make every override hold
    ///
    /// References to ids outside the arena are pruned first. Afterwards each
    /// positive pair has an edge and each negative pair has none; a pair in
    /// both relations ends up disconnected.
    pub fn reconcile(&mut self) {
        let count = self.regions.len();
        let mut pruned = 0;
        for region in &mut self.regions {
            for list in [
                &mut region.connected,
                &mut region.positive_overrides,
                &mut region.negative_overrides,
            ] {
                let before = list.len();
                list.retain(|id| id.0 < count);
                let mut seen = Vec::with_capacity(list.len());
                list.retain(|id| {
                    if seen.contains(id) {
                        false
                    } else {
                        seen.push(*id);
                        true
                    }
                });
                pruned += before - list.len();
            }
        }
        if pruned > 0 {
            debug!("Pruned {} stale region references", pruned);
        }

        for index in 0..count {
            let id = RegionId(index);
            let positives = self.regions[index].positive_overrides.clone();
            let negatives = self.regions[index].negative_overrides.clone();
            for other in positives {
                if let Err(e) = self.connect(id, other) {
                    error!("Failed to apply positive override {} - {}: {}", id, other, e);
                }
            }
            for other in negatives {
                if let Err(e) = self.disconnect(id, other) {
                    error!("Failed to apply negative override {} - {}: {}", id, other, e);
                }
            }
        }
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.regions.iter().map(|region| region.connected.len()).sum::<usize>() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::regions::{RegionBox, RegionDesc, SceneHandle};

    fn graph(count: usize) -> RegionGraph {
        let regions = (0..count)
            .map(|i| {
                Region::new(
                    RegionId(i),
                    &RegionDesc {
                        handle: SceneHandle(i as u64),
                        name: format!("region {i}"),
                        transform: Transform::from_position(Vec3::new(i as f32 * 10.0, 0.0, 0.0)),
                        boxes: vec![RegionBox::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0))],
                    },
                )
            })
            .collect();
        RegionGraph::from_regions(regions)
    }

    fn assert_symmetric(graph: &RegionGraph) {
        for region in graph.iter() {
            for &other in region.connected_regions() {
                assert!(
                    graph.get(other).unwrap().connected_regions().contains(&region.id()),
                    "edge {} -> {} has no reverse",
                    region.id(),
                    other
                );
            }
        }
    }

    #[test]
    fn test_connect_is_symmetric_and_idempotent() {
        let mut graph = graph(3);
        graph.connect(RegionId(0), RegionId(1)).unwrap();
        graph.connect(RegionId(1), RegionId(0)).unwrap();
        graph.connect(RegionId(2), RegionId(2)).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.is_connected(RegionId(1), RegionId(0)));
        assert!(graph.is_connected(RegionId(2), RegionId(2)));
        assert!(graph.get(RegionId(2)).unwrap().connected_regions().is_empty());
        assert_symmetric(&graph);

        graph.disconnect(RegionId(1), RegionId(0)).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_invalid_ids_are_rejected() {
        let mut graph = graph(2);
        let err = graph.connect(RegionId(0), RegionId(5)).unwrap_err();
        assert!(matches!(err, RegionError::InvalidRegion { id: RegionId(5), count: 2 }));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_negative_override_disconnects_first() {
        let mut graph = graph(2);
        graph.connect(RegionId(0), RegionId(1)).unwrap();
        graph.add_negative_override(RegionId(0), RegionId(1)).unwrap();
        graph.add_negative_override(RegionId(1), RegionId(0)).unwrap();

        assert!(!graph.is_connected(RegionId(0), RegionId(1)));
        assert_eq!(graph.get(RegionId(0)).unwrap().negative_overrides(), &[RegionId(1)]);
        assert_eq!(graph.get(RegionId(1)).unwrap().negative_overrides(), &[RegionId(0)]);
        assert_eq!(
            graph.relation(RegionId(1), RegionId(0)).unwrap(),
            RegionRelation::NegativeOverride
        );
    }

    #[test]
    fn test_overrides_survive_clear_and_reconcile() {
        let mut graph = graph(4);
        graph.add_positive_override(RegionId(0), RegionId(3)).unwrap();
        graph.connect(RegionId(1), RegionId(2)).unwrap();
        graph.add_negative_override(RegionId(1), RegionId(2)).unwrap();

        graph.clear_connections();
        // Sampling re-adds the forbidden edge
        graph.connect(RegionId(1), RegionId(2)).unwrap();
        graph.reconcile();

        assert!(graph.is_connected(RegionId(0), RegionId(3)));
        assert!(!graph.is_connected(RegionId(1), RegionId(2)));
        assert_symmetric(&graph);
    }

    #[test]
    fn test_negative_wins_when_both_overrides_exist() {
        let mut graph = graph(2);
        graph.add_positive_override(RegionId(0), RegionId(1)).unwrap();
        graph.add_negative_override(RegionId(0), RegionId(1)).unwrap();
        graph.reconcile();
        assert!(!graph.is_connected(RegionId(0), RegionId(1)));
    }

    #[test]
    fn test_reconcile_prunes_stale_references() {
        let mut graph = graph(2);
        graph.regions[0].connected.push(RegionId(7));
        graph.regions[0].positive_overrides.push(RegionId(9));
        graph.regions[1].negative_overrides.push(RegionId(4));
        graph.reconcile();

        assert!(graph.get(RegionId(0)).unwrap().connected_regions().is_empty());
        assert!(graph.get(RegionId(0)).unwrap().positive_overrides().is_empty());
        assert!(graph.get(RegionId(1)).unwrap().negative_overrides().is_empty());
    }

    #[test]
    fn test_remove_overrides() {
        let mut graph = graph(2);
        graph.add_positive_override(RegionId(0), RegionId(1)).unwrap();
        graph.remove_positive_override(RegionId(1), RegionId(0)).unwrap();
        assert_eq!(graph.relation(RegionId(0), RegionId(1)).unwrap(), RegionRelation::Connected);

        graph.clear_connections();
        graph.reconcile();
        assert_eq!(
            graph.relation(RegionId(0), RegionId(1)).unwrap(),
            RegionRelation::Disconnected
        );

        graph.add_negative_override(RegionId(0), RegionId(1)).unwrap();
        graph.remove_negative_override(RegionId(0), RegionId(1)).unwrap();
        assert!(graph.get(RegionId(1)).unwrap().negative_overrides().is_empty());
    }
}
