// Building registry: warehouse arena plus the per-type traversal list

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::types::{BuildingId, TilePoint};
use crate::warehouse::Warehouse;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingRegistry {
    warehouses: SlotMap<BuildingId, Warehouse>,
    /// Warehouses in construction order; the order every search walks
    order: Vec<BuildingId>,
}

impl BuildingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a warehouse record, returns its ID
    pub fn insert_warehouse(&mut self, position: TilePoint) -> BuildingId {
        let id = self
            .warehouses
            .insert_with_key(|id| Warehouse::new(id, position));
        self.order.push(id);
        id
    }

    /// Drop a warehouse record entirely
    pub fn remove(&mut self, id: BuildingId) -> Option<Warehouse> {
        self.order.retain(|other| *other != id);
        self.warehouses.remove(id)
    }

    pub fn get(&self, id: BuildingId) -> Option<&Warehouse> {
        self.warehouses.get(id)
    }

    pub fn get_mut(&mut self, id: BuildingId) -> Option<&mut Warehouse> {
        self.warehouses.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[BuildingId] {
        &self.order
    }

    /// All warehouses in traversal order
    pub fn iter(&self) -> impl Iterator<Item = &Warehouse> {
        self.order.iter().filter_map(|id| self.warehouses.get(*id))
    }

    pub fn first_of_type(&self) -> Option<BuildingId> {
        self.order.first().copied()
    }

    pub fn next_of_type(&self, id: BuildingId) -> Option<BuildingId> {
        let pos = self.order.iter().position(|other| *other == id)?;
        self.order.get(pos + 1).copied()
    }

    /// Every warehouse once, starting just after `cursor` and wrapping.
    /// Starts at the first warehouse when the cursor is unset or stale.
    pub fn ring_after(&self, cursor: Option<BuildingId>) -> Vec<BuildingId> {
        let start = cursor
            .and_then(|c| self.order.iter().position(|id| *id == c))
            .map_or(0, |pos| pos + 1);
        let n = self.order.len();
        (0..n).map(|i| self.order[(start + i) % n]).collect()
    }
}
