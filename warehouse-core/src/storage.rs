// Per-warehouse storage orders set by the player

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tsify_next::Tsify;

use crate::types::{BuildingId, Resource, TraderKind};

/// What a warehouse does with one resource.
///
/// Order matters: anything below `Getting` is willing to hand goods out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum StorageState {
    NotAccepting,
    Accepting,
    Getting,
    Maintaining,
}

impl StorageState {
    /// Other warehouses may take this resource away
    pub fn permits_getting(self) -> bool {
        self < StorageState::Getting
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSetting {
    pub state: StorageState,
    /// Stop accepting once this many loads are stored
    pub quantity_target: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum StoragePermission {
    Traders,
    Dock,
    Workers,
    Natives,
}

impl From<TraderKind> for StoragePermission {
    fn from(kind: TraderKind) -> Self {
        match kind {
            TraderKind::Sea => StoragePermission::Dock,
            TraderKind::Land => StoragePermission::Traders,
            TraderKind::Native => StoragePermission::Natives,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePermissions {
    pub traders: bool,
    pub dock: bool,
    pub workers: bool,
    pub natives: bool,
}

impl Default for StoragePermissions {
    fn default() -> Self {
        Self {
            traders: true,
            dock: true,
            workers: true,
            natives: true,
        }
    }
}

impl StoragePermissions {
    pub fn allows(&self, permission: StoragePermission) -> bool {
        match permission {
            StoragePermission::Traders => self.traders,
            StoragePermission::Dock => self.dock,
            StoragePermission::Workers => self.workers,
            StoragePermission::Natives => self.natives,
        }
    }

    pub fn set(&mut self, permission: StoragePermission, allowed: bool) {
        match permission {
            StoragePermission::Traders => self.traders = allowed,
            StoragePermission::Dock => self.dock = allowed,
            StoragePermission::Workers => self.workers = allowed,
            StoragePermission::Natives => self.natives = allowed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePolicy {
    pub settings: [ResourceSetting; Resource::COUNT],
    pub permissions: StoragePermissions,
    pub empty_all: bool,
}

impl StoragePolicy {
    /// Accept everything up to `quantity_target` loads per resource
    pub fn accepting_all(quantity_target: u32) -> Self {
        Self {
            settings: [ResourceSetting {
                state: StorageState::Accepting,
                quantity_target,
            }; Resource::COUNT],
            permissions: StoragePermissions::default(),
            empty_all: false,
        }
    }

    pub fn setting(&self, resource: Resource) -> ResourceSetting {
        self.settings[resource.index()]
    }

    pub fn set_state(&mut self, resource: Resource, state: StorageState) {
        self.settings[resource.index()].state = state;
    }

    pub fn set_quantity_target(&mut self, resource: Resource, quantity_target: u32) {
        self.settings[resource.index()].quantity_target = quantity_target;
    }
}

/// Storage policies keyed by warehouse
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoragePolicyTable {
    policies: SecondaryMap<BuildingId, StoragePolicy>,
}

impl StoragePolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, building: BuildingId, policy: StoragePolicy) {
        self.policies.insert(building, policy);
    }

    pub fn remove(&mut self, building: BuildingId) -> Option<StoragePolicy> {
        self.policies.remove(building)
    }

    pub fn get(&self, building: BuildingId) -> Option<&StoragePolicy> {
        self.policies.get(building)
    }

    pub fn get_mut(&mut self, building: BuildingId) -> Option<&mut StoragePolicy> {
        self.policies.get_mut(building)
    }

    /// State for a resource. Without `respect_maintain`, maintaining reads as
    /// getting. Buildings without a policy accept nothing.
    pub fn get_state(
        &self,
        building: BuildingId,
        resource: Resource,
        respect_maintain: bool,
    ) -> StorageState {
        let Some(policy) = self.policies.get(building) else {
            return StorageState::NotAccepting;
        };
        match policy.setting(resource).state {
            StorageState::Maintaining if !respect_maintain => StorageState::Getting,
            state => state,
        }
    }

    pub fn quantity_target(&self, building: BuildingId, resource: Resource) -> u32 {
        self.policies
            .get(building)
            .map_or(0, |p| p.setting(resource).quantity_target)
    }

    pub fn get_permission(&self, permission: StoragePermission, building: BuildingId) -> bool {
        self.policies
            .get(building)
            .is_some_and(|p| p.permissions.allows(permission))
    }

    pub fn get_empty_all(&self, building: BuildingId) -> bool {
        self.policies.get(building).is_some_and(|p| p.empty_all)
    }
}
