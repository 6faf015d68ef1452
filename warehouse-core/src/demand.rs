// Demand from buildings outside the warehouse system (workshops, granaries)

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::types::{Resource, RoadNetworkId, Workshop};

/// How badly granaries on a network want a food
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum GranaryNeed {
    None,
    /// Some granary would accept it
    Accepting,
    /// Some granary is set to get it
    Getting,
}

/// What the worker task selector asks of the rest of the city
pub trait SupplyDemand {
    /// A workshop of this kind on the network has room for its raw material
    fn workshop_has_room(&self, workshop: Workshop, road_network: RoadNetworkId) -> bool;

    fn granary_need(&self, food: Resource, road_network: RoadNetworkId) -> GranaryNeed;
}

/// Fixed demand table, set by the host each tick
#[derive(Debug, Clone, Default)]
pub struct StaticDemand {
    workshops: HashSet<(Workshop, RoadNetworkId)>,
    granaries: HashMap<(Resource, RoadNetworkId), GranaryNeed>,
}

impl StaticDemand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workshop(mut self, workshop: Workshop, road_network: RoadNetworkId) -> Self {
        self.set_workshop_room(workshop, road_network, true);
        self
    }

    pub fn with_granary(mut self, food: Resource, road_network: RoadNetworkId, need: GranaryNeed) -> Self {
        self.set_granary_need(food, road_network, need);
        self
    }

    pub fn set_workshop_room(&mut self, workshop: Workshop, road_network: RoadNetworkId, has_room: bool) {
        if has_room {
            self.workshops.insert((workshop, road_network));
        } else {
            self.workshops.remove(&(workshop, road_network));
        }
    }

    pub fn set_granary_need(&mut self, food: Resource, road_network: RoadNetworkId, need: GranaryNeed) {
        if need == GranaryNeed::None {
            self.granaries.remove(&(food, road_network));
        } else {
            self.granaries.insert((food, road_network), need);
        }
    }

    pub fn clear(&mut self) {
        self.workshops.clear();
        self.granaries.clear();
    }
}

impl SupplyDemand for StaticDemand {
    fn workshop_has_room(&self, workshop: Workshop, road_network: RoadNetworkId) -> bool {
        self.workshops.contains(&(workshop, road_network))
    }

    fn granary_need(&self, food: Resource, road_network: RoadNetworkId) -> GranaryNeed {
        self.granaries
            .get(&(food, road_network))
            .copied()
            .unwrap_or(GranaryNeed::None)
    }
}
