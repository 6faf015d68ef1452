//! Reasons a logistics operation turned into a no-op.

use std::fmt;

use crate::types::{BuildingId, KeyToU64, Resource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogisticsError {
    /// Zero quantity requested
    InvalidQuantity,
    /// Resource can never sit in a bay (denarii, troops)
    UnstorableResource(Resource),
    UnknownWarehouse(BuildingId),
    NotInUse(BuildingId),
    /// Plague quarantine blocks the operation
    Quarantined(BuildingId),
    /// Policy is liquidating the whole warehouse
    EmptyingAll(BuildingId),
    NotAccepting {
        warehouse: BuildingId,
        resource: Resource,
    },
    NoCapacity {
        warehouse: BuildingId,
        resource: Resource,
    },
    /// Fewer loads stored than an all-or-nothing removal asked for
    InsufficientStock {
        warehouse: BuildingId,
        resource: Resource,
        stored: u32,
    },
    /// The warehouse does not own a full set of bays
    MalformedBays(BuildingId),
    Config(String),
}

impl fmt::Display for LogisticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogisticsError::InvalidQuantity => write!(f, "quantity must be positive"),
            LogisticsError::UnstorableResource(r) => {
                write!(f, "{} cannot be stored in a warehouse", r.name())
            }
            LogisticsError::UnknownWarehouse(id) => {
                write!(f, "no warehouse with id {}", id.to_u64())
            }
            LogisticsError::NotInUse(id) => write!(f, "warehouse {} is not in use", id.to_u64()),
            LogisticsError::Quarantined(id) => {
                write!(f, "warehouse {} is quarantined", id.to_u64())
            }
            LogisticsError::EmptyingAll(id) => {
                write!(f, "warehouse {} is emptying all goods", id.to_u64())
            }
            LogisticsError::NotAccepting {
                warehouse,
                resource,
            } => write!(
                f,
                "warehouse {} does not accept {}",
                warehouse.to_u64(),
                resource.name()
            ),
            LogisticsError::NoCapacity {
                warehouse,
                resource,
            } => write!(
                f,
                "warehouse {} has no room for {}",
                warehouse.to_u64(),
                resource.name()
            ),
            LogisticsError::InsufficientStock {
                warehouse,
                resource,
                stored,
            } => write!(
                f,
                "warehouse {} holds only {} loads of {}",
                warehouse.to_u64(),
                stored,
                resource.name()
            ),
            LogisticsError::MalformedBays(id) => {
                write!(f, "warehouse {} has a broken bay set", id.to_u64())
            }
            LogisticsError::Config(msg) => write!(f, "invalid logistics config: {msg}"),
        }
    }
}

impl std::error::Error for LogisticsError {}

pub type LogisticsResult<T> = Result<T, LogisticsError>;
