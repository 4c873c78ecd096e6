//! Regions, their connectivity graph and the managers that own them

mod graph;
mod managed;
mod manager;
mod region;

pub use graph::{RegionGraph, RegionRelation};
pub use managed::{LightSource, ManagedKind, ManagedObject, ManagedObjectDesc, ObjectId};
pub use manager::{ActiveSetChange, ManagerBounds, ObjectGather, RegionManager};
pub use region::{Region, RegionBox, RegionDesc, RegionId, SceneHandle};

/// Region configuration errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    /// Id does not name a region of the manager
    #[error("Region ID {id} is out of bounds ({count} regions)")]
    InvalidRegion {
        /// Requested id
        id: RegionId,
        /// Number of regions in the manager
        count: usize,
    },

    /// A region's corners are not all inside the manager
    #[error("Region '{name}' is outside its manager's bounds")]
    OutOfBounds {
        /// Region name
        name: String,
    },

    /// A light has no light data attached
    #[error("There is no light data on '{name}'")]
    MissingLightData {
        /// Light name
        name: String,
    },
}
