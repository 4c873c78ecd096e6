//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle of a capture tracker registered with the shadow scheduler
    pub struct TrackerKey;

    /// Handle of an observer registered with a region world
    pub struct ObserverKey;
}
