//! Objects and lights whose visibility follows their region

use serde::{Deserialize, Serialize};

use super::{RegionError, RegionId, SceneHandle};
use crate::foundation::math::{Transform, Vec3};
use crate::influence::InfluenceMesh;
use crate::physics::ColliderId;

/// Index of a managed object inside its manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub usize);

/// Light data the influence pipeline needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    /// Distance beyond which the light has no effect
    pub range: f32,
}

/// What a managed entity is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ManagedKind {
    /// Plain scene object
    Object,
    /// Light; `None` when the host supplied no light data
    Light(Option<LightSource>),
}

/// Host-side description of a managed entity handed to a gather
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedObjectDesc {
    /// Stable handle of the entity
    pub handle: SceneHandle,
    /// Display name used in log messages
    #[serde(default)]
    pub name: String,
    /// Entity placement
    #[serde(default)]
    pub transform: Transform,
    /// Offset from the transform origin, in the entity's rotated frame
    #[serde(default = "Vec3::zeros")]
    pub center_offset: Vec3,
    /// Object or light
    pub kind: ManagedKind,
}

/// An entity bound to one region
#[derive(Debug, Clone)]
pub struct ManagedObject {
    id: ObjectId,
    handle: SceneHandle,
    name: String,
    transform: Transform,
    center_offset: Vec3,
    kind: ManagedKind,
    region: RegionId,

    pub(crate) active: bool,
    pub(crate) influence: Option<InfluenceMesh>,
    pub(crate) collider: Option<ColliderId>,
}

impl ManagedObject {
    pub(crate) fn new(id: ObjectId, desc: &ManagedObjectDesc, region: RegionId) -> Self {
        Self {
            id,
            handle: desc.handle,
            name: desc.name.clone(),
            transform: desc.transform,
            center_offset: desc.center_offset,
            kind: desc.kind,
            region,
            active: true,
            influence: None,
            collider: None,
        }
    }

    /// Index inside the manager
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Host handle
    pub fn handle(&self) -> SceneHandle {
        self.handle
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity placement
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Object or light
    pub fn kind(&self) -> ManagedKind {
        self.kind
    }

    /// Whether this entity is a light
    pub fn is_light(&self) -> bool {
        matches!(self.kind, ManagedKind::Light(_))
    }

    /// Light data, or [`RegionError::MissingLightData`] for lights without it
    pub fn light_source(&self) -> Result<LightSource, RegionError> {
        match self.kind {
            ManagedKind::Light(Some(source)) => Ok(source),
            _ => Err(RegionError::MissingLightData {
                name: self.name.clone(),
            }),
        }
    }

    /// Region the entity was bound to
    pub fn region(&self) -> RegionId {
        self.region
    }

    /// Mirrors the owning region's active flag
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// World-space point used for region binding and tracing
    ///
    /// The offset is rotated with the entity but not scaled.
    pub fn offset_point(&self) -> Vec3 {
        self.transform.transform_direction(self.center_offset) + self.transform.position
    }

    /// Baked influence mesh, lights only
    pub fn influence_mesh(&self) -> Option<&InfluenceMesh> {
        self.influence.as_ref()
    }

    /// Collider installed for the influence mesh
    pub fn influence_collider(&self) -> Option<ColliderId> {
        self.collider
    }
}
