//! The four generation targets: which entity, which column group.

use crate::error::CoreError;
use crate::generation::{GenerationKind, OwnerEntityType};
use crate::types::DbId;

/// One generatable slot on an owner entity.
///
/// A shot carries two independent slots (still image, video); scenes and
/// characters carry one each. Dispatch on this enum is always exhaustive,
/// so adding a target forces every store and precondition check to handle
/// it at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationTarget {
    /// A shot's still image.
    ShotImage(DbId),
    /// A shot's video, animated from its completed image.
    ShotVideo(DbId),
    /// A character's portrait image.
    CharacterPortrait(DbId),
    /// A scene's generated prose description.
    SceneDescription(DbId),
}

impl GenerationTarget {
    /// Reconstruct a target from the strings persisted on a job row.
    /// Rejects combinations no trigger can produce (e.g. a scene video).
    pub fn from_parts(
        entity_type: OwnerEntityType,
        kind: GenerationKind,
        entity_id: DbId,
    ) -> Result<Self, CoreError> {
        match (entity_type, kind) {
            (OwnerEntityType::Shot, GenerationKind::Image) => {
                Ok(GenerationTarget::ShotImage(entity_id))
            }
            (OwnerEntityType::Shot, GenerationKind::Video) => {
                Ok(GenerationTarget::ShotVideo(entity_id))
            }
            (OwnerEntityType::Character, GenerationKind::Image) => {
                Ok(GenerationTarget::CharacterPortrait(entity_id))
            }
            (OwnerEntityType::Scene, GenerationKind::Text) => {
                Ok(GenerationTarget::SceneDescription(entity_id))
            }
            (entity_type, kind) => Err(CoreError::Validation(format!(
                "No {} generation exists for entity type '{}'",
                kind.as_str(),
                entity_type.as_str(),
            ))),
        }
    }

    /// The kind of asset this target produces.
    pub fn kind(self) -> GenerationKind {
        match self {
            GenerationTarget::ShotImage(_) | GenerationTarget::CharacterPortrait(_) => {
                GenerationKind::Image
            }
            GenerationTarget::ShotVideo(_) => GenerationKind::Video,
            GenerationTarget::SceneDescription(_) => GenerationKind::Text,
        }
    }

    /// The owning entity's type, as stored on the job row and used as the
    /// change-feed entity type.
    pub fn entity_type(self) -> OwnerEntityType {
        match self {
            GenerationTarget::ShotImage(_) | GenerationTarget::ShotVideo(_) => {
                OwnerEntityType::Shot
            }
            GenerationTarget::CharacterPortrait(_) => OwnerEntityType::Character,
            GenerationTarget::SceneDescription(_) => OwnerEntityType::Scene,
        }
    }

    /// The owning entity's row id.
    pub fn entity_id(self) -> DbId {
        match self {
            GenerationTarget::ShotImage(id)
            | GenerationTarget::ShotVideo(id)
            | GenerationTarget::CharacterPortrait(id)
            | GenerationTarget::SceneDescription(id) => id,
        }
    }
}
