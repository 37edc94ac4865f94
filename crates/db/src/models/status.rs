//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Generation job lifecycle status.
    ///
    /// `Pending` is the initial state before submission; `Submitted` once
    /// the provider accepts the request; `Generating` while the provider
    /// reports work in progress; `Completed` and `Failed` are terminal.
    GenerationStatus {
        Pending = 1,
        Submitted = 2,
        Generating = 3,
        Completed = 4,
        Failed = 5,
    }
}

impl GenerationStatus {
    /// Whether this status is terminal (completed or failed).
    pub fn is_terminal(self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }

    /// Map a raw status id back to the enum. Unknown ids are treated as
    /// data corruption and reported as `None`.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(GenerationStatus::Pending),
            2 => Some(GenerationStatus::Submitted),
            3 => Some(GenerationStatus::Generating),
            4 => Some(GenerationStatus::Completed),
            5 => Some(GenerationStatus::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_status_ids_match_seed_data() {
        assert_eq!(GenerationStatus::Pending.id(), 1);
        assert_eq!(GenerationStatus::Submitted.id(), 2);
        assert_eq!(GenerationStatus::Generating.id(), 3);
        assert_eq!(GenerationStatus::Completed.id(), 4);
        assert_eq!(GenerationStatus::Failed.id(), 5);
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!GenerationStatus::Pending.is_terminal());
        assert!(!GenerationStatus::Submitted.is_terminal());
        assert!(!GenerationStatus::Generating.is_terminal());
        assert!(GenerationStatus::Completed.is_terminal());
        assert!(GenerationStatus::Failed.is_terminal());
    }

    #[test]
    fn from_id_round_trips() {
        for status in [
            GenerationStatus::Pending,
            GenerationStatus::Submitted,
            GenerationStatus::Generating,
            GenerationStatus::Completed,
            GenerationStatus::Failed,
        ] {
            assert_eq!(GenerationStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(GenerationStatus::from_id(99), None);
    }
}
