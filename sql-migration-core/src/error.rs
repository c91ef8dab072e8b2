use thiserror::Error;

pub type CoreResult<T> = Result<T, MigrationError>;

/// The error surface shared by the migration core and its host-side
/// collaborators.
///
/// The differ itself never fails; unsupported combinations surface from the
/// pre-processor or the SQL generator at the moment the offending operation
/// is encountered. The change-tracker variants are constructed by the host,
/// not by this crate, but belong to the same taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// The dialect cannot express the operation.
    #[error("The '{dialect}' dialect does not support the '{operation}' operation.")]
    OperationNotSupported {
        dialect: &'static str,
        operation: &'static str,
    },

    /// A pre-processor invariant was violated. Fatal; the caller must abort
    /// the migration and roll back any open transaction.
    #[error("Invalid operation sequence: {message}")]
    InvalidOperationSequence { message: String },

    /// An identity-map lookup found more than one principal matching a
    /// foreign-key relation.
    #[error("Multiple principal entities match the foreign key relation on '{entity}'.")]
    AmbiguousPrincipal { entity: String },

    /// An entity was attached without a primary-key value.
    #[error("The primary key value of entity '{entity}' is null.")]
    NullPrimaryKey { entity: String },

    /// Two attached instances share one identity.
    #[error("Another instance of '{entity}' with the same key value is already being tracked.")]
    IdentityConflict { entity: String },

    /// One instance has several state entries.
    #[error("Multiple state entries exist for entity '{entity}'.")]
    MultipleStateEntries { entity: String },
}

impl MigrationError {
    pub(crate) fn invalid_sequence(message: impl Into<String>) -> Self {
        MigrationError::InvalidOperationSequence {
            message: message.into(),
        }
    }
}
