use thiserror::Error;

#[derive(Error, Debug)]
pub enum MoatError {
    #[error("Not yet configured: {0}")]
    NotConfigured(String),

    #[error("Already configured: {0}")]
    AlreadyConfigured(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("{0} is mandatory.")]
    MissingArgument(String),

    #[error("Incompatible entity.")]
    IncompatibleEntity,

    #[error("Duplicate entry, uid:{0}")]
    DuplicateEntry(String),

    #[error("Size full, remove entries prior to adding a new one. Size:{0}")]
    CapacityExceeded(usize),

    #[error("Missing entry, uid:{0}")]
    MissingEntry(String),

    #[error("{0} is unsupported.")]
    UnsupportedProvider(String),

    #[error("Attribute '{0}' is not declared on model '{1}'")]
    UnknownAttribute(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MoatError>;

impl<T> From<std::sync::PoisonError<T>> for MoatError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_messages_keep_wire_wording() {
        assert_eq!(
            MoatError::DuplicateEntry("voooom!".into()).to_string(),
            "Duplicate entry, uid:voooom!"
        );
        assert_eq!(
            MoatError::CapacityExceeded(3).to_string(),
            "Size full, remove entries prior to adding a new one. Size:3"
        );
        assert_eq!(
            MoatError::MissingEntry("boooom!".into()).to_string(),
            "Missing entry, uid:boooom!"
        );
        assert_eq!(
            MoatError::MissingArgument("entity.uid".into()).to_string(),
            "entity.uid is mandatory."
        );
        assert_eq!(
            MoatError::UnsupportedProvider("redis".into()).to_string(),
            "redis is unsupported."
        );
    }

    #[test]
    fn test_poison_error_maps_to_lock_error() {
        let lock = std::sync::Mutex::new(0);
        let _ = std::panic::catch_unwind(|| {
            let _guard = lock.lock().unwrap();
            panic!("poison");
        });
        let err: MoatError = lock.lock().unwrap_err().into();
        assert!(matches!(err, MoatError::LockError(_)));
    }
}
