use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    StorageUnavailable,
    MalformedData,
    NoBackupFound,
    CorruptBackup,
    NoDataToExport,
    InvalidStatus,
    TaskNotFound,
    ValidationError,
    ConfigError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::MalformedData => "MALFORMED_DATA",
            Self::NoBackupFound => "NO_BACKUP_FOUND",
            Self::CorruptBackup => "CORRUPT_BACKUP",
            Self::NoDataToExport => "NO_DATA_TO_EXPORT",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskboardError {
    pub code: ErrorCode,
    pub message: String,
}

impl TaskboardError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageUnavailable, message)
    }

    pub fn quota_exceeded(key: &str, needed: usize, quota: usize) -> Self {
        Self::new(
            ErrorCode::StorageUnavailable,
            format!("Storage quota exceeded writing '{key}': {needed} bytes needed, {quota} available"),
        )
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedData, message)
    }

    pub fn invalid_format() -> Self {
        Self::malformed("Invalid file format")
    }

    pub fn no_backup_found() -> Self {
        Self::new(ErrorCode::NoBackupFound, "No backups found")
    }

    pub fn corrupt_backup(key: &str) -> Self {
        Self::new(
            ErrorCode::CorruptBackup,
            format!("Backup data is corrupted: {key}"),
        )
    }

    pub fn no_data_to_export() -> Self {
        Self::new(ErrorCode::NoDataToExport, "No data found to export")
    }

    pub fn invalid_status(value: &str) -> Self {
        Self::new(
            ErrorCode::InvalidStatus,
            format!("Invalid status '{value}'. Expected one of: To Do, In Progress, Done, Archived"),
        )
    }

    pub fn task_not_found(id: &str) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl From<rusqlite::Error> for TaskboardError {
    fn from(e: rusqlite::Error) -> Self {
        Self::storage(e.to_string())
    }
}

impl From<serde_json::Error> for TaskboardError {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(e.to_string())
    }
}
