//! Error types for shortcut operations

use thiserror::Error;

/// Errors that can occur while parsing key combinations or preset documents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty key combination")]
    EmptyCombo,

    #[error("No key specified in combination: {0}")]
    MissingKey(String),

    #[error("Multiple keys specified in combination: {0}")]
    MultipleKeys(String),

    #[error("Empty step in key sequence: {0}")]
    EmptyStep(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown context: {0}")]
    UnknownContext(String),

    #[error("Invalid JSON syntax: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML syntax: {0}")]
    InvalidYaml(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown document format: {0}")]
    UnknownFormat(String),

    #[error("Parse error in entry {entry}: {message}")]
    EntryError { entry: usize, message: String },
}

/// Errors that can occur in the shortcut registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Shortcut ID cannot be empty")]
    EmptyId,
}

/// Errors that can occur while building or loading presets
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Invalid preset name: {0}")]
    InvalidPresetName(String),

    #[error("Duplicate shortcut id {id} in preset {preset}")]
    DuplicateShortcutId { preset: String, id: String },

    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur while loading manager configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JSON configuration: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML configuration: {0}")]
    InvalidYaml(String),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Chord timeout must be greater than zero")]
    ZeroChordTimeout,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur in the shortcut manager
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Registry error: {0}")]
    RegistryError(#[from] RegistryError),

    #[error("Preset error: {0}")]
    PresetError(#[from] PresetError),

    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}
