use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Element {element:?} has no attribute {attribute:?}")]
    MissingAttribute { element: String, attribute: String },

    #[error("Malformed bus data: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("Invalid LatLng object: ({lat}, {lon})")]
    InvalidLatLng { lat: String, lon: String },

    #[error("Map container {target:?} is already initialized")]
    AlreadyInitialized { target: String },

    #[error("Map view has not been created yet")]
    NoView,

    #[error("No such marker {0}")]
    NoSuchMarker(usize),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read feed {path:?}: {source}")]
    FeedIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse feed {path:?}: {source}")]
    FeedParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid stop name pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to render page: {0}")]
    Template(#[from] askama::Error),

    #[error("Failed to serialize bus data: {0}")]
    Serialize(serde_json::Error),

    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
