use thiserror::Error;

/// Failure to obtain rows or a cell from a tabular source.
///
/// Trip sheets and overview cells that fail fall back to zero-valued
/// defaults; a failure on the metrics sheet is returned to the caller.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("sheet '{sheet}' in workbook '{workbook}' not found")]
    SheetNotFound { workbook: String, sheet: String },

    #[error("sheet '{sheet}' in workbook '{workbook}' returned no rows")]
    Empty { workbook: String, sheet: String },

    #[error("invalid cell reference '{0}'")]
    InvalidCell(String),

    #[error("fetch of '{sheet}' timed out after {millis} ms")]
    Timeout { sheet: String, millis: u64 },

    #[error("fetch worker for '{sheet}' exited without a result")]
    WorkerLost { sheet: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid cell reference '{0}' in config")]
    Cell(String),
}

pub type FetchResult<T> = Result<T, FetchError>;
