//! Error handling for the Hue exporter crate.

/// A specialized `Result` type for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// The main error type for exporter operations.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bridge could not be reached or returned an unusable response
    #[error("bridge error: {0}")]
    Bridge(String),

    /// A value field's dynamic type cannot be coerced to a number.
    ///
    /// This aborts the whole poll: a non-numeric value field means the
    /// metric schema and the bridge data disagree, and emitting partial
    /// samples would hide that.
    #[error("unsupported value type for field '{field}' ({value_type}) in record {record}")]
    UnsupportedValueType {
        /// The schema's value field name
        field: String,
        /// The observed dynamic type of the field
        value_type: &'static str,
        /// The offending record, rendered for diagnostics
        record: String,
    },

    /// Metric schema loading or validation failed
    #[error("schema error: {0}")]
    Schema(String),

    /// Web server error
    #[error("web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl ExporterError {
    /// Create a new bridge error
    pub fn bridge_error(msg: impl Into<String>) -> Self {
        Self::Bridge(msg.into())
    }

    /// Create a new schema error
    pub fn schema_error(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
