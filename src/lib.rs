pub mod config;
pub mod diagnostics;
pub mod logging;
pub mod overlay;
pub mod protocol;
pub mod source;
pub mod stack;
pub mod transport;
use miette::Diagnostic;

pub use overlay::aggregator::ErrorAggregator;
pub use source::fetcher::SourceFetcher;
pub use stack::resolver::StackResolver;
pub use transport::bridge::OverlayBridge;

/// Result type alias for the overlay pipeline
pub type Result<T> = miette::Result<T>;

/// Error types for the overlay pipeline
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum OverlayError {
    #[error("Failed to fetch source: {0}")]
    #[diagnostic(
        code(overlay::source_fetch_failed),
        help("Check that the dev server is running and the file path is reachable through /__get-internal-source.")
    )]
    SourceFetch(String),

    #[error("Invalid source map data: {0}")]
    #[diagnostic(
        code(overlay::source_map_data),
        help("The sourceMappingURL directive points at a data: URI that is not a base64-encoded JSON source map. This usually indicates a broken loader or build plugin.")
    )]
    SourceMapData(String),

    #[error("Failed to parse source map: {0}")]
    #[diagnostic(
        code(overlay::source_map_parse),
        help("The referenced source map is not valid source map v3 JSON. Rebuild with `devtool: \"source-map\"` or an equivalent setting.")
    )]
    SourceMapParse(String),

    #[error("Event transport error: {0}")]
    #[diagnostic(
        code(overlay::transport_error),
        help("The hot-update event stream could not be reached. The client reconnects automatically; check the dev server logs if this persists.")
    )]
    Transport(String),

    #[error("Overlay surface not mounted: {0}")]
    #[diagnostic(
        code(overlay::surface_missing),
        help("Call OverlayBridge::init before dispatching events, or rely on the pending queue which flushes once the surface signals readiness.")
    )]
    SurfaceMissing(String),

    #[error("File operation failed: {0}")]
    #[diagnostic(
        code(overlay::file_error),
        help("Check if you have necessary permissions and that the path exists.")
    )]
    FileError(String),
}
