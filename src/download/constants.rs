//! Constants for the download module (buffering, retrieval protocol).

/// Write buffer size for streamed file bodies (64 KiB).
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Request header carrying the JSON list of every file of the run.
pub const PRESTAGE_HEADER: &str = "prestagefilelist";

/// Path of the NGAS retrieval endpoint.
pub const RETRIEVE_PATH: &str = "RETRIEVE";

/// Default NGAS retrieval host.
pub const DEFAULT_NGAS_HOST: &str = "fe4.pawsey.org.au:7790";

/// Maximum number of response body bytes kept in an HTTP error message.
pub const MAX_ERROR_BODY_CHARS: usize = 512;
