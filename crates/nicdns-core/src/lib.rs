// # nicdns-core
//
// Protocol core of the nic.ru dns-master client.
//
// ## Architecture Overview
//
// This library holds everything that does not perform I/O on its own:
// - **xml**: minimal element tree on top of `quick-xml`
// - **records**: typed DNS records and their XML codec
// - **envelope**: response parsing (status, errors, data) and request framing
// - **models**: service and zone descriptors
// - **token**: OAuth2 token, persistence callback and ready-made stores
// - **traits**: the `Transport` seam implemented by the HTTP client
// - **config**: client configuration
//
// The `nicdns-client` crate combines these with an HTTP transport, the
// token manager and the API operations.

pub mod config;
pub mod envelope;
pub mod error;
pub mod models;
pub mod records;
pub mod token;
pub mod traits;
pub mod xml;

// Re-export core types for convenience
pub use config::ClientConfig;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use models::{NicService, NicZone};
pub use records::{DnsRecord, HostName, Mx, RecordData, RecordId, RecordType, Soa, Srv};
pub use token::{FileTokenStore, MemoryTokenStore, Token, TokenUpdater};
pub use traits::{ApiRequest, ApiResponse, Method, RequestBody, Transport};
pub use xml::Element;
