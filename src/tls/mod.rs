//! Static TLS vocabulary: versions, groups, cipher suites and point encodings,
//! each carrying the metadata the probes need instead of name matching.

mod extension;
mod group;
mod point;
mod signature;
mod suite;
mod version;

pub use extension::{ExtensionType, PskKeyExchangeMode};
pub use group::{AttackPoint, NamedGroup};
pub use point::{EcPoint, PointFormat};
pub use signature::SignatureScheme;
pub use suite::{BulkMode, CipherSuite, HashAlgorithm, KeyExchange, SignatureFamily};
pub use version::ProtocolVersion;
