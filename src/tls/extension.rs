use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionType {
    ServerNameIndication,
    SupportedGroups,
    EcPointFormats,
    SignatureAndHashAlgorithms,
    SessionTicket,
    ExtendedMasterSecret,
    RenegotiationInfo,
    KeyShare,
    SupportedVersions,
    PskKeyExchangeModes,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PskKeyExchangeMode {
    PskKe,
    PskDheKe,
}
