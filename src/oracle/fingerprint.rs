use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol message observed from the peer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    ServerHello,
    Certificate,
    ServerKeyExchange,
    CertificateRequest,
    ServerHelloDone,
    EncryptedExtensions,
    NewSessionTicket,
    ChangeCipherSpec,
    Finished,
    Alert { level: u8, description: u8 },
    ApplicationData,
    HttpResponse,
}

impl MessageKind {
    fn class(&self) -> std::mem::Discriminant<MessageKind> {
        std::mem::discriminant(self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecordSummary {
    pub content_type: u8,
    pub length: usize,
}

/// State of the transport after the peer stopped answering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketState {
    #[default]
    Up,
    Closed,
    Reset,
    Timeout,
    DataAvailable,
}

/// Mismatch category between two fingerprints; only `None` means the peer
/// behaved indistinguishably.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EqualityError {
    None,
    MessageCount,
    MessageClass,
    AlertMessageContent,
    RecordCount,
    RecordContentType,
    RecordLength,
    SocketState,
}

impl EqualityError {
    pub fn is_none(self) -> bool {
        matches!(self, EqualityError::None)
    }
}

impl fmt::Display for EqualityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EqualityError::None => "none",
            EqualityError::MessageCount => "message count",
            EqualityError::MessageClass => "message class",
            EqualityError::AlertMessageContent => "alert content",
            EqualityError::RecordCount => "record count",
            EqualityError::RecordContentType => "record content type",
            EqualityError::RecordLength => "record length",
            EqualityError::SocketState => "socket state",
        };
        write!(f, "{}", label)
    }
}

/// What the peer sent back for one execution, reduced to comparable parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseFingerprint {
    pub messages: Vec<MessageKind>,
    pub records: Vec<RecordSummary>,
    pub socket: SocketState,
}

impl ResponseFingerprint {
    pub fn contains(&self, kind: MessageKind) -> bool {
        self.messages.contains(&kind)
    }

    /// First difference found, checked from coarse to fine.
    pub fn compare(&self, other: &ResponseFingerprint) -> EqualityError {
        if self.messages.len() != other.messages.len() {
            return EqualityError::MessageCount;
        }
        let pairs = || self.messages.iter().zip(&other.messages);
        if pairs().any(|(a, b)| a.class() != b.class()) {
            return EqualityError::MessageClass;
        }
        if pairs().any(|(a, b)| a != b) {
            return EqualityError::AlertMessageContent;
        }
        if self.records.len() != other.records.len() {
            return EqualityError::RecordCount;
        }
        let records = || self.records.iter().zip(&other.records);
        if records().any(|(a, b)| a.content_type != b.content_type) {
            return EqualityError::RecordContentType;
        }
        if records().any(|(a, b)| a.length != b.length) {
            return EqualityError::RecordLength;
        }
        if self.socket != other.socket {
            return EqualityError::SocketState;
        }
        EqualityError::None
    }
}
