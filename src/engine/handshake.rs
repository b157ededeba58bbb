//! Boundary to the handshake engine that builds, sends and parses TLS
//! messages. Probes describe an exchange as an [`ExchangePlan`]; the engine
//! reports back what the peer sent as an [`Execution`].

use crate::oracle::{MessageKind, ResponseFingerprint};
use crate::tls::{
    CipherSuite, EcPoint, ExtensionType, NamedGroup, PointFormat, ProtocolVersion,
    PskKeyExchangeMode, SignatureScheme,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Message flow to run on one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Workflow {
    /// ClientHello up to the first server flight.
    Hello,
    /// Full handshake up to the server Finished.
    Handshake,
    /// Handshake followed by one application-data exchange.
    Full,
    /// Client Finished and an HTTP request sent before the server Finished.
    FalseStart,
    /// Handshake whose key share carries a low-order attack point.
    CraftedKeyShare(CraftedKeyShare),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftedKeyShare {
    pub group: NamedGroup,
    /// Point on the quadratic twist rather than off the curve.
    pub twist: bool,
    pub format: PointFormat,
    pub point_order: u32,
    /// Send the crafted share in a renegotiation (or resumption for TLS 1.3)
    /// instead of the initial handshake.
    pub in_renegotiation: bool,
}

/// Record whose MAC gets one byte flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TamperedRecord {
    ApplicationData,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacTamper {
    pub record: TamperedRecord,
    pub offset: usize,
    pub mask: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolOptions {
    pub version: ProtocolVersion,
    pub cipher_suites: Vec<CipherSuite>,
    pub groups: Vec<NamedGroup>,
    pub point_formats: Vec<PointFormat>,
    pub extensions: Vec<ExtensionType>,
    pub psk_modes: Vec<PskKeyExchangeMode>,
    pub signature_schemes: Vec<SignatureScheme>,
    pub server_name: Option<String>,
    pub application_data: Option<Vec<u8>>,
}

impl ProtocolOptions {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            cipher_suites: Vec::new(),
            groups: Vec::new(),
            point_formats: vec![PointFormat::Uncompressed],
            extensions: Vec::new(),
            psk_modes: Vec::new(),
            signature_schemes: Vec::new(),
            server_name: None,
            application_data: None,
        }
    }

    pub fn with_extension(mut self, extension: ExtensionType) -> Self {
        if !self.extensions.contains(&extension) {
            self.extensions.push(extension);
        }
        self
    }

    pub fn has_extension(&self, extension: ExtensionType) -> bool {
        self.extensions.contains(&extension)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangePlan {
    pub options: ProtocolOptions,
    pub workflow: Workflow,
    pub tamper: Option<MacTamper>,
}

impl ExchangePlan {
    pub fn new(options: ProtocolOptions, workflow: Workflow) -> Self {
        Self {
            options,
            workflow,
            tamper: None,
        }
    }

    pub fn with_tamper(mut self, tamper: MacTamper) -> Self {
        self.tamper = Some(tamper);
        self
    }
}

/// What one exchange produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub fingerprint: ResponseFingerprint,
    /// Ephemeral key the peer sent in its key exchange, if any.
    pub peer_public_key: Option<EcPoint>,
    /// The peer proceeded with the crafted key share instead of rejecting it.
    pub crafted_point_negotiated: bool,
}

impl Execution {
    pub fn received(&self, kind: MessageKind) -> bool {
        self.fingerprint.contains(kind)
    }
}

/// One transport connection to the target.
#[async_trait]
pub trait Connection: Send {
    async fn execute(&mut self, plan: &ExchangePlan) -> anyhow::Result<Execution>;

    async fn close(&mut self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait HandshakeEngine: Send + Sync {
    /// Opens a fresh connection; timeouts are enforced by the engine.
    async fn connect(&self) -> anyhow::Result<Box<dyn Connection>>;
}

/// Runs `plan` on its own connection and closes it whatever the outcome.
pub async fn run_scoped(
    engine: &dyn HandshakeEngine,
    plan: &ExchangePlan,
) -> anyhow::Result<Execution> {
    let mut connection = engine.connect().await?;
    let outcome = connection.execute(plan).await;
    if let Err(err) = connection.close().await {
        warn!(error = %err, "could not close connection");
    }
    outcome
}
