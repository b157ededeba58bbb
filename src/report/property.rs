use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key of a single verdict in the report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Property {
    #[serde(rename = "SUPPORTS_TLS_1_0")]
    SupportsTls10,
    #[serde(rename = "SUPPORTS_TLS_1_1")]
    SupportsTls11,
    #[serde(rename = "SUPPORTS_TLS_1_2")]
    SupportsTls12,
    #[serde(rename = "SUPPORTS_TLS_1_3")]
    SupportsTls13,
    SupportsEcdh,
    SupportsStaticEcdh,
    SupportsUncompressedPoint,
    SupportsAnsix962CompressedPrime,
    SupportsSecpCompressionTls13,
    SupportsClientSideSecureRenegotiation,
    SupportsClientSideInsecureRenegotiation,
    SupportsTls13SessionTickets,
    SupportsTls13PskDhe,
    SupportsHttps,
    RequiresSni,
    SupportsHttpFalseStart,
    VulnerableToInvalidCurve,
    VulnerableToInvalidCurveEphemeral,
    VulnerableToInvalidCurveTwist,
    InvalidCurveKeyReuse,
    InvalidCurveFinishedKeyReuse,
    ChecksMacAppdata,
    ChecksMacFinished,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The serialized name is the stable key; reuse it for display.
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(name)) => write!(f, "{}", name),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_stable_key() {
        assert_eq!(Property::SupportsTls13.to_string(), "SUPPORTS_TLS_1_3");
        assert_eq!(
            Property::VulnerableToInvalidCurveTwist.to_string(),
            "VULNERABLE_TO_INVALID_CURVE_TWIST"
        );
    }
}
