//! Namespace URIs, prefixes and algorithm identifiers used in the request.
//!
//! Everything the envelope builder writes as a URI comes from one
//! [`NamespaceTable`], so a protocol revision touches a single value.

/// Read-only table of the URIs in a registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceTable {
    /// SOAP 1.1 envelope namespace (`soap`, `SOAP-ENV`).
    pub soap: &'static str,
    /// WS-Security extension namespace (`wsse`).
    pub wsse: &'static str,
    /// WS-Security utility namespace (`wsu`).
    pub wsu: &'static str,
    /// XML Signature namespace (`ds`).
    pub ds: &'static str,
    /// Exclusive canonicalization namespace (`ec`) and algorithm URI.
    pub exc_c14n: &'static str,
    /// Receipt schema namespace (default namespace of `Trzba`).
    pub eet: &'static str,
    /// `SignatureMethod` algorithm.
    pub rsa_sha256: &'static str,
    /// `DigestMethod` algorithm.
    pub sha256: &'static str,
    /// `EncodingType` of the binary security token.
    pub base64_binary: &'static str,
    /// `ValueType` of the binary security token and its reference.
    pub x509_v3: &'static str,
}

impl NamespaceTable {
    /// Version 3 of the registration schema.
    pub const EET_V3: NamespaceTable = NamespaceTable {
        soap: "http://schemas.xmlsoap.org/soap/envelope/",
        wsse: "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd",
        wsu: "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd",
        ds: "http://www.w3.org/2000/09/xmldsig#",
        exc_c14n: "http://www.w3.org/2001/10/xml-exc-c14n#",
        eet: "http://fs.mfcr.cz/eet/schema/v3",
        rsa_sha256: "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
        sha256: "http://www.w3.org/2001/04/xmlenc#sha256",
        base64_binary: "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary",
        x509_v3: "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-x509-token-profile-1.0#X509v3",
    };
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::EET_V3
    }
}
