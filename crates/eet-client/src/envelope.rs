//! # WS-Security Envelope
//!
//! Builds the signed SOAP 1.1 request for one [`FiscalRecord`].
//!
//! ## Signing Procedure
//!
//! 1. Generate five identifiers: body (`id-`), certificate token
//!    (`X509-`), signature (`SIG-`), key info (`KI-`) and token reference
//!    (`STR-`), each followed by the uppercase hex of a random v4 UUID.
//! 2. Canonicalize `soap:Body` carrying `wsu:Id` and the `Trzba` record.
//! 3. Digest the canonical body with SHA-256.
//! 4. Canonicalize `ds:SignedInfo` referencing the body by id.
//! 5. Sign the canonical SignedInfo with the key store.
//! 6. Assemble the header and envelope, embedding the canonical body and
//!    SignedInfo verbatim.
//!
//! Because steps 3 and 5 operate on the very fragments that step 6 embeds,
//! the digested and signed bytes are the bytes on the wire.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use eet_crypto::{Bkp, KeyStore, Pkp};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::EetError;
use crate::namespace::NamespaceTable;
use crate::record::FiscalRecord;
use crate::xml::{CanonicalXml, Element};

/// XML declaration that prefixes the serialized envelope.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// The five element identifiers of one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeIds {
    /// `wsu:Id` of `soap:Body`.
    pub body: String,
    /// `wsu:Id` of the binary security token.
    pub certificate: String,
    /// `Id` of `ds:Signature`.
    pub signature: String,
    /// `Id` of `ds:KeyInfo`.
    pub key_info: String,
    /// `wsu:Id` of the security token reference.
    pub token_reference: String,
}

impl EnvelopeIds {
    /// Fresh random identifiers.
    pub fn random() -> Self {
        Self {
            body: random_id("id-"),
            certificate: random_id("X509-"),
            signature: random_id("SIG-"),
            key_info: random_id("KI-"),
            token_reference: random_id("STR-"),
        }
    }
}

fn random_id(prefix: &str) -> String {
    format!("{prefix}{}", hex::encode_upper(Uuid::new_v4().as_bytes()))
}

/// A serialized, signed request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    xml: String,
    ids: EnvelopeIds,
    digest: String,
    body: CanonicalXml,
    signed_info: CanonicalXml,
    signature_value: String,
}

impl SignedEnvelope {
    /// The complete document, including the XML declaration.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Owned request bytes for the transport.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.xml.as_bytes().to_vec()
    }

    /// Element identifiers used in this envelope.
    pub fn ids(&self) -> &EnvelopeIds {
        &self.ids
    }

    /// Base64 SHA-256 of the canonical body (`ds:DigestValue`).
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Canonical `soap:Body` that was digested.
    pub fn canonical_body(&self) -> &CanonicalXml {
        &self.body
    }

    /// Canonical `ds:SignedInfo` that was signed.
    pub fn canonical_signed_info(&self) -> &CanonicalXml {
        &self.signed_info
    }

    /// Base64 signature over the canonical SignedInfo.
    pub fn signature_value(&self) -> &str {
        &self.signature_value
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds signed envelopes against a fixed namespace table.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeBuilder {
    ns: NamespaceTable,
}

impl EnvelopeBuilder {
    /// Create a builder for the given namespace table.
    pub fn new(ns: NamespaceTable) -> Self {
        Self { ns }
    }

    /// The namespace table in use.
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.ns
    }

    /// Build and sign an envelope with fresh identifiers.
    ///
    /// # Errors
    ///
    /// - [`EetError::Signing`] if the key store fails to sign SignedInfo.
    /// - [`EetError::Envelope`] if the key store has no certificate.
    pub fn build(
        &self,
        record: &FiscalRecord,
        key_store: &dyn KeyStore,
    ) -> Result<SignedEnvelope, EetError> {
        self.build_with_ids(record, key_store, EnvelopeIds::random())
    }

    /// Build and sign an envelope with caller-chosen identifiers.
    ///
    /// # Errors
    ///
    /// Same as [`EnvelopeBuilder::build`].
    pub fn build_with_ids(
        &self,
        record: &FiscalRecord,
        key_store: &dyn KeyStore,
        ids: EnvelopeIds,
    ) -> Result<SignedEnvelope, EetError> {
        let certificate = key_store.certificate_der();
        if certificate.is_empty() {
            return Err(EetError::Envelope(format!(
                "key store {} returned an empty certificate",
                key_store.name()
            )));
        }

        let body = self.body(record, &ids.body).canonicalize();
        let digest = STANDARD.encode(Sha256::digest(body.as_bytes()));

        let signed_info = self.signed_info(&ids.body, &digest).canonicalize();
        let signature_value = STANDARD.encode(key_store.sign(signed_info.as_bytes())?);

        let ns = &self.ns;
        let security = Element::new("wsse:Security")
            .namespace("wsse", ns.wsse)
            .namespace("wsu", ns.wsu)
            .attr_ns(ns.soap, "soap:mustUnderstand", "1")
            .child(
                Element::new("wsse:BinarySecurityToken")
                    .attr("EncodingType", ns.base64_binary)
                    .attr("ValueType", ns.x509_v3)
                    .attr_ns(ns.wsu, "wsu:Id", ids.certificate.as_str())
                    .text(STANDARD.encode(certificate)),
            )
            .child(
                Element::new("ds:Signature")
                    .namespace("ds", ns.ds)
                    .attr("Id", ids.signature.as_str())
                    .canonical(signed_info.clone())
                    .child(Element::new("ds:SignatureValue").text(signature_value.as_str()))
                    .child(
                        Element::new("ds:KeyInfo")
                            .attr("Id", ids.key_info.as_str())
                            .child(
                                Element::new("wsse:SecurityTokenReference")
                                    .namespace("wsse", ns.wsse)
                                    .namespace("wsu", ns.wsu)
                                    .attr_ns(ns.wsu, "wsu:Id", ids.token_reference.as_str())
                                    .child(
                                        Element::new("wsse:Reference")
                                            .attr("URI", format!("#{}", ids.certificate))
                                            .attr("ValueType", ns.x509_v3),
                                    ),
                            ),
                    ),
            );

        let envelope = Element::new("soap:Envelope")
            .namespace("soap", ns.soap)
            .child(
                Element::new("SOAP-ENV:Header")
                    .namespace("SOAP-ENV", ns.soap)
                    .child(security),
            )
            .canonical(body.clone())
            .canonicalize();

        let xml = format!("{XML_DECLARATION}{}", envelope.as_str());
        tracing::debug!(
            message_uuid = %record.header().message_uuid(),
            body_id = %ids.body,
            bytes = xml.len(),
            "built signed envelope"
        );

        Ok(SignedEnvelope {
            xml,
            ids,
            digest,
            body,
            signed_info,
            signature_value,
        })
    }

    fn body(&self, record: &FiscalRecord, body_id: &str) -> Element {
        Element::new("soap:Body")
            .namespace("soap", self.ns.soap)
            .namespace("wsu", self.ns.wsu)
            .attr_ns(self.ns.wsu, "wsu:Id", body_id)
            .child(trzba(record, self.ns.eet))
    }

    fn signed_info(&self, body_id: &str, digest: &str) -> Element {
        let ns = &self.ns;
        Element::new("ds:SignedInfo")
            .namespace("ds", ns.ds)
            .namespace("soap", ns.soap)
            .child(
                Element::new("ds:CanonicalizationMethod")
                    .attr("Algorithm", ns.exc_c14n)
                    .child(inclusive_namespaces(ns, "soap")),
            )
            .child(Element::new("ds:SignatureMethod").attr("Algorithm", ns.rsa_sha256))
            .child(
                Element::new("ds:Reference")
                    .attr("URI", format!("#{body_id}"))
                    .child(
                        Element::new("ds:Transforms").child(
                            Element::new("ds:Transform")
                                .attr("Algorithm", ns.exc_c14n)
                                .child(inclusive_namespaces(ns, "")),
                        ),
                    )
                    .child(Element::new("ds:DigestMethod").attr("Algorithm", ns.sha256))
                    .child(Element::new("ds:DigestValue").text(digest)),
            )
    }
}

fn inclusive_namespaces(ns: &NamespaceTable, prefix_list: &str) -> Element {
    Element::new("ec:InclusiveNamespaces")
        .namespace("ec", ns.exc_c14n)
        .attr("PrefixList", prefix_list)
}

/// The `Trzba` element: header, sale data and control codes.
fn trzba(record: &FiscalRecord, eet_ns: &str) -> Element {
    let header = record.header();
    let mut hlavicka = Element::new("Hlavicka")
        .attr("dat_odesl", header.sent_at().to_wire())
        .attr("prvni_zaslani", bool_attr(header.first_submission()))
        .attr("uuid_zpravy", header.message_uuid().as_str());
    if header.verification_mode() {
        hlavicka = hlavicka.attr("overeni", "true");
    }

    let data = record.data();
    let mut data_el = Element::new("Data")
        .attr("dic_popl", data.tax_id().as_str())
        .attr("id_provoz", data.establishment_id().to_string())
        .attr("id_pokl", data.till_id().as_str())
        .attr("porad_cis", data.sequence_number().as_str())
        .attr("dat_trzby", data.sale_time().to_wire())
        .attr("celk_trzba", data.total_amount().as_str())
        .attr("rezim", data.regime().wire_value());
    if let Some(delegating) = data.delegating_tax_id() {
        data_el = data_el.attr("dic_poverujiciho", delegating.as_str());
    }
    for (field, amount) in data.amounts() {
        data_el = data_el.attr(field.attribute_name(), amount.as_str());
    }

    let codes = record.codes();
    let kontrolni_kody = Element::new("KontrolniKody")
        .child(
            Element::new("pkp")
                .attr("cipher", Pkp::CIPHER)
                .attr("digest", Pkp::DIGEST)
                .attr("encoding", Pkp::ENCODING)
                .text(codes.pkp().value()),
        )
        .child(
            Element::new("bkp")
                .attr("digest", Bkp::DIGEST)
                .attr("encoding", Bkp::ENCODING)
                .text(codes.bkp().value()),
        );

    Element::new("Trzba")
        .namespace("", eet_ns)
        .child(hlavicka)
        .child(data_el)
        .child(kontrolni_kody)
}

fn bool_attr(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
