//! # Registration Response
//!
//! Parses the reply envelope into a [`Response`]: exactly one of a
//! [`Confirmation`] (the sale was registered and has a FIK) or a [`Fault`]
//! (the service rejected it), plus any [`Warning`]s.
//!
//! Matching is by local name inside the SOAP Body, so the parser does not
//! depend on the prefixes the server chooses. The server's own security
//! header is not inspected.
//!
//! | Element | Attributes | Maps to |
//! |---------|------------|---------|
//! | `Hlavicka` | `uuid_zpravy`, `bkp`, `dat_prij`, `dat_odmit` | echoed header |
//! | `Potvrzeni` | `fik`, `test` | [`Confirmation`] |
//! | `Chyba` | `kod`, `test`, text | [`Fault`] |
//! | `Varovani` | `kod_varov`, text | [`Warning`] |
//!
//! A SOAP-level `Fault` (server could not process the request at all) is
//! reported as [`MalformedResponseError`] carrying its `faultstring`.

use chrono::{DateTime, FixedOffset};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::error::MalformedResponseError;

/// The sale was registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    /// Fiscal identification code (`fik`) to print on the receipt.
    pub fiscal_id: String,
    /// When the service received the request (`dat_prij`).
    pub received_at: DateTime<FixedOffset>,
    /// BKP echoed by the service, if present.
    pub echoed_bkp: Option<String>,
    /// The request went to a test environment (`test`).
    pub test_mode: bool,
}

/// The service rejected the request (`Chyba`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    /// Error code (`kod`). Zero for a successful verification-mode request.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// The request went to a test environment (`test`).
    pub test_mode: bool,
    /// When the service rejected the request (`dat_odmit`), if present.
    pub rejected_at: Option<DateTime<FixedOffset>>,
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EET fault {}: {}", self.code, self.message)
    }
}

impl std::error::Error for Fault {}

/// A non-fatal remark about the submitted data (`Varovani`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Warning code (`kod_varov`).
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

/// Either outcome of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Registered.
    Confirmed(Confirmation),
    /// Rejected.
    Rejected(Fault),
}

/// A parsed registration reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    message_uuid: Option<String>,
    outcome: Outcome,
    warnings: Vec<Warning>,
}

impl Response {
    /// Parse a reply envelope.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedResponseError`] if the bytes are not well-formed
    /// XML, contain a SOAP fault, lack an `Odpoved`, or carry both or
    /// neither of `Potvrzeni` and `Chyba`.
    pub fn parse(bytes: &[u8]) -> Result<Self, MalformedResponseError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| MalformedResponseError::new(format!("response is not UTF-8: {e}")))?;
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut parsed = Parsed::default();
        let mut stack: Vec<String> = Vec::new();

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) => {
                    parsed.element(&e, &stack)?;
                    stack.push(local_name(&e));
                }
                Event::Empty(e) => parsed.element(&e, &stack)?,
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(xml_error)?;
                    parsed.text(&stack, &text);
                }
                Event::CData(c) => {
                    parsed.text(&stack, &String::from_utf8_lossy(&c));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        parsed.finish()
    }

    /// Message UUID echoed by the service.
    pub fn message_uuid(&self) -> Option<&str> {
        self.message_uuid.as_deref()
    }

    /// Confirmation or fault.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// `true` if the service registered the sale.
    pub fn is_confirmation(&self) -> bool {
        matches!(self.outcome, Outcome::Confirmed(_))
    }

    /// `true` if the service rejected the request.
    pub fn is_fault(&self) -> bool {
        matches!(self.outcome, Outcome::Rejected(_))
    }

    /// The confirmation, if registered.
    pub fn confirmation(&self) -> Option<&Confirmation> {
        match &self.outcome {
            Outcome::Confirmed(c) => Some(c),
            Outcome::Rejected(_) => None,
        }
    }

    /// The fault, if rejected.
    pub fn fault(&self) -> Option<&Fault> {
        match &self.outcome {
            Outcome::Rejected(f) => Some(f),
            Outcome::Confirmed(_) => None,
        }
    }

    /// Warnings in document order. May be empty.
    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    /// Lift the outcome into a `Result` so a fault can be propagated with `?`.
    pub fn into_result(self) -> Result<Confirmation, Fault> {
        match self.outcome {
            Outcome::Confirmed(c) => Ok(c),
            Outcome::Rejected(f) => Err(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Parsed {
    saw_odpoved: bool,
    soap_fault: Option<String>,
    message_uuid: Option<String>,
    bkp: Option<String>,
    received_at: Option<DateTime<FixedOffset>>,
    rejected_at: Option<DateTime<FixedOffset>>,
    confirmation: Option<(String, bool)>,
    fault: Option<(i32, bool, String)>,
    warnings: Vec<Warning>,
}

impl Parsed {
    fn element(&mut self, e: &BytesStart<'_>, stack: &[String]) -> Result<(), MalformedResponseError> {
        if !stack.iter().any(|s| s == "Body") {
            return Ok(());
        }
        let parent = stack.last().map(String::as_str);
        match (local_name(e).as_str(), parent) {
            ("Fault", _) => self.soap_fault = Some(String::new()),
            ("Odpoved", _) => self.saw_odpoved = true,
            ("Hlavicka", Some("Odpoved")) => {
                for (key, value) in attributes(e)? {
                    match key.as_str() {
                        "uuid_zpravy" => self.message_uuid = Some(value),
                        "bkp" => self.bkp = Some(value),
                        "dat_prij" => self.received_at = Some(parse_time("dat_prij", &value)?),
                        "dat_odmit" => self.rejected_at = Some(parse_time("dat_odmit", &value)?),
                        _ => {}
                    }
                }
            }
            ("Potvrzeni", Some("Odpoved")) => {
                let mut fik = None;
                let mut test = false;
                for (key, value) in attributes(e)? {
                    match key.as_str() {
                        "fik" => fik = Some(value),
                        "test" => test = parse_bool(&value),
                        _ => {}
                    }
                }
                let fik = fik.ok_or_else(|| MalformedResponseError::new("Potvrzeni without fik"))?;
                if self.confirmation.replace((fik, test)).is_some() {
                    return Err(MalformedResponseError::new("duplicate Potvrzeni"));
                }
            }
            ("Chyba", Some("Odpoved")) => {
                let mut code = None;
                let mut test = false;
                for (key, value) in attributes(e)? {
                    match key.as_str() {
                        "kod" => code = Some(parse_code("kod", &value)?),
                        "test" => test = parse_bool(&value),
                        _ => {}
                    }
                }
                let code = code.ok_or_else(|| MalformedResponseError::new("Chyba without kod"))?;
                if self.fault.replace((code, test, String::new())).is_some() {
                    return Err(MalformedResponseError::new("duplicate Chyba"));
                }
            }
            ("Varovani", Some("Odpoved")) => {
                let mut code = None;
                for (key, value) in attributes(e)? {
                    if key == "kod_varov" {
                        code = Some(parse_code("kod_varov", &value)?);
                    }
                }
                let code =
                    code.ok_or_else(|| MalformedResponseError::new("Varovani without kod_varov"))?;
                self.warnings.push(Warning {
                    code,
                    message: String::new(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, stack: &[String], text: &str) {
        match stack.last().map(String::as_str) {
            Some("Chyba") => {
                if let Some((_, _, message)) = self.fault.as_mut() {
                    message.push_str(text);
                }
            }
            Some("Varovani") => {
                if let Some(warning) = self.warnings.last_mut() {
                    warning.message.push_str(text);
                }
            }
            Some("faultstring") => {
                if let Some(fault) = self.soap_fault.as_mut() {
                    fault.push_str(text);
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Result<Response, MalformedResponseError> {
        if let Some(faultstring) = self.soap_fault {
            return Err(MalformedResponseError::new(format!("SOAP fault: {faultstring}")));
        }
        if !self.saw_odpoved {
            return Err(MalformedResponseError::new("no Odpoved element in SOAP Body"));
        }

        let outcome = match (self.confirmation, self.fault) {
            (Some(_), Some(_)) => {
                return Err(MalformedResponseError::new(
                    "response carries both Potvrzeni and Chyba",
                ))
            }
            (None, None) => {
                return Err(MalformedResponseError::new(
                    "response carries neither Potvrzeni nor Chyba",
                ))
            }
            (Some((fiscal_id, test_mode)), None) => {
                let received_at = self.received_at.ok_or_else(|| {
                    MalformedResponseError::new("confirmation without dat_prij")
                })?;
                Outcome::Confirmed(Confirmation {
                    fiscal_id,
                    received_at,
                    echoed_bkp: self.bkp,
                    test_mode,
                })
            }
            (None, Some((code, test_mode, message))) => Outcome::Rejected(Fault {
                code,
                message,
                test_mode,
                rejected_at: self.rejected_at,
            }),
        };

        Ok(Response {
            message_uuid: self.message_uuid,
            outcome,
            warnings: self.warnings,
        })
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, MalformedResponseError> {
    e.attributes()
        .map(|attr| {
            let attr = attr.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            Ok((key, value))
        })
        .collect()
}

fn parse_time(name: &str, value: &str) -> Result<DateTime<FixedOffset>, MalformedResponseError> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| MalformedResponseError::new(format!("invalid {name} {value:?}: {e}")))
}

fn parse_code(name: &str, value: &str) -> Result<i32, MalformedResponseError> {
    value
        .trim()
        .parse()
        .map_err(|_| MalformedResponseError::new(format!("invalid {name} {value:?}")))
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "true" | "1")
}

fn xml_error(e: impl std::fmt::Display) -> MalformedResponseError {
    MalformedResponseError::new(format!("invalid XML: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(odpoved_children: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Header><wsse:Security xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd"><Hlavicka uuid_zpravy="ignored"/></wsse:Security></soapenv:Header><soapenv:Body><eet:Odpoved xmlns:eet="http://fs.mfcr.cz/eet/schema/v3">{odpoved_children}</eet:Odpoved></soapenv:Body></soapenv:Envelope>"#
        )
    }

    const CONFIRMED_HEADER: &str = r#"<eet:Hlavicka uuid_zpravy="b3a09b52-7c87-4014-a496-4c7a53cf9125" bkp="2E8ED60D-8A218200-B229A372-35A9F8E8-469613C6" dat_prij="2016-08-05T00:30:13+02:00"/>"#;

    #[test]
    fn parses_confirmation() {
        let xml = envelope(&format!(
            r#"{CONFIRMED_HEADER}<eet:Potvrzeni fik="b3309b52-7c87-4014-a496-4c7a53cf9120-03" test="true"/>"#
        ));
        let resp = Response::parse(xml.as_bytes()).unwrap();
        assert!(resp.is_confirmation());
        assert!(!resp.is_fault());
        assert_eq!(resp.message_uuid(), Some("b3a09b52-7c87-4014-a496-4c7a53cf9125"));

        let c = resp.confirmation().unwrap();
        assert_eq!(c.fiscal_id, "b3309b52-7c87-4014-a496-4c7a53cf9120-03");
        assert!(c.test_mode);
        assert_eq!(
            c.echoed_bkp.as_deref(),
            Some("2E8ED60D-8A218200-B229A372-35A9F8E8-469613C6")
        );
        assert_eq!(c.received_at.to_rfc3339(), "2016-08-05T00:30:13+02:00");
        assert_eq!(resp.warnings().count(), 0);
    }

    #[test]
    fn parses_fault() {
        let xml = envelope(
            r#"<eet:Hlavicka uuid_zpravy="b3a09b52-7c87-4014-a496-4c7a53cf9125" dat_odmit="2016-08-05T00:30:14+02:00"/><eet:Chyba kod="4" test="false">Neplatny podpis SOAP zpravy</eet:Chyba>"#,
        );
        let resp = Response::parse(xml.as_bytes()).unwrap();
        assert!(resp.is_fault());
        let fault = resp.fault().unwrap();
        assert_eq!(fault.code, 4);
        assert_eq!(fault.message, "Neplatny podpis SOAP zpravy");
        assert!(!fault.test_mode);
        assert!(fault.rejected_at.is_some());
        assert_eq!(fault.to_string(), "EET fault 4: Neplatny podpis SOAP zpravy");
    }

    #[test]
    fn warnings_are_kept_in_document_order() {
        let xml = envelope(&format!(
            r#"{CONFIRMED_HEADER}<eet:Potvrzeni fik="abc"/><eet:Varovani kod_varov="1">DIC poplatnika v datove zprave se neshoduje</eet:Varovani><eet:Varovani kod_varov="5">Datum a cas prijeti trzby je vyrazne v budoucnosti</eet:Varovani>"#
        ));
        let resp = Response::parse(xml.as_bytes()).unwrap();
        let codes: Vec<i32> = resp.warnings().map(|w| w.code).collect();
        assert_eq!(codes, vec![1, 5]);
        assert!(resp.warnings().next().unwrap().message.starts_with("DIC"));
    }

    #[test]
    fn warnings_accompany_fault() {
        let xml = envelope(
            r#"<eet:Hlavicka/><eet:Chyba kod="0">Datovou zpravu evidovane trzby v overovacim modu se podarilo zpracovat</eet:Chyba><eet:Varovani kod_varov="2">x</eet:Varovani>"#,
        );
        let resp = Response::parse(xml.as_bytes()).unwrap();
        assert_eq!(resp.fault().unwrap().code, 0);
        assert_eq!(resp.warnings().count(), 1);
    }

    #[test]
    fn both_confirmation_and_fault_is_malformed() {
        let xml = envelope(&format!(
            r#"{CONFIRMED_HEADER}<eet:Potvrzeni fik="abc"/><eet:Chyba kod="3">x</eet:Chyba>"#
        ));
        let err = Response::parse(xml.as_bytes()).unwrap_err();
        assert!(err.reason.contains("both"));
    }

    #[test]
    fn neither_confirmation_nor_fault_is_malformed() {
        let xml = envelope(CONFIRMED_HEADER);
        let err = Response::parse(xml.as_bytes()).unwrap_err();
        assert!(err.reason.contains("neither"));
    }

    #[test]
    fn soap_fault_is_malformed_with_faultstring() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><soap:Fault><faultcode>soap:Server</faultcode><faultstring>Internal &amp; unexpected</faultstring></soap:Fault></soap:Body></soap:Envelope>"#;
        let err = Response::parse(xml.as_bytes()).unwrap_err();
        assert_eq!(err.reason, "SOAP fault: Internal & unexpected");
    }

    #[test]
    fn missing_odpoved_is_malformed() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body/></soap:Envelope>"#;
        assert!(Response::parse(xml.as_bytes()).is_err());
    }

    #[test]
    fn non_xml_is_malformed() {
        assert!(Response::parse(b"<html><body>502 Bad Gateway</body>").is_err());
        assert!(Response::parse(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn confirmation_without_dat_prij_is_malformed() {
        let xml = envelope(r#"<eet:Hlavicka/><eet:Potvrzeni fik="abc"/>"#);
        assert!(Response::parse(xml.as_bytes()).is_err());
    }

    #[test]
    fn fault_lifts_into_error() {
        fn register(resp: Response) -> Result<String, Box<dyn std::error::Error>> {
            Ok(resp.into_result()?.fiscal_id)
        }
        let xml = envelope(r#"<eet:Hlavicka/><eet:Chyba kod="3">Chybny format</eet:Chyba>"#);
        let err = register(Response::parse(xml.as_bytes()).unwrap()).unwrap_err();
        assert!(err.to_string().contains("Chybny format"));
    }
}
