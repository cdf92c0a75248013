//! # Canonical XML Writer
//!
//! A small element tree whose only output form is Exclusive XML
//! Canonicalization (exc-c14n, without comments) of the subtree it
//! describes. The envelope is assembled from these trees so that the bytes
//! that get digested and signed are exactly the bytes that get sent.
//!
//! ## Canonical Form
//!
//! - Namespace declarations come first, sorted by prefix (default
//!   namespace first), followed by attributes sorted by namespace URI and
//!   then local name. Unqualified attributes sort before qualified ones.
//! - Every element has an explicit end tag, including empty ones.
//! - No whitespace is emitted between elements.
//! - Text escapes `&`, `<`, `>` and CR. Attribute values escape `&`, `<`,
//!   `"`, TAB, LF and CR.
//!
//! Namespace declarations are written where the builder puts them. The
//! caller declares each prefix on the element that visibly uses it (or
//! lists it in an `InclusiveNamespaces` prefix list), which is the shape
//! exc-c14n produces.

use std::fmt::Write as _;

/// A rendered canonical fragment.
///
/// Only [`Element::canonicalize`] produces one, so any `CanonicalXml` that
/// is digested, signed, or embedded into a larger document is guaranteed
/// to be in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalXml(String);

impl CanonicalXml {
    /// Canonical text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical bytes (UTF-8).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

#[derive(Debug, Clone)]
struct Attribute {
    namespace: &'static str,
    name: String,
    value: String,
}

impl Attribute {
    fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Element(Element),
    Text(String),
    Canonical(CanonicalXml),
}

/// An element under construction.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    namespaces: Vec<(String, String)>,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// Start an element with a (possibly prefixed) name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Declare a namespace. An empty prefix declares the default namespace.
    pub fn namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.namespaces.push((prefix.to_string(), uri.to_string()));
        self
    }

    /// Add an unqualified attribute.
    pub fn attr(self, name: &str, value: impl Into<String>) -> Self {
        self.attr_ns("", name, value)
    }

    /// Add a namespace-qualified attribute. `name` carries the prefix
    /// (`wsu:Id`); `namespace` is the URI the prefix is bound to and decides
    /// the canonical order.
    pub fn attr_ns(mut self, namespace: &'static str, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            namespace,
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Append a child element.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append character data.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Append an already canonicalized fragment verbatim.
    pub fn canonical(mut self, fragment: CanonicalXml) -> Self {
        self.children.push(Node::Canonical(fragment));
        self
    }

    /// Render this subtree in canonical form.
    pub fn canonicalize(&self) -> CanonicalXml {
        let mut out = String::new();
        self.write(&mut out);
        CanonicalXml(out)
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);

        let mut namespaces: Vec<&(String, String)> = self.namespaces.iter().collect();
        namespaces.sort_by(|a, b| a.0.cmp(&b.0));
        for (prefix, uri) in namespaces {
            if prefix.is_empty() {
                out.push_str(" xmlns=\"");
            } else {
                let _ = write!(out, " xmlns:{prefix}=\"");
            }
            escape_attribute(uri, out);
            out.push('"');
        }

        let mut attributes: Vec<&Attribute> = self.attributes.iter().collect();
        attributes.sort_by(|a, b| {
            (a.namespace, a.local_name()).cmp(&(b.namespace, b.local_name()))
        });
        for attribute in attributes {
            let _ = write!(out, " {}=\"", attribute.name);
            escape_attribute(&attribute.value, out);
            out.push('"');
        }
        out.push('>');

        for child in &self.children {
            match child {
                Node::Element(element) => element.write(out),
                Node::Text(text) => escape_text(text, out),
                Node::Canonical(fragment) => out.push_str(fragment.as_str()),
            }
        }

        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}
