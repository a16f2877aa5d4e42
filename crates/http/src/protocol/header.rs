//! The structured head of an HTTP message.
//!
//! An [`HttpHeader`] keeps the three start-line tokens exactly as they were
//! parsed (or set) and an ordered list of fields. The tokens mean
//! method/uri/version for a request and version/status/reason for a response;
//! a header is a response when its first token is a known protocol version.
//!
//! Field names are interned through the token tables, so `content-length`,
//! `Content-Length` and `CONTENT-LENGTH` all end up as the same canonical
//! static bytes and carry the same ordinal. Values are kept byte for byte and
//! only share the static bytes of a well-known value spelled exactly alike.

use std::fmt;

use bytes::Bytes;

use crate::buffer::parse_decimal;
use crate::ensure;
use crate::protocol::tokens::{header_values, headers, methods, status, versions};
use crate::protocol::{ContentLength, ParseError};

/// One `name: value` line of a message head.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpField {
    name: Bytes,
    ordinal: Option<usize>,
    value: Bytes,
}

impl HttpField {
    fn new(name: &[u8], value: &[u8]) -> Self {
        let (name, ordinal) = match headers::CACHE.lookup(name) {
            Some(cached) => (cached.bytes().clone(), Some(cached.ordinal())),
            None => (Bytes::copy_from_slice(name), None),
        };
        Self { name, ordinal, value: header_values::CACHE.share_or_copy(value) }
    }

    #[inline]
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The ordinal of a well-known header name, see [`headers`].
    #[inline]
    pub fn ordinal(&self) -> Option<usize> {
        self.ordinal
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.name).ok()
    }

    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    fn is_named(&self, name: &[u8]) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Iterates the comma separated elements of the value, trimmed.
    fn elements(&self) -> impl Iterator<Item = &[u8]> {
        self.value.split(|&b| b == b',').map(<[u8]>::trim_ascii).filter(|e| !e.is_empty())
    }
}

impl fmt::Debug for HttpField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", String::from_utf8_lossy(&self.name), String::from_utf8_lossy(&self.value))
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct HttpHeader {
    token0: Bytes,
    token1: Bytes,
    token2: Bytes,
    fields: Vec<HttpField>,
}

impl HttpHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a request head, e.g. `HttpHeader::request("GET", "/", "HTTP/1.1")`.
    pub fn request(method: impl AsRef<[u8]>, uri: impl AsRef<[u8]>, version: impl AsRef<[u8]>) -> Self {
        let mut header = Self::new();
        header.set_token0(method.as_ref());
        header.set_token1(uri.as_ref());
        header.set_token2(version.as_ref());
        header
    }

    /// Creates an HTTP/1.1 response head with the standard reason phrase.
    pub fn response(status: u16) -> Self {
        let mut header = Self::new();
        header.set_token0(b"HTTP/1.1");
        header.set_status(status);
        header
    }

    /// Sets the method of a request or the version of a response.
    pub fn set_token0(&mut self, token: &[u8]) {
        self.token0 = match versions::CACHE.lookup(token) {
            Some(version) => version.bytes().clone(),
            None => methods::CACHE.lookup_or_copy(token),
        };
    }

    /// Sets the uri of a request or the status code of a response.
    pub fn set_token1(&mut self, token: &[u8]) {
        self.token1 = Bytes::copy_from_slice(token);
    }

    /// Sets the version of a request or the reason phrase of a response.
    pub fn set_token2(&mut self, token: &[u8]) {
        self.token2 = match versions::CACHE.lookup(token) {
            Some(version) => version.bytes().clone(),
            None => Bytes::copy_from_slice(token),
        };
    }

    #[inline]
    pub fn token0(&self) -> &[u8] {
        &self.token0
    }

    #[inline]
    pub fn token1(&self) -> &[u8] {
        &self.token1
    }

    #[inline]
    pub fn token2(&self) -> &[u8] {
        &self.token2
    }

    /// A response starts with its protocol version.
    pub fn is_response(&self) -> bool {
        versions::CACHE.lookup(&self.token0).is_some()
    }

    pub fn method(&self) -> Option<&[u8]> {
        if self.is_response() { None } else { Some(&self.token0) }
    }

    /// The ordinal of a well-known request method, see [`methods`].
    pub fn method_ordinal(&self) -> Option<usize> {
        self.method().and_then(|method| methods::CACHE.ordinal(method))
    }

    pub fn uri(&self) -> Option<&[u8]> {
        if self.is_response() { None } else { Some(&self.token1) }
    }

    pub fn version(&self) -> &[u8] {
        if self.is_response() { &self.token0 } else { &self.token2 }
    }

    /// The version ordinal, see [`versions`]. A request without version is HTTP/0.9.
    pub fn version_ordinal(&self) -> Option<usize> {
        let version = self.version();
        if version.is_empty() && !self.token0.is_empty() {
            return Some(versions::HTTP_0_9);
        }
        versions::CACHE.ordinal(version)
    }

    pub fn status(&self) -> Option<u16> {
        if !self.is_response() {
            return None;
        }
        parse_decimal(&self.token1).and_then(|code| u16::try_from(code).ok())
    }

    pub fn reason(&self) -> Option<&[u8]> {
        if self.is_response() { Some(&self.token2) } else { None }
    }

    /// Sets the status code and its standard reason phrase, if one is known.
    pub fn set_status(&mut self, code: u16) {
        self.token1 = Bytes::from(code.to_string());
        self.token2 = match status::CACHE.get(usize::from(code)) {
            Some(reason) => reason.bytes().clone(),
            None => status::reason(code).map(|r| Bytes::from_static(r.as_bytes())).unwrap_or_default(),
        };
    }

    /// Appends a field, keeping any existing field of the same name.
    pub fn add(&mut self, name: impl AsRef<[u8]>, value: impl AsRef<[u8]>) {
        self.fields.push(HttpField::new(name.as_ref(), value.as_ref()));
    }

    /// Replaces every field named `name` with a single one, in place of the first.
    pub fn put(&mut self, name: impl AsRef<[u8]>, value: impl AsRef<[u8]>) {
        let field = HttpField::new(name.as_ref(), value.as_ref());
        match self.fields.iter().position(|f| f.is_named(&field.name)) {
            Some(first) => {
                self.fields[first] = field;
                let name = self.fields[first].name.clone();
                let mut index = 0;
                self.fields.retain(|f| {
                    index += 1;
                    index - 1 == first || !f.is_named(&name)
                });
            }
            None => self.fields.push(field),
        }
    }

    /// Removes every field named `name`, returning how many were removed.
    pub fn remove(&mut self, name: impl AsRef<[u8]>) -> usize {
        let before = self.fields.len();
        self.fields.retain(|f| !f.is_named(name.as_ref()));
        before - self.fields.len()
    }

    /// The value of the first field named `name`.
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.fields.iter().find(|f| f.is_named(name.as_ref())).map(HttpField::value)
    }

    pub fn get_str(&self, name: impl AsRef<[u8]>) -> Option<&str> {
        self.get(name).and_then(|value| std::str::from_utf8(value).ok())
    }

    /// The values of every field named `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.fields.iter().filter(move |f| f.is_named(name)).map(HttpField::value)
    }

    /// The value of the first field with a well-known name ordinal.
    pub fn get_by_ordinal(&self, ordinal: usize) -> Option<&[u8]> {
        self.fields.iter().find(|f| f.ordinal == Some(ordinal)).map(HttpField::value)
    }

    pub fn contains(&self, name: impl AsRef<[u8]>) -> bool {
        self.get(name).is_some()
    }

    /// The first field named `name` as a decimal number.
    pub fn int_field(&self, name: impl AsRef<[u8]>) -> Option<u64> {
        self.get(name).and_then(parse_decimal)
    }

    /// True when a comma separated element of any `name` field equals `element`,
    /// ignoring case.
    pub fn has_element(&self, name: impl AsRef<[u8]>, element: &[u8]) -> bool {
        self.fields.iter().filter(|f| f.is_named(name.as_ref())).flat_map(HttpField::elements).any(|e| e.eq_ignore_ascii_case(element))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HttpField> {
        self.fields.iter()
    }

    /// Forgets the start line and every field.
    pub fn clear(&mut self) {
        self.token0.clear();
        self.token1.clear();
        self.token2.clear();
        self.fields.clear();
    }

    /// Works out how the body following this head is delimited.
    ///
    /// Transfer-Encoding wins over Content-Length. Without either, a response
    /// (or a request announcing a Content-Type) runs until the connection ends,
    /// any other request has no body.
    pub fn content_length(&self) -> Result<ContentLength, ParseError> {
        if self.forbids_content() {
            return Ok(ContentLength::NoContent);
        }

        let (mut last, mut chunked) = (None, 0);
        for coding in self.fields.iter().filter(|f| f.ordinal == Some(headers::TRANSFER_ENCODING)).flat_map(HttpField::elements) {
            if header_values::CACHE.ordinal(coding) == Some(header_values::CHUNKED) {
                chunked += 1;
            }
            last = Some(coding);
        }
        if let Some(last) = last {
            if header_values::CACHE.ordinal(last) == Some(header_values::CHUNKED) {
                return Ok(ContentLength::Chunked);
            }
            ensure!(chunked == 0, ParseError::invalid_header("chunked is not the final transfer coding"));
        }

        let mut declared = None;
        for field in self.fields.iter().filter(|f| f.ordinal == Some(headers::CONTENT_LENGTH)) {
            let length = parse_decimal(field.value())
                .ok_or_else(|| ParseError::invalid_content_length(String::from_utf8_lossy(field.value())))?;
            ensure!(
                declared.is_none_or(|d| d == length),
                ParseError::invalid_content_length("conflicting content-length fields")
            );
            declared = Some(length);
        }
        if let Some(length) = declared {
            return Ok(ContentLength::from_length(length));
        }

        if self.is_response() || self.get_by_ordinal(headers::CONTENT_TYPE).is_some() {
            Ok(ContentLength::Eof)
        } else {
            Ok(ContentLength::NoContent)
        }
    }

    /// 1xx, 204 and 304 responses never carry content, whatever their fields say.
    pub fn forbids_content(&self) -> bool {
        self.status().is_some_and(|code| (100..200).contains(&code) || code == 204 || code == 304)
    }

    /// Whether the connection may carry another message after this one.
    pub fn is_persistent(&self) -> bool {
        if self.has_element(b"Connection", b"close") {
            return false;
        }
        match self.version_ordinal() {
            Some(versions::HTTP_1_1) => true,
            Some(versions::HTTP_1_0) => self.has_element(b"Connection", b"keep-alive"),
            _ => false,
        }
    }

    /// Length of the serialized head: start line, fields and the blank line.
    pub fn encoded_len(&self) -> usize {
        let start_line: usize = self.start_line().map(<[u8]>::len).sum::<usize>() + self.start_line().count().saturating_sub(1);
        let fields: usize = self.fields.iter().map(|f| f.name.len() + 2 + f.value.len() + 2).sum();
        start_line + 2 + fields + 2
    }

    /// The non-empty start-line tokens, in wire order.
    pub(crate) fn start_line(&self) -> impl Iterator<Item = &[u8]> + Clone {
        [&self.token0[..], &self.token1[..], &self.token2[..]].into_iter().filter(|t| !t.is_empty())
    }
}

impl fmt::Debug for HttpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHeader")
            .field("token0", &String::from_utf8_lossy(&self.token0))
            .field("token1", &String::from_utf8_lossy(&self.token1))
            .field("token2", &String::from_utf8_lossy(&self.token2))
            .field("fields", &self.fields)
            .finish()
    }
}
