//! Well-known HTTP tokens interned to ordinals.
//!
//! Every table is a [`BufferCache`] built lazily on first use and never
//! mutated afterwards, so it can be read from any connection thread without
//! synchronization.
//!
//! ```
//! use micro_http_engine::protocol::tokens::methods;
//!
//! assert_eq!(methods::CACHE.ordinal(b"get"), Some(methods::GET));
//! ```

use once_cell::sync::Lazy;

use crate::buffer::BufferCache;

/// Request methods.
pub mod methods {
    use super::{BufferCache, Lazy};

    pub const GET: usize = 1;
    pub const POST: usize = 2;
    pub const HEAD: usize = 3;
    pub const PUT: usize = 4;
    pub const OPTIONS: usize = 5;
    pub const DELETE: usize = 6;
    pub const TRACE: usize = 7;
    pub const CONNECT: usize = 8;
    pub const MOVE: usize = 9;

    pub static CACHE: Lazy<BufferCache> = Lazy::new(|| {
        let mut cache = BufferCache::new();
        cache.add("GET", GET);
        cache.add("POST", POST);
        cache.add("HEAD", HEAD);
        cache.add("PUT", PUT);
        cache.add("OPTIONS", OPTIONS);
        cache.add("DELETE", DELETE);
        cache.add("TRACE", TRACE);
        cache.add("CONNECT", CONNECT);
        cache.add("MOVE", MOVE);
        cache
    });
}

/// Protocol versions. The ordinal encodes major * 10 + minor.
pub mod versions {
    use super::{BufferCache, Lazy};

    pub const HTTP_0_9: usize = 9;
    pub const HTTP_1_0: usize = 10;
    pub const HTTP_1_1: usize = 11;

    pub static CACHE: Lazy<BufferCache> = Lazy::new(|| {
        let mut cache = BufferCache::new();
        cache.add("HTTP/0.9", HTTP_0_9);
        cache.add("HTTP/1.0", HTTP_1_0);
        cache.add("HTTP/1.1", HTTP_1_1);
        cache
    });
}

/// Header field names.
pub mod headers {
    use super::{BufferCache, Lazy};

    // general fields
    pub const CONNECTION: usize = 1;
    pub const DATE: usize = 2;
    pub const PRAGMA: usize = 3;
    pub const TRAILER: usize = 4;
    pub const TRANSFER_ENCODING: usize = 5;
    pub const UPGRADE: usize = 6;
    pub const VIA: usize = 7;
    pub const WARNING: usize = 8;

    // entity fields
    pub const ALLOW: usize = 9;
    pub const CONTENT_ENCODING: usize = 10;
    pub const CONTENT_LANGUAGE: usize = 11;
    pub const CONTENT_LENGTH: usize = 12;
    pub const CONTENT_LOCATION: usize = 13;
    pub const CONTENT_MD5: usize = 14;
    pub const CONTENT_RANGE: usize = 15;
    pub const CONTENT_TYPE: usize = 16;
    pub const EXPIRES: usize = 17;
    pub const LAST_MODIFIED: usize = 18;

    // request fields
    pub const ACCEPT: usize = 19;
    pub const ACCEPT_CHARSET: usize = 20;
    pub const ACCEPT_ENCODING: usize = 21;
    pub const ACCEPT_LANGUAGE: usize = 22;
    pub const AUTHORIZATION: usize = 23;
    pub const EXPECT: usize = 24;
    pub const FORWARDED: usize = 25;
    pub const FROM: usize = 26;
    pub const HOST: usize = 27;
    pub const IF_MATCH: usize = 28;
    pub const IF_MODIFIED_SINCE: usize = 29;
    pub const IF_NONE_MATCH: usize = 30;
    pub const IF_RANGE: usize = 31;
    pub const IF_UNMODIFIED_SINCE: usize = 32;
    pub const KEEP_ALIVE: usize = 33;
    pub const MAX_FORWARDS: usize = 34;
    pub const PROXY_AUTHORIZATION: usize = 35;
    pub const RANGE: usize = 36;
    pub const REFERER: usize = 37;
    pub const TE: usize = 38;
    pub const USER_AGENT: usize = 39;
    pub const X_FORWARDED_FOR: usize = 40;

    // response fields
    pub const ACCEPT_RANGES: usize = 41;
    pub const AGE: usize = 42;
    pub const ETAG: usize = 43;
    pub const LOCATION: usize = 44;
    pub const PROXY_AUTHENTICATE: usize = 45;
    pub const RETRY_AFTER: usize = 46;
    pub const SERVER: usize = 47;
    pub const VARY: usize = 48;
    pub const WWW_AUTHENTICATE: usize = 49;

    // other fields
    pub const COOKIE: usize = 50;
    pub const SET_COOKIE: usize = 51;
    pub const SET_COOKIE2: usize = 52;
    pub const MIME_VERSION: usize = 53;

    pub static CACHE: Lazy<BufferCache> = Lazy::new(|| {
        let mut cache = BufferCache::new();
        for (name, ordinal) in [
            ("Connection", CONNECTION),
            ("Date", DATE),
            ("Pragma", PRAGMA),
            ("Trailer", TRAILER),
            ("Transfer-Encoding", TRANSFER_ENCODING),
            ("Upgrade", UPGRADE),
            ("Via", VIA),
            ("Warning", WARNING),
            ("Allow", ALLOW),
            ("Content-Encoding", CONTENT_ENCODING),
            ("Content-Language", CONTENT_LANGUAGE),
            ("Content-Length", CONTENT_LENGTH),
            ("Content-Location", CONTENT_LOCATION),
            ("Content-MD5", CONTENT_MD5),
            ("Content-Range", CONTENT_RANGE),
            ("Content-Type", CONTENT_TYPE),
            ("Expires", EXPIRES),
            ("Last-Modified", LAST_MODIFIED),
            ("Accept", ACCEPT),
            ("Accept-Charset", ACCEPT_CHARSET),
            ("Accept-Encoding", ACCEPT_ENCODING),
            ("Accept-Language", ACCEPT_LANGUAGE),
            ("Authorization", AUTHORIZATION),
            ("Expect", EXPECT),
            ("Forwarded", FORWARDED),
            ("From", FROM),
            ("Host", HOST),
            ("If-Match", IF_MATCH),
            ("If-Modified-Since", IF_MODIFIED_SINCE),
            ("If-None-Match", IF_NONE_MATCH),
            ("If-Range", IF_RANGE),
            ("If-Unmodified-Since", IF_UNMODIFIED_SINCE),
            ("Keep-Alive", KEEP_ALIVE),
            ("Max-Forwards", MAX_FORWARDS),
            ("Proxy-Authorization", PROXY_AUTHORIZATION),
            ("Range", RANGE),
            ("Referer", REFERER),
            ("TE", TE),
            ("User-Agent", USER_AGENT),
            ("X-Forwarded-For", X_FORWARDED_FOR),
            ("Accept-Ranges", ACCEPT_RANGES),
            ("Age", AGE),
            ("ETag", ETAG),
            ("Location", LOCATION),
            ("Proxy-Authenticate", PROXY_AUTHENTICATE),
            ("Retry-After", RETRY_AFTER),
            ("Server", SERVER),
            ("Vary", VARY),
            ("WWW-Authenticate", WWW_AUTHENTICATE),
            ("Cookie", COOKIE),
            ("Set-Cookie", SET_COOKIE),
            ("Set-Cookie2", SET_COOKIE2),
            ("MIME-Version", MIME_VERSION),
        ] {
            cache.add(name, ordinal);
        }
        cache
    });
}

/// Header field values worth dispatching on.
pub mod header_values {
    use super::{BufferCache, Lazy};

    pub const CLOSE: usize = 1;
    pub const CHUNKED: usize = 2;
    pub const GZIP: usize = 3;
    pub const IDENTITY: usize = 4;
    pub const KEEP_ALIVE: usize = 5;
    pub const CONTINUE: usize = 6;
    pub const PROCESSING: usize = 7;
    pub const UPGRADE: usize = 8;

    pub static CACHE: Lazy<BufferCache> = Lazy::new(|| {
        let mut cache = BufferCache::new();
        cache.add("close", CLOSE);
        cache.add("chunked", CHUNKED);
        cache.add("gzip", GZIP);
        cache.add("identity", IDENTITY);
        cache.add("keep-alive", KEEP_ALIVE);
        cache.add("100-continue", CONTINUE);
        cache.add("102-processing", PROCESSING);
        cache.add("Upgrade", UPGRADE);
        cache
    });
}

/// Reason phrases, keyed by status code.
pub mod status {
    use super::{BufferCache, Lazy};

    pub static CACHE: Lazy<BufferCache> = Lazy::new(|| {
        let mut cache = BufferCache::new();
        for (code, reason) in [
            (100, "Continue"),
            (101, "Switching Protocols"),
            (102, "Processing"),
            (200, "OK"),
            (201, "Created"),
            (202, "Accepted"),
            (203, "Non Authoritative Information"),
            (204, "No Content"),
            (205, "Reset Content"),
            (206, "Partial Content"),
            (207, "Multi Status"),
            (300, "Multiple Choices"),
            (301, "Moved Permanently"),
            (302, "Found"),
            (303, "See Other"),
            (304, "Not Modified"),
            (305, "Use Proxy"),
            (400, "Bad Request"),
            (401, "Unauthorized"),
            (402, "Payment Required"),
            (403, "Forbidden"),
            (404, "Not Found"),
            (405, "Method Not Allowed"),
            (406, "Not Acceptable"),
            (407, "Proxy Authentication Required"),
            (408, "Request Timeout"),
            (409, "Conflict"),
            (410, "Gone"),
            (411, "Length Required"),
            (412, "Precondition Failed"),
            (413, "Request Entity Too Large"),
            (414, "Request URI Too Large"),
            (415, "Unsupported Media Type"),
            (416, "Requested Range Not Satisfiable"),
            (417, "Expectation Failed"),
            (422, "Unprocessable Entity"),
            (423, "Locked"),
            (424, "Failed Dependency"),
            (500, "Internal Server Error"),
            (501, "Not Implemented"),
            (502, "Bad Gateway"),
            (503, "Service Unavailable"),
            (504, "Gateway Timeout"),
            (505, "HTTP Version Not Supported"),
            (507, "Insufficient Storage"),
        ] {
            cache.add(reason, code);
        }
        cache
    });

    /// The reason phrase for `code`: the cached one if present, otherwise the
    /// canonical reason known to [`http::StatusCode`].
    pub fn reason(code: u16) -> Option<&'static str> {
        match CACHE.get(usize::from(code)) {
            Some(cached) => Some(cached.as_str()),
            None => http::StatusCode::from_u16(code).ok()?.canonical_reason(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_resolve_ignoring_case() {
        for candidate in ["GET", "get", "Get"] {
            assert_eq!(methods::CACHE.ordinal(candidate.as_bytes()), Some(methods::GET));
        }
        assert_eq!(methods::CACHE.ordinal(b"BREW"), None);
    }

    #[test]
    fn canonical_header_names() {
        let cached = headers::CACHE.lookup(b"content-length").unwrap();
        assert_eq!(cached.ordinal(), headers::CONTENT_LENGTH);
        assert_eq!(cached.as_str(), "Content-Length");
        assert_eq!(headers::CACHE.get(headers::HOST).unwrap().as_str(), "Host");
    }

    #[test]
    fn versions_and_values() {
        assert_eq!(versions::CACHE.ordinal(b"http/1.1"), Some(versions::HTTP_1_1));
        assert_eq!(header_values::CACHE.ordinal(b"Chunked"), Some(header_values::CHUNKED));
    }

    #[test]
    fn status_reasons() {
        assert_eq!(status::reason(200), Some("OK"));
        assert_eq!(status::reason(404), Some("Not Found"));
        // not cached, known to the http crate
        assert_eq!(status::reason(418), Some("I'm a teapot"));
        assert_eq!(status::reason(1000), None);
    }
}
