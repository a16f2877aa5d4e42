use indoc::indoc;
use micro_http_engine::buffer::View;
use micro_http_engine::codec::{Handler, HttpParser, ParserState};
use micro_http_engine::connection::{HttpInput, HttpOutput};
use micro_http_engine::io::{ByteArrayEndPoint, ByteSource, TcpEndPoint};
use micro_http_engine::protocol::tokens::methods;
use micro_http_engine::protocol::{ContentLength, HttpHeader, InputEvent, ParseError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Token0(String),
    Token1(String),
    Token2(String),
    Header(String, String),
    HeaderComplete,
    Content(u64, Vec<u8>),
    Complete(u64),
}

use Event::*;

#[derive(Default)]
struct Recorder {
    header: HttpHeader,
    events: Vec<Event>,
}

impl Handler for Recorder {
    fn start_token0(&mut self, token: View<'_>) -> Result<(), ParseError> {
        self.header.set_token0(&token);
        self.events.push(Token0(token.to_string()));
        Ok(())
    }

    fn start_token1(&mut self, token: View<'_>) -> Result<(), ParseError> {
        self.header.set_token1(&token);
        self.events.push(Token1(token.to_string()));
        Ok(())
    }

    fn start_token2(&mut self, token: View<'_>) -> Result<(), ParseError> {
        self.header.set_token2(&token);
        self.events.push(Token2(token.to_string()));
        Ok(())
    }

    fn header(&mut self, name: View<'_>, value: View<'_>) -> Result<(), ParseError> {
        self.header.add(name, value);
        self.events.push(Header(name.to_string(), value.to_string()));
        Ok(())
    }

    fn header_complete(&mut self) -> Result<(), ParseError> {
        self.events.push(HeaderComplete);
        Ok(())
    }

    fn content_length(&mut self) -> Result<ContentLength, ParseError> {
        self.header.content_length()
    }

    fn content(&mut self, offset: u64, content: View<'_>) -> Result<(), ParseError> {
        self.events.push(Content(offset, content.to_vec()));
        Ok(())
    }

    fn message_complete(&mut self, content_length: u64) -> Result<(), ParseError> {
        self.events.push(Complete(content_length));
        Ok(())
    }
}

/// Drives a parser to the end of one message, collecting events with
/// adjacent content merged, so that differently split inputs compare equal.
fn run<S: ByteSource>(parser: &mut HttpParser<S>) -> (Vec<Event>, Result<(), ParseError>) {
    let mut recorder = Recorder::default();
    let result = loop {
        if parser.state() == ParserState::End {
            break Ok(());
        }
        if let Err(e) = parser.parse_next(&mut recorder) {
            break Err(e);
        }
    };

    let mut events: Vec<Event> = Vec::new();
    for event in recorder.events {
        if let (Some(Content(_, merged)), Content(_, more)) = (events.last_mut(), &event) {
            merged.extend_from_slice(more);
            continue;
        }
        events.push(event);
    }
    (events, result)
}

fn parse(wire: &[u8]) -> (Vec<Event>, Result<(), ParseError>) {
    run(&mut HttpParser::new(ByteArrayEndPoint::new(wire.to_vec())))
}

const SIMPLE_GET: &[u8] = b"GET /foo HTTP/1.1\r\nHost: x\r\n\r\n";
const LENGTH_BODY: &[u8] = b"GET /foo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
const CHUNKED_BODY: &[u8] = b"GET /foo HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n0\r\n\r\n";
const BAD_CHUNK: &[u8] = b"GET /foo HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nZZ\r\nWiki\r\n0\r\n\r\n";
const FOLDED: &[u8] = b"GET /foo HTTP/1.1\r\nX-Foo: a\r\n b\r\n\r\n";

fn request_line() -> Vec<Event> {
    vec![Token0("GET".into()), Token1("/foo".into()), Token2("HTTP/1.1".into())]
}

#[test]
fn scenario_simple_get() {
    let (events, result) = parse(SIMPLE_GET);
    result.unwrap();

    let mut expected = request_line();
    expected.extend([Header("Host".into(), "x".into()), HeaderComplete, Complete(0)]);
    assert_eq!(events, expected);
}

#[test]
fn scenario_content_length() {
    let mut parser = HttpParser::new(ByteArrayEndPoint::new(LENGTH_BODY));
    let (events, result) = run(&mut parser);
    result.unwrap();

    let mut expected = request_line();
    expected.extend([
        Header("Content-Length".into(), "5".into()),
        HeaderComplete,
        Content(0, b"hello".to_vec()),
        Complete(5),
    ]);
    assert_eq!(events, expected);
    assert_eq!(parser.content_length(), Some(ContentLength::Length(5)));
}

#[test]
fn scenario_chunked() {
    let (events, result) = parse(CHUNKED_BODY);
    result.unwrap();
    assert_eq!(&events[events.len() - 3..], [HeaderComplete, Content(0, b"Wiki".to_vec()), Complete(4)]);
}

#[test]
fn scenario_bad_chunk_size() {
    let (events, result) = parse(BAD_CHUNK);
    assert!(matches!(result, Err(ParseError::InvalidChunk { .. })));
    assert_eq!(events.last(), Some(&HeaderComplete));
}

#[test]
fn scenario_folded_header() {
    let (events, result) = parse(FOLDED);
    result.unwrap();

    let mut expected = request_line();
    expected.extend([Header("X-Foo".into(), "a b".into()), HeaderComplete, Complete(0)]);
    assert_eq!(events, expected);
}

#[test]
fn any_split_gives_the_same_events() {
    for wire in [SIMPLE_GET, LENGTH_BODY, CHUNKED_BODY, FOLDED, BAD_CHUNK] {
        let (whole, whole_result) = parse(wire);

        for split in 0..=wire.len() {
            let source = ByteArrayEndPoint::from_pieces([wire[..split].to_vec(), wire[split..].to_vec()]);
            let (events, result) = run(&mut HttpParser::new(source));
            assert_eq!(events, whole, "split at {split}");
            assert_eq!(result.is_ok(), whole_result.is_ok(), "split at {split}");
        }

        // one byte per fill through a small buffer that has to be compacted
        let source = ByteArrayEndPoint::new(wire.to_vec()).with_max_fill(1);
        let (events, _) = run(&mut HttpParser::with_capacity(source, 48));
        assert_eq!(events, whole);
    }
}

#[test]
fn reset_then_parse_matches_a_fresh_parser() {
    let messages = [SIMPLE_GET, LENGTH_BODY, CHUNKED_BODY, FOLDED];
    for first in messages {
        for second in messages {
            let mut parser = HttpParser::new(ByteArrayEndPoint::new([first, second].concat()));
            run(&mut parser).1.unwrap();
            parser.reset();
            let (events, result) = run(&mut parser);
            result.unwrap();

            assert_eq!(events, parse(second).0);
        }
    }
}

#[test]
fn method_tokens_are_case_insensitive() {
    let ordinals: Vec<_> = [&b"GET"[..], b"get", b"Get"].into_iter().map(|m| methods::CACHE.ordinal(m)).collect();
    assert_eq!(ordinals, vec![Some(methods::GET); 3]);

    let (_, result) = parse(b"get / HTTP/1.1\r\n\r\n");
    result.unwrap();
    let mut input = HttpInput::new(ByteArrayEndPoint::new("gEt / HTTP/1.1\r\n\r\n"));
    while input.parse_next().unwrap() != InputEvent::Header {}
    assert_eq!(input.header().unwrap().method(), Some(&b"GET"[..]));
}

#[test]
fn chunk_extensions_do_not_change_content() {
    let plain = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n2\r\nde\r\n0\r\n\r\n";
    let extended = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3;a=b\r\nabc\r\n2 ; c\r\nde\r\n0;last\r\nX-Trailer: t\r\n\r\n";

    let (plain, _) = parse(plain);
    let (extended, result) = parse(extended);
    result.unwrap();
    assert_eq!(plain, extended);
    assert_eq!(extended.last(), Some(&Complete(5)));
}

/// Reads one message through an input, returning its head and content.
fn read_message(wire: &[u8]) -> (HttpHeader, Vec<u8>) {
    let mut input = HttpInput::new(ByteArrayEndPoint::new(wire.to_vec()));
    let mut content = Vec::new();
    loop {
        let event = input.parse_next().unwrap();
        if let Some(chunk) = input.content() {
            content.extend_from_slice(chunk);
        }
        if event.is_terminal() {
            break;
        }
    }
    (input.header().cloned().unwrap(), content)
}

fn fields(header: &HttpHeader) -> Vec<(Vec<u8>, Vec<u8>)> {
    header
        .iter()
        .filter(|f| !f.name().eq_ignore_ascii_case(b"Content-Length") && !f.name().eq_ignore_ascii_case(b"Transfer-Encoding"))
        .map(|f| (f.name().to_vec(), f.value().to_vec()))
        .collect()
}

#[test]
fn output_round_trips_through_input() {
    let bodies: [&[u8]; 4] = [b"", b"x", b"hello world", &[b'z'; 300]];

    for body in bodies {
        for chunked in [false, true] {
            let mut output = HttpOutput::with_capacity(ByteArrayEndPoint::sink(), 512, 64);
            let header = output.header_mut().unwrap();
            header.add("Content-Type", "text/plain");
            header.add("X-Request-Id", "42");
            header.add("Set-Cookie", "a=1");
            header.add("Cache-Control", "no-cache");
            header.add("X-Mode", "Close");
            header.add("X-Encoding", "GZIP, Chunked");
            let expected = fields(output.header());

            if chunked {
                assert!(output.flush().unwrap());
            }
            output.write_all(body).unwrap();
            assert!(output.close().unwrap());
            assert_eq!(output.content_length().unwrap().is_chunked(), chunked || body.len() > 64);

            let wire = output.sink_mut().take_output();
            let (header, content) = read_message(&wire);
            assert_eq!(header.status(), Some(200));
            assert_eq!(fields(&header), expected);
            assert_eq!(header.get("X-Mode"), Some(&b"Close"[..]));
            assert_eq!(content, body, "chunked={chunked}");
        }
    }
}

#[test]
fn chunked_bodies_of_any_length_round_trip() {
    for len in [0_usize, 1, 15, 16, 17, 100, 1000] {
        let body: Vec<u8> = b"abcdefghijklmnopqrstuvwxyz".iter().copied().cycle().take(len).collect();

        for chunk_size in [1, 3, 16, 64] {
            let mut output = HttpOutput::with_capacity(ByteArrayEndPoint::sink(), 256, chunk_size);
            output.set_header(HttpHeader::request("POST", "/upload", "HTTP/1.1")).unwrap();
            assert!(output.flush().unwrap());
            output.write_all(&body).unwrap();
            assert!(output.close().unwrap());

            let wire = output.sink_mut().take_output();
            let mut parser = HttpParser::new(ByteArrayEndPoint::new(wire));
            let (events, result) = run(&mut parser);
            result.unwrap();

            let content: Vec<u8> = events
                .iter()
                .filter_map(|e| match e {
                    Content(_, bytes) => Some(bytes.clone()),
                    _ => None,
                })
                .flatten()
                .collect();
            assert_eq!(content, body, "len={len} chunk_size={chunk_size}");
            assert_eq!(events.last(), Some(&Complete(u64::try_from(len).unwrap())));
        }
    }
}

#[test]
fn pipelined_requests_parse_in_order() {
    let wire = indoc! {"
        GET /one HTTP/1.1
        Host: x

        POST /two HTTP/1.1
        Content-Length: 3

        abcGET /three HTTP/1.0

    "};
    let mut input = HttpInput::new(ByteArrayEndPoint::new(wire.replace('\n', "\r\n")));

    let mut uris = Vec::new();
    loop {
        match input.parse_next().unwrap() {
            InputEvent::Header => uris.push(String::from_utf8_lossy(input.header().unwrap().token1()).into_owned()),
            InputEvent::Eof => input.reset(),
            InputEvent::Closed => break,
            InputEvent::Content | InputEvent::Nop => {}
        }
    }
    assert_eq!(uris, ["/one", "/two", "/three"]);
}

#[test]
fn http_09_request() {
    let (events, result) = parse(b"GET /index.html\r\n");
    result.unwrap();
    assert_eq!(events, vec![Token0("GET".into()), Token1("/index.html".into()), HeaderComplete, Complete(0)]);

    let (header, content) = read_message(b"GET /index.html\r\n");
    assert_eq!(header.version_ordinal(), Some(micro_http_engine::protocol::tokens::versions::HTTP_0_9));
    assert!(content.is_empty());
}

#[test]
fn long_header_value_survives_compaction() {
    let value = "v".repeat(40);
    let wire = format!("GET / HTTP/1.1\r\nX-Short: s\r\nX-Long: {value}\r\nHost: h\r\n\r\n");

    let source = ByteArrayEndPoint::new(wire).with_max_fill(5);
    let (events, result) = run(&mut HttpParser::with_capacity(source, 56));
    result.unwrap();
    assert!(events.contains(&Header("X-Long".into(), value)));
    assert!(events.contains(&Header("Host".into(), "h".into())));
}

#[tokio::test]
async fn keep_alive_exchange_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let end_point = TcpEndPoint::new(stream);
        let mut input = HttpInput::new(end_point.clone());
        let mut output = HttpOutput::new(end_point.clone());

        let mut served = 0;
        loop {
            match input.parse_next().unwrap() {
                InputEvent::Nop if input.is_blocked() => end_point.readable().await.unwrap(),
                InputEvent::Eof => {
                    let uri = input.header().unwrap().token1().to_vec();
                    assert_eq!(output.write(&uri).unwrap(), uri.len());
                    while !output.close().unwrap() {
                        end_point.writable().await.unwrap();
                    }
                    served += 1;
                    input.reset();
                    output.reset();
                }
                InputEvent::Closed => break served,
                InputEvent::Header | InputEvent::Content | InputEvent::Nop => {}
            }
        }
    });

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"GET /one HTTP/1.1\r\nHost: x\r\n\r\nGET /two HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();

    let expected = "HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\n/oneHTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\n/two";
    let mut received = vec![0; expected.len()];
    client.read_exact(&mut received).await.unwrap();
    assert_eq!(String::from_utf8(received).unwrap(), expected);

    drop(client);
    assert_eq!(server.await.unwrap(), 2);
}
