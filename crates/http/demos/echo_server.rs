//! Echoes every request body back to the client.
//!
//! ```text
//! cargo run --example echo_server
//! curl -v --data-binary 'hello' http://127.0.0.1:8080/
//! ```
//!
//! Requests are read with [`HttpInput`] and answered with [`HttpOutput`] over
//! a shared non-blocking [`TcpEndPoint`]; the task only awaits readiness when
//! the engine reports it could not make progress.

use micro_http_engine::connection::{HttpInput, HttpOutput};
use micro_http_engine::io::TcpEndPoint;
use micro_http_engine::protocol::tokens::{methods, versions};
use micro_http_engine::protocol::{HttpError, InputEvent, ParseError, SendError};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        tokio::spawn(async move {
            match serve(tcp_stream).await {
                Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
                Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
            }
        });
    }
}

async fn serve(tcp_stream: TcpStream) -> Result<(), HttpError> {
    let end_point = TcpEndPoint::new(tcp_stream);
    let mut input = HttpInput::new(end_point.clone());
    let mut output = HttpOutput::new(end_point.clone());

    loop {
        let keep_alive = match exchange(&end_point, &mut input, &mut output).await {
            Ok(Some(keep_alive)) => keep_alive,
            Ok(None) => return Ok(()),
            Err(HttpError::RequestError { source }) => {
                if !output.is_committed() {
                    warn!(cause = %source, "bad request");
                    output.reset();
                    let header = output.header_mut()?;
                    header.set_status(400);
                    header.add("Connection", "close");
                    finish(&end_point, &mut output).await?;
                }
                return Err(source.into());
            }
            Err(e) => return Err(e),
        };

        if !keep_alive {
            return Ok(());
        }
        input.reset();
        output.reset();
    }
}

/// Serves one request. Returns whether the connection can be reused, or
/// `None` when the client went away before sending one.
async fn exchange(
    end_point: &TcpEndPoint,
    input: &mut HttpInput<TcpEndPoint>,
    output: &mut HttpOutput<TcpEndPoint>,
) -> Result<Option<bool>, HttpError> {
    let mut persistent = false;
    loop {
        match input.parse_next()? {
            InputEvent::Header => {
                let Some(request) = input.header() else { continue };
                info!(
                    method = %String::from_utf8_lossy(request.token0()),
                    uri = %String::from_utf8_lossy(request.token1()),
                    "receiving request"
                );
                persistent = request.is_persistent();

                let response = output.header_mut()?;
                if request.version_ordinal() == Some(versions::HTTP_1_0) {
                    response.set_token0(b"HTTP/1.0");
                    if persistent {
                        response.add("Connection", "keep-alive");
                    }
                }
                if let Some(content_type) = request.get("Content-Type") {
                    response.add("Content-Type", content_type);
                }
                if let Some(length) = request.get("Content-Length") {
                    response.add("Content-Length", length);
                }
                output.set_head_response(request.method_ordinal() == Some(methods::HEAD));
            }
            InputEvent::Content => {
                let mut content = input.content().unwrap_or_default();
                while !content.is_empty() {
                    let len = output.write(content)?;
                    if len == 0 {
                        end_point.writable().await.map_err(SendError::io)?;
                    }
                    content = &content[len..];
                }
            }
            InputEvent::Eof => break,
            InputEvent::Closed => return Ok(None),
            InputEvent::Nop => {
                if input.is_blocked() {
                    end_point.readable().await.map_err(ParseError::io)?;
                }
            }
        }
    }

    finish(end_point, output).await?;
    Ok(Some(persistent && output.is_persistent()))
}

async fn finish(end_point: &TcpEndPoint, output: &mut HttpOutput<TcpEndPoint>) -> Result<(), SendError> {
    while !output.close()? {
        end_point.writable().await.map_err(SendError::io)?;
    }
    Ok(())
}
