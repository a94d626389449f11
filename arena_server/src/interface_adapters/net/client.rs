// TCP line sessions for external clients (players, spectators, bots).

use crate::domain::MoveIntent;
use crate::interface_adapters::protocol::{ProtocolError, encode_notice, parse_display_name};
use crate::use_cases::{Arena, ConnectionId, Notice, Outbox};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

/// Limits applied to every client session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Time allowed for the display name line.
    pub handshake_timeout: Duration,
    /// Longest accepted inbound line, excluding the newline.
    pub max_line_bytes: usize,
    /// Outbound lines buffered per connection before the oldest is dropped.
    pub outbound_queue: usize,
}

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Io(std::io::Error),
    HandshakeTimeout,
    InvalidName,
    ClosedBeforeHandshake,
}

impl From<std::io::Error> for NetError {
    fn from(e: std::io::Error) -> Self {
        NetError::Io(e)
    }
}

/// Accepts clients forever; accept errors are logged and retried.
pub async fn serve_clients(
    listener: TcpListener,
    arena: Arc<Arena>,
    settings: SessionSettings,
) -> std::io::Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                // Per-connection accept failures (e.g. EMFILE) should not stop the server.
                warn!(error = %e, "failed to accept client");
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }
        };

        let span = info_span!("conn", conn_id = tracing::field::Empty, %peer);
        tokio::spawn(handle_client(stream, peer, arena.clone(), settings.clone()).instrument(span));
    }
}

async fn handle_client(stream: TcpStream, peer: SocketAddr, arena: Arc<Arena>, settings: SessionSettings) {
    match run_session(stream, peer, &arena, &settings).await {
        Ok(()) => {}
        Err(NetError::ClosedBeforeHandshake) => {
            info!("client disconnected before handshake");
        }
        Err(e) => warn!(error = ?e, "client session ended with error"),
    }
}

enum Inbound {
    Line(String),
    Malformed(ProtocolError),
    Closed,
}

/// Reads one newline-terminated line without buffering more than `limit` bytes of it.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> std::io::Result<Inbound>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut overflow = false;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            // A partial line at EOF is discarded.
            return Ok(Inbound::Closed);
        }

        let (chunk, done) = match available.iter().position(|byte| *byte == b'\n') {
            Some(end) => (end, true),
            None => (available.len(), false),
        };
        if !overflow {
            buf.extend_from_slice(&available[..chunk]);
            if buf.len() > limit {
                overflow = true;
                buf.clear();
            }
        }
        reader.consume(if done { chunk + 1 } else { chunk });

        if done {
            break;
        }
    }

    if overflow {
        return Ok(Inbound::Malformed(ProtocolError::TooLong { limit }));
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    match String::from_utf8(std::mem::take(buf)) {
        Ok(line) => Ok(Inbound::Line(line)),
        Err(_) => Ok(Inbound::Malformed(ProtocolError::InvalidUtf8)),
    }
}

async fn send_error_and_close(writer: &mut OwnedWriteHalf, msg: &str) -> std::io::Result<()> {
    let notice = Notice::Error {
        msg: msg.to_string(),
    };
    if let Ok(line) = encode_notice(&notice) {
        writer.write_all(line.as_bytes()).await?;
    }
    writer.shutdown().await
}

async fn read_handshake<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> Result<String, NetError>
where
    R: AsyncBufRead + Unpin,
{
    match read_line(reader, buf, limit).await? {
        Inbound::Closed => Err(NetError::ClosedBeforeHandshake),
        Inbound::Malformed(_) => Err(NetError::InvalidName),
        Inbound::Line(line) => parse_display_name(&line).ok_or(NetError::InvalidName),
    }
}

struct SessionCtx {
    connection_id: ConnectionId,
    outbox: Outbox,

    msgs_in: u64,
    bytes_in: u64,
    invalid_lines: u64,
    rejected_moves: u64,

    last_invalid_log: Instant,
    last_rejected_log: Instant,
}

#[derive(Debug, Default)]
struct WriteStats {
    msgs_out: u64,
    bytes_out: u64,
}

async fn run_session(
    stream: TcpStream,
    peer: SocketAddr,
    arena: &Arena,
    settings: &SessionSettings,
) -> Result<(), NetError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::new();

    // The first line names the client; nothing else is accepted before it.
    let name = match timeout(
        settings.handshake_timeout,
        read_handshake(&mut reader, &mut buf, settings.max_line_bytes),
    )
    .await
    {
        Ok(Ok(name)) => name,
        Ok(Err(NetError::InvalidName)) => {
            let _ = send_error_and_close(&mut write_half, "a display name is required").await;
            return Err(NetError::InvalidName);
        }
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            let _ = send_error_and_close(&mut write_half, "handshake timeout").await;
            return Err(NetError::HandshakeTimeout);
        }
    };

    let outbox = Outbox::new(settings.outbound_queue);
    let handle = arena.connect(Arc::from(name), peer, outbox.clone()).await;
    tracing::Span::current().record("conn_id", handle.connection_id);
    info!(name = %handle.name, "client connected");

    let writer = tokio::spawn(write_loop(write_half, outbox.clone()).in_current_span());

    let now = Instant::now() - LOG_THROTTLE;
    let mut ctx = SessionCtx {
        connection_id: handle.connection_id,
        outbox,
        msgs_in: 0,
        bytes_in: 0,
        invalid_lines: 0,
        rejected_moves: 0,
        last_invalid_log: now,
        last_rejected_log: now,
    };

    let result = read_loop(&mut reader, &mut buf, arena, settings, &mut ctx).await;

    // Closing first means a subscribe racing this disconnect is refused by the room.
    ctx.outbox.close();
    arena.disconnect(ctx.connection_id).await;
    let written = match writer.await {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "writer task failed");
            WriteStats::default()
        }
    };

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = written.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = written.bytes_out,
        invalid_lines = ctx.invalid_lines,
        rejected_moves = ctx.rejected_moves,
        dropped = ctx.outbox.dropped(),
        "connection stats"
    );
    info!("client disconnected");
    result
}

async fn read_loop<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    arena: &Arena,
    settings: &SessionSettings,
    ctx: &mut SessionCtx,
) -> Result<(), NetError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let line = match read_line(reader, buf, settings.max_line_bytes).await? {
            Inbound::Closed => return Ok(()),
            Inbound::Malformed(err) => {
                ctx.msgs_in += 1;
                report_malformed(ctx, err);
                continue;
            }
            Inbound::Line(line) => line,
        };
        ctx.msgs_in += 1;
        ctx.bytes_in += line.len() as u64 + 1;

        let intent = match line.parse::<MoveIntent>() {
            Ok(intent) => intent,
            Err(err) => {
                report_malformed(ctx, err);
                continue;
            }
        };

        if let Err(rejection) = arena.submit_intent(ctx.connection_id, intent).await {
            ctx.rejected_moves += 1;
            if should_log(&mut ctx.last_rejected_log) {
                warn!(reason = rejection.reason(), "move rejected");
            }
            ctx.outbox.push(Notice::Rejected(rejection));
        }
    }
}

fn report_malformed(ctx: &mut SessionCtx, err: ProtocolError) {
    ctx.invalid_lines += 1;
    if should_log(&mut ctx.last_invalid_log) {
        warn!(error = %err, count = ctx.invalid_lines, "malformed client line");
    }
    ctx.outbox.push(Notice::Error {
        msg: err.to_string(),
    });
}

async fn write_loop(mut writer: OwnedWriteHalf, outbox: Outbox) -> WriteStats {
    let mut stats = WriteStats::default();
    while let Some(notice) = outbox.recv().await {
        let line = match encode_notice(&notice) {
            Ok(line) => line,
            Err(e) => {
                error!(error = ?e, "failed to serialize notice");
                continue;
            }
        };
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            debug!(error = %e, "client write failed");
            // Stop queueing for a peer that is gone.
            outbox.close();
            break;
        }
        stats.msgs_out += 1;
        stats.bytes_out += line.len() as u64;
    }
    if let Err(e) = writer.shutdown().await {
        debug!(error = %e, "socket shutdown error");
    }
    stats
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}
