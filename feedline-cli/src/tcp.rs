//! TCP transport speaking the gateway's length-prefixed framing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use feedline_core::codec::{self, HEADER_LEN};
use feedline_core::{
    Encoder, FieldCodec, Inbox, ReaderHandle, Transport, encode_fields, read_fields,
};
use feedline_types::{ConnectionParams, FeedlineError, OutboundRequest};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc, oneshot};

/// Range of protocol versions announced in the handshake.
pub const CLIENT_VERSIONS: &str = "v100..176";

/// Prefix sent before the version announcement.
pub const API_PREFIX: &[u8] = b"API\0";

/// Upper bound on connect plus handshake.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

const NAME: &str = "tcp";

fn io_error(e: &std::io::Error) -> FeedlineError {
    FeedlineError::transport(NAME, e.to_string())
}

/// Read one length-prefixed frame and return its payload.
///
/// # Errors
/// `OversizedFrame` when the header announces more than `max_len` bytes,
/// `Transport` on I/O failure or end of stream.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, FeedlineError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await.map_err(|e| io_error(&e))?;
    let len = codec::frame_len(header);
    codec::check_frame_len(len, max_len)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|e| io_error(&e))?;
    Ok(payload)
}

/// Encode `fields` as one frame and write it.
///
/// # Errors
/// `OversizedFrame` for an unframeable payload, `Transport` on I/O failure.
pub async fn write_frame<W, S>(writer: &mut W, fields: &[S]) -> Result<(), FeedlineError>
where
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    let bytes = codec::frame(&encode_fields(fields))?;
    writer.write_all(&bytes).await.map_err(|e| io_error(&e))
}

struct Handshake {
    server_version: i32,
    connection_time: String,
}

async fn handshake(
    stream: &mut TcpStream,
    client_id: i32,
    max_len: usize,
) -> Result<Handshake, FeedlineError> {
    let mut hello = API_PREFIX.to_vec();
    hello.extend(codec::frame(CLIENT_VERSIONS.as_bytes())?);
    stream.write_all(&hello).await.map_err(|e| io_error(&e))?;

    let reply = read_fields(&read_frame(stream, max_len).await?)?;
    let server_version = reply
        .first()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| FeedlineError::malformed(format!("handshake reply {reply:?}")))?;
    let connection_time = reply.get(1).cloned().unwrap_or_default();

    write_frame(stream, FieldCodec::start_api(client_id).as_slice()).await?;
    Ok(Handshake {
        server_version,
        connection_time,
    })
}

/// Why the last reader stopped, if it stopped on a protocol violation.
type ReaderFailure = Arc<std::sync::Mutex<Option<FeedlineError>>>;

fn spawn_reader(
    read: OwnedReadHalf,
    tx: mpsc::Sender<Vec<u8>>,
    max_len: usize,
    connected: Arc<AtomicBool>,
    failure: ReaderFailure,
) -> ReaderHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let mut read = BufReader::new(read);
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                frame = read_frame(&mut read, max_len) => match frame {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(e) if e.is_protocol_violation() => {
                        tracing::error!(error = %e, "dropping gateway connection");
                        *failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(e);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "gateway reader stopped");
                        break;
                    }
                },
            }
        }
        connected.store(false, Ordering::SeqCst);
    });
    ReaderHandle::new(task, stop_tx)
}

struct Connection {
    writer: OwnedWriteHalf,
    reader: ReaderHandle,
}

/// [`Transport`] over a TCP socket.
///
/// `connect` performs the version handshake, sends the start-API message
/// with the client id and starts a reader task feeding the inbound queue.
/// A header announcing more than `max_frame_len` bytes ends the reader,
/// which closes the queue; [`TcpTransport::reader_error`] then reports it.
pub struct TcpTransport {
    encoder: Arc<dyn Encoder>,
    capacity: usize,
    max_frame_len: usize,
    conn: Mutex<Option<Connection>>,
    connected: Arc<AtomicBool>,
    failure: ReaderFailure,
}

impl TcpTransport {
    /// Transport with an inbound queue of `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize, max_frame_len: usize) -> Self {
        Self {
            encoder: Arc::new(FieldCodec),
            capacity: capacity.max(1),
            max_frame_len,
            conn: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
            failure: Arc::default(),
        }
    }

    /// The protocol violation that ended the current connection's reader.
    #[must_use]
    pub fn reader_error(&self) -> Option<FeedlineError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the request encoder.
    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = encoder;
        self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn connect(&self, params: &ConnectionParams) -> Result<Inbox, FeedlineError> {
        let mut conn = self.conn.lock().await;
        if let Some(stale) = conn.take() {
            stale.reader.abort();
        }

        let opened = tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
            let mut stream = TcpStream::connect((params.host.as_str(), params.port))
                .await
                .map_err(|e| {
                    FeedlineError::transport(
                        NAME,
                        format!("connect to {}:{}: {e}", params.host, params.port),
                    )
                })?;
            let _ = stream.set_nodelay(true);
            let hs = handshake(&mut stream, params.client_id, self.max_frame_len).await?;
            Ok::<_, FeedlineError>((stream, hs))
        })
        .await
        .map_err(|_| FeedlineError::transport(NAME, "connect timed out"))?;
        let (stream, hs) = opened?;
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!(
            server_version = hs.server_version,
            connection_time = %hs.connection_time,
            "gateway handshake complete"
        );

        let (read, writer) = stream.into_split();
        let (tx, rx) = mpsc::channel(self.capacity);
        self.connected.store(true, Ordering::SeqCst);
        let reader = spawn_reader(
            read,
            tx,
            self.max_frame_len,
            Arc::clone(&self.connected),
            Arc::clone(&self.failure),
        );
        *conn = Some(Connection { writer, reader });
        Ok(rx)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, request: &OutboundRequest) -> Result<(), FeedlineError> {
        let mut conn = self.conn.lock().await;
        let Some(open) = conn.as_mut() else {
            return Err(FeedlineError::NotConnected);
        };
        if !self.is_connected() {
            return Err(FeedlineError::NotConnected);
        }
        let fields = self.encoder.encode(request);
        let sent = write_frame(&mut open.writer, fields.as_slice()).await;
        if sent.is_err() {
            self.connected.store(false, Ordering::SeqCst);
        }
        sent
    }

    async fn disconnect(&self) {
        let taken = self.conn.lock().await.take();
        self.connected.store(false, Ordering::SeqCst);
        if let Some(mut open) = taken {
            let _ = open.writer.shutdown().await;
            open.reader.stop().await;
        }
    }
}
