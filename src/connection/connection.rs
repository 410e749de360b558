use crate::chunk::{ChunkHeader, ChunkReader, ChunkWriter, DEFAULT_CHUNK_SIZE};
use crate::connection::ConnectionState;
use crate::handshake;
use crate::message::{
    Command, RtmpMessage, UserControlEvent, CODE_CONNECT_SUCCESS, CODE_PLAY_START,
    COMMAND_CALL, COMMAND_CONNECT, COMMAND_CREATE_STREAM, COMMAND_PLAY, LEVEL_STATUS,
};
use crate::server::ServerConfig;
use crate::{Amf0Value, ProtocolError, Result};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufStream};
use tracing::{debug, info, trace};

/// Per-connection protocol orchestrator.
///
/// Owns the socket and all protocol state for one peer: chunk reader and
/// writer, negotiated sizes, sequence counters, the application name and the
/// allocated stream ids. Everything runs on the connection's own task, so no
/// locking is involved.
pub struct Connection<S> {
    io: BufStream<S>,

    /// De-chunker; carries the per-CSID running headers and read counter
    reader: ChunkReader,

    /// Chunker for responses; carries the write counter
    writer: ChunkWriter,

    state: ConnectionState,

    config: Arc<ServerConfig>,

    /// Application name from the connect command
    app_name: Option<String>,

    /// Object encoding echoed back in the connect result
    object_encoding: f64,

    /// Next message stream id handed out by createStream; 0 is the
    /// control stream
    next_stream_id: u32,

    /// How many inbound bytes may pass before we owe the peer an Ack
    window_ack_size: u32,

    /// Read sequence number covered by our last outbound Ack
    last_acknowledged: u32,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: Arc<ServerConfig>) -> Self {
        let window_ack_size = config.window_ack_size;
        Connection {
            io: BufStream::new(stream),
            reader: ChunkReader::new(),
            writer: ChunkWriter::new(),
            state: ConnectionState::Fresh,
            config,
            app_name: None,
            object_encoding: 0.0,
            next_stream_id: 1,
            window_ack_size,
            last_acknowledged: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Application name supplied by the peer, once connected
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    /// Drive the connection until the peer disconnects or a protocol error
    /// surfaces. The socket is dead either way when this returns.
    pub async fn run(&mut self) -> Result<()> {
        let result = self.serve().await;
        self.state = ConnectionState::Closed;
        result
    }

    async fn serve(&mut self) -> Result<()> {
        self.state = ConnectionState::Handshaking;
        let kind = handshake::serve(&mut self.io).await?;
        debug!(?kind, "handshake complete");
        self.state = ConnectionState::AwaitingConnect;

        loop {
            let (header, body) = self.reader.read_message(&mut self.io).await?;
            let message = RtmpMessage::decode(&header, &body)?;
            drop(body); // back to the pool before any response goes out

            self.dispatch(message, &header).await?;
            self.maybe_acknowledge().await?;
        }
    }

    async fn dispatch(&mut self, message: RtmpMessage, header: &ChunkHeader) -> Result<()> {
        match message {
            RtmpMessage::SetChunkSize(size) => {
                self.reader.set_chunk_size(size)?;
                debug!(size, "peer changed chunk size");
            }
            RtmpMessage::Abort(csid) => {
                self.reader.abort(csid);
                debug!(csid, "peer aborted chunk stream");
            }
            RtmpMessage::Acknowledgement(sequence) => {
                trace!(sequence, "peer acknowledged");
            }
            RtmpMessage::WindowAckSize(size) => {
                self.window_ack_size = size;
                debug!(size, "peer window acknowledgement size");
            }
            RtmpMessage::SetPeerBandwidth { size, limit_type } => {
                debug!(size, limit_type, "peer bandwidth");
            }
            RtmpMessage::UserControl(event) => {
                self.handle_user_control(event).await?;
            }
            RtmpMessage::Audio(payload) => {
                self.require_media_state("Audio")?;
                trace!(
                    len = payload.len(),
                    timestamp = header.timestamp,
                    "audio discarded"
                );
            }
            RtmpMessage::Video(payload) => {
                self.require_media_state("Video")?;
                trace!(
                    len = payload.len(),
                    timestamp = header.timestamp,
                    "video discarded"
                );
            }
            RtmpMessage::Command(command) => {
                self.handle_command(command, header.message_stream_id).await?;
            }
        }
        Ok(())
    }

    async fn handle_user_control(&mut self, event: UserControlEvent) -> Result<()> {
        match event {
            UserControlEvent::PingRequest(timestamp) => {
                self.send_message(&RtmpMessage::UserControl(UserControlEvent::PingResponse(
                    timestamp,
                )))
                .await?;
            }
            other => debug!(?other, "user control event"),
        }
        Ok(())
    }

    async fn handle_command(&mut self, command: Command, stream_id: u32) -> Result<()> {
        // The first command on a fresh session must be connect
        if self.state == ConnectionState::AwaitingConnect {
            if command.name == COMMAND_CONNECT {
                return self.on_connect(command).await;
            }
            return Err(self.unexpected("Command"));
        }

        if !self.state.is_connected() {
            return Err(self.unexpected("Command"));
        }

        let name = command.name.clone();
        match name.as_str() {
            COMMAND_CREATE_STREAM => self.on_create_stream(command).await,
            COMMAND_PLAY => self.on_play(command, stream_id).await,
            COMMAND_CALL => {
                debug!(
                    transaction_id = command.transaction_id,
                    "call command ignored"
                );
                Ok(())
            }
            // connect twice, or anything else the message layer let through
            _ => Err(self.unexpected("Command")),
        }
    }

    /// Answer the connect command: window, bandwidth, stream begin, then
    /// the `_result`
    async fn on_connect(&mut self, command: Command) -> Result<()> {
        let params = command.connect_params()?;
        info!(app = %params.app, "client connecting");

        self.app_name = Some(params.app);
        self.object_encoding = params.object_encoding;

        // A non-default outbound chunk size has to be announced before any
        // sizable response
        if self.config.chunk_size != DEFAULT_CHUNK_SIZE {
            self.send_message(&RtmpMessage::SetChunkSize(self.config.chunk_size))
                .await?;
            self.writer.set_chunk_size(self.config.chunk_size)?;
        }

        self.send_message(&RtmpMessage::WindowAckSize(self.config.window_ack_size))
            .await?;
        self.send_message(&RtmpMessage::SetPeerBandwidth {
            size: self.config.peer_bandwidth,
            limit_type: self.config.peer_bandwidth_limit_type,
        })
        .await?;
        self.send_message(&RtmpMessage::UserControl(UserControlEvent::StreamBegin(0)))
            .await?;

        let properties = Amf0Value::Object(vec![
            (
                "fmsVer".to_string(),
                Amf0Value::String(self.config.fms_version.clone()),
            ),
            ("capabilities".to_string(), Amf0Value::Number(31.0)),
            ("mode".to_string(), Amf0Value::Number(1.0)),
        ]);
        let information = Amf0Value::Object(vec![
            (
                "level".to_string(),
                Amf0Value::String(LEVEL_STATUS.to_string()),
            ),
            (
                "code".to_string(),
                Amf0Value::String(CODE_CONNECT_SUCCESS.to_string()),
            ),
            (
                "description".to_string(),
                Amf0Value::String("Connection succeeded".to_string()),
            ),
            (
                "objectEncoding".to_string(),
                Amf0Value::Number(self.object_encoding),
            ),
        ]);
        let result = Command::result(command.transaction_id, properties, information);
        self.send_message(&RtmpMessage::Command(result)).await?;

        self.state = ConnectionState::Connected;
        Ok(())
    }

    async fn on_create_stream(&mut self, command: Command) -> Result<()> {
        let stream_id = self.next_stream_id;
        self.next_stream_id += 1;
        debug!(stream_id, "stream created");

        let result = Command::result(
            command.transaction_id,
            Amf0Value::Null,
            Amf0Value::Number(stream_id as f64),
        );
        self.send_message(&RtmpMessage::Command(result)).await
    }

    async fn on_play(&mut self, command: Command, stream_id: u32) -> Result<()> {
        let params = command.play_params()?;
        info!(stream = %params.stream_name, stream_id, "play");

        self.send_message(&RtmpMessage::UserControl(UserControlEvent::StreamBegin(
            stream_id,
        )))
        .await?;

        let status = Command::on_status(
            LEVEL_STATUS,
            CODE_PLAY_START,
            &format!("Started playing {}", params.stream_name),
        );
        self.send_message(&RtmpMessage::Command(status)).await?;

        self.state = ConnectionState::Streaming;
        Ok(())
    }

    /// Emit an Ack once a window's worth of bytes has been read since the
    /// last one
    async fn maybe_acknowledge(&mut self) -> Result<()> {
        let sequence = self.reader.sequence_number();
        if self.window_ack_size > 0
            && sequence.wrapping_sub(self.last_acknowledged) >= self.window_ack_size
        {
            self.last_acknowledged = sequence;
            self.send_message(&RtmpMessage::Acknowledgement(sequence))
                .await?;
        }
        Ok(())
    }

    /// Serialize and emit one message as chunks
    pub async fn send_message(&mut self, message: &RtmpMessage) -> Result<()> {
        let (type_id, payload) = message.encode()?;
        self.writer
            .write_message(&mut self.io, type_id, &payload)
            .await
    }

    fn require_media_state(&self, kind: &'static str) -> Result<()> {
        if !self.state.accepts_media() {
            return Err(self.unexpected(kind));
        }
        Ok(())
    }

    fn unexpected(&self, message: &'static str) -> crate::Error {
        ProtocolError::UnexpectedMessageInState {
            message,
            state: self.state.as_str(),
        }
        .into()
    }
}
