use crate::{Amf0Decoder, Amf0Encoder, Amf0Value, ByteBuffer, CommandError, Result};

// Command names the server accepts
pub const COMMAND_CONNECT: &str = "connect";
pub const COMMAND_CALL: &str = "call";
pub const COMMAND_CREATE_STREAM: &str = "createStream";
pub const COMMAND_PLAY: &str = "play";

// Command names the server emits
pub const RESPONSE_RESULT: &str = "_result";
pub const RESPONSE_ERROR: &str = "_error";
pub const RESPONSE_ON_STATUS: &str = "onStatus";

// Status levels
pub const LEVEL_STATUS: &str = "status";
pub const LEVEL_ERROR: &str = "error";
pub const LEVEL_WARNING: &str = "warning";

// Status codes
pub const CODE_CONNECT_SUCCESS: &str = "NetConnection.Connect.Success";
pub const CODE_PLAY_START: &str = "NetStream.Play.Start";

/// An AMF command message: name, transaction id, command object and the
/// command-specific value tail.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub transaction_id: f64,
    pub object: Amf0Value,
    pub arguments: Vec<Amf0Value>,
}

/// Fields of a `connect` command object the orchestrator consumes
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectParams {
    pub app: String,
    pub object_encoding: f64,
}

/// Arguments of a `play` command
#[derive(Debug, Clone, PartialEq)]
pub struct PlayParams {
    pub stream_name: String,
    pub start: f64,
    pub duration: f64,
    pub reset: bool,
}

impl Command {
    /// Create new command
    pub fn new(name: impl Into<String>, transaction_id: f64) -> Self {
        Command {
            name: name.into(),
            transaction_id,
            object: Amf0Value::Null,
            arguments: Vec::new(),
        }
    }

    /// Create a `_result` response carrying properties and an information
    /// value
    pub fn result(transaction_id: f64, properties: Amf0Value, information: Amf0Value) -> Self {
        Command {
            name: RESPONSE_RESULT.to_string(),
            transaction_id,
            object: properties,
            arguments: vec![information],
        }
    }

    /// Create an `onStatus` notification
    pub fn on_status(level: &str, code: &str, description: &str) -> Self {
        let info = Amf0Value::Object(vec![
            ("level".to_string(), Amf0Value::String(level.to_string())),
            ("code".to_string(), Amf0Value::String(code.to_string())),
            (
                "description".to_string(),
                Amf0Value::String(description.to_string()),
            ),
        ]);

        Command {
            name: RESPONSE_ON_STATUS.to_string(),
            transaction_id: 0.0,
            object: Amf0Value::Null,
            arguments: vec![info],
        }
    }

    /// Decode a command payload: name, transaction id, then the tail.
    ///
    /// Only the commands this server acts on decode successfully; any other
    /// name is rejected up front.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(data.to_vec());
        let mut decoder = Amf0Decoder::new(&mut buffer);

        let name = decoder.read_string()?;
        let transaction_id = decoder.read_number()?;

        match name.as_str() {
            COMMAND_CONNECT | COMMAND_CALL | COMMAND_CREATE_STREAM | COMMAND_PLAY => {}
            _ => return Err(CommandError::UnsupportedCommand(name).into()),
        }

        // Command object (an object for connect/call, null for the rest),
        // then any trailing arguments
        let object = if decoder.has_remaining() {
            decoder.decode()?
        } else {
            Amf0Value::Null
        };

        let mut arguments = Vec::new();
        while decoder.has_remaining() {
            arguments.push(decoder.decode()?);
        }

        Ok(Command {
            name,
            transaction_id,
            object,
            arguments,
        })
    }

    /// Encode command to an AMF0 payload
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut encoder = Amf0Encoder::new();

        encoder.encode(&Amf0Value::String(self.name.clone()))?;
        encoder.encode(&Amf0Value::Number(self.transaction_id))?;
        encoder.encode(&self.object)?;
        for argument in &self.arguments {
            encoder.encode(argument)?;
        }

        Ok(encoder.into_bytes())
    }

    /// Extract the fields of a `connect` command object
    pub fn connect_params(&self) -> Result<ConnectParams> {
        if self.object.as_properties().is_none() {
            return Err(CommandError::TypeMismatch("commandObject", "object").into());
        }

        let app = self
            .object
            .get_property("app")
            .ok_or(CommandError::MissingField("app"))?
            .as_str()
            .ok_or(CommandError::TypeMismatch("app", "string"))?
            .to_string();

        let object_encoding = match self.object.get_property("objectEncoding") {
            Some(value) => value
                .as_number()
                .ok_or(CommandError::TypeMismatch("objectEncoding", "number"))?,
            None => 0.0,
        };

        Ok(ConnectParams {
            app,
            object_encoding,
        })
    }

    /// Extract the arguments of a `play` command
    pub fn play_params(&self) -> Result<PlayParams> {
        let stream_name = self
            .arguments
            .first()
            .ok_or(CommandError::MissingField("streamName"))?
            .as_str()
            .ok_or(CommandError::TypeMismatch("streamName", "string"))?
            .to_string();

        let start = self
            .arguments
            .get(1)
            .and_then(|v| v.as_number())
            .unwrap_or(0.0);

        let duration = self
            .arguments
            .get(2)
            .and_then(|v| v.as_number())
            .unwrap_or(-1.0);

        let reset = self
            .arguments
            .get(3)
            .and_then(|v| v.as_boolean())
            .unwrap_or(true);

        Ok(PlayParams {
            stream_name,
            start,
            duration,
            reset,
        })
    }

    #[cfg(test)]
    pub(crate) fn decode_test_fixture() -> Command {
        Command {
            name: COMMAND_CONNECT.to_string(),
            transaction_id: 1.0,
            object: Amf0Value::Object(vec![
                ("app".to_string(), Amf0Value::String("live".to_string())),
                ("objectEncoding".to_string(), Amf0Value::Number(0.0)),
            ]),
            arguments: Vec::new(),
        }
    }
}
