use crate::amf::amf0::{markers, Amf0Value};
use crate::{AmfError, ByteBuffer, Result};

/// Streaming AMF0 reader over a byte buffer.
pub struct Amf0Decoder<'a> {
    buffer: &'a mut ByteBuffer,
}

impl<'a> Amf0Decoder<'a> {
    pub fn new(buffer: &'a mut ByteBuffer) -> Self {
        Amf0Decoder { buffer }
    }

    /// Check if decoder has remaining data to decode
    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    /// Decode one value: a type marker followed by its payload
    pub fn decode(&mut self) -> Result<Amf0Value> {
        let marker = self.read_u8()?;
        match marker {
            markers::NUMBER => self.decode_number(),
            markers::BOOLEAN => self.decode_boolean(),
            markers::STRING => self.decode_string(),
            markers::OBJECT => self.decode_object(),
            markers::NULL => Ok(Amf0Value::Null),
            markers::UNDEFINED => Ok(Amf0Value::Undefined),
            markers::ECMA_ARRAY => self.decode_ecma_array(),
            markers::OBJECT_END => Ok(Amf0Value::ObjectEnd),
            markers::DATE => self.decode_date(),
            markers::LONG_STRING => self.decode_long_string(),
            // MovieClip, Reference, StrictArray, Unsupported, RecordSet,
            // XmlDocument and anything above are deliberately rejected
            other => Err(AmfError::UnsupportedType(other).into()),
        }
    }

    /// Decode a value that must be a string (marker included)
    pub fn read_string(&mut self) -> Result<String> {
        match self.decode()? {
            Amf0Value::String(s) | Amf0Value::LongString(s) => Ok(s),
            other => Err(AmfError::UnsupportedType(marker_of(&other)).into()),
        }
    }

    /// Decode a value that must be a number (marker included)
    pub fn read_number(&mut self) -> Result<f64> {
        match self.decode()? {
            Amf0Value::Number(n) => Ok(n),
            other => Err(AmfError::UnsupportedType(marker_of(&other)).into()),
        }
    }

    fn decode_number(&mut self) -> Result<Amf0Value> {
        let value = self
            .buffer
            .read_f64_be()
            .map_err(|_| AmfError::ShortRead)?;
        Ok(Amf0Value::Number(value))
    }

    fn decode_boolean(&mut self) -> Result<Amf0Value> {
        let value = self.read_u8()? != 0;
        Ok(Amf0Value::Boolean(value))
    }

    fn decode_string(&mut self) -> Result<Amf0Value> {
        let len = self
            .buffer
            .read_u16_be()
            .map_err(|_| AmfError::ShortRead)? as usize;
        Ok(Amf0Value::String(self.read_utf8(len)?))
    }

    fn decode_long_string(&mut self) -> Result<Amf0Value> {
        let len = self
            .buffer
            .read_u32_be()
            .map_err(|_| AmfError::ShortRead)? as usize;
        Ok(Amf0Value::LongString(self.read_utf8(len)?))
    }

    fn decode_object(&mut self) -> Result<Amf0Value> {
        Ok(Amf0Value::Object(self.decode_properties()?))
    }

    fn decode_ecma_array(&mut self) -> Result<Amf0Value> {
        // The declared count is advisory; the end sentinel decides
        let count = self
            .buffer
            .read_u32_be()
            .map_err(|_| AmfError::ShortRead)?;
        let properties = self.decode_properties()?;
        Ok(Amf0Value::EcmaArray { count, properties })
    }

    /// Read `(u16 key, value)` pairs up to the `00 00 09` sentinel
    fn decode_properties(&mut self) -> Result<Vec<(String, Amf0Value)>> {
        let mut properties = Vec::new();
        loop {
            let key_len = self
                .buffer
                .read_u16_be()
                .map_err(|_| AmfError::ShortRead)? as usize;
            if key_len == 0 {
                let marker = self.read_u8()?;
                if marker != markers::OBJECT_END {
                    return Err(AmfError::UnsupportedType(marker).into());
                }
                break;
            }
            let key = self.read_utf8(key_len)?;
            let value = self.decode()?;
            properties.push((key, value));
        }
        Ok(properties)
    }

    fn decode_date(&mut self) -> Result<Amf0Value> {
        let millis = self
            .buffer
            .read_f64_be()
            .map_err(|_| AmfError::ShortRead)?;
        let timezone = self
            .buffer
            .read_i16_be()
            .map_err(|_| AmfError::ShortRead)?;
        Ok(Amf0Value::Date { millis, timezone })
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.buffer.read_u8().map_err(|_| AmfError::ShortRead)?)
    }

    fn read_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self
            .buffer
            .read_bytes(len)
            .map_err(|_| AmfError::ShortRead)?;
        Ok(String::from_utf8(bytes).map_err(|_| AmfError::BadString)?)
    }
}

/// The wire marker a decoded value came from, used in type-mismatch errors
fn marker_of(value: &Amf0Value) -> u8 {
    match value {
        Amf0Value::Number(_) => markers::NUMBER,
        Amf0Value::Boolean(_) => markers::BOOLEAN,
        Amf0Value::String(_) => markers::STRING,
        Amf0Value::Object(_) => markers::OBJECT,
        Amf0Value::Null => markers::NULL,
        Amf0Value::Undefined => markers::UNDEFINED,
        Amf0Value::EcmaArray { .. } => markers::ECMA_ARRAY,
        Amf0Value::ObjectEnd => markers::OBJECT_END,
        Amf0Value::Date { .. } => markers::DATE,
        Amf0Value::LongString(_) => markers::LONG_STRING,
    }
}
