use crate::amf::amf0::{markers, Amf0Value};
use crate::ByteBuffer;
use crate::Result;

/// Streaming AMF0 writer; emission is symmetric with `Amf0Decoder`.
pub struct Amf0Encoder {
    buffer: ByteBuffer,
}

impl Amf0Encoder {
    pub fn new() -> Self {
        Amf0Encoder {
            buffer: ByteBuffer::with_capacity(1024),
        }
    }

    pub fn encode(&mut self, value: &Amf0Value) -> Result<()> {
        match value {
            Amf0Value::Number(n) => self.encode_number(*n),
            Amf0Value::Boolean(b) => self.encode_boolean(*b),
            Amf0Value::String(s) => self.encode_string(s),
            Amf0Value::Object(props) => self.encode_object(props),
            Amf0Value::Null => self.encode_marker(markers::NULL),
            Amf0Value::Undefined => self.encode_marker(markers::UNDEFINED),
            Amf0Value::EcmaArray { count, properties } => {
                self.encode_ecma_array(*count, properties)
            }
            Amf0Value::ObjectEnd => self.encode_marker(markers::OBJECT_END),
            Amf0Value::Date { millis, timezone } => self.encode_date(*millis, *timezone),
            Amf0Value::LongString(s) => self.encode_long_string(s),
        }
    }

    /// Encode an ordered property list as an object, with terminator
    pub fn write_object(&mut self, properties: &[(String, Amf0Value)]) -> Result<()> {
        self.encode_object(properties)
    }

    fn encode_number(&mut self, value: f64) -> Result<()> {
        self.buffer.write_u8(markers::NUMBER)?;
        self.buffer.write_f64_be(value)?;
        Ok(())
    }

    fn encode_boolean(&mut self, value: bool) -> Result<()> {
        self.buffer.write_u8(markers::BOOLEAN)?;
        self.buffer.write_u8(if value { 1 } else { 0 })?;
        Ok(())
    }

    fn encode_string(&mut self, value: &str) -> Result<()> {
        self.buffer.write_u8(markers::STRING)?;
        self.write_string_no_marker(value)?;
        Ok(())
    }

    fn encode_long_string(&mut self, value: &str) -> Result<()> {
        self.buffer.write_u8(markers::LONG_STRING)?;
        let bytes = value.as_bytes();
        self.buffer.write_u32_be(bytes.len() as u32)?;
        self.buffer.write_bytes(bytes)?;
        Ok(())
    }

    fn encode_object(&mut self, properties: &[(String, Amf0Value)]) -> Result<()> {
        self.buffer.write_u8(markers::OBJECT)?;
        for (key, value) in properties {
            self.write_string_no_marker(key)?;
            self.encode(value)?;
        }
        self.write_end_sentinel()
    }

    fn encode_ecma_array(&mut self, count: u32, properties: &[(String, Amf0Value)]) -> Result<()> {
        self.buffer.write_u8(markers::ECMA_ARRAY)?;
        self.buffer.write_u32_be(count)?;
        for (key, value) in properties {
            self.write_string_no_marker(key)?;
            self.encode(value)?;
        }
        self.write_end_sentinel()
    }

    fn encode_date(&mut self, millis: f64, timezone: i16) -> Result<()> {
        self.buffer.write_u8(markers::DATE)?;
        self.buffer.write_f64_be(millis)?;
        self.buffer.write_i16_be(timezone)?;
        Ok(())
    }

    fn encode_marker(&mut self, marker: u8) -> Result<()> {
        self.buffer.write_u8(marker)?;
        Ok(())
    }

    /// Objects and arrays always end with `00 00 09`
    fn write_end_sentinel(&mut self) -> Result<()> {
        self.buffer.write_u16_be(0)?;
        self.buffer.write_u8(markers::OBJECT_END)?;
        Ok(())
    }

    /// Helper to write string without type marker (object keys)
    fn write_string_no_marker(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        self.buffer.write_u16_be(bytes.len() as u16)?;
        self.buffer.write_bytes(bytes)?;
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        self.buffer.to_vec()
    }
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}
