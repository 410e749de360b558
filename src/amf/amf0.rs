/// AMF0 values as they appear in RTMP command payloads.
///
/// Objects and ECMA arrays are *ordered* key/value sequences on the wire, so
/// they are kept as vectors of pairs rather than hash maps; re-encoding a
/// decoded value reproduces the original property order.
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),                              // 0x00
    Boolean(bool),                            // 0x01
    String(String),                           // 0x02
    Object(Vec<(String, Amf0Value)>),         // 0x03
    Null,                                     // 0x05
    Undefined,                                // 0x06
    EcmaArray {
        // Declared entry count; advisory only, the end sentinel is
        // authoritative when decoding
        count: u32,
        properties: Vec<(String, Amf0Value)>,
    },                                        // 0x08
    ObjectEnd,                                // 0x09
    Date { millis: f64, timezone: i16 },      // 0x0B
    LongString(String),                       // 0x0C
}

// AMF0 type markers
pub mod markers {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const MOVIE_CLIP: u8 = 0x04; // not implemented
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const REFERENCE: u8 = 0x07; // not implemented
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A; // not implemented
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
    pub const UNSUPPORTED: u8 = 0x0D; // not implemented
    pub const RECORDSET: u8 = 0x0E; // not implemented
    pub const XML_DOCUMENT: u8 = 0x0F; // not implemented
}

impl Amf0Value {
    /// Extract number value
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) | Amf0Value::LongString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract boolean value
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract the ordered properties of an object or ECMA array
    pub fn as_properties(&self) -> Option<&[(String, Amf0Value)]> {
        match self {
            Amf0Value::Object(props) => Some(props),
            Amf0Value::EcmaArray { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Look up a property by key (first match in wire order)
    pub fn get_property(&self, key: &str) -> Option<&Amf0Value> {
        self.as_properties()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Check if null or undefined
    pub fn is_null(&self) -> bool {
        matches!(self, Amf0Value::Null | Amf0Value::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_lookup_preserves_wire_order() {
        let obj = Amf0Value::Object(vec![
            ("app".to_string(), Amf0Value::String("live".to_string())),
            ("app".to_string(), Amf0Value::String("shadowed".to_string())),
        ]);

        assert_eq!(obj.get_property("app").and_then(|v| v.as_str()), Some("live"));
        assert_eq!(obj.get_property("missing"), None);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Amf0Value::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Amf0Value::Boolean(true).as_boolean(), Some(true));
        assert!(Amf0Value::Undefined.is_null());
        assert_eq!(
            Amf0Value::LongString("x".to_string()).as_str(),
            Some("x")
        );
    }
}
