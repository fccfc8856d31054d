//! `multipart/form-data` bodies for event creation with a logo.
//!
//! The text structure (boundaries, part headers, field order) is built as a
//! list of segments and can be inspected without the attachment bytes; the
//! bytes are spliced in only by [`MultipartBody::to_bytes`].

use rand::Rng as _;
use serde_json::Value;

/// Form field name prefix for event attributes.
pub const EVENT_FIELD_PREFIX: &str = "event";

/// Form field name of the binary logo part.
pub const LOGO_FIELD: &str = "event[logo]";

const CRLF: &str = "\r\n";

/// An image to attach to a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Logo {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// One piece of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Placeholder for the attachment bytes.
    Attachment,
}

/// A multipart body with its text layout fixed and the attachment pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    boundary: String,
    segments: Vec<Segment>,
}

impl MultipartBody {
    /// Builds an event body with a freshly generated boundary.
    pub fn for_event(fields: &Value, logo: &Logo) -> Self {
        Self::with_boundary(generate_boundary(), fields, &logo.file_name, &logo.mime_type)
    }

    /// Builds an event body with a caller-chosen boundary.
    ///
    /// `fields` is the unwrapped event object. Each attribute becomes an
    /// `event[<name>]` part; arrays become repeated `event[<name>][]` parts;
    /// nulls are skipped. The logo part always comes last.
    pub fn with_boundary(
        boundary: impl Into<String>,
        fields: &Value,
        file_name: &str,
        mime_type: &str,
    ) -> Self {
        let boundary = boundary.into();
        let mut text = String::new();

        for (name, value) in form_fields(fields) {
            text.push_str(&format!("--{boundary}{CRLF}"));
            text.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"{CRLF}{CRLF}",
                name
            ));
            text.push_str(&value);
            text.push_str(CRLF);
        }

        text.push_str(&format!("--{boundary}{CRLF}"));
        text.push_str(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"{CRLF}",
            LOGO_FIELD,
            escape_quotes(file_name)
        ));
        text.push_str(&format!("Content-Type: {mime_type}{CRLF}{CRLF}"));

        let closing = format!("{CRLF}--{boundary}--{CRLF}");

        Self {
            boundary,
            segments: vec![Segment::Text(text), Segment::Attachment, Segment::Text(closing)],
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the `Content-Type` header value.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Renders the layout with `placeholder` standing in for the attachment.
    pub fn text_layout(&self, placeholder: &str) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.as_str(),
                Segment::Attachment => placeholder,
            })
            .collect()
    }

    /// Concatenates the segments with the attachment bytes.
    pub fn to_bytes(&self, attachment: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.extend_from_slice(text.as_bytes()),
                Segment::Attachment => out.extend_from_slice(attachment),
            }
        }
        out
    }
}

/// Flattens an event object into `(field name, value)` form pairs.
fn form_fields(fields: &Value) -> Vec<(String, String)> {
    let Some(object) = fields.as_object() else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for (key, value) in object {
        match value {
            Value::Array(items) => {
                let name = format!("{EVENT_FIELD_PREFIX}[{key}][]");
                pairs.extend(items.iter().filter_map(scalar).map(|v| (name.clone(), v)));
            }
            other => {
                if let Some(v) = scalar(other) {
                    pairs.push((format!("{EVENT_FIELD_PREFIX}[{key}]"), v));
                }
            }
        }
    }
    pairs
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "%22")
}

fn generate_boundary() -> String {
    let mut rng = rand::rng();
    let token: u128 = rng.random();
    format!("----ridesched{:032x}", token)
}
