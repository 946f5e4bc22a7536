use serde_json::Value;

/// Text used when a successful reply carries none of the known fields.
pub const NO_REPLY_TEXT: &str = "Sorry, I encountered an error.";

/// The reply shapes a workflow webhook is known to produce.
///
/// Variants are listed in resolution order: when a body carries several
/// fields, the earliest one wins. Missing, non-string and empty fields are
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyShape {
    Output(String),
    Response(String),
    Message(String),
    Text(String),
    Unrecognized,
}

impl ReplyShape {
    #[must_use]
    pub fn resolve(body: &Value) -> Self {
        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };

        if let Some(text) = field("output") {
            Self::Output(text)
        } else if let Some(text) = field("response") {
            Self::Response(text)
        } else if let Some(text) = field("message") {
            Self::Message(text)
        } else if let Some(text) = field("text") {
            Self::Text(text)
        } else {
            Self::Unrecognized
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Output(text) | Self::Response(text) | Self::Message(text) | Self::Text(text) => {
                text
            }
            Self::Unrecognized => NO_REPLY_TEXT.to_string(),
        }
    }
}
