//! Wire-format types.
//!
//! Requests are decoded once into a tagged [`Request`]; handlers never look
//! at raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tandem_core::AlignmentLink;
use tandem_decoding::GenerationUpdate;

use crate::errors::ProtocolError;

/// Command name of a configuration update.
pub const UPDATE_SETTINGS: &str = "update_settings";
/// Command name of a shutdown request.
pub const SHUTDOWN: &str = "shutdown";

/// Every field any request variant may carry. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRequest {
    command: Option<String>,
    text: Option<String>,
    source_lang: Option<String>,
    target_lang: Option<String>,
    source: Option<String>,
    target: Option<String>,
    beam_size: Option<usize>,
    repetition_penalty: Option<f32>,
    no_repeat_ngram_size: Option<usize>,
    max_length: Option<usize>,
}

/// A decoded request line.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Translate and align one text.
    Translate {
        /// Source text; empty when absent.
        text: String,
        /// Source language name, if given.
        source_lang: Option<String>,
        /// Target language name, if given.
        target_lang: Option<String>,
        /// Opaque id echoed in the response; `null` when absent.
        request_id: Value,
    },
    /// Change the live generation config.
    UpdateSettings {
        /// Fields to change.
        update: GenerationUpdate,
        /// Opaque id echoed in an error response.
        request_id: Value,
    },
    /// Stop serving.
    Shutdown,
}

/// Why a line could not become a [`Request`].
#[derive(Debug)]
pub enum Rejection {
    /// Not a JSON object; there is no request id to echo.
    Malformed(ProtocolError),
    /// A JSON object that is not a valid request.
    Invalid {
        /// The line's `request_id`, or `null`.
        request_id: Value,
        /// What is wrong.
        error: ProtocolError,
    },
}

/// Decode one trimmed, non-empty line.
pub fn decode_line(line: &str) -> std::result::Result<Request, Rejection> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| Rejection::Malformed(ProtocolError::Malformed(e.to_string())))?;
    let Value::Object(mut object) = value else {
        return Err(Rejection::Malformed(ProtocolError::NotAnObject));
    };
    let request_id = object.remove("request_id").unwrap_or(Value::Null);

    let raw: RawRequest = match serde_json::from_value(Value::Object(object)) {
        Ok(raw) => raw,
        Err(e) => {
            return Err(Rejection::Invalid {
                request_id,
                error: ProtocolError::InvalidRequest(e.to_string()),
            });
        }
    };

    match raw.command.as_deref() {
        None => Ok(Request::Translate {
            text: raw.text.unwrap_or_default(),
            source_lang: raw.source_lang.or(raw.source),
            target_lang: raw.target_lang.or(raw.target),
            request_id,
        }),
        Some(UPDATE_SETTINGS) => Ok(Request::UpdateSettings {
            update: GenerationUpdate {
                beam_size: raw.beam_size,
                repetition_penalty: raw.repetition_penalty,
                no_repeat_ngram_size: raw.no_repeat_ngram_size,
                max_length: raw.max_length,
            },
            request_id,
        }),
        Some(SHUTDOWN) => Ok(Request::Shutdown),
        Some(other) => Err(Rejection::Invalid {
            request_id,
            error: ProtocolError::UnknownCommand(other.to_string()),
        }),
    }
}

/// Value of the `status` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Initialization finished; requests may follow.
    Ready,
    /// Shutdown acknowledged.
    Shutdown,
    /// `update_settings` applied.
    SettingsUpdated,
    /// A line could not be parsed.
    Error,
    /// Initialization failed; the process exits.
    InitFailed,
}

/// One response line.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// Successful translation.
    Translation {
        /// Translated text.
        translation: String,
        /// Word links sorted by `(s, t)`.
        alignments: Vec<AlignmentLink>,
        /// Echoed request id.
        request_id: Value,
    },
    /// Failed request.
    Failure {
        /// Human-readable message.
        error: String,
        /// Echoed request id.
        request_id: Value,
    },
    /// Fatal initialization error.
    InitFailed {
        /// Human-readable message.
        error: String,
        /// Failing stage.
        #[serde(rename = "type")]
        kind: String,
        /// Always [`Status::InitFailed`].
        status: Status,
    },
    /// Unparseable line.
    Malformed {
        /// Parser message.
        error: String,
        /// Always [`Status::Error`].
        status: Status,
    },
    /// Lifecycle acknowledgement.
    Status {
        /// Which acknowledgement.
        status: Status,
    },
}

impl Response {
    /// `{"status": "ready"}`.
    pub fn ready() -> Self {
        Self::Status {
            status: Status::Ready,
        }
    }

    /// `{"status": "shutdown"}`.
    pub fn shutdown() -> Self {
        Self::Status {
            status: Status::Shutdown,
        }
    }

    /// `{"status": "settings_updated"}`.
    pub fn settings_updated() -> Self {
        Self::Status {
            status: Status::SettingsUpdated,
        }
    }

    /// Successful translation.
    pub fn translation(text: String, alignments: Vec<AlignmentLink>, request_id: Value) -> Self {
        Self::Translation {
            translation: text,
            alignments,
            request_id,
        }
    }

    /// Per-request failure.
    pub fn failure(error: impl Into<String>, request_id: Value) -> Self {
        Self::Failure {
            error: error.into(),
            request_id,
        }
    }

    /// Unparseable line.
    pub fn malformed(error: impl Into<String>) -> Self {
        Self::Malformed {
            error: error.into(),
            status: Status::Error,
        }
    }

    /// Fatal initialization error.
    pub fn init_failed(kind: impl Into<String>, error: impl Into<String>) -> Self {
        Self::InitFailed {
            error: error.into(),
            kind: kind.into(),
            status: Status::InitFailed,
        }
    }

    /// Serialize as one line, without the trailing newline.
    pub fn to_line(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_value(response: &Response) -> Value {
        serde_json::from_str(&response.to_line().unwrap()).unwrap()
    }

    #[test]
    fn translate_request_with_id() {
        let req = decode_line(
            r#"{"text":"Hello","source_lang":"English","target_lang":"French","request_id":42}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            Request::Translate {
                text: "Hello".into(),
                source_lang: Some("English".into()),
                target_lang: Some("French".into()),
                request_id: json!(42),
            }
        );
    }

    #[test]
    fn short_language_aliases() {
        let req = decode_line(r#"{"text":"Hi","source":"English","target":"Dutch"}"#).unwrap();
        let Request::Translate {
            source_lang,
            target_lang,
            request_id,
            ..
        } = req
        else {
            panic!("expected translate");
        };
        assert_eq!(source_lang.as_deref(), Some("English"));
        assert_eq!(target_lang.as_deref(), Some("Dutch"));
        assert_eq!(request_id, Value::Null);
    }

    #[test]
    fn long_names_win_over_aliases() {
        let req = decode_line(r#"{"source":"English","source_lang":"Polish"}"#).unwrap();
        let Request::Translate { source_lang, text, .. } = req else {
            panic!("expected translate");
        };
        assert_eq!(source_lang.as_deref(), Some("Polish"));
        assert_eq!(text, "");
    }

    #[test]
    fn update_settings_fields() {
        let req = decode_line(r#"{"command":"update_settings","beam_size":1,"max_length":64}"#)
            .unwrap();
        let Request::UpdateSettings { update, .. } = req else {
            panic!("expected update");
        };
        assert_eq!(update.beam_size, Some(1));
        assert_eq!(update.max_length, Some(64));
        assert_eq!(update.repetition_penalty, None);
    }

    #[test]
    fn shutdown_and_unknown_commands() {
        assert_eq!(decode_line(r#"{"command":"shutdown"}"#).unwrap(), Request::Shutdown);
        match decode_line(r#"{"command":"reload","request_id":"r1"}"#) {
            Err(Rejection::Invalid { request_id, error }) => {
                assert_eq!(request_id, json!("r1"));
                assert_eq!(error.to_string(), "unknown command: reload");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_and_non_object_lines() {
        assert!(matches!(decode_line("{not json"), Err(Rejection::Malformed(_))));
        assert!(matches!(
            decode_line("[1,2]"),
            Err(Rejection::Malformed(ProtocolError::NotAnObject))
        ));
    }

    #[test]
    fn wrong_field_type_keeps_request_id() {
        match decode_line(r#"{"command":"update_settings","beam_size":"four","request_id":3}"#) {
            Err(Rejection::Invalid { request_id, error }) => {
                assert_eq!(request_id, json!(3));
                assert!(matches!(error, ProtocolError::InvalidRequest(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_ignored() {
        assert!(decode_line(r#"{"text":"x","priority":"high"}"#).is_ok());
    }

    #[test]
    fn response_shapes() {
        assert_eq!(to_value(&Response::ready()), json!({"status": "ready"}));
        assert_eq!(to_value(&Response::shutdown()), json!({"status": "shutdown"}));
        assert_eq!(
            to_value(&Response::settings_updated()),
            json!({"status": "settings_updated"})
        );
        assert_eq!(
            to_value(&Response::translation(
                "Hallo".into(),
                vec![AlignmentLink::new(0, 0)],
                json!("a")
            )),
            json!({"translation": "Hallo", "alignments": [{"s": 0, "t": 0}], "request_id": "a"})
        );
        assert_eq!(
            to_value(&Response::failure("boom", Value::Null)),
            json!({"error": "boom", "request_id": null})
        );
        assert_eq!(
            to_value(&Response::malformed("bad")),
            json!({"error": "bad", "status": "error"})
        );
        assert_eq!(
            to_value(&Response::init_failed("ModelLoad", "encoder missing")),
            json!({"error": "encoder missing", "type": "ModelLoad", "status": "init_failed"})
        );
    }

    #[test]
    fn response_is_a_single_line() {
        let line = Response::translation("a\nb".into(), vec![], Value::Null)
            .to_line()
            .unwrap();
        assert!(!line.contains('\n'));
    }
}
