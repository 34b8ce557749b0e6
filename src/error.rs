//! Error types for the board client.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::board::Column;
use crate::validation::ValidationResult;

/// Result type for board client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures talking to the remote task store.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response: connection refused, DNS failure, timeout.
    #[error("could not connect to {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a 4xx/5xx status.
    #[error("server rejected request ({status}): {message}")]
    Server { status: u16, message: String },

    /// The response body was not what the client expected.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid api url '{0}'")]
    InvalidUrl(String),

    /// The HTTP client itself could not be set up (TLS backend, settings).
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Message shown to the user. `action` completes "Erro ao ..." (e.g. "salvar a tarefa").
    pub fn user_message(&self, action: &str) -> String {
        match self {
            ApiError::Network { .. } => {
                "Erro de rede: Não foi possível se conectar ao servidor.".to_string()
            }
            ApiError::Server { message, .. } => format!("Erro ao {}: {}", action, message),
            ApiError::Decode { .. } | ApiError::InvalidUrl(_) | ApiError::Client(_) => format!(
                "Erro ao {}. Verifique os dados e tente novamente.",
                action
            ),
        }
    }

}

/// Extracts a readable message from an error response body.
///
/// Looks at `message`, then `detail`, then flattens field errors
/// (`{"email": ["already exists"]}` becomes `email: already exists`).
pub fn server_message(body: &str) -> String {
    const UNKNOWN: &str = "Erro desconhecido.";

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            let trimmed = body.trim();
            return if trimmed.is_empty() || trimmed.starts_with('<') {
                UNKNOWN.to_string()
            } else {
                trimmed.to_string()
            };
        }
    };

    let Some(map) = value.as_object() else {
        return match value {
            Value::String(s) => s,
            Value::Array(items) => join_messages(&items),
            _ => UNKNOWN.to_string(),
        };
    };

    for key in ["message", "detail"] {
        if let Some(Value::String(s)) = map.get(key) {
            return s.clone();
        }
    }

    let parts: Vec<String> = map
        .iter()
        .map(|(field, v)| match v {
            Value::Array(items) => format!("{}: {}", field, join_messages(items)),
            Value::String(s) => format!("{}: {}", field, s),
            other => format!("{}: {}", field, other),
        })
        .collect();
    if parts.is_empty() {
        UNKNOWN.to_string()
    } else {
        parts.join("; ")
    }
}

fn join_messages(items: &[Value]) -> String {
    items
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Violations of board reducer preconditions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("no task at index {index} of column '{column}' ({len} tasks)")]
    IndexOutOfRange {
        column: Column,
        index: usize,
        len: usize,
    },
}

/// Top-level error for commands and the interactive board.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("validation failed: {0}")]
    Invalid(ValidationResult),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: u64 },

    #[error("failed to read config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ValidationResult> for Error {
    fn from(result: ValidationResult) -> Self {
        Error::Invalid(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_prefers_message_then_detail() {
        assert_eq!(server_message(r#"{"message":"boom","detail":"x"}"#), "boom");
        assert_eq!(server_message(r#"{"detail":"Not found."}"#), "Not found.");
    }

    #[test]
    fn test_server_message_flattens_field_errors() {
        let body = r#"{"email":["user with this E-mail already exists."]}"#;
        assert_eq!(
            server_message(body),
            "email: user with this E-mail already exists."
        );
    }

    #[test]
    fn test_server_message_unknown_bodies() {
        assert_eq!(server_message(""), "Erro desconhecido.");
        assert_eq!(server_message("<html>500</html>"), "Erro desconhecido.");
        assert_eq!(server_message("{}"), "Erro desconhecido.");
        assert_eq!(server_message("plain failure"), "plain failure");
    }

    #[test]
    fn test_user_message_labels() {
        let err = ApiError::Server {
            status: 400,
            message: "priority: invalid".into(),
        };
        assert_eq!(
            err.user_message("salvar a tarefa"),
            "Erro ao salvar a tarefa: priority: invalid"
        );
        let err = ApiError::Decode {
            url: "http://x".into(),
            message: "eof".into(),
        };
        assert_eq!(
            err.user_message("excluir a tarefa"),
            "Erro ao excluir a tarefa. Verifique os dados e tente novamente."
        );
    }

    #[test]
    fn test_client_setup_failure_is_not_a_network_error() {
        let source = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err = ApiError::Client(source);
        assert_eq!(
            err.user_message("carregar as tarefas"),
            "Erro ao carregar as tarefas. Verifique os dados e tente novamente."
        );
    }
}
