use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid peer URI: {0}")]
    InvalidUri(String),

    #[error("Unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("Malformed reply: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout error")]
    TimeoutError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_error_kind() {
        let conn = NetworkError::ConnectionError("refused".to_string());
        assert!(format!("{conn}").contains("Connection error"));

        let status = NetworkError::UnexpectedStatus(500);
        assert!(format!("{status}").contains("500"));

        assert_eq!(format!("{}", NetworkError::TimeoutError), "Timeout error");
    }

    #[test]
    fn from_serde_error_maps_to_decode() {
        let err: NetworkError = serde_json::from_str::<u64>("not json").unwrap_err().into();
        assert!(matches!(err, NetworkError::Decode(_)));
    }
}
