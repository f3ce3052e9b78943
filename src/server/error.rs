//! Status server error types.

/// Errors that can occur while running the status server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Server error.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let error = ServerError::BindError {
            address: "127.0.0.1:3001".to_string(),
            source: io_error,
        };
        assert!(error
            .to_string()
            .contains("Failed to bind to 127.0.0.1:3001"));
        assert!(error.to_string().contains("address in use"));
    }

    #[test]
    fn test_serve_error_display() {
        let error = ServerError::from(std::io::Error::other("connection reset"));
        assert_eq!(error.to_string(), "Server error: connection reset");
    }
}
