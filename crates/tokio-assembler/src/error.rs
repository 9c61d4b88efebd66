//! tokio_http11_assembler エラー型

use std::fmt;

use http11_assembler::ExchangeError;

/// tokio_http11_assembler エラー
#[derive(Debug)]
pub enum Error {
    /// I/O エラー
    Io(std::io::Error),
    /// レスポンスの区切りを判定できなかった
    Http(http11_assembler::Error),
    /// 2xx 以外のステータス
    Status {
        status_code: u16,
        reason_phrase: String,
        body: Vec<u8>,
    },
    /// TLS エラー
    Tls(String),
    /// 接続または読み取りのタイムアウト
    Timeout,
    /// 接続が閉じられた (レスポンスの途中での切断、または失敗後の接続への送信)
    ConnectionClosed,
}

impl Error {
    /// ステータスコードを取得 (`Status` 以外は `None`)
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Status {
                status_code,
                reason_phrase,
                ..
            } => write!(f, "unexpected status: {} {}", status_code, reason_phrase),
            Error::Tls(e) => write!(f, "TLS error: {}", e),
            Error::Timeout => write!(f, "timeout"),
            Error::ConnectionClosed => write!(f, "connection closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<http11_assembler::Error> for Error {
    fn from(e: http11_assembler::Error) -> Self {
        Error::Http(e)
    }
}

impl From<ExchangeError> for Error {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::Framing(e) => Error::Http(e),
            ExchangeError::Status {
                status_code,
                reason_phrase,
                body,
            } => Error::Status {
                status_code,
                reason_phrase,
                body,
            },
        }
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}

impl From<rustls::Error> for Error {
    fn from(e: rustls::Error) -> Self {
        Error::Tls(e.to_string())
    }
}

impl From<rustls_pki_types::InvalidDnsNameError> for Error {
    fn from(e: rustls_pki_types::InvalidDnsNameError) -> Self {
        Error::Tls(e.to_string())
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_exchange_error() {
        let e = Error::from(ExchangeError::Framing(http11_assembler::Error::UnknownFraming));
        assert!(matches!(e, Error::Http(_)));
        assert_eq!(e.status_code(), None);

        let e = Error::from(ExchangeError::Status {
            status_code: 404,
            reason_phrase: "Not Found".to_string(),
            body: Vec::new(),
        });
        assert_eq!(e.status_code(), Some(404));
        assert_eq!(e.to_string(), "unexpected status: 404 Not Found");
    }
}
