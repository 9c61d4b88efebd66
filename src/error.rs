use std::fmt;

/// フレーミングエラー
///
/// いずれも現在のメッセージに対して致命的で、再利用の前に `reset()` が必要
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// ステータスラインが `VERSION SP STATUSCODE SP REASON` に一致しない
    InvalidStatusLine(String),
    /// `": "` 区切りのないヘッダー行
    InvalidHeaderLine(String),
    /// chunked 以外の Transfer-Encoding
    UnsupportedTransferEncoding(String),
    /// Content-Length が数値でない
    InvalidContentLength(String),
    /// Content-Length を超えるデータを受信
    ContentLengthExceeded { declared: usize, received: usize },
    /// Transfer-Encoding も Content-Length もない
    UnknownFraming,
    /// チャンクサイズ行が 16 進数でない
    InvalidChunkSize(String),
    /// チャンクデータの後に CRLF がない
    InvalidChunkTerminator,
    /// ヘッダーブロックが大きすぎる
    HeaderBlockTooLarge { size: usize, limit: usize },
    /// ヘッダー数超過
    TooManyHeaders { count: usize, limit: usize },
    /// ボディサイズ超過
    BodyTooLarge { size: usize, limit: usize },
    /// チャンクサイズ行が長すぎる
    ChunkLineTooLong { size: usize, limit: usize },
    /// 完了または失敗の後に reset() せずに consume() が呼ばれた
    ResetRequired,
}

impl Error {
    /// 上限超過によるエラーかどうか
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(
            self,
            Error::HeaderBlockTooLarge { .. }
                | Error::TooManyHeaders { .. }
                | Error::BodyTooLarge { .. }
                | Error::ChunkLineTooLong { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidStatusLine(line) => {
                write!(f, "header parse failure: invalid status line: {:?}", line)
            }
            Error::InvalidHeaderLine(line) => {
                write!(f, "header parse failure: invalid header line: {:?}", line)
            }
            Error::UnsupportedTransferEncoding(value) => {
                write!(f, "unsupported transfer-encoding: {}", value)
            }
            Error::InvalidContentLength(value) => {
                write!(f, "invalid content-length: {:?}", value)
            }
            Error::ContentLengthExceeded { declared, received } => {
                write!(
                    f,
                    "content-length exceeded: received {} bytes, declared {}",
                    received, declared
                )
            }
            Error::UnknownFraming => write!(
                f,
                "unknown framing: neither transfer-encoding nor content-length"
            ),
            Error::InvalidChunkSize(line) => write!(f, "invalid chunk size: {:?}", line),
            Error::InvalidChunkTerminator => {
                write!(f, "invalid chunked encoding: expected CRLF after chunk data")
            }
            Error::HeaderBlockTooLarge { size, limit } => {
                write!(f, "header block too large: {} > {}", size, limit)
            }
            Error::TooManyHeaders { count, limit } => {
                write!(f, "too many headers: {} > {}", count, limit)
            }
            Error::BodyTooLarge { size, limit } => {
                write!(f, "body too large: {} > {}", size, limit)
            }
            Error::ChunkLineTooLong { size, limit } => {
                write!(f, "chunk line too long: {} > {}", size, limit)
            }
            Error::ResetRequired => write!(f, "assembler must be reset before reuse"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_content_length_exceeded() {
        let e = Error::ContentLengthExceeded {
            declared: 5,
            received: 7,
        };
        assert_eq!(
            e.to_string(),
            "content-length exceeded: received 7 bytes, declared 5"
        );
    }

    #[test]
    fn limit_errors() {
        assert!(Error::BodyTooLarge { size: 2, limit: 1 }.is_limit_exceeded());
        assert!(!Error::UnknownFraming.is_limit_exceeded());
        assert!(!Error::ResetRequired.is_limit_exceeded());
    }
}
