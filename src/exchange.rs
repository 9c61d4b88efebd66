//! リクエスト/レスポンス 1 往復の進行管理
//!
//! `Exchange` はアセンブラーを 1 つ持ち、送信済みで応答待ちのリクエストがあるかを追跡する。
//! トランスポート層は受信したデータを `on_data()` に渡し、返ってきた `Action` に従うだけでよい。
//!
//! ```rust
//! use http11_assembler::{Action, Exchange, Request};
//!
//! let mut exchange = Exchange::new();
//! let wire = exchange.begin(&Request::get("192.168.0.2", 80).path("/status"));
//! assert!(wire.starts_with(b"GET /status HTTP/1.1\r\n"));
//!
//! assert_eq!(
//!     exchange.on_data(b"HTTP/1.1 200 OK\r\nContent-Len"),
//!     Action::Receive
//! );
//! match exchange.on_data(b"gth: 2\r\n\r\n{}") {
//!     Action::Complete(response) => assert_eq!(response.body, b"{}"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use std::fmt;

use log::{debug, warn};

use crate::assembler::{Outcome, ResponseAssembler};
use crate::error::Error;
use crate::limits::{AssemblerLimits, StatusLinePolicy};
use crate::request::Request;
use crate::response::Response;

/// 1 往復の失敗理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// メッセージの区切りを判定できなかった
    Framing(Error),
    /// メッセージは正しく受信できたがステータスが 2xx ではない
    Status {
        status_code: u16,
        reason_phrase: String,
        body: Vec<u8>,
    },
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::Framing(e) => write!(f, "framing error: {}", e),
            ExchangeError::Status {
                status_code,
                reason_phrase,
                ..
            } => write!(f, "unexpected status: {} {}", status_code, reason_phrase),
        }
    }
}

impl std::error::Error for ExchangeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExchangeError::Framing(e) => Some(e),
            ExchangeError::Status { .. } => None,
        }
    }
}

impl From<Error> for ExchangeError {
    fn from(e: Error) -> Self {
        ExchangeError::Framing(e)
    }
}

/// `on_data()` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 続きのデータを待つ
    Receive,
    /// 2xx レスポンスを受信した
    Complete(Response),
    /// 応答待ちのリクエストが失敗した
    Fail(ExchangeError),
    /// 応答待ちのリクエストがない状態で届いたメッセージを読み捨てた
    Discarded,
}

/// リクエスト/レスポンスの往復を管理する
#[derive(Debug, Default)]
pub struct Exchange {
    assembler: ResponseAssembler,
    outstanding: bool,
}

impl Exchange {
    /// 新しい Exchange を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 制限とステータスラインの文法を指定して作成
    pub fn with_options(limits: AssemblerLimits, policy: StatusLinePolicy) -> Self {
        Self {
            assembler: ResponseAssembler::with_options(limits, policy),
            outstanding: false,
        }
    }

    /// リクエストを開始して送信するバイト列を返す
    ///
    /// 直前のメッセージの状態は破棄される
    pub fn begin(&mut self, request: &Request) -> Vec<u8> {
        self.assembler.reset();
        self.outstanding = true;
        debug!(
            "begin exchange: {} {} host={}",
            request.method,
            request.path,
            request.host_header()
        );
        request.encode()
    }

    /// 応答待ちのリクエストがあるか
    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    /// 内部のアセンブラーを取得
    pub fn assembler(&self) -> &ResponseAssembler {
        &self.assembler
    }

    /// 受信したデータを処理する
    pub fn on_data(&mut self, data: &[u8]) -> Action {
        let action = match self.assembler.consume(data) {
            Outcome::NeedMoreData => return Action::Receive,
            Outcome::Failed(e) => {
                self.assembler.reset();
                Action::Fail(ExchangeError::Framing(e))
            }
            Outcome::Complete => match self.assembler.take_response() {
                Some(response) if response.is_success() => Action::Complete(response),
                Some(response) => {
                    warn!(
                        "non-success status: {} {}",
                        response.status_code, response.reason_phrase
                    );
                    Action::Fail(ExchangeError::Status {
                        status_code: response.status_code,
                        reason_phrase: response.reason_phrase,
                        body: response.body,
                    })
                }
                None => {
                    self.assembler.reset();
                    Action::Fail(ExchangeError::Framing(Error::ResetRequired))
                }
            },
        };

        if std::mem::replace(&mut self.outstanding, false) {
            action
        } else {
            warn!("discarded unsolicited message: {:?}", action);
            Action::Discarded
        }
    }

    /// 応答待ちのリクエストを破棄する
    pub fn abort(&mut self) {
        if self.outstanding {
            debug!("abort exchange");
        }
        self.outstanding = false;
        self.assembler.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::get("10.0.0.1", 80)
    }

    #[test]
    fn begin_encodes_request() {
        let mut exchange = Exchange::new();
        assert!(!exchange.is_outstanding());
        let wire = exchange.begin(&request());
        assert_eq!(wire, request().encode());
        assert!(exchange.is_outstanding());
    }

    #[test]
    fn complete_success() {
        let mut exchange = Exchange::new();
        exchange.begin(&request());
        assert_eq!(exchange.on_data(b"HTTP/1.1 200 OK\r\n"), Action::Receive);
        let action = exchange.on_data(b"Content-Length: 2\r\n\r\nok");
        let Action::Complete(response) = action else {
            panic!("unexpected: {:?}", action);
        };
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, b"ok");
        assert!(!exchange.is_outstanding());
        assert!(exchange.assembler().headers().is_none());
    }

    #[test]
    fn non_success_status_fails() {
        let mut exchange = Exchange::new();
        exchange.begin(&request());
        let action =
            exchange.on_data(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 6\r\n\r\ndenied");
        assert_eq!(
            action,
            Action::Fail(ExchangeError::Status {
                status_code: 401,
                reason_phrase: "Unauthorized".to_string(),
                body: b"denied".to_vec(),
            })
        );
        // 次のメッセージのためにリセット済み
        assert!(exchange.assembler().body().is_empty());
    }

    #[test]
    fn framing_failure_resets() {
        let mut exchange = Exchange::new();
        exchange.begin(&request());
        let action = exchange.on_data(b"GARBAGE\r\n\r\n");
        assert_eq!(
            action,
            Action::Fail(ExchangeError::Framing(Error::InvalidStatusLine(
                "GARBAGE".to_string()
            )))
        );
        assert!(!exchange.assembler().is_failed());

        exchange.begin(&request());
        assert!(matches!(
            exchange.on_data(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"),
            Action::Complete(_)
        ));
    }

    #[test]
    fn unsolicited_message_is_discarded() {
        let mut exchange = Exchange::new();
        assert_eq!(
            exchange.on_data(b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nab"),
            Action::Receive
        );
        assert_eq!(exchange.on_data(b"c"), Action::Discarded);
        assert!(exchange.assembler().body().is_empty());

        // 壊れたメッセージも読み捨てる
        assert_eq!(exchange.on_data(b"GARBAGE\r\n\r\n"), Action::Discarded);
        assert!(!exchange.assembler().is_failed());
    }

    #[test]
    fn abort_drops_partial_message() {
        let mut exchange = Exchange::new();
        exchange.begin(&request());
        assert_eq!(
            exchange.on_data(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n01234"),
            Action::Receive
        );
        exchange.abort();
        assert!(!exchange.is_outstanding());
        assert!(exchange.assembler().body().is_empty());
        assert!(exchange.assembler().headers().is_none());
    }

    #[test]
    fn error_display() {
        let e = ExchangeError::Status {
            status_code: 503,
            reason_phrase: "Service Unavailable".to_string(),
            body: Vec::new(),
        };
        assert_eq!(e.to_string(), "unexpected status: 503 Service Unavailable");
        let e = ExchangeError::from(Error::UnknownFraming);
        assert!(e.to_string().starts_with("framing error: "));
    }
}
