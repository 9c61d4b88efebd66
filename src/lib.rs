//! # http11_assembler
//!
//! 断片的に届く HTTP/1.x レスポンスを組み立てるライブラリ (Sans I/O)
//!
//! ## 特徴
//!
//! - **Sans I/O**: ソケットもタイマーも持たない。受信したバイト列を渡すだけ
//! - **分割に依存しない**: どこで区切られて届いても同じ結果になる
//! - **Content-Length / chunked**: 両方の区切り方式に対応
//!
//! ## 使い方
//!
//! ### アセンブラーを直接使う
//!
//! ```rust
//! use http11_assembler::{Outcome, ResponseAssembler};
//!
//! let mut assembler = ResponseAssembler::new();
//! let fragments: [&[u8]; 3] = [b"HTTP/1.1 200 OK\r\nContent-", b"Length: 5\r\n\r\nhel", b"lo"];
//! for fragment in fragments {
//!     match assembler.consume(fragment) {
//!         Outcome::NeedMoreData => continue,
//!         Outcome::Complete => break,
//!         Outcome::Failed(e) => panic!("{}", e),
//!     }
//! }
//! assert_eq!(assembler.status_code(), Some(200));
//! assert_eq!(assembler.body(), b"hello");
//! assembler.reset();
//! ```
//!
//! ### リクエストを送ってレスポンスを待つ
//!
//! ```rust
//! use http11_assembler::{Action, Exchange, Request};
//!
//! let request = Request::post("192.168.0.10", 8080)
//!     .path("/api/light")
//!     .basic_auth("admin", "secret")
//!     .body(br#"{"on":true}"#.to_vec());
//!
//! let mut exchange = Exchange::new();
//! let bytes = exchange.begin(&request);
//! // bytes を送信...
//! # let _ = bytes;
//!
//! // 受信データを on_data() に渡す
//! let action = exchange.on_data(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}");
//! assert!(matches!(action, Action::Complete(_)));
//! ```

mod assembler;
pub mod auth;
mod encoder;
mod error;
mod exchange;
mod limits;
mod request;
mod response;

pub use assembler::{Framing, Outcome, ResponseAssembler, ResponseHeader};
pub use encoder::{
    encode_chunk, encode_chunks, encode_request, encode_response, encode_response_headers,
};
pub use error::Error;
pub use exchange::{Action, Exchange, ExchangeError};
pub use limits::{AssemblerLimits, StatusLinePolicy};
pub use request::{DEFAULT_CONNECTION, DEFAULT_CONTENT_TYPE, Request};
pub use response::Response;
