//! tokio_http11_assembler - Tokio transport for http11_assembler
//!
//! tokio と tokio-rustls を使用した非同期 HTTP/1.1 クライアント。
//! レスポンスの組み立ては http11_assembler の `Exchange` に任せ、
//! このクレートはソケット、タイムアウト、TLS だけを扱う。
//!
//! ## 特徴
//!
//! - **http11_assembler ベース**: Sans I/O ライブラリをベースにした設計
//! - **非同期 I/O**: tokio による完全非同期対応
//! - **TLS 対応**: tokio-rustls による HTTPS 対応
//! - **タイムアウト**: 接続と読み取りのタイムアウトはこの層で管理する
//!
//! ## クライアント
//!
//! ```ignore
//! use tokio_http11_assembler::{Client, Request, ResponseExt};
//!
//! let client = Client::new();
//! let request = Request::post("192.168.0.30", 8080)
//!     .path("/api/config")
//!     .basic_auth("admin", "secret")
//!     .body(br#"{"mode":"auto"}"#.to_vec());
//! let response = client.send(&request).await?;
//! let text = response.text()?;
//! ```

pub mod client;
pub mod error;
pub mod response_ext;

pub use client::{Client, Connection};
pub use error::{Error, Result};
pub use response_ext::{JsonError, ResponseExt};

// http11_assembler の型を re-export
pub use http11_assembler::{AssemblerLimits, Request, Response, StatusLinePolicy};
