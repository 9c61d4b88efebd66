//! HTTP レスポンスアセンブラー
//!
//! トランスポートから任意の単位で届く断片を受け取り、1 つの HTTP/1.x レスポンスを
//! 組み立てる。I/O は一切行わず、データ不足は `Outcome::NeedMoreData` で表現する。
//!
//! ## 使い方
//!
//! ```rust
//! use http11_assembler::{Outcome, ResponseAssembler};
//!
//! let mut assembler = ResponseAssembler::new();
//!
//! assert_eq!(
//!     assembler.consume(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nA\r"),
//!     Outcome::NeedMoreData
//! );
//! assert_eq!(
//!     assembler.consume(b"\n0123456789\r\n0\r\n\r\n"),
//!     Outcome::Complete
//! );
//! assert_eq!(assembler.status_code(), Some(200));
//! assert_eq!(assembler.body(), b"0123456789");
//!
//! // 次のメッセージの前に必ずリセットする
//! assembler.reset();
//! ```

mod chunked;
mod head;
mod phase;

use std::cmp::Ordering;

use log::{debug, trace, warn};

use crate::error::Error;
use crate::limits::{AssemblerLimits, StatusLinePolicy};
use crate::response::Response;

use chunked::{ChunkProgress, decode_chunks};
use head::{HEADER_TERMINATOR, find, parse_header_block};
use phase::Phase;

pub use head::ResponseHeader;
pub use phase::Framing;

/// `consume()` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// メッセージはまだ完成していない
    NeedMoreData,
    /// メッセージが完成した
    Complete,
    /// フレーミングエラー (reset するまで再利用できない)
    Failed(Error),
}

impl Outcome {
    /// 完了したかどうか
    pub fn is_complete(&self) -> bool {
        matches!(self, Outcome::Complete)
    }

    /// 失敗したかどうか
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// HTTP レスポンスアセンブラー (Sans I/O)
///
/// 1 インスタンスは同時に 1 つのレスポンスだけを扱う。
/// `Complete` または `Failed` を返した後は `reset()` するまで再利用できない。
#[derive(Debug)]
pub struct ResponseAssembler {
    /// まだヘッダーにもボディにも取り込んでいないバイト列
    pending: Vec<u8>,
    /// ヘッダー終端の探索を再開する位置
    scan_from: usize,
    header: Option<ResponseHeader>,
    body: Vec<u8>,
    phase: Phase,
    limits: AssemblerLimits,
    policy: StatusLinePolicy,
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseAssembler {
    /// 新しいアセンブラーを作成
    pub fn new() -> Self {
        Self::with_options(AssemblerLimits::default(), StatusLinePolicy::default())
    }

    /// 制限付きでアセンブラーを作成
    pub fn with_limits(limits: AssemblerLimits) -> Self {
        Self::with_options(limits, StatusLinePolicy::default())
    }

    /// 制限とステータスラインの文法を指定してアセンブラーを作成
    pub fn with_options(limits: AssemblerLimits, policy: StatusLinePolicy) -> Self {
        Self {
            pending: Vec::new(),
            scan_from: 0,
            header: None,
            body: Vec::new(),
            phase: Phase::Header,
            limits,
            policy,
        }
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &AssemblerLimits {
        &self.limits
    }

    /// ステータスラインの文法を取得
    pub fn policy(&self) -> StatusLinePolicy {
        self.policy
    }

    /// アセンブラーをリセット
    ///
    /// ヘッダー、ボディ、未処理データをすべて破棄する。制限設定は保持する。
    pub fn reset(&mut self) {
        self.pending.clear();
        self.scan_from = 0;
        self.header = None;
        self.body.clear();
        self.phase = Phase::Header;
    }

    /// 断片を追加して組み立てを進める
    pub fn consume(&mut self, fragment: &[u8]) -> Outcome {
        if matches!(self.phase, Phase::Complete | Phase::Failed) {
            warn!("consume called without reset after a finished message");
            return Outcome::Failed(Error::ResetRequired);
        }

        self.pending.extend_from_slice(fragment);
        trace!(
            "consume: fragment={} pending={} body={}",
            fragment.len(),
            self.pending.len(),
            self.body.len()
        );

        match self.advance() {
            Ok(true) => {
                self.phase = Phase::Complete;
                debug!("message complete: body={} bytes", self.body.len());
                Outcome::Complete
            }
            Ok(false) => Outcome::NeedMoreData,
            Err(e) => {
                warn!("failed to assemble HTTP response: {}", e);
                self.phase = Phase::Failed;
                Outcome::Failed(e)
            }
        }
    }

    /// 状態機械を進める。完成したら `true`
    fn advance(&mut self) -> Result<bool, Error> {
        if self.phase == Phase::Header {
            // 終端の途中 ("\r\n\r") まで届いている場合があるので 3 バイト分は猶予する
            let grace = HEADER_TERMINATOR.len() - 1;
            let found = find(&self.pending[self.scan_from..], HEADER_TERMINATOR);
            let Some(pos) = found.map(|rel| self.scan_from + rel) else {
                self.scan_from = self.pending.len().saturating_sub(grace);
                if self.pending.len() > self.limits.max_header_block_size.saturating_add(grace) {
                    return Err(Error::HeaderBlockTooLarge {
                        size: self.pending.len(),
                        limit: self.limits.max_header_block_size,
                    });
                }
                return Ok(false);
            };
            if pos > self.limits.max_header_block_size {
                return Err(Error::HeaderBlockTooLarge {
                    size: pos,
                    limit: self.limits.max_header_block_size,
                });
            }

            let header = parse_header_block(&self.pending[..pos], &self.limits, self.policy)?;
            self.pending.drain(..pos + HEADER_TERMINATOR.len());
            self.scan_from = 0;
            debug!(
                "header received: {} {} {} ({} fields)",
                header.version,
                header.status_code,
                header.reason_phrase,
                header.fields.len()
            );

            let framing = determine_framing(&header, &self.limits);
            self.header = Some(header);
            let framing = framing?;
            debug!("body framing: {:?}", framing);
            self.phase = Phase::Body(framing);
        }

        match self.phase {
            Phase::Body(Framing::Chunked) => {
                match decode_chunks(&mut self.pending, &mut self.body, &self.limits)? {
                    ChunkProgress::Complete => {
                        if !self.pending.is_empty() {
                            warn!(
                                "{} bytes after terminal chunk left unconsumed",
                                self.pending.len()
                            );
                        }
                        Ok(true)
                    }
                    ChunkProgress::Incomplete => Ok(false),
                }
            }
            Phase::Body(Framing::ContentLength(declared)) => {
                let received = self.body.len() + self.pending.len();
                match declared.cmp(&received) {
                    Ordering::Greater => {
                        self.body.append(&mut self.pending);
                        Ok(false)
                    }
                    Ordering::Equal => {
                        self.body.append(&mut self.pending);
                        Ok(true)
                    }
                    Ordering::Less => Err(Error::ContentLengthExceeded { declared, received }),
                }
            }
            Phase::Header | Phase::Complete | Phase::Failed => Ok(false),
        }
    }

    /// ステータスコードを取得 (ヘッダー受信前は `None`)
    pub fn status_code(&self) -> Option<u16> {
        self.header.as_ref().map(|h| h.status_code)
    }

    /// ヘッダーを取得 (ヘッダー受信前は `None`)
    pub fn headers(&self) -> Option<&ResponseHeader> {
        self.header.as_ref()
    }

    /// これまでに組み立てたボディを取得
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 未処理のデータを取得
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// ボディの終端判定方式を取得 (ヘッダー受信前は `None`)
    pub fn framing(&self) -> Option<Framing> {
        match self.phase {
            Phase::Body(framing) => Some(framing),
            _ => self.header.as_ref().and_then(|h| determine_framing(h, &self.limits).ok()),
        }
    }

    /// 完了状態かどうか
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// 失敗状態かどうか
    pub fn is_failed(&self) -> bool {
        self.phase == Phase::Failed
    }

    /// 完成したレスポンスを取り出してリセット
    ///
    /// 完了状態でなければ何もせずに `None` を返す
    pub fn take_response(&mut self) -> Option<Response> {
        if self.phase != Phase::Complete {
            return None;
        }
        let header = self.header.take()?;
        let body = std::mem::take(&mut self.body);
        self.reset();
        Some(Response {
            version: header.version,
            status_code: header.status_code,
            reason_phrase: header.reason_phrase,
            headers: header.fields,
            body,
        })
    }
}

/// ボディの終端判定方式を決定
///
/// Transfer-Encoding を Content-Length より優先する
fn determine_framing(header: &ResponseHeader, limits: &AssemblerLimits) -> Result<Framing, Error> {
    if let Some(value) = header.transfer_encoding() {
        if value == "chunked" {
            return Ok(Framing::Chunked);
        }
        return Err(Error::UnsupportedTransferEncoding(value.to_string()));
    }

    if let Some(content_length) = header.content_length() {
        let len = content_length?;
        if len > limits.max_body_size {
            return Err(Error::BodyTooLarge {
                size: len,
                limit: limits.max_body_size,
            });
        }
        return Ok(Framing::ContentLength(len));
    }

    Err(Error::UnknownFraming)
}
