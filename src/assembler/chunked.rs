//! chunked 転送エンコーディングのデコード

use log::debug;

use crate::error::Error;
use crate::limits::AssemblerLimits;

use super::head::{CRLF, HEADER_TERMINATOR, find, latin1_to_string};

/// チャンクデコードの進捗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkProgress {
    /// 終端チャンクをまだ受信していない
    Incomplete,
    /// 終端チャンクを受信した
    Complete,
}

/// 未処理バッファから完全なチャンクをすべて取り出してボディに追加する
///
/// 不完全なチャンク (サイズ行の途中、データの途中、終端 CRLF 待ち) は
/// サイズ行も含めて `pending` に残し、次回の呼び出しで先頭から再パースする。
pub(crate) fn decode_chunks(
    pending: &mut Vec<u8>,
    body: &mut Vec<u8>,
    limits: &AssemblerLimits,
) -> Result<ChunkProgress, Error> {
    let mut consumed = 0;
    let progress = loop {
        let rest = &pending[consumed..];
        if rest.is_empty() {
            break ChunkProgress::Incomplete;
        }

        let Some(line_end) = find(rest, CRLF) else {
            // CR だけ届いている可能性があるので 1 バイト分は猶予する
            if rest.len() > limits.max_chunk_line_size.saturating_add(1) {
                return Err(Error::ChunkLineTooLong {
                    size: rest.len(),
                    limit: limits.max_chunk_line_size,
                });
            }
            break ChunkProgress::Incomplete;
        };
        if line_end > limits.max_chunk_line_size {
            return Err(Error::ChunkLineTooLong {
                size: line_end,
                limit: limits.max_chunk_line_size,
            });
        }

        let chunk_size = parse_chunk_size(&rest[..line_end])?;
        debug!("chunk size: {}", chunk_size);

        if chunk_size == 0 {
            // 終端チャンク: トレーラーは読み飛ばし、最後の空行までを消費する
            let trailer = &rest[line_end..];
            let limit = limits.max_header_block_size;
            match find(trailer, HEADER_TERMINATOR) {
                Some(pos) if pos > limit => {
                    return Err(Error::HeaderBlockTooLarge { size: pos, limit });
                }
                Some(pos) => {
                    consumed += line_end + pos + HEADER_TERMINATOR.len();
                    break ChunkProgress::Complete;
                }
                None if trailer.len() > limit.saturating_add(HEADER_TERMINATOR.len()) => {
                    return Err(Error::HeaderBlockTooLarge {
                        size: trailer.len(),
                        limit,
                    });
                }
                None => break ChunkProgress::Incomplete,
            }
        }

        let new_size = body.len().saturating_add(chunk_size);
        if new_size > limits.max_body_size {
            return Err(Error::BodyTooLarge {
                size: new_size,
                limit: limits.max_body_size,
            });
        }

        let data_start = line_end + CRLF.len();
        let data_end = data_start.saturating_add(chunk_size);
        if data_end.saturating_add(CRLF.len()) > rest.len() {
            break ChunkProgress::Incomplete;
        }
        if &rest[data_end..data_end + CRLF.len()] != CRLF {
            return Err(Error::InvalidChunkTerminator);
        }

        body.extend_from_slice(&rest[data_start..data_end]);
        consumed += data_end + CRLF.len();
    };

    pending.drain(..consumed);
    Ok(progress)
}

/// チャンクサイズ行をパース (拡張は無視)
fn parse_chunk_size(line: &[u8]) -> Result<usize, Error> {
    let line = latin1_to_string(line);
    let size_str = line.split(';').next().unwrap_or_default().trim();
    if size_str.is_empty() || !size_str.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidChunkSize(line.clone()));
    }
    usize::from_str_radix(size_str, 16).map_err(|_| Error::InvalidChunkSize(line.clone()))
}
