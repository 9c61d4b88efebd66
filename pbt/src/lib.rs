//! PBT テスト共通ユーティリティ

use http11_assembler::{Outcome, Response, ResponseAssembler, encode_chunks, encode_response_headers};
use proptest::prelude::*;
use proptest::sample::Index;

// ========================================
// レスポンス生成
// ========================================

/// 生成したレスポンスと期待値
#[derive(Debug, Clone)]
pub struct Message {
    /// 送信されるバイト列
    pub wire: Vec<u8>,
    pub status_code: u16,
    /// 前後の空白を除去した reason-phrase
    pub reason_phrase: String,
    /// デコード後のボディ
    pub body: Vec<u8>,
    pub chunked: bool,
}

/// Strict でも受理される reason-phrase: 先頭は英字、以降は英数字 / "_" / "|" / SP
pub fn reason_phrase() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("OK".to_string()),
        Just("Not Found".to_string()),
        Just("Internal Server Error".to_string()),
        "[A-Za-z][A-Za-z0-9_| ]{0,24}",
    ]
}

/// 区切り方式に関係しないヘッダー名
pub fn header_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9-]{0,15}".prop_filter("framing headers are set separately", |name| {
        !name.eq_ignore_ascii_case("content-length")
            && !name.eq_ignore_ascii_case("transfer-encoding")
    })
}

/// 表示可能 ASCII のヘッダー値
pub fn header_value() -> impl Strategy<Value = String> {
    "[!-~][ -~]{0,31}"
}

pub fn headers() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((header_name(), header_value()), 0..6)
}

/// ボディを構成するチャンク (空のチャンクは含まない)
pub fn body_chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 1..64), 0..5)
}

/// Content-Length または chunked のレスポンス
pub fn response_message() -> impl Strategy<Value = Message> {
    (
        100u16..=599,
        reason_phrase(),
        headers(),
        body_chunks(),
        any::<bool>(),
    )
        .prop_map(|(status_code, reason, headers, chunks, chunked)| {
            build_message(status_code, &reason, headers, chunks, chunked)
        })
}

/// Content-Length のレスポンス
pub fn content_length_message() -> impl Strategy<Value = Message> {
    (100u16..=599, reason_phrase(), headers(), body_chunks()).prop_map(
        |(status_code, reason, headers, chunks)| {
            build_message(status_code, &reason, headers, chunks, false)
        },
    )
}

fn build_message(
    status_code: u16,
    reason: &str,
    headers: Vec<(String, String)>,
    chunks: Vec<Vec<u8>>,
    chunked: bool,
) -> Message {
    let body: Vec<u8> = chunks.concat();
    let mut response = Response::new(status_code, reason);
    response.headers = headers;

    let wire = if chunked {
        response
            .headers
            .push(("Transfer-Encoding".to_string(), "chunked".to_string()));
        let refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
        let mut wire = encode_response_headers(&response);
        wire.extend_from_slice(&encode_chunks(&refs));
        wire
    } else {
        response.body = body.clone();
        response.encode()
    };

    Message {
        wire,
        status_code,
        reason_phrase: reason.trim().to_string(),
        body,
        chunked,
    }
}

// ========================================
// 分割
// ========================================

/// 分割位置
pub fn cuts() -> impl Strategy<Value = Vec<Index>> {
    proptest::collection::vec(any::<Index>(), 0..12)
}

/// `cuts` の位置でバイト列を分割する (空の断片は含まない)
pub fn split<'a>(data: &'a [u8], cuts: &[Index]) -> Vec<&'a [u8]> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c.index(data.len() + 1)).collect();
    points.push(0);
    points.push(data.len());
    points.sort_unstable();
    points.dedup();
    points
        .windows(2)
        .map(|w| &data[w[0]..w[1]])
        .collect()
}

/// 断片を順に渡し、すべての結果を返す
pub fn feed<'a>(
    assembler: &mut ResponseAssembler,
    fragments: impl IntoIterator<Item = &'a [u8]>,
) -> Vec<Outcome> {
    fragments
        .into_iter()
        .map(|fragment| assembler.consume(fragment))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_covers_input() {
        let data = b"abcdef";
        let fragments = split(data, &[]);
        assert_eq!(fragments, vec![&data[..]]);
        assert!(split(b"", &[]).is_empty());
    }
}
