//! ステータスラインとヘッダーブロックのパース

use crate::error::Error;
use crate::limits::{AssemblerLimits, StatusLinePolicy};

/// 行の終端
pub(crate) const CRLF: &[u8] = b"\r\n";

/// ヘッダーブロックの終端 (空行)
pub(crate) const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// レスポンスヘッダー
///
/// フィールド名は小文字化、値は前後の空白を除去して小文字化して保持する。
/// 同じ名前が複数回現れた場合は後の値で上書きする (位置は最初の出現のまま)。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    /// HTTP バージョン (HTTP/1.1 等)
    pub version: String,
    /// ステータスコード (200, 404, etc.)
    pub status_code: u16,
    /// ステータスフレーズ (大文字小文字は受信したまま)
    pub reason_phrase: String,
    /// ヘッダーフィールド
    pub fields: Vec<(String, String)>,
}

impl ResponseHeader {
    /// ヘッダーを取得 (大文字小文字を区別しない)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// ヘッダーが存在するか確認
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Transfer-Encoding ヘッダーの値を取得
    pub fn transfer_encoding(&self) -> Option<&str> {
        self.get("transfer-encoding")
    }

    /// Content-Length ヘッダーの値をパース
    ///
    /// ヘッダーがない場合は `None`、数値でない場合は `Some(Err(_))` を返す
    pub fn content_length(&self) -> Option<Result<usize, Error>> {
        self.get("content-length").map(parse_content_length)
    }

    /// キープアライブ接続かどうかを判定
    ///
    /// Connection ヘッダーはカンマ区切りのトークンリストとして扱う (RFC 9110)
    pub fn is_keep_alive(&self) -> bool {
        if let Some(connection) = self.get("connection") {
            let mut has_keep_alive = false;
            for token in connection.split(',').map(str::trim) {
                if token == "close" {
                    return false;
                }
                if token == "keep-alive" {
                    has_keep_alive = true;
                }
            }
            if has_keep_alive {
                return true;
            }
        }
        self.version.ends_with("/1.1")
    }

    /// ステータスコードが情報レスポンス (1xx) か確認
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.status_code)
    }

    /// ステータスコードが成功 (2xx) か確認
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// ステータスコードがリダイレクト (3xx) か確認
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    /// ステータスコードがクライアントエラー (4xx) か確認
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// ステータスコードがサーバーエラー (5xx) か確認
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }
}

/// ヘッダーブロック (終端の空行を含まない) をパース
pub(crate) fn parse_header_block(
    block: &[u8],
    limits: &AssemblerLimits,
    policy: StatusLinePolicy,
) -> Result<ResponseHeader, Error> {
    let text = latin1_to_string(block);
    let mut lines = text.split("\r\n");

    let status_line = lines.next().unwrap_or_default();
    let (version, status_code, reason_phrase) = parse_status_line(status_line, policy)?;

    let mut fields: Vec<(String, String)> = Vec::new();
    for line in lines {
        let (name, value) = parse_header_line(line)?;
        if let Some(slot) = fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
            continue;
        }
        if fields.len() >= limits.max_headers_count {
            return Err(Error::TooManyHeaders {
                count: fields.len() + 1,
                limit: limits.max_headers_count,
            });
        }
        fields.push((name, value));
    }

    Ok(ResponseHeader {
        version,
        status_code,
        reason_phrase,
        fields,
    })
}

/// ステータスラインをパース
///
/// Parse: VERSION SP STATUS-CODE SP REASON-PHRASE
fn parse_status_line(
    line: &str,
    policy: StatusLinePolicy,
) -> Result<(String, u16, String), Error> {
    let invalid = || Error::InvalidStatusLine(line.to_string());

    let (version, rest) = line.split_once(' ').ok_or_else(invalid)?;
    if !is_valid_version(version) {
        return Err(invalid());
    }

    let (code, reason) = match (rest.split_once(' '), policy) {
        (Some(parts), _) => parts,
        (None, StatusLinePolicy::Lenient) => (rest, ""),
        (None, StatusLinePolicy::Strict) => return Err(invalid()),
    };

    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let status_code: u16 = code.parse().map_err(|_| invalid())?;

    let reason_ok = match policy {
        StatusLinePolicy::Strict => !reason.is_empty() && reason.chars().all(is_strict_reason_char),
        StatusLinePolicy::Lenient => reason.chars().all(is_lenient_reason_char),
    };
    if !reason_ok {
        return Err(invalid());
    }

    Ok((version.to_string(), status_code, reason.trim().to_string()))
}

/// HTTP-version = "HTTP/" DIGIT "." DIGIT
fn is_valid_version(version: &str) -> bool {
    matches!(
        version.as_bytes(),
        [b'H', b'T', b'T', b'P', b'/', major, b'.', minor]
            if major.is_ascii_digit() && minor.is_ascii_digit()
    )
}

/// 英数字 / "_" / "|" / SP
fn is_strict_reason_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '|' | ' ')
}

/// HTAB / SP / VCHAR / obs-text
fn is_lenient_reason_char(c: char) -> bool {
    matches!(c, '\t' | ' '..='~' | '\u{80}'..='\u{ff}')
}

/// ヘッダー行をパース
///
/// 最初の `": "` で一度だけ分割する。名前は小文字化、値は trim して小文字化する。
fn parse_header_line(line: &str) -> Result<(String, String), Error> {
    let (name, value) = line
        .split_once(": ")
        .ok_or_else(|| Error::InvalidHeaderLine(line.to_string()))?;
    Ok((name.to_lowercase(), value.trim().to_lowercase()))
}

/// Content-Length 値をパース
fn parse_content_length(value: &str) -> Result<usize, Error> {
    let invalid = || Error::InvalidContentLength(value.to_string());
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

/// バイト列を 1 バイト 1 文字 (ISO-8859-1) として文字列化
///
/// UTF-8 としては解釈しないため、任意のバイト値で失敗しない
pub(crate) fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// 部分列の位置を探す
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(block: &str) -> Result<ResponseHeader, Error> {
        parse_header_block(
            block.as_bytes(),
            &AssemblerLimits::default(),
            StatusLinePolicy::Strict,
        )
    }

    fn parse_lenient(block: &str) -> Result<ResponseHeader, Error> {
        parse_header_block(
            block.as_bytes(),
            &AssemblerLimits::default(),
            StatusLinePolicy::Lenient,
        )
    }

    #[test]
    fn status_line_ok() {
        let header = parse("HTTP/1.1 200 OK").unwrap();
        assert_eq!(header.version, "HTTP/1.1");
        assert_eq!(header.status_code, 200);
        assert_eq!(header.reason_phrase, "OK");
        assert!(header.fields.is_empty());
    }

    #[test]
    fn status_line_reason_with_spaces_keeps_case() {
        let header = parse("HTTP/1.0 500 Internal Server Error").unwrap();
        assert_eq!(header.version, "HTTP/1.0");
        assert_eq!(header.status_code, 500);
        assert_eq!(header.reason_phrase, "Internal Server Error");
    }

    #[test]
    fn status_line_reason_is_trimmed() {
        let header = parse("HTTP/1.1 404  Not Found ").unwrap();
        assert_eq!(header.reason_phrase, "Not Found");
    }

    #[test]
    fn status_line_garbage() {
        assert_eq!(
            parse("GARBAGE"),
            Err(Error::InvalidStatusLine("GARBAGE".to_string()))
        );
        assert!(parse("").is_err());
        assert!(parse("HTTP/1.1 OK").is_err());
        assert!(parse("HTTP/11 200 OK").is_err());
        assert!(parse("HTTP/1.1 2x0 OK").is_err());
        assert!(parse("HTTP/1.1 99999 OK").is_err());
        assert!(parse("ICY 200 OK").is_err());
    }

    #[test]
    fn strict_rejects_punctuation_in_reason() {
        assert!(parse("HTTP/1.1 418 I'm a teapot").is_err());
        assert!(parse("HTTP/1.1 200 OK.").is_err());
        // 空の reason-phrase も拒否
        assert!(parse("HTTP/1.1 204 ").is_err());
        assert!(parse("HTTP/1.1 204").is_err());
    }

    #[test]
    fn strict_accepts_underscore_and_pipe() {
        let header = parse("HTTP/1.1 200 OK_1|2").unwrap();
        assert_eq!(header.reason_phrase, "OK_1|2");
    }

    #[test]
    fn lenient_accepts_punctuation_and_empty_reason() {
        let header = parse_lenient("HTTP/1.1 418 I'm a teapot").unwrap();
        assert_eq!(header.reason_phrase, "I'm a teapot");

        let header = parse_lenient("HTTP/1.1 204 ").unwrap();
        assert_eq!(header.reason_phrase, "");

        let header = parse_lenient("HTTP/1.1 204").unwrap();
        assert_eq!(header.status_code, 204);

        assert!(parse_lenient("GARBAGE").is_err());
        assert!(parse_lenient("HTTP/1.1 200 bad\x01").is_err());
    }

    #[test]
    fn header_fields_lowercased_and_trimmed() {
        let header = parse("HTTP/1.1 200 OK\r\nContent-Type:  Application/JSON \r\nX-Id: AbC").unwrap();
        assert_eq!(
            header.fields,
            vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("x-id".to_string(), "abc".to_string()),
            ]
        );
        assert_eq!(header.get("Content-Type"), Some("application/json"));
        assert!(header.contains("X-ID"));
    }

    #[test]
    fn header_value_split_once() {
        let header = parse("HTTP/1.1 200 OK\r\nLocation: http: //x").unwrap();
        assert_eq!(header.get("location"), Some("http: //x"));
    }

    #[test]
    fn header_missing_separator() {
        assert_eq!(
            parse("HTTP/1.1 200 OK\r\nContent-Length:5"),
            Err(Error::InvalidHeaderLine("Content-Length:5".to_string()))
        );
        assert!(parse("HTTP/1.1 200 OK\r\nbroken").is_err());
    }

    #[test]
    fn duplicate_header_overwrites() {
        let header = parse("HTTP/1.1 200 OK\r\nX-A: 1\r\nX-B: 2\r\nx-a: 3").unwrap();
        assert_eq!(header.fields.len(), 2);
        assert_eq!(header.fields[0], ("x-a".to_string(), "3".to_string()));
    }

    #[test]
    fn too_many_headers() {
        let limits = AssemblerLimits {
            max_headers_count: 1,
            ..AssemblerLimits::default()
        };
        let result = parse_header_block(
            b"HTTP/1.1 200 OK\r\nA: 1\r\nB: 2",
            &limits,
            StatusLinePolicy::Strict,
        );
        assert_eq!(result, Err(Error::TooManyHeaders { count: 2, limit: 1 }));
    }

    #[test]
    fn content_length_parse() {
        let header = parse("HTTP/1.1 200 OK\r\nContent-Length: 42").unwrap();
        assert_eq!(header.content_length(), Some(Ok(42)));

        let header = parse("HTTP/1.1 200 OK\r\nContent-Length: -1").unwrap();
        assert!(matches!(
            header.content_length(),
            Some(Err(Error::InvalidContentLength(_)))
        ));

        let header = parse("HTTP/1.1 200 OK").unwrap();
        assert_eq!(header.content_length(), None);
    }

    #[test]
    fn non_utf8_header_bytes() {
        let block = b"HTTP/1.1 200 OK\r\nX-Raw: \xff\xfe";
        let header =
            parse_header_block(block, &AssemblerLimits::default(), StatusLinePolicy::Strict)
                .unwrap();
        assert_eq!(header.get("x-raw"), Some("\u{ff}\u{fe}"));
    }

    #[test]
    fn keep_alive() {
        let header = parse("HTTP/1.1 200 OK").unwrap();
        assert!(header.is_keep_alive());
        let header = parse("HTTP/1.1 200 OK\r\nConnection: Close").unwrap();
        assert!(!header.is_keep_alive());
        let header = parse("HTTP/1.0 200 OK").unwrap();
        assert!(!header.is_keep_alive());
        let header = parse("HTTP/1.0 200 OK\r\nConnection: Keep-Alive").unwrap();
        assert!(header.is_keep_alive());
    }

    #[test]
    fn status_classes() {
        assert!(parse("HTTP/1.1 101 Switching Protocols").unwrap().is_informational());
        assert!(parse("HTTP/1.1 204 No Content").unwrap().is_success());
        assert!(parse("HTTP/1.1 301 Moved Permanently").unwrap().is_redirect());
        assert!(parse("HTTP/1.1 404 Not Found").unwrap().is_client_error());
        assert!(parse("HTTP/1.1 503 Service Unavailable").unwrap().is_server_error());
    }

    #[test]
    fn find_subsequence() {
        assert_eq!(find(b"ab\r\n\r\ncd", HEADER_TERMINATOR), Some(2));
        assert_eq!(find(b"ab\r\ncd", HEADER_TERMINATOR), None);
        assert_eq!(find(b"", CRLF), None);
    }
}
