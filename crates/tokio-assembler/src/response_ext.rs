//! Response 拡張トレイト
//!
//! http11_assembler::Response にボディを読むためのメソッドを追加する。

use http11_assembler::Response;
use std::string::FromUtf8Error;

/// Response 拡張トレイト
pub trait ResponseExt {
    /// ボディを UTF-8 文字列として取得
    fn text(&self) -> Result<String, FromUtf8Error>;

    /// ボディのバイト列への参照を取得
    fn bytes(&self) -> &[u8];

    /// ボディ全体を JSON としてパースして型 T に変換
    fn json<T>(&self) -> Result<T, JsonError>
    where
        for<'text, 'raw> T:
            TryFrom<nojson::RawJsonValue<'text, 'raw>, Error = nojson::JsonParseError>;

    /// ボディ中の最初の `{` 以降を JSON としてパースして型 T に変換
    ///
    /// 機器によっては JSON の前に余計な文字列を付けて返すため、それを読み飛ばす
    fn json_object<T>(&self) -> Result<T, JsonError>
    where
        for<'text, 'raw> T:
            TryFrom<nojson::RawJsonValue<'text, 'raw>, Error = nojson::JsonParseError>;
}

impl ResponseExt for Response {
    fn text(&self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    fn bytes(&self) -> &[u8] {
        &self.body
    }

    fn json<T>(&self) -> Result<T, JsonError>
    where
        for<'text, 'raw> T:
            TryFrom<nojson::RawJsonValue<'text, 'raw>, Error = nojson::JsonParseError>,
    {
        let text = std::str::from_utf8(&self.body).map_err(JsonError::Utf8)?;
        parse_json(text)
    }

    fn json_object<T>(&self) -> Result<T, JsonError>
    where
        for<'text, 'raw> T:
            TryFrom<nojson::RawJsonValue<'text, 'raw>, Error = nojson::JsonParseError>,
    {
        parse_json(object_text(&self.body)?)
    }
}

fn parse_json<T>(text: &str) -> Result<T, JsonError>
where
    for<'text, 'raw> T:
        TryFrom<nojson::RawJsonValue<'text, 'raw>, Error = nojson::JsonParseError>,
{
    let raw = nojson::RawJson::parse(text).map_err(JsonError::Parse)?;
    let value: T = raw.value().try_into().map_err(JsonError::Parse)?;
    Ok(value)
}

/// 最初の `{` から末尾までを切り出す
fn object_text(body: &[u8]) -> Result<&str, JsonError> {
    let start = body
        .iter()
        .position(|&b| b == b'{')
        .ok_or(JsonError::NoObject)?;
    std::str::from_utf8(&body[start..]).map_err(JsonError::Utf8)
}

/// JSON パースエラー
#[derive(Debug)]
pub enum JsonError {
    /// UTF-8 デコードエラー
    Utf8(std::str::Utf8Error),
    /// JSON パースエラー
    Parse(nojson::JsonParseError),
    /// ボディに `{` が含まれない
    NoObject,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonError::Utf8(e) => write!(f, "UTF-8 decode error: {}", e),
            JsonError::Parse(e) => write!(f, "JSON parse error: {}", e),
            JsonError::NoObject => write!(f, "no JSON object in body"),
        }
    }
}

impl std::error::Error for JsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JsonError::Utf8(e) => Some(e),
            JsonError::Parse(e) => Some(e),
            JsonError::NoObject => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn response(body: &[u8]) -> Response {
        Response::new(200, "OK").body(body.to_vec())
    }

    #[test]
    fn text_and_bytes() {
        let response = response(b"hello");
        assert_eq!(response.text().unwrap(), "hello");
        assert_eq!(response.bytes(), b"hello");
        assert!(Response::new(200, "OK").body(vec![0xff]).text().is_err());
    }

    #[test]
    fn json_whole_body() {
        let value: Vec<u32> = response(b"[1, 2, 3]").json().unwrap();
        assert_eq!(value, vec![1, 2, 3]);
        assert!(matches!(
            response(b"ok [1]").json::<Vec<u32>>(),
            Err(JsonError::Parse(_))
        ));
    }

    #[test]
    fn json_object_skips_prefix() {
        let value: BTreeMap<String, u32> = response(b"OK\r\n{\"level\": 7}").json_object().unwrap();
        assert_eq!(value.get("level"), Some(&7));
    }

    #[test]
    fn object_text_slicing() {
        assert_eq!(object_text(b"garbage{\"a\":1}").unwrap(), "{\"a\":1}");
        assert!(matches!(object_text(b"[1, 2]"), Err(JsonError::NoObject)));
        // 先頭の非 UTF-8 バイトは読み飛ばされる
        assert_eq!(object_text(b"\xff\xfe{}").unwrap(), "{}");
    }
}
