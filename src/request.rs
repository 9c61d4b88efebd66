use crate::auth::BasicAuth;

/// 既定の Content-Type
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// 既定の Connection
pub const DEFAULT_CONNECTION: &str = "keep-alive";

/// エンコード時に専用の位置へ出力されるヘッダー名
///
/// 利用者が `header()` で追加しても追加ヘッダーとしては出力しない
pub(crate) const RESERVED_HEADERS: [&str; 5] = [
    "Content-Type",
    "Host",
    "Connection",
    "Content-Length",
    "Authorization",
];

/// HTTP リクエスト
///
/// 常に `HTTP/1.1` で送信する。ヘッダーの出力順は `encode()` を参照。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP メソッド (GET, POST, etc.)
    pub method: String,
    /// リクエストパス (デフォルト: /)
    pub path: String,
    /// 接続先ホスト
    pub host: String,
    /// 接続先ポート
    pub port: u16,
    /// 追加ヘッダー
    pub headers: Vec<(String, String)>,
    /// Basic 認証
    pub credentials: Option<BasicAuth>,
    /// ボディ
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// 新しいリクエストを作成
    pub fn new(method: &str, host: &str, port: u16) -> Self {
        Self {
            method: method.to_string(),
            path: "/".to_string(),
            host: host.to_string(),
            port,
            headers: Vec::new(),
            credentials: None,
            body: None,
        }
    }

    /// GET リクエストを作成
    pub fn get(host: &str, port: u16) -> Self {
        Self::new("GET", host, port)
    }

    /// POST リクエストを作成
    pub fn post(host: &str, port: u16) -> Self {
        Self::new("POST", host, port)
    }

    /// パスを設定 (ビルダーパターン)
    ///
    /// 空文字列は `/` として扱う
    pub fn path(mut self, path: &str) -> Self {
        self.path = if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        };
        self
    }

    /// ヘッダーを追加 (ビルダーパターン)
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Basic 認証を設定 (ビルダーパターン)
    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(BasicAuth::new(username, password));
        self
    }

    /// ボディを設定 (ビルダーパターン)
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// ヘッダーを取得 (大文字小文字を区別しない)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// ヘッダーが存在するか確認
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Content-Type (未指定なら `application/json`)
    pub fn content_type(&self) -> &str {
        self.get_header("Content-Type").unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Connection (未指定なら `keep-alive`)
    pub fn connection(&self) -> &str {
        self.get_header("Connection").unwrap_or(DEFAULT_CONNECTION)
    }

    /// Host ヘッダー値 (`host:port`)
    pub fn host_header(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// ボディのバイト数 (ボディなしは 0)
    pub fn content_length(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// 専用の位置に出力されない追加ヘッダー
    pub fn extra_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter(|(n, _)| !is_reserved(n))
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

fn is_reserved(name: &str) -> bool {
    RESERVED_HEADERS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let request = Request::get("192.168.1.10", 8080);
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/");
        assert_eq!(request.content_type(), "application/json");
        assert_eq!(request.connection(), "keep-alive");
        assert_eq!(request.host_header(), "192.168.1.10:8080");
        assert_eq!(request.content_length(), 0);
        assert!(request.credentials.is_none());
    }

    #[test]
    fn empty_path_is_root() {
        assert_eq!(Request::get("h", 80).path("").path, "/");
        assert_eq!(Request::get("h", 80).path("/api/v1").path, "/api/v1");
    }

    #[test]
    fn caller_overrides() {
        let request = Request::post("h", 80)
            .header("content-type", "text/plain")
            .header("CONNECTION", "close")
            .body(b"abc".to_vec());
        assert_eq!(request.content_type(), "text/plain");
        assert_eq!(request.connection(), "close");
        assert_eq!(request.content_length(), 3);
    }

    #[test]
    fn reserved_headers_are_filtered() {
        let request = Request::get("h", 80)
            .header("X-Token", "abc")
            .header("host", "evil:1")
            .header("Content-Length", "999")
            .header("authorization", "Bearer x")
            .header("Accept", "*/*");
        let extra: Vec<_> = request.extra_headers().collect();
        assert_eq!(extra, vec![("X-Token", "abc"), ("Accept", "*/*")]);
    }
}
