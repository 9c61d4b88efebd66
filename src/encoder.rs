use crate::request::Request;
use crate::response::Response;

/// ヘッダー行を追加
fn push_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

/// リクエストをエンコード
///
/// ヘッダーは次の順で出力する:
///
/// 1. Authorization (Basic 認証が設定されている場合)
/// 2. Content-Type
/// 3. Host
/// 4. Connection
/// 5. 追加ヘッダー (追加した順)
/// 6. Content-Length (ボディなしでも常に出力)
pub fn encode_request(request: &Request) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128 + request.content_length());

    // Request line: METHOD SP PATH SP HTTP/1.1 CRLF
    buf.extend_from_slice(request.method.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(request.path.as_bytes());
    buf.extend_from_slice(b" HTTP/1.1\r\n");

    if let Some(credentials) = &request.credentials {
        push_header(&mut buf, "Authorization", &credentials.to_header_value());
    }
    push_header(&mut buf, "Content-Type", request.content_type());
    push_header(&mut buf, "Host", &request.host_header());
    push_header(&mut buf, "Connection", request.connection());

    for (name, value) in request.extra_headers() {
        push_header(&mut buf, name, value);
    }

    push_header(
        &mut buf,
        "Content-Length",
        &request.content_length().to_string(),
    );

    buf.extend_from_slice(b"\r\n");

    if let Some(body) = &request.body {
        buf.extend_from_slice(body);
    }

    buf
}

/// レスポンスヘッダーのみをエンコード (ボディなし)
///
/// Transfer-Encoding: chunked を指定した場合は、続けて `encode_chunks` の結果を送る。
pub fn encode_response_headers(response: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line: VERSION SP STATUS-CODE SP REASON-PHRASE CRLF
    buf.extend_from_slice(response.version.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(response.status_code.to_string().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(response.reason_phrase.as_bytes());
    buf.extend_from_slice(b"\r\n");

    for (name, value) in &response.headers {
        push_header(&mut buf, name, value);
    }

    buf.extend_from_slice(b"\r\n");

    buf
}

/// レスポンスをエンコード
///
/// Content-Length も Transfer-Encoding も指定されていなければ Content-Length を付与する
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut buf = encode_response_headers(response);
    if !response.has_header("Content-Length") && !response.has_header("Transfer-Encoding") {
        // ヘッダーブロック終端の空行の前に差し込む
        buf.truncate(buf.len() - 2);
        push_header(&mut buf, "Content-Length", &response.body.len().to_string());
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(&response.body);
    buf
}

impl Request {
    /// リクエストをバイト列にエンコード
    pub fn encode(&self) -> Vec<u8> {
        encode_request(self)
    }
}

impl Response {
    /// レスポンスをバイト列にエンコード
    pub fn encode(&self) -> Vec<u8> {
        encode_response(self)
    }
}

/// 1 つのチャンクをエンコード
///
/// 空のデータを渡すと終端チャンク (0\r\n\r\n) を生成する。
pub fn encode_chunk(data: &[u8]) -> Vec<u8> {
    let mut buf = format!("{:x}\r\n", data.len()).into_bytes();
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
    buf
}

/// 複数のデータを chunked 形式でエンコード (終端チャンク付き)
///
/// 空のデータは終端チャンクと区別できないため読み飛ばす。
pub fn encode_chunks(chunks: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::new();
    for chunk in chunks.iter().filter(|c| !c.is_empty()) {
        buf.extend_from_slice(&encode_chunk(chunk));
    }
    buf.extend_from_slice(&encode_chunk(&[]));
    buf
}
