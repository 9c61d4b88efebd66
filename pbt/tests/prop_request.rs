//! Request エンコードのプロパティテスト

use http11_assembler::Request;
use proptest::prelude::*;

fn method() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("GET".to_string()),
        Just("POST".to_string()),
        Just("PUT".to_string()),
        Just("DELETE".to_string()),
    ]
}

fn path() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "/[a-zA-Z0-9/_.-]{0,32}"]
}

fn header() -> impl Strategy<Value = (String, String)> {
    (
        prop_oneof![
            "X-[A-Za-z0-9-]{1,12}",
            Just("content-type".to_string()),
            Just("Host".to_string()),
            Just("CONNECTION".to_string()),
            Just("Content-Length".to_string()),
            Just("Authorization".to_string()),
        ],
        "[!-~]{1,16}",
    )
}

fn request() -> impl Strategy<Value = Request> {
    (
        method(),
        path(),
        "[a-z0-9.]{1,16}",
        any::<u16>(),
        proptest::collection::vec(header(), 0..6),
        proptest::option::of(("[a-z]{1,8}", "[ -~]{0,8}")),
        proptest::option::of(proptest::collection::vec(any::<u8>(), 0..64)),
    )
        .prop_map(|(method, path, host, port, headers, credentials, body)| {
            let mut request = Request::new(&method, &host, port).path(&path);
            for (name, value) in &headers {
                request = request.header(name, value);
            }
            if let Some((user, password)) = credentials {
                request = request.basic_auth(&user, &password);
            }
            if let Some(body) = body {
                request = request.body(body);
            }
            request
        })
}

/// ヘッダーブロックの行 (リクエストラインを除く)
fn header_lines(encoded: &[u8]) -> Vec<String> {
    let end = encoded
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .unwrap();
    String::from_utf8_lossy(&encoded[..end])
        .split("\r\n")
        .skip(1)
        .map(str::to_string)
        .collect()
}

fn name_of(line: &str) -> String {
    line.split_once(": ").unwrap().0.to_ascii_lowercase()
}

proptest! {
    #[test]
    fn request_line(request in request()) {
        let encoded = request.encode();
        let expected = format!("{} {} HTTP/1.1\r\n", request.method, request.path);
        prop_assert!(encoded.starts_with(expected.as_bytes()));
        prop_assert!(request.path.starts_with('/'));
    }
}

proptest! {
    #[test]
    fn header_order(request in request()) {
        let encoded = request.encode();
        let names: Vec<String> = header_lines(&encoded).iter().map(|l| name_of(l)).collect();

        let mut expected = Vec::new();
        if request.credentials.is_some() {
            expected.push("authorization".to_string());
        }
        expected.extend(["content-type", "host", "connection"].map(String::from));
        expected.extend(request.extra_headers().map(|(n, _)| n.to_ascii_lowercase()));
        expected.push("content-length".to_string());

        prop_assert_eq!(names, expected);
    }
}

proptest! {
    #[test]
    fn content_length_matches_body(request in request()) {
        let encoded = request.encode();
        let lines = header_lines(&encoded);
        let length_line = format!("Content-Length: {}", request.content_length());
        prop_assert_eq!(lines.last(), Some(&length_line));

        let body = request.body.clone().unwrap_or_default();
        prop_assert!(encoded.ends_with(&body));
        let head_len = encoded.len() - body.len();
        prop_assert!(encoded[..head_len].ends_with(b"\r\n\r\n"));
    }
}

proptest! {
    #[test]
    fn host_header_uses_port(request in request()) {
        let lines = header_lines(&request.encode());
        let host_line = format!("Host: {}:{}", request.host, request.port);
        prop_assert!(lines.contains(&host_line));
    }
}
