#![no_main]

use arbitrary::Arbitrary;
use http11_assembler::{
    Outcome, Response, ResponseAssembler, encode_chunks, encode_response_headers,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzChunked {
    chunks: Vec<Vec<u8>>,
    trailers: Vec<(u8, u8)>,
    split_hint: u8,
}

fn normalize_chunks(mut chunks: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    chunks.retain(|chunk| !chunk.is_empty());
    chunks.truncate(64);
    chunks
}

/// 英小文字だけのトレーラー行
fn trailer_lines(trailers: &[(u8, u8)]) -> Vec<u8> {
    let mut buf = Vec::new();
    for &(name, value) in trailers.iter().take(8) {
        buf.push(b'x');
        buf.push(b'a' + name % 26);
        buf.extend_from_slice(b": ");
        buf.push(b'a' + value % 26);
        buf.extend_from_slice(b"\r\n");
    }
    buf
}

fuzz_target!(|input: FuzzChunked| {
    let chunks = normalize_chunks(input.chunks);
    let expected: Vec<u8> = chunks.concat();
    let refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();

    let response = Response::new(200, "OK").header("Transfer-Encoding", "chunked");
    let mut wire = encode_response_headers(&response);
    wire.extend_from_slice(&encode_chunks(&refs));

    // 終端チャンク "0\r\n" と最後の空行の間にトレーラーを挿入する
    let trailers = trailer_lines(&input.trailers);
    let final_crlf = wire.split_off(wire.len() - 2);
    wire.extend_from_slice(&trailers);
    wire.extend_from_slice(&final_crlf);

    let split_size = usize::from(input.split_hint).max(1);
    let mut assembler = ResponseAssembler::new();
    let mut last = Outcome::NeedMoreData;
    for part in wire.chunks(split_size) {
        last = assembler.consume(part);
        if last != Outcome::NeedMoreData {
            break;
        }
    }

    assert_eq!(last, Outcome::Complete);
    assert_eq!(assembler.body(), expected.as_slice());
    assert!(assembler.pending().is_empty());
});
