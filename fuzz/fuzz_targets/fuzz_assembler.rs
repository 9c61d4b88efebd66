#![no_main]

use arbitrary::Arbitrary;
use http11_assembler::{AssemblerLimits, Error, Outcome, ResponseAssembler, StatusLinePolicy};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzAssembler {
    data: Vec<u8>,
    /// 分割位置 (data の長さで剰余を取る)
    cuts: Vec<u16>,
    lenient: bool,
    small_limits: bool,
}

fn fragments<'a>(data: &'a [u8], cuts: &[u16]) -> Vec<&'a [u8]> {
    let mut points: Vec<usize> = cuts
        .iter()
        .take(64)
        .map(|&c| usize::from(c) % (data.len() + 1))
        .collect();
    points.push(0);
    points.push(data.len());
    points.sort_unstable();
    points.dedup();
    points.windows(2).map(|w| &data[w[0]..w[1]]).collect()
}

fn run(assembler: &mut ResponseAssembler, parts: &[&[u8]]) -> Option<Outcome> {
    for part in parts {
        match assembler.consume(part) {
            Outcome::NeedMoreData => {}
            outcome => return Some(outcome),
        }
    }
    None
}

fuzz_target!(|input: FuzzAssembler| {
    let limits = if input.small_limits {
        AssemblerLimits {
            max_header_block_size: 512,
            max_headers_count: 8,
            max_body_size: 1024,
            max_chunk_line_size: 16,
        }
    } else {
        AssemblerLimits::default()
    };
    let policy = if input.lenient {
        StatusLinePolicy::Lenient
    } else {
        StatusLinePolicy::Strict
    };

    // 一括
    let mut whole = ResponseAssembler::with_options(limits.clone(), policy);
    let whole_outcome = whole.consume(&input.data);

    // 分割
    let parts = fragments(&input.data, &input.cuts);
    let mut parted = ResponseAssembler::with_options(limits.clone(), policy);
    let parted_outcome = run(&mut parted, &parts);

    // 完成したメッセージは分割に依存しない
    if whole_outcome == Outcome::Complete {
        assert_eq!(parted_outcome, Some(Outcome::Complete));
        assert_eq!(whole.status_code(), parted.status_code());
        assert_eq!(whole.headers(), parted.headers());
        assert_eq!(whole.body(), parted.body());
    }
    if parted_outcome == Some(Outcome::Complete) {
        assert!(parted.body().len() <= limits.max_body_size);
    }

    // 終端状態では reset が必要
    if parted_outcome.is_some() {
        assert_eq!(
            parted.consume(b"HTTP/1.1 200 OK\r\n"),
            Outcome::Failed(Error::ResetRequired)
        );
    }

    // reset 後は新しいインスタンスと同じ
    parted.reset();
    assert!(parted.headers().is_none());
    assert!(parted.body().is_empty());
    assert!(parted.pending().is_empty());
    let mut fresh = ResponseAssembler::with_options(limits, policy);
    assert_eq!(parted.consume(&input.data), fresh.consume(&input.data));
});
