#![no_main]

use arbitrary::Arbitrary;
use http11_assembler::{Action, Exchange, Request};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Step {
    Begin { path: String, body: Option<Vec<u8>> },
    Data(Vec<u8>),
    Abort,
}

fuzz_target!(|steps: Vec<Step>| {
    let mut exchange = Exchange::new();
    for step in steps.into_iter().take(64) {
        match step {
            Step::Begin { path, body } => {
                let mut request = Request::post("127.0.0.1", 8080).path(&path);
                if let Some(body) = body {
                    request = request.body(body);
                }
                let wire = exchange.begin(&request);
                assert_eq!(wire, request.encode());
                assert!(exchange.is_outstanding());
            }
            Step::Data(data) => {
                let outstanding = exchange.is_outstanding();
                match exchange.on_data(&data) {
                    Action::Receive => {
                        assert_eq!(exchange.is_outstanding(), outstanding);
                    }
                    Action::Complete(response) => {
                        assert!(outstanding);
                        assert!(response.is_success());
                        assert!(!exchange.is_outstanding());
                    }
                    Action::Fail(_) => {
                        assert!(outstanding);
                        assert!(!exchange.is_outstanding());
                    }
                    Action::Discarded => {
                        assert!(!outstanding);
                    }
                }
                // 完了や失敗の後もアセンブラーは再利用可能な状態にある
                assert!(!exchange.assembler().is_complete());
                assert!(!exchange.assembler().is_failed());
            }
            Step::Abort => {
                exchange.abort();
                assert!(!exchange.is_outstanding());
                assert!(exchange.assembler().pending().is_empty());
            }
        }
    }
});
