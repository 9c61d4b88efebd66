//! アセンブル状態の定義

/// ボディの終端判定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Content-Length で指定された固定長
    ContentLength(usize),
    /// Transfer-Encoding: chunked
    Chunked,
}

/// アセンブル状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// ヘッダーブロック待ち
    Header,
    /// ボディ読み取り中
    Body(Framing),
    /// 完了 (reset 待ち)
    Complete,
    /// 失敗 (reset 待ち)
    Failed,
}
