/// アセンブラーの制限設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerLimits {
    /// ヘッダーブロック終端が見つかるまでに溜められる最大バイト数 (デフォルト: 64KB)
    pub max_header_block_size: usize,
    /// 最大ヘッダー数 (デフォルト: 100)
    pub max_headers_count: usize,
    /// 最大ボディサイズ (デフォルト: 10MB)
    pub max_body_size: usize,
    /// 最大チャンクサイズ行長 (デフォルト: 64バイト)
    ///
    /// チャンクサイズは 16 進数で表現されるため、通常は非常に短い。
    /// 例: "FFFFFFFF\r\n" (4GB) でも 10 バイト程度。
    pub max_chunk_line_size: usize,
}

impl Default for AssemblerLimits {
    fn default() -> Self {
        Self {
            max_header_block_size: 64 * 1024, // 64KB
            max_headers_count: 100,
            max_body_size: 10 * 1024 * 1024, // 10MB
            max_chunk_line_size: 64,         // 64 bytes
        }
    }
}

impl AssemblerLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_header_block_size: usize::MAX,
            max_headers_count: usize::MAX,
            max_body_size: usize::MAX,
            max_chunk_line_size: usize::MAX,
        }
    }
}

/// ステータスラインの受理文法
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusLinePolicy {
    /// `HTTP/d.d SP 1*DIGIT SP 1*(ALNUM / "_" / "|" / SP)`
    ///
    /// 記号を含む reason-phrase (例: "I'm a teapot") は拒否する
    #[default]
    Strict,
    /// reason-phrase に HTAB / SP / VCHAR / obs-text を許可し、空も許可する
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let limits = AssemblerLimits::default();
        assert_eq!(limits.max_header_block_size, 65536);
        assert_eq!(limits.max_headers_count, 100);
        assert_eq!(limits.max_chunk_line_size, 64);
        assert_eq!(StatusLinePolicy::default(), StatusLinePolicy::Strict);
    }
}
