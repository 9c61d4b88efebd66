//! Basic 認証の資格情報
//!
//! リクエストの `Authorization` ヘッダー値を生成する。
//!
//! ```rust
//! use http11_assembler::auth::BasicAuth;
//!
//! let auth = BasicAuth::new("user", "password");
//! assert_eq!(auth.to_header_value(), "Basic dXNlcjpwYXNzd29yZA==");
//! ```

use core::fmt;

/// Basic 認証 (RFC 7617)
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    /// 新しい Basic 認証を作成
    pub fn new(username: &str, password: &str) -> Self {
        BasicAuth {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// ユーザー名を取得
    pub fn username(&self) -> &str {
        &self.username
    }

    /// パスワードを取得
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Authorization ヘッダー値を生成
    pub fn to_header_value(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        format!("Basic {}", base64_encode(credentials.as_bytes()))
    }
}

// パスワードをログに出さない
impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl fmt::Display for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// 標準 Base64 (パディングあり) でエンコード
fn base64_encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);

    for group in input.chunks(3) {
        let mut bytes = [0u8; 3];
        bytes[..group.len()].copy_from_slice(group);
        let n = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);

        // 入力 1 バイトにつき 6 ビット単位で 1 文字余分に出力される
        for i in 0..4 {
            if i <= group.len() {
                let index = (n >> (18 - 6 * i)) & 0x3F;
                out.push(char::from(BASE64_ALPHABET[index as usize]));
            } else {
                out.push('=');
            }
        }
    }

    out
}
