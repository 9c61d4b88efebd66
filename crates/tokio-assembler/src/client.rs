//! HTTP/HTTPS クライアント
//!
//! 1 回の `read()` で得たデータをそのまま 1 回 `Exchange::on_data()` に渡す。
//! レスポンスが完成するか失敗するまで次のリクエストは送らない。
//!
//! ## 使い方
//!
//! ```ignore
//! use std::time::Duration;
//! use tokio_http11_assembler::{Client, Connection, Request};
//!
//! // 1 リクエストごとに接続する
//! let client = Client::new().read_timeout(Duration::from_secs(5));
//! let response = client.send(&Request::get("192.168.0.20", 80).path("/status")).await?;
//!
//! // 同じ接続で複数のリクエストを送る
//! let mut conn = Connection::connect("192.168.0.20", 80, Duration::from_secs(3)).await?;
//! let response = conn.send(&Request::get("192.168.0.20", 80).path("/a")).await?;
//! let response = conn.send(&Request::get("192.168.0.20", 80).path("/b")).await?;
//!
//! // HTTPS (OS のルート証明書を自動使用)
//! let client = Client::new().tls(true);
//! let response = client.send(&Request::get("example.com", 443)).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use http11_assembler::{
    Action, AssemblerLimits, Exchange, Request, Response, StatusLinePolicy,
};
use log::{debug, warn};
use rustls::ClientConfig;
use rustls_pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error::{Error, Result};

const READ_BUFFER_SIZE: usize = 8192;

/// OS のルート証明書ストアを使用するデフォルトの TLS 設定を作成
fn default_tls_config() -> Arc<ClientConfig> {
    Arc::new(
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(rustls_platform_verifier::Verifier::new()))
            .with_no_client_auth(),
    )
}

/// HTTP クライアント
///
/// `send()` のたびに `Request` の host:port へ新しく接続する。
#[derive(Clone)]
pub struct Client {
    connect_timeout: Duration,
    read_timeout: Duration,
    use_tls: bool,
    tls_config: Option<Arc<ClientConfig>>,
    limits: AssemblerLimits,
    policy: StatusLinePolicy,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// 新しいクライアントを作成
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            use_tls: false,
            tls_config: None,
            limits: AssemblerLimits::default(),
            policy: StatusLinePolicy::default(),
        }
    }

    /// HTTPS を使うかどうか
    pub fn tls(mut self, enabled: bool) -> Self {
        self.use_tls = enabled;
        self
    }

    /// TLS 設定を指定 (HTTPS が有効になる)
    pub fn tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.use_tls = true;
        self.tls_config = Some(config);
        self
    }

    /// 接続タイムアウトを設定
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// 読み取りタイムアウトを設定
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// アセンブラーの制限を設定
    pub fn limits(mut self, limits: AssemblerLimits) -> Self {
        self.limits = limits;
        self
    }

    /// ステータスラインの文法を設定
    pub fn status_line_policy(mut self, policy: StatusLinePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 接続を確立
    pub async fn connect(&self, host: &str, port: u16) -> Result<Connection> {
        let connection = if self.use_tls {
            Connection::connect_tls(host, port, self.tls_config.clone(), self.connect_timeout)
                .await?
        } else {
            Connection::connect(host, port, self.connect_timeout).await?
        };
        let mut connection = connection.with_options(self.limits.clone(), self.policy);
        connection.set_read_timeout(self.read_timeout);
        Ok(connection)
    }

    /// リクエストを送信してレスポンスを受信
    ///
    /// 2xx 以外のステータスは `Error::Status` になる
    pub async fn send(&self, request: &Request) -> Result<Response> {
        let mut connection = self.connect(&request.host, request.port).await?;
        connection.send(request).await
    }
}

/// HTTP 接続 (Keep-Alive 対応)
///
/// 同じ接続で複数のリクエストを順番に送信する場合に使用する。
/// 送受信に失敗した接続は閉じられ、以降の `send()` は `Error::ConnectionClosed` になる。
pub struct Connection {
    stream: ConnectionStream,
    exchange: Exchange,
    /// 前のレスポンスの残りがソケットに残っている可能性がある
    closed: bool,
    read_timeout: Duration,
    host: String,
    port: u16,
}

enum ConnectionStream {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl Connection {
    /// TCP で接続を確立
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let stream = tcp_connect(host, port, timeout).await?;
        Ok(Self::new(ConnectionStream::Plain(stream), host, port))
    }

    /// TLS で接続を確立
    ///
    /// `tls_config` が `None` の場合は OS のルート証明書を使用する
    pub async fn connect_tls(
        host: &str,
        port: u16,
        tls_config: Option<Arc<ClientConfig>>,
        timeout: Duration,
    ) -> Result<Self> {
        let stream = tcp_connect(host, port, timeout).await?;

        let tls_config = tls_config.unwrap_or_else(default_tls_config);
        let connector = TlsConnector::from(tls_config);
        let server_name = ServerName::try_from(host.to_string())?;
        let tls_stream = tokio::time::timeout(timeout, connector.connect(server_name, stream))
            .await?
            .map_err(|e| Error::Tls(e.to_string()))?;
        debug!("TLS handshake completed: {}:{}", host, port);

        Ok(Self::new(
            ConnectionStream::Tls(Box::new(tls_stream)),
            host,
            port,
        ))
    }

    fn new(stream: ConnectionStream, host: &str, port: u16) -> Self {
        Self {
            stream,
            exchange: Exchange::new(),
            closed: false,
            read_timeout: Duration::from_secs(60),
            host: host.to_string(),
            port,
        }
    }

    /// アセンブラーの制限とステータスラインの文法を指定
    pub fn with_options(mut self, limits: AssemblerLimits, policy: StatusLinePolicy) -> Self {
        self.exchange = Exchange::with_options(limits, policy);
        self
    }

    /// 読み取りタイムアウトを設定
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    /// TLS 接続かどうかを返す
    pub fn is_tls(&self) -> bool {
        matches!(self.stream, ConnectionStream::Tls(_))
    }

    /// 失敗により閉じられた接続かどうかを返す
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 接続先ホスト
    pub fn host(&self) -> &str {
        &self.host
    }

    /// 接続先ポート
    pub fn port(&self) -> u16 {
        self.port
    }

    /// リクエストを送信してレスポンスを受信
    ///
    /// 2xx 以外のステータスはメッセージとしては完結しているので接続を維持する。
    /// それ以外の失敗では接続を閉じる。
    pub async fn send(&mut self, request: &Request) -> Result<Response> {
        if self.closed {
            warn!("send on closed connection: {}:{}", self.host, self.port);
            return Err(Error::ConnectionClosed);
        }

        let read_timeout = self.read_timeout;
        let result = match &mut self.stream {
            ConnectionStream::Plain(stream) => {
                round_trip(stream, &mut self.exchange, request, read_timeout).await
            }
            ConnectionStream::Tls(stream) => {
                round_trip(&mut **stream, &mut self.exchange, request, read_timeout).await
            }
        };
        if let Err(e) = &result {
            warn!("request to {}:{} failed: {}", self.host, self.port, e);
            self.exchange.abort();
            if !matches!(e, Error::Status { .. }) {
                self.close().await;
            }
        }
        result
    }

    /// 遅れて届くレスポンスを次のリクエストに混ぜないよう、ストリームを閉じる
    async fn close(&mut self) {
        self.closed = true;
        let result = match &mut self.stream {
            ConnectionStream::Plain(stream) => stream.shutdown().await,
            ConnectionStream::Tls(stream) => stream.shutdown().await,
        };
        if let Err(e) = result {
            debug!("shutdown {}:{} failed: {}", self.host, self.port, e);
        }
    }
}

async fn tcp_connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port))).await??;
    debug!("connected: {}:{}", host, port);
    Ok(stream)
}

/// リクエストを書き込み、1 回の読み取りごとに 1 回 `on_data()` を呼ぶ
async fn round_trip<S>(
    stream: &mut S,
    exchange: &mut Exchange,
    request: &Request,
    read_timeout: Duration,
) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request_bytes = exchange.begin(request);
    stream.write_all(&request_bytes).await?;
    stream.flush().await?;

    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        let n = tokio::time::timeout(read_timeout, stream.read(&mut buf)).await??;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }

        match exchange.on_data(&buf[..n]) {
            Action::Receive => {}
            Action::Complete(response) => return Ok(response),
            Action::Fail(e) => return Err(e.into()),
            // begin() で応答待ちにしてから Complete / Fail までは返らない
            Action::Discarded => {
                warn!("response discarded while a request was outstanding");
                return Err(Error::ConnectionClosed);
            }
        }
    }
}
