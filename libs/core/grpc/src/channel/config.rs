use std::time::Duration;
use tonic::transport::Endpoint;

/// Transport settings for an outbound channel.
///
/// The gateway issues short unary calls only, so the knobs are limited to
/// liveness and timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
  /// Time allowed to establish the TCP/HTTP2 connection.
  pub connect_timeout: Duration,
  /// Ceiling for one RPC. Per-request deadlines are normally tighter and
  /// travel in the `grpc-timeout` header.
  pub request_timeout: Duration,
  /// HTTP/2 PING interval; `None` turns pings off.
  pub keep_alive: Option<Duration>,
  /// How long to wait for a PING ack before dropping the connection.
  pub keep_alive_timeout: Duration,
  pub tcp_nodelay: bool,
}

impl Default for ChannelConfig {
  fn default() -> Self {
    Self {
      connect_timeout: Duration::from_secs(5),
      request_timeout: Duration::from_secs(30),
      keep_alive: Some(Duration::from_secs(30)),
      keep_alive_timeout: Duration::from_secs(10),
      tcp_nodelay: true,
    }
  }
}

impl ChannelConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
    self.connect_timeout = timeout;
    self
  }

  pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout = timeout;
    self
  }

  pub fn without_keep_alive(mut self) -> Self {
    self.keep_alive = None;
    self
  }

  pub(crate) fn configure(&self, endpoint: Endpoint) -> Endpoint {
    let endpoint = endpoint
      .connect_timeout(self.connect_timeout)
      .timeout(self.request_timeout)
      .tcp_nodelay(self.tcp_nodelay);

    match self.keep_alive {
      Some(interval) => endpoint
        .http2_keep_alive_interval(interval)
        .keep_alive_timeout(self.keep_alive_timeout)
        .keep_alive_while_idle(true),
      None => endpoint,
    }
  }
}
