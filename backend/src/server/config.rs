//! HTTP server configuration object.

use std::net::SocketAddr;

use crate::inbound::http::session_config::SessionSettings;
use crate::inbound::http::state::HttpState;

/// Everything [`super::create_server`] needs to bind and serve.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) state: HttpState,
}

impl ServerConfig {
    /// Serve `state` on `bind_addr` with cookie sessions from `session`.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr, state: HttpState) -> Self {
        Self {
            session,
            bind_addr,
            state,
        }
    }

    /// Socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
