use anyhow::Context;
use lobby_core::IceServerConfig;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{info, warn};
use turn::auth::{AuthHandler, generate_auth_key};
use turn::relay::relay_static::RelayAddressGeneratorStatic;
use turn::server::Server;
use turn::server::config::{ConnConfig, ServerConfig};
use webrtc::util::vnet::net::Net;

/// Settings for the embedded TURN server. One static long-term credential.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    pub port: u16,
    pub public_ip: IpAddr,
    pub realm: String,
    pub username: String,
    pub password: String,
}

impl TurnConfig {
    /// ICE servers a client should use to reach this relay host.
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let host = SocketAddr::new(self.public_ip, self.port);
        vec![
            IceServerConfig::stun(format!("stun:{host}")),
            IceServerConfig {
                urls: vec![format!("turn:{host}?transport=udp")],
                username: Some(self.username.clone()),
                credential: Some(self.password.clone()),
            },
        ]
    }
}

struct StaticCredential {
    username: String,
    key: Vec<u8>,
}

impl AuthHandler for StaticCredential {
    fn auth_handle(
        &self,
        username: &str,
        _realm: &str,
        src_addr: SocketAddr,
    ) -> Result<Vec<u8>, turn::Error> {
        if username == self.username {
            Ok(self.key.clone())
        } else {
            warn!("TURN auth rejected for {} from {}", username, src_addr);
            Err(turn::Error::ErrFakeErr)
        }
    }
}

pub struct TurnHandle {
    server: Server,
    local_addr: SocketAddr,
}

impl TurnHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn close(self) -> anyhow::Result<()> {
        self.server.close().await.context("closing TURN server")?;
        info!("TURN server on {} stopped", self.local_addr);
        Ok(())
    }
}

/// Binds UDP `0.0.0.0:{port}` and serves TURN allocations relayed through
/// `public_ip`.
pub async fn start_turn(config: &TurnConfig) -> anyhow::Result<TurnHandle> {
    let socket = UdpSocket::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding TURN port {}", config.port))?;
    let local_addr = socket.local_addr()?;

    let key = generate_auth_key(&config.username, &config.realm, &config.password);
    let server = Server::new(ServerConfig {
        conn_configs: vec![ConnConfig {
            conn: Arc::new(socket),
            relay_addr_generator: Box::new(RelayAddressGeneratorStatic {
                relay_address: config.public_ip,
                address: "0.0.0.0".to_owned(),
                net: Arc::new(Net::new(None)),
            }),
        }],
        realm: config.realm.clone(),
        auth_handler: Arc::new(StaticCredential {
            username: config.username.clone(),
            key,
        }),
        channel_bind_timeout: Duration::from_secs(0),
        alloc_close_notify: None,
    })
    .await
    .context("starting TURN server")?;

    info!(
        "TURN server listening on {} (relay address {}, realm {})",
        local_addr, config.public_ip, config.realm
    );

    Ok(TurnHandle { server, local_addr })
}
