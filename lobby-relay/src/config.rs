use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::turn_server::TurnConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "lobby-relay", version, about = "Room pub/sub relay for lobby voice sessions")]
pub struct RelayArgs {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// UDP port for the embedded TURN server. TURN stays off when unset.
    #[arg(long)]
    pub turn_port: Option<u16>,

    /// Address advertised in TURN relay allocations.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub turn_public_ip: IpAddr,

    #[arg(long, default_value = "lobby")]
    pub turn_realm: String,

    #[arg(long, default_value = "lobby")]
    pub turn_user: String,

    #[arg(long, default_value = "lobby")]
    pub turn_password: String,
}

impl RelayArgs {
    pub fn turn(&self) -> Option<TurnConfig> {
        self.turn_port.map(|port| TurnConfig {
            port,
            public_ip: self.turn_public_ip,
            realm: self.turn_realm.clone(),
            username: self.turn_user.clone(),
            password: self.turn_password.clone(),
        })
    }
}
