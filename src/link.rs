//! Share link encoding.
//!
//! Renders the single `tuic://` URI a client needs to connect: credential
//! as userinfo, public endpoint as authority, fixed protocol parameters as
//! the query, and a country-tagged label as the fragment.

use crate::credentials::Credential;
use crate::net_info::NodeNetworkInfo;
use crate::server_config::{ALPN_H3, CONGESTION_CONTROLLER, MAX_UDP_RELAY_PACKET_SIZE};

/// Fragment label prefix.
pub const LABEL_PREFIX: &str = "TUIC";

/// Encode the shareable connection URI.
pub fn encode(credential: &Credential, net: &NodeNetworkInfo, port: u16, sni: &str) -> String {
    format!(
        "tuic://{id}:{secret}@{ip}:{port}\
         ?congestion_control={cc}\
         &alpn={alpn}\
         &allowInsecure=1\
         &sni={sni}\
         &udp_relay_mode=native\
         &disable_sni=0\
         &reduce_rtt=1\
         &max_udp_relay_packet_size={max_packet}\
         #{prefix}-{country}",
        id = credential.id,
        secret = credential.secret,
        ip = net.ip,
        cc = CONGESTION_CONTROLLER,
        alpn = ALPN_H3,
        max_packet = MAX_UDP_RELAY_PACKET_SIZE,
        prefix = LABEL_PREFIX,
        country = net.country,
    )
}
