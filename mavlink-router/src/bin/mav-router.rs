//! Example bootstrap binary: wires a set of connection strings into a running router.
//! Mirrors `K4HVH-mav-lite`'s `main.rs` shape (tracing init, connection fan-out, router
//! task) but driven purely by the connection-string surface spec.md §6 defines.

use std::env;
use std::sync::Arc;

use mavlink_router::connection::{serial, tcp, udp};
use mavlink_router::connstring::Endpoint;
use mavlink_router::router::Router;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let connection_strings: Vec<String> = env::args().skip(1).collect();
    if connection_strings.is_empty() {
        eprintln!("usage: MAVLINK_DIALECT=<name> mav-router <connstring>...");
        std::process::exit(1);
    }

    // Real deployments select a dialect by linking a `mavlink-bindgen`-generated module and
    // instantiating `Router<M>` against its message type; this example has no such module,
    // so it asks for the intended dialect's name via an env var purely to exercise
    // spec.md §7's `no_dialect_set` startup error when it is missing.
    let dialect_name: &'static str = match env::var("MAVLINK_DIALECT") {
        Ok(name) if !name.is_empty() => Box::leak(name.into_boxed_str()),
        _ => {
            eprintln!("{}", mavlink_router::error::StartupError::NoDialectSet);
            std::process::exit(1);
        }
    };

    // This binary is a thin wiring example; it has no generated dialect module linked in,
    // so it cannot actually decode payloads. Downstream applications substitute their own
    // `mavlink::common::MavMessage` (or another generated dialect) for `M` here.
    run::<NoDialect>(connection_strings, dialect_name).await;
}

/// Placeholder `Message` impl used only so this bootstrap example type-checks without a
/// generated dialect module present. Real deployments use a dialect generated by
/// `mavlink-bindgen`.
#[derive(Debug, Clone)]
struct NoDialect;

impl mavlink_core::Message for NoDialect {
    fn message_id(&self) -> u32 {
        0
    }
    fn message_name(&self) -> &'static str {
        "NONE"
    }
    fn ser(&self, _version: mavlink_core::MavlinkVersion, _bytes: &mut [u8]) -> usize {
        0
    }
    fn parse(
        _version: mavlink_core::MavlinkVersion,
        _msgid: u32,
        _payload: &[u8],
    ) -> Result<Self, mavlink_core::error::ParserError> {
        Err(mavlink_core::error::ParserError::UnknownMessage { id: 0 })
    }
    fn message_id_from_name(_name: &str) -> Option<u32> {
        None
    }
    fn default_message_from_id(_id: u32) -> Option<Self> {
        None
    }
    fn extra_crc(_id: u32) -> u8 {
        0
    }
}

async fn run<M: mavlink_core::Message + Clone + Send + 'static>(
    connection_strings: Vec<String>,
    dialect_name: &'static str,
) {
    let (router, handle) = Router::<M>::new(255, 0, dialect_name)
        .unwrap_or_else(|err| {
            eprintln!("{err}");
            std::process::exit(1);
        });
    let uart_pool = Arc::new(serial::UartPool::new(4));

    for s in &connection_strings {
        let endpoint = match Endpoint::parse(s) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                eprintln!("invalid connection string {s:?}: {err}");
                std::process::exit(1);
            }
        };

        match endpoint {
            Endpoint::UdpIn { address, port } => {
                let outbound = udp::spawn_listener::<M>(address, port, handle.event_sender())
                    .await
                    .unwrap_or_else(|err| {
                        eprintln!("failed to bind udpin {address}:{port}: {err}");
                        std::process::exit(1);
                    });
                drop(outbound);
            }
            Endpoint::UdpOut { address, port } => {
                let (key, sender) = udp::spawn_sender::<M>(address, port, handle.event_sender())
                    .await
                    .unwrap_or_else(|err| {
                        eprintln!("failed to connect udpout {address}:{port}: {err}");
                        std::process::exit(1);
                    });
                handle.attach_outbound(key, mavlink_router::connection::ConnectionKind::UdpSender, sender);
            }
            Endpoint::TcpOut { address, port } => {
                let (key, sender) = tcp::spawn_outbound::<M>(address, port, handle.event_sender());
                handle.attach_outbound(key, mavlink_router::connection::ConnectionKind::Tcp, sender);
            }
            Endpoint::Serial { device, baud } => {
                if let Err(err) = serial::check_device_attached(&device) {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
                let (key, sender) =
                    serial::spawn::<M>(device, baud, uart_pool.clone(), handle.event_sender());
                handle.attach_outbound(key, mavlink_router::connection::ConnectionKind::Serial, sender);
            }
        }
    }

    router.metrics().start_stats_logger(60);
    router.run().await;
}
