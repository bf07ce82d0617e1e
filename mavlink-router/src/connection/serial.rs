//! Serial adapter: port name + baud, framing identical to TCP, reopen-on-error via a
//! bounded pool of UART handles.
//!
//! Grounded on `K4HVH-mav-lite`'s `connection/uart.rs` (open-read-reconnect loop) and
//! `connection/uart_discovery.rs` (glob device scanning), using `mavlink-core`'s
//! `tokio-serial` dependency for the actual port I/O.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mavlink_core::Message;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use crate::connection::{next_connection_key, ConnectionKey, ConnectionKind, RouterEvent};
use crate::error::StartupError;
use crate::wire::{validate_and_decode, Reframer};

const REOPEN_DELAY: Duration = Duration::from_secs(5);

/// Checks that `device` names a port actually present on this machine, per spec.md §6:
/// "unknown serial device is a startup error that prevents the router from starting." Call
/// this before [`spawn`] — `spawn`'s own retry loop is for a device that comes and goes
/// after startup, not for a typo'd path that will never appear.
pub fn check_device_attached(device: &str) -> Result<(), StartupError> {
    if std::path::Path::new(device).exists() {
        Ok(())
    } else {
        Err(StartupError::PortNotAttached(device.to_owned()))
    }
}

/// A bounded pool of UART checkout slots. Spec.md §5 requires that a freshly checked-out
/// handle is never already in use; callers reserve a slot here before `open_native_async`
/// and release it after close, so a port is owned by at most one adapter task at a time.
#[derive(Default)]
pub struct UartPool {
    slots: Mutex<Vec<Option<String>>>,
}

impl UartPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new((0..capacity).map(|_| None).collect()),
        }
    }

    /// Reserves a slot for `path` and opens the port. Returns `None` if the pool is full.
    pub async fn checkout(
        &self,
        path: &str,
        baud: u32,
    ) -> Result<Option<SerialStream>, tokio_serial::Error> {
        let mut slots = self.slots.lock().await;
        let Some(slot) = slots.iter_mut().find(|s| s.is_none()) else {
            return Ok(None);
        };
        let port = tokio_serial::new(path, baud).open_native_async()?;
        *slot = Some(path.to_owned());
        Ok(Some(port))
    }

    pub async fn checkin(&self, path: &str) {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.iter_mut().find(|s| s.as_deref() == Some(path)) {
            *slot = None;
        }
    }
}

/// Spawns the serial port's lifecycle task and returns its outbound sender. The port is
/// checked out of `pool` before each connect attempt and checked back in after close or a
/// failed open, so a pooled UART handle is never held by two adapter tasks at once.
pub fn spawn<M: Message + Send + 'static>(
    device: String,
    baud: u32,
    pool: Arc<UartPool>,
    events: mpsc::UnboundedSender<RouterEvent<M>>,
) -> (ConnectionKey, mpsc::UnboundedSender<Vec<u8>>) {
    let key = next_connection_key();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    tokio::spawn(async move {
        let mut outbound_rx = outbound_rx;
        loop {
            match pool.checkout(&device, baud).await {
                Ok(Some(port)) => {
                    info!(%device, baud, "serial port opened");
                    let _ = events.send(RouterEvent::Connected { key, kind: ConnectionKind::Serial });
                    serve(port, key, &events, &mut outbound_rx).await;
                    pool.checkin(&device).await;
                    let _ = events.send(RouterEvent::Disconnected { key });
                }
                Ok(None) => {
                    warn!(%device, "uart pool exhausted, retrying");
                }
                Err(err) => {
                    warn!(%device, error = %err, "failed to open serial port, retrying");
                }
            }
            tokio::time::sleep(REOPEN_DELAY).await;
        }
    });

    (key, outbound_tx)
}

async fn serve<M: Message + Send + 'static>(
    mut port: SerialStream,
    key: ConnectionKey,
    events: &mpsc::UnboundedSender<RouterEvent<M>>,
    outbound_rx: &mut mpsc::UnboundedReceiver<Vec<u8>>,
) {
    let mut reframer = Reframer::new();
    let mut buf = [0u8; 512];

    loop {
        tokio::select! {
            read = port.read(&mut buf) => {
                match read {
                    Ok(0) => {
                        debug!(?key, "serial port EOF");
                        return;
                    }
                    Ok(n) => {
                        reframer.push(&buf[..n]);
                        for result in reframer.drain() {
                            match result {
                                Ok(raw) => {
                                    let version = raw.version;
                                    match validate_and_decode::<M>(raw) {
                                        Ok((header, message, raw)) => {
                                            let _ = events.send(RouterEvent::FrameReceived {
                                                key,
                                                version,
                                                header,
                                                message,
                                                raw,
                                            });
                                        }
                                        Err(error) => {
                                            let _ = events.send(RouterEvent::FrameError { key, error });
                                        }
                                    }
                                }
                                Err(error) => {
                                    let _ = events.send(RouterEvent::FrameError { key, error });
                                }
                            }
                        }
                    }
                    Err(err) => {
                        warn!(?key, error = %err, "serial read error");
                        return;
                    }
                }
            }
            outbound = outbound_rx.recv() => {
                let Some(bytes) = outbound else { return; };
                if let Err(err) = port.write_all(&bytes).await {
                    warn!(?key, error = %err, "serial write error");
                    return;
                }
            }
        }
    }
}

/// Scans a glob device pattern (e.g. `/dev/ttyUSB*`) for candidate serial devices. Ambient
/// supplemental feature alongside static `serial:<device>:<baud>` connection strings, per
/// `K4HVH-mav-lite`'s `UartDiscovery`.
pub fn discover_devices(pattern: &str) -> Vec<PathBuf> {
    glob::glob(pattern)
        .map(|paths| paths.filter_map(Result::ok).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_device_that_does_not_exist() {
        assert!(matches!(
            check_device_attached("/dev/definitely-not-a-real-port"),
            Err(StartupError::PortNotAttached(_))
        ));
    }

    #[test]
    fn accepts_device_that_exists() {
        // Any always-present path stands in for a real serial device here.
        assert!(check_device_attached("/dev/null").is_ok());
    }
}
