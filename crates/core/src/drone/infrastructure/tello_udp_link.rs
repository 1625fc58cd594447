use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::control::domain::rc_command::RcCommand;
use crate::drone::domain::drone_link::DroneLink;

/// Reply timeout for quick control commands.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(7);

/// Takeoff and landing only answer once the maneuver completes.
pub const DEFAULT_MOTION_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug)]
pub enum TelloError {
    #[error("could not resolve drone address {0}")]
    Resolve(String),
    #[error("failed to bind control socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to send '{command}': {source}")]
    Send {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for reply to '{command}': {source}")]
    Receive {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no reply to '{command}' within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("drone rejected '{command}': {reply}")]
    Rejected { command: String, reply: String },
}

/// Tello SDK text protocol over UDP.
///
/// Control commands are acknowledged with `ok`; anything else is a
/// rejection. `rc` setpoints are sent without waiting for a reply.
pub struct TelloUdpLink {
    socket: UdpSocket,
    drone_addr: SocketAddr,
    reply_timeout: Duration,
    motion_timeout: Duration,
}

impl TelloUdpLink {
    /// Binds an ephemeral local port and targets `drone_addr`
    /// (normally `192.168.10.1:8889`).
    pub fn new(drone_addr: &str) -> Result<Self, TelloError> {
        Self::with_local_addr(drone_addr, "0.0.0.0:0")
    }

    pub fn with_local_addr(drone_addr: &str, local_addr: &str) -> Result<Self, TelloError> {
        let drone_addr = drone_addr
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| TelloError::Resolve(drone_addr.to_string()))?;
        let socket = UdpSocket::bind(local_addr).map_err(|e| TelloError::Bind {
            addr: local_addr.to_string(),
            source: e,
        })?;
        Ok(Self {
            socket,
            drone_addr,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            motion_timeout: DEFAULT_MOTION_TIMEOUT,
        })
    }

    pub fn with_timeouts(mut self, reply: Duration, motion: Duration) -> Self {
        self.reply_timeout = reply;
        self.motion_timeout = motion;
        self
    }

    /// Sends a control command and waits for `ok`.
    pub fn command(&mut self, command: &str, timeout: Duration) -> Result<(), TelloError> {
        self.drain_stale_replies();
        self.send(command)?;

        let reply = self.await_reply(command, timeout)?;
        log::debug!("tello: {command} -> {reply}");
        if reply.eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(TelloError::Rejected {
                command: command.to_string(),
                reply,
            })
        }
    }

    fn send(&self, command: &str) -> Result<(), TelloError> {
        self.socket
            .send_to(command.as_bytes(), self.drone_addr)
            .map(|_| ())
            .map_err(|e| TelloError::Send {
                command: command.to_string(),
                source: e,
            })
    }

    fn await_reply(&self, command: &str, timeout: Duration) -> Result<String, TelloError> {
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 1024];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TelloError::Timeout {
                    command: command.to_string(),
                    timeout,
                });
            }
            let recv_err = |e| TelloError::Receive {
                command: command.to_string(),
                source: e,
            };
            self.socket
                .set_read_timeout(Some(remaining))
                .map_err(recv_err)?;

            match self.socket.recv_from(&mut buf) {
                Ok((len, from)) if from == self.drone_addr => {
                    return Ok(String::from_utf8_lossy(&buf[..len]).trim().to_string());
                }
                Ok((_, from)) => log::trace!("ignoring datagram from {from}"),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => return Err(recv_err(e)),
            }
        }
    }

    /// Discards late acknowledgments so they are not mistaken for the
    /// reply to the next command.
    fn drain_stale_replies(&self) {
        if self.socket.set_nonblocking(true).is_err() {
            return;
        }
        let mut buf = [0u8; 1024];
        while let Ok((len, _)) = self.socket.recv_from(&mut buf) {
            log::trace!(
                "discarding stale reply: {}",
                String::from_utf8_lossy(&buf[..len]).trim()
            );
        }
        let _ = self.socket.set_nonblocking(false);
    }
}

impl DroneLink for TelloUdpLink {
    fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.command("command", self.reply_timeout)?)
    }

    fn stream_on(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.command("streamon", self.reply_timeout)?)
    }

    fn stream_off(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.command("streamoff", self.reply_timeout)?)
    }

    fn takeoff(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.command("takeoff", self.motion_timeout)?)
    }

    fn land(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.command("land", self.motion_timeout)?)
    }

    fn send_rc(&mut self, command: &RcCommand) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.send(&command.to_string())?)
    }
}
