//! Serial client for a CP board link.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::SerialPort;

use crate::protocol::{parse_reply, Reply};

/// Pick the first USB serial adapter if the user did not name a port
pub fn find_port() -> Result<String> {
    let ports = serialport::available_ports()?;
    ports
        .into_iter()
        .map(|info| info.port_name)
        .find(|name| name.contains("ttyUSB") || name.contains("ttyACM"))
        .ok_or_else(|| anyhow::anyhow!("No serial adapter found - ensure the node is connected"))
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg == "auto" {
        find_port()
    } else {
        Ok(port_arg.to_string())
    }
}

/// Client speaking fixed-size frames to the node
pub struct DeviceClient {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl DeviceClient {
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;

        Ok(Self {
            port,
            timeout: Duration::from_secs(2),
        })
    }

    /// Set the reply timeout. Probe commands need several seconds.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn clear_buffer(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }

    pub fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }

    /// Send a frame and read a reply of `reply_len` bytes
    pub fn exchange(&mut self, frame: &[u8], reply_len: usize) -> Result<Reply> {
        self.send(frame)?;
        self.read_reply(reply_len)
    }

    /// Read exactly `len` bytes and parse them
    pub fn read_reply(&mut self, len: usize) -> Result<Reply> {
        let data = self.read_exact_bytes(len, self.timeout)?;
        parse_reply(&data)
    }

    /// True if no byte arrives within `window`
    pub fn stays_silent(&mut self, window: Duration) -> Result<bool> {
        match self.read_exact_bytes(1, window) {
            Ok(_) => Ok(false),
            Err(e) if e.to_string().contains("Timeout") => Ok(true),
            Err(e) => Err(e),
        }
    }

    fn read_exact_bytes(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(len);
        let mut buf = [0u8; 32];
        let start = Instant::now();

        while data.len() < len && start.elapsed() < timeout {
            let want = (len - data.len()).min(buf.len());
            match self.port.read(&mut buf[..want]) {
                Ok(n) => data.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if data.len() < len {
            anyhow::bail!(
                "Timeout waiting for reply, got {} of {} bytes: {:02x?}",
                data.len(),
                len,
                data
            );
        }
        Ok(data)
    }
}
