//! TCP client for the effect service's IPC endpoint.

use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::time::Duration;

use super::{ControllerTarget, EffectTransport, LinkError, LinkResult};

// Effect command ids. The real service protocol is richer; this covers the
// command subset the engine issues.
const CMD_DISABLE: u8 = 0x00;
const CMD_FEEDBACK: u8 = 0x01;
const CMD_WEAPON: u8 = 0x02;
const CMD_VIBRATION: u8 = 0x03;
const CMD_SLOPE_FEEDBACK: u8 = 0x04;
const CMD_MULTI_POS_FEEDBACK: u8 = 0x05;
const CMD_MULTI_POS_VIBRATION: u8 = 0x06;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Live connection to the effect service.
///
/// Frame layout: u16 little-endian payload length, then command id byte,
/// controller target byte, and the parameter bytes. A write failure drops the
/// socket so the supervisor reconnects on its next pass.
pub struct IpcClient {
    addr: String,
    stream: Mutex<Option<TcpStream>>,
}

impl IpcClient {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            stream: Mutex::new(None),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn resolve(&self) -> std::io::Result<SocketAddr> {
        self.addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address"))
    }

    fn send_frame(&self, cmd: u8, target: ControllerTarget, params: &[u8]) -> std::io::Result<()> {
        let mut guard = self
            .stream
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "stream lock poisoned"))?;
        let stream = guard.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "effect service not connected")
        })?;

        let mut frame = Vec::with_capacity(params.len() + 4);
        frame.extend_from_slice(&((params.len() as u16 + 2).to_le_bytes()));
        frame.push(cmd);
        frame.push(target as u8);
        frame.extend_from_slice(params);

        if let Err(e) = stream.write_all(&frame) {
            log::warn!("effect service write failed ({e}), dropping connection");
            *guard = None;
            return Err(e);
        }
        Ok(())
    }

    fn send(&self, cmd: u8, target: ControllerTarget, params: &[u8]) -> LinkResult {
        self.send_frame(cmd, target, params).map_err(LinkError::from)
    }
}

impl EffectTransport for IpcClient {
    fn start(&self) -> bool {
        let Ok(mut guard) = self.stream.lock() else {
            return false;
        };
        if guard.is_some() {
            return true;
        }
        let addr = match self.resolve() {
            Ok(addr) => addr,
            Err(e) => {
                log::debug!("cannot resolve {}: {e}", self.addr);
                return false;
            }
        };
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                log::info!("connected to effect service at {}", self.addr);
                *guard = Some(stream);
                true
            }
            Err(e) => {
                log::debug!("effect service at {} not reachable: {e}", self.addr);
                false
            }
        }
    }

    fn stop(&self) {
        if let Ok(mut guard) = self.stream.lock() {
            if let Some(stream) = guard.take() {
                let _ = stream.shutdown(Shutdown::Both);
                log::info!("effect service connection closed");
            }
        }
    }

    fn is_running(&self) -> bool {
        self.stream.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    fn feedback(&self, target: ControllerTarget, position: u8, strength: u8) -> LinkResult {
        self.send(CMD_FEEDBACK, target, &[position, strength])
    }

    fn weapon(
        &self,
        target: ControllerTarget,
        start_position: u8,
        end_position: u8,
        strength: u8,
    ) -> LinkResult {
        self.send(CMD_WEAPON, target, &[start_position, end_position, strength])
    }

    fn vibration(
        &self,
        target: ControllerTarget,
        position: u8,
        amplitude: u8,
        frequency: u8,
    ) -> LinkResult {
        self.send(CMD_VIBRATION, target, &[position, amplitude, frequency])
    }

    fn slope_feedback(
        &self,
        target: ControllerTarget,
        start_position: u8,
        end_position: u8,
        start_strength: u8,
        end_strength: u8,
    ) -> LinkResult {
        self.send(
            CMD_SLOPE_FEEDBACK,
            target,
            &[start_position, end_position, start_strength, end_strength],
        )
    }

    fn multi_position_feedback(&self, target: ControllerTarget, strengths: &[u8]) -> LinkResult {
        self.send(CMD_MULTI_POS_FEEDBACK, target, strengths)
    }

    fn multi_position_vibration(
        &self,
        target: ControllerTarget,
        frequency: u8,
        amplitudes: &[u8],
    ) -> LinkResult {
        let mut params = Vec::with_capacity(amplitudes.len() + 1);
        params.push(frequency);
        params.extend_from_slice(amplitudes);
        self.send(CMD_MULTI_POS_VIBRATION, target, &params)
    }

    fn disable(&self, target: ControllerTarget) -> LinkResult {
        self.send(CMD_DISABLE, target, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn start_fails_when_nothing_listens() {
        let client = IpcClient::new("127.0.0.1:1");
        assert!(!client.start());
        assert!(!client.is_running());
    }

    #[test]
    fn commands_error_when_not_connected() {
        let client = IpcClient::new("127.0.0.1:1");
        assert!(client.feedback(ControllerTarget::Both, 3, 5).is_err());
        assert!(client.disable(ControllerTarget::Left).is_err());
    }

    #[test]
    fn frames_reach_the_service() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = IpcClient::new(&addr.to_string());
        assert!(client.start());
        assert!(client.is_running());

        client.feedback(ControllerTarget::Right, 3, 5).unwrap();
        client.disable(ControllerTarget::Both).unwrap();
        client.stop();
        assert!(!client.is_running());

        let (mut conn, _) = listener.accept().unwrap();
        let mut bytes = Vec::new();
        conn.read_to_end(&mut bytes).unwrap();
        assert_eq!(
            bytes,
            vec![
                4, 0, CMD_FEEDBACK, ControllerTarget::Right as u8, 3, 5, //
                2, 0, CMD_DISABLE, ControllerTarget::Both as u8,
            ]
        );
    }

    #[test]
    fn start_is_idempotent_while_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = IpcClient::new(&addr.to_string());
        assert!(client.start());
        assert!(client.start());
        client.stop();
        client.stop();
    }
}
