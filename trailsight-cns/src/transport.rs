//! Actuator transport abstraction

use crate::error::CnsError;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use trailsight_core::SteeringCommand;

#[cfg(feature = "serial")]
use trailsight_core::SerialConfig;

/// Transport type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportType {
    /// Serial port to the drive controller
    Serial,
    /// Logs commands without sending them
    Null,
    /// In-memory capture
    Recording,
}

/// Byte channel to the drive controller
#[async_trait]
pub trait Transport: Send + Sync {
    fn transport_type(&self) -> TransportType;

    async fn connect(&mut self) -> Result<(), CnsError>;

    async fn disconnect(&mut self) -> Result<(), CnsError>;

    async fn send(&mut self, data: &Bytes) -> Result<(), CnsError>;

    fn is_connected(&self) -> bool;
}

/// Dry-run transport: accepts everything, sends nothing.
#[derive(Debug, Default)]
pub struct NullTransport {
    connected: bool,
}

impl NullTransport {
    pub fn new() -> Self {
        Self { connected: false }
    }
}

#[async_trait]
impl Transport for NullTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Null
    }

    async fn connect(&mut self) -> Result<(), CnsError> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), CnsError> {
        self.connected = false;
        Ok(())
    }

    async fn send(&mut self, data: &Bytes) -> Result<(), CnsError> {
        if !self.connected {
            return Err(CnsError::Transport("Not connected".to_string()));
        }
        debug!("Dry run, dropping {} byte(s)", data.len());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Keeps every sent payload; the handle stays readable after the transport is boxed.
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Bytes>>>,
    connected: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().clone()
    }

    /// Sent payloads concatenated, one byte per command.
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.sent.lock().iter().flat_map(|b| b.iter().copied()).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Recording
    }

    async fn connect(&mut self) -> Result<(), CnsError> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), CnsError> {
        self.connected = false;
        Ok(())
    }

    async fn send(&mut self, data: &Bytes) -> Result<(), CnsError> {
        if !self.connected {
            return Err(CnsError::Transport("Not connected".to_string()));
        }
        self.sent.lock().push(data.clone());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Serial link at a fixed baud rate with a write timeout.
#[cfg(feature = "serial")]
pub struct SerialTransport {
    config: SerialConfig,
    // `SerialPort` is only `Send`; the mutex makes the transport `Sync`
    port: Mutex<Option<Box<dyn serialport::SerialPort>>>,
}

#[cfg(feature = "serial")]
impl SerialTransport {
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            port: Mutex::new(None),
        }
    }
}

#[cfg(feature = "serial")]
#[async_trait]
impl Transport for SerialTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Serial
    }

    async fn connect(&mut self) -> Result<(), CnsError> {
        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .timeout(self.config.timeout())
            .open()
            .map_err(|e| {
                CnsError::Transport(format!("Failed to open {}: {}", self.config.port, e))
            })?;
        info!(
            "Serial port {} open at {} baud",
            self.config.port, self.config.baud_rate
        );
        *self.port.get_mut() = Some(port);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), CnsError> {
        *self.port.get_mut() = None;
        Ok(())
    }

    async fn send(&mut self, data: &Bytes) -> Result<(), CnsError> {
        use std::io::Write;

        let mut port = self
            .port
            .get_mut()
            .take()
            .ok_or_else(|| CnsError::Transport("Not connected".to_string()))?;
        let payload = data.clone();
        let (port, written) = tokio::task::spawn_blocking(move || {
            let written = port.write_all(&payload).and_then(|_| port.flush());
            (port, written)
        })
        .await
        .map_err(|e| CnsError::Transport(format!("Serial writer panicked: {}", e)))?;
        *self.port.get_mut() = Some(port);
        written.map_err(|e| CnsError::Transport(format!("Serial write failed: {}", e)))
    }

    fn is_connected(&self) -> bool {
        self.port.lock().is_some()
    }
}

/// Single exclusive writer of steering commands.
pub struct ActuatorSink {
    transport: Box<dyn Transport>,
    commands_sent: u64,
}

impl ActuatorSink {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            commands_sent: 0,
        }
    }

    pub async fn connect(&mut self) -> Result<(), CnsError> {
        self.transport.connect().await?;
        info!("Actuator connected over {:?}", self.transport.transport_type());
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), CnsError> {
        self.transport.disconnect().await
    }

    pub async fn send(&mut self, command: SteeringCommand) -> Result<(), CnsError> {
        let payload = Bytes::copy_from_slice(&[command.as_byte()]);
        self.transport.send(&payload).await?;
        self.commands_sent += 1;
        debug!("Sent '{}'", command);
        Ok(())
    }

    pub fn commands_sent(&self) -> u64 {
        self.commands_sent
    }

    pub fn transport_type(&self) -> TransportType {
        self.transport.transport_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_writes_one_byte_per_command() {
        let recorder = RecordingTransport::new();
        let mut sink = ActuatorSink::new(Box::new(recorder.clone()));
        sink.connect().await.unwrap();

        sink.send(SteeringCommand::Left).await.unwrap();
        sink.send(SteeringCommand::Forward).await.unwrap();
        sink.send(SteeringCommand::Right).await.unwrap();

        assert_eq!(recorder.sent_bytes(), b"lfr".to_vec());
        assert!(recorder.sent().iter().all(|b| b.len() == 1));
        assert_eq!(sink.commands_sent(), 3);
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let mut sink = ActuatorSink::new(Box::new(NullTransport::new()));
        assert!(sink.send(SteeringCommand::Forward).await.is_err());
        sink.connect().await.unwrap();
        assert!(sink.send(SteeringCommand::Forward).await.is_ok());
        sink.disconnect().await.unwrap();
        assert!(sink.send(SteeringCommand::Forward).await.is_err());
        assert_eq!(sink.commands_sent(), 1);
    }

    #[test]
    fn test_transport_types() {
        assert_eq!(NullTransport::new().transport_type(), TransportType::Null);
        assert_eq!(RecordingTransport::new().transport_type(), TransportType::Recording);
    }

    #[test]
    fn test_recording_transport_requires_connect() {
        let mut transport = RecordingTransport::new();
        let payload = Bytes::from_static(b"f");
        assert!(tokio_test::block_on(transport.send(&payload)).is_err());
        tokio_test::block_on(transport.connect()).unwrap();
        assert!(transport.is_connected());
        tokio_test::block_on(transport.send(&payload)).unwrap();
        assert_eq!(transport.sent(), vec![payload]);
    }

    #[cfg(feature = "serial")]
    #[tokio::test]
    async fn test_serial_send_before_connect() {
        fn assert_transport<T: Transport>() {}
        assert_transport::<SerialTransport>();

        let mut transport = SerialTransport::new(SerialConfig::default());
        assert!(!transport.is_connected());
        let err = transport.send(&Bytes::from_static(b"f")).await.unwrap_err();
        assert!(err.to_string().contains("Not connected"));
        assert!(!transport.is_connected());
    }
}
