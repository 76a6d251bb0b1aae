use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::process::Child;

use crate::error::{TraciError, TraciResult};
use crate::simulation_engine::SimulationControl;
use crate::traci::codec::{frame_message, StorageReader, StorageWriter};
use crate::traci::constants::*;

/// A TraCI client session over any byte stream (TCP in production).
///
/// When the session was started by the launcher it also owns the simulator
/// process, which is waited for on [`close`](SimulationControl::close).
pub struct TraciConnection<S = TcpStream> {
    stream: S,
    process: Option<Child>,
    closed: bool,
}

impl TraciConnection<TcpStream> {
    /// Attaches to a simulator that is already listening on `host:port`.
    pub async fn connect(host: &str, port: u16) -> TraciResult<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        log::info!("Connected to TraCI server at {}:{}", host, port);
        Ok(Self::new(stream))
    }
}

impl<S> TraciConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            process: None,
            closed: false,
        }
    }

    pub fn with_process(stream: S, process: Child) -> Self {
        Self {
            stream,
            process: Some(process),
            closed: false,
        }
    }

    /// Sends one command and returns the raw response body.
    async fn send_command(&mut self, command: u8, content: &[u8]) -> TraciResult<Vec<u8>> {
        if self.closed {
            return Err(TraciError::Closed);
        }
        let mut commands = StorageWriter::new();
        commands.write_command(command, content);
        let message = frame_message(&commands.into_inner());
        self.stream.write_all(&message).await?;
        self.stream.flush().await?;

        let len = self.stream.read_u32().await? as usize;
        if len < 4 {
            return Err(TraciError::Malformed("message length shorter than its prefix"));
        }
        let mut body = vec![0u8; len - 4];
        self.stream.read_exact(&mut body).await?;
        Ok(body)
    }

    async fn get_int(&mut self, domain: u8, variable: u8, object_id: &str) -> TraciResult<i32> {
        let mut content = StorageWriter::new();
        content.write_u8(variable);
        content.write_string(object_id);
        let body = self.send_command(domain, &content.into_inner()).await?;

        let mut reader = StorageReader::new(&body);
        check_status(&mut reader, domain)?;
        let (response, mut value) = reader.read_command()?;
        let expected = domain + RESPONSE_OFFSET;
        if response != expected {
            return Err(TraciError::UnexpectedResponse { expected, got: response });
        }
        let got = value.read_u8()?;
        if got != variable {
            return Err(TraciError::UnexpectedResponse { expected: variable, got });
        }
        let returned_id = value.read_string()?;
        if returned_id != object_id {
            return Err(TraciError::UnexpectedValue(format!(
                "response for object '{}' while querying '{}'",
                returned_id, object_id
            )));
        }
        let value_type = value.read_u8()?;
        if value_type != TYPE_INTEGER {
            return Err(TraciError::UnexpectedType {
                expected: TYPE_INTEGER,
                got: value_type,
            });
        }
        value.read_i32()
    }

    /// Returns the server's TraCI API level and version string.
    pub async fn get_version(&mut self) -> TraciResult<(i32, String)> {
        let body = self.send_command(CMD_GETVERSION, &[]).await?;
        let mut reader = StorageReader::new(&body);
        check_status(&mut reader, CMD_GETVERSION)?;
        let (response, mut version) = reader.read_command()?;
        if response != CMD_GETVERSION {
            return Err(TraciError::UnexpectedResponse {
                expected: CMD_GETVERSION,
                got: response,
            });
        }
        let api = version.read_i32()?;
        let name = version.read_string()?;
        Ok((api, name))
    }
}

/// Consumes the leading status command of a response.
fn check_status(reader: &mut StorageReader<'_>, command: u8) -> TraciResult<()> {
    let (id, mut status) = reader.read_command()?;
    if id != command {
        return Err(TraciError::UnexpectedResponse { expected: command, got: id });
    }
    let result = status.read_u8()?;
    let description = status.read_string()?;
    if result != RTYPE_OK {
        return Err(TraciError::CommandFailed {
            command,
            status: result,
            description,
        });
    }
    if !description.is_empty() {
        log::debug!("TraCI command 0x{:02x}: {}", command, description);
    }
    Ok(())
}

impl<S> SimulationControl for TraciConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn min_expected_number(&mut self) -> TraciResult<i32> {
        self.get_int(CMD_GET_SIM_VARIABLE, VAR_MIN_EXPECTED_VEHICLES, "")
            .await
    }

    async fn simulation_step(&mut self) -> TraciResult<()> {
        // Target time 0 advances by a single step.
        let mut content = StorageWriter::new();
        content.write_f64(0.0);
        let body = self.send_command(CMD_SIMSTEP, &content.into_inner()).await?;
        let mut reader = StorageReader::new(&body);
        check_status(&mut reader, CMD_SIMSTEP)
    }

    async fn get_phase(&mut self, tls_id: &str) -> TraciResult<u32> {
        let phase = self.get_int(CMD_GET_TL_VARIABLE, TL_CURRENT_PHASE, tls_id).await?;
        u32::try_from(phase).map_err(|_| {
            TraciError::UnexpectedValue(format!(
                "negative phase {} for traffic light '{}'",
                phase, tls_id
            ))
        })
    }

    async fn set_phase(&mut self, tls_id: &str, phase: u32) -> TraciResult<()> {
        let phase = i32::try_from(phase).map_err(|_| {
            TraciError::UnexpectedValue(format!("phase {} does not fit TraCI integer", phase))
        })?;
        let mut content = StorageWriter::new();
        content.write_u8(TL_PHASE_INDEX);
        content.write_string(tls_id);
        content.write_u8(TYPE_INTEGER);
        content.write_i32(phase);
        let body = self.send_command(CMD_SET_TL_VARIABLE, &content.into_inner()).await?;
        let mut reader = StorageReader::new(&body);
        check_status(&mut reader, CMD_SET_TL_VARIABLE)
    }

    async fn close(&mut self) -> TraciResult<()> {
        let body = self.send_command(CMD_CLOSE, &[]).await?;
        let mut reader = StorageReader::new(&body);
        check_status(&mut reader, CMD_CLOSE)?;
        self.closed = true;
        if let Err(e) = self.stream.shutdown().await {
            log::debug!("Socket shutdown after close: {}", e);
        }
        if let Some(mut process) = self.process.take() {
            let status = process.wait().await?;
            log::info!("Simulator exited with {}", status);
        }
        log::info!("TraCI connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, DuplexStream};

    fn status(command: u8, result: u8, description: &str) -> StorageWriter {
        let mut content = StorageWriter::new();
        content.write_u8(result);
        content.write_string(description);
        let mut out = StorageWriter::new();
        out.write_command(command, &content.into_inner());
        out
    }

    fn int_response(domain: u8, variable: u8, object_id: &str, value: i32) -> Vec<u8> {
        let mut out = status(domain, RTYPE_OK, "");
        let mut content = StorageWriter::new();
        content.write_u8(variable);
        content.write_string(object_id);
        content.write_u8(TYPE_INTEGER);
        content.write_i32(value);
        out.write_command(domain + RESPONSE_OFFSET, &content.into_inner());
        frame_message(&out.into_inner())
    }

    /// Reads one request from the server side and answers with `reply`.
    async fn answer(server: &mut DuplexStream, reply: Vec<u8>) -> Vec<u8> {
        let len = server.read_u32().await.unwrap() as usize;
        let mut request = vec![0u8; len - 4];
        server.read_exact(&mut request).await.unwrap();
        server.write_all(&reply).await.unwrap();
        request
    }

    #[tokio::test]
    async fn reads_current_phase() {
        let (client, mut server) = duplex(1024);
        let mut conn = TraciConnection::new(client);
        let reply = int_response(CMD_GET_TL_VARIABLE, TL_CURRENT_PHASE, "42442621", 2);
        let (phase, request) = tokio::join!(conn.get_phase("42442621"), answer(&mut server, reply));
        assert_eq!(phase.unwrap(), 2);

        let mut reader = StorageReader::new(&request);
        let (command, mut content) = reader.read_command().unwrap();
        assert_eq!(command, CMD_GET_TL_VARIABLE);
        assert_eq!(content.read_u8().unwrap(), TL_CURRENT_PHASE);
        assert_eq!(content.read_string().unwrap(), "42442621");
    }

    #[tokio::test]
    async fn set_phase_encodes_typed_integer() {
        let (client, mut server) = duplex(1024);
        let mut conn = TraciConnection::new(client);
        let reply = frame_message(&status(CMD_SET_TL_VARIABLE, RTYPE_OK, "").into_inner());
        let (result, request) =
            tokio::join!(conn.set_phase("42442621", 3), answer(&mut server, reply));
        result.unwrap();

        let mut reader = StorageReader::new(&request);
        let (command, mut content) = reader.read_command().unwrap();
        assert_eq!(command, CMD_SET_TL_VARIABLE);
        assert_eq!(content.read_u8().unwrap(), TL_PHASE_INDEX);
        assert_eq!(content.read_string().unwrap(), "42442621");
        assert_eq!(content.read_u8().unwrap(), TYPE_INTEGER);
        assert_eq!(content.read_i32().unwrap(), 3);
    }

    #[tokio::test]
    async fn error_status_surfaces_description() {
        let (client, mut server) = duplex(1024);
        let mut conn = TraciConnection::new(client);
        let description = "Traffic light 'nope' is not known";
        let reply =
            frame_message(&status(CMD_GET_TL_VARIABLE, RTYPE_ERR, description).into_inner());
        let (result, _) = tokio::join!(conn.get_phase("nope"), answer(&mut server, reply));
        match result {
            Err(TraciError::CommandFailed { command, status, description }) => {
                assert_eq!(command, CMD_GET_TL_VARIABLE);
                assert_eq!(status, RTYPE_ERR);
                assert!(description.contains("not known"));
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn step_ignores_subscription_trailer() {
        let (client, mut server) = duplex(1024);
        let mut conn = TraciConnection::new(client);
        let mut body = status(CMD_SIMSTEP, RTYPE_OK, "");
        body.write_i32(0);
        let reply = frame_message(&body.into_inner());
        let (result, request) = tokio::join!(conn.simulation_step(), answer(&mut server, reply));
        result.unwrap();

        let mut reader = StorageReader::new(&request);
        let (command, mut content) = reader.read_command().unwrap();
        assert_eq!(command, CMD_SIMSTEP);
        assert_eq!(content.read_f64().unwrap(), 0.0);
    }

    #[tokio::test]
    async fn wrong_value_type_is_rejected() {
        let (client, mut server) = duplex(1024);
        let mut conn = TraciConnection::new(client);
        let mut out = status(CMD_GET_SIM_VARIABLE, RTYPE_OK, "");
        let mut content = StorageWriter::new();
        content.write_u8(VAR_MIN_EXPECTED_VEHICLES);
        content.write_string("");
        content.write_u8(0x0B);
        content.write_f64(1.0);
        out.write_command(CMD_GET_SIM_VARIABLE + RESPONSE_OFFSET, &content.into_inner());
        let reply = frame_message(&out.into_inner());
        let (result, _) = tokio::join!(conn.min_expected_number(), answer(&mut server, reply));
        assert!(matches!(
            result,
            Err(TraciError::UnexpectedType { expected: TYPE_INTEGER, got: 0x0B })
        ));
    }

    #[tokio::test]
    async fn negative_phase_is_rejected() {
        let (client, mut server) = duplex(1024);
        let mut conn = TraciConnection::new(client);
        let reply = int_response(CMD_GET_TL_VARIABLE, TL_CURRENT_PHASE, "42442621", -1);
        let (result, _) = tokio::join!(conn.get_phase("42442621"), answer(&mut server, reply));
        assert!(matches!(result, Err(TraciError::UnexpectedValue(_))));
    }

    #[tokio::test]
    async fn calls_after_close_fail() {
        let (client, mut server) = duplex(1024);
        let mut conn = TraciConnection::new(client);
        let reply = frame_message(&status(CMD_CLOSE, RTYPE_OK, "").into_inner());
        let (result, _) = tokio::join!(conn.close(), answer(&mut server, reply));
        result.unwrap();
        assert!(matches!(conn.simulation_step().await, Err(TraciError::Closed)));
    }

    #[tokio::test]
    async fn version_handshake() {
        let (client, mut server) = duplex(1024);
        let mut conn = TraciConnection::new(client);
        let mut out = status(CMD_GETVERSION, RTYPE_OK, "");
        let mut content = StorageWriter::new();
        content.write_i32(21);
        content.write_string("SUMO 1.20.0");
        out.write_command(CMD_GETVERSION, &content.into_inner());
        let reply = frame_message(&out.into_inner());
        let (result, _) = tokio::join!(conn.get_version(), answer(&mut server, reply));
        assert_eq!(result.unwrap(), (21, "SUMO 1.20.0".to_string()));
    }
}
