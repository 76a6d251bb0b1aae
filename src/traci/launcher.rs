use std::net::TcpListener;
use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::sleep;

use crate::control_system::config::LaunchConfig;
use crate::error::{TraciError, TraciResult};
use crate::traci::connection::TraciConnection;

/// Asks the OS for an unused local port by binding port 0.
pub fn free_port() -> TraciResult<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

/// Builds the simulator command line: `<binary> -c <config> --remote-port <port>`.
pub fn sumo_command(config: &LaunchConfig, port: u16) -> Command {
    let mut command = Command::new(&config.sumo_binary);
    command
        .arg("-c")
        .arg(&config.sumo_config)
        .arg("--remote-port")
        .arg(port.to_string())
        .stdin(Stdio::null())
        .kill_on_drop(true);
    command
}

/// Spawns the simulator and opens a TraCI session to it.
pub async fn start(config: &LaunchConfig) -> TraciResult<TraciConnection<TcpStream>> {
    let port = free_port()?;
    let mut child = sumo_command(config, port)
        .spawn()
        .map_err(|source| TraciError::Spawn {
            binary: config.sumo_binary.clone(),
            source,
        })?;
    log::info!(
        "Started {} -c {} on port {}",
        config.sumo_binary,
        config.sumo_config.display(),
        port
    );

    let stream = connect_with_retries(
        &config.host,
        port,
        config.num_retries,
        config.retry_wait,
        &mut child,
    )
    .await?;
    let mut connection = TraciConnection::with_process(stream, child);
    let (api, version) = connection.get_version().await?;
    log::info!("Connected to {} (TraCI API {})", version, api);
    Ok(connection)
}

/// Tries `num_retries + 1` times, giving up early once the simulator has exited.
pub async fn connect_with_retries(
    host: &str,
    port: u16,
    num_retries: u32,
    retry_wait: Duration,
    child: &mut Child,
) -> TraciResult<TcpStream> {
    let attempts = num_retries.saturating_add(1);
    let mut attempt = 1;
    loop {
        match TcpStream::connect((host, port)).await {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(source) => {
                if let Some(status) = child.try_wait()? {
                    return Err(TraciError::ServerExited(status));
                }
                if attempt >= attempts {
                    return Err(TraciError::Connect {
                        host: host.to_string(),
                        port,
                        attempts,
                        source,
                    });
                }
                if attempt > 1 {
                    log::warn!(
                        "Could not connect to TraCI server at {}:{} ({}), retrying in {:?}",
                        host,
                        port,
                        source,
                        retry_wait
                    );
                }
                attempt += 1;
                sleep(retry_wait).await;
            }
        }
    }
}
