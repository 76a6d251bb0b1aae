// Simulator launch
pub const SUMO_BINARY: &str = "sumo-gui"; // "sumo" for headless runs
pub const SUMO_CONFIG: &str = "map.sumocfg";
pub const TRACI_HOST: &str = "127.0.0.1";
pub const CONNECT_RETRIES: u32 = 60;
pub const CONNECT_RETRY_WAIT_MS: u64 = 1000;

// Controlled signal
pub const TLS_ID: &str = "42442621";
pub const PHASES: [u32; 4] = [0, 1, 2, 3];
pub const SWITCH_INTERVAL: u64 = 10;
pub const STEP_DELAY_MS: u64 = 500;
