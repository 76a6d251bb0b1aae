//! Process-level behaviour of the controller binary.

use std::process::Command;

#[test]
fn stdout_stays_clean_when_simulator_cannot_start() {
    // An empty PATH makes the simulator binary impossible to find.
    let output = Command::new(env!("CARGO_BIN_EXE_traffic_light_controller_main"))
        .env("PATH", "")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty(), "{}", String::from_utf8_lossy(&output.stdout));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Controller error"), "{}", stderr);
    assert!(stderr.contains("sumo-gui"), "{}", stderr);
}
