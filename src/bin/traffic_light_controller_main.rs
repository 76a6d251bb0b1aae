use tls_phase_cycler::{traci, ControllerConfig, CyclerResult, PhaseCycler};

async fn run(config: ControllerConfig) -> CyclerResult<()> {
    let mut cycler = PhaseCycler::new(config.cycle)?;
    let mut connection = traci::start(&config.launch).await?;
    cycler.run(&mut connection).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let config = ControllerConfig::default();
    if let Ok(json) = serde_json::to_string(&config) {
        log::info!("Controller configuration: {}", json);
    }
    log::info!("Starting traffic light controller");
    if let Err(e) = run(config).await {
        eprintln!("Controller error: {}", e);
        std::process::exit(1);
    }
}
