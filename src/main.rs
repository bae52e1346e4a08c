use std::thread;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use traffic_light::{TrafficLight, TrafficLightError};

const OBSERVERS: usize = 3;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), TrafficLightError> {
    let light = TrafficLight::new()?;
    info!(config = ?light.config(), "starting traffic light");
    light.simulate()?;

    // each observer is a vehicle waiting at the intersection
    thread::scope(|s| {
        for vehicle in 0..OBSERVERS {
            let light = &light;
            thread::Builder::new()
                .name(format!("vehicle-{vehicle}"))
                .spawn_scoped(s, move || {
                    let start = Instant::now();
                    match light.wait_for_green() {
                        Ok(()) => info!(waited = ?start.elapsed(), "green, crossing"),
                        Err(e) => error!("gave up waiting: {e}"),
                    }
                })
                .map_err(TrafficLightError::Spawn)?;
        }
        Ok::<_, TrafficLightError>(())
    })?;

    info!(stats = ?light.queue_stats(), "all vehicles crossed, stopping");
    light.stop();
    Ok(())
}
