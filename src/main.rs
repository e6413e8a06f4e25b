//! mobsim - Hostile Actor Behavior Simulation
//!
//! Runs a headless behavior scenario from a JSON config and writes the
//! resulting behavior log.

mod behavior;
mod cli;
mod headless;
mod log;

use headless::{run_headless_scenario, HeadlessScenarioConfig};

fn main() {
    let args = cli::parse_args();

    let mut config = match HeadlessScenarioConfig::load_from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading scenario config: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().into_owned());
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }

    if let Err(e) = run_headless_scenario(config) {
        eprintln!("Scenario failed: {}", e);
        std::process::exit(1);
    }
}
