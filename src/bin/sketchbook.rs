use sketchbook::{
    Result,
    cli::{Command, USAGE},
    config::AppConfig,
    sketch::Runner,
    sketches::{SKETCHES, find},
};

fn run(command: Command, mut config: AppConfig) -> Result<()> {
    match &command {
        Command::List => {
            for entry in SKETCHES {
                let settings = (entry.settings)();
                let kind = if settings.animate {
                    format!("{} frames", settings.total_frames())
                } else {
                    "still".to_string()
                };
                println!(
                    "{:<12} {}x{} {:<10} {}",
                    entry.name, settings.dimensions[0], settings.dimensions[1], kind, entry.description
                );
            }
            Ok(())
        }
        Command::Render { name, .. } => {
            command.override_config(&mut config);
            config.validate()?;

            let entry = find(name)?;
            let settings = config.apply(&(entry.settings)());
            let mut runner = Runner::new(entry, settings, &config.output.dir)?;
            let paths = runner.run()?;
            if let Some(last) = paths.last() {
                log::info!("{} frames written, last: {}", paths.len(), last.display());
            }
            Ok(())
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.debug.log_level))
        .init();

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(command, config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
