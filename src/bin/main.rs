use remap_sync::{cli, config, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());
    let _telemetry_guard = init_tracing(cli.verbose, cli.repo.as_deref());

    if let Err(e) = cli::run(cli) {
        tracing::error!(
            transience = ?e.transience(),
            effect = e.effect().as_str(),
            "error: {e}"
        );
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, repo: Option<&std::path::Path>) -> telemetry::TelemetryGuard {
    let root = repo.map(|p| p.to_path_buf()).or_else(config::discover_repo_root);
    let cfg = match config::load_for_repo(root.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("config load failed, using defaults: {err}");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    let telemetry_cfg = telemetry::TelemetryConfig::new(verbose, cfg.logging);
    telemetry::init(telemetry_cfg)
}
