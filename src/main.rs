use anyhow::{Context, Result};
use eve_killmail_to_csv::{
    batch::{convert_killmails, failure_lines},
    cli::{CatalogArgs, Cli, Commands},
    config::Config,
    error::ConvertError,
    inspect::{describe_catalogs, describe_columns},
    lookup::Lookups,
    source::open_source,
    ui::{ConsoleUi, Phase, Ui, UiApp},
};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // The TUI owns the terminal, so logging is silenced while it runs
    let tui = matches!(cli.command, Commands::Convert { tui: true, .. });
    init_logging(cli.verbose, tui);

    match cli.command {
        Commands::Convert {
            input,
            output,
            catalogs,
            batch_size,
            threads,
            no_narrow,
            tui,
        } => {
            let overrides = Config {
                batch_size,
                threads,
                narrow_types: no_narrow.then_some(false),
                ..catalogs.overrides()
            };
            let config = load_config(&catalogs)?.merge(overrides);

            if tui {
                let mut ui = UiApp::new().context("Failed to start terminal UI")?;
                let result = run_convert(&input, &output, &config, &mut ui);
                match result {
                    Ok(lines) => ui.finish(lines)?,
                    Err(e) => {
                        ui.restore()?;
                        report_failures(&e);
                        return Err(e);
                    }
                }
            } else {
                let mut ui = ConsoleUi::new();
                let result = run_convert(&input, &output, &config, &mut ui);
                drop(ui);
                match result {
                    Ok(lines) => {
                        for line in lines {
                            println!("{}", line);
                        }
                    }
                    Err(e) => {
                        report_failures(&e);
                        return Err(e);
                    }
                }
            }
        }

        Commands::Catalogs { catalogs } => {
            let config = load_config(&catalogs)?.merge(catalogs.overrides());
            for line in describe_catalogs(&config.catalog_paths()) {
                println!("{}", line);
            }
        }

        Commands::Columns => {
            println!("Output columns:\n");
            for line in describe_columns() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn run_convert(input: &Path, output: &Path, config: &Config, ui: &mut impl Ui) -> Result<Vec<String>> {
    ui.set_phase(Phase::LoadingCatalogs);
    let lookups = Lookups::load(&config.catalog_paths());
    ui.log(format!(
        "Catalogs: {} ships, {} types, {} solar systems",
        lookups.ships.len(),
        lookups.types.len(),
        lookups.systems.len()
    ));

    let mut source = open_source(input)?;
    let summary = convert_killmails(
        source.as_mut(),
        &lookups,
        output,
        &config.convert_options(),
        ui,
    )?;

    ui.set_phase(Phase::Complete);
    Ok(summary.report_lines())
}

/// Print the failed-record sample of a run that produced no rows
fn report_failures(err: &anyhow::Error) {
    if let Some(ConvertError::NoData { failures, .. }) = err.downcast_ref::<ConvertError>() {
        for line in failure_lines(failures) {
            eprintln!("{}", line);
        }
    }
}

fn load_config(args: &CatalogArgs) -> Result<Config> {
    let config = Config::load(args.config.as_deref())?;
    debug!("Config: {:?}", config);
    Ok(config)
}

fn init_logging(verbose: bool, tui: bool) {
    // RUST_LOG wins, then --verbose, then info
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("eve_killmail_to_csv=debug")
    } else {
        EnvFilter::new("eve_killmail_to_csv=info")
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    if tui {
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
}
