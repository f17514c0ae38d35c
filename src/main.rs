use clap::{crate_version, App, Arg, SubCommand};
use log::{error, info};
use spacetraveling::build::build_site;
use spacetraveling::cms::Client;
use spacetraveling::config::Config;
use std::error::Error;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("spacetraveling")
        .version(crate_version!())
        .about("Builds a static blog from a Prismic repository")
        .subcommand(
            SubCommand::with_name("build")
                .about("Fetches every post and renders the site")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .default_value(".")
                        .help("The project directory (or any directory below it)"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .default_value("_output")
                        .help("The directory to write the site into"),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("build", Some(matches)) => build(
            Path::new(matches.value_of("project").unwrap_or(".")),
            Path::new(matches.value_of("output").unwrap_or("_output")),
        ),
        _ => {
            eprintln!("{}", matches.usage());
            std::process::exit(2);
        }
    };

    if let Err(err) = result {
        error!("{}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            error!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn build(project: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let project = project.canonicalize()?;
    let config = Config::from_directory(&project, output)?;
    info!("connecting to repository `{}`", config.repository.name);
    let client = Client::connect(&config.repository, &config.routes)?;
    build_site(&config, &client)?;
    info!("site written to {}", output.display());
    Ok(())
}
