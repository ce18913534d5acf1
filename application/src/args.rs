//! [`Args`] definitions.

use clap::Parser;

/// Contract lifecycle engine of the real estate agency.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Runs every sweep once for today's date and exits, instead of
    /// starting the periodic sweeps.
    #[arg(long)]
    pub once: bool,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn defaults_to_periodic_sweeps() {
        let args = Args::try_parse_from(["engine"]).unwrap();

        assert_eq!(args.config, "config.toml");
        assert!(!args.once);
    }

    #[test]
    fn parses_one_shot_run() {
        let args =
            Args::try_parse_from(["engine", "--once", "-c", "prod.toml"])
                .unwrap();

        assert_eq!(args.config, "prod.toml");
        assert!(args.once);
    }
}
