//! [`Args`] definitions.

use clap::Parser;

/// Server of the houses management system.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
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
    fn defaults_config_path() {
        let args = Args::try_parse_from(["houses"]).unwrap();

        assert_eq!(args.config, "config.toml");
    }

    #[test]
    fn accepts_custom_config_path() {
        let short = Args::try_parse_from(["houses", "-c", "prod.toml"]).unwrap();
        let long = Args::try_parse_from(["houses", "--config", "dev.toml"])
            .unwrap();

        assert_eq!(short.config, "prod.toml");
        assert_eq!(long.config, "dev.toml");
    }
}
