use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::config::{ReconConfig, WordlistSource, DEFAULT_THREADS};
use crate::error::ReconError;

/// 输出格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Txt,
}

impl std::str::FromStr for OutputFormat {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "txt" => Ok(OutputFormat::Txt),
            _ => Err(ReconError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "shunya")]
#[command(version)]
#[command(about = "Shunya: subdomain reconnaissance tool. Results are printed to the terminal unless --output is given.", long_about = None, arg_required_else_help = true)]
pub struct Opts {
    /// target domain (e.g. example.com)
    #[arg(short, long)]
    pub domain: String,

    /// path to subdomain wordlist
    #[arg(short, long)]
    pub wordlist: Option<PathBuf>,

    /// concurrent workers per pool
    #[arg(short, long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// output file path (.json, .csv and .txt select the format)
    #[arg(short, long)]
    pub output: Option<String>,

    /// output format (table, json, csv, txt)
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,

    /// probe resolved subdomains over HTTP/HTTPS
    #[arg(long)]
    pub probe: bool,

    /// look up GeoIP information for resolved IPs
    #[arg(long)]
    pub geoip: bool,

    /// directory brute-force wordlist
    #[arg(long)]
    pub dirscan: Option<PathBuf>,

    /// DNS attempts per subdomain
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,

    /// only print warnings and results
    #[arg(short, long)]
    pub silent: bool,

    /// print per-host diagnostics
    #[arg(short, long, conflicts_with = "silent")]
    pub verbose: bool,
}

impl Opts {
    pub fn log_level(&self) -> LevelFilter {
        if self.silent {
            LevelFilter::Warn
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn to_config(&self) -> ReconConfig {
        let mut config = ReconConfig::for_domain(self.domain.to_lowercase());
        config.threads = self.threads;
        config.wordlist = self.wordlist.clone().map(WordlistSource::Path);
        config.probe = self.probe;
        config.geoip = self.geoip;
        config.dirscan = self.dirscan.clone().map(WordlistSource::Path);
        config.retry.attempts = self.attempts;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(ReconError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_opts_to_config() {
        let opts = Opts::parse_from([
            "shunya", "-d", "Example.com", "-t", "10", "--probe", "--dirscan", "dirs.txt", "--format", "csv",
        ]);
        let config = opts.to_config();

        assert_eq!(config.domain, "example.com");
        assert_eq!(config.threads, 10);
        assert!(config.probe);
        assert!(!config.geoip);
        assert!(config.wordlist.is_none());
        assert_eq!(config.dirscan, Some(WordlistSource::Path(PathBuf::from("dirs.txt"))));
        assert_eq!(opts.format, OutputFormat::Csv);
        assert_eq!(opts.log_level(), LevelFilter::Info);
    }

    #[test]
    fn test_defaults() {
        let opts = Opts::parse_from(["shunya", "--domain", "example.com", "--silent"]);
        assert_eq!(opts.threads, 30);
        assert_eq!(opts.attempts, 3);
        assert_eq!(opts.format, OutputFormat::Table);
        assert_eq!(opts.log_level(), LevelFilter::Warn);
    }
}
