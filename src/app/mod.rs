pub(crate) mod engine;
mod tui;


use anyhow::Result;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::http::HttpProbe;
use crate::paths::config_file_path;

use self::engine::{StreamUrl, blacklist_file, extract_file_token, find_working_host, host_of};

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Some(Command::Probe) => run_probe(&config)?,
        Some(Command::Hosts) => run_hosts(&config),
        Some(Command::Blacklist { stream_url }) => run_blacklist(&config, &stream_url),
        Some(Command::Tui) | None => tui::run_tui(&config)?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path()?,
    };
    Ok(Config::load(&path)?.with_host_override(&cli.hosts))
}

fn run_probe(config: &Config) -> Result<()> {
    let hosts = config.candidate_hosts();
    println!("Probing {} host(s)...", hosts.len());
    match find_working_host(&HttpProbe, &hosts, config.timeouts()) {
        Ok(found) => {
            println!("  Host: {}", found.host);
            println!("  Stream: {}", found.stream);
        }
        Err(err) => println!("No host yielded a playable video ({err})."),
    }
    Ok(())
}

fn run_hosts(config: &Config) {
    for (idx, host) in config.candidate_hosts().iter().enumerate() {
        println!("{:>2}. {:<32} {}", idx + 1, host.as_str(), host.base_url());
    }
}

fn run_blacklist(config: &Config, raw_url: &str) {
    let stream = StreamUrl::new(raw_url.trim());
    let Some(token) = extract_file_token(&stream) else {
        println!("Could not recover a file token from {stream}.");
        return;
    };
    let Some(host) = host_of(&stream) else {
        println!("Could not derive a server from {stream}.");
        return;
    };

    match blacklist_file(&HttpProbe, &host, &token, config.timeouts().blacklist) {
        Ok(form) => println!("Blacklisted {token} on {host} via {form}."),
        Err(err) => println!("Blacklist of {token} on {host} failed: {err}"),
    }
}
