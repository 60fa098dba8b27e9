use anyhow::Context;
use clipvault::{
    config::{self, Config},
    logging, server,
    vault::VaultWriter,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("clipvault.toml");
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() { eprintln!("--config requires a path"); std::process::exit(2); }
                config_path = PathBuf::from(&args[i]);
            }
            _ => {}
        }
        i += 1;
    }

    let cfg = Config::load(&config_path).context("loading config")?;
    cfg.validate().context("validating config")?;
    logging::init(&cfg.logging);

    let root = if cfg.vault.path.is_dir() {
        config::canonical_root(&cfg.vault.path).context("resolving vault path")?
    } else {
        warn!(path = %cfg.vault.path.display(), "vault path does not exist yet; it will be created on first save");
        cfg.vault.path.clone()
    };
    let writer = VaultWriter::new(&root, &cfg.vault.subdir).serialize_saves(cfg.vault.serialize_saves);

    let addr = format!("{}:{}", cfg.server.bind_addr, cfg.server.port);
    info!(addr = %addr, vault = %writer.base_path().display(), serialize_saves = cfg.vault.serialize_saves, "clipvault ready");
    println!("clipvault ready addr={} vault={}", addr, writer.base_path().display());

    server::serve(cfg, writer).await
}
