use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    let path = Config::default_config_path();

    if Config::create_default_if_missing(&path)? {
        println!("✓ Config file created at {}.", path.display());
        println!("A signing secret was generated; keep it private.");
    } else {
        println!("Config file already exists: {}", path.display());
    }

    Ok(())
}
