//! Environment readiness check.

use crate::config::Config;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Report Chromium discovery and the resolved configuration.
pub async fn run(config: &Config) -> Result<()> {
    println!("NBC Rates Doctor");
    println!("================");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let chromium = config.browser.chromium_path.clone().or_else(find_chromium);
    match &chromium {
        Some(path) if path.exists() => println!("[OK] Chromium found: {}", path.display()),
        Some(path) => println!("[!!] Chromium path does not exist: {}", path.display()),
        None => println!("[!!] Chromium NOT found. Install Chrome/Chromium or set NBC_CHROMIUM_PATH."),
    }

    match config.listen_addr() {
        Ok(addr) => println!("[OK] Listen address: {addr}"),
        Err(e) => println!("[!!] {e:#}"),
    }

    println!("[OK] Target page: {}", config.target_url);
    println!(
        "     Date input {:?}, submit {:?}, table {:?}",
        config.selectors.date_input, config.selectors.submit, config.selectors.table
    );
    println!(
        "     Timeouts: navigation {}ms, settle {}ms, grace {}ms",
        config.timeouts.navigation.as_millis(),
        config.timeouts.settle.as_millis(),
        config.timeouts.grace.as_millis()
    );
    println!("     Max open tabs: {}", config.browser.max_pages);

    println!();
    let ready = chromium.is_some_and(|p| p.exists());
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}
