//! `logsleuth events` — list every event a set of ABIs declares.

use anyhow::Result;
use std::path::PathBuf;

pub fn run(abi_paths: &[PathBuf], as_json: bool) -> Result<()> {
    let (catalog, diagnostics) = crate::load_catalog(abi_paths)?;
    crate::report_diagnostics(&diagnostics);

    if as_json {
        println!("{}", serde_json::to_string_pretty(catalog.definitions())?);
        return Ok(());
    }

    println!("{} events:", catalog.len());
    for def in catalog.definitions() {
        let marker = if def.anonymous { " (anonymous)" } else { "" };
        println!("  {}{}", def.signature, marker);
        println!("    selector: {}", def.selector);
        for param in &def.params {
            let slot = if param.indexed { "topic" } else { "data" };
            println!("    {:5} {} {}", slot, param.type_spec, param.name);
        }
    }
    Ok(())
}
