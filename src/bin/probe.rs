//! Non-interactive inspection of the tool list and package state
//!
//! Usage:
//!   neokat-probe <command> [args]
//!
//! Commands:
//!   categories                    List categories with item counts
//!   items <category>              List the items of one category
//!   resolve <category> <sel>      Show what a selection would pick
//!   installed <filter>            Installed packages containing <filter>
//!   lock                          Report whether dpkg is locked
//!
//! The manifest path comes from NEOKAT_MANIFEST, defaulting to
//! tools/list-tools.txt.

use std::env;
use std::path::PathBuf;

use color_eyre::Result;
use color_eyre::eyre::eyre;

use neokat::apt::{check_apt_lock, installed_tools, open_database};
use neokat::catalog::{Catalog, DEFAULT_MARKER};
use neokat::config::Config;
use neokat::selector::resolve;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args: Vec<String> = env::args().collect();
    let cmd = args.get(1).map(String::as_str).unwrap_or("help");

    match cmd {
        "categories" => cmd_categories()?,
        "items" => {
            let category = args.get(2).ok_or_else(|| eyre!("Usage: items <category>"))?;
            cmd_items(category)?;
        }
        "resolve" => {
            let (Some(category), Some(selection)) = (args.get(2), args.get(3)) else {
                return Err(eyre!("Usage: resolve <category> <selection>"));
            };
            cmd_resolve(category, selection)?;
        }
        "installed" => {
            let filter = args.get(2).ok_or_else(|| eyre!("Usage: installed <filter>"))?;
            cmd_installed(filter)?;
        }
        "lock" => match check_apt_lock() {
            Some(msg) => println!("{msg}"),
            None => println!("No package manager lock held."),
        },
        _ => {
            println!("Inspection CLI for neokat");
            println!();
            println!("Commands:");
            println!("  categories                List categories with item counts");
            println!("  items <category>          List the items of one category");
            println!("  resolve <category> <sel>  Show what a selection would pick");
            println!("  installed <filter>        Installed packages containing <filter>");
            println!("  lock                      Report whether dpkg is locked");
            println!();
            println!("Example:");
            println!("  neokat-probe resolve \"Web Applications\" 1,3");
        }
    }

    Ok(())
}

fn load_catalog() -> Result<Catalog> {
    let path = env::var_os("NEOKAT_MANIFEST")
        .map(PathBuf::from)
        .unwrap_or_else(|| Config::default().manifest);
    Ok(Catalog::load(&path, DEFAULT_MARKER)?)
}

fn cmd_categories() -> Result<()> {
    let catalog = load_catalog()?;
    if catalog.is_empty() {
        println!("No categories found.");
        return Ok(());
    }
    for (i, category) in catalog.categories().iter().enumerate() {
        println!("{}) {} ({} tools)", i + 1, category.label, category.items.len());
    }
    println!();
    println!("Total: {} tools", catalog.item_count());
    Ok(())
}

fn cmd_items(category: &str) -> Result<()> {
    let catalog = load_catalog()?;
    let items = catalog
        .get(category)
        .ok_or_else(|| eyre!("Category '{category}' not found"))?;

    println!("Tools in {category} ({}):", items.len());
    for (i, item) in items.iter().enumerate() {
        println!("  {}) {item}", i + 1);
    }
    Ok(())
}

fn cmd_resolve(category: &str, selection: &str) -> Result<()> {
    let catalog = load_catalog()?;
    let items = catalog
        .get(category)
        .ok_or_else(|| eyre!("Category '{category}' not found"))?;

    match resolve(items, selection, &Config::default().wildcard) {
        Ok(chosen) => {
            println!("Selection '{selection}' picks {} tool(s):", chosen.len());
            for name in chosen {
                println!("  + {name}");
            }
        }
        Err(e) => println!("{e}"),
    }
    Ok(())
}

fn cmd_installed(filter: &str) -> Result<()> {
    let mut db = open_database()?;
    let names = installed_tools(&mut db, filter);

    println!("Installed packages matching '{filter}' ({}):", names.len());
    for name in names.iter().take(50) {
        println!("  · {name}");
    }
    if names.len() > 50 {
        println!("  ... and {} more", names.len() - 50);
    }
    Ok(())
}
