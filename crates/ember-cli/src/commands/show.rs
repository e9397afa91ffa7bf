//! `ember show` command implementation.

use ember_db::{PackageQuery, PackageStore};
use ember_resolver::Atom;

use super::CommandContext;

pub fn execute(atom: &str, ctx: &CommandContext) -> anyhow::Result<()> {
    let parsed = Atom::parse(atom, "command line")?;
    let query = PackageQuery::named(&parsed.category, &parsed.name);

    let available: Vec<_> = ctx
        .store
        .find(&query)?
        .into_iter()
        .filter(|pkg| parsed.admits_version(&pkg.version))
        .collect();
    let installed: Vec<_> = ctx
        .store
        .find_installed(&query)?
        .into_iter()
        .filter(|pkg| parsed.admits_version(&pkg.version))
        .collect();

    if available.is_empty() && installed.is_empty() {
        println!("No records for {}", parsed.cn());
        return Ok(());
    }

    for pkg in &available {
        let options: Vec<&str> = pkg.options.iter().map(String::as_str).collect();
        if options.is_empty() {
            println!("{} ({}, {})", pkg, pkg.repo, pkg.arch);
        } else {
            println!("{} ({}, {}) [{}]", pkg, pkg.repo, pkg.arch, options.join(" "));
        }
    }
    for pkg in &installed {
        let applied: Vec<&str> = pkg.applied.iter().map(String::as_str).collect();
        if applied.is_empty() {
            println!("{} (installed)", pkg);
        } else {
            println!("{} (installed) [{}]", pkg, applied.join(" "));
        }
    }

    Ok(())
}
