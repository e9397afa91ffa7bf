//! `ember plan` command implementation.
//!
//! Resolves the requested atoms into an operation plan and prints it in
//! build order, one numbered line per package with its applied options and
//! any installed packages it removes.

use tracing::info;

use ember_resolver::{PackageOptionFlag, Resolver, ResolveRequest};

use super::CommandContext;

pub fn execute(
    atoms: Vec<String>,
    ignore_depends: bool,
    use_new_options: bool,
    options: Vec<String>,
    package_options: Vec<String>,
    ctx: &CommandContext,
) -> anyhow::Result<()> {
    let package_options = package_options
        .iter()
        .map(|raw| PackageOptionFlag::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let request = ResolveRequest {
        atoms,
        ignore_depends,
        use_new_options,
        options,
        package_options,
    };

    let plan = Resolver::new(&ctx.store, &ctx.config, request).resolve()?;
    info!(packages = plan.len(), "plan ready");

    if plan.is_empty() {
        println!("Nothing to do.");
        return Ok(());
    }

    for (index, pkg) in plan.packages.iter().enumerate() {
        let rendered_options = plan
            .options_for(pkg.id)
            .filter(|set| !set.is_empty())
            .map(|set| {
                let names: Vec<&str> = set.iter().map(String::as_str).collect();
                format!(" [{}]", names.join(" "))
            })
            .unwrap_or_default();
        println!("{:>3}. {}{}", index + 1, pkg, rendered_options);

        if let Some(removals) = plan.conflicts.get(&pkg.id) {
            for other in removals {
                println!("      removes {other}");
            }
        }
    }

    Ok(())
}
