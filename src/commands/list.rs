// src/commands/list.rs

//! List command - descriptors and installed versions

use anyhow::Result;
use rezlaunch::{ContextResolver, DescriptorStore, LauncherConfig, PackageVersion};
use std::collections::BTreeSet;

pub fn cmd_list(config: &LauncherConfig, name: Option<&str>) -> Result<()> {
    let store = DescriptorStore::new(&config.packages_path);
    let mut resolver = ContextResolver::new(config.install_root(), config.platform());

    let names: BTreeSet<String> = match name {
        Some(name) => [name.to_string()].into_iter().collect(),
        None => {
            // Package directories under the install root list the same way
            let installs = DescriptorStore::new(config.install_root());
            store.names()?.into_iter().chain(installs.names()?).collect()
        }
    };

    let mut shown = 0;
    for name in &names {
        let described = store.versions(name)?;
        let installed = resolver.installed_versions(name)?;

        let versions: BTreeSet<&PackageVersion> = described.iter().chain(&installed).collect();
        for version in versions {
            let mut flags = Vec::new();
            if described.contains(version) {
                flags.push("descriptor");
            }
            if installed.contains(version) {
                flags.push("installed");
            }
            println!("{}-{} [{}]", name, version, flags.join(", "));
            shown += 1;
        }
    }

    if shown == 0 {
        println!("No packages found");
    }
    Ok(())
}
