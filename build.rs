// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: package specifiers
fn specs_arg() -> Arg {
    Arg::new("specs")
        .required(true)
        .num_args(1..)
        .help("Package specifiers (name or name-version)")
}

fn build_cli() -> Command {
    Command::new("rezlaunch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve package environments and launch applications inside them")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file (default: $REZLAUNCH_CONFIG or the user config dir)"),
        )
        .arg(
            Arg::new("packages_path")
                .long("packages-path")
                .value_name("PATH")
                .global(true)
                .help("Root holding package descriptors"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("launch")
                .about("Launch an application inside its resolved environment")
                .arg(
                    Arg::new("package")
                        .required(true)
                        .help("Package providing the application"),
                )
                .arg(
                    Arg::new("version")
                        .long("version")
                        .help("Exact version (latest when omitted)"),
                )
                .arg(
                    Arg::new("wait")
                        .long("wait")
                        .action(ArgAction::SetTrue)
                        .help("Wait for the application and exit with its return code"),
                )
                .arg(
                    Arg::new("args")
                        .last(true)
                        .num_args(0..)
                        .help("Arguments passed to the application"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve package specifiers")
                .arg(specs_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print JSON instead of a table"),
                ),
        )
        .subcommand(
            Command::new("env")
                .about("Print the environment of a resolved context as shell assignments")
                .arg(specs_arg()),
        )
        .subcommand(
            Command::new("build")
                .about("Build a package from its descriptor")
                .arg(Arg::new("name").required(true).help("Package name"))
                .arg(Arg::new("version").required(true).help("Package version"))
                .arg(
                    Arg::new("install_root")
                        .long("install-root")
                        .value_name("PATH")
                        .help("Install root (default: from config)"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List packages with descriptors or installs")
                .arg(Arg::new("name").help("Only list this package")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("rezlaunch.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
