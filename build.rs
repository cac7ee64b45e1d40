// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("pakr")
        .version(env!("CARGO_PKG_VERSION"))
        .author("pakr Contributors")
        .about("Small per-user package manager driven by a remote JSON catalog")
        .subcommand_required(false)
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("DIR")
                .global(true)
                .help("Root directory (default: ~/.pakr)"),
        )
        .arg(
            Arg::new("catalog_url")
                .long("catalog-url")
                .value_name("URL")
                .global(true)
                .help("Catalog URL"),
        )
        .subcommand(Command::new("init").about("Initialize the pakr directory tree and registry"))
        .subcommand(
            Command::new("install")
                .about("Install a package from the catalog")
                .arg(
                    Arg::new("package_name")
                        .required(true)
                        .help("Package name as listed in the catalog"),
                ),
        )
        .subcommand(
            Command::new("uninstall")
                .about("Uninstall an installed package")
                .arg(
                    Arg::new("package_name")
                        .required(true)
                        .help("Package name to uninstall"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Run an installed package")
                .arg(Arg::new("package_name").required(true).help("Package name to run")),
        )
        .subcommand(Command::new("list").about("List installed packages"))
        .subcommand(
            Command::new("search")
                .about("Search the catalog by name substring")
                .arg(
                    Arg::new("query")
                        .required(true)
                        .help("Substring to match against package names"),
                ),
        )
        .subcommand(Command::new("open").about("Open the pakr root directory in the file manager"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("pakr.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
