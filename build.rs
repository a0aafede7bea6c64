// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("terark-get")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Terark Contributors")
        .about("Interactive online installer for prebuilt TerarkDB packages")
        .arg(
            Arg::new("catalog_url")
                .long("catalog-url")
                .value_name("URL")
                .default_value("http://terark.com/download/terarkdb")
                .help("Release catalog root URL"),
        )
        .arg(
            Arg::new("release")
                .long("release")
                .value_name("VERSION")
                .help("Release version to install (skips the version prompt)"),
        )
        .arg(
            Arg::new("install_path")
                .long("install-path")
                .value_name("PATH")
                .help("Install path (skips the install path prompt)"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(clap::ArgAction::SetTrue)
                .help("Replace an existing installation without asking"),
        )
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
    man.render(&mut buffer)
        .expect("Failed to render man page");

    let man_path = man_dir.join("terark-get.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
