// Embeds PLUGIN_ALIGN_ROOT_HINT as the last-resort plugin root, but only when
// it points at a directory that holds a registry.
#[allow(dead_code)]
#[path = "src/plugin_root.rs"]
mod plugin_root;

use std::env;

const ROOT_HINT: &str = "PLUGIN_ALIGN_ROOT_HINT";

fn main() {
    println!("cargo:rerun-if-env-changed={ROOT_HINT}");
    println!("cargo:rerun-if-changed=src/plugin_root.rs");

    let Ok(raw_hint) = env::var(ROOT_HINT) else {
        return;
    };
    match plugin_root::root_from_hint(&raw_hint) {
        Some(root) => println!("cargo:rustc-env={ROOT_HINT}={}", root.display()),
        None => println!(
            "cargo:warning={ROOT_HINT}={raw_hint} has no {}; not embedding it",
            plugin_root::REGISTRY_FILE
        ),
    }
}
