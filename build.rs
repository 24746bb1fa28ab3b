use cfg_aliases::cfg_aliases;

fn main() {
    // The script doesn't depend on our code
    println!("cargo:rerun-if-changed=build.rs");
    // But it *does* depend on cfgs!
    println!("cargo:rerun-if-env-changed=RUSTFLAGS");
    println!("cargo:rerun-if-env-changed=RUSTDOCFLAGS");

    // Higher level config groups. This way, the short phrase represents not only that the feature is requested
    // but also available at compile time or documenting. (ie, enabling "wintab" shouldn't compile err on Linux.)
    cfg_aliases! {
        // Wintab is requested and available.
        wintab: { all(feature = "wintab", any(docsrs, target_os = "windows")) },
    }
}
