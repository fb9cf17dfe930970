// build.rs

fn main() {
    // Link against Xlib, its XCB bridge and fontconfig. pkg-config is tried first; if any
    // probe fails we fall back to plain link flags and hope the libraries
    // live in a standard search path.
    let libraries = ["x11", "x11-xcb", "xcb", "fontconfig"];

    let mut pkg_config_success = true;

    for lib in &libraries {
        if pkg_config::probe_library(lib).is_err() {
            eprintln!(
                "pkg-config failed for library '{}'. Falling back to manual linking.",
                lib
            );
            pkg_config_success = false;
            break;
        }
    }

    if !pkg_config_success {
        println!("cargo:rustc-link-lib=X11");
        println!("cargo:rustc-link-lib=X11-xcb");
        println!("cargo:rustc-link-lib=xcb");
        println!("cargo:rustc-link-lib=fontconfig");
        println!("cargo:rustc-link-search=/usr/lib");
        link_shim("X11-xcb");
        eprintln!(
            "Manual linking flags applied. Ensure X11 and Fontconfig development libraries are installed."
        );
    } else {
        eprintln!("pkg-config successfully found libraries. Linking configured automatically.");
    }
}

/// When only the versioned runtime library (e.g. `libX11-xcb.so.1`) is
/// installed, the linker cannot resolve `-lX11-xcb`. Provide the unversioned
/// symlink inside OUT_DIR and add it to the link search path.
fn link_shim(name: &str) {
    let dirs = ["/usr/lib/x86_64-linux-gnu", "/usr/lib64", "/usr/lib"];
    let unversioned = format!("lib{}.so", name);
    if dirs
        .iter()
        .any(|d| std::path::Path::new(d).join(&unversioned).exists())
    {
        return;
    }
    let versioned = dirs
        .iter()
        .map(|d| std::path::Path::new(d).join(format!("{}.1", unversioned)))
        .find(|p| p.exists());
    if let (Some(target), Ok(out_dir)) = (versioned, std::env::var("OUT_DIR")) {
        let shim_dir = std::path::Path::new(&out_dir).join("link-shim");
        let _ = std::fs::create_dir_all(&shim_dir);
        let link = shim_dir.join(&unversioned);
        let _ = std::fs::remove_file(&link);
        #[cfg(unix)]
        let _ = std::os::unix::fs::symlink(&target, &link);
        println!("cargo:rustc-link-search=native={}", shim_dir.display());
    }
}
