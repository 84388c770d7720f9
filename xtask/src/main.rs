// Unified Entity Store - Build Task Runner
// Unified build system using cargo xtask pattern

use anyhow::{Context, Result};
use xshell::{cmd, Shell};

fn main() -> Result<()> {
    let sh = Shell::new()?;
    let args: Vec<_> = std::env::args().skip(1).collect();

    match args.get(0).map(|s| s.as_str()) {
        Some("build") => {
            let release = args.contains(&"--release".to_string());
            build(&sh, release)
        }
        Some("test") => test(&sh),
        Some("format") => {
            let check = args.contains(&"--check".to_string());
            format(&sh, check)
        }
        Some("clippy") => clippy(&sh),
        Some("run") => run(&sh, &args[1..]),
        Some("clean") => clean(&sh),
        Some("coverage") => coverage(&sh),
        Some("ci") => ci(&sh),
        Some("dist") => dist(&sh),
        Some("install") => {
            if args.len() < 2 {
                eprintln!("Error: install requires a destination path");
                eprintln!("Usage: cargo xtask install <destination>");
                std::process::exit(1);
            }
            install(&sh, &args[1])
        }
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Unified Entity Store - Build Commands:");
    println!();
    println!("Usage: cargo xtask <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  build [--release]   Build the backend workspace");
    println!("  test                Run all tests");
    println!("  format [--check]    Format code (check mode doesn't modify)");
    println!("  clippy              Run clippy checks");
    println!("  run [ARGS...]       Build and run ues-server");
    println!("  clean               Clean build artifacts");
    println!("  coverage            Generate test coverage report");
    println!("  ci                  Run all CI checks (format + clippy + build + test)");
    println!("  dist                Create distribution package (tar.gz)");
    println!("  install <path>      Build and install ues-server to specified path");
    println!();
    println!("Examples:");
    println!("  cargo xtask build");
    println!("  cargo xtask build --release");
    println!("  cargo xtask test");
    println!("  cargo xtask format --check");
}

/// Build the backend workspace
fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("Building Unified Entity Store...");
    println!();

    if release {
        println!("[1/2] Running clippy checks...");
        clippy(sh)?;
        println!("Clippy checks passed");
        println!();
    }

    println!("[{}/2] Building backend{}...", if release { 2 } else { 1 }, if release { " (release)" } else { "" });
    build_backend(sh, release)?;
    println!("Backend build complete");
    println!();

    println!("Build complete!");

    if release {
        println!();
        println!("Distribution package location:");
        println!("   build/dist/");
    }

    Ok(())
}

/// Build backend using cargo
fn build_backend(sh: &Shell, release: bool) -> Result<()> {
    let _dir = sh.push_dir(project_root().join("backend"));

    if release {
        cmd!(sh, "cargo build --release").run().context("Failed to build backend in release mode")?;
        create_distribution(sh)?;
    } else {
        cmd!(sh, "cargo build").run().context("Failed to build backend")?;
    }

    Ok(())
}

/// Create distribution package structure
fn create_distribution(sh: &Shell) -> Result<()> {
    let project = project_root();
    let dist_dir = project.join("build/dist");

    cmd!(sh, "mkdir -p {dist_dir}/bin").run()?;
    cmd!(sh, "mkdir -p {dist_dir}/conf").run()?;
    cmd!(sh, "mkdir -p {dist_dir}/data").run()?;
    cmd!(sh, "mkdir -p {dist_dir}/logs").run()?;
    cmd!(sh, "mkdir -p {dist_dir}/migrations").run()?;

    for binary in ["ues-server", "ues-cli"] {
        let binary_src = project.join(format!("backend/target/release/{binary}"));
        let binary_dst = dist_dir.join(format!("bin/{binary}"));
        cmd!(sh, "cp {binary_src} {binary_dst}").run()?;
    }

    let migrations_src = project.join("backend/migrations");
    let migrations_dst = dist_dir.join("migrations");
    if migrations_src.exists() {
        cmd!(sh, "cp -r {migrations_src}/* {migrations_dst}/").run()?;
    }

    create_config_files(&dist_dir)?;

    Ok(())
}

/// Write the default config files a fresh install starts from
fn create_config_files(dist_dir: &std::path::Path) -> Result<()> {
    std::fs::write(
        dist_dir.join("conf/thresholds.yml"),
        "TEAM_SIM_THRESHOLD: 0.7\nCOMP_SIM_THRESHOLD: 0.75\nCONFIDENCE_REVIEW: 0.6\nCONFIDENCE_AUTOPASS: 0.85\nDOB_PARTIAL_SCORE: 0.6\n",
    )
    .context("Failed to write thresholds.yml")?;

    std::fs::write(
        dist_dir.join("conf/quality_gates.yml"),
        "max_llm_review_rate: 0.30\nmax_gray_zone_rate: 0.40\nmax_llm_error_rate: 0.20\nfail_on_high_severity_anomalies: true\n",
    )
    .context("Failed to write quality_gates.yml")?;

    Ok(())
}

/// Run all tests
fn test(sh: &Shell) -> Result<()> {
    println!("Running tests...");
    println!();

    let _dir = sh.push_dir(project_root().join("backend"));

    cmd!(sh, "cargo test --workspace").run().context("Tests failed")?;

    println!();
    println!("All tests passed!");

    Ok(())
}

/// Format code
fn format(sh: &Shell, check: bool) -> Result<()> {
    println!("Formatting code...");
    println!();

    let _dir = sh.push_dir(project_root().join("backend"));

    if check {
        cmd!(sh, "cargo fmt --all -- --check").run().context("Rust code is not formatted")?;
        println!("Rust code is properly formatted");
    } else {
        cmd!(sh, "cargo fmt --all").run().context("Failed to format Rust code")?;
        println!("Rust code formatted");
    }

    Ok(())
}

/// Run clippy checks
fn clippy(sh: &Shell) -> Result<()> {
    let _dir = sh.push_dir(project_root().join("backend"));

    cmd!(sh, "cargo clippy --release --all-targets -- --deny warnings --allow clippy::uninlined-format-args")
        .run()
        .context("Clippy checks failed")?;

    Ok(())
}

/// Build and run ues-server
fn run(sh: &Shell, args: &[String]) -> Result<()> {
    println!("Building and running ues-server...");
    println!();

    build(sh, false)?;

    println!();
    println!("Starting server...");
    println!();

    let _dir = sh.push_dir(project_root().join("backend"));

    let mut cmd = cmd!(sh, "cargo run --bin ues-server --");
    for arg in args {
        cmd = cmd.arg(arg);
    }

    cmd.run().context("Failed to run ues-server")?;

    Ok(())
}

/// Clean build artifacts
fn clean(sh: &Shell) -> Result<()> {
    println!("Cleaning build artifacts...");
    println!();

    let project = project_root();

    println!("Cleaning backend...");
    let _dir = sh.push_dir(project.join("backend"));
    cmd!(sh, "cargo clean").run()?;
    drop(_dir);

    println!("Cleaning build directory...");
    let build_dir = project.join("build");
    if build_dir.exists() {
        cmd!(sh, "rm -rf {build_dir}").run()?;
    }

    println!();
    println!("Clean complete!");

    Ok(())
}

/// Run all CI checks (format + clippy + build + test)
fn ci(sh: &Shell) -> Result<()> {
    println!("Running CI pipeline...");
    println!();

    println!("[1/4] Checking code format...");
    format(sh, true)?;
    println!("Format check passed");
    println!();

    println!("[2/4] Running clippy checks...");
    clippy(sh)?;
    println!("Clippy checks passed");
    println!();

    println!("[3/4] Building project...");
    build(sh, true)?;
    println!("Build successful");
    println!();

    println!("[4/4] Running tests...");
    test(sh)?;
    println!("All tests passed");
    println!();

    println!("CI pipeline completed successfully!");

    Ok(())
}

/// Create distribution package (tar.gz)
fn dist(sh: &Shell) -> Result<()> {
    println!("Creating distribution package...");
    println!();

    println!("Building release version...");
    build(sh, true)?;
    println!();

    let project = project_root();
    let dist_dir = project.join("build/dist");

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let package_name = format!("ues-engine-{}.tar.gz", timestamp);
    let package_path = dist_dir.join(&package_name);

    println!("Creating tarball: {}...", package_name);

    let _dir = sh.push_dir(&dist_dir);
    cmd!(sh, "tar czf {package_name} bin conf data logs migrations").run().context("Failed to create tarball")?;
    drop(_dir);

    println!();
    println!("Distribution package created!");
    println!("   Location: {}", package_path.display());
    println!("   Size: {} MB", std::fs::metadata(&package_path)?.len() / 1024 / 1024);

    Ok(())
}

/// Install built binaries to specified directory
fn install(sh: &Shell, destination: &str) -> Result<()> {
    println!("Installing ues-server and ues-cli to {}...", destination);
    println!();

    println!("Building release version...");
    build(sh, true)?;
    println!();

    let project = project_root();
    let dest_dir = std::path::Path::new(destination);
    std::fs::create_dir_all(dest_dir).context("Failed to create destination directory")?;

    for binary in ["ues-server", "ues-cli"] {
        let binary_src = project.join(format!("backend/target/release/{binary}"));
        let dest_path = dest_dir.join(binary);

        println!("Copying {} to {}...", binary, dest_path.display());
        std::fs::copy(&binary_src, &dest_path).context("Failed to copy binary")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&dest_path)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&dest_path, perms)?;
        }
    }

    println!();
    println!("Installation complete!");

    Ok(())
}

/// Generate test coverage report
fn coverage(sh: &Shell) -> Result<()> {
    println!("Generating test coverage report...");
    println!();

    let _dir = sh.push_dir(project_root().join("backend"));

    let tarpaulin_check = cmd!(sh, "cargo tarpaulin --version").ignore_status().run();

    if tarpaulin_check.is_err() {
        println!("cargo-tarpaulin not found. Installing...");
        cmd!(sh, "cargo install cargo-tarpaulin").run().context("Failed to install cargo-tarpaulin")?;
    }

    cmd!(sh, "cargo tarpaulin --workspace --out Html --out Xml --output-dir ../build/coverage")
        .run()
        .context("Failed to generate coverage report")?;

    println!();
    println!("Coverage report generated!");
    println!("   HTML: build/coverage/index.html");
    println!("   XML:  build/coverage/cobertura.xml");

    Ok(())
}

/// Get project root directory
fn project_root() -> std::path::PathBuf {
    std::path::Path::new(&env!("CARGO_MANIFEST_DIR")).ancestors().nth(1).unwrap().to_path_buf()
}
