//! Print the detected format, field list and checksums of a file.
//!
//! ```text
//! cargo run --example rominfo -- game.nds
//! RUST_LOG=romkit=debug cargo run --example rominfo -- texture.ktx
//! ```

use std::env;
use std::fs;
use std::process::ExitCode;

use romkit::formats;
use romkit::hash::{self, Algorithm};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: rominfo <file>");
        return ExitCode::FAILURE;
    };

    let mut container = match formats::open_path(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{path}: {e} ({})", e.errno());
            return ExitCode::FAILURE;
        }
    };

    println!("{path}: {}", container.id());
    for field in &container.fields() {
        println!("{:>24}: {}", field.name, field.value);
    }
    match container.image(0) {
        Ok(img) => println!("{:>24}: {}x{}", "Image", img.width(), img.height()),
        Err(romkit::Error::UnsupportedOperation) => {}
        Err(e) => println!("{:>24}: {e}", "Image"),
    }
    container.close();

    if let Ok(data) = fs::read(&path) {
        for alg in [Algorithm::Crc32, Algorithm::Sha1] {
            let digest = hash::digest(alg, &data);
            let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
            println!("{:>24}: {hex}", alg.name());
        }
    }
    ExitCode::SUCCESS
}
