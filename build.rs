//! Stamps build metadata reported by `atlas api-version`.

use vergen::{BuildBuilder, CargoBuilder, Emitter};

fn main() {
    let mut emitter = Emitter::default();

    // VERGEN_BUILD_TIMESTAMP
    if let Ok(build) = BuildBuilder::default().build_timestamp(true).build() {
        let _ = emitter.add_instructions(&build);
    }
    // VERGEN_CARGO_TARGET_TRIPLE
    if let Ok(cargo) = CargoBuilder::default().target_triple(true).build() {
        let _ = emitter.add_instructions(&cargo);
    }

    if let Err(e) = emitter.emit() {
        println!("cargo:warning=build metadata unavailable: {e}");
    }
}
