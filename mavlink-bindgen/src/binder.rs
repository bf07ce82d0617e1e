//! Emits the top-level `mod.rs` binding all generated per-dialect modules together.

use std::io::Write;

/// Writes `pub mod <name>;` for every generated dialect module, in the order given.
pub fn generate<W: Write>(module_names: Vec<&str>, out: &mut W) {
    for name in module_names {
        writeln!(out, "pub mod {name};").expect("failed to write generated mod.rs");
    }
}
