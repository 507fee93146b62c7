/// Re-embed the decoy page whenever the bundled assets change.
fn main() {
    println!("cargo:rerun-if-changed=assets");
}
