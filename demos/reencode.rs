//! Reads FBX binary files, rebuilds their element trees and writes them back
//! out next to the input as `<name>_out.fbx`.

use std::path::Path;

use fbxbin::convert::reencode_document;
use fbxbin::io::{read_file, write_file, WriteOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    for arg in std::env::args().skip(1) {
        let input = Path::new(&arg);
        let output = input.with_file_name(format!(
            "{}_out.fbx",
            input.file_stem().unwrap_or_default().to_string_lossy()
        ));

        let document = read_file(input)?;
        let rebuilt = reencode_document(&document)?;
        write_file(&output, &rebuilt.root, rebuilt.version, &WriteOptions::default())?;

        println!("Written: {}", output.display());
    }
    Ok(())
}
