// build.rs

use std::path::Path;
use std::process::Command;

const SHADERS: &[(&str, &str, &str)] = &[
    ("shaders/triangle.vert.glsl", "vert", "shaders/triangle.vert"),
    ("shaders/triangle.frag.glsl", "frag", "shaders/triangle.frag"),
];

fn main() {
    for (source, stage, output) in SHADERS {
        println!("cargo::rerun-if-changed={}", source);

        if !Path::new(source).exists() {
            continue;
        }

        // SPIR-V is read at runtime; without glslc the previous binaries stay.
        match Command::new("glslc")
            .arg(format!("-fshader-stage={}", stage))
            .args([*source, "-o", *output])
            .status()
        {
            Err(err) => {
                println!("cargo::warning=glslc unavailable, skipping {}: {}", source, err);
            }
            Ok(status) if !status.success() => {
                println!("cargo::warning=glslc failed on {}: {}", source, status);
            }
            Ok(_) => {}
        }
    }
}
