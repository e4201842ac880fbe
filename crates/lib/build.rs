//! Packs `templates/` into `$OUT_DIR/templates.zip`, which the library
//! embeds as its built-in template repository.

use std::env;
use std::error::Error;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn main() -> Result<(), Box<dyn Error>> {
  let src = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join("templates");
  let dest = PathBuf::from(env::var("OUT_DIR")?).join("templates.zip");
  println!("cargo:rerun-if-changed={}", src.display());

  let mut zip = ZipWriter::new(File::create(&dest)?);
  for entry in WalkDir::new(&src).sort_by_file_name() {
    let entry = entry?;
    let rel = entry.path().strip_prefix(&src)?;
    if rel.as_os_str().is_empty() {
      continue;
    }
    let name = archive_name(rel);
    println!("cargo:rerun-if-changed={}", entry.path().display());

    if entry.file_type().is_dir() {
      zip.add_directory(name, options(0o755))?;
    } else {
      zip.start_file(name, options(mode(entry.path())?))?;
      io::copy(&mut File::open(entry.path())?, &mut zip)?;
    }
  }
  zip.finish()?;
  Ok(())
}

fn archive_name(rel: &Path) -> String {
  rel
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

fn options(mode: u32) -> SimpleFileOptions {
  SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .unix_permissions(mode)
}

#[cfg(unix)]
fn mode(path: &Path) -> io::Result<u32> {
  use std::os::unix::fs::PermissionsExt;
  Ok(std::fs::metadata(path)?.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn mode(_path: &Path) -> io::Result<u32> {
  Ok(0o644)
}
