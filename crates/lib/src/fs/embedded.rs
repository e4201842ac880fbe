//! Filesystem adapter over a zip archive held in memory.
//!
//! The built-in templates are packed into an archive by the build script and
//! compiled into the library; [`embedded`] exposes them.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::{DirEntry, FileKind, Filesystem, FsError, Metadata, clean};

static EMBEDDED_TEMPLATES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/templates.zip"));

/// The built-in template repository.
pub fn embedded() -> Result<ZipFs, FsError> {
  ZipFs::new(EMBEDDED_TEMPLATES)
}

#[derive(Debug, Clone)]
struct Node {
  kind: FileKind,
  mode: u32,
  data: Vec<u8>,
}

impl Node {
  fn dir() -> Self {
    Self {
      kind: FileKind::Dir,
      mode: 0o755,
      data: Vec::new(),
    }
  }
}

/// An archive decoded into an in-memory tree.
#[derive(Debug, Clone)]
pub struct ZipFs {
  nodes: BTreeMap<String, Node>,
}

fn parent_of(path: &str) -> &str {
  match path.rfind('/') {
    Some(idx) => &path[..idx],
    None => ".",
  }
}

impl ZipFs {
  /// Decode an archive. Parent directories missing from the archive are
  /// synthesized.
  pub fn new(bytes: &[u8]) -> Result<Self, FsError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut nodes = BTreeMap::new();
    nodes.insert(".".to_string(), Node::dir());

    for i in 0..archive.len() {
      let mut file = archive.by_index(i)?;
      let name = clean(file.name());
      if name == "." {
        continue;
      }

      let mut parent = parent_of(&name).to_string();
      while parent != "." && !nodes.contains_key(&parent) {
        nodes.insert(parent.clone(), Node::dir());
        parent = parent_of(&parent).to_string();
      }

      if file.is_dir() {
        nodes.entry(name).or_insert_with(Node::dir);
        continue;
      }

      let mut data = Vec::with_capacity(file.size() as usize);
      file
        .read_to_end(&mut data)
        .map_err(|e| FsError::io("read", name.clone(), e))?;
      let mode = file.unix_mode().map(|m| m & 0o777).unwrap_or(0o644);
      nodes.insert(
        name,
        Node {
          kind: FileKind::File,
          mode,
          data,
        },
      );
    }

    Ok(Self { nodes })
  }

  fn node(&self, op: &'static str, path: &str) -> Result<&Node, FsError> {
    self.nodes.get(&clean(path)).ok_or_else(|| FsError::NotFound {
      op,
      path: path.to_string(),
    })
  }
}

impl Filesystem for ZipFs {
  fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, FsError> {
    let node = self.node("open", path)?;
    if node.kind == FileKind::Dir {
      return Err(FsError::Unsupported {
        op: "open",
        path: path.to_string(),
      });
    }
    Ok(Box::new(Cursor::new(node.data.as_slice())))
  }

  fn stat(&self, path: &str) -> Result<Metadata, FsError> {
    let node = self.node("stat", path)?;
    Ok(Metadata {
      kind: node.kind,
      mode: node.mode,
      len: node.data.len() as u64,
    })
  }

  fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
    let dir = clean(path);
    let node = self.node("readdir", path)?;
    if node.kind != FileKind::Dir {
      return Err(FsError::Unsupported {
        op: "readdir",
        path: path.to_string(),
      });
    }

    // BTreeMap iteration keeps the listing sorted.
    Ok(
      self
        .nodes
        .iter()
        .filter(|(name, _)| name.as_str() != "." && parent_of(name) == dir)
        .map(|(name, node)| DirEntry {
          name: name.rsplit('/').next().unwrap_or(name).to_string(),
          kind: node.kind,
          mode: node.mode,
        })
        .collect(),
    )
  }
}
