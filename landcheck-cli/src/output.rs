//! Writing layer collections to disk with capability-based IO.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use serde_json::Value;
use std::io;

use landcheck_core::LayerKind;

/// File name a layer's collection is written to.
pub(crate) fn collection_file_name(layer: LayerKind) -> String {
    format!("{layer}.geojson")
}

/// Create `dir` if needed and open it.
pub(crate) fn open_output_dir(dir: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    fs_utf8::Dir::create_ambient_dir_all(dir, ambient_authority())?;
    fs_utf8::Dir::open_ambient_dir(dir, ambient_authority())
}

/// Write `collection` as pretty JSON to `{layer}.geojson` inside `dir`.
pub(crate) fn write_collection(
    dir: &fs_utf8::Dir,
    layer: LayerKind,
    collection: &Value,
) -> io::Result<()> {
    let mut payload = serde_json::to_vec_pretty(collection).map_err(io::Error::other)?;
    payload.push(b'\n');
    dir.write(collection_file_name(layer), payload)
}
