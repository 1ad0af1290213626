use std::path::Path;

use serde::Serialize;

use super::WorkspaceResult;

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> WorkspaceResult<()> {
    let data = serde_json::to_vec_pretty(value)?;
    write_bytes_atomic(path, &data)
}

pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> WorkspaceResult<()> {
    qedash_core::write_bytes_atomic(path, data)?;
    Ok(())
}
