#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const ORDERS_CSV: &str = "\
Order ID,Ordered At,Ship Time,Amount,Status
1,2024-03-05 14:30:00,14:30,\"1,234.50\",shipped
2,2024-03-06,45:08.3,12,pending
3,NULL,,n/a,
";

pub const ORDERS_RULES: &str = "\
columns:
  - name: Order ID
    resolver: integer
    name_mapping: order_id
  - name: Ordered At
    resolver: datetime
    name_mapping: ordered_at
  - name: Ship Time
    resolver: safe_sas_datetime
    name_mapping: ship_time
  - name: Amount
    resolver: dec15
    name_mapping: amount
  - name: Status
    resolver: text
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}
