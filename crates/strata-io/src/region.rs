//! On-disk layout: `<root>/<x mod 64>/<z mod 64>/c.<x>.<z>.dat`, every
//! number in base 36.

use std::path::{Path, PathBuf};

use strata_chunk::ChunkCoord;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Folders per axis.
pub const REGION_FANOUT: i32 = 64;

/// Lowercase base 36 with a leading `-` for negatives.
pub fn to_base36(value: i32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut v = i64::from(value).unsigned_abs();
    let mut out = Vec::new();
    while v > 0 {
        out.push(DIGITS[(v % 36) as usize]);
        v /= 36;
    }
    if value < 0 {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

pub fn chunk_path(root: &Path, coord: ChunkCoord) -> PathBuf {
    let rx = coord.cx.rem_euclid(REGION_FANOUT);
    let rz = coord.cz.rem_euclid(REGION_FANOUT);
    root.join(to_base36(rx))
        .join(to_base36(rz))
        .join(format!("c.{}.{}.dat", to_base36(coord.cx), to_base36(coord.cz)))
}

/// Flat-folder file from older saves, decimal coordinates.
pub fn legacy_path(root: &Path, coord: ChunkCoord) -> PathBuf {
    root.join(format!("c.{}.{}.dat", coord.cx, coord.cz))
}

/// Sibling file a chunk is written to before it replaces `path`.
pub fn staging_path(path: &Path) -> PathBuf {
    path.with_extension("dat.tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_digits_and_sign() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(-37), "-11");
        assert_eq!(to_base36(i32::MIN), "-zik0zk");
    }

    #[test]
    fn negative_chunks_wrap_into_the_fanout() {
        let p = chunk_path(Path::new("save"), ChunkCoord::column(-1, 70));
        assert_eq!(p, Path::new("save/1r/6/c.-1.1y.dat"));
        let l = legacy_path(Path::new("save"), ChunkCoord::column(-1, 70));
        assert_eq!(l, Path::new("save/c.-1.70.dat"));
        assert_eq!(staging_path(&p), Path::new("save/1r/6/c.-1.1y.dat.tmp"));
    }
}
