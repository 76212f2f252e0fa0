//! Load bias recovery from the process memory map.
//!
//! Position-independent executables are loaded at a randomized base, so the
//! addresses stored in the symbol table are not the addresses seen at run
//! time. The difference (the load bias) is recovered from `/proc/self/maps`:
//! the mapping of the executable at file offset 0 starts at the runtime
//! address of the segment whose file range starts at offset 0.
//!
//! The executable's mapping is found by device and inode first, so a binary
//! that was replaced or unlinked while running still matches. The path is
//! only a fallback.

use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use procfs::process::{MMapPath, MemoryMap, Process};

/// Page mask applied to segment addresses before computing the bias.
const PAGE_MASK: u64 = !0xfff;

/// Suffix the kernel appends to mappings whose file was unlinked.
const DELETED_SUFFIX: &str = " (deleted)";

/// Device and inode of a mapped file, as reported in the maps file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    /// Device (major, minor)
    pub dev: (i32, i32),
    pub inode: u64,
}

impl FileId {
    /// Identity of the file behind `path`, following symlinks.
    pub fn of(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let dev = metadata.dev() as libc::dev_t;
        Ok(Self {
            dev: (libc::major(dev) as i32, libc::minor(dev) as i32),
            inode: metadata.ino(),
        })
    }

    fn matches(&self, mapping: &MemoryMap) -> bool {
        mapping.inode == self.inode && mapping.dev == self.dev
    }
}

/// Memory mappings of the current process.
pub fn process_maps() -> procfs::ProcResult<Vec<MemoryMap>> {
    Ok(Process::myself()?.maps()?.0)
}

fn strip_deleted(path: &str) -> &str {
    path.strip_suffix(DELETED_SUFFIX).unwrap_or(path)
}

fn same_path(mapping: &MemoryMap, exe_path: &Path) -> bool {
    let MMapPath::Path(mapped) = &mapping.pathname else {
        return false;
    };
    match (mapped.to_str(), exe_path.to_str()) {
        (Some(mapped), Some(exe)) => strip_deleted(mapped) == strip_deleted(exe),
        _ => mapped == exe_path,
    }
}

/// Compute the load bias of the executable.
///
/// `exe` is the executable's device and inode when known; `exe_path` is
/// matched (ignoring a ` (deleted)` suffix on either side) when no mapping
/// carries that identity. `segment_vaddr` is the virtual address of the
/// executable's segment that starts at file offset 0.
pub fn load_bias(
    mappings: &[MemoryMap],
    exe: Option<FileId>,
    exe_path: &Path,
    segment_vaddr: u64,
) -> Option<u64> {
    let at_start = || mappings.iter().filter(|m| m.offset == 0);

    exe.and_then(|id| at_start().find(|m| id.matches(m)))
        .or_else(|| at_start().find(|m| same_path(m, exe_path)))
        .map(|m| m.address.0.wrapping_sub(segment_vaddr & PAGE_MASK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use procfs::process::MemoryMaps;
    use procfs::FromBufRead;

    const SAMPLE_MAPS: &str = "\
55d0c2a00000-55d0c2a2e000 r--p 00000000 fd:01 1835030                    /usr/bin/symsql
55d0c2a2e000-55d0c2b40000 r-xp 0002e000 fd:01 1835030                    /usr/bin/symsql
55d0c2b40000-55d0c2b80000 r--p 00140000 fd:01 1835030                    /usr/bin/symsql
55d0c3e1f000-55d0c3e40000 rw-p 00000000 00:00 0                          [heap]
7f1a2c000000-7f1a2c021000 rw-p 00000000 00:00 0\x20
7f1a2d400000-7f1a2d428000 r--p 00000000 fd:01 1311247                    /usr/lib/x86_64-linux-gnu/libc.so.6
";

    const DELETED_MAPS: &str = "\
55d0c2a00000-55d0c2a2e000 r--p 00000000 fd:01 1835030                    /usr/bin/symsql (deleted)
55d0c2a2e000-55d0c2b40000 r-xp 0002e000 fd:01 1835030                    /usr/bin/symsql (deleted)
7f1a2d400000-7f1a2d428000 r--p 00000000 fd:01 1311247                    /usr/lib/x86_64-linux-gnu/libc.so.6
";

    const SYMSQL_ID: FileId = FileId {
        dev: (0xfd, 0x01),
        inode: 1835030,
    };

    fn mappings(text: &str) -> Vec<MemoryMap> {
        MemoryMaps::from_buf_read(text.as_bytes()).unwrap().0
    }

    #[test]
    fn test_load_bias_pie() {
        let maps = mappings(SAMPLE_MAPS);
        let bias = load_bias(&maps, None, Path::new("/usr/bin/symsql"), 0);
        assert_eq!(bias, Some(0x55d0c2a00000));
    }

    #[test]
    fn test_load_bias_by_file_id() {
        let maps = mappings(SAMPLE_MAPS);
        let bias = load_bias(&maps, Some(SYMSQL_ID), Path::new("/proc/self/exe"), 0);
        assert_eq!(bias, Some(0x55d0c2a00000));
    }

    #[test]
    fn test_load_bias_file_id_wins_over_path() {
        let maps = mappings(SAMPLE_MAPS);
        let libc_id = FileId {
            dev: (0xfd, 0x01),
            inode: 1311247,
        };
        let bias = load_bias(&maps, Some(libc_id), Path::new("/usr/bin/symsql"), 0);
        assert_eq!(bias, Some(0x7f1a2d400000));
    }

    #[test]
    fn test_load_bias_deleted_executable() {
        let maps = mappings(DELETED_MAPS);

        // current_exe() reports the unlinked path with the same suffix
        let bias = load_bias(&maps, None, Path::new("/usr/bin/symsql (deleted)"), 0);
        assert_eq!(bias, Some(0x55d0c2a00000));

        let bias = load_bias(&maps, None, Path::new("/usr/bin/symsql"), 0);
        assert_eq!(bias, Some(0x55d0c2a00000));

        let bias = load_bias(&maps, Some(SYMSQL_ID), Path::new("/usr/bin/symsql (deleted)"), 0);
        assert_eq!(bias, Some(0x55d0c2a00000));
    }

    #[test]
    fn test_load_bias_fixed_address() {
        let maps = mappings("00400000-00401000 r-xp 00000000 08:02 77 /usr/bin/static\n");
        let bias = load_bias(&maps, None, Path::new("/usr/bin/static"), 0x400000);
        assert_eq!(bias, Some(0));
    }

    #[test]
    fn test_load_bias_missing_executable() {
        let maps = mappings(SAMPLE_MAPS);
        let other = FileId {
            dev: (0x08, 0x02),
            inode: 99,
        };
        assert_eq!(load_bias(&maps, None, Path::new("/usr/bin/other"), 0), None);
        assert_eq!(load_bias(&maps, Some(other), Path::new("/usr/bin/other"), 0), None);
    }

    #[test]
    fn test_current_process_has_executable_mapping() {
        let exe = FileId::of(Path::new("/proc/self/exe")).unwrap();
        let maps = process_maps().unwrap();
        assert!(maps.iter().any(|m| m.offset == 0 && exe.matches(m)));
    }
}
