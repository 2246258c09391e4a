//! Image sequence enumeration and frame numbering
//!
//! **Why**: Render farms write numbered frames (beauty.0001.exr, beauty.0002.exr...).
//! Analysis needs them in lexical order, with per-file frame numbers, before
//! any pixel work happens.
//!
//! **Used by**: Channel discovery (first frame header), convergence loop (sampled frames)
//!
//! # Frame Numbering
//!
//! The frame number is the last digit group of the file stem, so
//! `shot_010.beauty.0042.exr` resolves to 42. Files without any digits in
//! their stem are skipped with a notice.

use log::{info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Errors shared across the analysis pipeline
#[derive(Debug)]
pub enum SweepError {
    Io(String),
    Exr(String),
    Glob(String),
    NoFrames(String),
    NoChannels(String),
}

impl std::fmt::Display for SweepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepError::Io(e) => write!(f, "I/O error: {}", e),
            SweepError::Exr(e) => write!(f, "EXR error: {}", e),
            SweepError::Glob(e) => write!(f, "Glob error: {}", e),
            SweepError::NoFrames(t) => write!(f, "No sequence files found: {}", t),
            SweepError::NoChannels(t) => write!(f, "No channels found in first frame: {}", t),
        }
    }
}

impl std::error::Error for SweepError {}

/// Single sequence file with its parsed frame number
#[derive(Debug, Clone)]
pub struct SeqFrame {
    pub number: i64,
    pub path: PathBuf,
}

/// Lexically ordered frame files of one sequence
#[derive(Debug, Clone)]
pub struct Sequence {
    dir: PathBuf,
    frames: Vec<SeqFrame>,
}

impl Sequence {
    /// Build a sequence from a target path.
    ///
    /// - directory: every file with the given extension inside, sorted lexically
    /// - glob pattern (`render.*.exr`): matching files
    /// - single frame file: all files in its directory sharing the extension
    pub fn scan(target: &Path, ext: &str) -> Result<Self, SweepError> {
        let target_str = target.to_string_lossy();
        if target_str.contains('*') {
            return Self::from_glob(&target_str);
        }
        if target.is_file() {
            // parent() yields Some("") for bare file names
            let dir = match target.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            return Self::from_dir(dir, ext);
        }
        if target.is_dir() {
            return Self::from_dir(target, ext);
        }
        Err(SweepError::Io(format!(
            "Target does not exist: {}",
            target.display()
        )))
    }

    fn from_dir(dir: &Path, ext: &str) -> Result<Self, SweepError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| SweepError::Io(format!("Failed to read dir {}: {}", dir.display(), e)))?;

        let want = ext.trim_start_matches('.').to_lowercase();
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_lowercase() == want)
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        Self::from_files(dir.to_path_buf(), files)
    }

    fn from_glob(pattern: &str) -> Result<Self, SweepError> {
        let paths = glob::glob(pattern).map_err(|e| SweepError::Glob(e.to_string()))?;

        let mut files: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
        files.sort();

        if files.is_empty() {
            return Err(SweepError::NoFrames(pattern.to_string()));
        }

        let dir = files
            .first()
            .and_then(|f| f.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::from_files(dir, files)
    }

    fn from_files(dir: PathBuf, files: Vec<PathBuf>) -> Result<Self, SweepError> {
        if files.is_empty() {
            return Err(SweepError::NoFrames(dir.display().to_string()));
        }

        let mut frames = Vec::with_capacity(files.len());
        for path in files {
            match extract_frame_number(&path) {
                Some(number) => frames.push(SeqFrame { number, path }),
                None => warn!("No frame number in file name, skipping: {}", path.display()),
            }
        }

        if frames.is_empty() {
            return Err(SweepError::NoFrames(dir.display().to_string()));
        }

        info!(
            "Sequence: {} frames ({}-{}) in {}",
            frames.len(),
            frames[0].number,
            frames[frames.len() - 1].number,
            dir.display()
        );

        Ok(Self { dir, frames })
    }

    /// First frame of the sequence (`scan` never yields an empty sequence)
    pub fn first(&self) -> &SeqFrame {
        &self.frames[0]
    }

    /// All frames in lexical file order
    pub fn frames(&self) -> &[SeqFrame] {
        &self.frames
    }

    /// Directory containing the sequence files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frame count
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames sampled at a fixed stride (every `step`-th file by position)
    pub fn sampled(&self, step: usize) -> impl Iterator<Item = &SeqFrame> {
        self.frames.iter().step_by(step.max(1))
    }
}

/// Last digit group of the file stem, or None for unnumbered files
pub fn extract_frame_number(path: &Path) -> Option<i64> {
    let stem = path.file_stem().and_then(|s| s.to_str())?;
    let re = Regex::new(r"\d+").unwrap();
    re.find_iter(stem).last()?.as_str().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_extract_frame_number() {
        assert_eq!(
            extract_frame_number(Path::new("/renders/beauty.0042.exr")),
            Some(42)
        );
        assert_eq!(
            extract_frame_number(Path::new("shot_010.beauty.0001.exr")),
            Some(1)
        );
        assert_eq!(extract_frame_number(Path::new("beauty.99.exr")), Some(99));
        assert_eq!(extract_frame_number(Path::new("thumbnail.exr")), None);
        // Frame 0 is a valid frame number
        assert_eq!(extract_frame_number(Path::new("beauty.0000.exr")), Some(0));
    }

    #[test]
    fn test_scan_dir_sorts_and_numbers() {
        let dir = temp_dir("chansweep_seq_scan");
        touch(&dir, &["b.0002.exr", "b.0001.exr", "b.0010.exr", "notes.txt"]);

        let seq = Sequence::scan(&dir, "exr").unwrap();
        let numbers: Vec<i64> = seq.frames().iter().map(|f| f.number).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(seq.first().number, 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_scan_skips_unnumbered_files() {
        let dir = temp_dir("chansweep_seq_unnumbered");
        touch(&dir, &["b.0001.exr", "preview.exr"]);

        let seq = Sequence::scan(&dir, "exr").unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.first().number, 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_scan_single_file_uses_directory() {
        let dir = temp_dir("chansweep_seq_single");
        touch(&dir, &["b.0001.exr", "b.0002.exr"]);

        let seq = Sequence::scan(&dir.join("b.0002.exr"), "exr").unwrap();
        assert_eq!(seq.len(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_scan_glob_pattern() {
        let dir = temp_dir("chansweep_seq_glob");
        touch(&dir, &["a.0001.exr", "a.0002.exr", "other.0001.exr"]);

        let pattern = dir.join("a.*.exr");
        let seq = Sequence::scan(&pattern, "exr").unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.dir(), dir.as_path());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_scan_empty_dir_fails() {
        let dir = temp_dir("chansweep_seq_empty");
        assert!(matches!(
            Sequence::scan(&dir, "exr"),
            Err(SweepError::NoFrames(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_sampled_stride() {
        let dir = temp_dir("chansweep_seq_stride");
        touch(
            &dir,
            &[
                "b.0001.exr",
                "b.0002.exr",
                "b.0003.exr",
                "b.0004.exr",
                "b.0005.exr",
                "b.0006.exr",
                "b.0007.exr",
            ],
        );

        let seq = Sequence::scan(&dir, "exr").unwrap();
        let sampled: Vec<i64> = seq.sampled(3).map(|f| f.number).collect();
        assert_eq!(sampled, vec![1, 4, 7]);

        // Stride 0 clamps to 1 instead of panicking
        let all: Vec<i64> = seq.sampled(0).map(|f| f.number).collect();
        assert_eq!(all.len(), 7);

        let _ = fs::remove_dir_all(&dir);
    }
}
