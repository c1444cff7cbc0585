use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use tempfile::NamedTempFile;

use crate::errors::{PipelineError, Result};

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::MissingArtifact(path.to_path_buf()),
        _ => PipelineError::Io(e),
    })?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Read a `chromosome<TAB>length` file, keeping file order.
///
pub fn read_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<Vec<(String, u32)>> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;
    let mut sizes = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let name = parts.next();
        let length = parts.next().and_then(|l| l.parse::<u32>().ok());
        match (name, length) {
            (Some(name), Some(length)) => sizes.push((name.to_string(), length)),
            _ => {
                return Err(PipelineError::invalid(format!(
                    "Malformed line in chrom sizes file {}: {:?}",
                    path.display(),
                    line
                )));
            }
        }
    }

    Ok(sizes)
}

pub fn get_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<HashMap<String, u32>> {
    Ok(read_chrom_sizes(path)?.into_iter().collect())
}

///
/// Fail with `MissingArtifact` unless `path` exists.
///
pub fn require(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::MissingArtifact(path.to_path_buf()))
    }
}

///
/// A file written next to its final location and renamed into place on
/// [`AtomicFile::commit`]. Dropping it without committing removes the partial file.
///
pub struct AtomicFile {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicFile {
    pub fn create<P: AsRef<Path>>(target: P) -> Result<AtomicFile> {
        let target = target.as_ref().to_path_buf();
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;
        let tmp = tempfile::Builder::new()
            .prefix(".ngsflow-")
            .suffix(".part")
            .tempfile_in(&parent)?;

        Ok(AtomicFile {
            target,
            writer: BufWriter::new(tmp),
        })
    }

    pub fn commit(self) -> Result<PathBuf> {
        let tmp = self
            .writer
            .into_inner()
            .map_err(|e| PipelineError::Io(e.into_error()))?;
        tmp.persist(&self.target).map_err(|e| PipelineError::Io(e.error))?;
        Ok(self.target)
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
