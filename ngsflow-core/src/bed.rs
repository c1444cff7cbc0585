//! Interval-record layer: counting, sorting and rewriting BED-like files.
//!
//! Every rewriter copies `track`, `browser` and `#` lines through verbatim and keeps
//! columns it does not look at. Sorting is the exception: it drops header lines,
//! callers that need them put them back.

use std::cmp::Ordering;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::errors::Result;
use crate::models::{Region, Strand, is_header_line};
use crate::utils::{AtomicFile, get_dynamic_reader};

///
/// Header lines and records of an interval file, in file order.
///
pub fn read_regions(path: &Path) -> Result<(Vec<String>, Vec<Region>)> {
    let reader = get_dynamic_reader(path)?;
    let mut headers = Vec::new();
    let mut regions = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if is_header_line(&line) {
            headers.push(line);
        } else if !line.trim().is_empty() {
            regions.push(Region::parse(&line)?);
        }
    }

    Ok((headers, regions))
}

///
/// Number of records, optionally only those whose column 6 is `strand`.
///
pub fn count(path: &Path, strand: Option<Strand>) -> Result<u64> {
    let reader = get_dynamic_reader(path)?;
    let mut n = 0;

    for line in reader.lines() {
        let line = line?;
        if is_header_line(&line) || line.trim().is_empty() {
            continue;
        }
        match strand {
            None => n += 1,
            Some(strand) => {
                let field = line.split('\t').nth(5).map(|s| s.trim_end_matches('\r'));
                if field.and_then(|f| f.parse::<Strand>().ok()) == Some(strand) {
                    n += 1;
                }
            }
        }
    }

    Ok(n)
}

/// Ordering by chromosome (lexicographic), then start, then end.
pub fn coordinate_order(a: &Region, b: &Region) -> Ordering {
    a.chr
        .cmp(&b.chr)
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.end.cmp(&b.end))
}

pub fn write_regions<'a, I>(output: &Path, headers: &[String], regions: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Region>,
{
    let mut out = AtomicFile::create(output)?;
    for header in headers {
        writeln!(out, "{}", header)?;
    }
    for region in regions {
        writeln!(out, "{}", region)?;
    }
    out.commit()?;
    Ok(())
}

///
/// Sort records by (chromosome, start, end). Header lines are not written.
///
pub fn sort(input: &Path, output: &Path) -> Result<()> {
    let (_, mut regions) = read_regions(input)?;
    regions.sort_by(coordinate_order);
    write_regions(output, &[], &regions)
}

///
/// Sort records by length ascending; equal lengths keep their input order.
///
pub fn sort_by_size(input: &Path, output: &Path) -> Result<()> {
    let (_, mut regions) = read_regions(input)?;
    regions.sort_by_key(|r| r.length());
    write_regions(output, &[], &regions)
}

///
/// `track type=bedGraph name="{sample}[ Plus| Minus]"`
///
pub fn track_header(sample: &str, strand: Option<Strand>) -> String {
    match strand {
        Some(strand) => format!(
            "track type=bedGraph name=\"{} {}\"",
            sample,
            strand.track_label()
        ),
        None => format!("track type=bedGraph name=\"{}\"", sample),
    }
}

///
/// A bedGraph made of a single track line and no data.
///
pub fn empty_track(output: &Path, sample: &str, strand: Option<Strand>) -> Result<()> {
    write_regions(output, &[track_header(sample, strand)], std::iter::empty())
}

///
/// Stream `input` to `output`, replacing every record with whatever `f` returns
/// for it. Header lines are copied unchanged and keep their position.
///
pub fn rewrite<F>(input: &Path, output: &Path, mut f: F) -> Result<()>
where
    F: FnMut(Region) -> Vec<Region>,
{
    let reader = get_dynamic_reader(input)?;
    let mut out = AtomicFile::create(output)?;

    for line in reader.lines() {
        let line = line?;
        if is_header_line(&line) {
            writeln!(out, "{}", line)?;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        for region in f(Region::parse(&line)?) {
            writeln!(out, "{}", region)?;
        }
    }

    out.commit()?;
    Ok(())
}

///
/// Concatenate interval files, dropping `track` and `browser` lines, into one
/// coordinate-sorted output.
///
pub fn concat_sorted(inputs: &[&Path], output: &Path) -> Result<()> {
    let mut all = Vec::new();
    for input in inputs {
        let (_, regions) = read_regions(input)?;
        all.extend(regions);
    }
    all.sort_by(coordinate_order);
    write_regions(output, &[], &all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;
    use std::path::PathBuf;

    const SAMPLE: &str = "track name=s\n\
        chr2\t5\t10\ta\t0\t+\n\
        # inline comment\n\
        chr1\t20\t70\tb\t0\t-\n\
        chr1\t20\t30\tc\t0\t+\n\
        browser hide all\n\
        chr1\t3\t4\td\t0\t-1\n";

    #[fixture]
    fn sample_bed() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.bed");
        fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    fn headers_of(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|l| is_header_line(l))
            .map(|l| l.to_string())
            .collect()
    }

    #[rstest]
    fn count_all_and_by_strand(sample_bed: (tempfile::TempDir, PathBuf)) {
        assert_eq!(count(&sample_bed.1, None).unwrap(), 4);
        assert_eq!(count(&sample_bed.1, Some(Strand::Plus)).unwrap(), 2);
        assert_eq!(count(&sample_bed.1, Some(Strand::Minus)).unwrap(), 2);
    }

    #[rstest]
    fn sort_orders_by_coordinates_and_drops_headers(sample_bed: (tempfile::TempDir, PathBuf)) {
        let out = sample_bed.0.path().join("sorted.bed");
        sort(&sample_bed.1, &out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        let starts: Vec<&str> = text.lines().map(|l| l.split('\t').nth(1).unwrap()).collect();
        assert_eq!(starts, vec!["3", "20", "20", "5"]);
        assert!(text.lines().nth(1).unwrap().contains("\t30\t"));
        assert!(headers_of(&out).is_empty());
    }

    #[rstest]
    fn sort_by_size_is_ascending(sample_bed: (tempfile::TempDir, PathBuf)) {
        let out = sample_bed.0.path().join("bysize.bed");
        sort_by_size(&sample_bed.1, &out).unwrap();
        let (_, regions) = read_regions(&out).unwrap();
        let lengths: Vec<i64> = regions.iter().map(|r| r.length()).collect();
        assert_eq!(lengths, vec![1, 5, 10, 50]);
    }

    #[rstest]
    fn rewrite_passes_headers_through(sample_bed: (tempfile::TempDir, PathBuf)) {
        let out = sample_bed.0.path().join("centered.bed");
        rewrite(&sample_bed.1, &out, |r| vec![r.center()]).unwrap();
        assert_eq!(headers_of(&out), headers_of(&sample_bed.1));
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("chr1\t45\t46\tb\t0\t-"));
    }

    #[rstest]
    fn empty_track_has_single_header_line() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("s-cov-pos.bed");
        empty_track(&out, "s", Some(Strand::Plus)).unwrap();
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "track type=bedGraph name=\"s Plus\"\n"
        );
    }

    #[rstest]
    fn concat_drops_track_lines() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bed");
        let b = dir.path().join("b.bed");
        fs::write(&a, "track name=a\nchr1\t10\t20\n").unwrap();
        fs::write(&b, "browser x\nchr1\t1\t5\n").unwrap();
        let out = dir.path().join("ab.bed");
        concat_sorted(&[a.as_path(), b.as_path()], &out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "chr1\t1\t5\nchr1\t10\t20\n");
    }
}
