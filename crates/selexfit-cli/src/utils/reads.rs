use crate::error::{CliError, Result};
use selexfit::core::sequence::{encode_read, parse_read, EncodedRead};
use selexfit::engine::likelihood::SelexData;
use std::path::{Path, PathBuf};
use tracing::info;

/// Loads per-round read files into encoded selection data. Each file holds
/// one read per line; all reads across all rounds must share one length.
pub fn load_selex_rounds(paths: &[PathBuf], motif_len: usize) -> Result<SelexData> {
    let mut read_len: Option<usize> = None;
    let mut rounds: Vec<Vec<EncodedRead>> = Vec::with_capacity(paths.len());

    for path in paths {
        let mut reads = Vec::new();
        for (line_no, line) in std::fs::read_to_string(path)?.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let bases = parse_read(line).map_err(|e| parse_error(path, line_no, e))?;
            match read_len {
                None => read_len = Some(bases.len()),
                Some(len) if len != bases.len() => {
                    return Err(CliError::Argument(format!(
                        "read length {} on line {} of '{}' differs from the established length {}",
                        bases.len(),
                        line_no + 1,
                        path.display(),
                        len
                    )));
                }
                Some(_) => {}
            }
            reads.push(encode_read(&bases, motif_len).map_err(|e| parse_error(path, line_no, e))?);
        }
        info!(path = %path.display(), n_reads = reads.len(), "Loaded selection round.");
        rounds.push(reads);
    }

    let read_len = read_len.ok_or_else(|| {
        CliError::Argument("no reads found in the given round files".to_string())
    })?;
    Ok(SelexData::new(rounds, read_len)?)
}

fn parse_error(path: &Path, line_no: usize, e: impl std::error::Error + Send + Sync + 'static) -> CliError {
    CliError::FileParsing {
        path: path.to_path_buf(),
        source: anyhow::Error::new(e).context(format!("line {}", line_no + 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_round(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn loads_rounds_and_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let r0 = write_round(dir.path(), "r0.txt", &["ACGTAC", "", "TTGACA"]);
        let r1 = write_round(dir.path(), "r1.txt", &["acgtac"]);

        let data = load_selex_rounds(&[r0, r1], 3).unwrap();
        assert_eq!(data.n_rounds(), 2);
        assert_eq!(data.round_sizes(), vec![2, 1]);
        assert_eq!(data.read_len(), 6);
    }

    #[test]
    fn mixed_read_lengths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let r0 = write_round(dir.path(), "r0.txt", &["ACGTAC", "ACGT"]);
        let err = load_selex_rounds(&[r0], 3).unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }

    #[test]
    fn invalid_bases_point_at_the_offending_file() {
        let dir = tempfile::tempdir().unwrap();
        let r0 = write_round(dir.path(), "r0.txt", &["ACGNAC"]);
        let err = load_selex_rounds(&[r0], 3).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }
}
