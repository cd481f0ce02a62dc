use crate::{
    Error, Result,
    config::FetchArgs,
    formats::FastaReference,
    region::RegionSpec,
    types::SequenceOutput,
};
use std::io::{BufRead, Write};
use tracing::error;

/// Run `fetch`: print the sequence (or entropy) of the `--region`, or of
/// every region read from `input` when `--stdin` is set. With `--stdin`
/// the `--region` argument is ignored.
///
/// A failing stdin line is logged and skipped. Returns the number of
/// regions that failed.
pub fn run_fetch<R, W>(args: &FetchArgs, input: R, out: &mut W) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let reference = if args.index {
        FastaReference::open_rebuilt(&args.fasta)?
    } else {
        FastaReference::open(&args.fasta)?
    };

    let mut failures = 0;
    if args.stdin {
        for line in input.lines() {
            let line = line?;
            let region = line.trim_end();
            if let Err(e) = print_region(&reference, args, region, out) {
                if matches!(e, Error::Io(_)) {
                    return Err(e);
                }
                error!(region, error = %e, "could not fetch region");
                failures += 1;
            }
        }
    } else if let Some(region) = &args.region {
        print_region(&reference, args, region, out)?;
    }

    out.flush()?;
    Ok(failures)
}

fn print_region<W: Write>(
    reference: &FastaReference,
    args: &FetchArgs,
    region: &str,
    out: &mut W,
) -> Result<()> {
    let spec = RegionSpec::parse(region);
    let sequence = reference.fetch(&spec)?;

    let entropy = if args.entropy {
        if sequence.is_empty() {
            return Err(Error::InvalidInput(format!(
                "no residues in {} to compute entropy over",
                spec
            )));
        }
        Some(shannon_entropy(sequence.as_bytes()))
    } else {
        None
    };

    if args.json {
        let output = SequenceOutput {
            region: spec.to_string(),
            sequence: entropy.is_none().then_some(sequence),
            entropy,
        };
        let line = serde_json::to_string(&output)
            .map_err(|e| Error::Internal(format!("failed to encode output: {}", e)))?;
        writeln!(out, "{}", line)?;
    } else if let Some(entropy) = entropy {
        writeln!(out, "{}", entropy)?;
    } else {
        writeln!(out, "{}", sequence)?;
    }

    Ok(())
}

/// Shannon entropy in bits of the byte distribution of `data`
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }

    let total = data.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn write_fasta(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("ref.fa");
        std::fs::write(&path, ">chr1\nACGTACGT\nAAAA\n>chr2\nGGGG\n").unwrap();
        path
    }

    fn args(fasta: PathBuf) -> FetchArgs {
        FetchArgs {
            fasta,
            index: false,
            region: None,
            stdin: false,
            entropy: false,
            json: false,
        }
    }

    fn run(args: &FetchArgs, input: &str) -> (Result<usize>, String) {
        let mut out = Vec::new();
        let result = run_fetch(args, Cursor::new(input), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_entropy() {
        assert_eq!(shannon_entropy(b""), 0.0);
        assert_eq!(shannon_entropy(b"AAAA"), 0.0);
        assert!((shannon_entropy(b"ACGT") - 2.0).abs() < 1e-12);
        assert!((shannon_entropy(b"AACC") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_region() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(write_fasta(&dir));
        args.region = Some("chr1:7..10".to_string());

        let (result, out) = run(&args, "");
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "GTAA\n");
    }

    #[test]
    fn test_region_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(write_fasta(&dir));
        args.region = Some("chr9".to_string());

        let (result, out) = run(&args, "");
        assert!(matches!(result.unwrap_err(), Error::NotFound(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_stdin_regions_continue_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(write_fasta(&dir));
        args.stdin = true;

        let (result, out) = run(&args, "chr2\nchr9:1\nchr1:12\nchr1:1..3\n");
        assert_eq!(result.unwrap(), 1);
        assert_eq!(out, "GGGG\nA\nACG\n");
    }

    #[test]
    fn test_stdin_takes_over_region_argument() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(write_fasta(&dir));
        args.region = Some("chr1:1..4".to_string());
        args.stdin = true;

        let (result, out) = run(&args, "chr2:1..2\n");
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "GG\n");
    }

    #[test]
    fn test_entropy_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(write_fasta(&dir));
        args.region = Some("chr1:1..4".to_string());
        args.entropy = true;

        let (result, out) = run(&args, "");
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out.trim().parse::<f64>().unwrap(), 2.0);
    }

    #[test]
    fn test_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(write_fasta(&dir));
        args.region = Some("chr2:2..3".to_string());
        args.json = true;

        let (_, out) = run(&args, "");
        let json: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(json["region"], "chr2:2..3");
        assert_eq!(json["sequence"], "GG");
        assert!(json.get("entropy").is_none());
    }

    #[test]
    fn test_forced_index_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_fasta(&dir);
        std::fs::write(dir.path().join("ref.fa.fai"), "stale\tgarbage\n").unwrap();

        let mut args = args(fasta);
        args.index = true;
        let (result, out) = run(&args, "");
        assert_eq!(result.unwrap(), 0);
        assert!(out.is_empty());

        let fai = std::fs::read_to_string(args.index_path()).unwrap();
        assert!(fai.starts_with("chr1\t12\t6\t8\t9\n"));
    }
}
