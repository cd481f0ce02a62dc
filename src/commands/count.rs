use crate::{
    Error, Result,
    config::CountArgs,
    counter::{Count, count_region},
    formats::BamSource,
    region::RegionSpec,
    source::RecordSource,
    types::CountOutput,
};
use std::io::Write;

/// Run `count` against the BAM named in `args` (or stdin) and print the result.
pub fn run_count<W: Write>(args: &CountArgs, out: &mut W) -> Result<Count> {
    let mut source = match args.input_path() {
        Some(path) => BamSource::open(path)?.with_index_path(args.index.clone()),
        None => BamSource::from_stdin()?,
    };

    count_and_print(&mut source, args, out)
}

/// Count records from any source and print the result per `args`
pub fn count_and_print<S, W>(source: &mut S, args: &CountArgs, out: &mut W) -> Result<Count>
where
    S: RecordSource + ?Sized,
    W: Write,
{
    let region = args.region.as_deref().map(RegionSpec::parse);
    let result = count_region(source, region.as_ref())?;

    if args.json {
        let output = CountOutput {
            count: result.count,
            strategy: result.strategy,
            region: region.map(|spec| spec.to_string()),
        };
        let line = serde_json::to_string(&output)
            .map_err(|e| Error::Internal(format!("failed to encode output: {}", e)))?;
        writeln!(out, "{}", line)?;
    } else {
        writeln!(out, "{}", result.count)?;
    }
    out.flush()?;

    Ok(result)
}
