use std::path::PathBuf;

use crate::report;

use super::InputArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TraitsArg {
    #[clap(flatten)]
    input: InputArg,
    /// Directory the trait files are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

pub(crate) fn run(arg: &TraitsArg) -> anyhow::Result<()> {
    let records = arg.input.load()?;
    for (key, collection) in &records.groups {
        report::save_traits(&arg.output_dir, key, collection)?;
    }
    Ok(())
}
