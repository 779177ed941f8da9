//! `bakeplan refs` command

use anyhow::Result;

use crate::cli::RefsArgs;
use bakeplan::ops::metadata::{build_refs, read_metadata};

pub fn execute(args: RefsArgs) -> Result<()> {
    if let Some(metadata) = read_metadata(&args.metadata_file)? {
        for r in build_refs(&metadata) {
            println!("{}", r);
        }
    }

    Ok(())
}
