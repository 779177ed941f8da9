//! `bakeplan run` command

use anyhow::Result;

use crate::cli::RunArgs;
use bakeplan::ops;
use bakeplan::GlobalContext;

pub fn execute(args: RunArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let opts = super::plan_options(&ctx, &args.inputs, &args.detection);

    let rt = tokio::runtime::Runtime::new()?;
    let plan = rt.block_on(ops::plan(&ctx, &opts))?;

    let outcome = ops::run(&plan)?;
    for r in &outcome.refs {
        println!("{}", r);
    }

    Ok(())
}
