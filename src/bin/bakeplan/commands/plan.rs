//! `bakeplan plan` command

use anyhow::Result;

use crate::cli::PlanArgs;
use bakeplan::ops;
use bakeplan::GlobalContext;

pub fn execute(args: PlanArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let opts = super::plan_options(&ctx, &args.inputs, &args.detection);

    let rt = tokio::runtime::Runtime::new()?;
    let plan = rt.block_on(ops::plan(&ctx, &opts))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(plan.bake_args())?);
    } else {
        for arg in plan.bake_args() {
            println!("{}", arg);
        }
    }

    Ok(())
}
