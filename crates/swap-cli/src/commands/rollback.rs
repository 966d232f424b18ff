use crate::output;
use crate::settings::Settings;
use crate::{GlobalArgs, TargetArgs};

pub async fn run(global: &GlobalArgs, target: &TargetArgs) -> anyhow::Result<()> {
    let settings = Settings::resolve(global, target)?;
    let switcher = settings.switcher().await?;

    let report = settings.bounded(switcher.rollback(&target.service)).await?;

    println!("{}", output::rollback(&report, global.output)?);
    Ok(())
}
