use swapgrid_rollout::DeployRequest;

use crate::output;
use crate::settings::Settings;
use crate::{GlobalArgs, TargetArgs};

pub async fn run(
    global: &GlobalArgs,
    target: &TargetArgs,
    image: &str,
    container: &str,
) -> anyhow::Result<()> {
    let settings = Settings::resolve(global, target)?;
    let switcher = settings.switcher().await?;

    let request = DeployRequest {
        service: target.service.clone(),
        image: image.to_string(),
        container: container.to_string(),
    };
    let report = settings.bounded(switcher.deploy(&request)).await?;

    println!("{}", output::deploy(&report, global.output)?);
    Ok(())
}
