use anyhow::{Context as _, Result};
use catalog::CatalogClient;
use reconcile::{ArtifactResolver, LifecycleController};

use crate::cli::ServeArgs;
use crate::config::Settings;
use crate::handler;
use crate::runtime::RuntimeClient;

pub fn run(settings: &Settings, args: ServeArgs) -> Result<()> {
    let api = args
        .runtime_api
        .context("AWS_LAMBDA_RUNTIME_API is not set; use `invoke` to handle a single event")?;
    let runtime = RuntimeClient::new(&api);

    let client = match settings.catalog_client(None) {
        Ok(client) => client,
        Err(err) => {
            runtime.init_error(&err)?;
            return Err(err);
        }
    };
    let controller = LifecycleController::new(client.clone(), settings.resolver(client));
    log::info!(
        "polling {} with the {} resolver",
        runtime.base_url(),
        controller.resolver().name()
    );

    loop {
        let invocation = runtime.next()?;
        log::debug!("invocation {}", invocation.request_id);

        match process(&controller, &invocation.body) {
            Ok(ack) => runtime.respond(&invocation.request_id, &ack)?,
            Err(err) => {
                log::error!("invocation {} failed: {:#}", invocation.request_id, err);
                runtime.fail(&invocation.request_id, &err)?;
            }
        }
    }
}

/// Handle one invocation body and deliver the engine response
fn process<C, R>(controller: &LifecycleController<C, R>, body: &str) -> Result<String>
where
    C: CatalogClient,
    R: ArtifactResolver,
{
    let request = handler::decode(body)?;
    let handled = handler::handle(controller, request);
    handled.respond()?;
    Ok(serde_json::to_string(&handled.response)?)
}
