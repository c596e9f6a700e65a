use anyhow::{Result, bail};
use reconcile::{LifecycleController, StackIdentity};

use crate::Context;
use crate::cli::InvokeArgs;
use crate::commands::read_event;
use crate::config::Settings;
use crate::handler;
use crate::ui;

pub fn run(ctx: &Context, settings: &Settings, args: InvokeArgs) -> Result<()> {
    let body = read_event(&args.event)?;
    let request = handler::decode(&body)?;

    let stack_region = StackIdentity::parse(&request.stack_id)
        .ok()
        .map(|stack| stack.region);
    let client = settings.catalog_client(stack_region.as_deref())?;
    let controller = LifecycleController::new(client.clone(), settings.resolver(client));

    let handled = handler::handle(&controller, request);
    println!("{}", serde_json::to_string_pretty(&handled.response)?);

    if args.respond {
        handled.respond()?;
        if !ctx.quiet {
            ui::success("Response delivered");
        }
    }

    if !handled.response.is_success() {
        bail!(
            "{} failed: {}",
            handled.request.request_type,
            handled.response.reason.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
