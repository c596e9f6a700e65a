use anyhow::{Context as _, Result};
use catalog::{BatchOperation, CatalogClient, DryRunCatalog, PlannedBatch};
use colored::Colorize;
use reconcile::{ArtifactResolver, LifecycleController, LifecycleEvent, Transition};

use crate::Context;
use crate::cli::PlanArgs;
use crate::commands::read_event;
use crate::config::Settings;
use crate::handler;
use crate::ui;

pub fn run(ctx: &Context, settings: &Settings, args: PlanArgs) -> Result<()> {
    let body = read_event(&args.event)?;
    let request = handler::decode(&body)?;
    let event = LifecycleEvent::try_from(&request).context("Invalid lifecycle event")?;

    let client = settings.catalog_client(Some(&event.context.stack.region))?;
    let resolver = settings.resolver(client.clone());
    let (transition, planned) = plan(client, resolver, &event)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&transition)?);
    } else {
        print_plan(ctx, &event, &transition, &planned);
    }
    Ok(())
}

/// Run the controller against a catalog that only records writes
fn plan<C, R>(
    client: C,
    resolver: R,
    event: &LifecycleEvent,
) -> Result<(Transition, Vec<PlannedBatch>)>
where
    C: CatalogClient,
    R: ArtifactResolver,
{
    let controller = LifecycleController::new(DryRunCatalog::new(client), resolver);
    let transition = controller.handle(&event.request)?;
    let planned = controller.client().planned();
    Ok((transition, planned))
}

fn print_plan(ctx: &Context, event: &LifecycleEvent, transition: &Transition, planned: &[PlannedBatch]) {
    let desired = event.request.desired();

    ui::header(&format!("{} plan", transition.kind));
    ui::kv("Stack", &event.context.stack.stack_name);
    ui::kv("Resource", &event.context.logical_resource_id);
    ui::kv("Service action", desired.action_id.as_str());
    ui::kv("Product", desired.product_id.as_str());
    ui::kv("State", &format!("{} -> {}", transition.from, transition.to));
    let physical_id = transition
        .physical_resource_id
        .as_ref()
        .or(event.request.physical_resource_id())
        .map_or("(none)", |id| id.as_str());
    ui::kv("Physical id", physical_id);

    if let Some(diff) = &transition.diff {
        if !diff.dangling.is_empty() {
            ui::warn(&format!("Stays associated after update: {}", diff.dangling));
        }
        if !diff.ignored_additions.is_empty() {
            ui::warn(&format!(
                "Not associated because the set did not grow: {}",
                diff.ignored_additions
            ));
        }
    }

    if planned.is_empty() {
        println!();
        ui::success("No catalog changes");
        return;
    }

    for batch in planned {
        ui::section(&format!("{} ({})", batch.operation, batch.tuples.len()));
        for tuple in &batch.tuples {
            let marker = match batch.operation {
                BatchOperation::Associate => "+".green(),
                BatchOperation::Disassociate => "-".red(),
            };
            println!("  {} {}", marker, tuple.artifact_id);
        }
    }

    if ctx.verbose > 0 {
        println!();
        ui::dim(&format!("{} batch call(s) would be sent", planned.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::MockCatalog;
    use reconcile::{DeclaredArtifacts, DiscoveredArtifacts};
    use serde_json::json;

    fn event(request_type: &str) -> LifecycleEvent {
        LifecycleEvent::from_json(
            &json!({
                "RequestType": request_type,
                "StackId": "arn:aws:cloudformation:test-region:test-account:stack/test/uuid",
                "RequestId": "req-1",
                "LogicalResourceId": "Association",
                "PhysicalResourceId": "test-physical-id",
                "ResourceProperties": {
                    "ServiceActionId": "act-1",
                    "ProductId": "prod-1",
                    "ProvisioningArtifactIds": "v1|v2"
                },
                "OldResourceProperties": {
                    "ServiceActionId": "act-1",
                    "ProductId": "prod-1",
                    "ProvisioningArtifactIds": "v1|v2|v3"
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_plan_create_sends_nothing() {
        let mock = MockCatalog::new();
        let (transition, planned) = plan(mock.clone(), DeclaredArtifacts, &event("Create")).unwrap();

        assert!(mock.calls().is_empty());
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].operation, BatchOperation::Associate);
        assert_eq!(planned[0].tuples.len(), 2);
        assert!(transition.physical_resource_id.unwrap().is_minted_format());
    }

    #[test]
    fn test_plan_shrinking_update_is_empty() {
        let (transition, planned) =
            plan(MockCatalog::new(), DeclaredArtifacts, &event("Update")).unwrap();
        assert!(planned.is_empty());
        assert_eq!(transition.diff.unwrap().dangling.len(), 1);
    }

    #[test]
    fn test_plan_discovered_reads_catalog() {
        let mock = MockCatalog::new();
        mock.add_artifacts("prod-1", ["vA", "vB", "vC"]);
        let (_, planned) = plan(
            mock.clone(),
            DiscoveredArtifacts::new(mock.clone()),
            &event("Delete"),
        )
        .unwrap();

        assert_eq!(mock.calls().len(), 1);
        assert_eq!(planned[0].operation, BatchOperation::Disassociate);
        assert_eq!(planned[0].tuples.len(), 3);
    }
}
