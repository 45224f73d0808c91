use roulette_core::migrate;
use roulette_core::store;
use roulette_core::{AppConfig, ApplicationError, DocumentStore, JsonFileStorage};
use serde_json::json;

use crate::commands::CommandResult;

/// Upgrades the stored document to the current schema and reports what ran.
/// The write honours `storage.write_policy` like every other mutation.
pub fn run(config: &AppConfig) -> CommandResult {
    let storage = JsonFileStorage::new(&config.storage.data_path);
    let path = storage.path().display().to_string();
    let upgrade = migrate::upgrade(store::load(&storage));

    if upgrade.changed() {
        let document_store = DocumentStore::with_document(
            storage,
            upgrade.document.clone(),
            config.storage.write_policy,
        );
        if let Err(error) = document_store.persist() {
            return CommandResult::from_error("migrate", &ApplicationError::from(error));
        }
    }

    let message = if upgrade.changed() {
        format!("migrated document to schema {}", upgrade.document.version)
    } else {
        format!("document already at schema {}", upgrade.document.version)
    };

    CommandResult::success_with_data(
        "migrate",
        message,
        Some(json!({
            "from": upgrade.from.tag(),
            "version": upgrade.document.version,
            "steps": upgrade.steps,
            "path": path,
        })),
    )
}
