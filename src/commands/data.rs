//! Data command handler.

use std::collections::BTreeMap;

use anyhow::bail;
use impex::{KeyValueStorage, Stores};

use super::{DataAction, DataStore};

/// Data command.
pub fn cmd_data(stores: &Stores, action: DataAction) -> anyhow::Result<()> {
    match action {
        DataAction::Get { id, store } => {
            stores.templates.get(id)?;
            let data = store_for(stores, store).get_all(id)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        },

        DataAction::Set { id, store, pairs } => {
            stores.templates.get(id)?;
            let data = parse_pairs(&pairs)?;
            store_for(stores, store).save_all(id, &data)?;
            println!("Saved {} key(s) for template {}", data.len(), id.display_number());
        },
    }

    Ok(())
}

fn store_for(stores: &Stores, store: DataStore) -> &dyn KeyValueStorage {
    match store {
        DataStore::Object => stores.object_data.as_ref(),
        DataStore::Format => stores.format_data.as_ref(),
    }
}

fn parse_pairs(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut data = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected KEY=VALUE, got '{pair}'");
        };
        data.insert(key.to_string(), value.to_string());
    }
    Ok(data)
}
