//! Template lifecycle tests against a file-backed database.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeMap;

use impex::models::{NewTemplate, TemplateId, TemplateKind, TemplateUpdate, ValidityState};
use impex::{Error, Stores};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Stores {
    Stores::open(dir.path().join("impex.db")).unwrap()
}

fn pairs(items: &[(&str, &str)]) -> BTreeMap<String, String> {
    items
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn test_name_unique_per_object_type() {
    let dir = TempDir::new().unwrap();
    let stores = open(&dir);

    stores
        .templates
        .add(&NewTemplate::new(TemplateKind::Import, "Ticket", "CSV", "X", 1))
        .unwrap();

    let err = stores
        .templates
        .add(&NewTemplate::new(TemplateKind::Export, "Ticket", "CSV", "X", 1))
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));

    stores
        .templates
        .add(&NewTemplate::new(TemplateKind::Import, "FAQ", "CSV", "X", 1))
        .unwrap();
}

#[test]
fn test_full_lifecycle_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let id = {
        let stores = open(&dir);
        let id = stores
            .templates
            .add(
                &NewTemplate::new(TemplateKind::Import, "Ticket", "CSV", "  Nightly\timport\n", 1)
                    .with_comment("from the helpdesk export"),
            )
            .unwrap();
        stores
            .format_data
            .save_all(id, &pairs(&[("ColumnSeparator", "Semicolon"), ("Charset", "UTF-8")]))
            .unwrap();
        stores
            .object_data
            .save_all(id, &pairs(&[("Queue", "Raw")]))
            .unwrap();
        id
    };

    let stores = open(&dir);
    let template = stores.templates.get(id).unwrap();
    assert_eq!(template.name, "Nightlyimport");
    assert_eq!(template.number, id.display_number());
    assert_eq!(template.number.len(), 6);
    assert_eq!(template.comment.as_deref(), Some("from the helpdesk export"));
    assert_eq!(
        stores.format_data.get(id, "ColumnSeparator").unwrap().as_deref(),
        Some("Semicolon")
    );

    stores
        .templates
        .update(
            id,
            &TemplateUpdate {
                name: "Renamed".to_string(),
                validity: ValidityState::InvalidTemporarily,
                comment: None,
                user_id: 2,
            },
        )
        .unwrap();
    let template = stores.templates.get(id).unwrap();
    assert_eq!(template.name, "Renamed");
    assert_eq!(template.validity, ValidityState::InvalidTemporarily);
    assert_eq!(template.comment, None);
    assert_eq!(template.changed_by, 2);
    assert_eq!(template.created_by, 1);
    assert_eq!(template.object_type, "Ticket");

    stores.templates.delete(&[id]).unwrap();
    assert!(stores.object_data.get_all(id).unwrap().is_empty());
    assert!(stores.format_data.get_all(id).unwrap().is_empty());
    assert!(matches!(
        stores.templates.get(id),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn test_list_ordering_and_kind_filter() {
    let dir = TempDir::new().unwrap();
    let stores = open(&dir);

    let b = stores
        .templates
        .add(&NewTemplate::new(TemplateKind::Export, "Ticket", "CSV", "b", 1))
        .unwrap();
    let a = stores
        .templates
        .add(&NewTemplate::new(TemplateKind::Import, "Ticket", "CSV", "a", 1))
        .unwrap();
    stores
        .templates
        .add(&NewTemplate::new(TemplateKind::Import, "FAQ", "CSV", "c", 1))
        .unwrap();

    assert_eq!(stores.templates.list("Ticket").unwrap(), vec![a, b]);
    assert_eq!(
        stores
            .templates
            .list_by_kind("Ticket", TemplateKind::Export)
            .unwrap(),
        vec![b]
    );
    assert!(stores.templates.list("Unknown").unwrap().is_empty());
}

#[test]
fn test_save_all_replaces_and_validates_first() {
    let dir = TempDir::new().unwrap();
    let stores = open(&dir);
    let id = stores
        .templates
        .add(&NewTemplate::new(TemplateKind::Import, "Ticket", "CSV", "T", 1))
        .unwrap();

    stores
        .object_data
        .save_all(id, &pairs(&[("a", "1"), ("b", "2")]))
        .unwrap();
    stores
        .object_data
        .save_all(id, &pairs(&[("c", "3")]))
        .unwrap();
    assert_eq!(stores.object_data.get_all(id).unwrap(), pairs(&[("c", "3")]));

    let err = stores
        .object_data
        .save_all(id, &pairs(&[("ok", "1"), ("bad\nkey", "2")]))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(stores.object_data.get_all(id).unwrap(), pairs(&[("c", "3")]));
}

#[test]
fn test_delete_many_ignores_unknown_ids() {
    let dir = TempDir::new().unwrap();
    let stores = open(&dir);
    let ids: Vec<TemplateId> = ["one", "two", "three"]
        .into_iter()
        .map(|name| {
            stores
                .templates
                .add(&NewTemplate::new(TemplateKind::Import, "Ticket", "CSV", name, 1))
                .unwrap()
        })
        .collect();

    stores
        .templates
        .delete(&[ids[0], ids[2], TemplateId::new(9_999)])
        .unwrap();
    stores.templates.delete(&[]).unwrap();

    assert_eq!(stores.templates.list("Ticket").unwrap(), vec![ids[1]]);
}
