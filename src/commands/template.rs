//! Template command handler.

use anyhow::Context;
use chrono::{DateTime, Utc};
use impex::Stores;
use impex::models::{NewTemplate, Template, TemplateUpdate, UserId, ValidityState};

use super::TemplateAction;

/// Template command.
pub fn cmd_template(stores: &Stores, action: TemplateAction, user_id: UserId) -> anyhow::Result<()> {
    match action {
        TemplateAction::List { object, kind } => {
            let ids = match kind {
                Some(kind) => stores.templates.list_by_kind(&object, kind)?,
                None => stores.templates.list(&object)?,
            };
            if ids.is_empty() {
                println!("No templates for object type '{object}'");
                return Ok(());
            }
            println!(
                "{:<8} {:<7} {:<10} {:<20} {:<24} NAME",
                "NUMBER", "KIND", "FORMAT", "VALIDITY", "CHANGED"
            );
            for id in ids {
                print_row(&stores.templates.get(id)?);
            }
        },

        TemplateAction::Show { id } => {
            let template = stores.templates.get(id)?;
            println!("{}", serde_json::to_string_pretty(&template)?);
        },

        TemplateAction::Add {
            object,
            format,
            name,
            kind,
            comment,
            invalid,
        } => {
            let mut template = NewTemplate::new(kind, object, format, name, user_id);
            if let Some(comment) = comment {
                template = template.with_comment(comment);
            }
            if invalid {
                template = template.with_validity(ValidityState::Invalid);
            }
            let id = stores
                .templates
                .add(&template)
                .context("failed to add template")?;
            println!("{id}");
        },

        TemplateAction::Update {
            id,
            name,
            validity,
            comment,
        } => {
            stores.templates.update(
                id,
                &TemplateUpdate {
                    name,
                    validity,
                    comment,
                    user_id,
                },
            )?;
            println!("Updated template {}", id.display_number());
        },

        TemplateAction::Delete { ids } => {
            stores.templates.delete(&ids)?;
            println!("Deleted {} template(s)", ids.len());
        },
    }

    Ok(())
}

fn print_row(template: &Template) {
    println!(
        "{:<8} {:<7} {:<10} {:<20} {:<24} {}",
        template.number,
        template.kind,
        template.format_type,
        template.validity,
        format_timestamp(template.changed_at),
        template.name
    );
}

fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map_or_else(|| secs.to_string(), |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}
