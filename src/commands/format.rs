//! Format command handler.

use std::io::{Read, Write};

use anyhow::Context;
use impex::models::{UserId, text_row};
use impex::BackendRegistry;

use super::FormatAction;

/// Format command.
pub fn cmd_format(
    registry: &BackendRegistry,
    action: FormatAction,
    user_id: UserId,
) -> anyhow::Result<()> {
    match action {
        FormatAction::Attributes { name } => {
            let backend = registry.format_backend(&name)?;
            let output = serde_json::json!({
                "attributes": backend.attributes(user_id),
                "mapping_attributes": backend.mapping_attributes(user_id),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        },

        FormatAction::PreviewImport { id, file } => {
            let template = registry.context().templates.get(id)?;
            let backend = registry.format_backend(&template.format_type)?;
            let content = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let data = backend.import_data(id, &content)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        },

        FormatAction::ExportRow { id } => {
            let template = registry.context().templates.get(id)?;
            let backend = registry.format_backend(&template.format_type)?;

            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            let cells: Vec<String> =
                serde_json::from_str(&input).context("expected a JSON array of strings")?;

            let line = backend.export_row(id, &text_row(&cells))?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(line.as_bytes())?;
            stdout.write_all(b"\n")?;
        },
    }

    Ok(())
}
