use comfy_table::{Cell, Table};

use crate::cli::commands::ResourcesArgs;
use crate::probes::catalog::{self, ResourceKind};

pub fn handle_resources(args: ResourcesArgs) {
    let kinds: Vec<&ResourceKind> = catalog::CATALOG
        .iter()
        .filter(|k| args.provider.map_or(true, |p| k.provider == p))
        .collect();
    print!("{}", render_catalog(&kinds));
}

fn render_catalog(kinds: &[&ResourceKind]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Provider", "Tag", "Type", "Description"]);
    for kind in kinds {
        table.add_row(vec![
            Cell::new(kind.provider),
            Cell::new(kind.tag),
            Cell::new(kind.type_name),
            Cell::new(kind.label),
        ]);
    }
    format!("{}\n", table)
}
