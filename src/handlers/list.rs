use crate::analyzer::kubescore::CheckRegistry;

/// Print every registered check as CSV.
pub fn handle_list(registry: &CheckRegistry) -> crate::Result<()> {
    print!("{}", format_check_list(registry));
    Ok(())
}

/// One `id,target,comment,default|optional` row per check, in
/// registration order.
pub fn format_check_list(registry: &CheckRegistry) -> String {
    let mut output = String::new();
    for check in registry.all() {
        let info = &check.info;
        let enabled = if info.optional { "optional" } else { "default" };
        output.push_str(&format!(
            "{},{},{},{}\n",
            csv_field(&info.id),
            info.facet,
            csv_field(&info.comment),
            enabled
        ));
    }
    output
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
