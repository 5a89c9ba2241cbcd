/// Deprecation notices attached to the version listing of specific providers
const PROVIDER_WARNINGS: &[(&str, &str, &str)] = &[(
    "hashicorp",
    "terraform",
    "This provider is archived and no longer needed. The terraform_remote_state data source is built into the latest OpenTofu release.",
)];

/// Returns the warnings for `namespace/provider_type`, matched case-insensitively.
pub fn provider_warnings(namespace: &str, provider_type: &str) -> Vec<String> {
    PROVIDER_WARNINGS
        .iter()
        .filter(|(ns, ty, _)| {
            ns.eq_ignore_ascii_case(namespace) && ty.eq_ignore_ascii_case(provider_type)
        })
        .map(|(_, _, message)| message.to_string())
        .collect()
}
