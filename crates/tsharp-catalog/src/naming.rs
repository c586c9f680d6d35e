//! Platform names for source modules and declarations.

/// Namespace of a source module: the root namespace followed by the
/// module's directory segments (`models/user.ts` under `App` is `App.models`).
pub fn module_namespace(root_namespace: &str, module_path: &str) -> String {
    let mut namespace = root_namespace.to_string();
    let dirs = module_path
        .rsplit_once('/')
        .map(|(dirs, _)| dirs)
        .unwrap_or("");
    for segment in dirs.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if !namespace.is_empty() {
            namespace.push('.');
        }
        namespace.push_str(&sanitize_segment(segment));
    }
    namespace
}

/// Name of the static class holding a module's functions and variables:
/// the file stem (`models/user.ts` is `user`).
pub fn module_container_name(module_path: &str) -> String {
    let file = module_path
        .rsplit_once('/')
        .map(|(_, file)| file)
        .unwrap_or(module_path);
    let stem = file.split('.').next().unwrap_or(file);
    sanitize_segment(stem)
}

/// Platform name of a source type: ``App.models.Box`1``.
pub fn source_platform_name(namespace: &str, name: &str, arity: usize) -> String {
    let mut out = String::new();
    if !namespace.is_empty() {
        out.push_str(namespace);
        out.push('.');
    }
    out.push_str(name);
    if arity > 0 {
        out.push('`');
        out.push_str(&arity.to_string());
    }
    out
}

fn sanitize_segment(segment: &str) -> String {
    let mut out: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_namespace() {
        assert_eq!(module_namespace("App", "models/user.ts"), "App.models");
        assert_eq!(module_namespace("App", "main.ts"), "App");
        assert_eq!(module_namespace("App", "./a/b-c/x.ts"), "App.a.b_c");
    }

    #[test]
    fn test_container_and_platform_names() {
        assert_eq!(module_container_name("models/user.ts"), "user");
        assert_eq!(module_container_name("2d.view.ts"), "_2d");
        assert_eq!(source_platform_name("App.models", "Box", 1), "App.models.Box`1");
        assert_eq!(source_platform_name("App", "User", 0), "App.User");
    }
}
