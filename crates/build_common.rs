// Shared build script helper for README-to-rustdoc rendering.
// Include from a member build.rs with: include!("../build_common.rs");
//
// The including file must import:
//   use std::env;
//   use std::fs;
//   use std::path::Path;

/// Render a crate's README.md into `OUT_DIR/README_GENERATED.md` for doc inclusion.
///
/// Source-tree links are rewritten so rustdoc resolves them as module links
/// (`](src/foo.rs)` becomes `](foo)`), and links to the workspace README are
/// pointed at the repository URL taken from the workspace Cargo.toml.
fn render_readme_for_rustdoc(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");
    println!("cargo:rerun-if-changed=../../Cargo.toml");

    let readme = Path::new(crate_dir).join("README.md");
    let Ok(markdown) = fs::read_to_string(&readme) else {
        return; // crate has no README
    };

    let mut rendered = markdown.replace("](src/", "](").replace(".rs)", ")");

    if let Some(url) = workspace_repository_url(crate_dir) {
        rendered = rendered.replace("](../../README.md", &format!("]({url}"));
    }

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set for build scripts");
    fs::write(Path::new(&out_dir).join("README_GENERATED.md"), rendered)
        .expect("write README_GENERATED.md");
}

/// Repository URL from the workspace Cargo.toml, if one is declared.
fn workspace_repository_url(crate_dir: &str) -> Option<String> {
    let manifest = Path::new(crate_dir).parent()?.parent()?.join("Cargo.toml");
    let content = fs::read_to_string(manifest).ok()?;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("repository")
            && line.contains('=')
            && let Some(start) = line.find('"')
            && let Some(end) = line.rfind('"')
            && start < end
        {
            return Some(line[start + 1..end].to_string());
        }
    }
    None
}
