use path_absolutize::Absolutize;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::{Error, Result};

/// ルート定義ファイルとみなすファイル名 (router ディレクトリ直下のもの)
const ROUTE_MODULE_NAMES: &[&str] = &[
    "routers.js",
    "routes.js",
    "routers.ts",
    "routes.ts",
];

/// 走査しないディレクトリ
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "target"];

/// コンポーネントのモジュール指定子 (例: "@/views/login.vue") を実ファイルに解決する
///
/// - `module`: import に書かれた文字列
/// - `importer`: その import を書いているファイル。相対指定 ("./a.vue") の基準になる
/// - `project_root`: エイリアスの展開先の基準
///
/// 戻り値:
/// - Ok(Some(path)) → 見つかったファイルの絶対パス
/// - Ok(None)       → 該当ファイルなし (パッケージ import など)
pub fn resolve_component(
    module: &str,
    importer: &Path,
    project_root: &Path,
    config: &Config,
) -> Result<Option<PathBuf>> {
    // 1) エイリアスまたは相対パスを展開して候補の基準パスを作る
    let base = if let Some(expanded) = expand_alias(module, project_root, config) {
        expanded
    } else if module.starts_with("./") || module.starts_with("../") {
        let parent_dir = importer.parent().unwrap_or(project_root);
        parent_dir.join(module)
    } else {
        // node_modules のパッケージは対象外
        debug!("パッケージ import は解決しません: {}", module);
        return Ok(None);
    };

    // 2) そのまま → 拡張子付き → ディレクトリの index.<ext> の順で試す
    let mut candidates = vec![base.clone()];
    for ext in &config.extensions {
        candidates.push(append_extension(&base, ext));
    }
    for ext in &config.extensions {
        candidates.push(base.join(format!("index.{ext}")));
    }

    // 3) 絶対パス化し、最初に存在するファイルを返す
    for cand in candidates {
        let abs = cand
            .absolutize()
            .map_err(|e| Error::io(&cand, e))?
            .to_path_buf();
        if fs::metadata(&abs).map(|m| m.is_file()).unwrap_or(false) {
            return Ok(Some(abs));
        }
    }

    Ok(None)
}

/// 最長一致のエイリアスを展開する。"@/views" は "@" に、"@views" には一致しない
fn expand_alias(module: &str, project_root: &Path, config: &Config) -> Option<PathBuf> {
    config
        .aliases
        .iter()
        .filter(|(alias, _)| {
            module == alias.as_str()
                || module
                    .strip_prefix(alias.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
        .max_by_key(|(alias, _)| alias.len())
        .map(|(alias, target)| {
            let rest = module[alias.len()..].trim_start_matches('/');
            project_root.join(target).join(rest)
        })
}

/// "main" + "vue" → "main.vue" ("a.b" の拡張子は置き換えない)
fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// プロジェクト配下からルート定義ファイルを探す (router/routers.js など)
pub fn scan_project(project_root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(project_root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let in_router_dir = path
            .parent()
            .and_then(|p| p.file_name())
            .is_some_and(|n| n == "router");
        let is_route_module = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| ROUTE_MODULE_NAMES.contains(&n));

        if in_router_dir && is_route_module {
            info!("ルート定義ファイル発見: {:?}", path);
            found.push(path.to_path_buf());
        }
    }

    // 重複を除去
    found.sort();
    found.dedup();
    Ok(found)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| {
            name.starts_with('.') || SKIPPED_DIRS.contains(&name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/admin-web")
    }

    #[test]
    fn resolves_alias_with_and_without_extension() {
        let root = fixture();
        let importer = root.join("src/router/routers.js");
        let config = Config::default();

        let login = resolve_component("@/views/login.vue", &importer, &root, &config)
            .unwrap()
            .unwrap();
        assert!(login.ends_with("src/views/login.vue"));

        // "@/views/main" はディレクトリ main/index.js に解決される
        let main = resolve_component("@/views/main", &importer, &root, &config)
            .unwrap()
            .unwrap();
        assert!(main.ends_with("src/views/main/index.js"));
    }

    #[test]
    fn relative_and_package_imports() {
        let root = fixture();
        let importer = root.join("src/router/routers.js");
        let config = Config::default();

        let home = resolve_component("../views/home.vue", &importer, &root, &config).unwrap();
        assert!(home.is_some_and(|p| p.ends_with("src/views/home.vue")));

        assert_eq!(
            resolve_component("vue-router", &importer, &root, &config).unwrap(),
            None
        );
        assert_eq!(
            resolve_component("@/views/missing.vue", &importer, &root, &config).unwrap(),
            None
        );
    }

    #[test]
    fn alias_needs_a_separator() {
        let config = Config::default();
        let root = Path::new("/proj");
        assert_eq!(
            expand_alias("@/views/a.vue", root, &config),
            Some(PathBuf::from("/proj/src/views/a.vue"))
        );
        assert_eq!(expand_alias("@scope/pkg", root, &config), None);
    }

    #[test]
    fn scan_finds_router_module() {
        let found = scan_project(&fixture()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("src/router/routers.js"));
    }
}
