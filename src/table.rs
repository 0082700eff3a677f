// src/table.rs

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::matcher::{join_path, strip_query, Params, PathPattern};
use crate::model::{RouteEntry, RouteMeta};
use crate::parser::parse_routes_in_file;

/// リダイレクトを追いかける上限
pub const MAX_REDIRECTS: usize = 8;

/// ルートテーブル本体。起動時に一度だけ構築し、以後は読み取り専用
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

/// テーブルを走査したときの 1 ノード
#[derive(Debug, Clone)]
pub struct RouteNode<'a> {
    pub entry: &'a RouteEntry,
    /// 親のパスと結合した完全なパスパターン
    pub full_path: String,
    /// ルート側から並べた祖先 (自身は含まない)
    pub ancestors: Vec<&'a RouteEntry>,
}

impl<'a> RouteNode<'a> {
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// ルートから自身までのエントリ列
    pub fn chain(&self) -> Vec<&'a RouteEntry> {
        let mut chain = self.ancestors.clone();
        chain.push(self.entry);
        chain
    }
}

/// URL を解決した結果
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    /// マッチしたエントリ (ルート側 → 葉)
    pub matched: Vec<&'a RouteEntry>,
    pub params: Params,
    /// リダイレクト後の最終的なパス
    pub path: String,
    /// 追いかけたリダイレクト元の URL
    pub redirected_from: Vec<String>,
}

impl<'a> Resolved<'a> {
    pub fn leaf(&self) -> &'a RouteEntry {
        // matched は解決成功時に必ず 1 要素以上ある
        self.matched[self.matched.len() - 1]
    }
}

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        RouteTable { entries }
    }

    /// 管理画面に組み込まれているルートテーブル
    pub fn admin() -> &'static RouteTable {
        static ADMIN: OnceLock<RouteTable> = OnceLock::new();
        ADMIN.get_or_init(build_admin)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 深さ優先 (親 → 子) で全ノードを列挙する
    pub fn iter(&self) -> impl Iterator<Item = RouteNode<'_>> {
        let mut nodes = Vec::new();
        for entry in &self.entries {
            collect_nodes(entry, "/", &[], &mut nodes);
        }
        nodes.into_iter()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&RouteEntry> {
        self.node(name).map(|n| n.entry)
    }

    /// パスパターン (例: "/scripts/:id") と完全一致するエントリ
    pub fn find_by_path(&self, pattern: &str) -> Option<&RouteEntry> {
        self.iter()
            .find(|n| n.full_path == pattern)
            .map(|n| n.entry)
    }

    pub fn node(&self, name: &str) -> Option<RouteNode<'_>> {
        self.iter().find(|n| n.entry.name == name)
    }

    /// 祖先からの継承を反映した meta
    ///
    /// `auth` は子が明示しない限り親の値を引き継ぎ、`access` は祖先の集合との積になる。
    pub fn effective_meta(&self, name: &str) -> Option<RouteMeta> {
        let node = self.node(name)?;
        let mut chain = node.chain().into_iter();
        let first = chain.next()?;
        Some(chain.fold(first.meta.clone(), |parent, entry| {
            inherit(&parent, &entry.meta)
        }))
    }

    /// 名前とパラメータから遷移先の URL を組み立てる
    pub fn url_for(&self, name: &str, params: &Params) -> Result<String> {
        let node = self
            .node(name)
            .ok_or_else(|| Error::UnknownRoute(name.to_string()))?;
        let pattern = PathPattern::parse(&node.full_path)
            .map_err(|e| Error::Validation(vec![e.into()]))?;
        pattern
            .fill(params)
            .ok_or_else(|| Error::NoMatch(format!("{name} with {params:?}")))
    }

    /// URL をエントリ列に解決し、リダイレクトを追いかける
    pub fn resolve(&self, url: &str) -> Result<Resolved<'_>> {
        let mut current = url.to_string();
        let mut redirected_from = Vec::new();

        loop {
            let (node, params) = self
                .match_url(&current)
                .ok_or_else(|| Error::NoMatch(current.clone()))?;

            let Some(target) = &node.entry.redirect else {
                return Ok(Resolved {
                    matched: node.chain(),
                    params,
                    path: current,
                    redirected_from,
                });
            };

            redirected_from.push(current.clone());
            if redirected_from.len() > MAX_REDIRECTS {
                return Err(Error::RedirectLoop {
                    url: url.to_string(),
                    chain: redirected_from,
                });
            }

            let base = node
                .ancestors
                .iter()
                .fold("/".to_string(), |acc, a| join_path(&acc, &a.path));
            let target = join_path(&base, target);
            let filled = PathPattern::parse(&target)
                .ok()
                .and_then(|p| p.fill(&params))
                .unwrap_or(target);
            // クエリとハッシュはリダイレクト先に引き継ぐ
            let suffix = &current[strip_query(&current).len()..];
            debug!("リダイレクト: {} -> {}{}", current, filled, suffix);
            current = format!("{filled}{suffix}");
        }
    }

    /// 子を親より先に、テーブル順で試す
    fn match_url(&self, url: &str) -> Option<(RouteNode<'_>, Params)> {
        let mut records = Vec::new();
        for entry in &self.entries {
            collect_records(entry, "/", &[], &mut records);
        }

        records.into_iter().find_map(|node| {
            match PathPattern::parse(&node.full_path) {
                Ok(pattern) => pattern.match_path(url).map(|params| (node, params)),
                Err(e) => {
                    warn!("パターンを無視します: {}", e);
                    None
                }
            }
        })
    }

    /// keep-alive でキャッシュしてよいページ名
    pub fn cacheable_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|n| n.entry.component.is_some() && !n.entry.meta.not_cache)
            .map(|n| n.entry.name.as_str())
            .collect()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON ドキュメント、または JS/TS のルート定義ファイルから読み込む
    pub fn load(path: &Path) -> Result<Self> {
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json {
            let src = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            Self::from_json(&src)
        } else {
            Ok(RouteTable::new(parse_routes_in_file(path)?))
        }
    }
}

/// 親の meta に子の meta を重ねる
pub(crate) fn inherit(parent: &RouteMeta, child: &RouteMeta) -> RouteMeta {
    let mut meta = child.clone();
    meta.auth = child.auth.or(parent.auth);
    meta.access = match (&parent.access, &child.access) {
        (None, access) => access.clone(),
        (Some(parent), None) => Some(parent.clone()),
        (Some(parent), Some(own)) => Some(
            own.iter()
                .filter(|role| parent.contains(role))
                .cloned()
                .collect(),
        ),
    };
    meta
}

fn collect_nodes<'a>(
    entry: &'a RouteEntry,
    parent_path: &str,
    ancestors: &[&'a RouteEntry],
    out: &mut Vec<RouteNode<'a>>,
) {
    let full_path = join_path(parent_path, &entry.path);
    out.push(RouteNode {
        entry,
        full_path: full_path.clone(),
        ancestors: ancestors.to_vec(),
    });

    let mut chain = ancestors.to_vec();
    chain.push(entry);
    for child in &entry.children {
        collect_nodes(child, &full_path, &chain, out);
    }
}

fn collect_records<'a>(
    entry: &'a RouteEntry,
    parent_path: &str,
    ancestors: &[&'a RouteEntry],
    out: &mut Vec<RouteNode<'a>>,
) {
    let full_path = join_path(parent_path, &entry.path);
    let mut chain = ancestors.to_vec();
    chain.push(entry);
    for child in &entry.children {
        collect_records(child, &full_path, &chain, out);
    }

    out.push(RouteNode {
        entry,
        full_path,
        ancestors: ancestors.to_vec(),
    });
}

fn build_admin() -> RouteTable {
    let page = |path: &str, name: &str, title: &str| {
        RouteEntry::new(path, name)
            .meta(RouteMeta {
                hide: true,
                ..RouteMeta::titled(title)
            })
            .lazy(format!("@/views/{name}.vue"))
    };

    RouteTable::new(vec![
        RouteEntry::new("/login", "login")
            .meta(RouteMeta {
                hide_in_menu: true,
                ..RouteMeta::titled("Login - 登录")
            })
            .lazy("@/views/login.vue"),
        RouteEntry::new("/", "_home")
            .redirect("/home")
            .eager("@/views/main")
            .meta(RouteMeta {
                hide_in_menu: true,
                hide: true,
                not_cache: true,
                auth: Some(true),
                ..RouteMeta::default()
            })
            .children(vec![
                page("/home", "home", "首页"),
                page("/creativity", "creativity", "创意"),
                page("/scripts", "scripts", "脚本管理"),
                page("/scripts/:id", "script-detail", "脚本详情"),
                page("/profile", "profile", "个人中心"),
                page("/research/chat", "research-chat", "脚本研究"),
                page("/research/list", "research-list", "研究记录"),
            ]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_scripts_by_name() {
        let scripts = RouteTable::admin().find_by_name("scripts").unwrap();
        assert_eq!(scripts.path, "/scripts");
        assert_eq!(scripts.meta.title.as_deref(), Some("脚本管理"));
    }

    #[test]
    fn resolve_binds_script_id() {
        let resolved = RouteTable::admin().resolve("/scripts/42").unwrap();
        assert_eq!(resolved.leaf().name, "script-detail");
        assert_eq!(resolved.params["id"], "42");
        let names: Vec<_> = resolved.matched.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["_home", "script-detail"]);
    }

    #[test]
    fn root_redirects_to_home() {
        let resolved = RouteTable::admin().resolve("/?from=login").unwrap();
        assert_eq!(resolved.leaf().name, "home");
        assert_eq!(resolved.path, "/home?from=login");
        assert_eq!(resolved.redirected_from, ["/?from=login"]);
    }

    #[test]
    fn unknown_url_is_no_match() {
        assert!(matches!(
            RouteTable::admin().resolve("/nowhere"),
            Err(Error::NoMatch(_))
        ));
    }

    #[test]
    fn redirect_cycle_is_detected() {
        let table = RouteTable::new(vec![
            RouteEntry::new("/a", "a").redirect("/b"),
            RouteEntry::new("/b", "b").redirect("/a"),
        ]);
        match table.resolve("/a") {
            Err(Error::RedirectLoop { chain, .. }) => assert_eq!(chain.len(), MAX_REDIRECTS + 1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn children_inherit_auth() {
        let table = RouteTable::admin();
        for node in table.iter().filter(|n| n.depth() > 0) {
            let meta = table.effective_meta(&node.entry.name).unwrap();
            assert_eq!(meta.auth, Some(true), "{}", node.entry.name);
        }
        assert_eq!(table.effective_meta("login").unwrap().auth, None);
    }

    #[test]
    fn access_narrows_along_the_chain() {
        let table = RouteTable::new(vec![
            RouteEntry::new("/admin", "admin")
                .meta(RouteMeta {
                    access: Some(vec!["admin".into(), "editor".into()]),
                    ..RouteMeta::default()
                })
                .children(vec![
                    RouteEntry::new("users", "users")
                        .meta(RouteMeta {
                            access: Some(vec!["admin".into(), "guest".into()]),
                            ..RouteMeta::default()
                        })
                        .lazy("@/views/users.vue"),
                    RouteEntry::new("logs", "logs").lazy("@/views/logs.vue"),
                ]),
        ]);

        assert_eq!(
            table.effective_meta("users").unwrap().access,
            Some(vec!["admin".to_string()])
        );
        assert_eq!(
            table.effective_meta("logs").unwrap().access,
            Some(vec!["admin".to_string(), "editor".to_string()])
        );
        assert_eq!(table.find_by_path("/admin/users").unwrap().name, "users");
    }

    #[test]
    fn url_for_fills_params() {
        let table = RouteTable::admin();
        let mut params = Params::new();
        params.insert("id".into(), "42".into());
        assert_eq!(table.url_for("script-detail", &params).unwrap(), "/scripts/42");
        assert!(matches!(
            table.url_for("missing", &params),
            Err(Error::UnknownRoute(_))
        ));
    }

    #[test]
    fn not_cache_layout_is_excluded_from_cache() {
        let names = RouteTable::admin().cacheable_names();
        assert!(!names.contains(&"_home"));
        assert!(names.contains(&"home"));
        assert!(names.contains(&"login"));
    }

    #[test]
    fn json_document_round_trips() {
        let table = RouteTable::admin();
        let json = table.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[1]["children"][0]["component"], "@/views/home.vue");
        assert_eq!(value[1]["meta"]["hideInMenu"], true);
        assert_eq!(&RouteTable::from_json(&json).unwrap(), table);
    }
}
