// src/navigation.rs
//
// ルートの meta からメニュー・パンくず・タブナビを組み立てる

use serde::Serialize;

use crate::matcher::Params;
use crate::model::{Icon, RouteEntry, RouteMeta};
use crate::table::{inherit, Resolved, RouteTable};

/// 左側メニューの 1 項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

/// パンくずの 1 要素
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

/// タブナビに並べるページ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub title: Option<String>,
    pub path: String,
    pub params: Params,
}

/// `roles` で見えるメニューツリーを作る
///
/// `hideInMenu` の項目はその子ごと表示しない。
pub fn menu(table: &RouteTable, roles: &[String]) -> Vec<MenuItem> {
    menu_items(table.entries(), &RouteMeta::default(), roles)
}

fn menu_items(entries: &[RouteEntry], parent: &RouteMeta, roles: &[String]) -> Vec<MenuItem> {
    let mut items = Vec::new();
    for entry in entries {
        if entry.meta.hide_in_menu {
            continue;
        }
        let meta = inherit(parent, &entry.meta);
        if !roles_admitted(meta.access.as_deref(), roles) {
            continue;
        }

        let children = if entry.is_layout() || entry.meta.show_always {
            menu_items(&entry.children, &meta, roles)
        } else {
            Vec::new()
        };

        items.push(MenuItem {
            name: entry.name.clone(),
            title: entry.meta.title.clone(),
            icon: entry.meta.icon.clone(),
            href: entry.meta.href.clone(),
            children,
        });
    }
    items
}

/// `access` が未設定なら誰でも、設定されていればいずれかのロールが一致すれば通す
pub fn roles_admitted(access: Option<&[String]>, roles: &[String]) -> bool {
    match access {
        None => true,
        Some(access) => roles.iter().any(|r| access.contains(r)),
    }
}

/// ホームを先頭に、`hide` でないマッチ済みエントリを並べる
pub fn breadcrumb(table: &RouteTable, resolved: &Resolved<'_>, home_name: &str) -> Vec<Crumb> {
    let mut crumbs = Vec::new();
    if let Some(home) = table.find_by_name(home_name) {
        crumbs.push(crumb(home));
        if resolved.leaf().name == home_name {
            return crumbs;
        }
    }

    crumbs.extend(
        resolved
            .matched
            .iter()
            .filter(|e| !e.meta.hide)
            .map(|e| crumb(e)),
    );
    crumbs
}

fn crumb(entry: &RouteEntry) -> Crumb {
    Crumb {
        name: entry.name.clone(),
        title: entry.meta.title.clone(),
        icon: entry.meta.icon.clone(),
    }
}

/// 開いたページをタブとして表示するなら Some
pub fn tag_nav(resolved: &Resolved<'_>) -> Option<Tag> {
    let leaf = resolved.leaf();
    if leaf.meta.hide {
        return None;
    }
    Some(Tag {
        name: leaf.name.clone(),
        title: leaf.meta.title.clone(),
        path: resolved.path.clone(),
        params: resolved.params.clone(),
    })
}

/// ブラウザタブのタイトル
pub fn document_title(title: Option<&str>, base: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => format!("{t} - {base}"),
        _ => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> RouteTable {
        RouteTable::new(vec![
            RouteEntry::new("/login", "login")
                .meta(RouteMeta {
                    hide_in_menu: true,
                    ..RouteMeta::titled("login")
                })
                .lazy("login"),
            RouteEntry::new("/home", "home")
                .meta(RouteMeta {
                    icon: Some(Icon::from("md-home".to_string())),
                    ..RouteMeta::titled("Home")
                })
                .lazy("home"),
            RouteEntry::new("/admin", "admin")
                .eager("Main")
                .meta(RouteMeta {
                    access: Some(roles(&["admin"])),
                    ..RouteMeta::titled("Admin")
                })
                .children(vec![
                    RouteEntry::new("users", "users")
                        .meta(RouteMeta::titled("Users"))
                        .lazy("users"),
                    RouteEntry::new("secret", "secret")
                        .meta(RouteMeta {
                            hide: true,
                            ..RouteMeta::titled("Secret")
                        })
                        .lazy("secret"),
                ]),
            RouteEntry::new("/docs", "docs")
                .meta(RouteMeta {
                    href: Some("https://example.com/docs".into()),
                    ..RouteMeta::titled("Docs")
                })
                .lazy("docs"),
        ])
    }

    #[test]
    fn shipped_table_has_no_menu_items() {
        assert!(menu(RouteTable::admin(), &roles(&["admin"])).is_empty());
    }

    #[test]
    fn menu_filters_hidden_and_forbidden_entries() {
        let table = sample();

        let guest = menu(&table, &roles(&["guest"]));
        let names: Vec<_> = guest.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["home", "docs"]);
        assert_eq!(guest[0].icon.as_ref().map(Icon::name), Some("md-home"));
        assert_eq!(guest[1].href.as_deref(), Some("https://example.com/docs"));

        let admin = menu(&table, &roles(&["admin"]));
        assert_eq!(admin[1].name, "admin");
        let children: Vec<_> = admin[1].children.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(children, ["users", "secret"]);
    }

    #[test]
    fn breadcrumb_skips_hidden_entries() {
        let table = sample();
        let resolved = table.resolve("/admin/users").unwrap();
        let names: Vec<_> = breadcrumb(&table, &resolved, "home")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["home", "admin", "users"]);

        let resolved = table.resolve("/admin/secret").unwrap();
        assert_eq!(breadcrumb(&table, &resolved, "home").len(), 2);

        let resolved = table.resolve("/home").unwrap();
        assert_eq!(breadcrumb(&table, &resolved, "home").len(), 1);
    }

    #[test]
    fn hidden_pages_are_not_tagged() {
        let table = RouteTable::admin();
        assert!(tag_nav(&table.resolve("/scripts/42").unwrap()).is_none());

        let table = sample();
        let tag = tag_nav(&table.resolve("/admin/users?tab=1").unwrap()).unwrap();
        assert_eq!(tag.name, "users");
        assert_eq!(tag.path, "/admin/users?tab=1");
    }

    #[test]
    fn title_falls_back_to_base() {
        assert_eq!(document_title(Some("首页"), "Creator"), "首页 - Creator");
        assert_eq!(document_title(None, "Creator"), "Creator");
        assert_eq!(document_title(Some(""), "Creator"), "Creator");
    }
}
