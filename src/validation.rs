// src/validation.rs
//
// ルートテーブルの不変条件チェック

use std::collections::HashMap;

use thiserror::Error;

use crate::matcher::{join_path, PathPattern, PatternError};
use crate::model::RouteEntry;
use crate::table::RouteTable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route name {name:?} is used {count} times")]
    DuplicateName { name: String, count: usize },

    #[error("path {path:?} appears twice under {parent:?}")]
    DuplicateSiblingPath { parent: String, path: String },

    #[error("route {name:?} has both a redirect and a component")]
    RedirectWithComponent { name: String },

    #[error("route {name:?} has neither a redirect nor a component")]
    NothingToRender { name: String },

    #[error("route {name:?} redirects to {target:?}, which matches no route")]
    DanglingRedirect { name: String, target: String },

    #[error("more than one landing redirect on '/': {}", .names.join(", "))]
    MultipleLanding { names: Vec<String> },

    #[error("route at {path:?} has an empty name")]
    EmptyName { path: String },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// テーブル全体を検査し、見つかった違反をすべて返す
pub fn validate(table: &RouteTable) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_names(table, &mut errors);
    check_siblings("/", table.entries(), &mut errors);

    let mut landing = Vec::new();
    for node in table.iter() {
        let entry = node.entry;

        if let Err(e) = PathPattern::parse(&node.full_path) {
            errors.push(e.into());
        }

        // children を持つレイアウトは、redirect でスロットに描画する子を選べる
        match (&entry.redirect, &entry.component) {
            (Some(_), Some(_)) if !entry.is_layout() => {
                errors.push(ValidationError::RedirectWithComponent {
                    name: entry.name.clone(),
                });
            }
            (None, None) if !entry.is_layout() => {
                errors.push(ValidationError::NothingToRender {
                    name: entry.name.clone(),
                });
            }
            _ => {}
        }

        if let Some(target) = &entry.redirect {
            let base = node
                .ancestors
                .iter()
                .fold("/".to_string(), |acc, a| join_path(&acc, &a.path));
            let target = join_path(&base, target);
            // 転送先は最終的にコンポーネントを持つエントリに行き着く必要がある
            let renders = match table.resolve(&target) {
                Ok(resolved) => resolved.leaf().component.is_some(),
                Err(_) => table
                    .find_by_path(&target)
                    .is_some_and(|e| e.component.is_some()),
            };
            if !renders {
                errors.push(ValidationError::DanglingRedirect {
                    name: entry.name.clone(),
                    target,
                });
            }
            if node.full_path == "/" {
                landing.push(entry.name.clone());
            }
        }
    }

    if landing.len() > 1 {
        errors.push(ValidationError::MultipleLanding { names: landing });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_names(table: &RouteTable, errors: &mut Vec<ValidationError>) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for node in table.iter() {
        let name = node.entry.name.as_str();
        if name.is_empty() {
            errors.push(ValidationError::EmptyName {
                path: node.full_path.clone(),
            });
            continue;
        }
        let count = counts.entry(name).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }

    for name in order {
        let count = counts[name];
        if count > 1 {
            errors.push(ValidationError::DuplicateName {
                name: name.to_string(),
                count,
            });
        }
    }
}

fn check_siblings(parent: &str, siblings: &[RouteEntry], errors: &mut Vec<ValidationError>) {
    // "home" と "/home" はどちらも同じ完全パスになるので、結合後の形で比べる
    let mut seen: Vec<String> = Vec::new();
    for entry in siblings {
        let full_path = join_path(parent, &entry.path);
        let key = full_path.trim_end_matches('/').to_string();
        if seen.contains(&key) {
            errors.push(ValidationError::DuplicateSiblingPath {
                parent: parent.to_string(),
                path: entry.path.clone(),
            });
        } else {
            seen.push(key);
        }
        check_siblings(&full_path, &entry.children, errors);
    }
}
