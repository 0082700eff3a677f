// src/access.rs
//
// meta.auth / meta.access に基づく遷移ガード

use tracing::debug;

use crate::error::Result;
use crate::navigation::roles_admitted;
use crate::table::{Resolved, RouteTable};

/// 認証状態を提供する側 (ログインセッションなど) のインターフェース
pub trait AuthProvider {
    fn is_authenticated(&self) -> bool;

    /// 現在のユーザーが `roles` のいずれかを持っているか
    fn has_access(&self, roles: &[String]) -> bool;
}

/// ロール一覧を固定で持つだけの実装
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    pub authenticated: bool,
    pub roles: Vec<String>,
}

impl StaticAuth {
    pub fn anonymous() -> Self {
        StaticAuth::default()
    }

    pub fn signed_in<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StaticAuth {
            authenticated: true,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl AuthProvider for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn has_access(&self, roles: &[String]) -> bool {
        roles_admitted(Some(roles), &self.roles)
    }
}

/// ガードの判定結果
#[derive(Debug, Clone)]
pub enum Decision<'a> {
    Allow(Resolved<'a>),
    /// 未ログインでログイン必須のページに来た
    RedirectToLogin,
    /// ログイン済みでログインページに来た。`name` はホーム画面のルート名
    RedirectToHome { name: String },
    /// ログイン済みだが access のロールを持っていない
    Forbidden { name: String },
}

/// ログイン画面・ホーム画面のルート名
#[derive(Debug, Clone, Copy)]
pub struct Landing<'n> {
    pub login: &'n str,
    pub home: &'n str,
}

/// `url` への遷移を許可するか判定する
pub fn guard<'a>(
    table: &'a RouteTable,
    auth: &dyn AuthProvider,
    url: &str,
    landing: Landing<'_>,
) -> Result<Decision<'a>> {
    let resolved = table.resolve(url)?;
    let leaf = resolved.leaf();

    let meta = table.effective_meta(&leaf.name).unwrap_or_default();

    if !auth.is_authenticated() {
        if meta.requires_auth() && leaf.name != landing.login {
            debug!("未ログインのためログイン画面へ: {}", url);
            return Ok(Decision::RedirectToLogin);
        }
        return Ok(Decision::Allow(resolved));
    }

    if leaf.name == landing.login {
        return Ok(Decision::RedirectToHome {
            name: landing.home.to_string(),
        });
    }

    if let Some(access) = &meta.access {
        if !auth.has_access(access) {
            debug!("ロール不足: {} ({:?})", leaf.name, access);
            return Ok(Decision::Forbidden {
                name: leaf.name.clone(),
            });
        }
    }

    Ok(Decision::Allow(resolved))
}
