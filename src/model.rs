// src/model.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// ルートテーブルの 1 エントリ
///
/// `children` を持つエントリはレイアウトルートで、子ルートは
/// 親コンポーネントのスロット内に描画される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// URL パスパターン (例: "/scripts/:id")。兄弟間で一意
    pub path: String,

    /// プログラム的な遷移に使う名前。テーブル全体で一意
    pub name: String,

    /// 自身を描画せずに転送する先のパス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,

    /// 描画するビューへの参照
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentRef>,

    #[serde(default)]
    pub meta: RouteMeta,

    /// 子ルート (親のレイアウトスロット内に描画される)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteEntry>,
}

impl RouteEntry {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        RouteEntry {
            path: path.into(),
            name: name.into(),
            redirect: None,
            component: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    /// `() => import('...')` 相当の遅延ロードコンポーネントを設定する
    pub fn lazy(mut self, module: impl Into<String>) -> Self {
        self.component = Some(ComponentRef::Lazy(module.into()));
        self
    }

    /// 静的 import されたコンポーネント (レイアウトなど) を設定する
    pub fn eager(mut self, module: impl Into<String>) -> Self {
        self.component = Some(ComponentRef::Eager {
            eager: module.into(),
        });
        self
    }

    pub fn redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn children(mut self, children: Vec<RouteEntry>) -> Self {
        self.children = children;
        self
    }

    pub fn is_layout(&self) -> bool {
        !self.children.is_empty()
    }
}

/// ビューコンポーネントへの参照。解決はモジュールローダー側の責務
///
/// JSON では遅延ロードは文字列そのまま、静的 import は `{"eager": "..."}` になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentRef {
    Lazy(String),
    Eager { eager: String },
}

impl ComponentRef {
    /// import 元のモジュール指定子 (例: "@/views/login.vue")
    pub fn module(&self) -> &str {
        match self {
            ComponentRef::Lazy(m) => m,
            ComponentRef::Eager { eager } => eager,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, ComponentRef::Lazy(_))
    }
}

/// メニュー・パンくず・タブ・キャッシュ・権限に関するルートごとの設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    /// ブラウザタブやパンくずに表示するタイトル
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// true なら左側メニューに表示しない
    #[serde(default, skip_serializing_if = "is_false")]
    pub hide_in_menu: bool,

    /// true ならパンくず・タブナビに表示しない
    #[serde(default, skip_serializing_if = "is_false")]
    pub hide: bool,

    /// true ならページをキャッシュしない (keep-alive 対象外)
    #[serde(default, skip_serializing_if = "is_false")]
    pub not_cache: bool,

    /// アクセス可能なロールの集合。親の設定が子ルートにも効く
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,

    /// 配下のサブツリーがログイン必須かどうか。None は親から継承
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<bool>,

    /// 外部リンク。メニューは遷移せずこの URL を開く
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    /// 子が 1 つでも親メニュー項目を常に表示する
    #[serde(default, skip_serializing_if = "is_false")]
    pub show_always: bool,
}

impl RouteMeta {
    pub fn titled(title: impl Into<String>) -> Self {
        RouteMeta {
            title: Some(title.into()),
            ..RouteMeta::default()
        }
    }
}

impl RouteMeta {
    /// `auth` が未指定なら false として扱う
    pub fn requires_auth(&self) -> bool {
        self.auth.unwrap_or(false)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// メニューなどに表示するアイコン。先頭の '_' はカスタムアイコンの印
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Icon {
    BuiltIn(String),
    Custom(String),
}

impl Icon {
    /// 印を除いたアイコン名
    pub fn name(&self) -> &str {
        match self {
            Icon::BuiltIn(n) | Icon::Custom(n) => n,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Icon::Custom(_))
    }
}

impl From<String> for Icon {
    fn from(raw: String) -> Self {
        match raw.strip_prefix('_') {
            Some(name) => Icon::Custom(name.to_string()),
            None => Icon::BuiltIn(raw),
        }
    }
}

impl From<Icon> for String {
    fn from(icon: Icon) -> Self {
        icon.to_string()
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Icon::BuiltIn(n) => f.write_str(n),
            Icon::Custom(n) => write!(f, "_{n}"),
        }
    }
}
