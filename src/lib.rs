//! 管理画面 SPA のルートテーブル
//!
//! URL パスと遅延ロードされるビュー、表示用の meta (タイトル・アイコン・
//! メニュー表示・キャッシュ・権限) の対応表を型付きで持ち、
//! 検証・URL 解決・メニュー生成・遷移ガードを提供する。

pub mod access;
pub mod config;
pub mod error;
pub mod matcher;
pub mod model;
pub mod navigation;
pub mod parser;
pub mod resolver;
pub mod table;
pub mod validation;

pub use error::{Error, Result};
pub use model::{ComponentRef, Icon, RouteEntry, RouteMeta};
pub use table::{Resolved, RouteTable};
