use swc_common::{sync::Lrc, FileName, SourceMap};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, Parser as SwcParser, StringInput, Syntax, TsConfig};
use swc_ecma_visit::{Visit, VisitWith};
use std::collections::HashMap;

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{ComponentRef, Icon, RouteEntry, RouteMeta};

/// AST をトラバースしてルート定義の配列を抽出するための Visitor
struct RouteVisitor {
    /// import 文で束縛された識別子 → モジュール指定子
    imports: HashMap<String, String>,
    /// 変数名とその配列リテラルのマッピング
    route_variables: HashMap<String, ArrayLit>,
    /// `export default` された式 (配列リテラルまたは変数参照)
    default_export: Option<Expr>,
    /// `export const routes = [...]` のように名前付きで export された配列
    named_exports: Vec<String>,
}

impl RouteVisitor {
    fn new() -> Self {
        RouteVisitor {
            imports: HashMap::new(),
            route_variables: HashMap::new(),
            default_export: None,
            named_exports: Vec::new(),
        }
    }

    /// 見つかった export からルート配列を決める。default export を優先する
    fn routes_array(&self) -> Option<&ArrayLit> {
        match self.default_export.as_ref().map(unwrap_parens) {
            Some(Expr::Array(arr)) => return Some(arr),
            Some(Expr::Ident(ident)) => {
                let name = ident.sym.to_string();
                match self.route_variables.get(&name) {
                    Some(arr) => return Some(arr),
                    None => warn!("default export '{}' の配列定義が見つかりません", name),
                }
            }
            Some(other) => warn!("default export が配列ではありません: {:?}", other),
            None => {}
        }

        self.named_exports
            .iter()
            .find_map(|name| self.route_variables.get(name))
    }

    fn extract_routes_from_array(&self, arr_lit: &ArrayLit) -> Vec<RouteEntry> {
        debug!("ルート配列: {} 要素", arr_lit.elems.len());
        arr_lit
            .elems
            .iter()
            .flatten()
            .filter_map(|elem| match unwrap_parens(&elem.expr) {
                Expr::Object(obj) => self.parse_route_object(obj),
                other => {
                    warn!("オブジェクト以外のルート要素を無視します: {:?}", other);
                    None
                }
            })
            .collect()
    }

    /// `{ path, name, meta, component, redirect, children }` から RouteEntry を作る
    fn parse_route_object(&self, obj_lit: &ObjectLit) -> Option<RouteEntry> {
        let mut path: Option<String> = None;
        let mut name: Option<String> = None;
        let mut entry = RouteEntry::new("", "");

        for (key, value) in key_values(obj_lit) {
            match key.as_str() {
                "path" => path = string_lit(value),
                "name" => name = string_lit(value),
                "redirect" => entry.redirect = string_lit(value),
                "component" => entry.component = self.parse_component(value),
                "meta" => {
                    if let Expr::Object(meta) = unwrap_parens(value) {
                        entry.meta = parse_meta(meta);
                    }
                }
                "children" => {
                    if let Expr::Array(arr) = unwrap_parens(value) {
                        entry.children = self.extract_routes_from_array(arr);
                    }
                }
                other => debug!("未対応のプロパティ: {}", other),
            }
        }

        let Some(path) = path else {
            warn!("path のないルート定義を無視します (name={:?})", name);
            return None;
        };
        entry.path = path;
        entry.name = name.unwrap_or_default();
        debug!("ルート生成: path={}, name={}", entry.path, entry.name);
        Some(entry)
    }

    /// `() => import('...')` は遅延ロード、import 済みの識別子は静的参照
    fn parse_component(&self, value: &Expr) -> Option<ComponentRef> {
        match unwrap_parens(value) {
            Expr::Arrow(ArrowExpr { body, .. }) => match &**body {
                BlockStmtOrExpr::Expr(expr) => dynamic_import(expr).map(ComponentRef::Lazy),
                BlockStmtOrExpr::BlockStmt(block) => block.stmts.iter().find_map(|stmt| {
                    match stmt {
                        Stmt::Return(ReturnStmt { arg: Some(arg), .. }) => {
                            dynamic_import(arg).map(ComponentRef::Lazy)
                        }
                        _ => None,
                    }
                }),
            },
            Expr::Ident(ident) => {
                let local = ident.sym.to_string();
                let module = self.imports.get(&local).cloned().unwrap_or_else(|| {
                    warn!("import されていないコンポーネント識別子: {}", local);
                    local
                });
                Some(ComponentRef::Eager { eager: module })
            }
            other => {
                warn!("未対応の component 式: {:?}", other);
                None
            }
        }
    }
}

impl Visit for RouteVisitor {
    /// `import Main from '@/views/main'` を記録する
    fn visit_import_decl(&mut self, import: &ImportDecl) {
        let src = import.src.value.to_string();
        for specifier in &import.specifiers {
            let local = match specifier {
                ImportSpecifier::Default(ImportDefaultSpecifier { local, .. }) => local,
                ImportSpecifier::Named(ImportNamedSpecifier { local, .. }) => local,
                ImportSpecifier::Namespace(ImportStarAsSpecifier { local, .. }) => local,
            };
            self.imports.insert(local.sym.to_string(), src.clone());
        }
    }

    /// 配列で初期化される変数をすべて記録する
    fn visit_var_decl(&mut self, var_decl: &VarDecl) {
        for declarator in &var_decl.decls {
            if let Pat::Ident(BindingIdent { id, .. }) = &declarator.name {
                if let Some(init) = &declarator.init {
                    if let Expr::Array(arr_lit) = unwrap_parens(init) {
                        debug!("配列変数: {} ({} 要素)", id.sym, arr_lit.elems.len());
                        self.route_variables
                            .insert(id.sym.to_string(), arr_lit.clone());
                    }
                }
            }
        }
        var_decl.visit_children_with(self);
    }

    fn visit_export_decl(&mut self, export: &ExportDecl) {
        if let Decl::Var(var_decl) = &export.decl {
            for declarator in &var_decl.decls {
                if let Pat::Ident(BindingIdent { id, .. }) = &declarator.name {
                    self.named_exports.push(id.sym.to_string());
                }
            }
        }
        export.visit_children_with(self);
    }

    fn visit_export_default_expr(&mut self, export: &ExportDefaultExpr) {
        self.default_export = Some((*export.expr).clone());
        export.visit_children_with(self);
    }
}

fn parse_meta(obj_lit: &ObjectLit) -> RouteMeta {
    let mut meta = RouteMeta::default();
    for (key, value) in key_values(obj_lit) {
        match key.as_str() {
            "title" => meta.title = string_lit(value),
            "hideInMenu" => meta.hide_in_menu = bool_lit(value).unwrap_or(false),
            "hide" => meta.hide = bool_lit(value).unwrap_or(false),
            "notCache" => meta.not_cache = bool_lit(value).unwrap_or(false),
            "showAlways" => meta.show_always = bool_lit(value).unwrap_or(false),
            "auth" => meta.auth = bool_lit(value),
            "href" => meta.href = string_lit(value),
            "icon" => meta.icon = string_lit(value).map(Icon::from),
            "access" => {
                if let Expr::Array(arr) = unwrap_parens(value) {
                    let roles = arr
                        .elems
                        .iter()
                        .flatten()
                        .filter_map(|e| string_lit(&e.expr))
                        .collect();
                    meta.access = Some(roles);
                }
            }
            other => debug!("未対応の meta キー: {}", other),
        }
    }
    meta
}

/// オブジェクトリテラルの `key: value` を順に取り出す (スプレッドや計算キーは除外)
fn key_values(obj_lit: &ObjectLit) -> Vec<(String, &Expr)> {
    obj_lit
        .props
        .iter()
        .filter_map(|prop| match prop {
            PropOrSpread::Prop(boxed) => match &**boxed {
                Prop::KeyValue(KeyValueProp { key, value }) => {
                    let key = match key {
                        PropName::Ident(ident) => ident.sym.to_string(),
                        PropName::Str(s) => s.value.to_string(),
                        other => {
                            warn!("未対応のキーを無視します: {:?}", other);
                            return None;
                        }
                    };
                    Some((key, &**value))
                }
                Prop::Shorthand(ident) => {
                    warn!("省略記法のプロパティを無視します: {}", ident.sym);
                    None
                }
                other => {
                    warn!("未対応のプロパティを無視します: {:?}", other);
                    None
                }
            },
            PropOrSpread::Spread(spread) => {
                warn!("スプレッド構文を無視します: {:?}", spread.expr);
                None
            }
        })
        .collect()
}

/// `import('...')` 呼び出しならモジュール指定子を返す
fn dynamic_import(expr: &Expr) -> Option<String> {
    match unwrap_parens(expr) {
        Expr::Call(CallExpr {
            callee: Callee::Import(_),
            args,
            ..
        }) => args.first().and_then(|arg| string_lit(&arg.expr)),
        _ => None,
    }
}

fn string_lit(expr: &Expr) -> Option<String> {
    match unwrap_parens(expr) {
        Expr::Lit(Lit::Str(Str { value, .. })) => Some(value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
            tpl.quasis.first().map(|q| q.raw.to_string())
        }
        _ => None,
    }
}

fn bool_lit(expr: &Expr) -> Option<bool> {
    match unwrap_parens(expr) {
        Expr::Lit(Lit::Bool(Bool { value, .. })) => Some(*value),
        _ => None,
    }
}

fn unwrap_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(ParenExpr { expr, .. }) => unwrap_parens(expr),
        other => other,
    }
}

pub fn parse_routes_in_file(file_path: &Path) -> Result<Vec<RouteEntry>> {
    info!("ファイル解析開始: {:?}", file_path);
    let src = fs::read_to_string(file_path).map_err(|e| Error::io(file_path, e))?;
    parse_routes_in_source(file_path, src)
}

/// ソース文字列からルート定義を抽出する。JS も TypeScript 構文として読める
pub fn parse_routes_in_source(file_path: &Path, src: String) -> Result<Vec<RouteEntry>> {
    debug!("ファイルサイズ: {} bytes", src.len());

    let cm: Lrc<SourceMap> = Default::default();

    let fm = cm.new_source_file(FileName::Real(file_path.to_path_buf()), src);

    let syntax = Syntax::Typescript(TsConfig {
        tsx: false,
        decorators: true,
        dts: false,
        no_early_errors: true,
        disallow_ambiguous_jsx_like: true,
    });

    let lexer = Lexer::new(
        syntax,
        Default::default(), // es version
        StringInput::from(&*fm),
        None,
    );

    let mut parser = SwcParser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| Error::Parse {
        file: file_path.display().to_string(),
        message: format!("{:?}", e.kind()),
    })?;

    let mut visitor = RouteVisitor::new();
    visitor.visit_module(&module);

    let routes = match visitor.routes_array() {
        Some(arr) => visitor.extract_routes_from_array(arr),
        None => {
            warn!("{:?} に export されたルート配列がありません", file_path);
            Vec::new()
        }
    };

    info!(
        "解析完了: import {} 件, 配列変数 {} 件, トップレベルのルート {} 件",
        visitor.imports.len(),
        visitor.route_variables.len(),
        routes.len()
    );

    Ok(routes)
}
