// src/main.rs

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use route_table::access::{guard, Decision, Landing, StaticAuth};
use route_table::config::Config;
use route_table::navigation::{breadcrumb, document_title, menu, tag_nav};
use route_table::resolver::{resolve_component, scan_project};
use route_table::validation::validate;
use route_table::{RouteEntry, RouteTable};

/// CLI 引数定義
#[derive(Parser, Debug)]
#[command(
    name = "route-table",
    version = "0.1.0",
    about = "管理画面 SPA のルートテーブルを検証・解決・JSON 出力する CLI ツール"
)]
struct Cli {
    /// 設定ファイル (TOML)。省略時は既定値
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 組み込みのルートテーブルを JSON で出力する
    Dump,

    /// JS/TS のルート定義ファイルを解析して JSON で出力する
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// テーブルの不変条件を検査する。違反があれば終了コード 1
    Check {
        /// 検査対象 (.json / .js / .ts)。省略時は組み込みテーブル
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// URL をルートに解決し、パラメータやパンくずを出力する
    Resolve {
        #[arg(value_name = "URL")]
        url: String,

        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// ログイン状態とロールを指定して遷移ガードの判定を出力する
    Guard {
        #[arg(value_name = "URL")]
        url: String,

        /// ログイン済みとして判定する
        #[arg(long = "signed-in")]
        signed_in: bool,

        /// 付与するロール (複数指定可)
        #[arg(short = 'r', long = "role", value_name = "ROLE")]
        roles: Vec<String>,

        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// 指定ロールで見えるメニューツリーを出力する
    Menu {
        #[arg(short = 'r', long = "role", value_name = "ROLE")]
        roles: Vec<String>,

        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// プロジェクトからルート定義ファイルを探し、検証とコンポーネント解決を行う
    Scan {
        /// 例: `--project-root C:/path/to/creator-web`
        #[arg(short = 'r', long = "project-root", value_name = "DIR")]
        project_root: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログは標準エラーへ。標準出力は JSON 専用
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "route_table=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Dump => {
            println!("{}", RouteTable::admin().to_json_pretty()?);
        }
        Command::Parse { file } => {
            let table = RouteTable::load(&file)?;
            println!("{}", table.to_json_pretty()?);
        }
        Command::Check { file } => {
            let table = load_table(file.as_deref())?;
            if let Err(errors) = validate(&table) {
                for error in &errors {
                    eprintln!("error: {}", error);
                }
                std::process::exit(1);
            }
            info!("問題は見つかりませんでした");
        }
        Command::Resolve { url, file } => {
            let table = load_table(file.as_deref())?;
            let resolved = table.resolve(&url)?;
            let leaf = resolved.leaf();
            let out = json!({
                "name": leaf.name,
                "path": resolved.path,
                "params": resolved.params,
                "matched": resolved.matched.iter().map(|e| &e.name).collect::<Vec<_>>(),
                "redirectedFrom": resolved.redirected_from,
                "title": document_title(leaf.meta.title.as_deref(), &config.base_title),
                "breadcrumb": breadcrumb(&table, &resolved, &config.home_name),
                "tag": tag_nav(&resolved),
                "meta": table.effective_meta(&leaf.name),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Guard {
            url,
            signed_in,
            roles,
            file,
        } => {
            let table = load_table(file.as_deref())?;
            let auth = if signed_in {
                StaticAuth::signed_in(roles)
            } else {
                StaticAuth::anonymous()
            };
            let landing = Landing {
                login: &config.login_name,
                home: &config.home_name,
            };
            let out = match guard(&table, &auth, &url, landing)? {
                Decision::Allow(resolved) => json!({ "allow": resolved.leaf().name }),
                Decision::RedirectToLogin => json!({ "redirect": config.login_name }),
                Decision::RedirectToHome { name } => json!({ "redirect": name }),
                Decision::Forbidden { name } => json!({ "forbidden": name }),
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Menu { roles, file } => {
            let table = load_table(file.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&menu(&table, &roles))?);
        }
        Command::Scan { project_root } => {
            let project_dir = project_root.canonicalize()?; // 絶対化
            let ok = scan(&project_dir, &config)?;
            if !ok {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// ファイル指定があればそれを、なければ組み込みテーブルを使う
fn load_table(file: Option<&Path>) -> route_table::Result<RouteTable> {
    match file {
        Some(path) => RouteTable::load(path),
        None => Ok(RouteTable::admin().clone()),
    }
}

/// 見つけたルート定義ファイルを順に検証し、結果を JSON で出力する
fn scan(project_dir: &Path, config: &Config) -> Result<bool, Box<dyn std::error::Error>> {
    // 1) router ディレクトリのルート定義ファイルを集める
    let route_files = scan_project(project_dir)?;
    if route_files.is_empty() {
        eprintln!("Error: ルート定義ファイルが見つかりませんでした。");
        return Ok(false);
    }

    // 2) 各ファイルを解析し、不変条件とコンポーネントの実在を確認する
    let mut ok = true;
    let mut reports = Vec::new();
    for route_file in route_files {
        let table = RouteTable::load(&route_file)?;

        let errors: Vec<String> = match validate(&table) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        };

        let mut unresolved = Vec::new();
        for node in table.iter() {
            if let Some(component) = &node.entry.component {
                let module = component.module();
                if resolve_component(module, &route_file, project_dir, config)?.is_none() {
                    warn!("コンポーネントが見つかりません: {} ({})", module, node.entry.name);
                    unresolved.push(json!({ "name": node.entry.name, "component": module }));
                }
            }
        }

        ok &= errors.is_empty() && unresolved.is_empty();
        reports.push(json!({
            "file": route_file,
            "routes": count_routes(table.entries()),
            "errors": errors,
            "unresolved": unresolved,
        }));
    }

    // 3) 結果を JSON 化して標準出力
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(ok)
}

fn count_routes(entries: &[RouteEntry]) -> usize {
    entries
        .iter()
        .map(|e| 1 + count_routes(&e.children))
        .sum()
}
