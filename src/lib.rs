pub mod analysis;
pub mod dom_renderer;
pub mod engine;
pub mod reveal;
pub mod site;
pub mod ui;

#[cfg(feature = "native")]
pub mod hotreload;

#[cfg(target_arch = "wasm32")]
pub mod wasm_entry;

use engine::runtime::{DEFAULT_SCROLL_STEP, SnapshotOptions};
use log::{error, info, warn};
use site::SiteConfig;
use ui::viewport::Viewport;

pub use engine::runtime::SiteRuntime;
pub use reveal::{IntersectionWatcher, RevealController};

#[cfg(feature = "native")]
use colored::*;

pub const DEFAULT_OUT_PATH: &str = "luna_site_snapshot.html";

// ========================================
// コマンドライン引数構造体
// ========================================

/// コマンドライン引数の設定
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// サイト記述JSON（Noneなら埋め込み）
    pub config_path: Option<String>,
    pub out_path: String,
    pub scroll: f32,
    pub step: f32,
    /// 最後のスクロールからの経過時間（Noneならトランジションを出力）
    pub at_ms: Option<f64>,
    pub viewport: Viewport,
    pub enable_lint: bool,
    pub watch: bool,
    pub open: bool,
    pub quiet: bool,  // panic以外のログを抑制
    pub log_level: LogLevel,
    /// --help が指定された（呼び出し側でヘルプを表示して終了する）
    pub help: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogLevel {
    Off,      // ログを一切表示しない（panicは除く）
    Error,    // エラーレベルのみ
    Warn,     // 警告レベル以上
    Info,     // 情報レベル以上
    Debug,    // デバッグレベル以上
    Trace,    // 全てのログ
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            config_path: None,
            out_path: DEFAULT_OUT_PATH.to_string(),
            scroll: 0.0,
            step: DEFAULT_SCROLL_STEP,
            at_ms: None,
            viewport: Viewport::default(),
            enable_lint: true,
            watch: false,
            open: false,
            quiet: false,
            log_level: LogLevel::Info,
            help: false,
        }
    }
}

impl CliArgs {
    pub fn snapshot_options(&self) -> SnapshotOptions {
        SnapshotOptions {
            viewport: self.viewport,
            scroll: self.scroll,
            step: self.step,
            at_ms: self.at_ms,
        }
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid value for {}: '{}'", flag, value))
}

/// 引数列をパースする（先頭のプログラム名は含めない）
pub fn parse_args_from<I>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut cli_args = CliArgs::default();

    for arg in args {
        let (flag, value) = match arg.split_once('=') {
            Some((flag, value)) => (flag, Some(value)),
            None => (arg.as_str(), None),
        };
        match (flag, value) {
            ("--no-lint", None) => cli_args.enable_lint = false,
            ("--lint", None) => cli_args.enable_lint = true,
            ("--watch", None) => cli_args.watch = true,
            ("--open", None) => cli_args.open = true,
            ("--quiet" | "-q", None) => {
                cli_args.quiet = true;
                cli_args.log_level = LogLevel::Off;
            }
            ("--config", Some(path)) => cli_args.config_path = Some(path.to_string()),
            ("--out", Some(path)) => cli_args.out_path = path.to_string(),
            ("--scroll", Some(v)) => cli_args.scroll = parse_number(flag, v)?,
            ("--step", Some(v)) => cli_args.step = parse_number(flag, v)?,
            ("--at", Some(v)) => {
                let ms: f64 = parse_number(flag, v)?;
                cli_args.at_ms = if ms > 0.0 { Some(ms) } else { None };
            }
            ("--viewport", Some(v)) => cli_args.viewport = Viewport::parse_size(v)?,
            ("--log-level", Some(level)) => {
                cli_args.log_level = match level {
                    "off" => LogLevel::Off,
                    "error" => LogLevel::Error,
                    "warn" => LogLevel::Warn,
                    "info" => LogLevel::Info,
                    "debug" => LogLevel::Debug,
                    "trace" => LogLevel::Trace,
                    other => return Err(format!("unknown log level '{}'", other)),
                }
            }
            ("--help" | "-h", None) => {
                cli_args.help = true;
                return Ok(cli_args);
            }
            _ => warn!("ignored unknown argument '{}'", arg),
        }
    }

    if cli_args.step <= 0.0 {
        return Err(format!("--step must be positive, got {}", cli_args.step));
    }
    Ok(cli_args)
}

#[cfg(feature = "native")]
pub fn parse_args() -> CliArgs {
    match parse_args_from(std::env::args().skip(1)) {
        Ok(cli_args) if cli_args.help => {
            show_help();
            std::process::exit(0);
        }
        Ok(cli_args) => cli_args,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            eprintln!("Use --help to see the available options.");
            std::process::exit(2);
        }
    }
}

pub fn show_help() {
    println!("Luna Site snapshot runner

USAGE:
    luna_site [OPTIONS]

OPTIONS:
    --config=PATH            Site description JSON (default: embedded)
    --out=PATH               Snapshot HTML output (default: {})
    --scroll=PX              Final scroll offset to simulate (default: 0)
    --step=PX                Scroll step used to reach it (default: {})
    --at=MS                  Sample transitions MS after the last scroll step (default: emit CSS transitions)
    --viewport=WxH           Viewport size (default: 1280x800)
    --lint/--no-lint         Enable/disable lint checks (default: enabled)
    --watch                  Re-render when the config file changes
    --open                   Open the snapshot in the default browser
    --quiet, -q              Suppress all logs except panics
    --log-level=LEVEL        Set log level (off/error/warn/info/debug/trace)
    --help, -h               Show this help", DEFAULT_OUT_PATH, DEFAULT_SCROLL_STEP);
}

/// ログレベルを初期化する関数
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logger(log_level: &LogLevel) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::sync::Once;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = match log_level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        };

        let mut builder = Builder::from_default_env();

        if matches!(log_level, LogLevel::Off) {
            // quietモードの場合、何も出力しない（panicは別途処理される）
            builder
                .filter_level(LevelFilter::Off)
                .format(|_, _| Ok(()))
                .try_init()
                .ok();
        } else {
            builder
                .filter_level(level)
                .filter_module("notify", LevelFilter::Warn)
                .format_timestamp_secs()
                .try_init()
                .ok();
        }
    });
}

/// サイト記述を読み込み、必要ならlintを表示する
#[cfg(feature = "native")]
pub fn load_site(path: Option<&str>, enable_lint: bool, quiet: bool) -> Result<SiteConfig, String> {
    let config = match path {
        Some(path) => SiteConfig::load(path)?,
        None => SiteConfig::embedded()?,
    };

    if enable_lint && !quiet {
        let analysis_result = analysis::analyze_site(&config);
        for diag in &analysis_result.diagnostics {
            let loc = diag.location.as_deref().unwrap_or("");
            let msg = match diag.level {
                analysis::error::DiagnosticLevel::Error => format!("{} {}", loc, diag.message).red().bold(),
                analysis::error::DiagnosticLevel::Warning => format!("{} {}", loc, diag.message).yellow().bold(),
                analysis::error::DiagnosticLevel::Info => format!("{} {}", loc, diag.message).blue(),
            };
            match diag.level {
                analysis::error::DiagnosticLevel::Info => info!("[{:?}] {}", diag.level, msg),
                _ => warn!("[{:?}] {}", diag.level, msg),
            }
        }

        if analysis_result.has_errors() {
            error!("Lint errors found. Use --no-lint to skip lint checks.");
        }
    }

    Ok(config)
}

/// スナップショットを1回書き出す
#[cfg(feature = "native")]
pub fn render_snapshot(cli_args: &CliArgs) -> Result<(), String> {
    let config = load_site(cli_args.config_path.as_deref(), cli_args.enable_lint, cli_args.quiet)?;
    let report = engine::runtime::run_snapshot(&config, &cli_args.snapshot_options(), &cli_args.out_path)?;
    info!(
        "{} {}/{} blocks revealed at scroll {}px ({} registrations left) -> {}",
        "✔".green(),
        report.revealed,
        report.units,
        cli_args.scroll,
        report.active_registrations,
        cli_args.out_path
    );
    Ok(())
}

#[cfg(feature = "native")]
pub fn run(cli_args: &CliArgs) -> Result<(), String> {
    init_logger(&cli_args.log_level);

    render_snapshot(cli_args)?;

    if cli_args.open {
        if let Err(e) = open::that(&cli_args.out_path) {
            warn!("Failed to open {}: {}", cli_args.out_path, e);
        }
    }

    if cli_args.watch {
        run_with_watch(cli_args)?;
    }
    Ok(())
}

/// サイト記述の変更を監視してスナップショットを書き直し続ける
#[cfg(feature = "native")]
pub fn run_with_watch(cli_args: &CliArgs) -> Result<(), String> {
    use hotreload::HotReloader;

    let Some(path) = cli_args.config_path.clone() else {
        warn!("--watch needs --config=PATH; the embedded site cannot change");
        return Ok(());
    };

    let hotreloader = HotReloader::new(&path).map_err(|e| format!("Failed to setup hot reloader: {}", e))?;

    let args = cli_args.clone();
    hotreloader.set_reload_callback(move || {
        if let Err(e) = render_snapshot(&args) {
            error!("{}", e);
        }
    });

    info!("Watching {} (Ctrl+C to stop)", path);
    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<CliArgs, String> {
        parse_args_from(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let cli = args(&[]).unwrap();
        assert_eq!(cli.out_path, DEFAULT_OUT_PATH);
        assert_eq!(cli.viewport, Viewport::new(1280.0, 800.0));
        assert_eq!(cli.step, 100.0);
        assert!(cli.enable_lint);
        assert_eq!(cli.at_ms, None);
    }

    #[test]
    fn test_value_flags() {
        let cli = args(&[
            "--config=site.json",
            "--out=out.html",
            "--scroll=1200",
            "--step=50",
            "--at=300",
            "--viewport=390x844",
            "--no-lint",
            "--log-level=debug",
        ])
        .unwrap();
        assert_eq!(cli.config_path.as_deref(), Some("site.json"));
        assert_eq!(cli.out_path, "out.html");
        assert_eq!(cli.scroll, 1200.0);
        assert_eq!(cli.step, 50.0);
        assert_eq!(cli.at_ms, Some(300.0));
        assert!(!cli.viewport.is_wide());
        assert!(!cli.enable_lint);
        assert_eq!(cli.log_level, LogLevel::Debug);

        let options = cli.snapshot_options();
        assert_eq!(options.scroll, 1200.0);
        assert_eq!(options.at_ms, Some(300.0));
    }

    #[test]
    fn test_quiet_and_zero_at() {
        let cli = args(&["-q", "--at=0"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.log_level, LogLevel::Off);
        assert_eq!(cli.at_ms, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(args(&["--scroll=far"]).is_err());
        assert!(args(&["--viewport=wide"]).is_err());
        assert!(args(&["--log-level=loud"]).is_err());
        assert!(args(&["--step=0"]).is_err());
    }

    #[test]
    fn test_help_stops_parsing() {
        let cli = args(&["--scroll=10", "-h", "--scroll=far"]).unwrap();
        assert!(cli.help);
        assert_eq!(cli.scroll, 10.0);
        assert!(!args(&[]).unwrap().help);
    }
}
