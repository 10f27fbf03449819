/*
 * Small HTTP greeting service for local use
 *
 *  Copyright (C) 2025 Hiroshi KUWAGATA <kgt9221@gmail.com>
 */

//!
//! コマンドライン引数を取り扱うモジュール
//!

mod config;
mod logger;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::command::{CommandContext, run};
use config::Config;

/// デフォルトのコンフィギュレーションパス
static DEFAULT_CONFIG_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    BaseDirs::new()
        .unwrap()
        .config_local_dir()
        .join(env!("CARGO_PKG_NAME"))
        .to_path_buf()
});

/// デフォルトのデータパス
static DEFAULT_DATA_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    BaseDirs::new()
        .unwrap()
        .data_local_dir()
        .join(env!("CARGO_PKG_NAME"))
        .to_path_buf()
});

///
/// デフォルトのコンフィグレーションファイルのパス情報を生成
///
/// # 戻り値
/// コンフィギュレーションファイルのパス情報
///
fn default_config_path() -> PathBuf {
    DEFAULT_CONFIG_PATH.join("config.toml")
}

///
/// デフォルトのログ出力先のパスを生成
///
/// # 戻り値
/// ログ出力先ディレクトリのパス情報
///
fn default_log_path() -> PathBuf {
    DEFAULT_DATA_PATH.join("log")
}

/// デフォルトのバインド先アドレス
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

/// デフォルトのバインド先ポート番号
const DEFAULT_BIND_PORT: u16 = 8080;

///
/// show_options()実装を要求するトレイト
///
trait ShowOptions {
    ///
    /// オプション設定内容の表示
    ///
    fn show_options(&self);
}

///
/// validate()実装を要求するトレイト
///
trait Validate {
    ///
    /// オプション設定内容の検証
    ///
    fn validate(&mut self) -> Result<()>;
}

///
/// apply_config()実装を要求するトレイト
///
trait ApplyConfig {
    ///
    /// オプション設定へのコンフィギュレーションの反映
    ///
    fn apply_config(&mut self, config: &Config);
}

///
/// ログレベルを指し示す列挙子
///
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum, Deserialize, Serialize)]
#[clap(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum LogLevel {
    /// ログを記録しない
    #[serde(alias = "off", alias = "OFF")]
    #[value(alias = "off")]
    None,

    /// エラー情報以上のレベルを記録
    Error,

    /// 警告情報以上のレベルを記録
    Warn,

    /// 一般情報以上のレベルを記録
    Info,

    /// デバッグ情報以上のレベルを記録
    Debug,

    /// トレース情報以上のレベルを記録
    Trace,
}

// Intoトレイトの実装
impl Into<log::LevelFilter> for LogLevel {
    fn into(self) -> log::LevelFilter {
        match self {
            Self::None => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

// AsRefトレイトの実装
impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            Self::None => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

///
/// グローバルオプション情報を格納する構造体
///
#[derive(Parser, Debug, Clone)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    about = "カウンタ付き挨拶メッセージを返すHTTPサービス",
    version,
    long_about = None,
    subcommand_required = false,
    arg_required_else_help = true,
)]
pub struct Options {
    /// config.tomlを使用する場合のパス
    #[arg(short = 'c', long = "config-path")]
    config_path: Option<PathBuf>,

    /// 記録するログレベルの指定
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL",
        ignore_case = true)]
    log_level: Option<LogLevel>,

    /// ログの出力先の指定
    #[arg(short = 'L', long = "log-output", value_name = "PATH")]
    log_output: Option<PathBuf>,

    /// ログを標準出力にも同時出力するか否か
    #[arg(long = "log-tee")]
    log_tee: bool,

    /// 設定情報の表示
    #[arg(long = "show-options")]
    show_options: bool,

    /// 設定情報の保存
    #[arg(long = "save-config")]
    save_config: bool,

    /// 実行するサブコマンド
    #[command(subcommand)]
    command: Option<Command>,
}

impl Options {
    ///
    /// ログレベルへのアクセサ
    ///
    /// # 戻り値
    /// 設定されたログレベルを返す
    ///
    pub(crate) fn log_level(&self) -> LogLevel {
        if let Some(level) = self.log_level {
            level
        } else {
            LogLevel::Info
        }
    }

    ///
    /// ログの出力先へのアクセサ
    ///
    /// # 戻り値
    /// ログの出力先として設定されたパス情報を返す。未設定の場合はデフォルトの
    /// パスを返す。
    ///
    pub(crate) fn log_output(&self) -> PathBuf {
        if let Some(path) = &self.log_output {
            path.clone()
        } else {
            default_log_path()
        }
    }

    ///
    /// ログの標準出力同時出力フラグへのアクセサ
    ///
    /// # 戻り値
    /// ログの標準出力同時出力が有効であればtrueを返す
    ///
    pub(crate) fn log_tee(&self) -> bool {
        self.log_tee
    }

    ///
    /// コンフィギュレーションファイルの適用
    ///
    /// # 概要
    /// コンフィギュレーションファイルが存在する場合に読み込みを行い、コマンド
    /// ラインで明示指定されていない項目へ設定値を反映する。
    ///
    /// # 戻り値
    /// 処理に成功した場合は`Ok(())`を返す。
    ///
    fn apply_config(&mut self) -> Result<()> {
        /*
         * コンフィギュレーションファイルのパスの決定
         */
        let path = if let Some(path) = &self.config_path {
            path.clone()
        } else {
            default_config_path()
        };

        if !path.exists() {
            return Ok(());
        }

        /*
         * ファイルの読み込みと反映
         */
        let config = Config::load(&path)?;

        if self.log_level.is_none() {
            if let Some(level) = config.log_level() {
                self.log_level = Some(level);
            }
        }

        if self.log_output.is_none() {
            if let Some(path) = config.log_output() {
                self.log_output = Some(path);
            }
        }

        if !self.log_tee {
            if let Some(tee) = config.log_tee() {
                self.log_tee = tee;
            }
        }

        if let Some(Command::Run(opts)) = &mut self.command {
            opts.apply_config(&config);
        }

        Ok(())
    }

    ///
    /// コマンドコンテキストの生成
    ///
    /// # 戻り値
    /// サブコマンドに対応するコンテキストオブジェクトを返す。
    ///
    pub(crate) fn build_context(&self) -> Result<Box<dyn CommandContext>> {
        match &self.command {
            Some(Command::Run(opts)) => run::build_context(self, opts),
            None => Err(anyhow!("no subcommand specified")),
        }
    }
}

// ShowOptionsトレイトの実装
impl ShowOptions for Options {
    fn show_options(&self) {
        println!("global options");
        println!("   log_level: {}", self.log_level().as_ref());
        println!("   log_output: {}", self.log_output().display());
        println!("   log_tee: {}", self.log_tee());

        if let Some(Command::Run(opts)) = &self.command {
            opts.show_options();
        }
    }
}

// Validateトレイトの実装
impl Validate for Options {
    fn validate(&mut self) -> Result<()> {
        if let Some(Command::Run(opts)) = &mut self.command {
            opts.validate()?;
        }

        Ok(())
    }
}

///
/// サブコマンドを指し示す列挙子
///
#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// サーバの起動
    #[command(name = "run", alias = "r")]
    Run(RunOpts),
}

///
/// runサブコマンドのオプション情報を格納する構造体
///
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct RunOpts {
    /// サーバのバインド先
    #[arg()]
    bind_addr: Option<String>,

    /// サーバのバインド先ポート
    #[arg(skip)]
    bind_port: Option<u16>,
}

impl RunOpts {
    ///
    /// バインド先のアドレスへのアクセサ
    ///
    /// # 戻り値
    /// 設定されたバインド先のアドレスを返す。未設定の場合はデフォルトのアドレ
    /// スを返す。
    ///
    pub(crate) fn bind_addr(&self) -> String {
        if let Some(addr) = &self.bind_addr {
            addr.clone()
        } else {
            DEFAULT_BIND_ADDR.to_string()
        }
    }

    ///
    /// バインド先のポート番号へのアクセサ
    ///
    /// # 戻り値
    /// 設定されたバインド先のポート番号を返す。未設定の場合はデフォルトのポー
    /// ト番号を返す。
    ///
    pub(crate) fn bind_port(&self) -> u16 {
        if let Some(port) = self.bind_port {
            port
        } else {
            DEFAULT_BIND_PORT
        }
    }
}

// ShowOptionsトレイトの実装
impl ShowOptions for RunOpts {
    fn show_options(&self) {
        println!("run command options");
        println!("   bind_addr: {}", self.bind_addr());
        println!("   bind_port: {}", self.bind_port());
    }
}

// Validateトレイトの実装
impl Validate for RunOpts {
    fn validate(&mut self) -> Result<()> {
        if let Some(value) = &self.bind_addr {
            let (addr, port) = parse_bind_value(value)?;

            self.bind_addr = Some(addr);
            if self.bind_port.is_none() {
                self.bind_port = port;
            }
        }

        Ok(())
    }
}

// ApplyConfigトレイトの実装
impl ApplyConfig for RunOpts {
    fn apply_config(&mut self, config: &Config) {
        if self.bind_addr.is_none() {
            if let Some(addr) = config.run_bind_addr() {
                self.bind_addr = Some(addr);
            }
        }

        if self.bind_port.is_none() {
            if let Some(port) = config.run_bind_port() {
                self.bind_port = Some(port);
            }
        }
    }
}

///
/// バインド先指定文字列の解析
///
/// # 概要
/// `アドレス`、`アドレス:ポート`、`[IPv6アドレス]:ポート`の各形式を受け付け
/// る。
///
/// # 引数
/// * `value` - バインド先指定文字列
///
/// # 戻り値
/// アドレス文字列とポート番号(省略時はNone)の組を返す。
///
fn parse_bind_value(value: &str) -> Result<(String, Option<u16>)> {
    /*
     * 入力の事前チェック
     */
    if value.is_empty() {
        return Err(anyhow!("bind address is empty"));
    }

    /*
     * IPv6角括弧形式の解析
     */
    if let Some(rest) = value.strip_prefix('[') {
        let (addr, tail) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("invalid bind address: {}", value))?;
        if addr.is_empty() {
            return Err(anyhow!("bind address is empty"));
        }

        if tail.is_empty() {
            return Ok((addr.to_string(), None));
        }

        let port_str = tail
            .strip_prefix(':')
            .ok_or_else(|| anyhow!("invalid bind address: {}", value))?;
        if port_str.is_empty() {
            return Err(anyhow!("bind port is empty"));
        }

        return Ok((addr.to_string(), Some(port_str.parse()?)));
    }

    /*
     * IPv4/ホスト名形式の解析
     */
    match value.matches(':').count() {
        0 => Ok((value.to_string(), None)),

        1 => {
            let (addr, port_str) = value
                .split_once(':')
                .unwrap_or_default();

            if addr.is_empty() {
                return Err(anyhow!("bind address is empty"));
            }
            if port_str.is_empty() {
                return Err(anyhow!("bind port is empty"));
            }

            Ok((addr.to_string(), Some(port_str.parse()?)))
        }

        /*
         * 裸のIPv6リテラルとして扱う
         */
        _ => Ok((value.to_string(), None)),
    }
}

///
/// コマンドライン引数のパース処理
///
/// # 戻り値
/// オプション情報をまとめたオブジェクトを返す。
///
pub(crate) fn parse() -> Result<Arc<Options>> {
    let mut opts = Options::parse();

    /*
     * デフォルトデータパスの作成
     */
    std::fs::create_dir_all(DEFAULT_DATA_PATH.clone())?;

    /*
     * コンフィギュレーションファイルの適用
     */
    opts.apply_config()?;

    /*
     * 設定情報のバリデーション
     */
    opts.validate()?;

    /*
     * ログ機能の初期化
     */
    logger::init(&opts)?;

    /*
     * 設定情報の表示
     */
    if opts.show_options {
        opts.show_options();
        std::process::exit(0);
    }

    /*
     * 設定の保存
     */
    if opts.save_config {
        save_config(&opts)?;
        std::process::exit(0);
    }

    /*
     * 設定情報の返却
     */
    Ok(Arc::new(opts))
}

///
/// 設定保存が必要であればconfig.tomlへ書き込みを行う
///
/// # 概要
/// 既存の設定ファイルがある場合は読み込み、現在の設定内容で更新した上で保存
/// する。設定ファイルが存在しない場合はデフォルト設定を基準に更新して保存す
/// る。
///
/// # 引数
/// * `opts` - コマンドラインとコンフィグ適用後の設定情報
///
/// # 戻り値
/// 保存処理に成功した場合は`Ok(())`を返す。
///
fn save_config(opts: &Options) -> Result<()> {
    /*
     * 保存先パスの決定
     */
    let path = if let Some(path) = &opts.config_path {
        path.clone()
    } else {
        default_config_path()
    };

    /*
     * 既存ファイルの上書き確認
     */
    if path.exists() && !confirm_overwrite(&path)? {
        return Ok(());
    }

    /*
     * 保存先ディレクトリの作成
     */
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    /*
     * 現在の設定内容を反映
     */
    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        Config::default()
    };

    config.set_log_level(opts.log_level());
    config.set_log_output(opts.log_output());
    config.set_log_tee(opts.log_tee());

    if let Some(Command::Run(run_opts)) = &opts.command {
        config.set_run_bind_addr(run_opts.bind_addr());
        config.set_run_bind_port(run_opts.bind_port());
    }

    /*
     * ファイルへの書き込み
     */
    config.save(&path)?;
    println!("saved: {}", path.display());

    Ok(())
}

///
/// 既存ファイルの上書き確認
///
/// # 引数
/// * `path` - 上書き対象のパス
///
/// # 戻り値
/// 上書きが承認された場合はtrueを返す。
///
fn confirm_overwrite(path: &Path) -> Result<bool> {
    print!("overwrite {}? [y/N]: ", path.display());
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "YES"))
}
